// Copyright 2025 Stoolap Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SQL Function System
//!
//! This module provides the builtin functions and how calls are bound to them:
//!
//! - [`ScalarFunction`] - resolves a call against static argument types
//! - [`FunctionImpl`] - the resolved implementation held by a plan node
//! - [`AggregateFunction`] / [`Accumulator`] - grouped aggregation
//! - [`FunctionRegistry`] - case-insensitive lookup by name
//!
//! Resolution happens once per call site. It fixes the return type, the
//! result collation, and the conversion each argument needs, so the
//! implementation never sees a value of an unexpected kind.

pub mod aggregate;
pub mod registry;
pub mod scalar;

use std::fmt;
use std::sync::Arc;

use num_traits::ToPrimitive;
use smallvec::SmallVec;

use crate::collation::{Coercibility, Collation, Derivation, Repertoire, BINARY};
use crate::config::EvalConfig;
use crate::core::{Datum, Error, EvalType, FieldType, Result, SqlMode};
use crate::diagnostics::{Diagnostics, Recovery};
use crate::eval::{Column, EvalContext};

/// Function type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    /// Aggregate function (operates on multiple rows)
    Aggregate,
    /// Scalar function (operates on a single row)
    Scalar,
}

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Minimum number of arguments
    pub min_args: usize,
    /// Maximum number of arguments
    pub max_args: usize,
}

impl FunctionSignature {
    pub const fn new(min_args: usize, max_args: usize) -> Self {
        Self { min_args, max_args }
    }

    /// Exactly `n` arguments
    pub const fn exact(n: usize) -> Self {
        Self::new(n, n)
    }

    /// At least `min` arguments
    pub const fn variadic(min: usize) -> Self {
        Self::new(min, usize::MAX)
    }

    pub fn is_variadic(&self) -> bool {
        self.max_args == usize::MAX
    }

    /// Validate argument count
    pub fn validate_arg_count(&self, name: &str, count: usize) -> Result<()> {
        if count < self.min_args || count > self.max_args {
            return Err(Error::WrongParamCount(name.to_string()));
        }
        Ok(())
    }
}

/// Function information
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// Function name
    pub name: String,
    /// Function type
    pub function_type: FunctionType,
    /// Description
    pub description: String,
    /// Signature
    pub signature: FunctionSignature,
}

impl FunctionInfo {
    /// Create a new function info
    pub fn new(
        name: impl Into<String>,
        function_type: FunctionType,
        description: impl Into<String>,
        signature: FunctionSignature,
    ) -> Self {
        Self {
            name: name.into(),
            function_type,
            description: description.into(),
            signature,
        }
    }

    /// Get the function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the signature
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }
}

// ============================================================================
// Plan-time types
// ============================================================================

/// Session settings that influence resolution
#[derive(Debug, Clone, Copy)]
pub struct PlanContext {
    /// Collation of literals and of strings made from numbers
    pub collation: &'static Collation,
    /// Extra scale digits for decimal division
    pub div_precision_increment: u32,
    /// Mode flags that change result types (NO_UNSIGNED_SUBTRACTION)
    pub sql_mode: SqlMode,
}

impl Default for PlanContext {
    fn default() -> Self {
        Self::from_config(&EvalConfig::default())
    }
}

impl PlanContext {
    pub fn from_config(config: &EvalConfig) -> Self {
        Self {
            collation: config.collation,
            div_precision_increment: config.div_precision_increment,
            sql_mode: config.sql_mode.parse().unwrap_or(SqlMode::empty()),
        }
    }

    pub fn from_context(ctx: &EvalContext) -> Self {
        Self {
            collation: ctx.collation(),
            div_precision_increment: ctx.div_precision_increment(),
            sql_mode: ctx.sql_mode(),
        }
    }
}

/// Static description of one argument at a call site
#[derive(Debug, Clone)]
pub struct ArgType {
    pub ty: FieldType,
    pub derivation: Derivation,
    /// Value of a constant argument, known at plan time
    pub constant: Option<Datum>,
    /// SQL text of the argument, for error messages
    pub display: String,
}

impl ArgType {
    /// Argument of type `ty`; strings get an implicit derivation
    pub fn new(ty: FieldType, display: impl Into<String>) -> Self {
        let derivation = default_derivation(&ty, Coercibility::Implicit);
        Self {
            ty,
            derivation,
            constant: None,
            display: display.into(),
        }
    }

    /// Constant argument; string constants are coercible
    pub fn constant(value: Datum, ty: FieldType) -> Self {
        let display = literal_text(&value);
        let mut derivation = default_derivation(&ty, Coercibility::Coercible);
        if value.is_null() {
            derivation.coercibility = Coercibility::Ignorable;
        }
        if let Some(s) = value.as_str() {
            derivation.repertoire = Repertoire::of(s);
        }
        Self {
            ty,
            derivation,
            constant: Some(value),
            display,
        }
    }

    pub fn with_derivation(mut self, derivation: Derivation) -> Self {
        self.derivation = derivation;
        self
    }

    #[inline]
    pub fn eval_type(&self) -> EvalType {
        self.ty.eval_type()
    }

    pub fn is_constant(&self) -> bool {
        self.constant.is_some()
    }

    /// True for the NULL literal
    pub fn is_null(&self) -> bool {
        matches!(self.constant, Some(Datum::Null)) || self.ty.kind == crate::core::FieldKind::Null
    }

    /// Constant text value
    pub fn const_text(&self) -> Option<String> {
        match self.constant.as_ref()? {
            Datum::Null => None,
            d => Some(d.to_string()),
        }
    }

    /// Constant integer value
    pub fn const_int(&self) -> Option<i64> {
        match self.constant.as_ref()? {
            Datum::Int(v) => Some(*v),
            Datum::UInt(v) => Some(i64::try_from(*v).unwrap_or(i64::MAX)),
            Datum::Float(f) => Some(f.round() as i64),
            Datum::Decimal(d) => crate::core::decimal::round(*d, 0).to_i64(),
            Datum::Str { text, .. } => Some(
                crate::convert::number::parse_int_prefix(text)
                    .value
                    .clamp(i64::MIN as i128, i64::MAX as i128) as i64,
            ),
            _ => None,
        }
    }
}

fn default_derivation(ty: &FieldType, string_coercibility: Coercibility) -> Derivation {
    match ty.eval_type() {
        EvalType::String | EvalType::Json if ty.kind != crate::core::FieldKind::Null => {
            Derivation::new(ty.collation, string_coercibility, Repertoire::Unicode)
        }
        EvalType::String => Derivation::ignorable(&BINARY),
        _ => Derivation::numeric(&BINARY),
    }
}

/// SQL text of a literal
pub fn literal_text(value: &Datum) -> String {
    match value {
        Datum::Null => "NULL".to_string(),
        Datum::Str { text, .. } => format!("'{}'", text.replace('\'', "''")),
        Datum::Bytes(b) => format!("0x{}", hex::encode(b)),
        Datum::Date(_) => format!("DATE'{}'", value),
        Datum::DateTime(_) => format!("TIMESTAMP'{}'", value),
        Datum::Duration(_) => format!("TIME'{}'", value),
        Datum::Json(_) => format!("'{}'", value),
        other => other.to_string(),
    }
}

/// How a call treats NULL arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// Any NULL argument makes the result NULL without calling the function
    Propagate,
    /// The function sees NULL arguments
    Tolerant,
}

/// Outcome of resolving a call; held by the plan node
#[derive(Clone)]
pub struct Resolution {
    pub return_type: FieldType,
    /// Collation attributes of the result
    pub derivation: Derivation,
    /// Implicit conversion applied to each argument before the call
    pub casts: Vec<Option<FieldType>>,
    pub implementation: Arc<dyn FunctionImpl>,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("return_type", &self.return_type)
            .field("derivation", &self.derivation)
            .field("casts", &self.casts)
            .finish()
    }
}

// ============================================================================
// Runtime types
// ============================================================================

/// Runtime state handed to an implementation
pub struct Call<'a> {
    pub ctx: &'a EvalContext,
    pub diag: &'a mut Diagnostics,
}

impl<'a> Call<'a> {
    pub fn new(ctx: &'a EvalContext, diag: &'a mut Diagnostics) -> Self {
        Self { ctx, diag }
    }

    /// Route a runtime condition through the diagnostics policy
    #[inline]
    pub fn observe(&mut self, err: Error) -> Result<Recovery> {
        self.diag.observe(err, self.ctx)
    }

    /// Observe a condition and return NULL when the policy says so,
    /// otherwise `value`
    pub fn recover(&mut self, err: Error, value: Datum) -> Result<Datum> {
        match self.observe(err)? {
            Recovery::Keep => Ok(value),
            Recovery::Null => Ok(Datum::Null),
        }
    }

    /// Record a plain warning
    pub fn warn(&mut self, err: &Error) {
        self.diag.push_warning(err);
    }
}

/// Arguments evaluated on demand, for short-circuiting functions
pub trait ArgSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate argument `index` (after its implicit conversion)
    fn eval(&mut self, index: usize, call: &mut Call<'_>) -> Result<Datum>;
}

/// A resolved builtin
pub trait FunctionImpl: Send + Sync {
    /// Evaluate one row
    fn eval_row(&self, args: &[Datum], call: &mut Call<'_>) -> Result<Datum>;

    fn null_policy(&self) -> NullPolicy {
        NullPolicy::Propagate
    }

    /// True when arguments must be evaluated on demand
    fn is_lazy(&self) -> bool {
        false
    }

    /// Evaluate one row with on-demand arguments
    fn eval_lazy(&self, args: &mut dyn ArgSource, call: &mut Call<'_>) -> Result<Datum> {
        let mut values: SmallVec<[Datum; 4]> = SmallVec::with_capacity(args.len());
        for i in 0..args.len() {
            let v = args.eval(i, call)?;
            if v.is_null() && self.null_policy() == NullPolicy::Propagate {
                return Ok(Datum::Null);
            }
            values.push(v);
        }
        self.eval_row(&values, call)
    }

    /// True for functions whose value may change between calls with the
    /// same arguments
    fn is_volatile(&self) -> bool {
        false
    }

    /// Evaluate a batch; must match `rows` calls of [`eval_row`](Self::eval_row)
    fn eval_batch(
        &self,
        args: &[Column],
        rows: usize,
        ret: &FieldType,
        call: &mut Call<'_>,
    ) -> Result<Column> {
        eval_rows(self, args, rows, ret, call)
    }
}

/// Row-at-a-time batch evaluation, the fallback of every batch kernel
pub fn eval_rows<F: FunctionImpl + ?Sized>(
    function: &F,
    args: &[Column],
    rows: usize,
    ret: &FieldType,
    call: &mut Call<'_>,
) -> Result<Column> {
    let mut out = Vec::with_capacity(rows);
    let mut values: SmallVec<[Datum; 4]> = SmallVec::with_capacity(args.len());
    let propagate = function.null_policy() == NullPolicy::Propagate;
    for row in 0..rows {
        call.diag.set_row(row);
        values.clear();
        values.extend(args.iter().map(|c| c.get(row)));
        if propagate && values.iter().any(Datum::is_null) {
            out.push(Datum::Null);
            continue;
        }
        out.push(function.eval_row(&values, call)?);
    }
    Ok(Column::from_datums(ret, out))
}

/// Trait for scalar functions
pub trait ScalarFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Get function information
    fn info(&self) -> FunctionInfo;

    /// Bind a call to static argument types
    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution>;
}

/// Running state of one aggregate over one group
pub trait Accumulator: Send {
    /// Fold in one row of (converted) arguments
    fn update(&mut self, args: &[Datum], call: &mut Call<'_>) -> Result<()>;

    /// Final value of the group
    fn finish(&mut self, call: &mut Call<'_>) -> Result<Datum>;

    /// Start a new group
    fn reset(&mut self);
}

/// Factory of accumulators for one resolved aggregate call
pub type AccumulatorFactory = Arc<dyn Fn() -> Box<dyn Accumulator> + Send + Sync>;

/// Resolved aggregate call
#[derive(Clone)]
pub struct AggregateResolution {
    pub return_type: FieldType,
    pub derivation: Derivation,
    pub casts: Vec<Option<FieldType>>,
    pub factory: AccumulatorFactory,
}

impl fmt::Debug for AggregateResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateResolution")
            .field("return_type", &self.return_type)
            .field("casts", &self.casts)
            .finish()
    }
}

/// Modifiers of an aggregate call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// `DISTINCT` before the arguments
    pub distinct: bool,
    /// Directions of the ORDER BY keys (`true` is ascending); the keys are
    /// passed as the trailing arguments of the call
    pub order_by: Vec<bool>,
    /// `SEPARATOR` of GROUP_CONCAT
    pub separator: Option<String>,
}

impl AggregateOptions {
    /// Options of `f(DISTINCT ...)`
    pub fn distinct() -> Self {
        Self {
            distinct: true,
            ..Self::default()
        }
    }

    /// Number of leading arguments that are not ORDER BY keys
    pub fn value_count(&self, args: usize) -> usize {
        args.saturating_sub(self.order_by.len())
    }
}

/// Trait for aggregate functions
pub trait AggregateFunction: Send + Sync {
    /// Get the function name
    fn name(&self) -> &str;

    /// Get function information
    fn info(&self) -> FunctionInfo;

    /// Bind an aggregate call
    fn resolve(
        &self,
        args: &[ArgType],
        options: &AggregateOptions,
        plan: &PlanContext,
    ) -> Result<AggregateResolution>;
}

// Re-export main types
pub use registry::{global_registry, FunctionRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::UTF8MB4_0900_AI_CI;

    #[test]
    fn test_function_signature_validation() {
        let sig = FunctionSignature::exact(1);
        assert!(sig.validate_arg_count("ABS", 1).is_ok());
        assert_eq!(sig.validate_arg_count("ABS", 0).unwrap_err().code(), 1582);
        assert!(sig.validate_arg_count("ABS", 2).is_err());
    }

    #[test]
    fn test_variadic_signature() {
        let sig = FunctionSignature::variadic(1);
        assert!(sig.is_variadic());
        assert!(sig.validate_arg_count("CONCAT", 10).is_ok());
        assert!(sig.validate_arg_count("CONCAT", 0).is_err());
    }

    #[test]
    fn test_arg_type_derivations() {
        let col = ArgType::new(FieldType::varchar(&UTF8MB4_0900_AI_CI), "c");
        assert_eq!(col.derivation.coercibility, Coercibility::Implicit);
        let lit = ArgType::constant(Datum::text("x"), FieldType::varchar(&UTF8MB4_0900_AI_CI));
        assert_eq!(lit.derivation.coercibility, Coercibility::Coercible);
        assert_eq!(lit.display, "'x'");
        let n = ArgType::constant(Datum::Int(3), FieldType::long_long());
        assert_eq!(n.derivation.coercibility, Coercibility::Numeric);
        assert_eq!(n.const_int(), Some(3));
        let null = ArgType::constant(Datum::Null, FieldType::null());
        assert!(null.is_null());
        assert_eq!(null.derivation.coercibility, Coercibility::Ignorable);
    }
}
