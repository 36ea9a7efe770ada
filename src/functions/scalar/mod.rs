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

//! Scalar Functions
//!
//! Operators and functions that need their own batch kernel or lazy
//! argument evaluation are written as dedicated types (see
//! [`arithmetic`], [`comparison`], [`control`]). The long tail of
//! builtins is described by [`Builtin`] entries: a resolve function that
//! fixes the return type and argument conversions, and a row function
//! that computes the value.
//!
//! - `arithmetic` - `+ - * / DIV MOD`, unary minus
//! - `comparison` - `= <=> <> < <= > >=`, `IN`, `BETWEEN`, `IS`, `GREATEST`, `LEAST`, `INTERVAL`
//! - `control` - `IF`, `IFNULL`, `NULLIF`, `COALESCE`, `CASE`, `AND`, `OR`, `XOR`, `NOT`
//! - `math`, `bitwise`, `string`, `like`, `datetime`, `conversion`, `json`, `crypto`, `misc`

pub mod arithmetic;
pub mod comparison;
pub mod control;
pub mod conversion;
pub mod crypto;
pub mod datetime;
pub mod json;
pub mod like;
pub mod math;
pub mod misc;
pub mod string;

pub(crate) mod bitwise;

use std::borrow::Cow;
use std::sync::Arc;

use num_traits::ToPrimitive;

use super::registry::FunctionRegistry;
use super::{
    ArgType, Call, FunctionImpl, FunctionInfo, FunctionSignature, FunctionType, NullPolicy,
    PlanContext, Resolution, ScalarFunction,
};
use crate::collation::{self, Charset, Coercibility, Collation, Derivation, Repertoire, BINARY};
use crate::convert::TargetKind;
use crate::core::{decimal, Datum, Decimal, Error, EvalType, FieldKind, FieldType, Result};
use crate::datetime::IntervalUnit;

/// Register every scalar builtin
pub fn register_builtins(registry: &FunctionRegistry) {
    arithmetic::register(registry);
    comparison::register(registry);
    control::register(registry);
    math::register(registry);
    bitwise::register(registry);
    string::register(registry);
    like::register(registry);
    datetime::register(registry);
    conversion::register(registry);
    json::register(registry);
    crypto::register(registry);
    misc::register(registry);
}

/// Register a table of builtins
pub(crate) fn register_all(registry: &FunctionRegistry, builtins: Vec<Builtin>) {
    for b in builtins {
        registry.register_scalar(Arc::new(b));
    }
}

// ============================================================================
// Table-driven builtins
// ============================================================================

/// Per-call-site data computed at resolution
#[derive(Debug, Clone, Default)]
pub enum Aux {
    #[default]
    None,
    Unit(IntervalUnit),
    Int(i64),
    Text(String),
    Collation(&'static Collation),
}

/// Return type and argument conversions chosen by a resolve function
#[derive(Debug, Clone)]
pub struct Signature {
    pub ret: FieldType,
    pub derivation: Option<Derivation>,
    pub casts: Vec<Option<FieldType>>,
    pub aux: Aux,
}

impl Signature {
    pub fn new(ret: FieldType) -> Self {
        Self {
            ret,
            derivation: None,
            casts: Vec::new(),
            aux: Aux::None,
        }
    }

    pub fn casts(mut self, casts: Vec<Option<FieldType>>) -> Self {
        self.casts = casts;
        self
    }

    pub fn derivation(mut self, derivation: Derivation) -> Self {
        self.derivation = Some(derivation);
        self
    }

    pub fn aux(mut self, aux: Aux) -> Self {
        self.aux = aux;
        self
    }
}

/// What a row function knows about its call site
#[derive(Debug, Clone)]
pub struct Bound {
    pub name: &'static str,
    pub ret: FieldType,
    /// Argument types after conversion
    pub args: Vec<FieldType>,
    pub derivation: Derivation,
    pub aux: Aux,
    /// Call text for error messages, e.g. `abs(-9223372036854775808)`
    pub display: String,
}

impl Bound {
    /// Build a string result in the result collation
    pub fn text(&self, s: impl AsRef<str>) -> Datum {
        encode(s.as_ref(), self.derivation.collation)
    }

    /// True when the result is a binary string
    pub fn is_binary(&self) -> bool {
        self.derivation.collation.charset == Charset::Binary
    }

    /// Report an out-of-range result of this call
    pub fn out_of_range(&self, type_name: &str, call: &mut Call<'_>) -> Result<Datum> {
        call.observe(Error::out_of_range(type_name, &self.display))?;
        Ok(Datum::Null)
    }

    pub fn unit(&self) -> IntervalUnit {
        match self.aux {
            Aux::Unit(u) => u,
            _ => IntervalUnit::Day,
        }
    }
}

pub type ResolveFn = fn(&[ArgType], &PlanContext) -> Result<Signature>;
pub type EvalFn = fn(&[Datum], &Bound, &mut Call<'_>) -> Result<Datum>;

/// A builtin described by a resolve and an eval function
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    pub signature: FunctionSignature,
    pub policy: NullPolicy,
    pub volatile: bool,
    resolve: ResolveFn,
    eval: EvalFn,
}

impl Builtin {
    pub const fn new(
        name: &'static str,
        signature: FunctionSignature,
        resolve: ResolveFn,
        eval: EvalFn,
    ) -> Self {
        Self {
            name,
            description: "",
            signature,
            policy: NullPolicy::Propagate,
            volatile: false,
            resolve,
            eval,
        }
    }

    /// The function sees NULL arguments
    pub const fn tolerant(mut self) -> Self {
        self.policy = NullPolicy::Tolerant;
        self
    }

    pub const fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Same function under another name
    pub const fn alias(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Builtin {
    /// Resolve functions shared by several builtins report collation
    /// conflicts and argument errors without a function name; fill in ours
    fn name_operation(&self, err: Error) -> Error {
        let name = self.name.to_ascii_lowercase();
        match err {
            Error::IllegalMixOfCollations {
                operands,
                operation,
            } if operation.is_empty() => Error::IllegalMixOfCollations {
                operands,
                operation: name,
            },
            Error::IncorrectArguments(function) if function.is_empty() => {
                Error::IncorrectArguments(name)
            }
            Error::WrongParamCount(function) if function.is_empty() => Error::WrongParamCount(name),
            Error::TooBigPrecision {
                precision,
                expr,
                max,
            } if expr.is_empty() => Error::TooBigPrecision {
                precision,
                expr: name,
                max,
            },
            other => other,
        }
    }
}

impl ScalarFunction for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(self.name, FunctionType::Scalar, self.description, self.signature)
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        self.signature.validate_arg_count(self.name, args.len())?;
        let sig = (self.resolve)(args, plan).map_err(|e| self.name_operation(e))?;
        let mut casts = sig.casts;
        casts.resize(args.len(), None);
        let derivation = sig
            .derivation
            .unwrap_or_else(|| result_derivation(&sig.ret, plan));
        let ret = with_result_collation(sig.ret, &derivation);
        let bound = Bound {
            name: self.name,
            ret: ret.clone(),
            args: args
                .iter()
                .zip(&casts)
                .map(|(a, c)| c.clone().unwrap_or_else(|| a.ty.clone()))
                .collect(),
            derivation,
            aux: sig.aux,
            display: format!(
                "{}({})",
                self.name.to_ascii_lowercase(),
                args.iter()
                    .map(|a| a.display.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        };
        Ok(Resolution {
            return_type: ret,
            derivation,
            casts,
            implementation: Arc::new(RowFunction {
                bound,
                eval: self.eval,
                policy: self.policy,
                volatile: self.volatile,
            }),
        })
    }
}

/// Resolved table builtin
struct RowFunction {
    bound: Bound,
    eval: EvalFn,
    policy: NullPolicy,
    volatile: bool,
}

impl FunctionImpl for RowFunction {
    fn eval_row(&self, args: &[Datum], call: &mut Call<'_>) -> Result<Datum> {
        (self.eval)(args, &self.bound, call)
    }

    fn null_policy(&self) -> NullPolicy {
        self.policy
    }

    fn is_volatile(&self) -> bool {
        self.volatile
    }
}

/// Default derivation of a result: strings take the connection collation
pub(crate) fn result_derivation(ret: &FieldType, plan: &PlanContext) -> Derivation {
    match ret.eval_type() {
        EvalType::String if ret.is_binary_string() => {
            Derivation::new(&BINARY, Coercibility::Coercible, Repertoire::Unicode)
        }
        EvalType::String => {
            Derivation::new(plan.collation, Coercibility::Coercible, Repertoire::Unicode)
        }
        EvalType::Json => Derivation::new(
            &collation::UTF8MB4_BIN,
            Coercibility::Implicit,
            Repertoire::Unicode,
        ),
        _ => Derivation::numeric(&BINARY),
    }
}

fn with_result_collation(mut ret: FieldType, derivation: &Derivation) -> FieldType {
    if ret.eval_type() == EvalType::String && ret.kind != FieldKind::Null {
        let binary = derivation.collation.charset == Charset::Binary;
        ret = ret.with_collation(derivation.collation);
        if binary {
            ret.flags |= crate::core::FieldFlags::BINARY;
        } else {
            ret.flags.remove(crate::core::FieldFlags::BINARY);
        }
    }
    ret
}

// ============================================================================
// Resolution helpers
// ============================================================================

/// Whether converting `from` to `to` changes the stored representation
pub(crate) fn needs_cast(from: &FieldType, to: &FieldType) -> bool {
    if from.kind == FieldKind::Null {
        return false;
    }
    let (a, b) = (TargetKind::of(from), TargetKind::of(to));
    if a != b {
        return true;
    }
    match b {
        TargetKind::String => from.collation.charset != to.collation.charset,
        TargetKind::Date | TargetKind::DateTime | TargetKind::Duration => from.fsp() != to.fsp(),
        _ => false,
    }
}

/// Convert every argument to `target` where needed
pub(crate) fn cast_all(args: &[ArgType], target: &FieldType) -> Vec<Option<FieldType>> {
    args.iter()
        .map(|a| needs_cast(&a.ty, target).then(|| target.clone()))
        .collect()
}

/// Convert argument by argument
pub(crate) fn cast_each(args: &[ArgType], targets: &[FieldType]) -> Vec<Option<FieldType>> {
    args.iter()
        .zip(targets)
        .map(|(a, t)| needs_cast(&a.ty, t).then(|| t.clone()))
        .collect()
}

/// Numeric class an argument is computed in
pub(crate) fn numeric_class(ty: &FieldType) -> EvalType {
    match ty.eval_type() {
        EvalType::Int => EvalType::Int,
        EvalType::Decimal => EvalType::Decimal,
        EvalType::Datetime | EvalType::Duration if ty.fsp() > 0 => EvalType::Decimal,
        EvalType::Datetime | EvalType::Duration => EvalType::Int,
        EvalType::Real | EvalType::String | EvalType::Json => EvalType::Real,
    }
}

/// Numeric class of an arithmetic expression over `args`
pub(crate) fn arith_class(args: &[ArgType]) -> EvalType {
    let classes: Vec<EvalType> = args
        .iter()
        .filter(|a| !a.is_null())
        .map(|a| numeric_class(&a.ty))
        .collect();
    if classes.contains(&EvalType::Real) {
        EvalType::Real
    } else if classes.contains(&EvalType::Decimal) {
        EvalType::Decimal
    } else {
        EvalType::Int
    }
}

/// Scale an argument contributes to decimal arithmetic
pub(crate) fn decimal_scale(ty: &FieldType) -> i32 {
    match ty.eval_type() {
        EvalType::Int => 0,
        EvalType::Datetime | EvalType::Duration => ty.fsp() as i32,
        EvalType::Decimal => ty.decimal.max(0),
        _ => ty.decimal.clamp(0, 30),
    }
}

/// Integer digits an argument contributes to decimal arithmetic
pub(crate) fn decimal_int_digits(ty: &FieldType) -> i32 {
    let flen = if ty.flen < 0 { 20 } else { ty.flen };
    match ty.eval_type() {
        EvalType::Int => flen.min(20),
        EvalType::Decimal => (flen - ty.decimal.max(0)).max(1),
        EvalType::Datetime => 14,
        EvalType::Duration => 9,
        _ => 20,
    }
}

/// DECIMAL type for a value with `int_digits` integer and `scale` fraction digits
pub(crate) fn decimal_type(int_digits: i32, scale: i32) -> FieldType {
    let scale = scale.clamp(0, decimal::MAX_SCALE as i32);
    let flen = (int_digits + scale).clamp(1, crate::core::types::MAX_DECIMAL_PRECISION as i32);
    FieldType::new_decimal(flen, scale)
}

/// Type a value of numeric class `class` is converted to
pub(crate) fn class_type(class: EvalType, ty: &FieldType) -> FieldType {
    match class {
        EvalType::Int => {
            let mut ft = FieldType::long_long();
            if ty.is_unsigned() && ty.eval_type() == EvalType::Int {
                ft = ft.with_flags(crate::core::FieldFlags::UNSIGNED);
            }
            ft
        }
        EvalType::Decimal => decimal_type(decimal_int_digits(ty), decimal_scale(ty)),
        _ => FieldType::double(),
    }
}

/// Convert each argument into numeric class `class`, keeping signedness
pub(crate) fn numeric_casts(args: &[ArgType], class: EvalType) -> Vec<Option<FieldType>> {
    args.iter()
        .map(|a| {
            let target = class_type(class, &a.ty);
            needs_cast(&a.ty, &target).then_some(target)
        })
        .collect()
}

/// Derivation of a value used as a string
pub(crate) fn string_operand(arg: &ArgType, plan: &PlanContext) -> Derivation {
    if arg.is_null() {
        return Derivation::ignorable(plan.collation);
    }
    match arg.eval_type() {
        EvalType::String | EvalType::Json => arg.derivation,
        _ => Derivation::numeric(plan.collation),
    }
}

/// Unify the collations of the string operands
pub(crate) fn string_derivation(
    args: &[ArgType],
    operation: &str,
    plan: &PlanContext,
) -> Result<Derivation> {
    if args.is_empty() {
        return Ok(Derivation::new(
            plan.collation,
            Coercibility::Coercible,
            Repertoire::Ascii,
        ));
    }
    let ops: Vec<Derivation> = args.iter().map(|a| string_operand(a, plan)).collect();
    let mut d = collation::resolve(&ops, operation)?;
    if d.coercibility == Coercibility::Ignorable || d.coercibility == Coercibility::Numeric {
        d.collation = plan.collation;
        d.coercibility = Coercibility::Coercible;
    }
    Ok(d)
}

/// String type in `collation`
pub(crate) fn string_type(collation: &'static Collation) -> FieldType {
    FieldType::varchar(collation)
}

/// Convert every argument into a string in `collation`
pub(crate) fn string_casts(args: &[ArgType], collation: &'static Collation) -> Vec<Option<FieldType>> {
    cast_all(args, &string_type(collation))
}

pub(crate) fn int_type() -> FieldType {
    FieldType::long_long()
}

pub(crate) fn uint_type() -> FieldType {
    FieldType::unsigned_long_long()
}

/// Constant argument as an interval unit
pub(crate) fn const_unit(arg: &ArgType, function: &str) -> Result<IntervalUnit> {
    arg.const_text()
        .and_then(|t| t.parse::<IntervalUnit>().ok())
        .ok_or_else(|| Error::incorrect_arguments(function))
}

// ============================================================================
// Value helpers
// ============================================================================

/// Integer value of an argument converted to BIGINT
#[inline]
pub(crate) fn int_of(d: &Datum) -> i64 {
    match d {
        Datum::Int(v) => *v,
        Datum::UInt(v) => *v as i64,
        Datum::Float(f) => *f as i64,
        Datum::Decimal(d) => d.to_i64().unwrap_or(0),
        _ => 0,
    }
}

/// Double value of an argument converted to DOUBLE
#[inline]
pub(crate) fn real_of(d: &Datum) -> f64 {
    match d {
        Datum::Float(f) => *f,
        Datum::Int(v) => *v as f64,
        Datum::UInt(v) => *v as f64,
        Datum::Decimal(d) => decimal::to_f64(d),
        _ => 0.0,
    }
}

/// Decimal value of an argument converted to DECIMAL
#[inline]
pub(crate) fn decimal_of(d: &Datum) -> Decimal {
    match d {
        Datum::Decimal(v) => *v,
        Datum::Int(v) => Decimal::from(*v),
        Datum::UInt(v) => Decimal::from(*v),
        Datum::Float(f) => decimal::from_f64(*f).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

/// Text of a string argument. Binary strings map each byte to one char
/// so that character functions work bytewise; [`encode`] maps back.
pub(crate) fn text_of(d: &Datum) -> Cow<'_, str> {
    match d {
        Datum::Str { text, .. } => Cow::Borrowed(text),
        Datum::Bytes(b) => Cow::Owned(b.iter().map(|&c| c as char).collect()),
        Datum::Enum { name, .. } => Cow::Borrowed(name),
        Datum::Set { names, .. } => Cow::Borrowed(names),
        other => Cow::Owned(other.to_string()),
    }
}

/// Raw bytes of a string argument
pub(crate) fn bytes_of(d: &Datum) -> Cow<'_, [u8]> {
    match d.as_bytes() {
        Some(b) => Cow::Borrowed(b),
        None => Cow::Owned(d.to_string().into_bytes()),
    }
}

/// Inverse of [`text_of`] for results in `collation`
pub(crate) fn encode(s: &str, collation: &'static Collation) -> Datum {
    if collation.charset == Charset::Binary {
        let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
        return Datum::bytes(bytes);
    }
    Datum::text_in(s, collation)
}

/// Datum from an optional string
pub(crate) fn opt_text(b: &Bound, s: Option<String>) -> Datum {
    match s {
        Some(s) => b.text(s),
        None => Datum::Null,
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    //! Helpers for resolving and evaluating builtins in unit tests

    use super::*;
    use crate::convert::{cast, CastMode};
    use crate::diagnostics::Diagnostics;
    use crate::eval::EvalContext;
    use crate::functions::global_registry;

    pub use crate::eval::literal_type;

    /// Resolve `name` over constant arguments and evaluate it once
    pub fn eval_with(
        name: &str,
        args: &[Datum],
        ctx: &EvalContext,
        diag: &mut Diagnostics,
    ) -> Result<Datum> {
        let arg_types: Vec<ArgType> = args
            .iter()
            .map(|d| ArgType::constant(d.clone(), literal_type(d)))
            .collect();
        let plan = PlanContext::from_context(ctx);
        let res = global_registry().resolve_scalar(name, &arg_types, &plan)?;
        let mut values = Vec::with_capacity(args.len());
        for (d, c) in args.iter().zip(&res.casts) {
            let v = match c {
                Some(t) => cast(d.clone(), t, CastMode::Implicit, ctx, diag)?,
                None => d.clone(),
            };
            values.push(v);
        }
        let f = &res.implementation;
        if f.null_policy() == NullPolicy::Propagate && values.iter().any(Datum::is_null) {
            return Ok(Datum::Null);
        }
        let mut call = Call::new(ctx, diag);
        f.eval_row(&values, &mut call)
    }

    /// Evaluate under an empty sql_mode and render the result
    pub fn eval(name: &str, args: &[Datum]) -> String {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        match eval_with(name, args, &ctx, &mut diag) {
            Ok(d) => d.to_string(),
            Err(e) => format!("ERROR {}", e.code()),
        }
    }

    pub fn s(text: &str) -> Datum {
        Datum::text(text)
    }

    pub fn i(v: i64) -> Datum {
        Datum::Int(v)
    }

    pub fn f(v: f64) -> Datum {
        Datum::Float(v)
    }

    pub fn dec(text: &str) -> Datum {
        use std::str::FromStr;
        Datum::Decimal(Decimal::from_str(text).unwrap())
    }
}
