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

//! Comparison operators
//!
//! Every comparison first settles on a [`CompareKind`] from the static
//! argument types: strings compare under the collation resolved from all
//! operands, temporal values compare as DATETIME or TIME, integers
//! compare exactly across signedness, and any remaining mix compares as
//! DECIMAL or DOUBLE.

use std::cmp::Ordering;
use std::sync::Arc;

use super::control::{truth, truth_cast};
use super::{
    arith_class, bytes_of, class_type, decimal_int_digits, decimal_of, decimal_scale,
    decimal_type, int_type, needs_cast, real_of, result_derivation, string_operand, string_type,
    text_of, uint_type,
};
use crate::collation::{self, Charset, Collation, Derivation};
use crate::convert::number_json;
use crate::core::json::{self, Json};
use crate::core::{Datum, Decimal, EvalType, FieldKind, FieldType, Result};
use crate::eval::Column;
use crate::functions::registry::FunctionRegistry;
use crate::functions::{
    eval_rows, ArgType, Call, FunctionImpl, FunctionInfo, FunctionSignature, FunctionType,
    NullPolicy, PlanContext, Resolution, ScalarFunction,
};
use crate::numeric::Integer;

pub(super) fn register(registry: &FunctionRegistry) {
    for op in [
        CmpOp::Eq,
        CmpOp::NullEq,
        CmpOp::Ne,
        CmpOp::Lt,
        CmpOp::Le,
        CmpOp::Gt,
        CmpOp::Ge,
    ] {
        registry.register_scalar(Arc::new(Comparison { op }));
    }
    registry.register_alias("!=", Arc::new(Comparison { op: CmpOp::Ne }));
    for f in [
        Special::In,
        Special::Between,
        Special::Greatest,
        Special::Least,
        Special::Strcmp,
        Special::Interval,
        Special::IsNull,
        Special::IsNotNull,
        Special::IsTrue,
        Special::IsNotTrue,
        Special::IsFalse,
        Special::IsNotFalse,
    ] {
        registry.register_scalar(Arc::new(f));
    }
    registry.register_alias("ISNULL", Arc::new(Special::IsNull));
}

// ============================================================================
// Comparison kinds
// ============================================================================

/// How two values are compared
#[derive(Debug, Clone, Copy)]
pub enum CompareKind {
    Int,
    Decimal,
    Real,
    String(&'static Collation),
    Datetime,
    Duration,
    Json,
}

impl CompareKind {
    /// Conversion an argument needs before [`compare_values`]
    pub fn cast_for(&self, arg: &ArgType) -> Option<FieldType> {
        if arg.is_null() {
            return None;
        }
        let target = match self {
            CompareKind::Int => class_type(EvalType::Int, &arg.ty),
            CompareKind::Decimal => class_type(EvalType::Decimal, &arg.ty),
            CompareKind::Real => FieldType::double(),
            CompareKind::String(c) => string_type(c),
            CompareKind::Datetime => {
                if arg.eval_type() == EvalType::Datetime {
                    return None;
                }
                FieldType::datetime(6)
            }
            CompareKind::Duration => {
                if arg.eval_type() == EvalType::Duration {
                    return None;
                }
                FieldType::duration(6)
            }
            CompareKind::Json => return None,
        };
        needs_cast(&arg.ty, &target).then_some(target)
    }
}

/// Comparison kind for a set of operands
pub fn compare_kind(args: &[ArgType], operation: &str, plan: &PlanContext) -> Result<CompareKind> {
    let live: Vec<&ArgType> = args.iter().filter(|a| !a.is_null()).collect();
    if live.is_empty() {
        return Ok(CompareKind::Int);
    }
    let types: Vec<EvalType> = live.iter().map(|a| a.eval_type()).collect();
    if types.contains(&EvalType::Json) {
        return Ok(CompareKind::Json);
    }
    if types.iter().all(|t| *t == EvalType::String) {
        let ops: Vec<Derivation> = live.iter().map(|a| string_operand(a, plan)).collect();
        let d = collation::resolve_for_comparison(&ops, operation)?;
        return Ok(CompareKind::String(d.collation));
    }
    let temporal_or_string = types
        .iter()
        .all(|t| matches!(t, EvalType::String | EvalType::Datetime | EvalType::Duration));
    if temporal_or_string {
        if types.contains(&EvalType::Datetime) {
            return Ok(CompareKind::Datetime);
        }
        return Ok(CompareKind::Duration);
    }
    let owned: Vec<ArgType> = live.iter().map(|a| (*a).clone()).collect();
    Ok(match arith_class(&owned) {
        EvalType::Int => CompareKind::Int,
        EvalType::Decimal => CompareKind::Decimal,
        _ => CompareKind::Real,
    })
}

/// JSON view of a value compared against a JSON document
pub(crate) fn json_of(d: &Datum) -> Json {
    match d {
        Datum::Json(j) => (**j).clone(),
        Datum::Null => Json::Null,
        Datum::Int(_) | Datum::UInt(_) | Datum::Float(_) | Datum::Decimal(_) => number_json(d),
        other => Json::String(text_of(other).into_owned()),
    }
}

/// Compare two non-NULL values already converted for `kind`
pub fn compare_values(kind: &CompareKind, a: &Datum, b: &Datum) -> Ordering {
    match kind {
        CompareKind::Int => int_wide(a).cmp(&int_wide(b)),
        CompareKind::Decimal => decimal_of(a).cmp(&decimal_of(b)),
        CompareKind::Real => real_of(a).partial_cmp(&real_of(b)).unwrap_or(Ordering::Equal),
        CompareKind::String(c) if c.charset == Charset::Binary => bytes_of(a).cmp(&bytes_of(b)),
        CompareKind::String(c) => c.compare(&text_of(a), &text_of(b)),
        CompareKind::Datetime => match (a.as_time(), b.as_time()) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => real_of(a).partial_cmp(&real_of(b)).unwrap_or(Ordering::Equal),
        },
        CompareKind::Duration => match (a.as_duration(), b.as_duration()) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
        CompareKind::Json => json::compare(&json_of(a), &json_of(b)),
    }
}

#[inline]
fn int_wide(d: &Datum) -> i128 {
    Integer::from_datum(d)
        .map(Integer::wide)
        .unwrap_or_else(|| super::int_of(d) as i128)
}

fn casts_for(kind: &CompareKind, args: &[ArgType]) -> Vec<Option<FieldType>> {
    args.iter().map(|a| kind.cast_for(a)).collect()
}

// ============================================================================
// Binary comparison operators
// ============================================================================

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NullEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn name(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::NullEq => "<=>",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    #[inline]
    pub fn test(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq | CmpOp::NullEq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

/// Resolver for a binary comparison
pub struct Comparison {
    op: CmpOp,
}

impl ScalarFunction for Comparison {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            self.op.name(),
            FunctionType::Scalar,
            "Comparison operator",
            FunctionSignature::exact(2),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        FunctionSignature::exact(2).validate_arg_count(self.op.name(), args.len())?;
        let kind = compare_kind(args, self.op.name(), plan)?;
        let ret = FieldType::boolean();
        Ok(Resolution {
            derivation: result_derivation(&ret, plan),
            return_type: ret,
            casts: casts_for(&kind, args),
            implementation: Arc::new(CmpImpl { op: self.op, kind }),
        })
    }
}

struct CmpImpl {
    op: CmpOp,
    kind: CompareKind,
}

impl FunctionImpl for CmpImpl {
    fn eval_row(&self, args: &[Datum], _call: &mut Call<'_>) -> Result<Datum> {
        let (a, b) = (&args[0], &args[1]);
        if self.op == CmpOp::NullEq {
            return Ok(Datum::boolean(match (a.is_null(), b.is_null()) {
                (true, true) => true,
                (false, false) => compare_values(&self.kind, a, b) == Ordering::Equal,
                _ => false,
            }));
        }
        Ok(Datum::boolean(self.op.test(compare_values(&self.kind, a, b))))
    }

    fn null_policy(&self) -> NullPolicy {
        if self.op == CmpOp::NullEq {
            NullPolicy::Tolerant
        } else {
            NullPolicy::Propagate
        }
    }

    fn eval_batch(
        &self,
        args: &[Column],
        rows: usize,
        ret: &FieldType,
        call: &mut Call<'_>,
    ) -> Result<Column> {
        let null_eq = self.op == CmpOp::NullEq;
        macro_rules! kernel {
            ($a:expr, $na:expr, $b:expr, $nb:expr, $cmp:expr) => {{
                let mut values = Vec::with_capacity(rows);
                let mut nulls = Vec::with_capacity(rows);
                for row in 0..rows {
                    let (xn, yn) = ($na[row], $nb[row]);
                    if xn || yn {
                        if null_eq {
                            values.push((xn && yn) as i64);
                            nulls.push(false);
                        } else {
                            values.push(0);
                            nulls.push(true);
                        }
                        continue;
                    }
                    let ord: Ordering = $cmp(&$a[row], &$b[row]);
                    values.push(self.op.test(ord) as i64);
                    nulls.push(false);
                }
                Ok(Column::Int { values, nulls })
            }};
        }
        match (&args[0], &args[1]) {
            (Column::Int { values: a, nulls: na }, Column::Int { values: b, nulls: nb }) => {
                kernel!(a, na, b, nb, |x: &i64, y: &i64| x.cmp(y))
            }
            (Column::UInt { values: a, nulls: na }, Column::UInt { values: b, nulls: nb }) => {
                kernel!(a, na, b, nb, |x: &u64, y: &u64| x.cmp(y))
            }
            (Column::Real { values: a, nulls: na }, Column::Real { values: b, nulls: nb }) => {
                kernel!(a, na, b, nb, |x: &f64, y: &f64| x
                    .partial_cmp(y)
                    .unwrap_or(Ordering::Equal))
            }
            (
                Column::Decimal { values: a, nulls: na },
                Column::Decimal { values: b, nulls: nb },
            ) => kernel!(a, na, b, nb, |x: &Decimal, y: &Decimal| x.cmp(y)),
            _ => eval_rows(self, args, rows, ret, call),
        }
    }
}

// ============================================================================
// IN, BETWEEN, GREATEST, LEAST, STRCMP, INTERVAL, IS ...
// ============================================================================

/// Other comparison functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    In,
    Between,
    Greatest,
    Least,
    Strcmp,
    Interval,
    IsNull,
    IsNotNull,
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,
}

impl Special {
    fn fn_name(self) -> &'static str {
        match self {
            Special::In => "IN",
            Special::Between => "BETWEEN",
            Special::Greatest => "GREATEST",
            Special::Least => "LEAST",
            Special::Strcmp => "STRCMP",
            Special::Interval => "INTERVAL",
            Special::IsNull => "IS NULL",
            Special::IsNotNull => "IS NOT NULL",
            Special::IsTrue => "IS TRUE",
            Special::IsNotTrue => "IS NOT TRUE",
            Special::IsFalse => "IS FALSE",
            Special::IsNotFalse => "IS NOT FALSE",
        }
    }

    fn signature(self) -> FunctionSignature {
        match self {
            Special::In | Special::Interval | Special::Greatest | Special::Least => {
                FunctionSignature::variadic(2)
            }
            Special::Between => FunctionSignature::exact(3),
            Special::Strcmp => FunctionSignature::exact(2),
            _ => FunctionSignature::exact(1),
        }
    }
}

impl ScalarFunction for Special {
    fn name(&self) -> &str {
        self.fn_name()
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            self.fn_name(),
            FunctionType::Scalar,
            "Comparison function",
            self.signature(),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        self.signature().validate_arg_count(self.fn_name(), args.len())?;
        let op = self.fn_name().to_ascii_lowercase();
        let boolean = FieldType::boolean();
        let (ret, derivation, casts, kind) = match self {
            Special::In | Special::Between | Special::Strcmp => {
                let kind = compare_kind(args, &op, plan)?;
                let ret = if *self == Special::Strcmp {
                    int_type()
                } else {
                    boolean
                };
                (ret, None, casts_for(&kind, args), kind)
            }
            Special::Greatest | Special::Least => {
                let kind = compare_kind(args, &op, plan)?;
                let (ret, d) = extreme_type(args, &kind, plan)?;
                let casts = args
                    .iter()
                    .map(|a| {
                        if a.is_null() || !needs_cast(&a.ty, &ret) {
                            None
                        } else {
                            Some(ret.clone())
                        }
                    })
                    .collect();
                (ret, d, casts, kind)
            }
            Special::Interval => {
                let casts = args
                    .iter()
                    .map(|a| (!a.is_null() && needs_cast(&a.ty, &FieldType::double()))
                        .then(FieldType::double))
                    .collect();
                (int_type(), None, casts, CompareKind::Real)
            }
            Special::IsNull | Special::IsNotNull => (boolean, None, vec![None], CompareKind::Int),
            _ => (boolean, None, vec![truth_cast(&args[0])], CompareKind::Int),
        };
        let derivation = derivation.unwrap_or_else(|| result_derivation(&ret, plan));
        Ok(Resolution {
            return_type: ret,
            derivation,
            casts,
            implementation: Arc::new(SpecialImpl {
                function: *self,
                kind,
            }),
        })
    }
}

/// Result type of GREATEST / LEAST
fn extreme_type(
    args: &[ArgType],
    kind: &CompareKind,
    plan: &PlanContext,
) -> Result<(FieldType, Option<Derivation>)> {
    let live: Vec<&ArgType> = args.iter().filter(|a| !a.is_null()).collect();
    let fsp = live.iter().map(|a| a.ty.fsp()).max().unwrap_or(0);
    Ok(match kind {
        CompareKind::String(c) => {
            let ops: Vec<Derivation> = live.iter().map(|a| string_operand(a, plan)).collect();
            let mut d = collation::resolve(&ops, "greatest")?;
            d.collation = *c;
            (string_type(c), Some(d))
        }
        CompareKind::Datetime if live.iter().all(|a| a.ty.kind == FieldKind::Date) => {
            (FieldType::date(), None)
        }
        CompareKind::Datetime => (FieldType::datetime(fsp), None),
        CompareKind::Duration => (FieldType::duration(fsp), None),
        CompareKind::Json => (FieldType::json(), None),
        CompareKind::Int => {
            if !live.is_empty() && live.iter().all(|a| a.ty.is_unsigned()) {
                (uint_type(), None)
            } else {
                (int_type(), None)
            }
        }
        CompareKind::Decimal => {
            let int_digits = live.iter().map(|a| decimal_int_digits(&a.ty)).max();
            let scale = live.iter().map(|a| decimal_scale(&a.ty)).max();
            (
                decimal_type(int_digits.unwrap_or(1), scale.unwrap_or(0)),
                None,
            )
        }
        CompareKind::Real => (FieldType::double(), None),
    })
}

struct SpecialImpl {
    function: Special,
    kind: CompareKind,
}

impl SpecialImpl {
    /// Three-valued comparison
    fn cmp3(&self, a: &Datum, b: &Datum) -> Option<Ordering> {
        if a.is_null() || b.is_null() {
            return None;
        }
        Some(compare_values(&self.kind, a, b))
    }
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

impl FunctionImpl for SpecialImpl {
    fn eval_row(&self, args: &[Datum], _call: &mut Call<'_>) -> Result<Datum> {
        Ok(match self.function {
            Special::In => {
                if args[0].is_null() {
                    return Ok(Datum::Null);
                }
                let mut saw_null = false;
                for item in &args[1..] {
                    match self.cmp3(&args[0], item) {
                        Some(Ordering::Equal) => return Ok(Datum::boolean(true)),
                        Some(_) => {}
                        None => saw_null = true,
                    }
                }
                if saw_null {
                    Datum::Null
                } else {
                    Datum::boolean(false)
                }
            }
            Special::Between => {
                let low = self.cmp3(&args[0], &args[1]).map(|o| o != Ordering::Less);
                let high = self.cmp3(&args[0], &args[2]).map(|o| o != Ordering::Greater);
                Datum::tri(and3(low, high))
            }
            Special::Greatest | Special::Least => {
                let want = if self.function == Special::Greatest {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
                let mut best = &args[0];
                for v in &args[1..] {
                    if compare_values(&self.kind, v, best) == want {
                        best = v;
                    }
                }
                best.clone()
            }
            Special::Strcmp => Datum::Int(match compare_values(&self.kind, &args[0], &args[1]) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            }),
            Special::Interval => {
                if args[0].is_null() {
                    return Ok(Datum::Int(-1));
                }
                let n = real_of(&args[0]);
                let mut index = 0;
                for (i, v) in args[1..].iter().enumerate() {
                    if !v.is_null() && n < real_of(v) {
                        return Ok(Datum::Int(i as i64));
                    }
                    index = i as i64 + 1;
                }
                Datum::Int(index)
            }
            Special::IsNull => Datum::boolean(args[0].is_null()),
            Special::IsNotNull => Datum::boolean(!args[0].is_null()),
            Special::IsTrue => Datum::boolean(truth(&args[0]) == Some(true)),
            Special::IsNotTrue => Datum::boolean(truth(&args[0]) != Some(true)),
            Special::IsFalse => Datum::boolean(truth(&args[0]) == Some(false)),
            Special::IsNotFalse => Datum::boolean(truth(&args[0]) != Some(false)),
        })
    }

    fn null_policy(&self) -> NullPolicy {
        match self.function {
            Special::Greatest | Special::Least | Special::Strcmp => NullPolicy::Propagate,
            _ => NullPolicy::Tolerant,
        }
    }
}
