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

//! Control flow and logical operators
//!
//! `IF`, `IFNULL`, `COALESCE`, `CASE`, `AND` and `OR` evaluate their
//! arguments on demand, so a branch that is not taken never raises a
//! warning or error.

use std::sync::Arc;

use super::comparison::{compare_kind, compare_values, CompareKind};
use super::{
    arith_class, class_type, decimal_int_digits, decimal_scale, decimal_type, int_type,
    needs_cast, real_of, result_derivation, string_derivation, string_type, uint_type,
};
use crate::collation::Derivation;
use crate::convert::{cast, CastMode};
use crate::core::{Datum, EvalType, FieldKind, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{
    ArgSource, ArgType, Call, FunctionImpl, FunctionInfo, FunctionSignature, FunctionType,
    NullPolicy, PlanContext, Resolution, ScalarFunction,
};

pub(super) fn register(registry: &FunctionRegistry) {
    for kind in [
        Control::If,
        Control::IfNull,
        Control::Coalesce,
        Control::Case,
        Control::And,
        Control::Or,
        Control::Xor,
        Control::Not,
        Control::NullIf,
    ] {
        registry.register_scalar(Arc::new(kind));
    }
    registry.register_alias("&&", Arc::new(Control::And));
    registry.register_alias("||", Arc::new(Control::Or));
    registry.register_alias("!", Arc::new(Control::Not));
}

// ============================================================================
// Truth values and result types
// ============================================================================

/// Truth value of an argument converted by [`truth_cast`]
#[inline]
pub(crate) fn truth(d: &Datum) -> Option<bool> {
    match d {
        Datum::Null => None,
        Datum::Int(v) => Some(*v != 0),
        Datum::UInt(v) => Some(*v != 0),
        Datum::Float(f) => Some(*f != 0.0),
        Datum::Decimal(v) => Some(!v.is_zero()),
        other => Some(real_of(other) != 0.0),
    }
}

/// Conversion a condition needs before [`truth`] can read it
pub(crate) fn truth_cast(arg: &ArgType) -> Option<FieldType> {
    if arg.is_null() {
        return None;
    }
    match arg.eval_type() {
        EvalType::Int | EvalType::Decimal | EvalType::Real => None,
        _ => Some(FieldType::double()),
    }
}

/// Common type of values that may be returned in place of each other
/// (CASE branches, IF, COALESCE)
pub(crate) fn type_union(
    args: &[&ArgType],
    operation: &str,
    plan: &PlanContext,
) -> Result<(FieldType, Option<Derivation>)> {
    let live: Vec<&ArgType> = args.iter().copied().filter(|a| !a.is_null()).collect();
    if live.is_empty() {
        return Ok((FieldType::null(), None));
    }
    let types: Vec<EvalType> = live.iter().map(|a| a.eval_type()).collect();
    if types.iter().all(|t| *t == EvalType::Json) {
        return Ok((FieldType::json(), None));
    }
    if types.iter().all(|t| t.is_numeric()) {
        let class = arith_class(&live.iter().map(|a| (*a).clone()).collect::<Vec<_>>());
        let ty = match class {
            EvalType::Int => {
                let unsigned = live.iter().filter(|a| a.ty.is_unsigned()).count();
                if unsigned == live.len() {
                    uint_type()
                } else if unsigned == 0 {
                    int_type()
                } else {
                    decimal_type(20, 0)
                }
            }
            EvalType::Decimal => {
                let int_digits = live.iter().map(|a| decimal_int_digits(&a.ty)).max();
                let scale = live.iter().map(|a| decimal_scale(&a.ty)).max();
                decimal_type(int_digits.unwrap_or(1), scale.unwrap_or(0))
            }
            _ => FieldType::double(),
        };
        return Ok((ty, None));
    }
    if types
        .iter()
        .all(|t| matches!(t, EvalType::Datetime | EvalType::Duration))
    {
        let fsp = live.iter().map(|a| a.ty.fsp()).max().unwrap_or(0);
        if types.iter().all(|t| *t == EvalType::Duration) {
            return Ok((FieldType::duration(fsp), None));
        }
        if types.iter().all(|t| *t == EvalType::Datetime) {
            if live.iter().all(|a| a.ty.kind == FieldKind::Date) {
                return Ok((FieldType::date(), None));
            }
            return Ok((FieldType::datetime(fsp), None));
        }
    }
    let owned: Vec<ArgType> = live.iter().map(|a| (*a).clone()).collect();
    let d = string_derivation(&owned, operation, plan)?;
    Ok((string_type(d.collation), Some(d)))
}

fn union_cast(arg: &ArgType, ret: &FieldType) -> Option<FieldType> {
    if ret.kind == FieldKind::Null || arg.is_null() {
        return None;
    }
    if ret.eval_type().is_numeric() && arg.eval_type().is_numeric() {
        let target = match ret.eval_type() {
            EvalType::Int if ret.is_unsigned() => uint_type(),
            // every branch takes the result's scale
            EvalType::Decimal => {
                let rescale = arg.eval_type() == EvalType::Decimal
                    && decimal_scale(&arg.ty) != decimal_scale(ret);
                return (rescale || needs_cast(&arg.ty, ret)).then(|| ret.clone());
            }
            class => class_type(class, &arg.ty),
        };
        return needs_cast(&arg.ty, &target).then_some(target);
    }
    needs_cast(&arg.ty, ret).then(|| ret.clone())
}

// ============================================================================
// Functions
// ============================================================================

/// Control-flow builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    If,
    IfNull,
    Coalesce,
    Case,
    NullIf,
    And,
    Or,
    Xor,
    Not,
}

impl Control {
    fn fn_name(self) -> &'static str {
        match self {
            Control::If => "IF",
            Control::IfNull => "IFNULL",
            Control::Coalesce => "COALESCE",
            Control::Case => "CASE",
            Control::NullIf => "NULLIF",
            Control::And => "AND",
            Control::Or => "OR",
            Control::Xor => "XOR",
            Control::Not => "NOT",
        }
    }

    fn signature(self) -> FunctionSignature {
        match self {
            Control::If => FunctionSignature::exact(3),
            Control::IfNull | Control::NullIf | Control::Xor => FunctionSignature::exact(2),
            Control::Coalesce => FunctionSignature::variadic(1),
            Control::Case => FunctionSignature::variadic(2),
            Control::And | Control::Or => FunctionSignature::variadic(2),
            Control::Not => FunctionSignature::exact(1),
        }
    }
}

impl ScalarFunction for Control {
    fn name(&self) -> &str {
        self.fn_name()
    }

    fn info(&self) -> FunctionInfo {
        let description = match self {
            Control::And | Control::Or | Control::Xor | Control::Not => "Logical operator",
            _ => "Control flow function",
        };
        FunctionInfo::new(
            self.fn_name(),
            FunctionType::Scalar,
            description,
            self.signature(),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        self.signature().validate_arg_count(self.fn_name(), args.len())?;
        let op = self.fn_name().to_ascii_lowercase();
        let (ret, derivation, casts, implementation): (_, _, _, Arc<dyn FunctionImpl>) =
            match self {
                Control::If => {
                    let (ret, d) = type_union(&[&args[1], &args[2]], &op, plan)?;
                    let casts = vec![
                        truth_cast(&args[0]),
                        union_cast(&args[1], &ret),
                        union_cast(&args[2], &ret),
                    ];
                    (ret, d, casts, Arc::new(Lazy::If))
                }
                Control::IfNull | Control::Coalesce => {
                    let refs: Vec<&ArgType> = args.iter().collect();
                    let (ret, d) = type_union(&refs, &op, plan)?;
                    let casts = args.iter().map(|a| union_cast(a, &ret)).collect();
                    (ret, d, casts, Arc::new(Lazy::Coalesce))
                }
                Control::Case => {
                    let branches: Vec<&ArgType> = args
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| i % 2 == 1 || *i == args.len() - 1)
                        .map(|(_, a)| a)
                        .collect();
                    let (ret, d) = type_union(&branches, &op, plan)?;
                    let has_else = args.len() % 2 == 1;
                    let casts = args
                        .iter()
                        .enumerate()
                        .map(|(i, a)| {
                            let is_when = i % 2 == 0 && !(has_else && i == args.len() - 1);
                            if is_when {
                                truth_cast(a)
                            } else {
                                union_cast(a, &ret)
                            }
                        })
                        .collect();
                    (ret, d, casts, Arc::new(Lazy::Case))
                }
                Control::NullIf => {
                    let kind = compare_kind(args, "nullif", plan)?;
                    let mut ret = args[0].ty.clone();
                    let mut d = None;
                    if ret.eval_type() == EvalType::String && !args[0].is_null() {
                        let resolved = string_derivation(&args[..1], "nullif", plan)?;
                        ret = string_type(resolved.collation);
                        d = Some(resolved);
                    }
                    let targets = args.iter().map(|a| kind.cast_for(a)).collect();
                    (ret, d, vec![None, None], Arc::new(NullIfImpl { kind, targets }))
                }
                Control::And | Control::Or => {
                    let casts = args.iter().map(truth_cast).collect();
                    let lazy = if *self == Control::And {
                        Lazy::And
                    } else {
                        Lazy::Or
                    };
                    (FieldType::boolean(), None, casts, Arc::new(lazy))
                }
                Control::Xor | Control::Not => {
                    let casts = args.iter().map(truth_cast).collect();
                    let logic = if *self == Control::Xor {
                        Logic::Xor
                    } else {
                        Logic::Not
                    };
                    (FieldType::boolean(), None, casts, Arc::new(logic))
                }
            };
        let derivation = derivation.unwrap_or_else(|| result_derivation(&ret, plan));
        Ok(Resolution {
            return_type: ret,
            derivation,
            casts,
            implementation,
        })
    }
}

/// Short-circuiting functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lazy {
    If,
    Coalesce,
    Case,
    And,
    Or,
}

/// Arguments already evaluated, for row-at-a-time callers
struct Evaluated<'a>(&'a [Datum]);

impl ArgSource for Evaluated<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn eval(&mut self, index: usize, _call: &mut Call<'_>) -> Result<Datum> {
        Ok(self.0[index].clone())
    }
}

impl FunctionImpl for Lazy {
    fn eval_row(&self, args: &[Datum], call: &mut Call<'_>) -> Result<Datum> {
        self.eval_lazy(&mut Evaluated(args), call)
    }

    fn null_policy(&self) -> NullPolicy {
        NullPolicy::Tolerant
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn eval_lazy(&self, args: &mut dyn ArgSource, call: &mut Call<'_>) -> Result<Datum> {
        match self {
            Lazy::If => {
                let cond = args.eval(0, call)?;
                if truth(&cond) == Some(true) {
                    args.eval(1, call)
                } else {
                    args.eval(2, call)
                }
            }
            Lazy::Coalesce => {
                for i in 0..args.len() {
                    let v = args.eval(i, call)?;
                    if !v.is_null() {
                        return Ok(v);
                    }
                }
                Ok(Datum::Null)
            }
            Lazy::Case => {
                let n = args.len();
                let pairs = n / 2;
                for p in 0..pairs {
                    let cond = args.eval(2 * p, call)?;
                    if truth(&cond) == Some(true) {
                        return args.eval(2 * p + 1, call);
                    }
                }
                if n % 2 == 1 {
                    return args.eval(n - 1, call);
                }
                Ok(Datum::Null)
            }
            Lazy::And | Lazy::Or => {
                let stop = *self == Lazy::Or;
                let mut saw_null = false;
                for i in 0..args.len() {
                    match truth(&args.eval(i, call)?) {
                        Some(v) if v == stop => return Ok(Datum::boolean(stop)),
                        Some(_) => {}
                        None => saw_null = true,
                    }
                }
                if saw_null {
                    Ok(Datum::Null)
                } else {
                    Ok(Datum::boolean(!stop))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Logic {
    Xor,
    Not,
}

impl FunctionImpl for Logic {
    fn eval_row(&self, args: &[Datum], _call: &mut Call<'_>) -> Result<Datum> {
        Ok(match self {
            Logic::Xor => Datum::tri(truth(&args[0]).zip(truth(&args[1])).map(|(a, b)| a != b)),
            Logic::Not => Datum::tri(truth(&args[0]).map(|v| !v)),
        })
    }
}

/// `NULLIF(a, b)`: compares in the common comparison type but returns
/// `a` unconverted
struct NullIfImpl {
    kind: CompareKind,
    targets: Vec<Option<FieldType>>,
}

impl FunctionImpl for NullIfImpl {
    fn eval_row(&self, args: &[Datum], call: &mut Call<'_>) -> Result<Datum> {
        if args[0].is_null() || args[1].is_null() {
            return Ok(args[0].clone());
        }
        let mut converted = Vec::with_capacity(2);
        for (value, target) in args.iter().zip(&self.targets) {
            converted.push(match target {
                Some(t) => cast(value.clone(), t, CastMode::Implicit, call.ctx, call.diag)?,
                None => value.clone(),
            });
        }
        if compare_values(&self.kind, &converted[0], &converted[1]) == std::cmp::Ordering::Equal {
            Ok(Datum::Null)
        } else {
            Ok(args[0].clone())
        }
    }

    fn null_policy(&self) -> NullPolicy {
        NullPolicy::Tolerant
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{dec, eval, f, i, s};
    use crate::core::Datum;

    #[test]
    fn test_if() {
        assert_eq!(eval("IF", &[i(1), s("yes"), s("no")]), "yes");
        assert_eq!(eval("IF", &[i(0), s("yes"), s("no")]), "no");
        assert_eq!(eval("IF", &[Datum::Null, i(1), i(2)]), "2");
        assert_eq!(eval("IF", &[s("0.5"), i(1), i(2)]), "1");
        assert_eq!(eval("IF", &[i(1), i(1), dec("2.50")]), "1.00");
    }

    #[test]
    fn test_ifnull_coalesce() {
        assert_eq!(eval("IFNULL", &[Datum::Null, i(7)]), "7");
        assert_eq!(eval("IFNULL", &[i(3), i(7)]), "3");
        assert_eq!(eval("COALESCE", &[Datum::Null, Datum::Null, s("x")]), "x");
        assert_eq!(eval("COALESCE", &[Datum::Null]), "NULL");
        assert_eq!(eval("COALESCE", &[Datum::Null, i(1), f(2.5)]), "1");
        assert_eq!(eval("IFNULL", &[i(3), dec("7.25")]), "3.00");
        assert_eq!(eval("COALESCE", &[Datum::Null, i(1), dec("2.50")]), "1.00");
        assert_eq!(eval("COALESCE", &[dec("1.5"), dec("2.50")]), "1.50");
    }

    #[test]
    fn test_case() {
        assert_eq!(eval("CASE", &[i(0), s("a"), i(1), s("b"), s("c")]), "b");
        assert_eq!(eval("CASE", &[i(0), s("a"), i(0), s("b"), s("c")]), "c");
        assert_eq!(eval("CASE", &[i(0), s("a")]), "NULL");
        assert_eq!(eval("CASE", &[i(1), i(4), dec("0.125")]), "4.000");
        assert_eq!(eval("CASE", &[i(0), i(4), dec("0.125")]), "0.125");
    }

    #[test]
    fn test_nullif() {
        assert_eq!(eval("NULLIF", &[i(1), i(1)]), "NULL");
        assert_eq!(eval("NULLIF", &[i(1), i(2)]), "1");
        assert_eq!(eval("NULLIF", &[s("a"), s("A")]), "NULL");
        assert_eq!(eval("NULLIF", &[Datum::Null, i(2)]), "NULL");
    }

    #[test]
    fn test_three_valued_logic() {
        assert_eq!(eval("AND", &[i(1), Datum::Null]), "NULL");
        assert_eq!(eval("AND", &[i(0), Datum::Null]), "0");
        assert_eq!(eval("OR", &[i(1), Datum::Null]), "1");
        assert_eq!(eval("OR", &[i(0), Datum::Null]), "NULL");
        assert_eq!(eval("OR", &[i(0), i(0), i(2)]), "1");
        assert_eq!(eval("XOR", &[i(1), i(1)]), "0");
        assert_eq!(eval("XOR", &[i(1), Datum::Null]), "NULL");
        assert_eq!(eval("NOT", &[f(0.0)]), "1");
        assert_eq!(eval("NOT", &[Datum::Null]), "NULL");
    }
}
