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

//! Arithmetic operators
//!
//! `+ - * / DIV MOD` and unary minus. The operand class (integer,
//! decimal or double) is fixed at resolution; every operation goes
//! through the checked primitives in [`crate::numeric`], so overflow is
//! reported as `OutOfRange` with the expression text and division by
//! zero goes through the diagnostics policy.

use std::sync::Arc;

use num_traits::ToPrimitive;

use super::{
    arith_class, decimal_int_digits, decimal_of, decimal_scale, decimal_type, int_type,
    numeric_casts, real_of, result_derivation, uint_type,
};
use crate::core::{Datum, EvalType, FieldType, Result, SqlMode};
use crate::eval::Column;
use crate::functions::registry::FunctionRegistry;
use crate::functions::{
    eval_rows, ArgType, Call, FunctionImpl, FunctionInfo, FunctionSignature, FunctionType,
    PlanContext, Resolution, ScalarFunction,
};
use crate::numeric::{self, ArithError, ArithResult, Integer};

pub(super) fn register(registry: &FunctionRegistry) {
    for op in [
        ArithOp::Add,
        ArithOp::Sub,
        ArithOp::Mul,
        ArithOp::Div,
        ArithOp::IntDiv,
        ArithOp::Mod,
    ] {
        registry.register_scalar(Arc::new(Arithmetic { op }));
    }
    registry.register_alias("%", Arc::new(Arithmetic { op: ArithOp::Mod }));
    registry.register_scalar(Arc::new(Negate));
}

/// Binary arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
}

impl ArithOp {
    /// Registered name
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::IntDiv => "DIV",
            ArithOp::Mod => "MOD",
        }
    }

    /// Operator as printed in error messages
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::IntDiv => "DIV",
            ArithOp::Mod => "%",
            other => other.name(),
        }
    }
}

/// Resolver for a binary arithmetic operator
pub struct Arithmetic {
    op: ArithOp,
}

impl ScalarFunction for Arithmetic {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            self.op.name(),
            FunctionType::Scalar,
            "Arithmetic operator",
            FunctionSignature::exact(2),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        FunctionSignature::exact(2).validate_arg_count(self.op.name(), args.len())?;
        let op = self.op;
        let mut class = arith_class(args);
        match op {
            ArithOp::Div if class != EvalType::Real => class = EvalType::Decimal,
            ArithOp::IntDiv if class != EvalType::Int => class = EvalType::Decimal,
            _ => {}
        }
        let casts = numeric_casts(args, class);
        let unsigned_of = |a: &ArgType| {
            a.ty.eval_type() == EvalType::Int && a.ty.is_unsigned() && !a.is_null()
        };
        let (ua, ub) = (unsigned_of(&args[0]), unsigned_of(&args[1]));
        let unsigned = match op {
            ArithOp::Sub => numeric::subtraction_unsigned(
                ua,
                ub,
                plan.sql_mode.contains(SqlMode::NO_UNSIGNED_SUBTRACTION),
            ),
            ArithOp::Mod => ua,
            _ => numeric::additive_unsigned(ua, ub),
        };

        let (sa, sb) = (decimal_scale(&args[0].ty), decimal_scale(&args[1].ty));
        let (ia, ib) = (
            decimal_int_digits(&args[0].ty),
            decimal_int_digits(&args[1].ty),
        );
        let div_scale = numeric::division_scale(sa as u32, plan.div_precision_increment);
        let ret = match (op, class) {
            (ArithOp::IntDiv, _) | (_, EvalType::Int) => {
                if unsigned {
                    uint_type()
                } else {
                    int_type()
                }
            }
            (_, EvalType::Real) => FieldType::double(),
            (ArithOp::Add | ArithOp::Sub, _) => decimal_type(ia.max(ib) + 1, sa.max(sb)),
            (ArithOp::Mul, _) => decimal_type(ia + ib, sa + sb),
            (ArithOp::Div, _) => decimal_type(ia + sb, div_scale as i32),
            (ArithOp::Mod, _) => decimal_type(ia.max(ib), sa.max(sb)),
        };
        let type_name = match (op, class) {
            (ArithOp::IntDiv, _) | (_, EvalType::Int) => numeric::int_type_name(unsigned),
            (_, EvalType::Real) => "DOUBLE",
            _ => "DECIMAL",
        };
        let derivation = result_derivation(&ret, plan);
        Ok(Resolution {
            return_type: ret,
            derivation,
            casts,
            implementation: Arc::new(ArithImpl {
                op,
                class,
                unsigned,
                div_scale,
                type_name,
                display: format!("({} {} {})", args[0].display, op.symbol(), args[1].display),
            }),
        })
    }
}

#[inline]
fn integer(d: &Datum) -> Integer {
    Integer::from_datum(d).unwrap_or(Integer::Signed(super::int_of(d)))
}

/// Resolved arithmetic operator
struct ArithImpl {
    op: ArithOp,
    class: EvalType,
    unsigned: bool,
    div_scale: u32,
    type_name: &'static str,
    display: String,
}

impl ArithImpl {
    fn compute(&self, a: &Datum, b: &Datum) -> ArithResult<Datum> {
        match self.class {
            EvalType::Int => {
                let (x, y) = (integer(a), integer(b));
                let r = match self.op {
                    ArithOp::Add => numeric::int_add(x, y, self.unsigned)?,
                    ArithOp::Sub => numeric::int_sub(x, y, self.unsigned)?,
                    ArithOp::Mul => numeric::int_mul(x, y, self.unsigned)?,
                    ArithOp::IntDiv | ArithOp::Div => numeric::int_div(x, y, self.unsigned)?,
                    ArithOp::Mod => numeric::int_mod(x, y)?,
                };
                Ok(r.into_datum())
            }
            EvalType::Real => {
                let (x, y) = (real_of(a), real_of(b));
                let r = match self.op {
                    ArithOp::Add => numeric::real_add(x, y)?,
                    ArithOp::Sub => numeric::real_sub(x, y)?,
                    ArithOp::Mul => numeric::real_mul(x, y)?,
                    ArithOp::Div => numeric::real_div(x, y)?,
                    ArithOp::Mod => numeric::real_mod(x, y)?,
                    ArithOp::IntDiv => return Err(ArithError::Overflow),
                };
                Ok(Datum::Float(r))
            }
            _ => {
                let (x, y) = (decimal_of(a), decimal_of(b));
                let r = match self.op {
                    ArithOp::Add => numeric::decimal_add(x, y)?,
                    ArithOp::Sub => numeric::decimal_sub(x, y)?,
                    ArithOp::Mul => numeric::decimal_mul(x, y)?,
                    ArithOp::Div => numeric::decimal_div(x, y, self.div_scale)?,
                    ArithOp::Mod => numeric::decimal_mod(x, y)?,
                    ArithOp::IntDiv => {
                        let q = numeric::decimal_int_div(x, y)?;
                        let wide = q.to_i128().ok_or(ArithError::Overflow)?;
                        return Ok(Integer::narrow(wide, self.unsigned)?.into_datum());
                    }
                };
                Ok(Datum::Decimal(r))
            }
        }
    }

    /// Route a failed primitive through the diagnostics policy
    fn fail(&self, err: ArithError, call: &mut Call<'_>) -> Result<Datum> {
        call.observe(err.into_error(self.type_name, &self.display))?;
        Ok(Datum::Null)
    }
}

impl FunctionImpl for ArithImpl {
    fn eval_row(&self, args: &[Datum], call: &mut Call<'_>) -> Result<Datum> {
        match self.compute(&args[0], &args[1]) {
            Ok(v) => Ok(v),
            Err(e) => self.fail(e, call),
        }
    }

    fn eval_batch(
        &self,
        args: &[Column],
        rows: usize,
        ret: &FieldType,
        call: &mut Call<'_>,
    ) -> Result<Column> {
        match (self.class, &args[0], &args[1]) {
            (
                EvalType::Int,
                Column::Int { values: a, nulls: na },
                Column::Int { values: b, nulls: nb },
            ) if !self.unsigned => {
                let mut values = Vec::with_capacity(rows);
                let mut nulls = Vec::with_capacity(rows);
                for row in 0..rows {
                    if na[row] || nb[row] {
                        values.push(0);
                        nulls.push(true);
                        continue;
                    }
                    let (x, y) = (a[row], b[row]);
                    let r = match self.op {
                        ArithOp::Add => numeric::checked_add_i64(x, y),
                        ArithOp::Sub => numeric::checked_sub_i64(x, y),
                        ArithOp::Mul => numeric::checked_mul_i64(x, y),
                        ArithOp::IntDiv | ArithOp::Div => numeric::checked_div_i64(x, y),
                        ArithOp::Mod => numeric::int_mod(Integer::Signed(x), Integer::Signed(y))
                            .map(|r| r.wide() as i64),
                    };
                    match r {
                        Ok(v) => {
                            values.push(v);
                            nulls.push(false);
                        }
                        Err(e) => {
                            call.diag.set_row(row);
                            self.fail(e, call)?;
                            values.push(0);
                            nulls.push(true);
                        }
                    }
                }
                Ok(Column::Int { values, nulls })
            }
            (
                EvalType::Real,
                Column::Real { values: a, nulls: na },
                Column::Real { values: b, nulls: nb },
            ) => {
                let mut values = Vec::with_capacity(rows);
                let mut nulls = Vec::with_capacity(rows);
                for row in 0..rows {
                    if na[row] || nb[row] {
                        values.push(0.0);
                        nulls.push(true);
                        continue;
                    }
                    let (x, y) = (a[row], b[row]);
                    let r = match self.op {
                        ArithOp::Add => numeric::real_add(x, y),
                        ArithOp::Sub => numeric::real_sub(x, y),
                        ArithOp::Mul => numeric::real_mul(x, y),
                        ArithOp::Div => numeric::real_div(x, y),
                        ArithOp::Mod => numeric::real_mod(x, y),
                        ArithOp::IntDiv => Err(ArithError::Overflow),
                    };
                    match r {
                        Ok(v) => {
                            values.push(v);
                            nulls.push(false);
                        }
                        Err(e) => {
                            call.diag.set_row(row);
                            self.fail(e, call)?;
                            values.push(0.0);
                            nulls.push(true);
                        }
                    }
                }
                Ok(Column::Real { values, nulls })
            }
            _ => eval_rows(self, args, rows, ret, call),
        }
    }
}

/// Unary minus
pub struct Negate;

impl ScalarFunction for Negate {
    fn name(&self) -> &str {
        "UNARY_MINUS"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "UNARY_MINUS",
            FunctionType::Scalar,
            "Negation",
            FunctionSignature::exact(1),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        FunctionSignature::exact(1).validate_arg_count("UNARY_MINUS", args.len())?;
        let class = arith_class(args);
        let casts = numeric_casts(args, class);
        let ret = match class {
            EvalType::Int => int_type(),
            EvalType::Real => FieldType::double(),
            _ => decimal_type(decimal_int_digits(&args[0].ty), decimal_scale(&args[0].ty)),
        };
        Ok(Resolution {
            derivation: result_derivation(&ret, plan),
            return_type: ret,
            casts,
            implementation: Arc::new(NegateImpl {
                display: format!("-({})", args[0].display),
            }),
        })
    }
}

struct NegateImpl {
    display: String,
}

impl FunctionImpl for NegateImpl {
    fn eval_row(&self, args: &[Datum], call: &mut Call<'_>) -> Result<Datum> {
        match &args[0] {
            Datum::Int(_) | Datum::UInt(_) => match numeric::int_neg(integer(&args[0])) {
                Ok(v) => Ok(v.into_datum()),
                Err(e) => {
                    call.observe(e.into_error("BIGINT", &self.display))?;
                    Ok(Datum::Null)
                }
            },
            Datum::Float(f) => Ok(Datum::Float(-f)),
            other => Ok(Datum::Decimal(-decimal_of(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{dec, eval, eval_with, f, i, s};
    use crate::core::{Datum, SqlMode};
    use crate::diagnostics::Diagnostics;
    use crate::eval::EvalContext;

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(eval("+", &[i(1), i(2)]), "3");
        assert_eq!(eval("-", &[i(1), i(2)]), "-1");
        assert_eq!(eval("*", &[i(6), i(7)]), "42");
        assert_eq!(eval("DIV", &[i(7), i(2)]), "3");
        assert_eq!(eval("MOD", &[i(-7), i(2)]), "-1");
        assert_eq!(eval("%", &[i(7), i(3)]), "1");
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert_eq!(eval("+", &[i(i64::MAX), i(1)]), "ERROR 1690");
        assert_eq!(eval("*", &[i(i64::MAX), i(2)]), "ERROR 1690");
        assert_eq!(eval("-", &[Datum::UInt(1), i(2)]), "ERROR 1690");
        assert_eq!(eval("UNARY_MINUS", &[i(i64::MIN)]), "ERROR 1690");
        assert_eq!(eval("+", &[Datum::UInt(u64::MAX - 1), i(1)]), u64::MAX.to_string());
    }

    #[test]
    fn test_overflow_message() {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let err = eval_with("+", &[i(i64::MAX), i(1)], &ctx, &mut diag).unwrap_err();
        assert_eq!(
            err.to_string(),
            "BIGINT value is out of range in '(9223372036854775807 + 1)'"
        );
    }

    #[test]
    fn test_no_unsigned_subtraction() {
        let ctx = EvalContext::builder()
            .sql_mode(SqlMode::NO_UNSIGNED_SUBTRACTION)
            .build();
        let mut diag = Diagnostics::default();
        let v = eval_with("-", &[Datum::UInt(1), i(2)], &ctx, &mut diag).unwrap();
        assert!(v.identical(&i(-1)));
    }

    #[test]
    fn test_division() {
        assert_eq!(eval("/", &[i(1), i(3)]), "0.3333");
        assert_eq!(eval("/", &[dec("1.00"), i(3)]), "0.333333");
        assert_eq!(eval("/", &[f(1.0), f(4.0)]), "0.25");
        assert_eq!(eval("DIV", &[dec("5.5"), i(2)]), "2");
    }

    #[test]
    fn test_division_by_zero() {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let v = eval_with("/", &[i(1), i(0)], &ctx, &mut diag).unwrap();
        assert!(v.is_null());
        assert_eq!(diag.warnings()[0].code, 1365);

        let strict = EvalContext::builder()
            .sql_mode(SqlMode::ERROR_FOR_DIVISION_BY_ZERO | SqlMode::STRICT_TRANS_TABLES)
            .build();
        let mut diag = Diagnostics::default();
        let err = eval_with("MOD", &[i(1), i(0)], &strict, &mut diag).unwrap_err();
        assert_eq!(err.code(), 1365);
    }

    #[test]
    fn test_mixed_classes() {
        assert_eq!(eval("+", &[dec("1.5"), i(1)]), "2.5");
        assert_eq!(eval("+", &[f(1.5), i(1)]), "2.5");
        assert_eq!(eval("+", &[s("1"), i(1)]), "2");
        assert_eq!(eval("*", &[dec("1.5"), dec("2.25")]), "3.375");
        assert_eq!(eval("UNARY_MINUS", &[dec("2.50")]), "-2.50");
    }

    #[test]
    fn test_null_propagation() {
        assert_eq!(eval("+", &[Datum::Null, i(1)]), "NULL");
        assert_eq!(eval("DIV", &[i(1), Datum::Null]), "NULL");
    }
}
