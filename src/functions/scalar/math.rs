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

//! Math scalar functions
//!
//! This module provides mathematical scalar functions:
//!
//! - [`ABS`], [`SIGN`], [`CEIL`]/[`CEILING`], [`FLOOR`]
//! - [`ROUND`], [`TRUNCATE`]
//! - [`SQRT`], [`POW`]/[`POWER`], [`EXP`], [`LN`], [`LOG`], [`LOG2`], [`LOG10`]
//! - [`PI`], [`SIN`], [`COS`], [`TAN`], [`COT`], [`ASIN`], [`ACOS`], [`ATAN`], [`ATAN2`]
//! - [`DEGREES`], [`RADIANS`], [`RAND`], [`CONV`]
//!
//! Integer and decimal arguments keep their class through ABS, CEIL,
//! FLOOR, ROUND and TRUNCATE. Decimal rounding ties go away from zero;
//! double rounding goes through `rint`, so `ROUND(2.5)` is 3 but
//! `ROUND(25E-1)` is 2.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    decimal_type, int_of, numeric_casts, numeric_class, real_of, register_all,
    result_derivation, text_of, Bound, Builtin, Signature,
};
use crate::convert::number::rint;
use crate::core::{decimal, Datum, EvalType, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{
    ArgType, Call, FunctionImpl, FunctionInfo, FunctionSignature as Sig, FunctionType,
    PlanContext, Resolution, ScalarFunction,
};
use crate::numeric::{self, Integer};

pub(super) fn register(registry: &FunctionRegistry) {
    let ceil = Builtin::new("CEIL", Sig::exact(1), resolve_rounding, eval_ceil)
        .describe("Smallest integer not less than the argument");
    register_all(
        registry,
        vec![
            Builtin::new("ABS", Sig::exact(1), resolve_same_class, eval_abs)
                .describe("Absolute value"),
            Builtin::new("SIGN", Sig::exact(1), resolve_sign, eval_sign)
                .describe("Sign of the argument: -1, 0 or 1"),
            ceil,
            ceil.alias("CEILING"),
            Builtin::new("FLOOR", Sig::exact(1), resolve_rounding, eval_floor)
                .describe("Largest integer not greater than the argument"),
            Builtin::new("ROUND", Sig::new(1, 2), resolve_round, eval_round)
                .describe("Round to the given number of decimals"),
            Builtin::new("TRUNCATE", Sig::exact(2), resolve_round, eval_truncate)
                .describe("Truncate to the given number of decimals"),
            Builtin::new("SQRT", Sig::exact(1), resolve_real, eval_sqrt).describe("Square root"),
            Builtin::new("POW", Sig::exact(2), resolve_real, eval_pow).describe("Power"),
            Builtin::new("POWER", Sig::exact(2), resolve_real, eval_pow).describe("Power"),
            Builtin::new("EXP", Sig::exact(1), resolve_real, eval_exp).describe("e to the power"),
            Builtin::new("LN", Sig::exact(1), resolve_real, eval_ln).describe("Natural logarithm"),
            Builtin::new("LOG", Sig::new(1, 2), resolve_real, eval_log)
                .describe("Natural logarithm, or logarithm to a base"),
            Builtin::new("LOG2", Sig::exact(1), resolve_real, eval_log2),
            Builtin::new("LOG10", Sig::exact(1), resolve_real, eval_log10),
            Builtin::new("PI", Sig::exact(0), resolve_real, eval_pi).describe("The value of pi"),
            Builtin::new("SIN", Sig::exact(1), resolve_real, eval_sin),
            Builtin::new("COS", Sig::exact(1), resolve_real, eval_cos),
            Builtin::new("TAN", Sig::exact(1), resolve_real, eval_tan),
            Builtin::new("COT", Sig::exact(1), resolve_real, eval_cot),
            Builtin::new("ASIN", Sig::exact(1), resolve_real, eval_asin),
            Builtin::new("ACOS", Sig::exact(1), resolve_real, eval_acos),
            Builtin::new("ATAN", Sig::new(1, 2), resolve_real, eval_atan),
            Builtin::new("ATAN2", Sig::exact(2), resolve_real, eval_atan),
            Builtin::new("DEGREES", Sig::exact(1), resolve_real, eval_degrees),
            Builtin::new("RADIANS", Sig::exact(1), resolve_real, eval_radians),
            Builtin::new("CONV", Sig::exact(3), resolve_conv, eval_conv)
                .describe("Convert a number between bases"),
        ],
    );
    registry.register_scalar(Arc::new(Rand));
}

// ============================================================================
// Resolution
// ============================================================================

/// Keep the argument's numeric class (ABS)
fn resolve_same_class(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let class = numeric_class(&args[0].ty);
    let ret = match class {
        EvalType::Real => FieldType::double(),
        class => super::class_type(class, &args[0].ty),
    };
    Ok(Signature::new(ret).casts(numeric_casts(args, class)))
}

fn resolve_sign(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let class = numeric_class(&args[0].ty);
    Ok(Signature::new(FieldType::long_long()).casts(numeric_casts(args, class)))
}

/// CEIL / FLOOR: integers stay integers, decimals lose their scale
fn resolve_rounding(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let class = numeric_class(&args[0].ty);
    let ret = match class {
        EvalType::Int => super::class_type(class, &args[0].ty),
        EvalType::Decimal => decimal_type(super::decimal_int_digits(&args[0].ty) + 1, 0),
        _ => FieldType::double(),
    };
    Ok(Signature::new(ret).casts(numeric_casts(args, class)))
}

/// ROUND / TRUNCATE: the result scale is the constant digit count
fn resolve_round(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let class = numeric_class(&args[0].ty);
    let mut casts = numeric_casts(&args[..1], class);
    if let Some(digits) = args.get(1) {
        let int = FieldType::long_long();
        casts.push(super::needs_cast(&digits.ty, &int).then_some(int));
    }
    let digits = args.get(1).and_then(ArgType::const_int);
    let ret = match class {
        EvalType::Int => super::class_type(class, &args[0].ty),
        EvalType::Decimal => {
            let scale = match digits {
                Some(d) => d.clamp(0, decimal::MAX_SCALE as i64) as i32,
                None if args.len() == 1 => 0,
                None => super::decimal_scale(&args[0].ty),
            };
            decimal_type(super::decimal_int_digits(&args[0].ty) + 1, scale)
        }
        _ => FieldType::double(),
    };
    Ok(Signature::new(ret).casts(casts))
}

fn resolve_real(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::double()).casts(numeric_casts(args, EvalType::Real)))
}

fn resolve_conv(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let int = FieldType::long_long();
    let mut casts = vec![None];
    casts.extend(args[1..].iter().map(|a| super::needs_cast(&a.ty, &int).then(|| int.clone())));
    Ok(Signature::new(super::string_type(plan.collation)).casts(casts))
}

// ============================================================================
// Evaluation
// ============================================================================

#[inline]
fn integer(d: &Datum) -> Integer {
    Integer::from_datum(d).unwrap_or(Integer::Signed(int_of(d)))
}

fn eval_abs(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    match &args[0] {
        Datum::Int(_) | Datum::UInt(_) => match numeric::int_abs(integer(&args[0])) {
            Ok(v) => Ok(v.into_datum()),
            Err(_) => b.out_of_range("BIGINT", call),
        },
        Datum::Decimal(d) => Ok(Datum::Decimal(d.abs())),
        other => Ok(Datum::Float(real_of(other).abs())),
    }
}

fn eval_sign(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let sign = match &args[0] {
        Datum::Int(v) => v.signum(),
        Datum::UInt(v) => (*v > 0) as i64,
        Datum::Decimal(d) if d.is_zero() => 0,
        Datum::Decimal(d) if d.is_sign_negative() => -1,
        Datum::Decimal(_) => 1,
        other => {
            let f = real_of(other);
            if f > 0.0 {
                1
            } else if f < 0.0 {
                -1
            } else {
                0
            }
        }
    };
    Ok(Datum::Int(sign))
}

fn eval_ceil(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(match &args[0] {
        Datum::Decimal(d) => Datum::Decimal(decimal::with_scale(d.ceil(), 0)),
        Datum::Float(f) => Datum::Float(f.ceil()),
        other => other.clone(),
    })
}

fn eval_floor(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(match &args[0] {
        Datum::Decimal(d) => Datum::Decimal(decimal::with_scale(d.floor(), 0)),
        Datum::Float(f) => Datum::Float(f.floor()),
        other => other.clone(),
    })
}

/// Round a double to `digits` decimals with `rint`
pub(crate) fn round_real(x: f64, digits: i64) -> f64 {
    let digits = digits.clamp(-330, 330) as i32;
    let factor = 10f64.powi(digits.abs());
    if digits < 0 && !factor.is_finite() {
        return 0.0_f64.copysign(x);
    }
    let r = if digits >= 0 {
        let scaled = x * factor;
        if !scaled.is_finite() {
            return x;
        }
        rint(scaled) / factor
    } else {
        rint(x / factor) * factor
    };
    if r.is_finite() {
        r
    } else {
        x
    }
}

fn truncate_real(x: f64, digits: i64) -> f64 {
    let digits = digits.clamp(-330, 330) as i32;
    let factor = 10f64.powi(digits.abs());
    if digits < 0 && !factor.is_finite() {
        return 0.0_f64.copysign(x);
    }
    if digits >= 0 {
        let scaled = x * factor;
        if !scaled.is_finite() {
            return x;
        }
        scaled.trunc() / factor
    } else {
        (x / factor).trunc() * factor
    }
}

/// Round or truncate an integer to a negative digit count
fn int_to_digits(v: Integer, digits: i64, round: bool) -> numeric::ArithResult<Integer> {
    if digits >= 0 {
        return Ok(v);
    }
    if digits < -20 {
        return Integer::narrow(0, v.is_unsigned());
    }
    let p = 10i128.pow(digits.unsigned_abs() as u32);
    let x = v.wide();
    let rem = x % p;
    let mut r = x - rem;
    if round && rem.abs() * 2 >= p {
        r += if x < 0 { -p } else { p };
    }
    Integer::narrow(r, v.is_unsigned())
}

fn digits_arg(args: &[Datum]) -> i64 {
    args.get(1).map(int_of).unwrap_or(0)
}

fn eval_round(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    round_or_truncate(args, b, call, true)
}

fn eval_truncate(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    round_or_truncate(args, b, call, false)
}

fn round_or_truncate(args: &[Datum], b: &Bound, call: &mut Call<'_>, round: bool) -> Result<Datum> {
    let digits = digits_arg(args);
    match &args[0] {
        Datum::Int(_) | Datum::UInt(_) => match int_to_digits(integer(&args[0]), digits, round) {
            Ok(v) => Ok(v.into_datum()),
            Err(_) => b.out_of_range(numeric::int_type_name(b.ret.is_unsigned()), call),
        },
        Datum::Decimal(d) => {
            let r = if round {
                decimal::round(*d, digits)
            } else {
                decimal::truncate(*d, digits)
            };
            let scale = b.ret.decimal.max(0) as u32;
            Ok(Datum::Decimal(decimal::with_scale(r, scale)))
        }
        other => {
            let x = real_of(other);
            Ok(Datum::Float(if round {
                round_real(x, digits)
            } else {
                truncate_real(x, digits)
            }))
        }
    }
}

/// Double result, or an out-of-range condition when it is not finite
fn finite(v: f64, b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    if v.is_finite() {
        Ok(Datum::Float(v))
    } else {
        b.out_of_range("DOUBLE", call)
    }
}

fn eval_sqrt(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let x = real_of(&args[0]);
    Ok(if x < 0.0 {
        Datum::Null
    } else {
        Datum::Float(x.sqrt())
    })
}

fn eval_pow(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    match numeric::real_pow(real_of(&args[0]), real_of(&args[1])) {
        Ok(v) => Ok(Datum::Float(v)),
        Err(_) => b.out_of_range("DOUBLE", call),
    }
}

fn eval_exp(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    match numeric::real_exp(real_of(&args[0])) {
        Ok(v) => Ok(Datum::Float(v)),
        Err(_) => b.out_of_range("DOUBLE", call),
    }
}

fn log_of(x: f64, f: fn(f64) -> f64) -> Datum {
    if x <= 0.0 {
        Datum::Null
    } else {
        Datum::Float(f(x))
    }
}

fn eval_ln(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(log_of(real_of(&args[0]), f64::ln))
}

fn eval_log(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if args.len() == 1 {
        return Ok(log_of(real_of(&args[0]), f64::ln));
    }
    let (base, x) = (real_of(&args[0]), real_of(&args[1]));
    if base <= 0.0 || base == 1.0 || x <= 0.0 {
        return Ok(Datum::Null);
    }
    Ok(Datum::Float(x.ln() / base.ln()))
}

fn eval_log2(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(log_of(real_of(&args[0]), f64::log2))
}

fn eval_log10(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(log_of(real_of(&args[0]), f64::log10))
}

fn eval_pi(_args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Float(std::f64::consts::PI))
}

fn eval_sin(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Float(real_of(&args[0]).sin()))
}

fn eval_cos(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Float(real_of(&args[0]).cos()))
}

fn eval_tan(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    finite(real_of(&args[0]).tan(), b, call)
}

fn eval_cot(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let t = real_of(&args[0]).tan();
    if t == 0.0 {
        return b.out_of_range("DOUBLE", call);
    }
    finite(1.0 / t, b, call)
}

fn eval_asin(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let x = real_of(&args[0]);
    Ok(if (-1.0..=1.0).contains(&x) {
        Datum::Float(x.asin())
    } else {
        Datum::Null
    })
}

fn eval_acos(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let x = real_of(&args[0]);
    Ok(if (-1.0..=1.0).contains(&x) {
        Datum::Float(x.acos())
    } else {
        Datum::Null
    })
}

fn eval_atan(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let y = real_of(&args[0]);
    Ok(Datum::Float(match args.get(1) {
        Some(x) => y.atan2(real_of(x)),
        None => y.atan(),
    }))
}

fn eval_degrees(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Float(real_of(&args[0]).to_degrees()))
}

fn eval_radians(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Float(real_of(&args[0]).to_radians()))
}

/// Digits of `v` in `base`, uppercase
fn to_base(mut v: u64, base: u32) -> String {
    if v == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while v > 0 {
        let d = (v % base as u64) as u32;
        digits.push(std::char::from_digit(d, base).unwrap_or('0').to_ascii_uppercase());
        v /= base as u64;
    }
    digits.iter().rev().collect()
}

/// `CONV` of a digit string; `None` for an unsupported base
pub(crate) fn conv_text(text: &str, from: i64, to: i64) -> Option<String> {
    let (from_base, to_base_abs) = (from.unsigned_abs(), to.unsigned_abs());
    if !(2..=36).contains(&from_base) || !(2..=36).contains(&to_base_abs) {
        return None;
    }
    let text = text.trim_start();
    let (neg, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let mut value: u64 = 0;
    for c in digits.chars() {
        let Some(d) = c.to_digit(from_base as u32) else {
            break;
        };
        value = value
            .checked_mul(from_base)
            .and_then(|v| v.checked_add(d as u64))
            .unwrap_or(u64::MAX);
    }
    if neg {
        value = if from < 0 {
            value.wrapping_neg()
        } else {
            (value as i64).wrapping_neg() as u64
        };
    }
    Some(if to < 0 && (value as i64) < 0 {
        format!("-{}", to_base((value as i64).unsigned_abs(), to_base_abs as u32))
    } else {
        to_base(value, to_base_abs as u32)
    })
}

fn eval_conv(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let text = text_of(&args[0]);
    let out = conv_text(&text, int_of(&args[1]), int_of(&args[2]));
    Ok(super::opt_text(b, out))
}

// ============================================================================
// RAND
// ============================================================================

/// `RAND([seed])`
pub struct Rand;

impl ScalarFunction for Rand {
    fn name(&self) -> &str {
        "RAND"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "RAND",
            FunctionType::Scalar,
            "Random double in [0, 1)",
            Sig::new(0, 1),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        Sig::new(0, 1).validate_arg_count("RAND", args.len())?;
        let int = FieldType::long_long();
        let casts = args
            .iter()
            .map(|a| super::needs_cast(&a.ty, &int).then(|| int.clone()))
            .collect();
        let seed = args.first().map(|a| a.const_int().unwrap_or(0));
        let constant_seed = args.first().map(ArgType::is_constant).unwrap_or(false);
        let rng = match seed {
            Some(s) if constant_seed => Some(Mutex::new(StdRng::seed_from_u64(s as u64))),
            _ => None,
        };
        let ret = FieldType::double();
        Ok(Resolution {
            derivation: result_derivation(&ret, plan),
            return_type: ret,
            casts,
            implementation: Arc::new(RandImpl { rng }),
        })
    }
}

struct RandImpl {
    /// Sequence of a constant seed
    rng: Option<Mutex<StdRng>>,
}

impl FunctionImpl for RandImpl {
    fn eval_row(&self, args: &[Datum], _call: &mut Call<'_>) -> Result<Datum> {
        let v: f64 = match (&self.rng, args.first()) {
            (Some(rng), _) => rng.lock().gen(),
            (None, Some(seed)) => StdRng::seed_from_u64(int_of(seed) as u64).gen(),
            (None, None) => rand::thread_rng().gen(),
        };
        Ok(Datum::Float(v))
    }

    fn null_policy(&self) -> crate::functions::NullPolicy {
        crate::functions::NullPolicy::Tolerant
    }

    fn is_volatile(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{dec, eval, f, i, s};
    use super::{round_real, truncate_real};
    use crate::core::Datum;

    #[test]
    fn test_abs() {
        assert_eq!(eval("ABS", &[i(-5)]), "5");
        assert_eq!(eval("ABS", &[dec("-2.50")]), "2.50");
        assert_eq!(eval("ABS", &[f(-1.5)]), "1.5");
        assert_eq!(eval("ABS", &[i(-9223372036854775807)]), "9223372036854775807");
        assert_eq!(eval("ABS", &[i(i64::MIN)]), "ERROR 1690");
    }

    #[test]
    fn test_round_ties() {
        assert_eq!(eval("ROUND", &[dec("2.5")]), "3");
        assert_eq!(eval("ROUND", &[dec("-2.5")]), "-3");
        assert_eq!(eval("ROUND", &[f(2.5)]), "2");
        assert_eq!(eval("ROUND", &[dec("123.456"), i(4)]), "123.4560");
        assert_eq!(eval("ROUND", &[f(123.456), i(4)]), "123.456");
        assert_eq!(eval("ROUND", &[i(1250), i(-2)]), "1300");
        assert_eq!(eval("ROUND", &[dec("1.298"), i(1)]), "1.3");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(eval("TRUNCATE", &[dec("1.999"), i(1)]), "1.9");
        assert_eq!(eval("TRUNCATE", &[i(1299), i(-2)]), "1200");
        assert_eq!(eval("TRUNCATE", &[f(-1.999), i(2)]), "-1.99");
    }

    #[test]
    fn test_real_digits_past_double_range() {
        for digits in [-309, -400, i64::MIN] {
            assert_eq!(round_real(1.5e300, digits), 0.0);
            assert_eq!(truncate_real(1.5e300, digits), 0.0);
            assert!(round_real(-1.5e300, digits).is_sign_negative());
            assert!(truncate_real(-1.5e300, digits).is_sign_negative());
            assert_eq!(eval("TRUNCATE", &[f(123.5), i(digits)]), "0");
            assert_eq!(eval("ROUND", &[f(123.5), i(digits)]), "0");
        }
        assert_eq!(round_real(1.5e300, -308), 0.0);
        assert_eq!(eval("ROUND", &[f(123.5), i(-308)]), "0");
        assert_eq!(truncate_real(1.5e300, -300), 1e300);
    }

    #[test]
    fn test_ceil_floor_sign() {
        assert_eq!(eval("CEIL", &[dec("1.2")]), "2");
        assert_eq!(eval("CEILING", &[f(-1.2)]), "-1");
        assert_eq!(eval("FLOOR", &[dec("-1.2")]), "-2");
        assert_eq!(eval("FLOOR", &[i(7)]), "7");
        assert_eq!(eval("SIGN", &[dec("-0.5")]), "-1");
        assert_eq!(eval("SIGN", &[i(0)]), "0");
    }

    #[test]
    fn test_real_functions() {
        assert_eq!(eval("SQRT", &[i(16)]), "4");
        assert_eq!(eval("SQRT", &[i(-1)]), "NULL");
        assert_eq!(eval("POW", &[i(2), i(10)]), "1024");
        assert_eq!(eval("POW", &[i(10), i(400)]), "ERROR 1690");
        assert_eq!(eval("EXP", &[i(1000)]), "ERROR 1690");
        assert_eq!(eval("LN", &[i(0)]), "NULL");
        assert_eq!(eval("LOG", &[i(2), i(8)]), "3");
        assert_eq!(eval("LOG2", &[i(1024)]), "10");
        assert_eq!(eval("LOG10", &[i(100)]), "2");
        assert_eq!(eval("COT", &[i(0)]), "ERROR 1690");
        assert_eq!(eval("ASIN", &[i(2)]), "NULL");
        assert_eq!(eval("DEGREES", &[i(0)]), "0");
        assert_eq!(eval("ATAN2", &[i(0), i(1)]), "0");
    }

    #[test]
    fn test_conv() {
        assert_eq!(eval("CONV", &[s("a"), i(16), i(2)]), "1010");
        assert_eq!(eval("CONV", &[s("6E"), i(18), i(8)]), "172");
        assert_eq!(eval("CONV", &[s("-17"), i(10), i(-18)]), "-H");
        assert_eq!(eval("CONV", &[i(10), i(10), i(1)]), "NULL");
    }

    #[test]
    fn test_rand_seeded() {
        let a = eval("RAND", &[i(3)]);
        let b = eval("RAND", &[i(3)]);
        assert_eq!(a, b);
        let v: f64 = a.parse().unwrap();
        assert!((0.0..1.0).contains(&v));
        assert_eq!(eval("RAND", &[Datum::Null]).parse::<f64>().is_ok(), true);
    }
}
