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

//! Bit operators: `& | ^ ~ << >>` and `BIT_COUNT`
//!
//! Operands are read as 64-bit patterns: signed integers keep their two's
//! complement bits, fractional values round to the nearest integer first.
//! Results are BIGINT UNSIGNED.

use num_traits::ToPrimitive;

use super::{decimal_of, decimal_type, register_all, uint_type, Bound, Builtin, Signature};
use crate::convert::number::rint;
use crate::core::{decimal, Datum, EvalType, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{ArgType, Call, FunctionSignature as Sig, PlanContext};

pub(super) fn register(registry: &FunctionRegistry) {
    register_all(
        registry,
        vec![
            Builtin::new("&", Sig::exact(2), resolve_bits, eval_and).describe("Bitwise AND"),
            Builtin::new("|", Sig::exact(2), resolve_bits, eval_or).describe("Bitwise OR"),
            Builtin::new("^", Sig::exact(2), resolve_bits, eval_xor).describe("Bitwise XOR"),
            Builtin::new("~", Sig::exact(1), resolve_bits, eval_invert).describe("Bit inversion"),
            Builtin::new("<<", Sig::exact(2), resolve_bits, eval_shl).describe("Left shift"),
            Builtin::new(">>", Sig::exact(2), resolve_bits, eval_shr).describe("Right shift"),
            Builtin::new("BIT_COUNT", Sig::exact(1), resolve_bit_count, eval_bit_count)
                .describe("Number of bits that are set"),
        ],
    );
}

/// Integers and numbers pass through; strings and temporals become exact
/// integers so that the full unsigned range survives
pub(crate) fn bit_casts(args: &[ArgType]) -> Vec<Option<FieldType>> {
    args.iter()
        .map(|a| match a.eval_type() {
            EvalType::Int | EvalType::Decimal | EvalType::Real => None,
            _ if a.is_null() => None,
            _ => Some(decimal_type(21, 0)),
        })
        .collect()
}

fn resolve_bits(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(uint_type()).casts(bit_casts(args)))
}

fn resolve_bit_count(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::long_long().with_flen(2)).casts(bit_casts(args)))
}

/// 64-bit pattern of a numeric operand
pub(crate) fn bits_of(d: &Datum) -> u64 {
    match d {
        Datum::Int(v) => *v as u64,
        Datum::UInt(v) => *v,
        Datum::Float(f) => real_bits(rint(*f)),
        other => {
            let r = decimal::round(decimal_of(other), 0);
            match r.to_i64() {
                Some(v) => v as u64,
                None => r.to_u64().unwrap_or(if r.is_sign_negative() { 1 << 63 } else { u64::MAX }),
            }
        }
    }
}

fn real_bits(f: f64) -> u64 {
    if f < 0.0 {
        if f <= i64::MIN as f64 {
            1 << 63
        } else {
            (f as i64) as u64
        }
    } else if f >= u64::MAX as f64 {
        u64::MAX
    } else {
        f as u64
    }
}

fn eval_and(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::UInt(bits_of(&args[0]) & bits_of(&args[1])))
}

fn eval_or(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::UInt(bits_of(&args[0]) | bits_of(&args[1])))
}

fn eval_xor(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::UInt(bits_of(&args[0]) ^ bits_of(&args[1])))
}

fn eval_invert(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::UInt(!bits_of(&args[0])))
}

fn eval_shl(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let shift = bits_of(&args[1]);
    Ok(Datum::UInt(if shift >= 64 {
        0
    } else {
        bits_of(&args[0]) << shift
    }))
}

fn eval_shr(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let shift = bits_of(&args[1]);
    Ok(Datum::UInt(if shift >= 64 {
        0
    } else {
        bits_of(&args[0]) >> shift
    }))
}

fn eval_bit_count(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(bits_of(&args[0]).count_ones() as i64))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{dec, eval, f, i, s};
    use crate::core::Datum;

    #[test]
    fn test_bit_operators() {
        assert_eq!(eval("&", &[i(29), i(15)]), "13");
        assert_eq!(eval("|", &[i(29), i(15)]), "31");
        assert_eq!(eval("^", &[i(1), i(0)]), "1");
        assert_eq!(eval("~", &[i(0)]), "18446744073709551615");
        assert_eq!(eval("|", &[i(-1), i(0)]), "18446744073709551615");
        assert_eq!(eval("&", &[Datum::Null, i(1)]), "NULL");
    }

    #[test]
    fn test_shifts() {
        assert_eq!(eval("<<", &[i(1), i(2)]), "4");
        assert_eq!(eval(">>", &[i(4), i(2)]), "1");
        assert_eq!(eval("<<", &[i(1), i(64)]), "0");
    }

    #[test]
    fn test_fractional_and_string_operands() {
        assert_eq!(eval("|", &[dec("1.5"), i(0)]), "2");
        assert_eq!(eval("|", &[f(-1.0), i(0)]), "18446744073709551615");
        assert_eq!(eval("|", &[s("18446744073709551615"), i(0)]), "18446744073709551615");
    }

    #[test]
    fn test_bit_count() {
        assert_eq!(eval("BIT_COUNT", &[i(29)]), "4");
        assert_eq!(eval("BIT_COUNT", &[i(-1)]), "64");
    }
}
