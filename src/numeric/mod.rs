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

//! Overflow-checked arithmetic
//!
//! Integer operations run in `i128` and are narrowed back to the result
//! signedness MySQL picks, so mixed signed/unsigned operands never wrap.
//! Every primitive reports [`ArithError`]; builtins turn it into an
//! out-of-range or division-by-zero condition with the expression text.

use crate::core::decimal::{self, Decimal, MAX_SCALE};
use crate::core::{Datum, Error};

/// Failure of a checked primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithError {
    /// Result outside the result type
    Overflow,
    /// Divisor was zero
    DivisionByZero,
}

impl ArithError {
    /// Convert to the engine error for `type_name` and the expression text
    pub fn into_error(self, type_name: &str, expr: &str) -> Error {
        match self {
            ArithError::Overflow => Error::out_of_range(type_name, expr),
            ArithError::DivisionByZero => Error::DivisionByZero,
        }
    }
}

pub type ArithResult<T> = std::result::Result<T, ArithError>;

// ============================================================================
// Integers
// ============================================================================

/// A 64-bit integer together with its signedness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integer {
    Signed(i64),
    Unsigned(u64),
}

impl Integer {
    pub fn from_datum(d: &Datum) -> Option<Self> {
        match d {
            Datum::Int(v) => Some(Integer::Signed(*v)),
            Datum::UInt(v) => Some(Integer::Unsigned(*v)),
            _ => None,
        }
    }

    pub fn into_datum(self) -> Datum {
        match self {
            Integer::Signed(v) => Datum::Int(v),
            Integer::Unsigned(v) => Datum::UInt(v),
        }
    }

    #[inline]
    pub fn is_unsigned(self) -> bool {
        matches!(self, Integer::Unsigned(_))
    }

    #[inline]
    pub fn wide(self) -> i128 {
        match self {
            Integer::Signed(v) => v as i128,
            Integer::Unsigned(v) => v as i128,
        }
    }

    /// Narrow an exact result to the requested signedness
    #[inline]
    pub fn narrow(v: i128, unsigned: bool) -> ArithResult<Self> {
        if unsigned {
            u64::try_from(v)
                .map(Integer::Unsigned)
                .map_err(|_| ArithError::Overflow)
        } else {
            i64::try_from(v)
                .map(Integer::Signed)
                .map_err(|_| ArithError::Overflow)
        }
    }

    pub fn is_zero(self) -> bool {
        self.wide() == 0
    }
}

/// Range name used in out-of-range messages
pub fn int_type_name(unsigned: bool) -> &'static str {
    if unsigned {
        "BIGINT UNSIGNED"
    } else {
        "BIGINT"
    }
}

/// Result signedness of `+`, `*` and `DIV`: unsigned if either side is
pub fn additive_unsigned(a_unsigned: bool, b_unsigned: bool) -> bool {
    a_unsigned || b_unsigned
}

/// Result signedness of `-`, which NO_UNSIGNED_SUBTRACTION makes signed
pub fn subtraction_unsigned(a_unsigned: bool, b_unsigned: bool, no_unsigned_subtraction: bool) -> bool {
    !no_unsigned_subtraction && (a_unsigned || b_unsigned)
}

pub fn int_add(a: Integer, b: Integer, unsigned: bool) -> ArithResult<Integer> {
    Integer::narrow(a.wide() + b.wide(), unsigned)
}

pub fn int_sub(a: Integer, b: Integer, unsigned: bool) -> ArithResult<Integer> {
    Integer::narrow(a.wide() - b.wide(), unsigned)
}

pub fn int_mul(a: Integer, b: Integer, unsigned: bool) -> ArithResult<Integer> {
    let product = a.wide().checked_mul(b.wide()).ok_or(ArithError::Overflow)?;
    Integer::narrow(product, unsigned)
}

/// Integer division truncating toward zero
pub fn int_div(a: Integer, b: Integer, unsigned: bool) -> ArithResult<Integer> {
    if b.is_zero() {
        return Err(ArithError::DivisionByZero);
    }
    Integer::narrow(a.wide() / b.wide(), unsigned)
}

/// Remainder with the sign of the dividend; unsigned when the dividend is
pub fn int_mod(a: Integer, b: Integer) -> ArithResult<Integer> {
    if b.is_zero() {
        return Err(ArithError::DivisionByZero);
    }
    Integer::narrow(a.wide() % b.wide(), a.is_unsigned())
}

/// Unary minus; the result is always signed
pub fn int_neg(a: Integer) -> ArithResult<Integer> {
    Integer::narrow(-a.wide(), false)
}

pub fn int_abs(a: Integer) -> ArithResult<Integer> {
    match a {
        Integer::Signed(v) => v.checked_abs().map(Integer::Signed).ok_or(ArithError::Overflow),
        unsigned => Ok(unsigned),
    }
}

pub fn checked_add_i64(a: i64, b: i64) -> ArithResult<i64> {
    a.checked_add(b).ok_or(ArithError::Overflow)
}

pub fn checked_sub_i64(a: i64, b: i64) -> ArithResult<i64> {
    a.checked_sub(b).ok_or(ArithError::Overflow)
}

pub fn checked_mul_i64(a: i64, b: i64) -> ArithResult<i64> {
    a.checked_mul(b).ok_or(ArithError::Overflow)
}

pub fn checked_div_i64(a: i64, b: i64) -> ArithResult<i64> {
    if b == 0 {
        return Err(ArithError::DivisionByZero);
    }
    a.checked_div(b).ok_or(ArithError::Overflow)
}

pub fn checked_add_u64(a: u64, b: u64) -> ArithResult<u64> {
    a.checked_add(b).ok_or(ArithError::Overflow)
}

pub fn checked_sub_u64(a: u64, b: u64) -> ArithResult<u64> {
    a.checked_sub(b).ok_or(ArithError::Overflow)
}

pub fn checked_mul_u64(a: u64, b: u64) -> ArithResult<u64> {
    a.checked_mul(b).ok_or(ArithError::Overflow)
}

pub fn checked_div_u64(a: u64, b: u64) -> ArithResult<u64> {
    a.checked_div(b).ok_or(ArithError::DivisionByZero)
}

// ============================================================================
// Decimals
// ============================================================================

pub fn decimal_add(a: Decimal, b: Decimal) -> ArithResult<Decimal> {
    a.checked_add(b).ok_or(ArithError::Overflow)
}

pub fn decimal_sub(a: Decimal, b: Decimal) -> ArithResult<Decimal> {
    a.checked_sub(b).ok_or(ArithError::Overflow)
}

pub fn decimal_mul(a: Decimal, b: Decimal) -> ArithResult<Decimal> {
    let scale = (a.scale() + b.scale()).min(MAX_SCALE);
    let product = a.checked_mul(b).ok_or(ArithError::Overflow)?;
    Ok(decimal::with_scale(product, scale))
}

/// Scale of a decimal quotient: dividend scale plus the increment
pub fn division_scale(dividend_scale: u32, increment: u32) -> u32 {
    (dividend_scale + increment).min(MAX_SCALE)
}

/// Decimal division rounded half away from zero to `scale` digits
pub fn decimal_div(a: Decimal, b: Decimal, scale: u32) -> ArithResult<Decimal> {
    if b.is_zero() {
        return Err(ArithError::DivisionByZero);
    }
    let q = a.checked_div(b, scale).ok_or(ArithError::Overflow)?;
    Ok(decimal::with_scale(q, scale))
}

/// Integer quotient of two decimals (`DIV`)
pub fn decimal_int_div(a: Decimal, b: Decimal) -> ArithResult<Decimal> {
    if b.is_zero() {
        return Err(ArithError::DivisionByZero);
    }
    a.checked_int_div(b).ok_or(ArithError::Overflow)
}

pub fn decimal_mod(a: Decimal, b: Decimal) -> ArithResult<Decimal> {
    if b.is_zero() {
        return Err(ArithError::DivisionByZero);
    }
    let r = a.checked_rem(b).ok_or(ArithError::Overflow)?;
    Ok(decimal::with_scale(r, a.scale().max(b.scale())))
}

// ============================================================================
// Doubles
// ============================================================================

#[inline]
fn finite(v: f64) -> ArithResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ArithError::Overflow)
    }
}

pub fn real_add(a: f64, b: f64) -> ArithResult<f64> {
    finite(a + b)
}

pub fn real_sub(a: f64, b: f64) -> ArithResult<f64> {
    finite(a - b)
}

pub fn real_mul(a: f64, b: f64) -> ArithResult<f64> {
    finite(a * b)
}

pub fn real_div(a: f64, b: f64) -> ArithResult<f64> {
    if b == 0.0 {
        return Err(ArithError::DivisionByZero);
    }
    finite(a / b)
}

pub fn real_mod(a: f64, b: f64) -> ArithResult<f64> {
    if b == 0.0 {
        return Err(ArithError::DivisionByZero);
    }
    finite(a % b)
}

/// `POW`; NaN (negative base with fractional exponent) is out of range too
pub fn real_pow(base: f64, exp: f64) -> ArithResult<f64> {
    finite(base.powf(exp))
}

pub fn real_exp(x: f64) -> ArithResult<f64> {
    finite(x.exp())
}
