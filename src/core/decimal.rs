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

//! Fixed-point DECIMAL values
//!
//! [`Decimal`] covers the domain of MySQL's DECIMAL(65,30): up to 65
//! significant digits, at most 30 of them after the point. The magnitude is
//! stored inline in 256 bits so values stay `Copy`. Arithmetic runs in
//! `i128` when both operands fit and falls back to [`BigInt`] otherwise.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Neg;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;

use super::error::Error;

/// Most significant digits a DECIMAL holds
pub const MAX_PRECISION: u32 = 65;

/// Most digits after the decimal point
pub const MAX_SCALE: u32 = 30;

const fn pow10_table() -> [i128; 39] {
    let mut t = [1i128; 39];
    let mut i = 1;
    while i < 39 {
        t[i] = t[i - 1] * 10;
        i += 1;
    }
    t
}

/// Powers of ten representable in `i128`
const POW10: [i128; 39] = pow10_table();

fn pow10_big(n: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u8), n as usize)
}

fn digit_count(mag: &BigUint) -> u32 {
    match mag.to_u128() {
        Some(0) => 1,
        Some(v) => v.ilog10() + 1,
        None => mag.to_str_radix(10).len() as u32,
    }
}

/// Drop `places` low digits, rounding half away from zero or truncating
fn shift_right(m: &BigInt, places: u32, round: bool) -> BigInt {
    if places == 0 {
        return m.clone();
    }
    let p = pow10_big(places);
    let q = m / &p;
    if !round {
        return q;
    }
    let r = m % &p;
    if r.magnitude() * 2u32 >= *p.magnitude() {
        if m.sign() == Sign::Minus {
            q - 1u32
        } else {
            q + 1u32
        }
    } else {
        q
    }
}

// ============================================================================
// Decimal
// ============================================================================

/// Exact fixed-point number with a per-value scale
///
/// Equality and ordering compare numeric values, so `1.0 == 1.00`; the
/// scale only affects rendering.
#[derive(Clone, Copy)]
pub struct Decimal {
    lo: u128,
    hi: u128,
    scale: u8,
    negative: bool,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        lo: 0,
        hi: 0,
        scale: 0,
        negative: false,
    };
    pub const ONE: Decimal = Decimal { lo: 1, ..Decimal::ZERO };
    pub const TEN: Decimal = Decimal { lo: 10, ..Decimal::ZERO };

    /// `num * 10^-scale`
    pub fn new(num: i64, scale: u32) -> Decimal {
        Decimal::from_i128(num as i128, scale)
    }

    fn from_i128(m: i128, scale: u32) -> Decimal {
        if scale > MAX_SCALE {
            return Decimal::from_big(BigInt::from(m), scale).unwrap_or(Decimal::ZERO);
        }
        Decimal {
            lo: m.unsigned_abs(),
            hi: 0,
            scale: scale as u8,
            negative: m < 0,
        }
    }

    /// Narrow an exact mantissa into range. Fraction digits beyond the
    /// scale or precision limits are rounded away; `None` when the integer
    /// part alone needs more than 65 digits.
    fn from_big(m: BigInt, scale: u32) -> Option<Decimal> {
        let (mut m, mut scale) = (m, scale);
        if scale > MAX_SCALE {
            m = shift_right(&m, scale - MAX_SCALE, true);
            scale = MAX_SCALE;
        }
        let digits = digit_count(m.magnitude());
        if digits > MAX_PRECISION {
            let excess = digits - MAX_PRECISION;
            if excess > scale {
                return None;
            }
            m = shift_right(&m, excess, true);
            scale -= excess;
            if digit_count(m.magnitude()) > MAX_PRECISION {
                if scale == 0 {
                    return None;
                }
                m = shift_right(&m, 1, false);
                scale -= 1;
            }
        }
        let words = m.magnitude().to_u64_digits();
        if words.len() > 4 {
            return None;
        }
        let word = |i: usize| words.get(i).copied().unwrap_or(0) as u128;
        Some(Decimal {
            lo: word(0) | word(1) << 64,
            hi: word(2) | word(3) << 64,
            scale: scale as u8,
            negative: m.sign() == Sign::Minus,
        })
    }

    /// Signed mantissa when it fits in `i128`
    #[inline]
    fn small(&self) -> Option<i128> {
        if self.hi == 0 && self.lo <= i128::MAX as u128 {
            let v = self.lo as i128;
            Some(if self.negative { -v } else { v })
        } else {
            None
        }
    }

    fn magnitude(&self) -> BigUint {
        if self.hi == 0 {
            BigUint::from(self.lo)
        } else {
            (BigUint::from(self.hi) << 128u32) + BigUint::from(self.lo)
        }
    }

    fn to_big(self) -> BigInt {
        let sign = if self.negative { Sign::Minus } else { Sign::Plus };
        BigInt::from_biguint(sign, self.magnitude())
    }

    #[inline]
    pub fn scale(&self) -> u32 {
        self.scale as u32
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    #[inline]
    pub fn is_sign_negative(&self) -> bool {
        self.negative
    }

    #[inline]
    pub fn is_sign_positive(&self) -> bool {
        !self.negative
    }

    pub fn abs(&self) -> Decimal {
        Decimal {
            negative: false,
            ..*self
        }
    }

    // ------------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------------

    pub fn checked_add(self, other: Decimal) -> Option<Decimal> {
        if let Some((x, y, scale)) = aligned_small(&self, &other) {
            if let Some(sum) = x.checked_add(y) {
                return Some(Decimal::from_i128(sum, scale));
            }
        }
        let (x, y, scale) = aligned_big(&self, &other);
        Decimal::from_big(x + y, scale)
    }

    pub fn checked_sub(self, other: Decimal) -> Option<Decimal> {
        self.checked_add(-other)
    }

    /// Product with the summed scale, capped at 30 digits
    pub fn checked_mul(self, other: Decimal) -> Option<Decimal> {
        let scale = self.scale() + other.scale();
        if let (Some(x), Some(y)) = (self.small(), other.small()) {
            if let Some(p) = x.checked_mul(y) {
                return Some(Decimal::from_i128(p, scale));
            }
        }
        Decimal::from_big(self.to_big() * other.to_big(), scale)
    }

    /// Quotient rounded half away from zero to `scale` fraction digits
    pub fn checked_div(self, other: Decimal, scale: u32) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        let scale = scale.min(MAX_SCALE);
        // One guard digit past the requested scale
        let shift = scale as i64 + other.scale() as i64 - self.scale() as i64 + 1;
        let (num, den) = if shift >= 0 {
            (self.to_big() * pow10_big(shift as u32), other.to_big())
        } else {
            (self.to_big(), other.to_big() * pow10_big(shift.unsigned_abs() as u32))
        };
        Decimal::from_big(shift_right(&(num / den), 1, true), scale)
    }

    /// Integer part of the quotient
    pub fn checked_int_div(self, other: Decimal) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        let (x, y, _) = aligned_big(&self, &other);
        Decimal::from_big(x / y, 0)
    }

    /// Remainder with the sign of the dividend
    pub fn checked_rem(self, other: Decimal) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        if let Some((x, y, scale)) = aligned_small(&self, &other) {
            if let Some(r) = x.checked_rem(y) {
                return Some(Decimal::from_i128(r, scale));
            }
        }
        let (x, y, scale) = aligned_big(&self, &other);
        Decimal::from_big(x % y, scale)
    }

    // ------------------------------------------------------------------------
    // Rounding
    // ------------------------------------------------------------------------

    /// Round half away from zero to at most `dp` fraction digits
    pub fn round_dp(&self, dp: u32) -> Decimal {
        self.reduce(dp, true)
    }

    /// Truncate toward zero to at most `dp` fraction digits
    pub fn trunc_dp(&self, dp: u32) -> Decimal {
        self.reduce(dp, false)
    }

    fn reduce(&self, dp: u32, round: bool) -> Decimal {
        if self.scale() <= dp {
            return *self;
        }
        let drop = self.scale() - dp;
        if let Some(m) = self.small() {
            let p = POW10[drop as usize];
            let (q, r) = (m / p, m % p);
            let q = if round && r.unsigned_abs() * 2 >= p as u128 {
                q + m.signum()
            } else {
                q
            };
            return Decimal::from_i128(q, dp);
        }
        Decimal::from_big(shift_right(&self.to_big(), drop, round), dp).unwrap_or(*self)
    }

    pub fn trunc(&self) -> Decimal {
        self.trunc_dp(0)
    }

    pub fn floor(&self) -> Decimal {
        let t = self.trunc();
        if self.negative && t != *self {
            t.checked_sub(Decimal::ONE).unwrap_or(t)
        } else {
            t
        }
    }

    pub fn ceil(&self) -> Decimal {
        let t = self.trunc();
        if !self.negative && t != *self {
            t.checked_add(Decimal::ONE).unwrap_or(t)
        } else {
            t
        }
    }

    /// Pad or round to exactly `scale` fraction digits. Padding stops early
    /// when the digits would exceed the precision limit.
    pub fn rescale(&mut self, scale: u32) {
        let scale = scale.min(MAX_SCALE);
        if scale <= self.scale() {
            *self = self.round_dp(scale);
            return;
        }
        let up = scale - self.scale();
        if let Some(m) = self.small().and_then(|m| m.checked_mul(POW10[up as usize])) {
            *self = Decimal::from_i128(m, scale);
        } else if let Some(d) = Decimal::from_big(self.to_big() * pow10_big(up), scale) {
            *self = d;
        }
    }

    /// Same value without trailing fraction zeros
    pub fn normalize(&self) -> Decimal {
        let mut d = *self;
        while d.scale > 0 {
            let shorter = d.trunc_dp(d.scale() - 1);
            if shorter != d {
                break;
            }
            d = shorter;
        }
        d
    }
}

fn aligned_small(a: &Decimal, b: &Decimal) -> Option<(i128, i128, u32)> {
    let (x, y) = (a.small()?, b.small()?);
    let scale = a.scale().max(b.scale());
    let x = x.checked_mul(POW10[(scale - a.scale()) as usize])?;
    let y = y.checked_mul(POW10[(scale - b.scale()) as usize])?;
    Some((x, y, scale))
}

fn aligned_big(a: &Decimal, b: &Decimal) -> (BigInt, BigInt, u32) {
    let scale = a.scale().max(b.scale());
    (
        a.to_big() * pow10_big(scale - a.scale()),
        b.to_big() * pow10_big(scale - b.scale()),
        scale,
    )
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::ZERO
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal {
            negative: !self.negative && !self.is_zero(),
            ..self
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        if let Some((x, y, _)) = aligned_small(self, other) {
            return x.cmp(&y);
        }
        let (x, y, _) = aligned_big(self, other);
        x.cmp(&y)
    }
}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let n = self.normalize();
        n.lo.hash(state);
        n.hi.hash(state);
        n.scale.hash(state);
        n.negative.hash(state);
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Decimal {
                fn from(v: $t) -> Self {
                    Decimal::from_i128(v as i128, 0)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl ToPrimitive for Decimal {
    fn to_i64(&self) -> Option<i64> {
        self.to_i128().and_then(|v| i64::try_from(v).ok())
    }

    fn to_u64(&self) -> Option<u64> {
        self.to_i128().and_then(|v| u64::try_from(v).ok())
    }

    /// Integer part, truncated toward zero
    fn to_i128(&self) -> Option<i128> {
        self.trunc().small()
    }

    fn to_f64(&self) -> Option<f64> {
        self.to_string().parse().ok()
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = match self.small() {
            Some(m) => m.unsigned_abs().to_string(),
            None => self.magnitude().to_str_radix(10),
        };
        let scale = self.scale as usize;
        let mut out = String::with_capacity(digits.len() + scale + 3);
        if self.negative {
            out.push('-');
        }
        if scale == 0 {
            out.push_str(&digits);
        } else if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            out.push_str(int);
            out.push('.');
            out.push_str(frac);
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat('0').take(scale - digits.len()));
            out.push_str(&digits);
        }
        f.write_str(&out)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    /// Parse the whole string; excess fraction digits round away
    fn from_str(s: &str) -> Result<Self, Error> {
        let (d, consumed, clamped) = parse_prefix(s);
        if consumed == 0 || consumed != s.len() || clamped {
            return Err(Error::invalid_argument(format!("invalid DECIMAL value '{}'", s)));
        }
        Ok(d)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Largest 65-digit integer with the given sign
pub fn saturated(negative: bool) -> Decimal {
    let max = max_for(MAX_PRECISION, 0);
    if negative {
        -max
    } else {
        max
    }
}

/// Shift by `places` integer digits, rounding or truncating the rest
fn shift_integer(d: Decimal, places: u64, round: bool) -> Decimal {
    if places > MAX_PRECISION as u64 {
        return Decimal::ZERO;
    }
    let places = places as u32;
    let q = shift_right(&d.to_big(), d.scale() + places, round);
    Decimal::from_big(q * pow10_big(places), 0).unwrap_or_else(|| saturated(d.negative))
}

/// Round half away from zero to `frac` digits; negative `frac` rounds
/// to the left of the point. The result keeps `max(frac, 0)` digits of scale.
pub fn round(d: Decimal, frac: i64) -> Decimal {
    if frac >= 0 {
        let dp = frac.min(MAX_SCALE as i64) as u32;
        let mut r = d.round_dp(dp);
        if r.scale() < dp {
            r.rescale(dp);
        }
        return r;
    }
    shift_integer(d, frac.unsigned_abs(), true)
}

/// Truncate toward zero to `frac` digits; negative `frac` zeroes integer digits
pub fn truncate(d: Decimal, frac: i64) -> Decimal {
    if frac >= 0 {
        let dp = frac.min(MAX_SCALE as i64) as u32;
        let mut r = d.trunc_dp(dp);
        if r.scale() < dp {
            r.rescale(dp);
        }
        return r;
    }
    shift_integer(d, frac.unsigned_abs(), false)
}

/// Round to exactly `scale` digits, padding with zeros when needed
pub fn with_scale(d: Decimal, scale: u32) -> Decimal {
    let scale = scale.min(MAX_SCALE);
    let mut r = d.round_dp(scale);
    r.rescale(scale);
    r
}

/// Number of integer digits (at least 1)
pub fn int_digits(d: &Decimal) -> u32 {
    digit_count(&d.trunc().magnitude())
}

/// Largest magnitude of DECIMAL(precision, scale)
pub fn max_for(precision: u32, scale: u32) -> Decimal {
    let precision = precision.clamp(1, MAX_PRECISION);
    let scale = scale.min(MAX_SCALE).min(precision);
    Decimal::from_big(pow10_big(precision) - 1u32, scale).unwrap_or(Decimal::ZERO)
}

/// Fit a value into DECIMAL(precision, scale). The flag is true when the
/// value was clamped to the type boundary.
pub fn fit(d: Decimal, precision: u32, scale: u32) -> (Decimal, bool) {
    let rounded = with_scale(d, scale);
    let max = max_for(precision, scale);
    if rounded > max {
        (max, true)
    } else if rounded < -max {
        (-max, true)
    } else {
        (rounded, false)
    }
}

/// Convert from a double, keeping up to 15 significant digits like MySQL
pub fn from_f64(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    let text = format!("{:.*e}", 14, f);
    let (d, consumed, clamped) = parse_prefix(&text);
    if consumed == 0 || clamped {
        return None;
    }
    Some(d.normalize())
}

/// Fraction digits as rounded microseconds; 1_000_000 when they round up
pub fn fraction_micros(d: &Decimal) -> u64 {
    let abs = d.abs();
    abs.checked_sub(abs.trunc())
        .and_then(|f| f.checked_mul(Decimal::from(1_000_000)))
        .and_then(|m| m.round_dp(0).to_u64())
        .unwrap_or(0)
}

/// Convert to a double
pub fn to_f64(d: &Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Parse the longest decimal prefix of `s`. Returns the value, the number
/// of bytes consumed, and whether the value was clamped.
pub fn parse_prefix(s: &str) -> (Decimal, usize, bool) {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'-' || b[i] == b'+') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_end = i;
    let mut frac_end = i;
    if i < b.len() && b[i] == b'.' {
        let mut j = i + 1;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > i + 1 || int_end > int_start {
            frac_end = j;
        }
    }
    if frac_end == int_start || (int_end == int_start && frac_end <= int_start + 1) {
        return (Decimal::ZERO, 0, false);
    }
    let mut end = frac_end;
    let mut exponent: i64 = 0;
    if end < b.len() && (b[end] == b'e' || b[end] == b'E') {
        let mut j = end + 1;
        let neg = j < b.len() && b[j] == b'-';
        if j < b.len() && (b[j] == b'-' || b[j] == b'+') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            exponent = s[exp_start..j].parse::<i64>().unwrap_or(i64::MAX / 2);
            if neg {
                exponent = -exponent;
            }
            end = j;
        }
    }

    let negative = b.first() == Some(&b'-');
    let frac_digits = if frac_end > int_end + 1 {
        &s[int_end + 1..frac_end]
    } else {
        ""
    };
    let mut digits = String::with_capacity(int_end - int_start + frac_digits.len());
    digits.push_str(&s[int_start..int_end]);
    digits.push_str(frac_digits);
    let body = digits.trim_start_matches('0');
    let mut scale = frac_digits.len() as i64 - exponent;
    if body.is_empty() {
        let scale = scale.clamp(0, MAX_SCALE as i64) as u32;
        return (Decimal::from_i128(0, scale), end, false);
    }
    let significant = body.len() as i64;
    if scale > MAX_SCALE as i64 + significant {
        return (Decimal::from_i128(0, MAX_SCALE), end, false);
    }
    let Ok(mut mantissa) = body.parse::<BigInt>() else {
        return (Decimal::ZERO, 0, false);
    };
    if scale < 0 {
        if significant - scale > MAX_PRECISION as i64 {
            return (saturated(negative), end, true);
        }
        mantissa *= pow10_big(scale.unsigned_abs() as u32);
        scale = 0;
    }
    if negative {
        mantissa = -mantissa;
    }
    match Decimal::from_big(mantissa, scale as u32) {
        Some(v) => (v, end, false),
        None => (saturated(negative), end, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_half_away() {
        assert_eq!(round(d("2.5"), 0).to_string(), "3");
        assert_eq!(round(d("-2.5"), 0).to_string(), "-3");
        assert_eq!(round(d("1.298"), 1).to_string(), "1.3");
        assert_eq!(round(d("150.000"), 2).to_string(), "150.00");
        assert_eq!(round(d("1.2"), 3).to_string(), "1.200");
        assert_eq!(round(d("23.298"), -1).to_string(), "20");
        assert_eq!(round(d("1250"), -2).to_string(), "1300");
        assert_eq!(round(d("1.5"), 30).to_string(), "1.500000000000000000000000000000");
        assert_eq!(round(d("1234.5"), -400).to_string(), "0");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(d("1.999"), 1).to_string(), "1.9");
        assert_eq!(truncate(d("-1.999"), 0).to_string(), "-1");
        assert_eq!(truncate(d("122"), -2).to_string(), "100");
        assert_eq!(truncate(d("-122"), i64::MIN).to_string(), "0");
    }

    #[test]
    fn test_fit() {
        let (v, clamped) = fit(d("123.456"), 5, 2);
        assert_eq!(v.to_string(), "123.46");
        assert!(!clamped);
        let (v, clamped) = fit(d("12345.6"), 5, 2);
        assert_eq!(v.to_string(), "999.99");
        assert!(clamped);
        let (v, _) = fit(d("-12345.6"), 5, 2);
        assert_eq!(v.to_string(), "-999.99");

        let wide = "12345678901234567890123456789012345";
        let (v, clamped) = fit(d(wide), 40, 0);
        assert_eq!(v.to_string(), wide);
        assert!(!clamped);
    }

    #[test]
    fn test_parse_prefix() {
        let (v, n, _) = parse_prefix("12.50abc");
        assert_eq!(v.to_string(), "12.50");
        assert_eq!(n, 5);
        let (v, n, _) = parse_prefix("-1.5e2x");
        assert_eq!(v.to_string(), "-150");
        assert_eq!(n, 6);
        let (_, n, _) = parse_prefix("abc");
        assert_eq!(n, 0);
        let (v, _, _) = parse_prefix(".5");
        assert_eq!(v.to_string(), "0.5");
        let (v, _, _) = parse_prefix("0.00");
        assert_eq!(v.to_string(), "0.00");
        let (v, _, clamped) = parse_prefix("1e70");
        assert_eq!(v, max_for(65, 0));
        assert!(clamped);
    }

    #[test]
    fn test_precision_limits() {
        let nines = "9".repeat(65);
        let max = d(&nines);
        assert_eq!(max, max_for(65, 0));
        assert_eq!(max.to_string(), nines);
        assert!(max.checked_add(Decimal::ONE).is_none());
        assert!((-max).checked_sub(Decimal::ONE).is_none());

        // 35 integer digits leave room for 30 fraction digits
        let text = format!("{}.{}", "1".repeat(35), "2".repeat(30));
        let v = d(&text);
        assert_eq!(v.scale(), 30);
        assert_eq!(v.to_string(), text);

        // Extra fraction digits give way to the integer part
        let v = d(&format!("{}.55", "1".repeat(64)));
        assert_eq!(v.to_string(), format!("{}.6", "1".repeat(64)));

        let big = d("79228162514264337593543950335");
        assert_eq!(
            big.checked_add(Decimal::ONE).unwrap().to_string(),
            "79228162514264337593543950336"
        );
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(d("1.10").checked_mul(d("2.5")).unwrap().to_string(), "2.750");
        assert_eq!(d("1").checked_div(d("3"), 4).unwrap().to_string(), "0.3333");
        assert_eq!(d("-2").checked_div(d("3"), 4).unwrap().to_string(), "-0.6667");
        assert_eq!(d("7.5").checked_int_div(d("2")).unwrap().to_string(), "3");
        assert_eq!(d("-7.5").checked_rem(d("2")).unwrap().to_string(), "-1.5");
        assert!(d("1").checked_div(Decimal::ZERO, 4).is_none());

        let wide = d(&"3".repeat(60));
        let q = wide.checked_div(d("3"), 0).unwrap();
        assert_eq!(q.to_string(), "1".repeat(60));
        let p = d(&"1".repeat(30)).checked_mul(d(&"9".repeat(30))).unwrap();
        assert_eq!(p.to_string().len(), 60);
    }

    #[test]
    fn test_value_semantics() {
        assert_eq!(d("1.0"), d("1.00"));
        assert!(d("-0.5") < d("0.25"));
        assert_eq!((-d("0")).to_string(), "0");
        assert!(!(-Decimal::ZERO).is_sign_negative());
        assert_eq!(d("1.500").normalize().to_string(), "1.5");
        assert_eq!(d("-1.5").floor().to_string(), "-2");
        assert_eq!(d("1.2").ceil().to_string(), "2");
        assert_eq!(d("-7.9").to_i64(), Some(-7));
        assert_eq!(d("0.000001").to_string(), "0.000001");
        assert!(Decimal::from_str("1.2.3").is_err());
    }

    #[test]
    fn test_int_digits() {
        assert_eq!(int_digits(&d("0.5")), 1);
        assert_eq!(int_digits(&d("-123.4")), 3);
        assert_eq!(int_digits(&d(&"7".repeat(50))), 50);
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(from_f64(0.1).unwrap().to_string(), "0.1");
        assert_eq!(from_f64(123.456).unwrap().to_string(), "123.456");
        assert!(from_f64(f64::NAN).is_none());
        assert!(from_f64(1e300).is_none());
    }
}
