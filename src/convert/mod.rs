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

//! Coercion and cast engine
//!
//! Every conversion between two value kinds is a plain function picked from
//! a `(SourceKind, TargetKind)` table. The table is a single `match` without
//! a wildcard arm, so adding a kind fails to compile until every pair is
//! decided.
//!
//! Conversions never decide on strictness themselves: lossy results are
//! reported through [`Diagnostics::observe`], which either records a
//! warning or aborts the statement.

pub mod number;

use std::sync::Arc;

use num_traits::ToPrimitive;

use crate::collation::{Charset, Collation};
use crate::core::decimal::{self, Decimal};
use crate::core::json::{self, Json};
use crate::core::types::UNSPECIFIED_LENGTH;
use crate::core::{
    format_f64, Datum, Duration, Error, EvalType, FieldKind, FieldType, ParseOptions, Result,
    Time,
};
use crate::diagnostics::{Diagnostics, Recovery};
use crate::eval::EvalContext;

use number::{parse_float_prefix, parse_int_prefix, rint};

/// Whether a conversion was written by the user or inserted by resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastMode {
    /// `CAST`, `CONVERT`, `BINARY expr`
    Explicit,
    /// Argument coercion chosen by function resolution
    Implicit,
}

/// Runtime kind of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Null,
    Int,
    UInt,
    Real,
    Decimal,
    String,
    Binary,
    Date,
    DateTime,
    Duration,
    Enum,
    Set,
    Json,
}

impl SourceKind {
    pub fn of(value: &Datum) -> Self {
        match value {
            Datum::Null => SourceKind::Null,
            Datum::Int(_) => SourceKind::Int,
            Datum::UInt(_) => SourceKind::UInt,
            Datum::Float(_) => SourceKind::Real,
            Datum::Decimal(_) => SourceKind::Decimal,
            Datum::Str { .. } => SourceKind::String,
            Datum::Bytes(_) => SourceKind::Binary,
            Datum::Date(_) => SourceKind::Date,
            Datum::DateTime(_) => SourceKind::DateTime,
            Datum::Duration(_) => SourceKind::Duration,
            Datum::Enum { .. } => SourceKind::Enum,
            Datum::Set { .. } => SourceKind::Set,
            Datum::Json(_) => SourceKind::Json,
        }
    }
}

/// Representation a target type is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Signed,
    Unsigned,
    Real,
    Decimal,
    String,
    Binary,
    Date,
    DateTime,
    Duration,
    Year,
    Json,
}

impl TargetKind {
    pub fn of(ft: &FieldType) -> Self {
        if ft.kind == FieldKind::Year {
            return TargetKind::Year;
        }
        match ft.eval_type() {
            EvalType::Int if ft.is_unsigned() => TargetKind::Unsigned,
            EvalType::Int => TargetKind::Signed,
            EvalType::Real => TargetKind::Real,
            EvalType::Decimal => TargetKind::Decimal,
            EvalType::String if ft.is_binary_string() => TargetKind::Binary,
            EvalType::String => TargetKind::String,
            EvalType::Datetime if ft.kind == FieldKind::Date => TargetKind::Date,
            EvalType::Datetime => TargetKind::DateTime,
            EvalType::Duration => TargetKind::Duration,
            EvalType::Json => TargetKind::Json,
        }
    }
}

/// State of one conversion call
pub struct Cast<'a> {
    pub target: &'a FieldType,
    pub mode: CastMode,
    pub ctx: &'a EvalContext,
    pub diag: &'a mut Diagnostics,
}

impl Cast<'_> {
    #[inline]
    fn observe(&mut self, err: Error) -> Result<Recovery> {
        self.diag.observe(err, self.ctx)
    }

    #[inline]
    fn explicit(&self) -> bool {
        self.mode == CastMode::Explicit
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions::from_mode(self.ctx.sql_mode(), self.target.fsp())
    }

    fn truncate_fraction(&self) -> bool {
        self.parse_options().truncate_fraction
    }
}

/// A single conversion
pub type Conversion = fn(Datum, &mut Cast<'_>) -> Result<Datum>;

/// Convert `value` to `target`
pub fn cast(
    value: Datum,
    target: &FieldType,
    mode: CastMode,
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Datum> {
    let convert = conversion(SourceKind::of(&value), TargetKind::of(target));
    let mut cx = Cast {
        target,
        mode,
        ctx,
        diag,
    };
    convert(value, &mut cx)
}

/// The conversion table
pub fn conversion(source: SourceKind, target: TargetKind) -> Conversion {
    use SourceKind as S;
    use TargetKind as T;
    match (source, target) {
        (S::Null, _) => to_null,

        (S::Int, T::Signed) => identity,
        (S::UInt, T::Signed) => uint_to_signed,
        (S::Real, T::Signed) => real_to_signed,
        (S::Decimal, T::Signed) => decimal_to_signed,
        (S::String | S::Binary, T::Signed) => text_to_signed,
        (S::Date | S::DateTime, T::Signed) => time_to_signed,
        (S::Duration, T::Signed) => duration_to_signed,
        (S::Enum | S::Set, T::Signed) => member_to_signed,
        (S::Json, T::Signed) => json_to_signed,

        (S::Int, T::Unsigned) => int_to_unsigned,
        (S::UInt, T::Unsigned) => identity,
        (S::Real, T::Unsigned) => real_to_unsigned,
        (S::Decimal, T::Unsigned) => decimal_to_unsigned,
        (S::String | S::Binary, T::Unsigned) => text_to_unsigned,
        (S::Date | S::DateTime, T::Unsigned) => time_to_unsigned,
        (S::Duration, T::Unsigned) => duration_to_unsigned,
        (S::Enum | S::Set, T::Unsigned) => member_to_unsigned,
        (S::Json, T::Unsigned) => json_to_unsigned,

        (S::Int | S::UInt, T::Real) => int_to_real,
        (S::Real, T::Real) => real_to_real,
        (S::Decimal, T::Real) => decimal_to_real,
        (S::String | S::Binary, T::Real) => text_to_real,
        (S::Date | S::DateTime, T::Real) => time_to_real,
        (S::Duration, T::Real) => duration_to_real,
        (S::Enum | S::Set, T::Real) => member_to_real,
        (S::Json, T::Real) => json_to_real,

        (S::Int | S::UInt, T::Decimal) => int_to_decimal,
        (S::Real, T::Decimal) => real_to_decimal,
        (S::Decimal, T::Decimal) => decimal_to_decimal,
        (S::String | S::Binary, T::Decimal) => text_to_decimal,
        (S::Date | S::DateTime, T::Decimal) => time_to_decimal,
        (S::Duration, T::Decimal) => duration_to_decimal,
        (S::Enum | S::Set, T::Decimal) => member_to_decimal,
        (S::Json, T::Decimal) => json_to_decimal,

        (
            S::Int
            | S::UInt
            | S::Real
            | S::Decimal
            | S::String
            | S::Binary
            | S::Date
            | S::DateTime
            | S::Duration
            | S::Enum
            | S::Set
            | S::Json,
            T::String,
        ) => to_string,
        (
            S::Int
            | S::UInt
            | S::Real
            | S::Decimal
            | S::String
            | S::Binary
            | S::Date
            | S::DateTime
            | S::Duration
            | S::Enum
            | S::Set
            | S::Json,
            T::Binary,
        ) => to_binary,

        (S::Int | S::UInt, T::Date | T::DateTime) => int_to_time,
        (S::Real, T::Date | T::DateTime) => real_to_time,
        (S::Decimal, T::Date | T::DateTime) => decimal_to_time,
        (S::String | S::Binary | S::Enum | S::Set, T::Date | T::DateTime) => text_to_time,
        (S::Date | S::DateTime, T::Date | T::DateTime) => time_to_time,
        (S::Duration, T::Date | T::DateTime) => duration_to_time,
        (S::Json, T::Date | T::DateTime) => json_to_time,

        (S::Int | S::UInt, T::Duration) => int_to_duration,
        (S::Real, T::Duration) => real_to_duration,
        (S::Decimal, T::Duration) => decimal_to_duration,
        (S::String | S::Binary | S::Enum | S::Set, T::Duration) => text_to_duration,
        (S::Date | S::DateTime, T::Duration) => time_to_duration,
        (S::Duration, T::Duration) => duration_to_duration,
        (S::Json, T::Duration) => json_to_duration,

        (S::Int | S::UInt | S::Real | S::Decimal, T::Year) => number_to_year,
        (S::String | S::Binary | S::Enum | S::Set, T::Year) => text_to_year,
        (S::Date | S::DateTime, T::Year) => time_to_year,
        (S::Duration, T::Year) => duration_to_year,
        (S::Json, T::Year) => json_to_year,

        (S::Int | S::UInt | S::Real | S::Decimal, T::Json) => number_to_json,
        (S::String, T::Json) => text_to_json,
        (S::Binary, T::Json) => binary_to_json,
        (S::Date | S::DateTime | S::Duration | S::Enum | S::Set, T::Json) => scalar_to_json,
        (S::Json, T::Json) => identity,
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn to_null(_: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    Ok(Datum::Null)
}

fn identity(value: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    Ok(value)
}

/// Text of a string-like value
fn text_of(value: &Datum) -> String {
    match value {
        Datum::Str { text, .. } => text.to_string(),
        Datum::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        Datum::Enum { name, .. } => name.to_string(),
        Datum::Set { names, .. } => names.to_string(),
        other => other.to_string(),
    }
}

/// Clamp an integer parsed from text into i64; explicit casts keep the
/// bit pattern of values in the unsigned range.
fn signed_from_i128(v: i128, explicit: bool) -> (i64, bool) {
    if v > i64::MAX as i128 {
        if explicit && v <= u64::MAX as i128 {
            return (v as u64 as i64, true);
        }
        return (i64::MAX, false);
    }
    if v < i64::MIN as i128 {
        return (i64::MIN, false);
    }
    (v as i64, true)
}

fn unsigned_from_i128(v: i128, explicit: bool) -> (u64, bool) {
    if v < 0 {
        if explicit && v >= i64::MIN as i128 {
            return (v as i64 as u64, true);
        }
        return (0, false);
    }
    if v > u64::MAX as i128 {
        return (u64::MAX, false);
    }
    (v as u64, true)
}

/// Packed number of a temporal value, fraction rounded to whole seconds
fn time_packed(value: &Datum, truncate: bool) -> i64 {
    match value {
        Datum::Date(t) => t.to_packed_number(true),
        Datum::DateTime(t) => t.round_frac(0, truncate).unwrap_or(*t).to_packed_number(false),
        Datum::Duration(d) => d.round_frac(0, truncate).to_packed_number(),
        _ => 0,
    }
}

/// Packed number with fraction as a decimal of the value's precision
fn temporal_decimal(value: &Datum) -> Decimal {
    let (packed, micro, fsp, neg) = match value {
        Datum::Date(t) => (t.to_packed_number(true), 0, 0, false),
        Datum::DateTime(t) => (t.to_packed_number(false), t.micro as i64, t.fsp, false),
        Datum::Duration(d) => (
            d.to_packed_number().abs(),
            d.micro_part() as i64,
            d.fsp(),
            d.is_neg(),
        ),
        _ => (0, 0, 0, false),
    };
    let unit = 10i64.pow(6 - fsp as u32);
    let mantissa = packed * 10i64.pow(fsp as u32) + micro / unit;
    Decimal::new(if neg { -mantissa } else { mantissa }, fsp as u32)
}

// ============================================================================
// Signed integer target
// ============================================================================

fn uint_to_signed(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::UInt(v) = value else {
        return Ok(value);
    };
    if v <= i64::MAX as u64 || cx.explicit() {
        return Ok(Datum::Int(v as i64));
    }
    cx.observe(Error::saturated("BIGINT", v.to_string()))?;
    Ok(Datum::Int(i64::MAX))
}

fn real_to_signed(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let f = value.as_f64().unwrap_or(0.0);
    let r = rint(f);
    if r >= 9_223_372_036_854_775_808.0 || r < -9_223_372_036_854_775_808.0 || r.is_nan() {
        cx.observe(Error::truncated_wrong_value("INTEGER", format_f64(f)))?;
        return Ok(Datum::Int(if r > 0.0 { i64::MAX } else { i64::MIN }));
    }
    Ok(Datum::Int(r as i64))
}

fn decimal_to_signed(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Decimal(d) = value else {
        return Ok(value);
    };
    let r = decimal::round(d, 0);
    if let Some(v) = r.to_i64() {
        return Ok(Datum::Int(v));
    }
    if cx.explicit() && r.is_sign_positive() {
        if let Some(u) = r.to_u64() {
            return Ok(Datum::Int(u as i64));
        }
    }
    cx.observe(Error::truncated_wrong_value("DECIMAL", d.to_string()))?;
    Ok(Datum::Int(if d.is_sign_negative() { i64::MIN } else { i64::MAX }))
}

fn text_to_signed(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    let parsed = parse_int_prefix(&text);
    let (v, fits) = signed_from_i128(parsed.value, cx.explicit());
    if parsed.truncated || parsed.overflow || !fits {
        cx.observe(Error::truncated_wrong_value("INTEGER", text))?;
    }
    Ok(Datum::Int(v))
}

fn time_to_signed(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    Ok(Datum::Int(time_packed(&value, cx.truncate_fraction())))
}

fn duration_to_signed(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    Ok(Datum::Int(time_packed(&value, cx.truncate_fraction())))
}

fn member_to_signed(value: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    Ok(match value {
        Datum::Enum { index, .. } => Datum::Int(index as i64),
        Datum::Set { bits, .. } => Datum::Int(bits as i64),
        other => other,
    })
}

fn json_to_signed(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Json(doc) = value else {
        return Ok(value);
    };
    match doc.as_ref() {
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Datum::Int(i))
            } else if let Some(u) = n.as_u64() {
                uint_to_signed(Datum::UInt(u), cx)
            } else {
                real_to_signed(Datum::Float(n.as_f64().unwrap_or(0.0)), cx)
            }
        }
        Json::Bool(b) => Ok(Datum::Int(*b as i64)),
        Json::String(s) => text_to_signed(Datum::text(s), cx),
        other => {
            cx.observe(Error::truncated_wrong_value("INTEGER", json::to_mysql_string(other)))?;
            Ok(Datum::Int(0))
        }
    }
}

// ============================================================================
// Unsigned integer target
// ============================================================================

fn int_to_unsigned(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Int(v) = value else {
        return Ok(value);
    };
    if v >= 0 || cx.explicit() {
        return Ok(Datum::UInt(v as u64));
    }
    cx.observe(Error::saturated("BIGINT UNSIGNED", v.to_string()))?;
    Ok(Datum::UInt(0))
}

fn real_to_unsigned(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let f = value.as_f64().unwrap_or(0.0);
    let r = rint(f);
    if r < 0.0 {
        if cx.explicit() && r >= -9_223_372_036_854_775_808.0 {
            return Ok(Datum::UInt(r as i64 as u64));
        }
        cx.observe(Error::truncated_wrong_value("INTEGER", format_f64(f)))?;
        return Ok(Datum::UInt(0));
    }
    if r >= 18_446_744_073_709_551_616.0 || r.is_nan() {
        cx.observe(Error::truncated_wrong_value("INTEGER", format_f64(f)))?;
        return Ok(Datum::UInt(u64::MAX));
    }
    Ok(Datum::UInt(r as u64))
}

fn decimal_to_unsigned(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Decimal(d) = value else {
        return Ok(value);
    };
    let r = decimal::round(d, 0);
    if r.is_sign_negative() && !r.is_zero() {
        if cx.explicit() {
            if let Some(v) = r.to_i64() {
                return Ok(Datum::UInt(v as u64));
            }
        }
        cx.observe(Error::truncated_wrong_value("DECIMAL", d.to_string()))?;
        return Ok(Datum::UInt(0));
    }
    match r.to_u64() {
        Some(v) => Ok(Datum::UInt(v)),
        None => {
            cx.observe(Error::truncated_wrong_value("DECIMAL", d.to_string()))?;
            Ok(Datum::UInt(u64::MAX))
        }
    }
}

fn text_to_unsigned(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    let parsed = parse_int_prefix(&text);
    let (v, fits) = unsigned_from_i128(parsed.value, cx.explicit());
    if parsed.truncated || parsed.overflow || !fits {
        cx.observe(Error::truncated_wrong_value("INTEGER", text))?;
    }
    Ok(Datum::UInt(v))
}

fn time_to_unsigned(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    Ok(Datum::UInt(time_packed(&value, cx.truncate_fraction()) as u64))
}

fn duration_to_unsigned(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let packed = time_packed(&value, cx.truncate_fraction());
    int_to_unsigned(Datum::Int(packed), cx)
}

fn member_to_unsigned(value: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    Ok(match value {
        Datum::Enum { index, .. } => Datum::UInt(index as u64),
        Datum::Set { bits, .. } => Datum::UInt(bits),
        other => other,
    })
}

fn json_to_unsigned(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Json(doc) = value else {
        return Ok(value);
    };
    match doc.as_ref() {
        Json::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Datum::UInt(u))
            } else if let Some(i) = n.as_i64() {
                int_to_unsigned(Datum::Int(i), cx)
            } else {
                real_to_unsigned(Datum::Float(n.as_f64().unwrap_or(0.0)), cx)
            }
        }
        Json::Bool(b) => Ok(Datum::UInt(*b as u64)),
        Json::String(s) => text_to_unsigned(Datum::text(s), cx),
        other => {
            cx.observe(Error::truncated_wrong_value("INTEGER", json::to_mysql_string(other)))?;
            Ok(Datum::UInt(0))
        }
    }
}

// ============================================================================
// Real target
// ============================================================================

/// FLOAT targets keep single precision
fn finish_real(v: f64, cx: &Cast<'_>) -> Datum {
    if cx.target.kind == FieldKind::Float {
        return Datum::Float(v as f32 as f64);
    }
    Datum::Float(v)
}

fn int_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let v = match value {
        Datum::Int(v) => v as f64,
        Datum::UInt(v) => v as f64,
        _ => 0.0,
    };
    Ok(finish_real(v, cx))
}

fn real_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    Ok(finish_real(value.as_f64().unwrap_or(0.0), cx))
}

fn decimal_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let v = value.as_decimal().map(decimal::to_f64).unwrap_or(0.0);
    Ok(finish_real(v, cx))
}

fn text_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    let (v, truncated) = parse_float_prefix(&text);
    if truncated {
        cx.observe(Error::truncated_wrong_value("DOUBLE", text))?;
    }
    Ok(finish_real(v, cx))
}

fn time_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let v = match &value {
        Datum::Date(t) => t.to_packed_number(true) as f64,
        Datum::DateTime(t) => t.to_packed_number(false) as f64 + t.micro as f64 / 1e6,
        _ => 0.0,
    };
    Ok(finish_real(v, cx))
}

fn duration_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let v = match &value {
        Datum::Duration(d) => {
            let abs = d.to_packed_number().abs() as f64 + d.micro_part() as f64 / 1e6;
            if d.is_neg() {
                -abs
            } else {
                abs
            }
        }
        _ => 0.0,
    };
    Ok(finish_real(v, cx))
}

fn member_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let v = match value {
        Datum::Enum { index, .. } => index as f64,
        Datum::Set { bits, .. } => bits as f64,
        _ => 0.0,
    };
    Ok(finish_real(v, cx))
}

fn json_to_real(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Json(doc) = value else {
        return Ok(value);
    };
    match doc.as_ref() {
        Json::Number(n) => Ok(finish_real(n.as_f64().unwrap_or(0.0), cx)),
        Json::Bool(b) => Ok(finish_real(*b as i64 as f64, cx)),
        Json::String(s) => text_to_real(Datum::text(s), cx),
        other => {
            cx.observe(Error::truncated_wrong_value("DOUBLE", json::to_mysql_string(other)))?;
            Ok(finish_real(0.0, cx))
        }
    }
}

// ============================================================================
// Decimal target
// ============================================================================

/// Apply the target's precision and scale
fn finish_decimal(d: Decimal, cx: &mut Cast<'_>) -> Result<Datum> {
    let t = cx.target;
    if t.flen == UNSPECIFIED_LENGTH || t.decimal == UNSPECIFIED_LENGTH {
        return Ok(Datum::Decimal(d));
    }
    let (v, clamped) = decimal::fit(d, t.flen.max(1) as u32, t.decimal.max(0) as u32);
    if clamped {
        cx.observe(Error::saturated(t.range_name(), d.to_string()))?;
    }
    Ok(Datum::Decimal(v))
}

fn int_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let d = match value {
        Datum::Int(v) => Decimal::from(v),
        Datum::UInt(v) => Decimal::from(v),
        _ => Decimal::ZERO,
    };
    finish_decimal(d, cx)
}

fn real_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let f = value.as_f64().unwrap_or(0.0);
    match decimal::from_f64(f) {
        Some(d) => finish_decimal(d, cx),
        None => {
            cx.observe(Error::saturated("DECIMAL", format_f64(f)))?;
            finish_decimal(decimal::saturated(f < 0.0), cx)
        }
    }
}

fn decimal_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    match value {
        Datum::Decimal(d) => finish_decimal(d, cx),
        other => Ok(other),
    }
}

fn text_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    let trimmed = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (d, consumed, clamped) = decimal::parse_prefix(trimmed);
    let rest = trimmed[consumed..].trim_matches(|c: char| c.is_ascii_whitespace());
    if consumed == 0 || !rest.is_empty() || clamped {
        cx.observe(Error::truncated_wrong_value("DECIMAL", text.clone()))?;
    }
    finish_decimal(d, cx)
}

fn time_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    finish_decimal(temporal_decimal(&value), cx)
}

fn duration_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    finish_decimal(temporal_decimal(&value), cx)
}

fn member_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let d = match value {
        Datum::Enum { index, .. } => Decimal::from(index),
        Datum::Set { bits, .. } => Decimal::from(bits),
        _ => Decimal::ZERO,
    };
    finish_decimal(d, cx)
}

fn json_to_decimal(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Json(doc) = value else {
        return Ok(value);
    };
    match doc.as_ref() {
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                finish_decimal(Decimal::from(i), cx)
            } else if let Some(u) = n.as_u64() {
                finish_decimal(Decimal::from(u), cx)
            } else {
                real_to_decimal(Datum::Float(n.as_f64().unwrap_or(0.0)), cx)
            }
        }
        Json::Bool(b) => finish_decimal(Decimal::from(*b as i64), cx),
        Json::String(s) => text_to_decimal(Datum::text(s), cx),
        other => {
            cx.observe(Error::truncated_wrong_value("DECIMAL", json::to_mysql_string(other)))?;
            finish_decimal(Decimal::ZERO, cx)
        }
    }
}

// ============================================================================
// String targets
// ============================================================================

/// Replace characters the charset cannot store with `?`
fn encode_for(text: String, collation: &Collation) -> String {
    if collation.charset == Charset::Utf8mb4 || text.is_ascii() {
        return text;
    }
    text.chars()
        .map(|c| if collation.charset.can_encode(c) { c } else { '?' })
        .collect()
}

fn to_string(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let collation = cx.target.collation;
    if let (Datum::Str { text, collation: from }, false) = (&value, cx.explicit()) {
        if from.charset == collation.charset && cx.target.flen == UNSPECIFIED_LENGTH {
            return Ok(Datum::Str {
                text: text.clone(),
                collation,
            });
        }
    }
    let mut text = encode_for(text_of(&value), collation);
    let limit = cx.target.flen;
    if cx.explicit() && limit >= 0 {
        let limit = limit as usize;
        if let Some((cut, _)) = text.char_indices().nth(limit) {
            cx.observe(Error::truncated_wrong_value(format!("CHAR({})", limit), text.clone()))?;
            text.truncate(cut);
        }
    }
    Ok(Datum::Str {
        text: Arc::from(text),
        collation,
    })
}

fn to_binary(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let mut bytes: Vec<u8> = match &value {
        Datum::Bytes(b) => b.to_vec(),
        other => text_of(other).into_bytes(),
    };
    let limit = cx.target.flen;
    if cx.explicit() && limit >= 0 {
        let limit = limit as usize;
        if bytes.len() > limit {
            let shown = String::from_utf8_lossy(&bytes).into_owned();
            cx.observe(Error::truncated_wrong_value(format!("BINARY({})", limit), shown))?;
            bytes.truncate(limit);
        } else if cx.target.kind == FieldKind::String {
            bytes.resize(limit, 0);
        }
    }
    Ok(Datum::Bytes(Arc::from(bytes)))
}

// ============================================================================
// DATE and DATETIME targets
// ============================================================================

fn target_type_name(cx: &Cast<'_>) -> &'static str {
    match cx.target.kind {
        FieldKind::Date => "date",
        _ => "datetime",
    }
}

/// Validate zero parts and shape the value to the target
fn finish_time(t: Time, shown: &str, cx: &mut Cast<'_>) -> Result<Datum> {
    let zero = if t.is_zero_date() {
        Some(false)
    } else if t.has_zero_in_date() {
        Some(true)
    } else {
        None
    };
    if let Some(in_date) = zero {
        let err = Error::zero_date(target_type_name(cx), shown, in_date);
        if cx.observe(err)? == Recovery::Null {
            return Ok(Datum::Null);
        }
    }
    if cx.target.kind == FieldKind::Date {
        return Ok(Datum::Date(t.date()));
    }
    match t.round_frac(cx.target.fsp(), cx.truncate_fraction()) {
        Some(r) => Ok(Datum::DateTime(r)),
        None => {
            cx.observe(Error::datetime_overflow("datetime"))?;
            Ok(Datum::Null)
        }
    }
}

fn invalid_time(shown: String, cx: &mut Cast<'_>) -> Result<Datum> {
    cx.observe(Error::incorrect_datetime("datetime", shown))?;
    Ok(Datum::Null)
}

fn number_to_time(int_part: i64, micro: u32, shown: String, cx: &mut Cast<'_>) -> Result<Datum> {
    match Time::from_number(int_part) {
        Some((t, date_only)) => {
            let t = if date_only {
                t
            } else {
                t.with_micro(micro).with_fsp(6)
            };
            finish_time(t, &shown, cx)
        }
        None => invalid_time(shown, cx),
    }
}

fn int_to_time(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let shown = value.to_string();
    let n = match value {
        Datum::Int(v) => v,
        Datum::UInt(v) => i64::try_from(v).unwrap_or(-1),
        _ => -1,
    };
    number_to_time(n, 0, shown, cx)
}

fn real_to_time(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let f = value.as_f64().unwrap_or(-1.0);
    let shown = format_f64(f);
    if f < 0.0 || f >= 1e15 {
        return invalid_time(shown, cx);
    }
    let int_part = f.trunc();
    let micro = ((f - int_part) * 1e6).round().min(999_999.0) as u32;
    number_to_time(int_part as i64, micro, shown, cx)
}

fn decimal_to_time(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Decimal(d) = value else {
        return Ok(value);
    };
    let shown = d.to_string();
    if d.is_sign_negative() && !d.is_zero() {
        return invalid_time(shown, cx);
    }
    let int_part = d.trunc();
    let micro = decimal::fraction_micros(&d).min(999_999) as u32;
    match int_part.to_i64() {
        Some(n) => number_to_time(n, micro, shown, cx),
        None => invalid_time(shown, cx),
    }
}

fn text_to_time(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    let Some(parsed) = Time::parse(&text, cx.parse_options()) else {
        return invalid_time(text, cx);
    };
    if parsed.truncated {
        cx.observe(Error::truncated_wrong_value("datetime", text.clone()))?;
    }
    finish_time(parsed.time, &text, cx)
}

fn time_to_time(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    match value {
        Datum::Date(t) | Datum::DateTime(t) => {
            let shown = if t.hour == 0 && t.minute == 0 && t.second == 0 && t.micro == 0 {
                t.format_date()
            } else {
                t.format_datetime()
            };
            finish_time(t, &shown, cx)
        }
        other => Ok(other),
    }
}

fn duration_to_time(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Duration(d) = value else {
        return Ok(value);
    };
    let today = cx.ctx.now_time(0).date();
    match Time::from_micros(today.to_micros() + d.micros(), d.fsp()) {
        Some(t) => finish_time(t, &d.to_string(), cx),
        None => {
            cx.observe(Error::datetime_overflow("datetime"))?;
            Ok(Datum::Null)
        }
    }
}

fn json_to_time(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Json(doc) = value else {
        return Ok(value);
    };
    match doc.as_ref() {
        Json::String(s) => text_to_time(Datum::text(s), cx),
        other => invalid_time(json::to_mysql_string(other), cx),
    }
}

// ============================================================================
// TIME target
// ============================================================================

fn finish_duration(d: Duration, cx: &Cast<'_>) -> Datum {
    Datum::Duration(d.round_frac(cx.target.fsp(), cx.truncate_fraction()))
}

fn invalid_duration(shown: String, cx: &mut Cast<'_>) -> Result<Datum> {
    cx.observe(Error::incorrect_datetime("time", shown))?;
    Ok(Datum::Null)
}

fn packed_to_duration(int_part: i64, micro: u64, neg: bool, shown: String, cx: &mut Cast<'_>) -> Result<Datum> {
    let Some(parsed) = Duration::from_number(if neg { -int_part } else { int_part }, 6) else {
        return invalid_duration(shown, cx);
    };
    let base = parsed.duration.micros();
    let micros = if base < 0 || neg {
        base - micro as i64
    } else {
        base + micro as i64
    };
    let (d, clamped) = Duration::from_micros(micros, 6).clamp();
    if parsed.clamped || clamped {
        cx.observe(Error::truncated_wrong_value("time", shown))?;
    }
    Ok(finish_duration(d, cx))
}

fn int_to_duration(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let shown = value.to_string();
    let (abs, neg) = match value {
        Datum::Int(v) => (v.unsigned_abs(), v < 0),
        Datum::UInt(v) => (v, false),
        _ => (0, false),
    };
    match i64::try_from(abs) {
        Ok(n) => packed_to_duration(n, 0, neg, shown, cx),
        Err(_) => invalid_duration(shown, cx),
    }
}

fn real_to_duration(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let f = value.as_f64().unwrap_or(0.0);
    let shown = format_f64(f);
    let abs = f.abs();
    if abs >= 1e15 {
        return invalid_duration(shown, cx);
    }
    let int_part = abs.trunc();
    let micro = ((abs - int_part) * 1e6).round().min(999_999.0) as u64;
    packed_to_duration(int_part as i64, micro, f < 0.0, shown, cx)
}

fn decimal_to_duration(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Decimal(d) = value else {
        return Ok(value);
    };
    let shown = d.to_string();
    let abs = d.abs();
    let int_part = abs.trunc();
    let micro = decimal::fraction_micros(&abs).min(999_999);
    match int_part.to_i64() {
        Some(n) => packed_to_duration(n, micro, d.is_sign_negative() && !d.is_zero(), shown, cx),
        None => invalid_duration(shown, cx),
    }
}

fn text_to_duration(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    let Some(parsed) = Duration::parse(&text, cx.parse_options()) else {
        return invalid_duration(text, cx);
    };
    if parsed.truncated || parsed.clamped {
        cx.observe(Error::truncated_wrong_value("time", text))?;
    }
    Ok(finish_duration(parsed.duration, cx))
}

fn time_to_duration(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let d = match &value {
        Datum::DateTime(t) => Duration::from_micros(t.time_of_day_micros(), t.fsp),
        _ => Duration::from_micros(0, 0),
    };
    Ok(finish_duration(d, cx))
}

fn duration_to_duration(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    match value {
        Datum::Duration(d) => Ok(finish_duration(d, cx)),
        other => Ok(other),
    }
}

fn json_to_duration(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Json(doc) = value else {
        return Ok(value);
    };
    match doc.as_ref() {
        Json::String(s) => text_to_duration(Datum::text(s), cx),
        other => invalid_duration(json::to_mysql_string(other), cx),
    }
}

// ============================================================================
// YEAR target
// ============================================================================

fn year_from(n: i64, from_text: bool, shown: String, cx: &mut Cast<'_>) -> Result<Datum> {
    let year = match n {
        0 if from_text => 2000,
        0 => 0,
        1..=69 => 2000 + n,
        70..=99 => 1900 + n,
        1901..=2155 => n,
        _ => {
            cx.observe(Error::truncated_wrong_value("YEAR", shown))?;
            return Ok(Datum::Null);
        }
    };
    Ok(Datum::UInt(year as u64))
}

fn number_to_year(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let shown = value.to_string();
    let n = match &value {
        Datum::Int(v) => *v,
        Datum::UInt(v) => i64::try_from(*v).unwrap_or(i64::MAX),
        Datum::Float(f) => rint(*f).clamp(i64::MIN as f64, i64::MAX as f64) as i64,
        Datum::Decimal(d) => decimal::round(*d, 0).to_i64().unwrap_or(i64::MAX),
        _ => 0,
    };
    year_from(n, false, shown, cx)
}

fn text_to_year(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    let parsed = parse_int_prefix(&text);
    if parsed.truncated {
        cx.observe(Error::truncated_wrong_value("YEAR", text.clone()))?;
    }
    let (n, _) = number::clamp_i64(parsed.value);
    year_from(n, true, text, cx)
}

fn time_to_year(value: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    match value {
        Datum::Date(t) | Datum::DateTime(t) => Ok(Datum::UInt(t.year as u64)),
        other => Ok(other),
    }
}

fn duration_to_year(_: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    Ok(Datum::UInt(cx.ctx.now_time(0).year as u64))
}

fn json_to_year(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let Datum::Json(doc) = value else {
        return Ok(value);
    };
    match doc.as_ref() {
        Json::Number(n) => match n.as_i64() {
            Some(i) => year_from(i, false, i.to_string(), cx),
            None => number_to_year(Datum::Float(n.as_f64().unwrap_or(0.0)), cx),
        },
        Json::String(s) => text_to_year(Datum::text(s), cx),
        other => {
            cx.observe(Error::truncated_wrong_value("YEAR", json::to_mysql_string(other)))?;
            Ok(Datum::Null)
        }
    }
}

// ============================================================================
// JSON target
// ============================================================================

/// JSON scalar for a numeric datum; decimals are stored as doubles
pub fn number_json(value: &Datum) -> Json {
    match value {
        Datum::Int(v) => Json::from(*v),
        Datum::UInt(v) => Json::from(*v),
        Datum::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Datum::Decimal(d) => serde_json::Number::from_f64(decimal::to_f64(d))
            .map(Json::Number)
            .unwrap_or(Json::Null),
        _ => Json::Null,
    }
}

fn number_to_json(value: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    Ok(Datum::json(number_json(&value)))
}

fn text_to_json(value: Datum, cx: &mut Cast<'_>) -> Result<Datum> {
    let text = text_of(&value);
    match json::parse(&text) {
        Ok(doc) => Ok(Datum::json(doc)),
        Err(detail) => {
            cx.observe(Error::invalid_json_text(1, "cast_as_json", detail))?;
            Ok(Datum::Null)
        }
    }
}

fn binary_to_json(_: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    Err(Error::InvalidJsonCharset {
        arg: 1,
        function: "cast_as_json".to_string(),
    })
}

fn scalar_to_json(value: Datum, _: &mut Cast<'_>) -> Result<Datum> {
    Ok(Datum::json(Json::String(text_of(&value))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::{LATIN1_SWEDISH_CI, UTF8MB4_0900_AI_CI};
    use crate::core::SqlMode;
    use std::str::FromStr;

    fn run(value: Datum, target: &FieldType, mode: CastMode) -> (Result<Datum>, Diagnostics) {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let r = cast(value, target, mode, &ctx, &mut diag);
        (r, diag)
    }

    fn explicit(value: Datum, target: &FieldType) -> (Datum, Diagnostics) {
        let (r, diag) = run(value, target, CastMode::Explicit);
        (r.unwrap(), diag)
    }

    #[test]
    fn test_signed_unsigned_wrap() {
        let (d, _) = explicit(Datum::Int(-1), &FieldType::unsigned_long_long());
        assert!(d.identical(&Datum::UInt(u64::MAX)));
        let (d, diag) = explicit(Datum::UInt(u64::MAX), &FieldType::long_long());
        assert!(d.identical(&Datum::Int(-1)));
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn test_implicit_unsigned_saturates() {
        let (r, diag) = run(Datum::UInt(u64::MAX), &FieldType::long_long(), CastMode::Implicit);
        assert!(r.unwrap().identical(&Datum::Int(i64::MAX)));
        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(diag.warnings()[0].code, 1264);
    }

    #[test]
    fn test_text_to_unsigned_overflow() {
        let (d, diag) = explicit(Datum::text("18446744073709551616"), &FieldType::unsigned_long_long());
        assert!(d.identical(&Datum::UInt(u64::MAX)));
        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(
            diag.warnings()[0].message,
            "Truncated incorrect INTEGER value: '18446744073709551616'"
        );
    }

    #[test]
    fn test_text_prefix() {
        let (d, diag) = explicit(Datum::text("12abc"), &FieldType::long_long());
        assert!(d.identical(&Datum::Int(12)));
        assert_eq!(diag.warning_count(), 1);

        let (d, diag) = explicit(Datum::text(" 1.5e1 "), &FieldType::double());
        assert!(d.identical(&Datum::Float(15.0)));
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_strict_truncation_is_fatal() {
        let ctx = EvalContext::builder().sql_mode(SqlMode::STRICT_ALL_TABLES).build();
        let mut diag = Diagnostics::default();
        let r = cast(Datum::text("x"), &FieldType::long_long(), CastMode::Explicit, &ctx, &mut diag);
        assert_eq!(r.unwrap_err().code(), 1292);
    }

    #[test]
    fn test_float_to_int_uses_rint() {
        let (d, _) = explicit(Datum::Float(2.5), &FieldType::long_long());
        assert!(d.identical(&Datum::Int(2)));
        let (d, _) = explicit(Datum::Float(3.5), &FieldType::long_long());
        assert!(d.identical(&Datum::Int(4)));
    }

    #[test]
    fn test_decimal_to_int_rounds_away() {
        let (d, _) = explicit(Datum::Decimal(Decimal::from_str("2.5").unwrap()), &FieldType::long_long());
        assert!(d.identical(&Datum::Int(3)));
        let (d, _) = explicit(Datum::Decimal(Decimal::from_str("-2.5").unwrap()), &FieldType::long_long());
        assert!(d.identical(&Datum::Int(-3)));
    }

    #[test]
    fn test_decimal_precision_clamp() {
        let target = FieldType::new_decimal(5, 2);
        let (d, diag) = explicit(Datum::Decimal(Decimal::from_str("12345.6").unwrap()), &target);
        assert_eq!(d.to_string(), "999.99");
        assert_eq!(diag.warnings()[0].code, 1264);

        let (d, diag) = explicit(Datum::Float(1.005), &target);
        assert_eq!(d.to_string(), "1.01");
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn test_to_string_formats() {
        let target = FieldType::varchar(&UTF8MB4_0900_AI_CI);
        let (d, _) = explicit(Datum::Float(1e20), &target);
        assert_eq!(d.to_string(), "1e20");
        let (d, _) = explicit(Datum::Date(Time::from_ymd(2011, 1, 2)), &target);
        assert_eq!(d.to_string(), "2011-01-02");
    }

    #[test]
    fn test_char_length_truncation() {
        let target = FieldType::varchar(&UTF8MB4_0900_AI_CI).with_flen(2);
        let (d, diag) = explicit(Datum::text("abc"), &target);
        assert_eq!(d.to_string(), "ab");
        assert_eq!(diag.warnings()[0].message, "Truncated incorrect CHAR(2) value: 'abc'");
    }

    #[test]
    fn test_charset_replacement() {
        let target = FieldType::varchar(&LATIN1_SWEDISH_CI);
        let (d, _) = explicit(Datum::text("a€b"), &target);
        assert_eq!(d.to_string(), "a?b");
    }

    #[test]
    fn test_binary_padding() {
        let mut target = FieldType::varbinary().with_flen(3);
        target.kind = FieldKind::String;
        let (d, _) = explicit(Datum::text("a"), &target);
        assert_eq!(d.as_bytes().unwrap(), b"a\0\0");
    }

    #[test]
    fn test_text_to_datetime() {
        let (d, diag) = explicit(Datum::text("2011-11-11 10:10:10.5"), &FieldType::datetime(0));
        assert_eq!(d.to_string(), "2011-11-11 10:10:11");
        assert!(diag.warnings().is_empty());

        let (d, diag) = explicit(Datum::text("not a date"), &FieldType::datetime(0));
        assert!(d.is_null());
        assert_eq!(diag.warnings()[0].message, "Incorrect datetime value: 'not a date'");
    }

    #[test]
    fn test_zero_date_gating() {
        let (d, diag) = explicit(Datum::text("0000-00-00 12:12:09"), &FieldType::date());
        assert_eq!(d.to_string(), "0000-00-00");
        assert!(diag.warnings().is_empty());

        let ctx = EvalContext::builder().sql_mode(SqlMode::NO_ZERO_DATE).build();
        let mut diag = Diagnostics::default();
        let r = cast(Datum::text("0000-00-00 12:12:09"), &FieldType::date(), CastMode::Explicit, &ctx, &mut diag);
        assert!(r.is_err());

        let ctx = ctx.with_ignore_errors(true);
        let r = cast(Datum::text("0000-00-00 12:12:09"), &FieldType::date(), CastMode::Explicit, &ctx, &mut diag);
        assert!(r.unwrap().is_null());
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_number_to_date() {
        let (d, _) = explicit(Datum::Int(20111111), &FieldType::date());
        assert_eq!(d.to_string(), "2011-11-11");
        let (d, _) = explicit(Datum::Int(111111101010), &FieldType::datetime(0));
        assert_eq!(d.to_string(), "2011-11-11 10:10:10");
        let (d, diag) = explicit(Datum::Int(13), &FieldType::date());
        assert!(d.is_null());
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_time_conversions() {
        let (d, _) = explicit(Datum::text("10:10:10.5"), &FieldType::duration(0));
        assert_eq!(d.to_string(), "10:10:11");
        let (d, diag) = explicit(Datum::text("900:00:00"), &FieldType::duration(0));
        assert_eq!(d.to_string(), "838:59:59");
        assert_eq!(diag.warning_count(), 1);
        let (d, _) = explicit(Datum::Int(-101010), &FieldType::duration(0));
        assert_eq!(d.to_string(), "-10:10:10");
    }

    #[test]
    fn test_temporal_to_numbers() {
        let t = Time::from_ymd_hms(2011, 11, 11, 10, 10, 10).with_micro(500_000).with_fsp(1);
        let (d, _) = explicit(Datum::DateTime(t), &FieldType::long_long());
        assert!(d.identical(&Datum::Int(20111111101011)));
        let (d, _) = explicit(Datum::DateTime(t), &FieldType::new_decimal(-1, -1));
        assert_eq!(d.to_string(), "20111111101010.5");
    }

    #[test]
    fn test_year_target() {
        let (d, _) = explicit(Datum::Int(69), &FieldType::year());
        assert!(d.identical(&Datum::UInt(2069)));
        let (d, _) = explicit(Datum::text("0"), &FieldType::year());
        assert!(d.identical(&Datum::UInt(2000)));
        let (d, diag) = explicit(Datum::Int(3000), &FieldType::year());
        assert!(d.is_null());
        assert_eq!(diag.warning_count(), 1);
    }

    #[test]
    fn test_json_target() {
        let (d, _) = explicit(Datum::text("{\"b\": 1, \"a\": [true]}"), &FieldType::json());
        assert_eq!(d.to_string(), "{\"a\": [true], \"b\": 1}");

        let (r, _) = run(Datum::text("{"), &FieldType::json(), CastMode::Explicit);
        assert_eq!(r.unwrap_err().code(), 3140);

        let (r, _) = run(Datum::bytes(b"{}"), &FieldType::json(), CastMode::Explicit);
        assert!(r.is_err());

        let (d, _) = explicit(Datum::Date(Time::from_ymd(2011, 1, 1)), &FieldType::json());
        assert_eq!(d.to_string(), "\"2011-01-01\"");
    }

    #[test]
    fn test_null_passes_through() {
        for target in [FieldType::long_long(), FieldType::json(), FieldType::date()] {
            let (d, diag) = explicit(Datum::Null, &target);
            assert!(d.is_null());
            assert!(diag.warnings().is_empty());
        }
    }
}
