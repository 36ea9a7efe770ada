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

//! Datum - the runtime value of one SQL expression
//!
//! Each variant carries its data directly. Strings and documents sit
//! behind `Arc` so that datums are cheap to clone between batch columns.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::decimal::Decimal;
use super::duration::Duration;
use super::json::{self, Json};
use super::time::Time;
use crate::collation::{Charset, Collation, UTF8MB4_0900_AI_CI};

/// A runtime SQL value
#[derive(Debug, Clone, Default)]
pub enum Datum {
    /// SQL NULL
    #[default]
    Null,

    /// Signed 64-bit integer
    Int(i64),

    /// Unsigned 64-bit integer
    UInt(u64),

    /// Double precision float
    Float(f64),

    /// Fixed-point decimal
    Decimal(Decimal),

    /// Character string, stored as UTF-8 and tagged with its collation
    Str {
        text: Arc<str>,
        collation: &'static Collation,
    },

    /// Binary string
    Bytes(Arc<[u8]>),

    /// DATE
    Date(Time),

    /// DATETIME or TIMESTAMP
    DateTime(Time),

    /// TIME
    Duration(Duration),

    /// ENUM member: 1-based index (0 for the empty error value) and name
    Enum { index: u16, name: Arc<str> },

    /// SET members as a bitmask plus the rendered member list
    Set { bits: u64, names: Arc<str> },

    /// JSON document
    Json(Arc<Json>),
}

impl Datum {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Character string in the server default collation
    pub fn text(value: impl AsRef<str>) -> Self {
        Datum::Str {
            text: Arc::from(value.as_ref()),
            collation: &UTF8MB4_0900_AI_CI,
        }
    }

    /// Character string in `collation`; binary collation yields [`Datum::Bytes`]
    pub fn text_in(value: impl AsRef<str>, collation: &'static Collation) -> Self {
        if collation.charset == Charset::Binary {
            return Datum::Bytes(Arc::from(value.as_ref().as_bytes()));
        }
        Datum::Str {
            text: Arc::from(value.as_ref()),
            collation,
        }
    }

    /// Binary string
    pub fn bytes(value: impl AsRef<[u8]>) -> Self {
        Datum::Bytes(Arc::from(value.as_ref()))
    }

    pub fn json(value: Json) -> Self {
        Datum::Json(Arc::new(value))
    }

    /// `1` or `0`
    pub fn boolean(value: bool) -> Self {
        Datum::Int(value as i64)
    }

    /// Boolean or NULL
    pub fn tri(value: Option<bool>) -> Self {
        match value {
            Some(b) => Datum::boolean(b),
            None => Datum::Null,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Datum::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Datum::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Datum::Decimal(v) => Some(v),
            _ => None,
        }
    }

    /// Text of a character string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Raw bytes of any string-like value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Datum::Str { text, .. } => Some(text.as_bytes()),
            Datum::Bytes(b) => Some(b),
            Datum::Enum { name, .. } => Some(name.as_bytes()),
            Datum::Set { names, .. } => Some(names.as_bytes()),
            _ => None,
        }
    }

    /// Date or datetime value
    pub fn as_time(&self) -> Option<&Time> {
        match self {
            Datum::Date(t) | Datum::DateTime(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Datum::Duration(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Datum::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Collation of a character string
    pub fn collation(&self) -> Option<&'static Collation> {
        match self {
            Datum::Str { collation, .. } => Some(collation),
            _ => None,
        }
    }

    /// Short tag used in internal error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Null => "NULL",
            Datum::Int(_) => "INT",
            Datum::UInt(_) => "UNSIGNED",
            Datum::Float(_) => "DOUBLE",
            Datum::Decimal(_) => "DECIMAL",
            Datum::Str { .. } => "STRING",
            Datum::Bytes(_) => "BINARY",
            Datum::Date(_) => "DATE",
            Datum::DateTime(_) => "DATETIME",
            Datum::Duration(_) => "TIME",
            Datum::Enum { .. } => "ENUM",
            Datum::Set { .. } => "SET",
            Datum::Json(_) => "JSON",
        }
    }

    /// Re-tag a character string with another collation
    pub fn with_collation(self, collation: &'static Collation) -> Self {
        match self {
            Datum::Str { text, .. } if collation.charset == Charset::Binary => {
                Datum::Bytes(Arc::from(text.as_bytes()))
            }
            Datum::Str { text, .. } => Datum::Str { text, collation },
            Datum::Bytes(b) if collation.charset != Charset::Binary => {
                Datum::Str {
                    text: Arc::from(String::from_utf8_lossy(&b).as_ref()),
                    collation,
                }
            }
            other => other,
        }
    }

    /// Structural identity used by tests and the batch/row equivalence
    /// check: NULL equals NULL, floats compare by bits.
    pub fn identical(&self, other: &Datum) -> bool {
        match (self, other) {
            (Datum::Null, Datum::Null) => true,
            (Datum::Int(a), Datum::Int(b)) => a == b,
            (Datum::UInt(a), Datum::UInt(b)) => a == b,
            (Datum::Float(a), Datum::Float(b)) => a.to_bits() == b.to_bits(),
            (Datum::Decimal(a), Datum::Decimal(b)) => a == b && a.scale() == b.scale(),
            (Datum::Str { text: a, collation: ca }, Datum::Str { text: b, collation: cb }) => {
                a == b && ca == cb
            }
            (Datum::Bytes(a), Datum::Bytes(b)) => a == b,
            (Datum::Date(a), Datum::Date(b)) | (Datum::DateTime(a), Datum::DateTime(b)) => {
                a == b && a.fsp == b.fsp
            }
            (Datum::Duration(a), Datum::Duration(b)) => a == b && a.fsp() == b.fsp(),
            (Datum::Enum { index: a, .. }, Datum::Enum { index: b, .. }) => a == b,
            (Datum::Set { bits: a, .. }, Datum::Set { bits: b, .. }) => a == b,
            (Datum::Json(a), Datum::Json(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering between two datums of the same variant; used by MIN/MAX
    /// after both sides were converted to the comparison type.
    pub fn cmp_same_kind(&self, other: &Datum) -> Option<Ordering> {
        match (self, other) {
            (Datum::Int(a), Datum::Int(b)) => Some(a.cmp(b)),
            (Datum::UInt(a), Datum::UInt(b)) => Some(a.cmp(b)),
            (Datum::Float(a), Datum::Float(b)) => a.partial_cmp(b),
            (Datum::Decimal(a), Datum::Decimal(b)) => Some(a.cmp(b)),
            (Datum::Str { text: a, collation }, Datum::Str { text: b, .. }) => {
                Some(collation.compare(a, b))
            }
            (Datum::Bytes(a), Datum::Bytes(b)) => Some(a.cmp(b)),
            (Datum::Date(a), Datum::Date(b))
            | (Datum::DateTime(a), Datum::DateTime(b))
            | (Datum::Date(a), Datum::DateTime(b))
            | (Datum::DateTime(a), Datum::Date(b)) => Some(a.cmp(b)),
            (Datum::Duration(a), Datum::Duration(b)) => Some(a.cmp(b)),
            (Datum::Enum { index: a, .. }, Datum::Enum { index: b, .. }) => Some(a.cmp(b)),
            (Datum::Set { bits: a, .. }, Datum::Set { bits: b, .. }) => Some(a.cmp(b)),
            (Datum::Json(a), Datum::Json(b)) => Some(json::compare(a, b)),
            _ => None,
        }
    }
}

/// Render a double the way MySQL prints it: shortest round-trip digits,
/// scientific notation for very large or very small magnitudes.
pub fn format_f64(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let exp = v.abs().log10().floor() as i32;
    if !(-4..15).contains(&exp) {
        return format!("{:e}", v);
    }
    format!("{}", v)
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("NULL"),
            Datum::Int(v) => write!(f, "{}", v),
            Datum::UInt(v) => write!(f, "{}", v),
            Datum::Float(v) => f.write_str(&format_f64(*v)),
            Datum::Decimal(v) => write!(f, "{}", v),
            Datum::Str { text, .. } => f.write_str(text),
            Datum::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Datum::Date(t) => f.write_str(&t.format_date()),
            Datum::DateTime(t) => f.write_str(&t.format_datetime()),
            Datum::Duration(d) => write!(f, "{}", d),
            Datum::Enum { name, .. } => f.write_str(name),
            Datum::Set { names, .. } => f.write_str(names),
            Datum::Json(j) => f.write_str(&json::to_mysql_string(j)),
        }
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<u64> for Datum {
    fn from(v: u64) -> Self {
        Datum::UInt(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Float(v)
    }
}

impl From<Decimal> for Datum {
    fn from(v: Decimal) -> Self {
        Datum::Decimal(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::text(v)
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::text(v)
    }
}

impl From<Duration> for Datum {
    fn from(v: Duration) -> Self {
        Datum::Duration(v)
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Datum::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::{BINARY, UTF8MB4_BIN};
    use std::str::FromStr;

    #[test]
    fn test_format_f64() {
        assert_eq!(format_f64(1.5), "1.5");
        assert_eq!(format_f64(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_f64(1e20), "1e20");
        assert_eq!(format_f64(1e14), "100000000000000");
        assert_eq!(format_f64(-2.5e-7), "-2.5e-7");
        assert_eq!(format_f64(0.0001), "0.0001");
        assert_eq!(format_f64(-0.0), "-0");
    }

    #[test]
    fn test_display() {
        assert_eq!(Datum::Int(-3).to_string(), "-3");
        assert_eq!(Datum::UInt(u64::MAX).to_string(), "18446744073709551615");
        let d = Decimal::from_str("1.50").unwrap();
        assert_eq!(Datum::Decimal(d).to_string(), "1.50");
        assert_eq!(Datum::Date(Time::from_ymd(2011, 11, 11)).to_string(), "2011-11-11");
        assert_eq!(
            Datum::DateTime(Time::from_ymd_hms(2011, 11, 11, 10, 10, 10)).to_string(),
            "2011-11-11 10:10:10"
        );
    }

    #[test]
    fn test_text_in_binary() {
        let d = Datum::text_in("ab", &BINARY);
        assert!(matches!(d, Datum::Bytes(_)));
        let d = Datum::text("ab").with_collation(&UTF8MB4_BIN);
        assert_eq!(d.collation().unwrap().name, "utf8mb4_bin");
    }

    #[test]
    fn test_identical() {
        assert!(Datum::Null.identical(&Datum::Null));
        assert!(!Datum::Int(1).identical(&Datum::UInt(1)));
        assert!(Datum::Float(f64::NAN).identical(&Datum::Float(f64::NAN)));
        let a = Datum::Decimal(Decimal::from_str("1.0").unwrap());
        let b = Datum::Decimal(Decimal::from_str("1.00").unwrap());
        assert!(!a.identical(&b));
    }

    #[test]
    fn test_cmp_same_kind() {
        let a = Datum::text_in("a", &crate::collation::UTF8MB4_0900_AI_CI);
        let b = Datum::text_in("A", &crate::collation::UTF8MB4_0900_AI_CI);
        assert_eq!(a.cmp_same_kind(&b), Some(Ordering::Equal));
        assert_eq!(Datum::Int(1).cmp_same_kind(&Datum::Float(1.0)), None);
    }
}
