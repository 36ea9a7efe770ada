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

//! Static type model
//!
//! [`FieldType`] describes the type of an expression node. It is computed
//! when a call is resolved and never changes afterwards.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::collation::{Charset, Collation, BINARY};

/// Length not known at plan time
pub const UNSPECIFIED_LENGTH: i32 = -1;

/// Maximum fractional second precision
pub const MAX_FSP: u8 = 6;

/// Maximum DECIMAL precision
pub const MAX_DECIMAL_PRECISION: u32 = 65;

/// Maximum DECIMAL scale
pub const MAX_DECIMAL_SCALE: u32 = 30;

/// MySQL column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FieldKind {
    #[default]
    Null,
    Tiny,
    Short,
    Int24,
    Long,
    LongLong,
    Year,
    Bit,
    Float,
    Double,
    NewDecimal,
    Varchar,
    VarString,
    String,
    Blob,
    Date,
    DateTime,
    Timestamp,
    Duration,
    Enum,
    Set,
    Json,
}

impl FieldKind {
    /// Returns true for the integer kinds
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            FieldKind::Tiny
                | FieldKind::Short
                | FieldKind::Int24
                | FieldKind::Long
                | FieldKind::LongLong
                | FieldKind::Year
                | FieldKind::Bit
        )
    }

    /// Returns true for the string kinds
    pub fn is_string(self) -> bool {
        matches!(
            self,
            FieldKind::Varchar | FieldKind::VarString | FieldKind::String | FieldKind::Blob
        )
    }

    /// Returns true for DATE, DATETIME and TIMESTAMP
    pub fn is_temporal_date(self) -> bool {
        matches!(
            self,
            FieldKind::Date | FieldKind::DateTime | FieldKind::Timestamp
        )
    }

    /// Returns true for numeric kinds
    pub fn is_numeric(self) -> bool {
        self.is_integer()
            || matches!(
                self,
                FieldKind::Float | FieldKind::Double | FieldKind::NewDecimal
            )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Null => "NULL",
            FieldKind::Tiny => "TINYINT",
            FieldKind::Short => "SMALLINT",
            FieldKind::Int24 => "MEDIUMINT",
            FieldKind::Long => "INT",
            FieldKind::LongLong => "BIGINT",
            FieldKind::Year => "YEAR",
            FieldKind::Bit => "BIT",
            FieldKind::Float => "FLOAT",
            FieldKind::Double => "DOUBLE",
            FieldKind::NewDecimal => "DECIMAL",
            FieldKind::Varchar => "VARCHAR",
            FieldKind::VarString => "VARCHAR",
            FieldKind::String => "CHAR",
            FieldKind::Blob => "BLOB",
            FieldKind::Date => "DATE",
            FieldKind::DateTime => "DATETIME",
            FieldKind::Timestamp => "TIMESTAMP",
            FieldKind::Duration => "TIME",
            FieldKind::Enum => "ENUM",
            FieldKind::Set => "SET",
            FieldKind::Json => "JSON",
        };
        f.write_str(name)
    }
}

/// Evaluation class of a type; selects the kernel a function runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalType {
    Int,
    Real,
    Decimal,
    String,
    Datetime,
    Duration,
    Json,
}

impl EvalType {
    /// Returns true for Int, Real and Decimal
    pub fn is_numeric(self) -> bool {
        matches!(self, EvalType::Int | EvalType::Real | EvalType::Decimal)
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvalType::Int => "INTEGER",
            EvalType::Real => "DOUBLE",
            EvalType::Decimal => "DECIMAL",
            EvalType::String => "CHAR",
            EvalType::Datetime => "DATETIME",
            EvalType::Duration => "TIME",
            EvalType::Json => "JSON",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Column flags relevant to evaluation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u16 {
        const NOT_NULL = 1 << 0;
        const UNSIGNED = 1 << 1;
        const BINARY = 1 << 2;
        const ZEROFILL = 1 << 3;
        const IS_BOOLEAN = 1 << 4;
    }
}

/// Static type of an expression node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub kind: FieldKind,
    pub flen: i32,
    pub decimal: i32,
    pub collation: &'static Collation,
    pub flags: FieldFlags,
    pub elems: Vec<Arc<str>>,
}

impl Default for FieldType {
    fn default() -> Self {
        Self::new(FieldKind::Null)
    }
}

impl FieldType {
    /// Create a type of `kind` with unspecified length
    pub fn new(kind: FieldKind) -> Self {
        let flags = if kind.is_string() {
            FieldFlags::empty()
        } else {
            FieldFlags::BINARY
        };
        Self {
            kind,
            flen: UNSPECIFIED_LENGTH,
            decimal: UNSPECIFIED_LENGTH,
            collation: &BINARY,
            flags,
            elems: Vec::new(),
        }
    }

    /// BIGINT
    pub fn long_long() -> Self {
        Self::new(FieldKind::LongLong).with_flen(20).with_decimal(0)
    }

    /// BIGINT UNSIGNED
    pub fn unsigned_long_long() -> Self {
        Self::long_long().with_flags(FieldFlags::UNSIGNED)
    }

    /// Boolean-valued integer result (comparisons, logic operators)
    pub fn boolean() -> Self {
        Self::new(FieldKind::LongLong)
            .with_flen(1)
            .with_decimal(0)
            .with_flags(FieldFlags::IS_BOOLEAN)
    }

    /// DOUBLE
    pub fn double() -> Self {
        Self::new(FieldKind::Double).with_flen(22)
    }

    /// DECIMAL(flen, decimal)
    pub fn new_decimal(flen: i32, decimal: i32) -> Self {
        Self::new(FieldKind::NewDecimal)
            .with_flen(flen)
            .with_decimal(decimal)
    }

    /// VARCHAR in `collation`
    pub fn varchar(collation: &'static Collation) -> Self {
        let mut ft = Self::new(FieldKind::VarString);
        ft.collation = collation;
        if collation.charset == Charset::Binary {
            ft.flags |= FieldFlags::BINARY;
        }
        ft
    }

    /// VARBINARY
    pub fn varbinary() -> Self {
        Self::varchar(&BINARY)
    }

    /// DATE
    pub fn date() -> Self {
        Self::new(FieldKind::Date).with_flen(10).with_decimal(0)
    }

    /// DATETIME(fsp)
    pub fn datetime(fsp: u8) -> Self {
        let flen = if fsp > 0 { 20 + fsp as i32 } else { 19 };
        Self::new(FieldKind::DateTime)
            .with_flen(flen)
            .with_decimal(fsp as i32)
    }

    /// TIMESTAMP(fsp)
    pub fn timestamp(fsp: u8) -> Self {
        let mut ft = Self::datetime(fsp);
        ft.kind = FieldKind::Timestamp;
        ft
    }

    /// TIME(fsp)
    pub fn duration(fsp: u8) -> Self {
        let flen = if fsp > 0 { 11 + fsp as i32 } else { 10 };
        Self::new(FieldKind::Duration)
            .with_flen(flen)
            .with_decimal(fsp as i32)
    }

    /// YEAR
    pub fn year() -> Self {
        Self::new(FieldKind::Year)
            .with_flen(4)
            .with_decimal(0)
            .with_flags(FieldFlags::UNSIGNED)
    }

    /// JSON
    pub fn json() -> Self {
        let mut ft = Self::new(FieldKind::Json);
        ft.collation = &crate::collation::UTF8MB4_BIN;
        ft.flags = FieldFlags::empty();
        ft
    }

    /// Type of the NULL literal
    pub fn null() -> Self {
        Self::new(FieldKind::Null)
    }

    /// ENUM with the given members
    pub fn enumeration(elems: Vec<Arc<str>>, collation: &'static Collation) -> Self {
        let mut ft = Self::varchar(collation);
        ft.kind = FieldKind::Enum;
        ft.elems = elems;
        ft
    }

    /// SET with the given members
    pub fn set(elems: Vec<Arc<str>>, collation: &'static Collation) -> Self {
        let mut ft = Self::enumeration(elems, collation);
        ft.kind = FieldKind::Set;
        ft
    }

    pub fn with_flen(mut self, flen: i32) -> Self {
        self.flen = flen;
        self
    }

    pub fn with_decimal(mut self, decimal: i32) -> Self {
        self.decimal = decimal;
        self
    }

    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_collation(mut self, collation: &'static Collation) -> Self {
        self.collation = collation;
        self
    }

    /// Character set of string types
    #[inline]
    pub fn charset(&self) -> Charset {
        self.collation.charset
    }

    #[inline]
    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(FieldFlags::UNSIGNED)
    }

    /// Returns true for string types with the binary charset
    pub fn is_binary_string(&self) -> bool {
        self.kind.is_string() && self.collation.charset == Charset::Binary
    }

    /// Fractional second precision of temporal types, clamped to [0, 6]
    pub fn fsp(&self) -> u8 {
        if self.decimal <= 0 {
            0
        } else {
            (self.decimal as u8).min(MAX_FSP)
        }
    }

    /// Evaluation class
    pub fn eval_type(&self) -> EvalType {
        match self.kind {
            FieldKind::Tiny
            | FieldKind::Short
            | FieldKind::Int24
            | FieldKind::Long
            | FieldKind::LongLong
            | FieldKind::Year
            | FieldKind::Bit => EvalType::Int,
            FieldKind::Float | FieldKind::Double => EvalType::Real,
            FieldKind::NewDecimal => EvalType::Decimal,
            FieldKind::Date | FieldKind::DateTime | FieldKind::Timestamp => EvalType::Datetime,
            FieldKind::Duration => EvalType::Duration,
            FieldKind::Json => EvalType::Json,
            FieldKind::Null
            | FieldKind::Varchar
            | FieldKind::VarString
            | FieldKind::String
            | FieldKind::Blob
            | FieldKind::Enum
            | FieldKind::Set => EvalType::String,
        }
    }

    /// Name used in out-of-range messages, e.g. `BIGINT UNSIGNED`
    pub fn range_name(&self) -> String {
        match self.eval_type() {
            EvalType::Int if self.is_unsigned() => "BIGINT UNSIGNED".to_string(),
            EvalType::Int => "BIGINT".to_string(),
            EvalType::Decimal => format!("DECIMAL({},{})", self.flen.max(1), self.decimal.max(0)),
            EvalType::Real => "DOUBLE".to_string(),
            _ => self.kind.to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldKind::NewDecimal => write!(f, "decimal({},{})", self.flen, self.decimal)?,
            FieldKind::VarString | FieldKind::Varchar | FieldKind::String => {
                let base = if self.is_binary_string() {
                    "varbinary"
                } else {
                    "varchar"
                };
                if self.flen >= 0 {
                    write!(f, "{}({})", base, self.flen)?;
                } else {
                    f.write_str(base)?;
                }
            }
            FieldKind::DateTime | FieldKind::Timestamp | FieldKind::Duration if self.fsp() > 0 => {
                write!(f, "{}({})", self.kind.to_string().to_lowercase(), self.fsp())?
            }
            kind => f.write_str(&kind.to_string().to_lowercase())?,
        }
        if self.is_unsigned() && self.kind.is_numeric() {
            f.write_str(" unsigned")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::UTF8MB4_0900_AI_CI;

    #[test]
    fn test_eval_types() {
        assert_eq!(FieldType::long_long().eval_type(), EvalType::Int);
        assert_eq!(FieldType::double().eval_type(), EvalType::Real);
        assert_eq!(FieldType::new_decimal(10, 2).eval_type(), EvalType::Decimal);
        assert_eq!(FieldType::date().eval_type(), EvalType::Datetime);
        assert_eq!(FieldType::duration(0).eval_type(), EvalType::Duration);
        assert_eq!(
            FieldType::varchar(&UTF8MB4_0900_AI_CI).eval_type(),
            EvalType::String
        );
        assert_eq!(FieldType::null().eval_type(), EvalType::String);
    }

    #[test]
    fn test_flags() {
        let ft = FieldType::unsigned_long_long();
        assert!(ft.is_unsigned());
        assert_eq!(ft.range_name(), "BIGINT UNSIGNED");
        assert!(FieldType::varbinary().is_binary_string());
        assert!(!FieldType::varchar(&UTF8MB4_0900_AI_CI).is_binary_string());
    }

    #[test]
    fn test_fsp() {
        assert_eq!(FieldType::datetime(3).fsp(), 3);
        assert_eq!(FieldType::datetime(3).flen, 23);
        assert_eq!(FieldType::long_long().fsp(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::new_decimal(10, 2).to_string(), "decimal(10,2)");
        assert_eq!(FieldType::unsigned_long_long().to_string(), "bigint unsigned");
        assert_eq!(FieldType::datetime(6).to_string(), "datetime(6)");
    }
}
