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

//! Collation Registry
//!
//! This module holds the static table of supported character sets and
//! collations, the [`Coercibility`] ranking, and the algorithm that unifies
//! the collations of several operands:
//!
//! - [`Charset`] - character set (utf8mb4, latin1, binary, ...)
//! - [`Collation`] - a named collation with its comparison rules
//! - [`Derivation`] - collation + coercibility + repertoire of an expression
//! - [`resolve`] / [`resolve_for_comparison`] - collation mixing

mod collator;
mod derivation;

use std::fmt;

use crate::core::{Error, Result};

pub use collator::CollatorKind;
pub use derivation::{resolve, resolve_for_comparison, Coercibility, Derivation, Repertoire};

/// Character set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Charset {
    Binary,
    Ascii,
    Latin1,
    Utf8mb3,
    Utf8mb4,
    Gbk,
}

impl Charset {
    /// All supported charsets
    pub const ALL: [Charset; 6] = [
        Charset::Binary,
        Charset::Ascii,
        Charset::Latin1,
        Charset::Utf8mb3,
        Charset::Utf8mb4,
        Charset::Gbk,
    ];

    /// Charset name as shown by `CHARSET()`
    pub fn name(self) -> &'static str {
        match self {
            Charset::Binary => "binary",
            Charset::Ascii => "ascii",
            Charset::Latin1 => "latin1",
            Charset::Utf8mb3 => "utf8mb3",
            Charset::Utf8mb4 => "utf8mb4",
            Charset::Gbk => "gbk",
        }
    }

    /// Look up a charset by name (case-insensitive, `utf8` is `utf8mb3`)
    pub fn from_name(name: &str) -> Result<Charset> {
        match name.to_ascii_lowercase().as_str() {
            "binary" => Ok(Charset::Binary),
            "ascii" => Ok(Charset::Ascii),
            "latin1" => Ok(Charset::Latin1),
            "utf8" | "utf8mb3" => Ok(Charset::Utf8mb3),
            "utf8mb4" => Ok(Charset::Utf8mb4),
            "gbk" => Ok(Charset::Gbk),
            _ => Err(Error::UnknownCharset(name.to_string())),
        }
    }

    /// Maximum bytes per character
    pub fn max_len(self) -> usize {
        match self {
            Charset::Binary | Charset::Ascii | Charset::Latin1 => 1,
            Charset::Gbk => 2,
            Charset::Utf8mb3 => 3,
            Charset::Utf8mb4 => 4,
        }
    }

    /// Default collation of the charset
    pub fn default_collation(self) -> &'static Collation {
        match self {
            Charset::Binary => &BINARY,
            Charset::Ascii => &ASCII_GENERAL_CI,
            Charset::Latin1 => &LATIN1_SWEDISH_CI,
            Charset::Utf8mb3 => &UTF8MB3_GENERAL_CI,
            Charset::Utf8mb4 => &UTF8MB4_0900_AI_CI,
            Charset::Gbk => &GBK_CHINESE_CI,
        }
    }

    /// The `_bin` collation used when two derived collations tie
    pub fn bin_collation(self) -> &'static Collation {
        match self {
            Charset::Binary => &BINARY,
            Charset::Ascii => &ASCII_BIN,
            Charset::Latin1 => &LATIN1_BIN,
            Charset::Utf8mb3 => &UTF8MB3_BIN,
            Charset::Utf8mb4 => &UTF8MB4_BIN,
            Charset::Gbk => &GBK_BIN,
        }
    }

    /// Returns true for the Unicode charsets
    pub fn is_unicode(self) -> bool {
        matches!(self, Charset::Utf8mb3 | Charset::Utf8mb4)
    }

    /// Returns true if every character of `other` is representable in `self`
    pub fn is_superset_of(self, other: Charset) -> bool {
        if self == other || other == Charset::Ascii {
            return self != Charset::Binary || other == Charset::Binary;
        }
        match self {
            Charset::Utf8mb4 => matches!(other, Charset::Utf8mb3 | Charset::Latin1 | Charset::Gbk),
            Charset::Utf8mb3 => matches!(other, Charset::Latin1 | Charset::Gbk),
            _ => false,
        }
    }

    /// Returns true if the charset can represent `c`
    pub fn can_encode(self, c: char) -> bool {
        let cp = c as u32;
        match self {
            Charset::Binary | Charset::Utf8mb4 => true,
            Charset::Ascii => cp < 0x80,
            Charset::Latin1 => cp <= 0xFF,
            Charset::Utf8mb3 => cp <= 0xFFFF,
            Charset::Gbk => cp < 0x80 || (0x3000..=0x9FFF).contains(&cp) || (0xFF00..=0xFFEF).contains(&cp),
        }
    }

    /// Length in bytes of `s` encoded in this charset
    pub fn byte_len(self, s: &str) -> usize {
        match self {
            Charset::Binary | Charset::Utf8mb3 | Charset::Utf8mb4 => s.len(),
            Charset::Ascii | Charset::Latin1 => s.chars().count(),
            Charset::Gbk => s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum(),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trailing-space handling of a collation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadAttribute {
    /// Trailing spaces are insignificant
    PadSpace,
    /// Trailing spaces are significant
    NoPad,
}

/// A named collation
#[derive(Debug)]
pub struct Collation {
    pub id: u16,
    pub name: &'static str,
    pub charset: Charset,
    pub is_default: bool,
    pub kind: CollatorKind,
}

impl Collation {
    /// Trailing-space handling
    pub fn pad(&self) -> PadAttribute {
        self.kind.pad()
    }

    /// True for `binary` and the `_bin` collations
    pub fn is_binary(&self) -> bool {
        matches!(
            self.kind,
            CollatorKind::Binary | CollatorKind::Bin | CollatorKind::Uca0900Bin
        )
    }

    /// True if letter case is ignored
    pub fn is_case_insensitive(&self) -> bool {
        !matches!(
            self.kind,
            CollatorKind::Binary | CollatorKind::Bin | CollatorKind::Uca0900Bin | CollatorKind::Uca0900AsCs
        )
    }
}

impl PartialEq for Collation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Collation {}

impl std::hash::Hash for Collation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! collation {
    ($ident:ident, $id:expr, $name:expr, $charset:ident, $default:expr, $kind:ident) => {
        pub static $ident: Collation = Collation {
            id: $id,
            name: $name,
            charset: Charset::$charset,
            is_default: $default,
            kind: CollatorKind::$kind,
        };
    };
}

collation!(BINARY, 63, "binary", Binary, true, Binary);
collation!(ASCII_GENERAL_CI, 11, "ascii_general_ci", Ascii, true, GeneralCi);
collation!(ASCII_BIN, 65, "ascii_bin", Ascii, false, Bin);
collation!(LATIN1_SWEDISH_CI, 8, "latin1_swedish_ci", Latin1, true, SwedishCi);
collation!(LATIN1_GENERAL_CI, 48, "latin1_general_ci", Latin1, false, CaseFoldCi);
collation!(LATIN1_BIN, 47, "latin1_bin", Latin1, false, Bin);
collation!(UTF8MB3_GENERAL_CI, 33, "utf8mb3_general_ci", Utf8mb3, true, GeneralCi);
collation!(UTF8MB3_BIN, 83, "utf8mb3_bin", Utf8mb3, false, Bin);
collation!(UTF8MB3_UNICODE_CI, 192, "utf8mb3_unicode_ci", Utf8mb3, false, UnicodeCi);
collation!(UTF8MB4_GENERAL_CI, 45, "utf8mb4_general_ci", Utf8mb4, false, GeneralCi);
collation!(UTF8MB4_BIN, 46, "utf8mb4_bin", Utf8mb4, false, Bin);
collation!(UTF8MB4_UNICODE_CI, 224, "utf8mb4_unicode_ci", Utf8mb4, false, UnicodeCi);
collation!(UTF8MB4_0900_AI_CI, 255, "utf8mb4_0900_ai_ci", Utf8mb4, true, Uca0900AiCi);
collation!(UTF8MB4_0900_AS_CS, 278, "utf8mb4_0900_as_cs", Utf8mb4, false, Uca0900AsCs);
collation!(UTF8MB4_0900_BIN, 309, "utf8mb4_0900_bin", Utf8mb4, false, Uca0900Bin);
collation!(GBK_CHINESE_CI, 28, "gbk_chinese_ci", Gbk, true, CaseFoldCi);
collation!(GBK_BIN, 87, "gbk_bin", Gbk, false, Bin);

static ALL: [&Collation; 17] = [
    &BINARY,
    &ASCII_GENERAL_CI,
    &ASCII_BIN,
    &LATIN1_SWEDISH_CI,
    &LATIN1_GENERAL_CI,
    &LATIN1_BIN,
    &UTF8MB3_GENERAL_CI,
    &UTF8MB3_BIN,
    &UTF8MB3_UNICODE_CI,
    &UTF8MB4_GENERAL_CI,
    &UTF8MB4_BIN,
    &UTF8MB4_UNICODE_CI,
    &UTF8MB4_0900_AI_CI,
    &UTF8MB4_0900_AS_CS,
    &UTF8MB4_0900_BIN,
    &GBK_CHINESE_CI,
    &GBK_BIN,
];

/// All registered collations
pub fn all() -> &'static [&'static Collation] {
    &ALL
}

/// Look up a collation by name (case-insensitive, `utf8_` is `utf8mb3_`)
pub fn by_name(name: &str) -> Result<&'static Collation> {
    let lower = name.to_ascii_lowercase();
    let lookup = match lower.strip_prefix("utf8_") {
        Some(rest) => format!("utf8mb3_{}", rest),
        None => lower,
    };
    ALL.iter()
        .copied()
        .find(|c| c.name == lookup)
        .ok_or_else(|| Error::UnknownCollation(name.to_string()))
}

/// Look up a collation by id
pub fn by_id(id: u16) -> Option<&'static Collation> {
    ALL.iter().copied().find(|c| c.id == id)
}

/// Look up a collation by name and check that it belongs to `charset`
pub fn for_charset(name: &str, charset: Charset) -> Result<&'static Collation> {
    let collation = by_name(name)?;
    if collation.charset != charset {
        return Err(Error::CollationCharsetMismatch {
            collation: collation.name.to_string(),
            charset: charset.name().to_string(),
        });
    }
    Ok(collation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("utf8mb4_bin").unwrap().id, 46);
        assert_eq!(by_name("UTF8MB4_GENERAL_CI").unwrap().id, 45);
        assert_eq!(by_name("utf8_general_ci").unwrap().name, "utf8mb3_general_ci");
        assert_eq!(by_name("klingon_ci").unwrap_err().code(), 1273);
    }

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(by_id(255).unwrap().name, "utf8mb4_0900_ai_ci");
        assert!(by_id(9999).is_none());
    }

    #[test]
    fn test_ids_unique() {
        for (i, a) in ALL.iter().enumerate() {
            for b in ALL.iter().skip(i + 1) {
                assert_ne!(a.id, b.id, "{} and {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_defaults() {
        for charset in Charset::ALL {
            let default = charset.default_collation();
            assert!(default.is_default);
            assert_eq!(default.charset, charset);
            assert_eq!(charset.bin_collation().charset, charset);
        }
    }

    #[test]
    fn test_charset_mismatch() {
        let err = for_charset("latin1_bin", Charset::Utf8mb4).unwrap_err();
        assert_eq!(err.code(), 1253);
        assert!(for_charset("utf8mb4_bin", Charset::Utf8mb4).is_ok());
    }

    #[test]
    fn test_superset() {
        assert!(Charset::Utf8mb4.is_superset_of(Charset::Utf8mb3));
        assert!(Charset::Utf8mb4.is_superset_of(Charset::Latin1));
        assert!(Charset::Latin1.is_superset_of(Charset::Ascii));
        assert!(!Charset::Latin1.is_superset_of(Charset::Utf8mb4));
        assert!(!Charset::Binary.is_superset_of(Charset::Ascii));
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(Charset::Utf8mb4.byte_len("héllo"), 6);
        assert_eq!(Charset::Latin1.byte_len("héllo"), 5);
        assert_eq!(Charset::Gbk.byte_len("中a"), 3);
    }
}
