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

//! SQL mode flags
//!
//! The session's `sql_mode` string is parsed once per statement into a
//! [`SqlMode`] bitset and copied into the evaluation context.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use super::{Error, Result};

bitflags! {
    /// Flags controlling how strictly type, range and date violations are enforced
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SqlMode: u32 {
        const REAL_AS_FLOAT = 1 << 0;
        const PIPES_AS_CONCAT = 1 << 1;
        const ANSI_QUOTES = 1 << 2;
        const IGNORE_SPACE = 1 << 3;
        const ONLY_FULL_GROUP_BY = 1 << 4;
        const NO_UNSIGNED_SUBTRACTION = 1 << 5;
        const NO_DIR_IN_CREATE = 1 << 6;
        const NO_AUTO_VALUE_ON_ZERO = 1 << 7;
        const NO_BACKSLASH_ESCAPES = 1 << 8;
        const STRICT_TRANS_TABLES = 1 << 9;
        const STRICT_ALL_TABLES = 1 << 10;
        const NO_ZERO_IN_DATE = 1 << 11;
        const NO_ZERO_DATE = 1 << 12;
        const ALLOW_INVALID_DATES = 1 << 13;
        const ERROR_FOR_DIVISION_BY_ZERO = 1 << 14;
        const HIGH_NOT_PRECEDENCE = 1 << 15;
        const NO_ENGINE_SUBSTITUTION = 1 << 16;
        const PAD_CHAR_TO_FULL_LENGTH = 1 << 17;
        const TIME_TRUNCATE_FRACTIONAL = 1 << 18;
    }
}

const NAMES: &[(&str, SqlMode)] = &[
    ("REAL_AS_FLOAT", SqlMode::REAL_AS_FLOAT),
    ("PIPES_AS_CONCAT", SqlMode::PIPES_AS_CONCAT),
    ("ANSI_QUOTES", SqlMode::ANSI_QUOTES),
    ("IGNORE_SPACE", SqlMode::IGNORE_SPACE),
    ("ONLY_FULL_GROUP_BY", SqlMode::ONLY_FULL_GROUP_BY),
    ("NO_UNSIGNED_SUBTRACTION", SqlMode::NO_UNSIGNED_SUBTRACTION),
    ("NO_DIR_IN_CREATE", SqlMode::NO_DIR_IN_CREATE),
    ("NO_AUTO_VALUE_ON_ZERO", SqlMode::NO_AUTO_VALUE_ON_ZERO),
    ("NO_BACKSLASH_ESCAPES", SqlMode::NO_BACKSLASH_ESCAPES),
    ("STRICT_TRANS_TABLES", SqlMode::STRICT_TRANS_TABLES),
    ("STRICT_ALL_TABLES", SqlMode::STRICT_ALL_TABLES),
    ("NO_ZERO_IN_DATE", SqlMode::NO_ZERO_IN_DATE),
    ("NO_ZERO_DATE", SqlMode::NO_ZERO_DATE),
    ("ALLOW_INVALID_DATES", SqlMode::ALLOW_INVALID_DATES),
    ("ERROR_FOR_DIVISION_BY_ZERO", SqlMode::ERROR_FOR_DIVISION_BY_ZERO),
    ("HIGH_NOT_PRECEDENCE", SqlMode::HIGH_NOT_PRECEDENCE),
    ("NO_ENGINE_SUBSTITUTION", SqlMode::NO_ENGINE_SUBSTITUTION),
    ("PAD_CHAR_TO_FULL_LENGTH", SqlMode::PAD_CHAR_TO_FULL_LENGTH),
    ("TIME_TRUNCATE_FRACTIONAL", SqlMode::TIME_TRUNCATE_FRACTIONAL),
];

impl SqlMode {
    /// MySQL 8.0 server default
    pub fn mysql_default() -> Self {
        SqlMode::ONLY_FULL_GROUP_BY
            | SqlMode::STRICT_TRANS_TABLES
            | SqlMode::NO_ZERO_IN_DATE
            | SqlMode::NO_ZERO_DATE
            | SqlMode::ERROR_FOR_DIVISION_BY_ZERO
            | SqlMode::NO_ENGINE_SUBSTITUTION
    }

    /// The `TRADITIONAL` combination mode
    pub fn traditional() -> Self {
        SqlMode::STRICT_TRANS_TABLES
            | SqlMode::STRICT_ALL_TABLES
            | SqlMode::NO_ZERO_IN_DATE
            | SqlMode::NO_ZERO_DATE
            | SqlMode::ERROR_FOR_DIVISION_BY_ZERO
            | SqlMode::NO_ENGINE_SUBSTITUTION
    }

    /// The `ANSI` combination mode
    pub fn ansi() -> Self {
        SqlMode::REAL_AS_FLOAT
            | SqlMode::PIPES_AS_CONCAT
            | SqlMode::ANSI_QUOTES
            | SqlMode::IGNORE_SPACE
            | SqlMode::ONLY_FULL_GROUP_BY
    }

    /// True if either strict flag is set
    #[inline]
    pub fn is_strict(self) -> bool {
        self.intersects(SqlMode::STRICT_TRANS_TABLES | SqlMode::STRICT_ALL_TABLES)
    }
}

impl FromStr for SqlMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut mode = SqlMode::empty();
        for part in s.split(',') {
            let name = part.trim();
            if name.is_empty() {
                continue;
            }
            let upper = name.to_ascii_uppercase();
            let flag = match upper.as_str() {
                "TRADITIONAL" => SqlMode::traditional(),
                "ANSI" => SqlMode::ansi(),
                // Removed in 8.0, still accepted by older clients
                "NO_AUTO_CREATE_USER" => SqlMode::empty(),
                _ => NAMES
                    .iter()
                    .find(|(n, _)| *n == upper)
                    .map(|(_, f)| *f)
                    .ok_or_else(|| Error::WrongSqlMode(name.to_string()))?,
            };
            mode |= flag;
        }
        Ok(mode)
    }
}

impl fmt::Display for SqlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, flag) in NAMES {
            if self.contains(*flag) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql_mode() {
        let mode: SqlMode = "STRICT_TRANS_TABLES,NO_ZERO_DATE".parse().unwrap();
        assert!(mode.contains(SqlMode::STRICT_TRANS_TABLES));
        assert!(mode.contains(SqlMode::NO_ZERO_DATE));
        assert!(!mode.contains(SqlMode::NO_ZERO_IN_DATE));
        assert!(mode.is_strict());

        let empty: SqlMode = "".parse().unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_parse_case_and_spaces() {
        let mode: SqlMode = " error_for_division_by_zero , ansi_quotes ".parse().unwrap();
        assert!(mode.contains(SqlMode::ERROR_FOR_DIVISION_BY_ZERO | SqlMode::ANSI_QUOTES));
    }

    #[test]
    fn test_combination_modes() {
        let mode: SqlMode = "TRADITIONAL".parse().unwrap();
        assert!(mode.contains(SqlMode::STRICT_ALL_TABLES));
        assert!(mode.contains(SqlMode::ERROR_FOR_DIVISION_BY_ZERO));

        let mode: SqlMode = "ANSI".parse().unwrap();
        assert!(mode.contains(SqlMode::PIPES_AS_CONCAT));
        assert!(!mode.is_strict());
    }

    #[test]
    fn test_unknown_mode() {
        let err = "STRICT_TRANS_TABLES,BOGUS".parse::<SqlMode>().unwrap_err();
        assert_eq!(err.code(), 1231);
    }

    #[test]
    fn test_display() {
        let mode = SqlMode::NO_ZERO_DATE | SqlMode::STRICT_TRANS_TABLES;
        assert_eq!(mode.to_string(), "STRICT_TRANS_TABLES,NO_ZERO_DATE");
        assert_eq!(mode.to_string().parse::<SqlMode>().unwrap(), mode);
    }
}
