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

//! Evaluation engine configuration
//!
//! [`EvalConfig`] holds the server-level defaults that are copied into an
//! [`EvalContext`](crate::eval::EvalContext) when a statement starts.

use crate::collation::{self, Collation, UTF8MB4_0900_AI_CI};
use crate::core::{Result, SqlMode};

/// Default number of rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Default cap on stored warnings per statement
pub const DEFAULT_MAX_WARNINGS: usize = 1024;

/// Configuration options for expression evaluation
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Rows per vectorized batch
    /// Default: 1024
    pub batch_size: usize,

    /// Warnings kept per statement; later ones are only counted
    /// Default: 1024
    pub max_warnings: usize,

    /// Collation of literals and of strings produced from numbers
    /// Default: utf8mb4_0900_ai_ci
    pub collation: &'static Collation,

    /// Extra scale digits for decimal division
    /// Default: 4
    pub div_precision_increment: u32,

    /// Maximum GROUP_CONCAT result length in bytes
    /// Default: 1024
    pub group_concat_max_len: usize,

    /// SQL mode as a session string
    /// Default: empty
    pub sql_mode: String,

    /// Session time zone, `SYSTEM`, `UTC` or an offset such as `+08:00`
    /// Default: +00:00
    pub time_zone: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_warnings: DEFAULT_MAX_WARNINGS,
            collation: &UTF8MB4_0900_AI_CI,
            div_precision_increment: 4,
            group_concat_max_len: 1024,
            sql_mode: String::new(),
            time_zone: "+00:00".to_string(),
        }
    }
}

impl EvalConfig {
    /// Creates a new EvalConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an EvalConfig with the MySQL 8.0 default sql_mode
    pub fn mysql_default() -> Self {
        Self {
            sql_mode: SqlMode::mysql_default().to_string(),
            ..Self::default()
        }
    }

    /// Builder method to set the batch size (at least 1)
    pub fn with_batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows.max(1);
        self
    }

    /// Builder method to set the warning cap
    pub fn with_max_warnings(mut self, count: usize) -> Self {
        self.max_warnings = count;
        self
    }

    /// Builder method to set the default collation by name
    pub fn with_collation(mut self, name: &str) -> Result<Self> {
        self.collation = collation::by_name(name)?;
        Ok(self)
    }

    /// Builder method to set div_precision_increment (0..=30)
    pub fn with_div_precision_increment(mut self, digits: u32) -> Self {
        self.div_precision_increment = digits.min(30);
        self
    }

    /// Builder method to set group_concat_max_len
    pub fn with_group_concat_max_len(mut self, bytes: usize) -> Self {
        self.group_concat_max_len = bytes.max(4);
        self
    }

    /// Builder method to set the sql_mode string
    pub fn with_sql_mode(mut self, mode: impl Into<String>) -> Self {
        self.sql_mode = mode.into();
        self
    }

    /// Builder method to set the time zone
    pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
        self.time_zone = tz.into();
        self
    }

    /// Parsed sql_mode
    pub fn parsed_sql_mode(&self) -> Result<SqlMode> {
        self.sql_mode.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert_eq!(config.batch_size, 1024);
        assert_eq!(config.max_warnings, 1024);
        assert_eq!(config.collation.name, "utf8mb4_0900_ai_ci");
        assert_eq!(config.div_precision_increment, 4);
        assert_eq!(config.parsed_sql_mode().unwrap(), SqlMode::empty());
    }

    #[test]
    fn test_builder() {
        let config = EvalConfig::new()
            .with_batch_size(0)
            .with_sql_mode("STRICT_TRANS_TABLES,NO_ZERO_DATE")
            .with_collation("utf8mb4_bin")
            .unwrap();
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.collation.name, "utf8mb4_bin");
        let mode = config.parsed_sql_mode().unwrap();
        assert!(mode.contains(SqlMode::NO_ZERO_DATE));
        assert!(mode.is_strict());
    }

    #[test]
    fn test_mysql_default_mode() {
        let mode = EvalConfig::mysql_default().parsed_sql_mode().unwrap();
        assert!(mode.contains(SqlMode::STRICT_TRANS_TABLES));
        assert!(EvalConfig::new().with_collation("nope").is_err());
    }
}
