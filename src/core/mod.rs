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

//! Core types and definitions
//!
//! This module contains the value and type model shared by every other
//! component:
//!
//! - [`Datum`] - runtime values
//! - [`FieldType`] - static expression types
//! - [`Time`] / [`Duration`] - DATE, DATETIME and TIME values
//! - [`Json`] - JSON documents and path expressions
//! - [`SqlMode`] - strictness flags
//! - [`Error`] - error types carrying MySQL error numbers

pub mod decimal;
pub mod duration;
pub mod error;
pub mod json;
pub mod sql_mode;
pub mod time;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use decimal::Decimal;
pub use duration::Duration;
pub use error::{Error, Result};
pub use json::{Json, JsonPath};
pub use sql_mode::SqlMode;
pub use time::{ParseOptions, Time};
pub use types::{EvalType, FieldFlags, FieldKind, FieldType};
pub use value::{format_f64, Datum};

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Temporal values render through Datum with their own precision
    #[test]
    fn test_temporal_datums() {
        let opts = ParseOptions::from_mode(SqlMode::empty(), 3);
        let t = Time::parse("2011-11-11 10:10:10.1234", opts).unwrap().time;
        assert_eq!(Datum::DateTime(t).to_string(), "2011-11-11 10:10:10.123");

        let d = Duration::parse("-1:2:3.5", opts).unwrap().duration;
        assert_eq!(Datum::Duration(d).to_string(), "-01:02:03.500");
    }

    #[test]
    fn test_field_type_eval_types() {
        assert_eq!(FieldType::long_long().eval_type(), EvalType::Int);
        assert_eq!(FieldType::datetime(0).eval_type(), EvalType::Datetime);
        assert_eq!(FieldType::json().eval_type(), EvalType::Json);
    }
}
