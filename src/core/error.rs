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

//! Error types for the evaluation engine
//!
//! Every variant maps onto a fixed MySQL error number (see [`Error::code`]).
//! The same type is used both for statement-aborting errors and for the
//! runtime conditions that the diagnostics context may downgrade to
//! warnings.

use thiserror::Error;

/// Result type alias for evaluation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for expression resolution and evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Numeric conditions
    // =========================================================================
    /// Arithmetic overflow, e.g. `BIGINT value is out of range in '(a + 1)'`
    #[error("{type_name} value is out of range in '{expr}'")]
    OutOfRange { type_name: String, expr: String },

    /// A conversion clamped the value to a type boundary
    #[error("Out of range value for {type_name}: '{value}'")]
    Saturated { type_name: String, value: String },

    /// Division, DIV or MOD by zero
    #[error("Division by 0")]
    DivisionByZero,

    // =========================================================================
    // Conversion conditions
    // =========================================================================
    /// Non-numeric trailing content while parsing a number, or a malformed value
    #[error("Truncated incorrect {type_name} value: '{value}'")]
    TruncatedWrongValue { type_name: String, value: String },

    /// Malformed date/time text
    #[error("Incorrect {type_name} value: '{value}'")]
    IncorrectDatetimeValue { type_name: String, value: String },

    /// A zero date (or zero date component) rejected by NO_ZERO_DATE / NO_ZERO_IN_DATE
    #[error("Incorrect {type_name} value: '{value}'")]
    ZeroDate {
        type_name: String,
        value: String,
        /// True when only a month or day part is zero
        in_date: bool,
    },

    /// Value did not fit and lost digits
    #[error("Data truncated for {0}")]
    DataTruncated(String),

    /// Value is not valid for a type in a named function (e.g. STR_TO_DATE)
    #[error("Incorrect {type_name} value: '{value}' for function {function}")]
    WrongValueForType {
        type_name: String,
        value: String,
        function: String,
    },

    /// Date arithmetic left the representable range
    #[error("Datetime function: {0} field overflow")]
    DatetimeOverflow(String),

    // =========================================================================
    // Collation errors
    // =========================================================================
    /// Operands carry collations that cannot be unified
    #[error("{}", format_collation_mix(.operands, .operation))]
    IllegalMixOfCollations {
        operands: Vec<(String, String)>,
        operation: String,
    },

    /// Unknown collation name
    #[error("Unknown collation: '{0}'")]
    UnknownCollation(String),

    /// Unknown character set name
    #[error("Unknown character set: '{0}'")]
    UnknownCharset(String),

    /// Collation belongs to another character set
    #[error("COLLATION '{collation}' is not valid for CHARACTER SET '{charset}'")]
    CollationCharsetMismatch { collation: String, charset: String },

    // =========================================================================
    // JSON errors
    // =========================================================================
    /// Document could not be parsed
    #[error("Invalid JSON text in argument {arg} to function {function}: \"{detail}\".")]
    InvalidJsonText {
        arg: usize,
        function: String,
        detail: String,
    },

    /// Path expression could not be parsed
    #[error("Invalid JSON path expression. The error is around character position {position}.")]
    InvalidJsonPath { position: usize },

    /// Wildcards are not allowed in this path position
    #[error("In this situation, path expressions may not contain the * and ** tokens.")]
    InvalidJsonPathWildcard,

    /// Path `$` used where a member or element is required
    #[error("The path expression '$' is not allowed in this context.")]
    JsonVacuousPath,

    /// NULL used as an object key
    #[error("JSON documents may not contain NULL member names.")]
    JsonNullKey,

    /// Path does not end in an array cell
    #[error("A path expression is not a path to a cell in an array.")]
    JsonPathNotArrayCell,

    /// Bad one-or-all argument
    #[error("The oneOrAll argument to {0} may take these values: 'one' or 'all'.")]
    JsonOneOrAll(String),

    /// Scalar of the wrong JSON type
    #[error("Invalid data type for JSON data in argument {arg} to function {function}; a JSON string or JSON type is required.")]
    InvalidJsonCharset { arg: usize, function: String },

    // =========================================================================
    // Static (plan-time) errors
    // =========================================================================
    /// Wrong argument kind or non-constant where a constant is required
    #[error("Incorrect arguments to {0}")]
    IncorrectArguments(String),

    /// Wrong number of arguments to a builtin
    #[error("Incorrect parameter count in the call to native function '{0}'")]
    WrongParamCount(String),

    /// No builtin with this name
    #[error("FUNCTION {0} does not exist")]
    FunctionNotExists(String),

    /// Precision exceeds the type maximum
    #[error("Too-big precision {precision} specified for '{expr}'. Maximum is {max}.")]
    TooBigPrecision {
        precision: u32,
        expr: String,
        max: u32,
    },

    /// Scale exceeds the type maximum
    #[error("Too big scale {scale} specified for column '{expr}'. Maximum is {max}.")]
    TooBigScale { scale: u32, expr: String, max: u32 },

    /// DECIMAL(M,D) with M < D
    #[error("For float(M,D), double(M,D) or decimal(M,D), M must be >= D (column '{0}').")]
    MBiggerThanD(String),

    /// Unknown or malformed time zone
    #[error("Unknown or incorrect time zone: '{0}'")]
    UnknownTimeZone(String),

    /// Malformed sql_mode string
    #[error("Variable 'sql_mode' can't be set to the value of '{0}'")]
    WrongSqlMode(String),

    /// Regular expression compile or match failure
    #[error("Illegal argument to a regular expression: {0}")]
    Regexp(String),

    // =========================================================================
    // Statement control
    // =========================================================================
    /// GROUP_CONCAT result exceeded the configured maximum length
    #[error("Row {0} was cut by GROUP_CONCAT()")]
    GroupConcatCut(usize),

    /// Caller cancelled the statement
    #[error("Query execution was interrupted")]
    QueryInterrupted,

    /// Statement deadline passed
    #[error("Query execution was interrupted, maximum statement execution time exceeded")]
    QueryTimeout,

    // =========================================================================
    // Generic errors
    // =========================================================================
    /// Invalid argument passed through the public API
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Feature not supported
    #[error("This version of MySQL doesn't yet support '{0}'")]
    NotSupported(String),

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_collation_mix(operands: &[(String, String)], operation: &str) -> String {
    if operands.len() > 3 || operands.is_empty() {
        return format!("Illegal mix of collations for operation '{}'", operation);
    }
    let parts: Vec<String> = operands
        .iter()
        .map(|(collation, derivation)| format!("({},{})", collation, derivation))
        .collect();
    let joined = if parts.len() == 2 {
        format!("{} and {}", parts[0], parts[1])
    } else {
        parts.join(", ")
    };
    format!(
        "Illegal mix of collations {} for operation '{}'",
        joined, operation
    )
}

impl Error {
    /// Create an out-of-range error for a numeric type
    pub fn out_of_range(type_name: impl Into<String>, expr: impl Into<String>) -> Self {
        Error::OutOfRange {
            type_name: type_name.into(),
            expr: expr.into(),
        }
    }

    /// Create a saturation warning
    pub fn saturated(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Error::Saturated {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Create a truncated-wrong-value condition
    pub fn truncated_wrong_value(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Error::TruncatedWrongValue {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Create an incorrect datetime value condition
    pub fn incorrect_datetime(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Error::IncorrectDatetimeValue {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Create a zero-date condition
    pub fn zero_date(type_name: impl Into<String>, value: impl Into<String>, in_date: bool) -> Self {
        Error::ZeroDate {
            type_name: type_name.into(),
            value: value.into(),
            in_date,
        }
    }

    /// Create a datetime overflow condition
    pub fn datetime_overflow(type_name: impl Into<String>) -> Self {
        Error::DatetimeOverflow(type_name.into())
    }

    /// Create an illegal-collation-mix error
    pub fn illegal_mix(operands: Vec<(String, String)>, operation: impl Into<String>) -> Self {
        Error::IllegalMixOfCollations {
            operands,
            operation: operation.into(),
        }
    }

    /// Create an invalid JSON text error
    pub fn invalid_json_text(
        arg: usize,
        function: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Error::InvalidJsonText {
            arg,
            function: function.into(),
            detail: detail.into(),
        }
    }

    /// Create an incorrect-arguments error
    pub fn incorrect_arguments(function: impl Into<String>) -> Self {
        Error::IncorrectArguments(function.into())
    }

    /// Create a wrong parameter count error
    pub fn wrong_param_count(function: impl Into<String>) -> Self {
        Error::WrongParamCount(function.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    /// MySQL error number
    pub fn code(&self) -> u16 {
        match self {
            Error::OutOfRange { .. } => 1690,
            Error::Saturated { .. } => 1264,
            Error::DivisionByZero => 1365,
            Error::TruncatedWrongValue { .. } => 1292,
            Error::IncorrectDatetimeValue { .. } => 1292,
            Error::ZeroDate { .. } => 1292,
            Error::DataTruncated(_) => 1265,
            Error::WrongValueForType { .. } => 1411,
            Error::DatetimeOverflow(_) => 1441,
            Error::IllegalMixOfCollations { operands, .. } => match operands.len() {
                2 => 1267,
                3 => 1270,
                _ => 1271,
            },
            Error::UnknownCollation(_) => 1273,
            Error::UnknownCharset(_) => 1115,
            Error::CollationCharsetMismatch { .. } => 1253,
            Error::InvalidJsonText { .. } => 3140,
            Error::InvalidJsonPath { .. } => 3143,
            Error::InvalidJsonPathWildcard => 3149,
            Error::InvalidJsonCharset { .. } => 3144,
            Error::JsonVacuousPath => 3153,
            Error::JsonNullKey => 3158,
            Error::JsonOneOrAll(_) => 3154,
            Error::JsonPathNotArrayCell => 3165,
            Error::IncorrectArguments(_) => 1210,
            Error::WrongParamCount(_) => 1582,
            Error::FunctionNotExists(_) => 1305,
            Error::TooBigPrecision { .. } => 1426,
            Error::TooBigScale { .. } => 1425,
            Error::MBiggerThanD(_) => 1427,
            Error::UnknownTimeZone(_) => 1298,
            Error::WrongSqlMode(_) => 1231,
            Error::Regexp(_) => 3685,
            Error::GroupConcatCut(_) => 1260,
            Error::QueryInterrupted => 1317,
            Error::QueryTimeout => 3024,
            Error::NotSupported(_) => 1235,
            Error::InvalidArgument(_) => 1210,
            Error::Internal(_) => 1105,
        }
    }

    /// Returns true if the error is detected while building a plan
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Error::IncorrectArguments(_)
                | Error::WrongParamCount(_)
                | Error::FunctionNotExists(_)
                | Error::TooBigPrecision { .. }
                | Error::TooBigScale { .. }
                | Error::MBiggerThanD(_)
                | Error::UnknownCollation(_)
                | Error::UnknownCharset(_)
                | Error::CollationCharsetMismatch { .. }
        )
    }

    /// Returns true if the error stops the statement
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Error::QueryInterrupted | Error::QueryTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::out_of_range("BIGINT", "(9223372036854775807 + 1)");
        assert_eq!(
            err.to_string(),
            "BIGINT value is out of range in '(9223372036854775807 + 1)'"
        );

        let err = Error::truncated_wrong_value("INTEGER", "12abc");
        assert_eq!(err.to_string(), "Truncated incorrect INTEGER value: '12abc'");

        assert_eq!(Error::DivisionByZero.to_string(), "Division by 0");
        assert_eq!(
            Error::wrong_param_count("abs").to_string(),
            "Incorrect parameter count in the call to native function 'abs'"
        );
    }

    #[test]
    fn test_collation_mix_message() {
        let err = Error::illegal_mix(
            vec![
                ("utf8mb4_bin".into(), "EXPLICIT".into()),
                ("utf8mb4_general_ci".into(), "EXPLICIT".into()),
            ],
            "=",
        );
        assert_eq!(
            err.to_string(),
            "Illegal mix of collations (utf8mb4_bin,EXPLICIT) and (utf8mb4_general_ci,EXPLICIT) for operation '='"
        );
        assert_eq!(err.code(), 1267);

        let err = Error::illegal_mix(
            vec![
                ("a".into(), "IMPLICIT".into()),
                ("b".into(), "IMPLICIT".into()),
                ("c".into(), "IMPLICIT".into()),
            ],
            "concat",
        );
        assert_eq!(
            err.to_string(),
            "Illegal mix of collations (a,IMPLICIT), (b,IMPLICIT), (c,IMPLICIT) for operation 'concat'"
        );
        assert_eq!(err.code(), 1270);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::DivisionByZero.code(), 1365);
        assert_eq!(Error::incorrect_arguments("NAME_CONST").code(), 1210);
        assert_eq!(Error::invalid_json_text(1, "json_length", "x").code(), 3140);
        assert_eq!(Error::zero_date("datetime", "0000-00-00", false).code(), 1292);
        assert_eq!(Error::saturated("UNSIGNED", "1").code(), 1264);
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::wrong_param_count("abs").is_static());
        assert!(!Error::DivisionByZero.is_static());
        assert!(Error::QueryTimeout.is_interrupt());
    }
}
