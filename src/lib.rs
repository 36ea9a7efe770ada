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

//! # stoolap-eval - MySQL-compatible scalar expression evaluation
//!
//! This crate computes the value of builtin functions and operators over
//! typed row data the way MySQL 8.0 does: type coercion, collation
//! resolution, 64-bit and decimal overflow, NULL propagation and date/time
//! arithmetic all follow the server, including its documented quirks,
//! under the strictness rules of the session `sql_mode`.
//!
//! ## Quick Start
//!
//! ```rust
//! use stoolap_eval::{Datum, Diagnostics, EvalContext, ExprBuilder, FieldType, PlanContext};
//!
//! let ctx = EvalContext::new();
//! let b = ExprBuilder::new(PlanContext::from_context(&ctx));
//!
//! // (a + 1) for a BIGINT column `a`
//! let expr = b
//!     .call("+", vec![b.column(0, "a", FieldType::long_long()), b.int(1)])
//!     .unwrap();
//!
//! let mut diag = Diagnostics::default();
//! let v = stoolap_eval::evaluate(&expr, &[Datum::Int(41)], &ctx, &mut diag).unwrap();
//! assert_eq!(v.to_string(), "42");
//!
//! // Overflow is an error, never a wrapped value
//! let err = stoolap_eval::evaluate(&expr, &[Datum::Int(i64::MAX)], &ctx, &mut diag).unwrap_err();
//! assert_eq!(err.code(), 1690);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - values ([`Datum`]), static types ([`FieldType`]), SQL mode, errors
//! - [`collation`] - collation table and coercibility resolution
//! - [`convert`] - implicit and explicit conversions between kinds
//! - [`numeric`] - overflow-checked arithmetic
//! - [`datetime`] - calendar math, intervals, date formats
//! - [`functions`] - builtin registry, scalar functions and aggregates
//! - [`diagnostics`] - per-statement warnings and the strictness policy
//! - [`eval`] - expression trees, row and batch evaluation
//! - [`config`] - server-level defaults

pub mod collation;
pub mod config;
pub mod convert;
pub mod core;
pub mod datetime;
pub mod diagnostics;
pub mod eval;
pub mod functions;
pub mod numeric;
pub mod version;

// Re-export main types for convenience
pub use core::{Datum, Duration, Error, EvalType, FieldKind, FieldType, Json, Result, SqlMode, Time};

pub use collation::{Charset, Coercibility, Collation, Derivation};
pub use config::EvalConfig;
pub use convert::{cast, CastMode};
pub use diagnostics::{Diagnostics, Level, Warning};

// Re-export evaluation types
pub use eval::{
    evaluate, CancellationHandle, Chunk, Column, EvalContext, EvalContextBuilder, Evaluator, Expr,
    ExprBuilder, SessionInfo, TimeZone,
};

// Re-export function types
pub use functions::{
    global_registry, Accumulator, AggregateFunction, AggregateOptions, ArgType, FunctionImpl,
    FunctionInfo, FunctionRegistry, FunctionSignature, FunctionType, PlanContext, Resolution,
    ScalarFunction,
};

pub use version::{server_version, MYSQL_VERSION};
