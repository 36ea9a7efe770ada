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

//! Expression evaluation
//!
//! - [`EvalContext`] - per-statement settings passed to every call
//! - [`Column`] / [`Chunk`] - typed columnar batches
//! - [`Expr`] / [`ExprBuilder`] - resolved expression trees
//! - [`Evaluator`] - row and batch evaluation over those trees

mod column;
mod context;
mod evaluator;
mod expr;

pub use column::{Chunk, Column};
pub use context::{
    parse_offset, CancellationHandle, EvalContext, EvalContextBuilder, SessionInfo, TimeZone,
};
pub use evaluator::{evaluate, Evaluator};
pub use expr::{literal_type, ColumnRef, Expr, ExprBuilder, FunctionCall, Literal};
