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

//! Aggregate Functions
//!
//! This module provides the grouped aggregates:
//!
//! - [`CountFunction`] - COUNT(*) and COUNT([DISTINCT] expr, ...)
//! - [`SumFunction`] - SUM([DISTINCT] expr)
//! - [`AvgFunction`] - AVG([DISTINCT] expr)
//! - [`MinMaxFunction`] - MIN(expr), MAX(expr)
//! - [`BitFunction`] - BIT_AND(expr), BIT_OR(expr), BIT_XOR(expr)
//! - [`GroupConcatFunction`] - GROUP_CONCAT([DISTINCT] expr, ... [ORDER BY ...] [SEPARATOR s])
//!
//! Every accumulator skips rows in which one of its value arguments is NULL.

mod avg;
mod bit;
mod count;
mod group_concat;
mod min_max;
mod sum;

pub use avg::AvgFunction;
pub use bit::{BitFunction, BitOp};
pub use count::CountFunction;
pub use group_concat::GroupConcatFunction;
pub use min_max::MinMaxFunction;
pub use sum::SumFunction;

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::registry::FunctionRegistry;
use super::{Accumulator, AggregateResolution, ArgType};
use crate::collation::Derivation;
use crate::core::{Datum, FieldType};

/// Register every aggregate builtin
pub fn register_builtins(registry: &FunctionRegistry) {
    registry.register_aggregate(Arc::new(CountFunction));
    registry.register_aggregate(Arc::new(SumFunction));
    registry.register_aggregate(Arc::new(AvgFunction));
    registry.register_aggregate(Arc::new(MinMaxFunction::min()));
    registry.register_aggregate(Arc::new(MinMaxFunction::max()));
    for op in [BitOp::And, BitOp::Or, BitOp::Xor] {
        registry.register_aggregate(Arc::new(BitFunction::new(op)));
    }
    registry.register_aggregate(Arc::new(GroupConcatFunction));
}

/// Bundle a resolved aggregate call
fn resolution<F>(
    return_type: FieldType,
    derivation: Derivation,
    casts: Vec<Option<FieldType>>,
    factory: F,
) -> AggregateResolution
where
    F: Fn() -> Box<dyn Accumulator> + Send + Sync + 'static,
{
    AggregateResolution {
        return_type,
        derivation,
        casts,
        factory: Arc::new(factory),
    }
}

/// Call text for error messages, e.g. `sum(a)`
fn call_display(name: &str, distinct: bool, args: &[ArgType]) -> String {
    let list = args
        .iter()
        .map(|a| a.display.as_str())
        .collect::<Vec<_>>()
        .join(",");
    if distinct {
        format!("{}(distinct {})", name.to_ascii_lowercase(), list)
    } else {
        format!("{}({})", name.to_ascii_lowercase(), list)
    }
}

#[inline]
fn any_null(args: &[Datum]) -> bool {
    args.iter().any(Datum::is_null)
}

// ============================================================================
// DISTINCT
// ============================================================================

/// Set of argument tuples seen so far. Strings compare under their
/// collation, so `'a'` and `'A'` are one value in a case-insensitive one.
#[derive(Default, Debug)]
pub struct DistinctTracker {
    seen: FxHashSet<Vec<u8>>,
}

impl DistinctTracker {
    /// Check if a tuple has been seen before (returns true if new)
    pub fn check_and_add(&mut self, values: &[Datum]) -> bool {
        self.seen.insert(distinct_key(values))
    }

    /// Get the count of distinct tuples
    pub fn count(&self) -> usize {
        self.seen.len()
    }

    /// Reset the tracker
    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

fn distinct_key(values: &[Datum]) -> Vec<u8> {
    let mut key = Vec::new();
    for v in values {
        let (tag, part): (u8, Vec<u8>) = match v {
            Datum::Null => (0, Vec::new()),
            Datum::Int(i) => (1, (*i as i128).to_be_bytes().to_vec()),
            Datum::UInt(u) => (1, (*u as i128).to_be_bytes().to_vec()),
            Datum::Float(f) => {
                // -0.0 and 0.0 are one value
                let f = if *f == 0.0 { 0.0 } else { *f };
                (2, f.to_bits().to_be_bytes().to_vec())
            }
            Datum::Decimal(d) => (3, d.normalize().to_string().into_bytes()),
            Datum::Str { text, collation } => (4, collation.sort_key(text)),
            Datum::Bytes(b) => (5, b.to_vec()),
            other => (6, other.to_string().into_bytes()),
        };
        key.push(tag);
        key.extend_from_slice(&(part.len() as u32).to_be_bytes());
        key.extend_from_slice(&part);
    }
    key
}

#[cfg(test)]
pub(crate) mod test_util {
    //! Drive an aggregate over literal rows in unit tests

    use super::*;
    use crate::convert::{cast, CastMode};
    use crate::diagnostics::Diagnostics;
    use crate::eval::EvalContext;
    use crate::functions::scalar::test_util::literal_type;
    use crate::functions::{global_registry, AggregateOptions, Call, PlanContext};

    /// Argument types of a column whose first non-NULL value is `sample`
    fn column_types(rows: &[Vec<Datum>]) -> Vec<ArgType> {
        let width = rows.first().map_or(0, Vec::len);
        (0..width)
            .map(|c| {
                let sample = rows.iter().map(|r| &r[c]).find(|d| !d.is_null());
                let ty = sample.map_or_else(FieldType::null, literal_type);
                ArgType::new(ty, format!("c{}", c))
            })
            .collect()
    }

    /// Aggregate `rows` with `name` and collect the warnings
    pub fn run_with(
        name: &str,
        options: &AggregateOptions,
        rows: &[Vec<Datum>],
        ctx: &EvalContext,
        diag: &mut Diagnostics,
    ) -> crate::core::Result<Datum> {
        let types = column_types(rows);
        let plan = PlanContext::from_context(ctx);
        let res = global_registry().resolve_aggregate(name, &types, options, &plan)?;
        let mut acc = (res.factory)();
        for row in rows {
            let mut values = Vec::with_capacity(row.len());
            for (d, c) in row.iter().zip(&res.casts) {
                values.push(match c {
                    Some(t) => cast(d.clone(), t, CastMode::Implicit, ctx, diag)?,
                    None => d.clone(),
                });
            }
            let mut call = Call::new(ctx, diag);
            acc.update(&values, &mut call)?;
        }
        let mut call = Call::new(ctx, diag);
        acc.finish(&mut call)
    }

    /// Aggregate under default settings and render the result
    pub fn run(name: &str, options: &AggregateOptions, rows: &[Vec<Datum>]) -> String {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        match run_with(name, options, rows, &ctx, &mut diag) {
            Ok(d) => d.to_string(),
            Err(e) => format!("ERROR {}", e.code()),
        }
    }

    /// One-argument rows
    pub fn col(values: &[Datum]) -> Vec<Vec<Datum>> {
        values.iter().map(|v| vec![v.clone()]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::{UTF8MB4_0900_AI_CI, UTF8MB4_BIN};

    #[test]
    fn test_distinct_tracker() {
        let mut tracker = DistinctTracker::default();

        assert!(tracker.check_and_add(&[Datum::Int(1)]));
        assert!(!tracker.check_and_add(&[Datum::Int(1)]));
        assert!(!tracker.check_and_add(&[Datum::UInt(1)]));
        assert!(tracker.check_and_add(&[Datum::Int(2)]));
        assert!(tracker.check_and_add(&[Datum::text("hello")]));

        assert_eq!(tracker.count(), 3);

        tracker.reset();
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_distinct_follows_collation() {
        let mut ci = DistinctTracker::default();
        assert!(ci.check_and_add(&[Datum::text_in("a", &UTF8MB4_0900_AI_CI)]));
        assert!(!ci.check_and_add(&[Datum::text_in("A", &UTF8MB4_0900_AI_CI)]));

        let mut bin = DistinctTracker::default();
        assert!(bin.check_and_add(&[Datum::text_in("a", &UTF8MB4_BIN)]));
        assert!(bin.check_and_add(&[Datum::text_in("A", &UTF8MB4_BIN)]));
    }

    #[test]
    fn test_distinct_tuples() {
        let mut tracker = DistinctTracker::default();
        assert!(tracker.check_and_add(&[Datum::Int(1), Datum::text("ab")]));
        assert!(tracker.check_and_add(&[Datum::Int(1), Datum::text("a")]));
        assert!(!tracker.check_and_add(&[Datum::Int(1), Datum::text("ab")]));
        assert!(tracker.check_and_add(&[Datum::Float(-0.0)]));
        assert!(!tracker.check_and_add(&[Datum::Float(0.0)]));
    }
}
