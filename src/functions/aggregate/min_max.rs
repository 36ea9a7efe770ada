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

//! MIN and MAX aggregate functions

use std::cmp::Ordering;

use crate::core::{Datum, EvalType, Result};
use crate::functions::scalar::comparison::{compare_kind, compare_values, CompareKind};
use crate::functions::scalar::{result_derivation, string_operand};
use crate::functions::{
    Accumulator, AggregateFunction, AggregateOptions, AggregateResolution, ArgType, Call,
    FunctionInfo, FunctionSignature, FunctionType, PlanContext,
};

use super::resolution;

/// MIN or MAX
///
/// Values are compared the way `<` compares them: strings under the
/// argument's collation, temporals chronologically, JSON by the JSON
/// ordering. DISTINCT changes nothing.
pub struct MinMaxFunction {
    name: &'static str,
    /// Ordering a new value must have against the current one to replace it
    wins: Ordering,
}

impl MinMaxFunction {
    pub fn min() -> Self {
        Self {
            name: "MIN",
            wins: Ordering::Less,
        }
    }

    pub fn max() -> Self {
        Self {
            name: "MAX",
            wins: Ordering::Greater,
        }
    }
}

impl AggregateFunction for MinMaxFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn info(&self) -> FunctionInfo {
        let description = if self.wins == Ordering::Less {
            "Returns the smallest non-NULL value"
        } else {
            "Returns the largest non-NULL value"
        };
        FunctionInfo::new(
            self.name,
            FunctionType::Aggregate,
            description,
            FunctionSignature::exact(1),
        )
    }

    fn resolve(
        &self,
        args: &[ArgType],
        _options: &AggregateOptions,
        plan: &PlanContext,
    ) -> Result<AggregateResolution> {
        let lower = self.name.to_ascii_lowercase();
        FunctionSignature::exact(1).validate_arg_count(&lower, args.len())?;
        let kind = compare_kind(args, &lower, plan)?;
        let cast = kind.cast_for(&args[0]);
        let ret = cast.clone().unwrap_or_else(|| args[0].ty.clone());
        let derivation = match ret.eval_type() {
            EvalType::String => string_operand(&args[0], plan),
            _ => result_derivation(&ret, plan),
        };
        let wins = self.wins;
        Ok(resolution(ret, derivation, vec![cast], move || {
            Box::new(MinMaxAccumulator {
                kind,
                wins,
                best: None,
            })
        }))
    }
}

struct MinMaxAccumulator {
    kind: CompareKind,
    wins: Ordering,
    best: Option<Datum>,
}

impl Accumulator for MinMaxAccumulator {
    fn update(&mut self, args: &[Datum], _call: &mut Call<'_>) -> Result<()> {
        let value = &args[0];
        if value.is_null() {
            return Ok(());
        }
        let replace = match &self.best {
            None => true,
            Some(best) => compare_values(&self.kind, value, best) == self.wins,
        };
        if replace {
            self.best = Some(value.clone());
        }
        Ok(())
    }

    fn finish(&mut self, _call: &mut Call<'_>) -> Result<Datum> {
        Ok(self.best.clone().unwrap_or(Datum::Null))
    }

    fn reset(&mut self) {
        self.best = None;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{col, run};
    use super::*;
    use crate::collation::UTF8MB4_BIN;

    fn i(v: i64) -> Datum {
        Datum::Int(v)
    }

    #[test]
    fn test_min_max_integers() {
        let rows = col(&[i(3), i(-7), Datum::Null, i(12)]);
        assert_eq!(run("MIN", &AggregateOptions::default(), &rows), "-7");
        assert_eq!(run("MAX", &AggregateOptions::default(), &rows), "12");
    }

    #[test]
    fn test_min_max_empty() {
        assert_eq!(run("MIN", &AggregateOptions::default(), &col(&[Datum::Null])), "NULL");
        assert_eq!(run("MAX", &AggregateOptions::default(), &[]), "ERROR 1582");
    }

    #[test]
    fn test_min_max_strings_follow_collation() {
        let ci = col(&[Datum::text("b"), Datum::text("A"), Datum::text("c")]);
        assert_eq!(run("MIN", &AggregateOptions::default(), &ci), "A");
        assert_eq!(run("MAX", &AggregateOptions::default(), &ci), "c");

        let bin = col(&[
            Datum::text_in("b", &UTF8MB4_BIN),
            Datum::text_in("A", &UTF8MB4_BIN),
            Datum::text_in("a", &UTF8MB4_BIN),
        ]);
        assert_eq!(run("MAX", &AggregateOptions::default(), &bin), "b");
        assert_eq!(run("MIN", &AggregateOptions::default(), &bin), "A");
    }

    #[test]
    fn test_min_keeps_first_of_equal_values() {
        let rows = col(&[Datum::text("a"), Datum::text("A")]);
        assert_eq!(run("MIN", &AggregateOptions::default(), &rows), "a");
    }

    #[test]
    fn test_min_max_floats() {
        let rows = col(&[Datum::Float(2.5), Datum::Float(-1.25)]);
        assert_eq!(run("MIN", &AggregateOptions::default(), &rows), "-1.25");
    }
}
