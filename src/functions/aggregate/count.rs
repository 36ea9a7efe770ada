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

//! COUNT aggregate function

use crate::collation::{Derivation, BINARY};
use crate::core::{Datum, Error, FieldType, Result};
use crate::functions::{
    Accumulator, AggregateFunction, AggregateOptions, AggregateResolution, ArgType, Call,
    FunctionInfo, FunctionSignature, FunctionType, PlanContext,
};

use super::{any_null, resolution, DistinctTracker};

/// COUNT aggregate function
///
/// With no arguments this is `COUNT(*)` and counts every row. Otherwise it
/// counts the rows in which all arguments are non-NULL. Never NULL itself.
#[derive(Default)]
pub struct CountFunction;

impl AggregateFunction for CountFunction {
    fn name(&self) -> &str {
        "COUNT"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "COUNT",
            FunctionType::Aggregate,
            "Returns the number of rows or of non-NULL argument tuples",
            FunctionSignature::variadic(0),
        )
    }

    fn resolve(
        &self,
        args: &[ArgType],
        options: &AggregateOptions,
        _plan: &PlanContext,
    ) -> Result<AggregateResolution> {
        if options.distinct && args.is_empty() {
            return Err(Error::WrongParamCount("count".to_string()));
        }
        let distinct = options.distinct;
        Ok(resolution(
            FieldType::long_long(),
            Derivation::numeric(&BINARY),
            vec![None; args.len()],
            move || Box::new(CountAccumulator::new(distinct)),
        ))
    }
}

struct CountAccumulator {
    count: i64,
    distinct: Option<DistinctTracker>,
}

impl CountAccumulator {
    fn new(distinct: bool) -> Self {
        Self {
            count: 0,
            distinct: distinct.then(DistinctTracker::default),
        }
    }
}

impl Accumulator for CountAccumulator {
    fn update(&mut self, args: &[Datum], _call: &mut Call<'_>) -> Result<()> {
        if any_null(args) {
            return Ok(());
        }
        if let Some(tracker) = &mut self.distinct {
            if !tracker.check_and_add(args) {
                return Ok(());
            }
        }
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self, _call: &mut Call<'_>) -> Result<Datum> {
        Ok(Datum::Int(self.count))
    }

    fn reset(&mut self) {
        self.count = 0;
        if let Some(tracker) = &mut self.distinct {
            tracker.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{col, run};
    use super::*;

    fn i(v: i64) -> Datum {
        Datum::Int(v)
    }

    #[test]
    fn test_count_star() {
        let rows = vec![vec![], vec![], vec![]];
        assert_eq!(run("COUNT", &AggregateOptions::default(), &rows), "3");
        assert_eq!(run("COUNT", &AggregateOptions::default(), &[]), "0");
    }

    #[test]
    fn test_count_skips_null() {
        let rows = col(&[i(1), Datum::Null, i(3), Datum::Null]);
        assert_eq!(run("COUNT", &AggregateOptions::default(), &rows), "2");
    }

    #[test]
    fn test_count_distinct() {
        let rows = col(&[i(1), i(1), i(2), Datum::Null, i(2)]);
        assert_eq!(run("COUNT", &AggregateOptions::distinct(), &rows), "2");
    }

    #[test]
    fn test_count_distinct_pairs() {
        let rows = vec![
            vec![i(1), Datum::text("a")],
            vec![i(1), Datum::text("A")],
            vec![i(1), Datum::text("b")],
            vec![i(2), Datum::Null],
        ];
        assert_eq!(run("COUNT", &AggregateOptions::distinct(), &rows), "2");
        assert_eq!(run("COUNT", &AggregateOptions::default(), &rows), "3");
    }

    #[test]
    fn test_count_distinct_star_rejected() {
        assert_eq!(run("COUNT", &AggregateOptions::distinct(), &[]), "ERROR 1582");
    }

    #[test]
    fn test_reset() {
        let mut acc = CountAccumulator::new(true);
        let ctx = crate::eval::EvalContext::new();
        let mut diag = crate::diagnostics::Diagnostics::default();
        let mut call = Call::new(&ctx, &mut diag);
        acc.update(&[i(1)], &mut call).unwrap();
        acc.reset();
        acc.update(&[i(1)], &mut call).unwrap();
        assert_eq!(acc.finish(&mut call).unwrap().to_string(), "1");
    }
}
