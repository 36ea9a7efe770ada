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

//! AVG aggregate function

use crate::collation::{Derivation, BINARY};
use crate::core::{decimal, Datum, Decimal, EvalType, FieldType, Result};
use crate::functions::scalar::{
    arith_class, decimal_int_digits, decimal_scale, decimal_type, numeric_casts,
};
use crate::functions::{
    Accumulator, AggregateFunction, AggregateOptions, AggregateResolution, ArgType, Call,
    FunctionInfo, FunctionSignature, FunctionType, PlanContext,
};

use super::sum::Sum;
use super::{any_null, call_display, resolution, DistinctTracker};

/// AVG aggregate function
///
/// Exact inputs average as DECIMAL with `div_precision_increment` more
/// fraction digits than the argument; other inputs average as DOUBLE.
#[derive(Default)]
pub struct AvgFunction;

impl AggregateFunction for AvgFunction {
    fn name(&self) -> &str {
        "AVG"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "AVG",
            FunctionType::Aggregate,
            "Returns the average of all non-NULL values",
            FunctionSignature::exact(1),
        )
    }

    fn resolve(
        &self,
        args: &[ArgType],
        options: &AggregateOptions,
        plan: &PlanContext,
    ) -> Result<AggregateResolution> {
        FunctionSignature::exact(1).validate_arg_count("avg", args.len())?;
        let class = arith_class(args);
        let ty = &args[0].ty;
        let ret = match class {
            EvalType::Real => FieldType::double(),
            _ => {
                let scale = decimal_scale(ty) + plan.div_precision_increment as i32;
                decimal_type(decimal_int_digits(ty) + 4, scale)
            }
        };
        let exact = class != EvalType::Real;
        let scale = ret.decimal.max(0) as u32;
        let distinct = options.distinct;
        let display = call_display("AVG", distinct, args);
        Ok(resolution(
            ret,
            Derivation::numeric(&BINARY),
            numeric_casts(args, class),
            move || {
                Box::new(AvgAccumulator {
                    sum: Sum::new(exact),
                    count: 0,
                    scale,
                    distinct: distinct.then(DistinctTracker::default),
                    display: display.clone(),
                })
            },
        ))
    }
}

struct AvgAccumulator {
    sum: Sum,
    count: u64,
    scale: u32,
    distinct: Option<DistinctTracker>,
    display: String,
}

impl Accumulator for AvgAccumulator {
    fn update(&mut self, args: &[Datum], _call: &mut Call<'_>) -> Result<()> {
        if any_null(args) {
            return Ok(());
        }
        if let Some(tracker) = &mut self.distinct {
            if !tracker.check_and_add(args) {
                return Ok(());
            }
        }
        self.sum.add(&args[0], &self.display)?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self, _call: &mut Call<'_>) -> Result<Datum> {
        if self.count == 0 {
            return Ok(Datum::Null);
        }
        Ok(match self.sum {
            Sum::Exact(total) => {
                let avg = total
                    .checked_div(Decimal::from(self.count), self.scale)
                    .unwrap_or(Decimal::ZERO);
                Datum::Decimal(decimal::with_scale(avg, self.scale))
            }
            Sum::Real(total) => Datum::Float(total / self.count as f64),
        })
    }

    fn reset(&mut self) {
        self.sum.clear();
        self.count = 0;
        if let Some(tracker) = &mut self.distinct {
            tracker.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{col, run, run_with};
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::eval::EvalContext;

    fn i(v: i64) -> Datum {
        Datum::Int(v)
    }

    #[test]
    fn test_avg_integers() {
        let rows = col(&[i(1), i(2)]);
        assert_eq!(run("AVG", &AggregateOptions::default(), &rows), "1.5000");
        let rows = col(&[i(1), i(2), i(2)]);
        assert_eq!(run("AVG", &AggregateOptions::default(), &rows), "1.6667");
    }

    #[test]
    fn test_avg_follows_div_precision_increment() {
        let ctx = EvalContext::builder().div_precision_increment(2).build();
        let mut diag = Diagnostics::default();
        let rows = col(&[i(1), i(2), i(2)]);
        let v = run_with("AVG", &AggregateOptions::default(), &rows, &ctx, &mut diag).unwrap();
        assert_eq!(v.to_string(), "1.67");
    }

    #[test]
    fn test_avg_floats() {
        let rows = col(&[Datum::Float(1.0), Datum::Float(2.0)]);
        assert_eq!(run("AVG", &AggregateOptions::default(), &rows), "1.5");
    }

    #[test]
    fn test_avg_null_handling() {
        let rows = col(&[i(4), Datum::Null]);
        assert_eq!(run("AVG", &AggregateOptions::default(), &rows), "4.0000");
        assert_eq!(run("AVG", &AggregateOptions::default(), &col(&[Datum::Null])), "NULL");
    }

    #[test]
    fn test_avg_distinct() {
        let rows = col(&[i(1), i(1), i(1), i(4)]);
        assert_eq!(run("AVG", &AggregateOptions::distinct(), &rows), "2.5000");
        assert_eq!(run("AVG", &AggregateOptions::default(), &rows), "1.7500");
    }
}
