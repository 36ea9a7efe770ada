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

//! SUM aggregate function

use crate::collation::{Derivation, BINARY};
use crate::core::{decimal, Datum, Decimal, Error, EvalType, FieldType, Result};
use crate::functions::scalar::{
    arith_class, decimal_int_digits, decimal_of, decimal_scale, decimal_type, numeric_casts,
    real_of,
};
use crate::functions::{
    Accumulator, AggregateFunction, AggregateOptions, AggregateResolution, ArgType, Call,
    FunctionInfo, FunctionSignature, FunctionType, PlanContext,
};

use super::{any_null, call_display, resolution, DistinctTracker};

/// Integer digits SUM adds to its argument's precision
const SUM_EXTRA_DIGITS: i32 = 22;

/// SUM aggregate function
///
/// Integers and decimals are summed exactly as DECIMAL, everything else
/// as DOUBLE. NULL for an empty group.
#[derive(Default)]
pub struct SumFunction;

impl AggregateFunction for SumFunction {
    fn name(&self) -> &str {
        "SUM"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "SUM",
            FunctionType::Aggregate,
            "Returns the sum of all non-NULL values",
            FunctionSignature::exact(1),
        )
    }

    fn resolve(
        &self,
        args: &[ArgType],
        options: &AggregateOptions,
        _plan: &PlanContext,
    ) -> Result<AggregateResolution> {
        FunctionSignature::exact(1).validate_arg_count("sum", args.len())?;
        let class = arith_class(args);
        let ty = &args[0].ty;
        let ret = match class {
            EvalType::Real => FieldType::double(),
            _ => decimal_type(decimal_int_digits(ty) + SUM_EXTRA_DIGITS, decimal_scale(ty)),
        };
        let exact = class != EvalType::Real;
        let scale = ret.decimal.max(0) as u32;
        let distinct = options.distinct;
        let display = call_display("SUM", distinct, args);
        Ok(resolution(
            ret,
            Derivation::numeric(&BINARY),
            numeric_casts(args, class),
            move || {
                Box::new(SumAccumulator {
                    sum: Sum::new(exact),
                    seen: false,
                    scale,
                    distinct: distinct.then(DistinctTracker::default),
                    display: display.clone(),
                })
            },
        ))
    }
}

/// Running total shared by SUM and AVG
#[derive(Debug, Clone, Copy)]
pub(super) enum Sum {
    Exact(Decimal),
    Real(f64),
}

impl Sum {
    pub(super) fn new(exact: bool) -> Self {
        if exact {
            Sum::Exact(Decimal::ZERO)
        } else {
            Sum::Real(0.0)
        }
    }

    /// Add one value; `display` names the call in overflow errors
    pub(super) fn add(&mut self, value: &Datum, display: &str) -> Result<()> {
        match self {
            Sum::Exact(total) => {
                *total = total
                    .checked_add(decimal_of(value))
                    .ok_or_else(|| Error::out_of_range("DECIMAL", display))?;
            }
            Sum::Real(total) => {
                *total += real_of(value);
                if !total.is_finite() {
                    return Err(Error::out_of_range("DOUBLE", display));
                }
            }
        }
        Ok(())
    }

    pub(super) fn clear(&mut self) {
        *self = Sum::new(matches!(self, Sum::Exact(_)));
    }
}

struct SumAccumulator {
    sum: Sum,
    seen: bool,
    scale: u32,
    distinct: Option<DistinctTracker>,
    display: String,
}

impl Accumulator for SumAccumulator {
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
        self.seen = true;
        Ok(())
    }

    fn finish(&mut self, _call: &mut Call<'_>) -> Result<Datum> {
        if !self.seen {
            return Ok(Datum::Null);
        }
        Ok(match self.sum {
            Sum::Exact(total) => Datum::Decimal(decimal::with_scale(total, self.scale)),
            Sum::Real(total) => Datum::Float(total),
        })
    }

    fn reset(&mut self) {
        self.sum.clear();
        self.seen = false;
        if let Some(tracker) = &mut self.distinct {
            tracker.reset();
        }
    }
}
