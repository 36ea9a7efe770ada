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

//! BIT_AND, BIT_OR and BIT_XOR aggregate functions

use crate::collation::{Derivation, BINARY};
use crate::core::{Datum, Result};
use crate::functions::scalar::bitwise::{bit_casts, bits_of};
use crate::functions::scalar::uint_type;
use crate::functions::{
    Accumulator, AggregateFunction, AggregateOptions, AggregateResolution, ArgType, Call,
    FunctionInfo, FunctionSignature, FunctionType, PlanContext,
};

use super::resolution;

/// Bitwise fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    fn name(self) -> &'static str {
        match self {
            BitOp::And => "BIT_AND",
            BitOp::Or => "BIT_OR",
            BitOp::Xor => "BIT_XOR",
        }
    }

    /// Result of an empty group
    fn identity(self) -> u64 {
        match self {
            BitOp::And => u64::MAX,
            BitOp::Or | BitOp::Xor => 0,
        }
    }

    #[inline]
    fn apply(self, acc: u64, v: u64) -> u64 {
        match self {
            BitOp::And => acc & v,
            BitOp::Or => acc | v,
            BitOp::Xor => acc ^ v,
        }
    }
}

/// BIT_AND / BIT_OR / BIT_XOR over 64-bit patterns; BIGINT UNSIGNED result,
/// never NULL
pub struct BitFunction {
    op: BitOp,
}

impl BitFunction {
    pub fn new(op: BitOp) -> Self {
        Self { op }
    }
}

impl AggregateFunction for BitFunction {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            self.op.name(),
            FunctionType::Aggregate,
            "Bitwise fold of all non-NULL values",
            FunctionSignature::exact(1),
        )
    }

    fn resolve(
        &self,
        args: &[ArgType],
        _options: &AggregateOptions,
        _plan: &PlanContext,
    ) -> Result<AggregateResolution> {
        FunctionSignature::exact(1)
            .validate_arg_count(&self.op.name().to_ascii_lowercase(), args.len())?;
        let op = self.op;
        Ok(resolution(
            uint_type(),
            Derivation::numeric(&BINARY),
            bit_casts(args),
            move || {
                Box::new(BitAccumulator {
                    op,
                    acc: op.identity(),
                })
            },
        ))
    }
}

struct BitAccumulator {
    op: BitOp,
    acc: u64,
}

impl Accumulator for BitAccumulator {
    fn update(&mut self, args: &[Datum], _call: &mut Call<'_>) -> Result<()> {
        if !args[0].is_null() {
            self.acc = self.op.apply(self.acc, bits_of(&args[0]));
        }
        Ok(())
    }

    fn finish(&mut self, _call: &mut Call<'_>) -> Result<Datum> {
        Ok(Datum::UInt(self.acc))
    }

    fn reset(&mut self) {
        self.acc = self.op.identity();
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
    fn test_bit_folds() {
        let rows = col(&[i(12), i(10), Datum::Null]);
        assert_eq!(run("BIT_AND", &AggregateOptions::default(), &rows), "8");
        assert_eq!(run("BIT_OR", &AggregateOptions::default(), &rows), "14");
        assert_eq!(run("BIT_XOR", &AggregateOptions::default(), &rows), "6");
    }

    #[test]
    fn test_bit_empty_group() {
        let rows = col(&[Datum::Null]);
        assert_eq!(
            run("BIT_AND", &AggregateOptions::default(), &rows),
            "18446744073709551615"
        );
        assert_eq!(run("BIT_OR", &AggregateOptions::default(), &rows), "0");
        assert_eq!(run("BIT_XOR", &AggregateOptions::default(), &rows), "0");
    }

    #[test]
    fn test_bit_negative_keeps_pattern() {
        let rows = col(&[i(-1)]);
        assert_eq!(
            run("BIT_OR", &AggregateOptions::default(), &rows),
            "18446744073709551615"
        );
    }

    #[test]
    fn test_bit_strings_are_numbers() {
        let rows = col(&[Datum::text("6"), Datum::text("3")]);
        assert_eq!(run("BIT_AND", &AggregateOptions::default(), &rows), "2");
    }
}
