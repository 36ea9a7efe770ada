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

//! GROUP_CONCAT aggregate function

use std::cmp::Ordering;

use crate::collation::{Charset, Collation};
use crate::core::{Datum, Error, FieldType, Result};
use crate::functions::scalar::comparison::{compare_kind, compare_values, CompareKind};
use crate::functions::scalar::{encode, string_casts, string_derivation, string_type, text_of};
use crate::functions::{
    Accumulator, AggregateFunction, AggregateOptions, AggregateResolution, ArgType, Call,
    FunctionInfo, FunctionSignature, FunctionType, PlanContext,
};

use super::{any_null, resolution, DistinctTracker};

const DEFAULT_SEPARATOR: &str = ",";

/// GROUP_CONCAT aggregate function
///
/// Concatenates the value arguments of each row, then joins the rows with
/// the separator, ordered by the ORDER BY keys when there are any. The
/// result is cut at the session's `group_concat_max_len` bytes with a
/// warning.
#[derive(Default)]
pub struct GroupConcatFunction;

impl AggregateFunction for GroupConcatFunction {
    fn name(&self) -> &str {
        "GROUP_CONCAT"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "GROUP_CONCAT",
            FunctionType::Aggregate,
            "Concatenates the non-NULL values of a group with a separator",
            FunctionSignature::variadic(1),
        )
    }

    fn resolve(
        &self,
        args: &[ArgType],
        options: &AggregateOptions,
        plan: &PlanContext,
    ) -> Result<AggregateResolution> {
        let n = options.value_count(args.len());
        if n == 0 {
            return Err(Error::WrongParamCount("group_concat".to_string()));
        }
        let (values, keys) = args.split_at(n);
        let derivation = string_derivation(values, "group_concat", plan)?;
        let collation = derivation.collation;
        let mut casts = string_casts(values, collation);
        let mut order = Vec::with_capacity(keys.len());
        for (key, &ascending) in keys.iter().zip(&options.order_by) {
            let kind = compare_kind(std::slice::from_ref(key), "group_concat", plan)?;
            casts.push(kind.cast_for(key));
            order.push((kind, ascending));
        }
        let ret = if collation.charset == Charset::Binary {
            FieldType::varbinary()
        } else {
            string_type(collation)
        };
        let separator = options
            .separator
            .clone()
            .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
        let distinct = options.distinct;
        Ok(resolution(ret, derivation, casts, move || {
            Box::new(GroupConcatAccumulator {
                values: n,
                order: order.clone(),
                separator: separator.clone(),
                collation,
                entries: Vec::new(),
                distinct: distinct.then(DistinctTracker::default),
            })
        }))
    }
}

struct Entry {
    text: String,
    keys: Vec<Datum>,
}

struct GroupConcatAccumulator {
    /// Leading arguments that are concatenated
    values: usize,
    order: Vec<(CompareKind, bool)>,
    separator: String,
    collation: &'static Collation,
    entries: Vec<Entry>,
    distinct: Option<DistinctTracker>,
}

impl GroupConcatAccumulator {
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        for ((kind, ascending), (x, y)) in self.order.iter().zip(a.keys.iter().zip(&b.keys)) {
            let ord = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => compare_values(kind, x, y),
            };
            let ord = if *ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Bytes `c` takes in the result charset
    fn width(&self, c: char) -> usize {
        match self.collation.charset {
            Charset::Binary => 1,
            charset => charset.byte_len(c.encode_utf8(&mut [0u8; 4])),
        }
    }
}

impl Accumulator for GroupConcatAccumulator {
    fn update(&mut self, args: &[Datum], _call: &mut Call<'_>) -> Result<()> {
        let (values, keys) = args.split_at(self.values.min(args.len()));
        if any_null(values) {
            return Ok(());
        }
        if let Some(tracker) = &mut self.distinct {
            if !tracker.check_and_add(values) {
                return Ok(());
            }
        }
        let text = values.iter().map(text_of).collect::<String>();
        self.entries.push(Entry {
            text,
            keys: keys.to_vec(),
        });
        Ok(())
    }

    fn finish(&mut self, call: &mut Call<'_>) -> Result<Datum> {
        if self.entries.is_empty() {
            return Ok(Datum::Null);
        }
        let mut entries = std::mem::take(&mut self.entries);
        if !self.order.is_empty() {
            entries.sort_by(|a, b| self.compare(a, b));
        }
        let max = call.ctx.group_concat_max_len();
        let mut out = String::new();
        let mut used = 0usize;
        for (idx, entry) in entries.iter().enumerate() {
            let sep = if idx > 0 { self.separator.as_str() } else { "" };
            for c in sep.chars().chain(entry.text.chars()) {
                let w = self.width(c);
                if used + w > max {
                    call.warn(&Error::GroupConcatCut(idx + 1));
                    self.entries = entries;
                    return Ok(encode(&out, self.collation));
                }
                used += w;
                out.push(c);
            }
        }
        self.entries = entries;
        Ok(encode(&out, self.collation))
    }

    fn reset(&mut self) {
        self.entries.clear();
        if let Some(tracker) = &mut self.distinct {
            tracker.reset();
        }
    }
}
