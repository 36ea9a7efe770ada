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

//! Expression Evaluator
//!
//! Drives a resolved [`Expr`] over one row or over a [`Chunk`].
//!
//! Chunk evaluation works in batches of `batch_size` rows. Each call node
//! converts its argument columns and hands them to the function's batch
//! kernel. If anything in a batch fails, the batch's warnings are rolled
//! back and the batch is evaluated again row by row, so the error raised
//! and the warnings kept are exactly those of row-at-a-time evaluation.
//! Cancellation and deadlines are checked between batches.

use std::borrow::Cow;

use log::{debug, trace};
use smallvec::SmallVec;

use crate::config::{EvalConfig, DEFAULT_BATCH_SIZE};
use crate::convert::{cast, CastMode};
use crate::core::{Datum, Error, FieldType, Result};
use crate::diagnostics::Diagnostics;
use crate::functions::{ArgSource, Call, NullPolicy};

use super::column::{Chunk, Column};
use super::context::EvalContext;
use super::expr::{Expr, FunctionCall};

/// Evaluate `expr` over one row
pub fn evaluate(
    expr: &Expr,
    row: &[Datum],
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Datum> {
    eval_value(expr, Input::Row(row), ctx, diag)
}

/// Batch driver
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    batch_size: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl Evaluator {
    /// Evaluator splitting chunks into batches of `batch_size` rows (at least 1)
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &EvalConfig) -> Self {
        Self::new(config.batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Evaluate `expr` over one row
    pub fn eval_row(
        &self,
        expr: &Expr,
        row: &[Datum],
        ctx: &EvalContext,
        diag: &mut Diagnostics,
    ) -> Result<Datum> {
        evaluate(expr, row, ctx, diag)
    }

    /// Evaluate `expr` for every row of `chunk`
    ///
    /// Values and warnings equal those of calling [`eval_row`](Self::eval_row)
    /// on each row in order; on error, the warnings of the rows before the
    /// failing one are kept.
    pub fn eval_chunk(
        &self,
        expr: &Expr,
        chunk: &Chunk,
        ctx: &EvalContext,
        diag: &mut Diagnostics,
    ) -> Result<Column> {
        let rows = chunk.num_rows();
        let mut out: Option<Column> = None;
        let mut start = 0;
        loop {
            ctx.check_interrupted()?;
            let end = (start + self.batch_size).min(rows);
            let batch = batch_of(chunk, start, end);
            let column = self.eval_batch(expr, &batch, ctx, diag)?;
            match out.as_mut() {
                Some(out) => out.extend(column)?,
                None => out = Some(column),
            }
            start = end;
            if start >= rows {
                break;
            }
        }
        Ok(out.unwrap_or_else(|| Column::with_capacity(expr.field_type(), 0)))
    }

    /// Evaluate one batch, falling back to rows on failure
    fn eval_batch(
        &self,
        expr: &Expr,
        batch: &Chunk,
        ctx: &EvalContext,
        diag: &mut Diagnostics,
    ) -> Result<Column> {
        let rows = batch.num_rows();
        trace!("evaluating {} over {} rows", expr, rows);
        diag.begin_batch();
        let checkpoint = diag.checkpoint();
        let result = match eval_column(expr, batch, ctx, diag) {
            Ok(column) => Ok(column),
            Err(err) => {
                debug!(
                    "batch of {} rows failed with {}, re-evaluating by row",
                    rows,
                    err.code()
                );
                diag.rollback(checkpoint);
                eval_by_row(expr, batch, ctx, diag)
            }
        };
        diag.end_batch();
        result
    }
}

// ============================================================================
// Row evaluation
// ============================================================================

/// Where column references read from
#[derive(Clone, Copy)]
enum Input<'a> {
    Row(&'a [Datum]),
    Chunk(&'a Chunk, usize),
}

impl Input<'_> {
    fn get(&self, index: usize) -> Result<Datum> {
        let value = match self {
            Input::Row(row) => row.get(index).cloned(),
            Input::Chunk(chunk, row) => chunk.column(index).map(|c| c.get(*row)),
        };
        value.ok_or_else(|| Error::internal(format!("column {} is not in the input", index)))
    }
}

fn eval_value(
    expr: &Expr,
    input: Input<'_>,
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Datum> {
    match expr {
        Expr::Column(c) => input.get(c.index),
        Expr::Literal(l) => Ok(l.value.clone()),
        Expr::Call(f) => eval_call(f, input, ctx, diag),
    }
}

/// Apply the implicit conversion resolution chose for an argument
#[inline]
fn convert_arg(
    value: Datum,
    target: Option<&FieldType>,
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Datum> {
    match target {
        Some(ty) if !value.is_null() => cast(value, ty, CastMode::Implicit, ctx, diag),
        _ => Ok(value),
    }
}

fn eval_call(
    f: &FunctionCall,
    input: Input<'_>,
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Datum> {
    let function = &f.resolution.implementation;
    if function.is_lazy() {
        let mut args = LazyArgs { call: f, input };
        let mut call = Call::new(ctx, diag);
        return function.eval_lazy(&mut args, &mut call);
    }
    let mut values: SmallVec<[Datum; 4]> = SmallVec::with_capacity(f.args.len());
    for (arg, target) in f.args.iter().zip(&f.resolution.casts) {
        let value = eval_value(arg, input, ctx, diag)?;
        values.push(convert_arg(value, target.as_ref(), ctx, diag)?);
    }
    if function.null_policy() == NullPolicy::Propagate && values.iter().any(Datum::is_null) {
        return Ok(Datum::Null);
    }
    let mut call = Call::new(ctx, diag);
    function.eval_row(&values, &mut call)
}

/// Arguments of a short-circuiting call, evaluated when asked for
struct LazyArgs<'a> {
    call: &'a FunctionCall,
    input: Input<'a>,
}

impl ArgSource for LazyArgs<'_> {
    fn len(&self) -> usize {
        self.call.args.len()
    }

    fn eval(&mut self, index: usize, call: &mut Call<'_>) -> Result<Datum> {
        let arg = self
            .call
            .args
            .get(index)
            .ok_or_else(|| Error::internal(format!("argument {} out of range", index)))?;
        let value = eval_value(arg, self.input, call.ctx, call.diag)?;
        let target = self.call.resolution.casts.get(index).and_then(Option::as_ref);
        convert_arg(value, target, call.ctx, call.diag)
    }
}

fn eval_by_row(
    expr: &Expr,
    batch: &Chunk,
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Column> {
    let rows = batch.num_rows();
    let mut out = Vec::with_capacity(rows);
    for row in 0..rows {
        diag.set_row(row);
        out.push(eval_value(expr, Input::Chunk(batch, row), ctx, diag)?);
    }
    Ok(Column::from_datums(expr.field_type(), out))
}

// ============================================================================
// Column evaluation
// ============================================================================

fn eval_column(
    expr: &Expr,
    batch: &Chunk,
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Column> {
    let rows = batch.num_rows();
    match expr {
        Expr::Column(c) => batch
            .column(c.index)
            .cloned()
            .ok_or_else(|| Error::internal(format!("column {} is not in the input", c.index))),
        Expr::Literal(l) => Ok(Column::constant(&l.ty, &l.value, rows)),
        Expr::Call(f) if f.resolution.implementation.is_lazy() => eval_by_row(expr, batch, ctx, diag),
        Expr::Call(f) => {
            let mut columns = Vec::with_capacity(f.args.len());
            for (arg, target) in f.args.iter().zip(&f.resolution.casts) {
                let column = eval_column(arg, batch, ctx, diag)?;
                let column = match target {
                    Some(ty) => convert_column(column, ty, ctx, diag)?,
                    None => column,
                };
                columns.push(column);
            }
            let mut call = Call::new(ctx, diag);
            f.resolution.implementation.eval_batch(
                &columns,
                rows,
                &f.resolution.return_type,
                &mut call,
            )
        }
    }
}

fn convert_column(
    column: Column,
    target: &FieldType,
    ctx: &EvalContext,
    diag: &mut Diagnostics,
) -> Result<Column> {
    let rows = column.len();
    let mut out = Vec::with_capacity(rows);
    for row in 0..rows {
        diag.set_row(row);
        out.push(convert_arg(column.get(row), Some(target), ctx, diag)?);
    }
    Ok(Column::from_datums(target, out))
}

/// Borrow `chunk` whole or copy out `start..end`
fn batch_of(chunk: &Chunk, start: usize, end: usize) -> Cow<'_, Chunk> {
    if start == 0 && end >= chunk.num_rows() {
        Cow::Borrowed(chunk)
    } else {
        Cow::Owned(chunk.slice(start, end))
    }
}
