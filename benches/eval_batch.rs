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

//! Batch vs row evaluation
//!
//! Run with: cargo bench --bench eval_batch

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use stoolap_eval::{
    evaluate, Chunk, Datum, Diagnostics, EvalContext, Evaluator, Expr, ExprBuilder, FieldType,
    PlanContext,
};

const ROW_COUNT: usize = 16_384;

fn setup_chunk(ctx: &EvalContext) -> Chunk {
    let rows: Vec<Vec<Datum>> = (0..ROW_COUNT)
        .map(|i| {
            vec![
                Datum::Int(i as i64),
                Datum::Int((i % 97) as i64 - 48),
                Datum::text(format!("2024-01-{:02} 10:00:00", i % 28 + 1)),
            ]
        })
        .collect();
    Chunk::from_rows(
        vec![
            FieldType::long_long(),
            FieldType::long_long(),
            FieldType::varchar(ctx.collation()),
        ],
        &rows,
    )
    .unwrap()
}

fn setup_exprs(ctx: &EvalContext) -> Vec<(&'static str, Expr)> {
    let b = ExprBuilder::new(PlanContext::from_context(ctx));
    let a = b.column(0, "a", FieldType::long_long());
    let n = b.column(1, "n", FieldType::long_long());
    let d = b.column(2, "d", FieldType::varchar(ctx.collation()));
    vec![
        ("add", b.call("+", vec![a.clone(), n.clone()]).unwrap()),
        ("compare", b.call("<", vec![a.clone(), n.clone()]).unwrap()),
        ("divide", b.call("/", vec![a.clone(), n.clone()]).unwrap()),
        ("concat", b.call("CONCAT", vec![d.clone(), b.text("#"), a]).unwrap()),
        (
            "date_add",
            b.call("DATE_ADD", vec![d, n, b.text("DAY")]).unwrap(),
        ),
    ]
}

fn bench_eval(c: &mut Criterion) {
    let ctx = EvalContext::new();
    let chunk = setup_chunk(&ctx);
    let rows: Vec<Vec<Datum>> = (0..chunk.num_rows()).map(|i| chunk.row(i)).collect();
    let evaluator = Evaluator::default();

    let mut group = c.benchmark_group("eval");
    for (name, expr) in setup_exprs(&ctx) {
        group.bench_with_input(BenchmarkId::new("batch", name), &expr, |bench, expr| {
            bench.iter(|| {
                let mut diag = Diagnostics::default();
                black_box(evaluator.eval_chunk(expr, &chunk, &ctx, &mut diag).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("row", name), &expr, |bench, expr| {
            bench.iter(|| {
                let mut diag = Diagnostics::default();
                for row in &rows {
                    black_box(evaluate(expr, row, &ctx, &mut diag).unwrap());
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
