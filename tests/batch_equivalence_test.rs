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

//! Batch/Row Equivalence Tests
//!
//! Evaluating a chunk must give the values, the warnings and the error of
//! evaluating its rows one at a time, for any batch size.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stoolap_eval::core::Decimal;
use stoolap_eval::{
    evaluate, Chunk, Datum, Diagnostics, EvalContext, Evaluator, Expr, ExprBuilder, FieldType,
    PlanContext, Result, SqlMode,
};

const ROWS: usize = 300;

type Outcome = (std::result::Result<Vec<String>, u16>, Vec<(u16, String)>);

fn random_int(rng: &mut StdRng) -> Datum {
    match rng.gen_range(0..10) {
        0 => Datum::Null,
        1 => Datum::Int(0),
        2 => Datum::Int(i64::MAX - rng.gen_range(0..3)),
        3 => Datum::Int(i64::MIN + rng.gen_range(0..3)),
        _ => Datum::Int(rng.gen_range(-1000..1000)),
    }
}

fn random_text(rng: &mut StdRng) -> Datum {
    match rng.gen_range(0..6) {
        0 => Datum::Null,
        1 => Datum::text(format!("{}abc", rng.gen_range(-50..50))),
        2 => Datum::text("not a number"),
        3 => Datum::text(format!("{}.{}", rng.gen_range(0..100), rng.gen_range(0..100))),
        _ => Datum::text(rng.gen_range(-100..100).to_string()),
    }
}

fn random_real(rng: &mut StdRng) -> Datum {
    match rng.gen_range(0..8) {
        0 => Datum::Null,
        1 => Datum::Float(0.0),
        2 => Datum::Float(rng.gen_range(-1.0e300..1.0e300)),
        3 => Datum::Float(rng.gen_range(-1.0e-5..1.0e-5)),
        _ => Datum::Float(rng.gen_range(-1000.0..1000.0)),
    }
}

fn random_decimal(rng: &mut StdRng) -> Datum {
    match rng.gen_range(0..6) {
        0 => Datum::Null,
        1 => Datum::Decimal(Decimal::new(0, 3)),
        _ => Datum::Decimal(Decimal::new(rng.gen_range(-10_000_000..10_000_000), 3)),
    }
}

fn random_date_text(rng: &mut StdRng) -> Datum {
    match rng.gen_range(0..8) {
        0 => Datum::Null,
        1 => Datum::text("0000-00-00"),
        2 => Datum::text("2024-02-30"),
        3 => Datum::text("9999-12-31 23:59:59"),
        4 => Datum::text("not a date"),
        _ => Datum::text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            rng.gen_range(1900..2100),
            rng.gen_range(1..13),
            rng.gen_range(1..29),
            rng.gen_range(0..24),
            rng.gen_range(0..60),
            rng.gen_range(0..60)
        )),
    }
}

fn random_chunk(seed: u64, ctx: &EvalContext) -> Chunk {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<Datum>> = (0..ROWS)
        .map(|_| {
            vec![
                random_int(&mut rng),
                random_int(&mut rng),
                random_text(&mut rng),
                random_real(&mut rng),
                random_decimal(&mut rng),
                random_date_text(&mut rng),
            ]
        })
        .collect();
    Chunk::from_rows(column_types(ctx), &rows).unwrap()
}

fn column_types(ctx: &EvalContext) -> Vec<FieldType> {
    vec![
        FieldType::long_long(),
        FieldType::long_long(),
        FieldType::varchar(ctx.collation()),
        FieldType::double(),
        FieldType::new_decimal(10, 3),
        FieldType::varchar(ctx.collation()),
    ]
}

/// The expressions under test over columns `a`, `b`, `s`, `r`, `d` and `t`
fn expressions(ctx: &EvalContext) -> Result<Vec<Expr>> {
    let x = ExprBuilder::new(PlanContext::from_context(ctx));
    let types = column_types(ctx);
    let a = || x.column(0, "a", types[0].clone());
    let b = || x.column(1, "b", types[1].clone());
    let s = || x.column(2, "s", types[2].clone());
    let r = || x.column(3, "r", types[3].clone());
    let d = || x.column(4, "d", types[4].clone());
    let t = || x.column(5, "t", types[5].clone());
    Ok(vec![
        x.call("+", vec![a(), b()])?,
        x.call("-", vec![a(), b()])?,
        x.call("*", vec![a(), x.int(3)])?,
        x.call("/", vec![a(), b()])?,
        x.call("DIV", vec![a(), b()])?,
        x.call("MOD", vec![a(), b()])?,
        x.call("UNARY_MINUS", vec![a()])?,
        x.call("ABS", vec![b()])?,
        x.call("=", vec![a(), b()])?,
        x.call("<", vec![a(), s()])?,
        x.call("<=>", vec![a(), b()])?,
        x.call("+", vec![s(), a()])?,
        x.call("CONCAT", vec![s(), x.text("/"), a()])?,
        x.call("LENGTH", vec![s()])?,
        x.call("UPPER", vec![s()])?,
        x.cast(s(), "SIGNED")?,
        x.cast(s(), "DECIMAL(5,2)")?,
        x.call("ROUND", vec![x.call("/", vec![a(), x.int(7)])?, x.int(2)])?,
        x.call("GREATEST", vec![a(), b(), x.int(0)])?,
        x.call("IN", vec![a(), x.int(0), x.int(1), b()])?,
        x.call("BETWEEN", vec![a(), b(), x.int(100)])?,
        x.call("COALESCE", vec![a(), b(), x.int(-1)])?,
        x.call("IFNULL", vec![s(), x.text("none")])?,
        x.call(
            "IF",
            vec![
                x.call(">", vec![a(), b()])?,
                x.call("-", vec![a(), b()])?,
                x.call("-", vec![b(), a()])?,
            ],
        )?,
        x.call("AND", vec![a(), x.call("/", vec![x.int(1), b()])?])?,
        x.call("*", vec![x.call("+", vec![a(), x.int(1)])?, x.call("DIV", vec![x.int(10), b()])?])?,
        x.call("+", vec![r(), d()])?,
        x.call("*", vec![d(), a()])?,
        x.call("/", vec![d(), b()])?,
        x.call("/", vec![r(), d()])?,
        x.call("<", vec![d(), s()])?,
        x.call("ROUND", vec![r(), a()])?,
        x.call("ROUND", vec![d(), b()])?,
        x.call("TRUNCATE", vec![r(), b()])?,
        x.call("TRUNCATE", vec![d(), x.int(1)])?,
        x.call("IF", vec![a(), d(), r()])?,
        x.call("COALESCE", vec![d(), a()])?,
        x.cast(r(), "DECIMAL(8,2)")?,
        x.cast(d(), "SIGNED")?,
        x.call("DATE", vec![t()])?,
        x.call("DATE_ADD", vec![t(), a(), x.text("DAY")])?,
        x.call("DATE_ADD", vec![t(), b(), x.text("MONTH")])?,
        x.call("DATE_ADD", vec![t(), d(), x.text("SECOND")])?,
        x.call("DATEDIFF", vec![t(), x.text("2000-01-01")])?,
        x.call("<", vec![t(), x.text("2000-01-01")])?,
    ])
}

fn warnings(diag: &mut Diagnostics) -> Vec<(u16, String)> {
    diag.take_warnings()
        .into_iter()
        .map(|w| (w.code, w.message))
        .collect()
}

fn by_rows(expr: &Expr, chunk: &Chunk, ctx: &EvalContext) -> Outcome {
    let mut diag = Diagnostics::default();
    let mut out = Vec::with_capacity(chunk.num_rows());
    for r in 0..chunk.num_rows() {
        match evaluate(expr, &chunk.row(r), ctx, &mut diag) {
            Ok(v) => out.push(v.to_string()),
            Err(e) => return (Err(e.code()), warnings(&mut diag)),
        }
    }
    (Ok(out), warnings(&mut diag))
}

fn by_chunk(expr: &Expr, chunk: &Chunk, ctx: &EvalContext, batch_size: usize) -> Outcome {
    let mut diag = Diagnostics::default();
    let result = Evaluator::new(batch_size)
        .eval_chunk(expr, chunk, ctx, &mut diag)
        .map(|c| c.into_datums().iter().map(ToString::to_string).collect())
        .map_err(|e| e.code());
    (result, warnings(&mut diag))
}

fn check_equivalence(ctx: &EvalContext, seeds: std::ops::Range<u64>) {
    let exprs = expressions(ctx).unwrap();
    for seed in seeds {
        let chunk = random_chunk(seed, ctx);
        for expr in &exprs {
            let expected = by_rows(expr, &chunk, ctx);
            for batch_size in [1, 7, 64, 1024] {
                let got = by_chunk(expr, &chunk, ctx, batch_size);
                assert_eq!(
                    got, expected,
                    "{} differs with batch size {} (seed {})",
                    expr, batch_size, seed
                );
            }
        }
    }
}

#[test]
fn test_batch_equals_rows_permissive() {
    check_equivalence(&EvalContext::new(), 0..4);
}

#[test]
fn test_batch_equals_rows_strict() {
    let ctx = EvalContext::builder()
        .sql_mode(SqlMode::STRICT_TRANS_TABLES | SqlMode::ERROR_FOR_DIVISION_BY_ZERO)
        .build();
    check_equivalence(&ctx, 10..13);
}

#[test]
fn test_batch_equals_rows_ignore() {
    let ctx = EvalContext::builder()
        .sql_mode(SqlMode::STRICT_ALL_TABLES | SqlMode::ERROR_FOR_DIVISION_BY_ZERO)
        .ignore_errors(true)
        .build();
    check_equivalence(&ctx, 20..23);
}

#[test]
fn test_warning_cap_is_the_same_in_batches() {
    let ctx = EvalContext::new();
    let x = ExprBuilder::new(PlanContext::from_context(&ctx));
    let expr = x
        .call("/", vec![x.int(1), x.column(0, "a", FieldType::long_long())])
        .unwrap();
    let rows: Vec<Vec<Datum>> = (0..50).map(|_| vec![Datum::Int(0)]).collect();
    let chunk = Chunk::from_rows(vec![FieldType::long_long()], &rows).unwrap();

    let mut diag = Diagnostics::new(10);
    Evaluator::new(8)
        .eval_chunk(&expr, &chunk, &ctx, &mut diag)
        .unwrap();
    assert_eq!(diag.warnings().len(), 10);
    assert_eq!(diag.warning_count(), 50);
}
