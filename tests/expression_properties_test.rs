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

//! Expression Property Tests
//!
//! MySQL behaviors that must hold exactly: overflow, signedness casts,
//! rounding, collation conflicts and zero-date handling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stoolap_eval::{
    evaluate, Datum, Diagnostics, EvalContext, Expr, ExprBuilder, FieldType, PlanContext, Result,
    SqlMode, Warning,
};

fn builder(ctx: &EvalContext) -> ExprBuilder<'static> {
    ExprBuilder::new(PlanContext::from_context(ctx))
}

/// Evaluate a constant expression, returning the value and the warnings
fn run(
    ctx: &EvalContext,
    build: impl FnOnce(&ExprBuilder<'static>) -> Result<Expr>,
) -> (Result<Datum>, Vec<Warning>) {
    let mut diag = Diagnostics::default();
    let result = build(&builder(ctx)).and_then(|e| evaluate(&e, &[], ctx, &mut diag));
    (result, diag.take_warnings())
}

fn value(build: impl FnOnce(&ExprBuilder<'static>) -> Result<Expr>) -> String {
    let (result, _) = run(&EvalContext::new(), build);
    match result {
        Ok(d) => d.to_string(),
        Err(e) => format!("ERROR {}", e.code()),
    }
}

// ============================================================================
// Integer overflow
// ============================================================================

#[test]
fn test_bigint_addition_overflows_exactly_at_the_bounds() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let a: i64 = rng.gen();
        let b: i64 = match rng.gen_range(0..3) {
            0 => rng.gen(),
            1 => rng.gen_range(-1000..1000),
            _ => (i64::MAX as i128 - a as i128 + rng.gen_range(-2..3))
                .clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        };
        let expected = (a as i128) + (b as i128);
        let got = value(|b_| b_.call("+", vec![b_.int(a), b_.int(b)]));
        if expected < i64::MIN as i128 || expected > i64::MAX as i128 {
            assert_eq!(got, "ERROR 1690", "{} + {}", a, b);
        } else {
            assert_eq!(got, expected.to_string(), "{} + {}", a, b);
        }
    }
}

#[test]
fn test_overflow_message_names_the_expression() {
    let (result, _) = run(&EvalContext::new(), |b| {
        b.call("+", vec![b.int(i64::MAX), b.int(1)])
    });
    let err = result.unwrap_err();
    assert_eq!(err.code(), 1690);
    assert_eq!(
        err.to_string(),
        "BIGINT value is out of range in '(9223372036854775807 + 1)'"
    );
}

#[test]
fn test_abs_of_bigint_min() {
    assert_eq!(value(|b| b.call("ABS", vec![b.int(i64::MIN)])), "ERROR 1690");
    assert_eq!(
        value(|b| b.call("ABS", vec![b.int(-9223372036854775807)])),
        "9223372036854775807"
    );
}

#[test]
fn test_unsigned_subtraction() {
    assert_eq!(value(|b| b.call("-", vec![b.uint(1), b.int(2)])), "ERROR 1690");

    let ctx = EvalContext::builder()
        .sql_mode(SqlMode::NO_UNSIGNED_SUBTRACTION)
        .build();
    let (result, _) = run(&ctx, |b| b.call("-", vec![b.uint(1), b.int(2)]));
    assert_eq!(result.unwrap().to_string(), "-1");
}

// ============================================================================
// Casts
// ============================================================================

#[test]
fn test_signed_unsigned_casts_keep_the_bit_pattern() {
    assert_eq!(
        value(|b| b.cast(b.int(-1), "UNSIGNED")),
        "18446744073709551615"
    );
    assert_eq!(value(|b| b.cast(b.uint(u64::MAX), "SIGNED")), "-1");

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let x: i64 = rng.gen();
        let got = value(|b| {
            let unsigned = b.cast(b.int(x), "UNSIGNED")?;
            b.cast(unsigned, "SIGNED")
        });
        assert_eq!(got, x.to_string());
    }
}

#[test]
fn test_string_to_unsigned_saturates_with_warning() {
    let (result, warnings) = run(&EvalContext::new(), |b| {
        b.cast(b.text("18446744073709551616"), "UNSIGNED")
    });
    assert_eq!(result.unwrap().to_string(), "18446744073709551615");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, 1292);
}

#[test]
fn test_non_numeric_string_is_zero_with_warning() {
    let (result, warnings) = run(&EvalContext::new(), |b| {
        b.call("+", vec![b.text("abc"), b.int(1)])
    });
    assert_eq!(result.unwrap().to_string(), "1");
    assert_eq!(warnings.len(), 1);
}

// ============================================================================
// Rounding
// ============================================================================

#[test]
fn test_round_ties() {
    assert_eq!(value(|b| b.call("ROUND", vec![b.decimal("2.5")?])), "3");
    assert_eq!(value(|b| b.call("ROUND", vec![b.decimal("-2.5")?])), "-3");
    assert_eq!(value(|b| b.call("ROUND", vec![b.real(2.5)])), "2");
}

#[test]
fn test_round_float_and_decimal_formatting_differ() {
    assert_eq!(
        value(|b| b.call("ROUND", vec![b.real(123.456), b.int(4)])),
        "123.456"
    );
    assert_eq!(
        value(|b| b.call("ROUND", vec![b.decimal("123.456")?, b.int(4)])),
        "123.4560"
    );
}

#[test]
fn test_decimal_division_scale() {
    assert_eq!(value(|b| b.call("/", vec![b.int(1), b.int(3)])), "0.3333");
    let ctx = EvalContext::builder().div_precision_increment(6).build();
    let (result, _) = run(&ctx, |b| b.call("/", vec![b.int(1), b.int(3)]));
    assert_eq!(result.unwrap().to_string(), "0.333333");
}

// ============================================================================
// DECIMAL range
// ============================================================================

#[test]
fn test_decimal_arithmetic_keeps_65_digits() {
    assert_eq!(
        value(|b| b.call("+", vec![b.decimal("79228162514264337593543950335")?, b.int(1)])),
        "79228162514264337593543950336"
    );

    let e30 = format!("1{}", "0".repeat(30));
    assert_eq!(
        value(|b| b.call("*", vec![b.decimal(&e30)?, b.decimal(&e30)?])),
        format!("1{}", "0".repeat(60))
    );

    let nines = "9".repeat(65);
    assert_eq!(
        value(|b| b.call("+", vec![b.decimal(&nines)?, b.int(1)])),
        "ERROR 1690"
    );
}

#[test]
fn test_decimal_casts_are_exact_up_to_precision_65() {
    let wide = "12345678901234567890123456789012345";
    let (result, warnings) = run(&EvalContext::new(), |b| b.cast(b.text(wide), "DECIMAL(40,0)"));
    assert_eq!(result.unwrap().to_string(), wide);
    assert!(warnings.is_empty());

    let full = format!("{}.{}", "1".repeat(35), "2".repeat(30));
    let (result, warnings) = run(&EvalContext::new(), |b| b.cast(b.text(&full), "DECIMAL(65,30)"));
    assert_eq!(result.unwrap().to_string(), full);
    assert!(warnings.is_empty());
}

#[test]
fn test_round_to_thirty_decimals() {
    assert_eq!(
        value(|b| b.call("ROUND", vec![b.decimal("1.5")?, b.int(30)])),
        format!("1.5{}", "0".repeat(29))
    );
}

// ============================================================================
// Collations
// ============================================================================

#[test]
fn test_explicit_collation_conflict_is_fatal() {
    let (result, _) = run(&EvalContext::new(), |b| {
        let l = b.collate(b.text("a"), "utf8mb4_bin")?;
        let r = b.collate(b.text("a"), "utf8mb4_general_ci")?;
        b.call("=", vec![l, r])
    });
    assert_eq!(result.unwrap_err().code(), 1267);

    // Under IGNORE as well
    let ctx = EvalContext::new().with_ignore_errors(true);
    let (result, _) = run(&ctx, |b| {
        let l = b.collate(b.text("a"), "utf8mb4_bin")?;
        let r = b.collate(b.text("a"), "utf8mb4_general_ci")?;
        b.call("=", vec![l, r])
    });
    assert_eq!(result.unwrap_err().code(), 1267);
}

#[test]
fn test_comparison_uses_the_resolved_collation() {
    assert_eq!(
        value(|b| {
            let l = b.collate(b.text("A"), "utf8mb4_general_ci")?;
            b.call("=", vec![l, b.text("a")])
        }),
        "1"
    );
    assert_eq!(
        value(|b| {
            let l = b.collate(b.text("A"), "utf8mb4_bin")?;
            b.call("=", vec![l, b.text("a")])
        }),
        "0"
    );
}

#[test]
fn test_collation_resolution_is_order_independent() {
    let names = ["utf8mb4_bin", "utf8mb4_general_ci", "latin1_swedish_ci", "binary"];
    for l in names {
        for r in names {
            let forward = value(|b| {
                let x = b.call("CONVERT_USING", vec![b.text("x"), b.text(charset_of(l))])?;
                let y = b.call("CONVERT_USING", vec![b.text("y"), b.text(charset_of(r))])?;
                let c = b.call("CONCAT", vec![x, y])?;
                b.call("COLLATION", vec![c])
            });
            let backward = value(|b| {
                let y = b.call("CONVERT_USING", vec![b.text("y"), b.text(charset_of(r))])?;
                let x = b.call("CONVERT_USING", vec![b.text("x"), b.text(charset_of(l))])?;
                let c = b.call("CONCAT", vec![y, x])?;
                b.call("COLLATION", vec![c])
            });
            assert_eq!(forward, backward, "{} vs {}", l, r);
        }
    }
}

fn charset_of(collation: &str) -> &str {
    collation.split('_').next().unwrap_or(collation)
}

// ============================================================================
// Date/time
// ============================================================================

#[test]
fn test_date_add_year_month() {
    assert_eq!(
        value(|b| b.call(
            "DATE_ADD",
            vec![b.text("2011-11-11 10:10:10"), b.text("11-1"), b.text("YEAR_MONTH")]
        )),
        "2022-12-11 10:10:10"
    );
}

#[test]
fn test_month_addition_saturates_the_day() {
    assert_eq!(
        value(|b| b.call("DATE_ADD", vec![b.text("2024-01-31"), b.int(1), b.text("MONTH")])),
        "2024-02-29"
    );
}

#[test]
fn test_zero_date_depends_on_sql_mode() {
    let (result, warnings) = run(&EvalContext::new(), |b| {
        b.call("DATE", vec![b.text("0000-00-00 12:12:09")])
    });
    assert_eq!(result.unwrap().to_string(), "0000-00-00");
    assert!(warnings.is_empty());

    let strict = EvalContext::builder().sql_mode(SqlMode::NO_ZERO_DATE).build();
    let (result, _) = run(&strict, |b| b.call("DATE", vec![b.text("0000-00-00 12:12:09")]));
    assert!(result.is_err());

    let ignore = strict.with_ignore_errors(true);
    let (result, warnings) = run(&ignore, |b| {
        b.call("DATE", vec![b.text("0000-00-00 12:12:09")])
    });
    assert!(result.unwrap().is_null());
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_interval_out_of_range_is_null_with_warning() {
    let (result, warnings) = run(&EvalContext::new(), |b| {
        b.call("DATE_ADD", vec![b.text("9999-12-31"), b.int(1), b.text("DAY")])
    });
    assert!(result.unwrap().is_null());
    assert_eq!(warnings[0].code, 1441);
}

#[test]
fn test_column_values_flow_through_calls() {
    let ctx = EvalContext::new();
    let b = builder(&ctx);
    let expr = b
        .call(
            "CONCAT",
            vec![
                b.column(0, "name", FieldType::varchar(ctx.collation())),
                b.text("-"),
                b.column(1, "n", FieldType::long_long()),
            ],
        )
        .unwrap();
    let mut diag = Diagnostics::default();
    let row = [Datum::text("x"), Datum::Int(7)];
    assert_eq!(evaluate(&expr, &row, &ctx, &mut diag).unwrap().to_string(), "x-7");
    let row = [Datum::text("x"), Datum::Null];
    assert!(evaluate(&expr, &row, &ctx, &mut diag).unwrap().is_null());
}
