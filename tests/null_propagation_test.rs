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

//! NULL Propagation Tests
//!
//! Every builtin outside MySQL's NULL-aware set returns NULL as soon as an
//! argument is NULL.

use stoolap_eval::{
    evaluate, global_registry, Datum, Diagnostics, EvalContext, ExprBuilder, PlanContext,
};

/// Functions that look at NULL arguments instead of propagating them
const NULL_AWARE: &[&str] = &[
    "COALESCE", "IFNULL", "ISNULL", "IS NULL", "IS NOT NULL", "IS TRUE", "IS NOT TRUE",
    "IS FALSE", "IS NOT FALSE", "<=>", "IF", "CASE", "NULLIF", "AND", "OR", "&&", "||",
    "CONCAT_WS", "ELT", "FIELD", "MAKE_SET", "INTERVAL", "IN", "CHAR", "QUOTE", "JSON_ARRAY",
    "JSON_OBJECT", "JSON_SEARCH", "JSON_SET", "JSON_INSERT", "JSON_REPLACE", "JSON_ARRAY_APPEND",
    "JSON_ARRAY_INSERT", "JSON_MERGE_PATCH", "NAME_CONST", "ANY_VALUE", "CHARSET", "COLLATION",
    "COERCIBILITY", "RAND",
];

#[test]
fn test_null_arguments_give_null() {
    let ctx = EvalContext::new();
    let b = ExprBuilder::new(PlanContext::from_context(&ctx));
    let registry = global_registry();
    let mut checked = 0;
    for name in registry.list_scalars() {
        if NULL_AWARE.contains(&name.as_str()) {
            continue;
        }
        let Some(info) = registry.get_info(&name) else {
            continue;
        };
        let signature = info.signature();
        if signature.max_args == 0 {
            continue;
        }
        let count = signature.min_args.max(1);
        // Resolution may reject NULL where a constant is required
        let Ok(expr) = b.call(&name, (0..count).map(|_| b.null()).collect()) else {
            continue;
        };
        let mut diag = Diagnostics::default();
        let value = evaluate(&expr, &[], &ctx, &mut diag)
            .unwrap_or_else(|e| panic!("{} failed on NULL: {}", expr, e));
        assert!(value.is_null(), "{} returned {}", expr, value);
        checked += 1;
    }
    assert!(checked > 100, "only {} functions checked", checked);
}

#[test]
fn test_null_aware_functions() {
    let ctx = EvalContext::new();
    let b = ExprBuilder::new(PlanContext::from_context(&ctx));
    let eval = |name: &str, args: Vec<Datum>| {
        let args = args.into_iter().map(|d| b.literal(d)).collect();
        let expr = b.call(name, args).unwrap();
        let mut diag = Diagnostics::default();
        evaluate(&expr, &[], &ctx, &mut diag).unwrap().to_string()
    };
    assert_eq!(eval("COALESCE", vec![Datum::Null, Datum::Int(2)]), "2");
    assert_eq!(eval("IFNULL", vec![Datum::Null, Datum::Int(3)]), "3");
    assert_eq!(eval("ISNULL", vec![Datum::Null]), "1");
    assert_eq!(eval("<=>", vec![Datum::Null, Datum::Null]), "1");
    assert_eq!(eval("AND", vec![Datum::Null, Datum::Int(0)]), "0");
    assert_eq!(eval("OR", vec![Datum::Null, Datum::Int(1)]), "1");
    assert_eq!(
        eval("CONCAT_WS", vec![Datum::text(","), Datum::text("a"), Datum::Null, Datum::text("b")]),
        "a,b"
    );
    assert_eq!(eval("CONCAT", vec![Datum::text("a"), Datum::Null]), "NULL");
    assert_eq!(eval("QUOTE", vec![Datum::Null]), "NULL");
}
