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

//! Function Registry Tests
//!
//! Lookup by name, arity checks, and registering functions of one's own.

use std::sync::Arc;

use stoolap_eval::collation::BINARY;
use stoolap_eval::functions::Call;
use stoolap_eval::{
    evaluate, global_registry, ArgType, Datum, Derivation, Diagnostics, EvalContext, ExprBuilder,
    FieldType, FunctionImpl, FunctionInfo, FunctionRegistry, FunctionSignature, FunctionType,
    PlanContext, Resolution, Result, ScalarFunction,
};

/// `TWICE(x)`: x * 2 over BIGINT, wrapping
struct Twice;

struct TwiceImpl;

impl FunctionImpl for TwiceImpl {
    fn eval_row(&self, args: &[Datum], _call: &mut Call<'_>) -> Result<Datum> {
        Ok(Datum::Int(args[0].as_int().unwrap_or(0).wrapping_mul(2)))
    }
}

impl ScalarFunction for Twice {
    fn name(&self) -> &str {
        "TWICE"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new("TWICE", FunctionType::Scalar, "Doubles a number", FunctionSignature::exact(1))
    }

    fn resolve(&self, args: &[ArgType], _plan: &PlanContext) -> Result<Resolution> {
        FunctionSignature::exact(1).validate_arg_count("TWICE", args.len())?;
        Ok(Resolution {
            return_type: FieldType::long_long(),
            derivation: Derivation::numeric(&BINARY),
            casts: vec![Some(FieldType::long_long())],
            implementation: Arc::new(TwiceImpl),
        })
    }
}

#[test]
fn test_lookup_is_case_insensitive() {
    let registry = global_registry();
    assert!(registry.is_scalar("concat"));
    assert!(registry.is_scalar("Concat"));
    assert!(registry.is_aggregate("group_concat"));
    assert!(!registry.exists("no_such_function"));
    assert_eq!(registry.get_info("abs").unwrap().name(), "ABS");
}

#[test]
fn test_registry_size() {
    let registry = global_registry();
    assert!(registry.list_scalars().len() >= 230);
    assert!(registry.list_aggregates().len() >= 9);
}

#[test]
fn test_arity_is_checked_at_plan_time() {
    let b = ExprBuilder::new(PlanContext::default());
    let err = b.call("LEFT", vec![b.text("abc")]).unwrap_err();
    assert_eq!(err.code(), 1582);
    assert_eq!(err.to_string(), "Incorrect parameter count in the call to native function 'LEFT'");
}

#[test]
fn test_custom_function() {
    let registry = FunctionRegistry::new();
    registry.register_scalar(Arc::new(Twice));
    assert!(registry.is_scalar("twice"));
    assert!(!global_registry().is_scalar("twice"));

    let b = ExprBuilder::with_registry(&registry, PlanContext::default());
    let expr = b.call("twice", vec![b.text("21")]).unwrap();
    let ctx = EvalContext::new();
    let mut diag = Diagnostics::default();
    assert_eq!(evaluate(&expr, &[], &ctx, &mut diag).unwrap().to_string(), "42");

    // NULL propagates without calling the implementation
    let expr = b.call("twice", vec![b.null()]).unwrap();
    assert!(evaluate(&expr, &[], &ctx, &mut diag).unwrap().is_null());

    assert_eq!(b.call("twice", vec![]).unwrap_err().code(), 1582);
}

#[test]
fn test_empty_registry() {
    let registry = FunctionRegistry::empty();
    let b = ExprBuilder::with_registry(&registry, PlanContext::default());
    assert_eq!(b.call("ABS", vec![b.int(1)]).unwrap_err().code(), 1305);
}
