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

//! Resolved expression trees
//!
//! An [`Expr`] is the plan-side form of a scalar expression: column
//! references, typed constants, and calls whose function has already been
//! resolved against the static types of their arguments. [`ExprBuilder`]
//! builds such trees by name, so every call site is bound exactly once.

use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;

use crate::collation::{Collation, Derivation, UTF8MB4_0900_AI_CI};
use crate::core::{decimal, Datum, Decimal, Error, FieldType, Result};
use crate::functions::{
    global_registry, literal_text, ArgType, FunctionRegistry, PlanContext, Resolution,
};

/// Infer the static type of a constant
pub fn literal_type(value: &Datum) -> FieldType {
    match value {
        Datum::Null => FieldType::null(),
        Datum::Int(_) => FieldType::long_long(),
        Datum::UInt(_) => FieldType::unsigned_long_long(),
        Datum::Float(_) => FieldType::double(),
        Datum::Decimal(v) => {
            let scale = v.scale() as i32;
            FieldType::new_decimal(decimal::int_digits(v) as i32 + scale, scale)
        }
        Datum::Str { collation, .. } => FieldType::varchar(collation),
        Datum::Bytes(_) => FieldType::varbinary(),
        Datum::Date(_) => FieldType::date(),
        Datum::DateTime(t) => FieldType::datetime(t.fsp),
        Datum::Duration(d) => FieldType::duration(d.fsp()),
        Datum::Enum { .. } | Datum::Set { .. } => FieldType::varchar(&UTF8MB4_0900_AI_CI),
        Datum::Json(_) => FieldType::json(),
    }
}

// ============================================================================
// Tree nodes
// ============================================================================

/// Reference to a column of the input row or chunk
#[derive(Debug, Clone)]
pub struct ColumnRef {
    pub index: usize,
    pub name: CompactString,
    pub ty: FieldType,
}

/// A constant with its static type
#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Datum,
    pub ty: FieldType,
}

/// A call bound to its implementation
#[derive(Debug, Clone)]
pub struct FunctionCall {
    /// Name the call was built with, upper case
    pub name: CompactString,
    pub args: Vec<Expr>,
    pub resolution: Resolution,
}

/// A resolved scalar expression
///
/// Trees are immutable once built and can be shared between threads.
#[derive(Debug, Clone)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    Call(Box<FunctionCall>),
}

impl Expr {
    /// Static result type
    pub fn field_type(&self) -> &FieldType {
        match self {
            Expr::Column(c) => &c.ty,
            Expr::Literal(l) => &l.ty,
            Expr::Call(f) => &f.resolution.return_type,
        }
    }

    /// True for constants
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    /// True when any call in the tree is volatile
    pub fn is_volatile(&self) -> bool {
        match self {
            Expr::Call(f) => {
                f.resolution.implementation.is_volatile() || f.args.iter().any(Expr::is_volatile)
            }
            _ => false,
        }
    }

    /// How this expression looks to the function it is passed to
    pub fn arg_type(&self) -> ArgType {
        match self {
            Expr::Column(c) => ArgType::new(c.ty.clone(), c.name.as_str()),
            Expr::Literal(l) => ArgType::constant(l.value.clone(), l.ty.clone()),
            Expr::Call(f) => ArgType::new(f.resolution.return_type.clone(), self.to_string())
                .with_derivation(f.resolution.derivation),
        }
    }

    /// Collation attributes of the result
    pub fn derivation(&self) -> Derivation {
        self.arg_type().derivation
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Infix spelling of a binary operator
fn infix(name: &str) -> Option<&'static str> {
    Some(match name {
        "+" => "+",
        "-" => "-",
        "*" => "*",
        "/" => "/",
        "DIV" => "DIV",
        "MOD" | "%" => "%",
        "=" => "=",
        "<=>" => "<=>",
        "<>" | "!=" => "<>",
        "<" => "<",
        "<=" => "<=",
        ">" => ">",
        ">=" => ">=",
        "AND" | "&&" => "and",
        "OR" | "||" => "or",
        "XOR" => "xor",
        "&" => "&",
        "|" => "|",
        "^" => "^",
        "<<" => "<<",
        ">>" => ">>",
        "REGEXP" | "RLIKE" => "regexp",
        _ => return None,
    })
}

fn join(args: &[Expr]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = &self.args;
        match (self.name.as_str(), a.len()) {
            (name, 2) if infix(name).is_some() => {
                write!(f, "({} {} {})", a[0], infix(name).unwrap_or(name), a[1])
            }
            ("UNARY_MINUS", 1) => write!(f, "-({})", a[0]),
            ("NOT" | "!", 1) => write!(f, "(not({}))", a[0]),
            ("~", 1) => write!(f, "~({})", a[0]),
            ("IS NULL" | "IS NOT NULL" | "IS TRUE" | "IS NOT TRUE" | "IS FALSE"
            | "IS NOT FALSE", 1) => {
                write!(f, "({} {})", a[0], self.name.to_ascii_lowercase())
            }
            ("LIKE", 2) => write!(f, "({} like {})", a[0], a[1]),
            ("LIKE", 3) => write!(f, "({} like {} escape {})", a[0], a[1], a[2]),
            ("BETWEEN", 3) => write!(f, "({} between {} and {})", a[0], a[1], a[2]),
            ("IN", n) if n > 1 => write!(f, "({} in ({}))", a[0], join(&a[1..])),
            ("CAST" | "CONVERT", 2) => write!(f, "cast({} as {})", a[0], type_text(&a[1])),
            ("CONVERT_USING", 2) => write!(f, "convert({} using {})", a[0], type_text(&a[1])),
            ("COLLATE", 2) => write!(f, "({} collate {})", a[0], type_text(&a[1])),
            ("BINARY", 1) => write!(f, "cast({} as char charset binary)", a[0]),
            (name, _) => write!(f, "{}({})", name.to_ascii_lowercase(), join(a)),
        }
    }
}

/// Constant operand spelled without quotes (type names, collation names)
fn type_text(expr: &Expr) -> String {
    match expr {
        Expr::Literal(Literal { value, .. }) if !value.is_null() => {
            value.to_string().to_ascii_lowercase()
        }
        other => other.to_string(),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "`{}`", c.name),
            Expr::Literal(l) => f.write_str(&literal_text(&l.value)),
            Expr::Call(call) => call.fmt(f),
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds resolved expression trees against a function registry
///
/// ```ignore
/// let b = ExprBuilder::new(PlanContext::default());
/// let sum = b.call("+", vec![b.column(0, "a", FieldType::long_long()), b.int(1)])?;
/// assert_eq!(sum.to_string(), "(`a` + 1)");
/// ```
#[derive(Clone, Copy)]
pub struct ExprBuilder<'a> {
    registry: &'a FunctionRegistry,
    plan: PlanContext,
}

impl ExprBuilder<'static> {
    /// Builder over the global registry
    pub fn new(plan: PlanContext) -> Self {
        Self {
            registry: global_registry(),
            plan,
        }
    }
}

impl<'a> ExprBuilder<'a> {
    /// Builder over a custom registry
    pub fn with_registry(registry: &'a FunctionRegistry, plan: PlanContext) -> Self {
        Self { registry, plan }
    }

    pub fn plan(&self) -> &PlanContext {
        &self.plan
    }

    pub fn column(&self, index: usize, name: &str, ty: FieldType) -> Expr {
        Expr::Column(ColumnRef {
            index,
            name: CompactString::from(name),
            ty,
        })
    }

    /// Constant whose type is inferred from the value
    pub fn literal(&self, value: Datum) -> Expr {
        let ty = literal_type(&value);
        Expr::Literal(Literal { value, ty })
    }

    /// Constant of an explicit type
    pub fn typed_literal(&self, value: Datum, ty: FieldType) -> Expr {
        Expr::Literal(Literal { value, ty })
    }

    pub fn null(&self) -> Expr {
        self.literal(Datum::Null)
    }

    pub fn int(&self, value: i64) -> Expr {
        self.literal(Datum::Int(value))
    }

    pub fn uint(&self, value: u64) -> Expr {
        self.literal(Datum::UInt(value))
    }

    pub fn real(&self, value: f64) -> Expr {
        self.literal(Datum::Float(value))
    }

    /// Exact-value literal such as `2.50`; trailing zeros set the scale
    pub fn decimal(&self, text: &str) -> Result<Expr> {
        let value = Decimal::from_str(text.trim())
            .map_err(|e| Error::invalid_argument(format!("bad decimal literal '{}': {}", text, e)))?;
        Ok(self.literal(Datum::Decimal(value)))
    }

    /// String literal in the connection collation
    pub fn text(&self, value: &str) -> Expr {
        self.literal(Datum::text_in(value, self.plan.collation))
    }

    /// String literal with an introducer collation, e.g. `_latin1'abc'`
    pub fn text_in(&self, value: &str, collation: &'static Collation) -> Expr {
        self.literal(Datum::text_in(value, collation))
    }

    /// Hex or bit literal
    pub fn bytes(&self, value: &[u8]) -> Expr {
        self.literal(Datum::bytes(value))
    }

    /// Resolve `name` over `args`
    ///
    /// Fails with the plan-time errors of the function: unknown name,
    /// wrong argument count, collation conflicts, non-constant arguments
    /// where a constant is required.
    pub fn call(&self, name: &str, args: Vec<Expr>) -> Result<Expr> {
        let types: Vec<ArgType> = args.iter().map(Expr::arg_type).collect();
        let resolution = self.registry.resolve_scalar(name, &types, &self.plan)?;
        Ok(Expr::Call(Box::new(FunctionCall {
            name: CompactString::from(name.to_ascii_uppercase()),
            args,
            resolution,
        })))
    }

    /// `CAST(expr AS target)` where `target` is a type such as `DECIMAL(10,2)`
    pub fn cast(&self, expr: Expr, target: &str) -> Result<Expr> {
        let target = self.text(target);
        self.call("CAST", vec![expr, target])
    }

    /// `CONVERT(expr USING charset)`
    pub fn convert_using(&self, expr: Expr, charset: &str) -> Result<Expr> {
        let charset = self.text(charset);
        self.call("CONVERT_USING", vec![expr, charset])
    }

    /// `expr COLLATE name`
    pub fn collate(&self, expr: Expr, collation: &str) -> Result<Expr> {
        let collation = self.text(collation);
        self.call("COLLATE", vec![expr, collation])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::{UTF8MB4_BIN, UTF8MB4_GENERAL_CI};
    use crate::core::EvalType;

    fn builder() -> ExprBuilder<'static> {
        ExprBuilder::new(PlanContext::default())
    }

    #[test]
    fn test_literal_types() {
        let b = builder();
        assert_eq!(*b.int(1).field_type(), FieldType::long_long());
        assert_eq!(*b.uint(1).field_type(), FieldType::unsigned_long_long());
        let d = b.decimal("12.340").unwrap();
        assert_eq!(d.field_type().flen, 5);
        assert_eq!(d.field_type().decimal, 3);
        assert!(b.decimal("1.2.3").is_err());
        assert_eq!(b.null().field_type().eval_type(), EvalType::String);
        assert!(b.text("x").is_constant());
    }

    #[test]
    fn test_call_resolution() {
        let b = builder();
        let a = b.column(0, "a", FieldType::long_long());
        let e = b.call("+", vec![a, b.int(1)]).unwrap();
        assert_eq!(e.field_type().eval_type(), EvalType::Int);
        assert!(!e.is_constant());
        assert!(!e.is_volatile());

        let err = b.call("NO_SUCH_FUNCTION", vec![]).unwrap_err();
        assert_eq!(err.code(), 1305);
        let err = b.call("ABS", vec![b.int(1), b.int(2)]).unwrap_err();
        assert_eq!(err.code(), 1582);
    }

    #[test]
    fn test_volatile_propagates() {
        let b = builder();
        let r = b.call("RAND", vec![]).unwrap();
        let e = b.call("*", vec![r, b.int(10)]).unwrap();
        assert!(e.is_volatile());
    }

    #[test]
    fn test_cast_and_collate() {
        let b = builder();
        let e = b.cast(b.int(-1), "UNSIGNED").unwrap();
        assert!(e.field_type().is_unsigned());
        assert_eq!(e.to_string(), "cast(-1 as unsigned)");

        let c = b.collate(b.text("a"), "utf8mb4_bin").unwrap();
        assert_eq!(c.derivation().collation.name, UTF8MB4_BIN.name);
        assert_eq!(c.to_string(), "('a' collate utf8mb4_bin)");

        assert_eq!(b.collate(b.text("a"), "no_such").unwrap_err().code(), 1273);
        assert_eq!(b.collate(b.text("a"), "latin1_bin").unwrap_err().code(), 1253);
    }

    #[test]
    fn test_collation_conflict_at_plan_time() {
        let b = builder();
        let l = b.collate(b.text("a"), "utf8mb4_bin").unwrap();
        let r = b.collate(b.text("a"), "utf8mb4_general_ci").unwrap();
        let err = b.call("=", vec![l, r]).unwrap_err();
        assert_eq!(err.code(), 1267);

        let col = b.column(0, "s", FieldType::varchar(&UTF8MB4_GENERAL_CI));
        let ok = b.call("=", vec![col, b.text("x")]).unwrap();
        assert_eq!(ok.field_type().eval_type(), EvalType::Int);
    }

    #[test]
    fn test_render() {
        let b = builder();
        let a = b.column(0, "a", FieldType::long_long());
        let sum = b.call("+", vec![a.clone(), b.int(1)]).unwrap();
        assert_eq!(sum.to_string(), "(`a` + 1)");
        let neg = b.call("UNARY_MINUS", vec![sum]).unwrap();
        assert_eq!(neg.to_string(), "-((`a` + 1))");
        let f = b.call("concat", vec![b.text("x"), a.clone()]).unwrap();
        assert_eq!(f.to_string(), "concat('x',`a`)");
        let isnull = b.call("IS NULL", vec![a.clone()]).unwrap();
        assert_eq!(isnull.to_string(), "(`a` is null)");
        let within = b
            .call("BETWEEN", vec![a.clone(), b.int(1), b.int(5)])
            .unwrap();
        assert_eq!(within.to_string(), "(`a` between 1 and 5)");
        let member = b.call("IN", vec![a, b.int(1), b.int(2)]).unwrap();
        assert_eq!(member.to_string(), "(`a` in (1,2))");
    }
}
