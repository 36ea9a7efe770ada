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

//! Type conversion and collation functions
//!
//! - `CAST(value, 'type')` and `CONVERT(value, 'type')` - explicit conversion
//! - `CONVERT_USING(value, 'charset')` - `CONVERT(value USING charset)`
//! - `COLLATE(value, 'collation')` - `value COLLATE collation`
//! - `BINARY(value)` - `BINARY value`
//!
//! The target of a cast is written the way SQL spells it, e.g.
//! `'DECIMAL(10,2)'`, `'CHAR(5) CHARACTER SET latin1'`, `'DATETIME(3)'`.

use super::{register_all, Aux, Bound, Builtin, Signature};
use crate::collation::{self, Charset, Coercibility, Collation, Derivation, Repertoire, BINARY};
use crate::convert::{cast, CastMode};
use crate::core::types::{MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE, MAX_FSP};
use crate::core::{Datum, Error, EvalType, FieldFlags, FieldKind, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{ArgType, Call, FunctionSignature as Sig, PlanContext};

pub(super) fn register(registry: &FunctionRegistry) {
    register_all(
        registry,
        vec![
            Builtin::new("CAST", Sig::exact(2), resolve_cast, eval_cast)
                .describe("Converts a value from one data type to another"),
            Builtin::new("CONVERT", Sig::exact(2), resolve_cast, eval_cast),
            Builtin::new("CONVERT_USING", Sig::exact(2), resolve_convert_using, eval_cast)
                .describe("Converts a string into another character set"),
            Builtin::new("COLLATE", Sig::exact(2), resolve_collate, eval_collate)
                .describe("Applies a collation to a string"),
            Builtin::new("BINARY", Sig::exact(1), resolve_binary, eval_cast),
        ],
    );
}

// ============================================================================
// Cast targets
// ============================================================================

/// Parse a SQL cast target such as `UNSIGNED`, `DECIMAL(10,2)` or
/// `CHAR(3) CHARACTER SET latin1`.
///
/// `expr` is the text of the converted expression, used in precision
/// errors. Character targets without a charset use `default_collation`.
pub fn parse_cast_type(
    spec: &str,
    expr: &str,
    default_collation: &'static Collation,
) -> Result<FieldType> {
    let upper = spec.trim().to_ascii_uppercase();
    let (head, charset) = split_charset(&upper)?;
    let (name, params) = split_params(head)?;
    let bad = || Error::invalid_argument(format!("unsupported cast target '{}'", spec.trim()));

    let ty = match (name.as_str(), params.as_slice()) {
        ("SIGNED" | "SIGNED INTEGER" | "SIGNED INT" | "INTEGER" | "INT", []) => {
            FieldType::long_long()
        }
        ("UNSIGNED" | "UNSIGNED INTEGER" | "UNSIGNED INT", []) => FieldType::unsigned_long_long(),
        ("DECIMAL" | "DEC" | "NUMERIC", p) => decimal_target(p, expr)?,
        ("DOUBLE" | "DOUBLE PRECISION" | "REAL", []) => FieldType::double(),
        ("FLOAT", []) => FieldType::new(FieldKind::Float).with_flen(12),
        ("FLOAT", [p]) => match *p {
            0..=24 => FieldType::new(FieldKind::Float).with_flen(12),
            25..=53 => FieldType::double(),
            _ => {
                return Err(Error::TooBigPrecision {
                    precision: *p,
                    expr: expr.to_string(),
                    max: 53,
                })
            }
        },
        ("CHAR" | "NCHAR", p) if p.len() <= 1 => {
            let collation = match charset {
                Some(cs) => cs.default_collation(),
                None if name == "NCHAR" => Charset::Utf8mb3.default_collation(),
                None => default_collation,
            };
            let ty = FieldType::varchar(collation);
            match p.first() {
                Some(&n) => ty.with_flen(n as i32),
                None => ty,
            }
        }
        ("BINARY", []) => FieldType::varbinary(),
        ("BINARY", [n]) => FieldType::new(FieldKind::String)
            .with_collation(&BINARY)
            .with_flags(FieldFlags::BINARY)
            .with_flen(*n as i32),
        ("DATE", []) => FieldType::date(),
        ("DATETIME", p) if p.len() <= 1 => FieldType::datetime(fsp_param(p, expr)?),
        ("TIME", p) if p.len() <= 1 => FieldType::duration(fsp_param(p, expr)?),
        ("YEAR", []) => FieldType::year(),
        ("JSON", []) => FieldType::json(),
        _ => return Err(bad()),
    };
    if charset.is_some() && ty.eval_type() != EvalType::String {
        return Err(bad());
    }
    Ok(ty)
}

/// Strip a trailing `CHARACTER SET name`, `CHARSET name`, `ASCII` or
/// `UNICODE` clause
fn split_charset(spec: &str) -> Result<(&str, Option<Charset>)> {
    for marker in [" CHARACTER SET ", " CHARSET "] {
        if let Some(pos) = spec.find(marker) {
            let name = spec[pos + marker.len()..].trim();
            return Ok((spec[..pos].trim(), Some(Charset::from_name(name)?)));
        }
    }
    if let Some(head) = spec.strip_suffix(" ASCII") {
        return Ok((head.trim(), Some(Charset::Latin1)));
    }
    if let Some(head) = spec.strip_suffix(" UNICODE") {
        return Ok((head.trim(), Some(Charset::Utf8mb4)));
    }
    Ok((spec, None))
}

/// Split `NAME(a,b)` into the name and its numeric parameters
fn split_params(spec: &str) -> Result<(String, Vec<u32>)> {
    let Some(open) = spec.find('(') else {
        return Ok((normalize_spaces(spec), Vec::new()));
    };
    let close = spec
        .rfind(')')
        .filter(|&c| c > open && spec[c + 1..].trim().is_empty())
        .ok_or_else(|| Error::invalid_argument(format!("malformed cast target '{}'", spec)))?;
    let params = spec[open + 1..close]
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<u32>()
                .map_err(|_| Error::invalid_argument(format!("malformed cast target '{}'", spec)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((normalize_spaces(&spec[..open]), params))
}

fn normalize_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decimal_target(params: &[u32], expr: &str) -> Result<FieldType> {
    let (precision, scale) = match params {
        [] => (10, 0),
        [m] => (*m, 0),
        [m, d] => (*m, *d),
        _ => return Err(Error::invalid_argument("DECIMAL takes at most two parameters")),
    };
    if precision > MAX_DECIMAL_PRECISION {
        return Err(Error::TooBigPrecision {
            precision,
            expr: expr.to_string(),
            max: MAX_DECIMAL_PRECISION,
        });
    }
    if scale > MAX_DECIMAL_SCALE {
        return Err(Error::TooBigScale {
            scale,
            expr: expr.to_string(),
            max: MAX_DECIMAL_SCALE,
        });
    }
    if precision < scale {
        return Err(Error::MBiggerThanD(expr.to_string()));
    }
    // DECIMAL(0) means DECIMAL(10)
    let precision = if precision == 0 { 10 } else { precision };
    Ok(FieldType::new_decimal(precision as i32, scale as i32))
}

fn fsp_param(params: &[u32], expr: &str) -> Result<u8> {
    match params.first() {
        None => Ok(0),
        Some(&p) if p <= MAX_FSP as u32 => Ok(p as u8),
        Some(&p) => Err(Error::TooBigPrecision {
            precision: p,
            expr: expr.to_string(),
            max: MAX_FSP as u32,
        }),
    }
}

/// Derivation of a cast to `ty`
fn cast_derivation(ty: &FieldType, arg: &ArgType) -> Derivation {
    let repertoire = if arg.eval_type() == EvalType::String {
        arg.derivation.repertoire
    } else {
        Repertoire::Ascii
    };
    Derivation::new(ty.collation, Coercibility::Implicit, repertoire)
}

// ============================================================================
// Resolution
// ============================================================================

fn resolve_cast(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let spec = args[1]
        .const_text()
        .ok_or_else(|| Error::incorrect_arguments(""))?;
    let ty = parse_cast_type(&spec, &args[0].display, plan.collation)?;
    let mut sig = Signature::new(ty.clone());
    if ty.eval_type() == EvalType::String {
        sig = sig.derivation(cast_derivation(&ty, &args[0]));
    }
    Ok(sig)
}

fn resolve_convert_using(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let name = args[1]
        .const_text()
        .ok_or_else(|| Error::incorrect_arguments(""))?;
    let collation = Charset::from_name(name.trim())?.default_collation();
    let ty = FieldType::varchar(collation);
    Ok(Signature::new(ty.clone()).derivation(cast_derivation(&ty, &args[0])))
}

fn resolve_binary(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let ty = FieldType::varbinary();
    Ok(Signature::new(ty.clone()).derivation(cast_derivation(&ty, &args[0])))
}

/// `expr COLLATE name`: the collation must belong to the operand's charset
fn resolve_collate(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let name = args[1]
        .const_text()
        .ok_or_else(|| Error::incorrect_arguments(""))?;
    let operand = &args[0];
    let (charset, repertoire) = match operand.eval_type() {
        EvalType::String | EvalType::Json if !operand.is_null() => {
            (operand.derivation.charset(), operand.derivation.repertoire)
        }
        _ => (plan.collation.charset, Repertoire::Ascii),
    };
    let collation = collation::for_charset(name.trim(), charset)?;
    let ty = FieldType::varchar(collation);
    let cast = (operand.eval_type() != EvalType::String && !operand.is_null()).then(|| ty.clone());
    Ok(Signature::new(ty)
        .casts(vec![cast, None])
        .derivation(Derivation::new(collation, Coercibility::Explicit, repertoire))
        .aux(Aux::Collation(collation)))
}

// ============================================================================
// Evaluation
// ============================================================================

fn eval_cast(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    cast(args[0].clone(), &b.ret, CastMode::Explicit, call.ctx, call.diag)
}

fn eval_collate(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(match b.aux {
        Aux::Collation(c) => args[0].clone().with_collation(c),
        _ => args[0].clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{dec, eval, eval_with, f, i, s};
    use super::*;
    use crate::collation::{LATIN1_SWEDISH_CI, UTF8MB4_0900_AI_CI, UTF8MB4_BIN};
    use crate::diagnostics::Diagnostics;
    use crate::eval::EvalContext;

    fn run(name: &str, args: &[Datum]) -> (Result<Datum>, Diagnostics) {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let r = eval_with(name, args, &ctx, &mut diag);
        (r, diag)
    }

    #[test]
    fn test_parse_cast_type() {
        let c = &UTF8MB4_0900_AI_CI;
        assert_eq!(parse_cast_type("signed", "x", c).unwrap(), FieldType::long_long());
        assert_eq!(
            parse_cast_type("UNSIGNED INTEGER", "x", c).unwrap(),
            FieldType::unsigned_long_long()
        );
        assert_eq!(
            parse_cast_type("decimal(10, 2)", "x", c).unwrap(),
            FieldType::new_decimal(10, 2)
        );
        assert_eq!(parse_cast_type("DECIMAL", "x", c).unwrap(), FieldType::new_decimal(10, 0));
        assert_eq!(parse_cast_type("datetime(3)", "x", c).unwrap(), FieldType::datetime(3));
        let ty = parse_cast_type("char(4) character set latin1", "x", c).unwrap();
        assert_eq!(ty.collation.name, "latin1_swedish_ci");
        assert_eq!(ty.flen, 4);
        assert!(parse_cast_type("BIGINT", "x", c).is_err());
        assert!(parse_cast_type("SIGNED CHARSET latin1", "x", c).is_err());
    }

    #[test]
    fn test_precision_errors() {
        assert_eq!(eval("CAST", &[dec("1.5"), s("DECIMAL(66,0)")]), "ERROR 1426");
        assert_eq!(eval("CAST", &[dec("1.5"), s("DECIMAL(65,31)")]), "ERROR 1425");
        assert_eq!(eval("CAST", &[dec("1.5"), s("DECIMAL(2,3)")]), "ERROR 1427");
        assert_eq!(eval("CAST", &[s("10:00:00"), s("TIME(7)")]), "ERROR 1426");

        let err = parse_cast_type("DECIMAL(66,0)", "1.5", &UTF8MB4_0900_AI_CI).unwrap_err();
        assert_eq!(err.to_string(), "Too-big precision 66 specified for '1.5'. Maximum is 65.");
    }

    #[test]
    fn test_signed_unsigned_bit_patterns() {
        assert_eq!(eval("CAST", &[i(-1), s("UNSIGNED")]), "18446744073709551615");
        assert_eq!(eval("CAST", &[Datum::UInt(u64::MAX), s("SIGNED")]), "-1");
        assert_eq!(eval("CAST", &[Datum::UInt(1 << 63), s("SIGNED")]), "-9223372036854775808");

        let (r, diag) = run("CAST", &[s("18446744073709551616"), s("UNSIGNED")]);
        assert_eq!(r.unwrap().to_string(), "18446744073709551615");
        assert_eq!(diag.warnings()[0].code, 1292);
    }

    #[test]
    fn test_numeric_targets() {
        assert_eq!(eval("CAST", &[dec("123.456"), s("DECIMAL(5,2)")]), "123.46");
        assert_eq!(eval("CONVERT", &[dec("3.5"), s("SIGNED")]), "4");
        assert_eq!(eval("CONVERT", &[dec("-3.5"), s("SIGNED")]), "-4");
        assert_eq!(eval("CAST", &[s("12abc"), s("SIGNED")]), "12");
        assert_eq!(eval("CAST", &[i(7), s("DOUBLE")]), "7");
        assert_eq!(eval("CAST", &[f(2.5), s("DECIMAL(4,1)")]), "2.5");

        let (r, diag) = run("CAST", &[dec("1234.5"), s("DECIMAL(4,1)")]);
        assert_eq!(r.unwrap().to_string(), "999.9");
        assert_eq!(diag.warnings()[0].code, 1264);
    }

    #[test]
    fn test_string_targets() {
        let (r, diag) = run("CAST", &[s("abcdef"), s("CHAR(3)")]);
        assert_eq!(r.unwrap().to_string(), "abc");
        assert_eq!(diag.warnings()[0].code, 1292);

        assert_eq!(eval("CAST", &[i(42), s("CHAR")]), "42");

        let (r, _) = run("CAST", &[s("ab"), s("BINARY(4)")]);
        assert_eq!(r.unwrap().as_bytes(), Some(&b"ab\0\0"[..]));

        let (r, _) = run("BINARY", &[s("Ab")]);
        assert_eq!(r.unwrap().as_bytes(), Some(&b"Ab"[..]));
    }

    #[test]
    fn test_temporal_targets() {
        assert_eq!(
            eval("CAST", &[s("2011-02-03 04:05:06.7"), s("DATETIME")]),
            "2011-02-03 04:05:07"
        );
        assert_eq!(
            eval("CAST", &[s("2011-02-03 04:05:06.789"), s("DATETIME(2)")]),
            "2011-02-03 04:05:06.79"
        );
        assert_eq!(eval("CAST", &[i(20110203), s("DATE")]), "2011-02-03");
        assert_eq!(eval("CAST", &[s("12:34:56"), s("TIME")]), "12:34:56");
        assert_eq!(eval("CAST", &[s("1999"), s("YEAR")]), "1999");
    }

    #[test]
    fn test_json_target() {
        assert_eq!(eval("CAST", &[s(r#"{"a":1}"#), s("JSON")]), r#"{"a": 1}"#);
        assert_eq!(eval("CAST", &[i(5), s("JSON")]), "5");
        assert_eq!(eval("CAST", &[s("{bad"), s("JSON")]), "ERROR 3140");
    }

    #[test]
    fn test_convert_using() {
        let (r, _) = run("CONVERT_USING", &[s("a€"), s("latin1")]);
        let r = r.unwrap();
        assert_eq!(r.to_string(), "a?");
        assert_eq!(r.collation(), Some(&LATIN1_SWEDISH_CI));
        assert_eq!(eval("CONVERT_USING", &[s("abc"), s("klingon")]), "ERROR 1115");
    }

    #[test]
    fn test_collate() {
        let (r, _) = run("COLLATE", &[s("a"), s("utf8mb4_bin")]);
        assert_eq!(r.unwrap().collation(), Some(&UTF8MB4_BIN));
        assert_eq!(eval("COLLATE", &[s("a"), s("no_such_collation")]), "ERROR 1273");
        assert_eq!(eval("COLLATE", &[s("a"), s("latin1_bin")]), "ERROR 1253");
        assert_eq!(eval("COLLATE", &[Datum::Null, s("utf8mb4_bin")]), "NULL");
    }
}
