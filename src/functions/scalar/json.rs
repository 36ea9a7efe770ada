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

//! JSON Functions
//!
//! Document arguments accept JSON values and JSON text; any other kind is
//! rejected. Value arguments (array elements, object members, values
//! written by `JSON_SET`) are wrapped as JSON scalars and never parsed, so
//! `JSON_ARRAY('[1]')` holds the string `"[1]"`.

use base64::Engine;

use super::like::LikePattern;
use super::{int_type, register_all, string_type, text_of, Bound, Builtin, Signature};
use crate::collation::UTF8MB4_BIN;
use crate::convert::number_json;
use crate::core::json::{self, Json, JsonPath, ModifyMode, PathLeg};
use crate::core::{Datum, Error, FieldFlags, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{ArgType, Call, FunctionSignature as Sig, PlanContext};

pub(super) fn register(registry: &FunctionRegistry) {
    register_all(
        registry,
        vec![
            // Constructors
            Builtin::new("JSON_ARRAY", Sig::variadic(0), resolve_json, eval_array)
                .tolerant()
                .describe("JSON array of the arguments"),
            Builtin::new("JSON_OBJECT", Sig::variadic(0), resolve_pairs, eval_object)
                .tolerant()
                .describe("JSON object from key/value pairs"),
            Builtin::new("JSON_QUOTE", Sig::exact(1), resolve_text, eval_quote),
            // Inspection
            Builtin::new("JSON_EXTRACT", Sig::variadic(2), resolve_json, eval_extract)
                .describe("Values at one or more paths"),
            Builtin::new("JSON_UNQUOTE", Sig::exact(1), resolve_text, eval_unquote),
            Builtin::new("JSON_TYPE", Sig::exact(1), resolve_text, eval_type),
            Builtin::new("JSON_VALID", Sig::exact(1), resolve_bool, eval_valid),
            Builtin::new("JSON_LENGTH", Sig::new(1, 2), resolve_int, eval_length),
            Builtin::new("JSON_DEPTH", Sig::exact(1), resolve_int, eval_depth),
            Builtin::new("JSON_KEYS", Sig::new(1, 2), resolve_json, eval_keys),
            Builtin::new("JSON_CONTAINS", Sig::new(2, 3), resolve_bool, eval_contains),
            Builtin::new("JSON_CONTAINS_PATH", Sig::variadic(3), resolve_bool, eval_contains_path),
            Builtin::new("JSON_OVERLAPS", Sig::exact(2), resolve_bool, eval_overlaps),
            Builtin::new("MEMBER_OF", Sig::exact(2), resolve_bool, eval_member_of)
                .describe("value MEMBER OF (json_array)"),
            Builtin::new("JSON_SEARCH", Sig::variadic(3), resolve_json, eval_search)
                .tolerant()
                .describe("Paths of strings matching a LIKE pattern"),
            Builtin::new("JSON_PRETTY", Sig::exact(1), resolve_text, eval_pretty),
            Builtin::new("JSON_STORAGE_SIZE", Sig::exact(1), resolve_int, eval_storage_size),
            // Modification
            Builtin::new("JSON_SET", Sig::variadic(3), resolve_modify, eval_set)
                .tolerant()
                .describe("Insert or replace values"),
            Builtin::new("JSON_INSERT", Sig::variadic(3), resolve_modify, eval_insert).tolerant(),
            Builtin::new("JSON_REPLACE", Sig::variadic(3), resolve_modify, eval_replace).tolerant(),
            Builtin::new("JSON_REMOVE", Sig::variadic(2), resolve_json, eval_remove),
            Builtin::new("JSON_ARRAY_APPEND", Sig::variadic(3), resolve_modify, eval_array_append)
                .tolerant(),
            Builtin::new("JSON_ARRAY_INSERT", Sig::variadic(3), resolve_modify, eval_array_insert)
                .tolerant(),
            Builtin::new("JSON_MERGE_PRESERVE", Sig::variadic(2), resolve_json, eval_merge_preserve)
                .describe("Merge documents, keeping duplicate members"),
            Builtin::new("JSON_MERGE", Sig::variadic(2), resolve_json, eval_merge_preserve),
            Builtin::new("JSON_MERGE_PATCH", Sig::variadic(2), resolve_json, eval_merge_patch)
                .tolerant()
                .describe("RFC 7396 merge of documents"),
        ],
    );
}

// ============================================================================
// Resolution
// ============================================================================

fn resolve_json(_args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::json()))
}

fn resolve_pairs(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    if args.len() % 2 != 0 {
        return Err(Error::WrongParamCount(String::new()));
    }
    resolve_json(args, plan)
}

/// Document, then path/value pairs
fn resolve_modify(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    if args.len() % 2 != 1 {
        return Err(Error::WrongParamCount(String::new()));
    }
    resolve_json(args, plan)
}

fn resolve_text(_args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(&UTF8MB4_BIN)))
}

fn resolve_bool(_args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::boolean()))
}

fn resolve_int(_args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(int_type()))
}

// ============================================================================
// Argument helpers
// ============================================================================

fn function_name(b: &Bound) -> String {
    b.name.to_ascii_lowercase()
}

/// Document argument `idx`; `None` when invalid text was downgraded
fn doc_arg(args: &[Datum], idx: usize, b: &Bound, call: &mut Call<'_>) -> Result<Option<Json>> {
    match &args[idx] {
        Datum::Json(j) => Ok(Some((**j).clone())),
        Datum::Null => Ok(None),
        Datum::Str { text, .. } => match json::parse(text) {
            Ok(doc) => Ok(Some(doc)),
            Err(detail) => {
                call.observe(Error::invalid_json_text(idx + 1, function_name(b), detail))?;
                Ok(None)
            }
        },
        _ => Err(Error::InvalidJsonCharset {
            arg: idx + 1,
            function: function_name(b),
        }),
    }
}

/// JSON scalar for a value argument
fn value_json(d: &Datum, ty: &FieldType) -> Json {
    match d {
        Datum::Null => Json::Null,
        Datum::Json(j) => (**j).clone(),
        Datum::Int(v) if ty.flags.contains(FieldFlags::IS_BOOLEAN) => Json::Bool(*v != 0),
        Datum::Int(_) | Datum::UInt(_) | Datum::Float(_) | Datum::Decimal(_) => number_json(d),
        Datum::Bytes(b) => Json::String(format!(
            "base64:type15:{}",
            base64::engine::general_purpose::STANDARD.encode(b)
        )),
        other => Json::String(text_of(other).into_owned()),
    }
}

fn value_arg(args: &[Datum], idx: usize, b: &Bound) -> Json {
    match b.args.get(idx) {
        Some(ty) => value_json(&args[idx], ty),
        None => value_json(&args[idx], &FieldType::null()),
    }
}

fn path_arg(d: &Datum) -> Result<JsonPath> {
    JsonPath::parse(&text_of(d))
}

fn json_result(doc: Json) -> Datum {
    Datum::json(doc)
}

fn one_or_all(d: &Datum, b: &Bound) -> Result<bool> {
    match text_of(d).to_ascii_lowercase().as_str() {
        "one" => Ok(false),
        "all" => Ok(true),
        _ => Err(Error::JsonOneOrAll(function_name(b))),
    }
}

// ============================================================================
// Constructors
// ============================================================================

fn eval_array(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let items = (0..args.len()).map(|i| value_arg(args, i, b)).collect();
    Ok(json_result(Json::Array(items)))
}

fn eval_object(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let mut map = serde_json::Map::new();
    for i in (0..args.len()).step_by(2) {
        if args[i].is_null() {
            return Err(Error::JsonNullKey);
        }
        map.insert(text_of(&args[i]).into_owned(), value_arg(args, i + 1, b));
    }
    Ok(json_result(Json::Object(map)))
}

fn eval_quote(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(json::quote_string(&text_of(&args[0]))))
}

// ============================================================================
// Inspection
// ============================================================================

fn eval_extract(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let Some(doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    let paths = args[1..].iter().map(path_arg).collect::<Result<Vec<_>>>()?;
    let wrap = paths.len() > 1 || paths.iter().any(JsonPath::has_wildcard);
    let mut found: Vec<Json> = Vec::new();
    for path in &paths {
        found.extend(path.extract(&doc).into_iter().cloned());
    }
    Ok(match (wrap, found.len()) {
        (_, 0) => Datum::Null,
        (false, _) => json_result(found.swap_remove(0)),
        (true, _) => json_result(Json::Array(found)),
    })
}

fn eval_unquote(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    match &args[0] {
        Datum::Json(j) => Ok(match &**j {
            Json::String(s) => b.text(s),
            other => b.text(json::to_mysql_string(other)),
        }),
        other => match json::unquote(&text_of(other)) {
            Ok(s) => Ok(b.text(s)),
            Err(e) => {
                call.observe(e)?;
                Ok(Datum::Null)
            }
        },
    }
}

fn eval_type(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(match doc_arg(args, 0, b, call)? {
        Some(doc) => b.text(json::type_name(&doc)),
        None => Datum::Null,
    })
}

fn eval_valid(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let valid = match &args[0] {
        Datum::Json(_) => true,
        Datum::Str { text, .. } => json::parse(text).is_ok(),
        _ => false,
    };
    Ok(Datum::boolean(valid))
}

/// The single value at the optional path argument `idx`
fn target_at(doc: &Json, args: &[Datum], idx: usize) -> Result<Option<Json>> {
    let Some(p) = args.get(idx) else {
        return Ok(Some(doc.clone()));
    };
    let path = path_arg(p)?;
    if path.has_wildcard() {
        return Err(Error::InvalidJsonPathWildcard);
    }
    Ok(path.extract(doc).into_iter().next().cloned())
}

fn eval_length(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let Some(doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    Ok(match target_at(&doc, args, 1)? {
        Some(v) => Datum::Int(json::length(&v)),
        None => Datum::Null,
    })
}

fn eval_depth(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(match doc_arg(args, 0, b, call)? {
        Some(doc) => Datum::Int(json::depth(&doc)),
        None => Datum::Null,
    })
}

fn eval_keys(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let Some(doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    Ok(match target_at(&doc, args, 1)? {
        Some(Json::Object(map)) => {
            let keys = json::sorted_keys(&map)
                .into_iter()
                .map(|k| Json::String(k.clone()))
                .collect();
            json_result(Json::Array(keys))
        }
        _ => Datum::Null,
    })
}

fn eval_contains(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let Some(doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    let Some(candidate) = doc_arg(args, 1, b, call)? else {
        return Ok(Datum::Null);
    };
    Ok(match target_at(&doc, args, 2)? {
        Some(target) => Datum::boolean(json::contains(&target, &candidate)),
        None => Datum::Null,
    })
}

fn eval_contains_path(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let Some(doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    let all = one_or_all(&args[1], b)?;
    let mut hits = args[2..]
        .iter()
        .map(|p| path_arg(p).map(|path| !path.extract(&doc).is_empty()));
    let found = if all {
        hits.try_fold(true, |acc, hit| hit.map(|h| acc && h))?
    } else {
        hits.try_fold(false, |acc, hit| hit.map(|h| acc || h))?
    };
    Ok(Datum::boolean(found))
}

fn eval_overlaps(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let (Some(x), Some(y)) = (doc_arg(args, 0, b, call)?, doc_arg(args, 1, b, call)?) else {
        return Ok(Datum::Null);
    };
    Ok(Datum::boolean(json::overlaps(&x, &y)))
}

fn eval_member_of(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let value = value_arg(args, 0, b);
    let Some(doc) = doc_arg(args, 1, b, call)? else {
        return Ok(Datum::Null);
    };
    let same = |v: &Json| json::compare(v, &value).is_eq();
    Ok(Datum::boolean(match &doc {
        Json::Array(items) => items.iter().any(same),
        other => same(other),
    }))
}

/// `JSON_SEARCH(doc, one_or_all, pattern [, escape [, path ...]])`
fn eval_search(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    if args[..3].iter().any(Datum::is_null) || args.iter().skip(4).any(Datum::is_null) {
        return Ok(Datum::Null);
    }
    let Some(doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    let all = one_or_all(&args[1], b)?;
    let escape = match args.get(3) {
        None | Some(Datum::Null) => Some('\\'),
        Some(e) => {
            let text = text_of(e);
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (None, _) => Some('\\'),
                (Some(c), None) => Some(c),
                _ => return Err(Error::incorrect_arguments(function_name(b))),
            }
        }
    };
    let pattern = LikePattern::compile(&text_of(&args[2]), escape, &UTF8MB4_BIN);
    let matches = |s: &str| pattern.matches(s);

    let found = if args.len() > 4 {
        let mut roots = Vec::new();
        for p in &args[4..] {
            roots.extend(path_arg(p)?.locate(&doc));
        }
        json::search_from(roots, &matches, all)
    } else {
        json::search(&doc, &matches, all)
    };
    Ok(match found.len() {
        0 => Datum::Null,
        1 => json_result(Json::String(found.into_iter().next().unwrap_or_default())),
        _ => json_result(Json::Array(found.into_iter().map(Json::String).collect())),
    })
}

fn eval_pretty(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(match doc_arg(args, 0, b, call)? {
        Some(doc) => b.text(json::pretty(&doc)),
        None => Datum::Null,
    })
}

/// Size of the document's compact text
fn eval_storage_size(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(match doc_arg(args, 0, b, call)? {
        Some(doc) => Datum::Int(json::to_mysql_string(&doc).len() as i64),
        None => Datum::Null,
    })
}

// ============================================================================
// Modification
// ============================================================================

/// Apply `op` to each `(path, value)` pair after the document
fn modify_pairs(
    args: &[Datum],
    b: &Bound,
    call: &mut Call<'_>,
    op: impl Fn(&mut Json, &JsonPath, Json) -> Result<()>,
) -> Result<Datum> {
    if args[0].is_null() || args[1..].iter().step_by(2).any(Datum::is_null) {
        return Ok(Datum::Null);
    }
    let Some(mut doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    for i in (1..args.len()).step_by(2) {
        let path = path_arg(&args[i])?;
        op(&mut doc, &path, value_arg(args, i + 1, b))?;
    }
    Ok(json_result(doc))
}

fn eval_set(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    modify_pairs(args, b, call, |doc, path, v| json::modify(doc, path, v, ModifyMode::Set))
}

fn eval_insert(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    modify_pairs(args, b, call, |doc, path, v| json::modify(doc, path, v, ModifyMode::Insert))
}

fn eval_replace(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    modify_pairs(args, b, call, |doc, path, v| json::modify(doc, path, v, ModifyMode::Replace))
}

fn eval_array_append(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    modify_pairs(args, b, call, json::array_append)
}

fn eval_array_insert(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    modify_pairs(args, b, call, |doc, path, v| {
        if !matches!(path.legs().last(), Some(PathLeg::Index(_))) {
            return Err(Error::JsonPathNotArrayCell);
        }
        json::array_insert(doc, path, v)
    })
}

fn eval_remove(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let Some(mut doc) = doc_arg(args, 0, b, call)? else {
        return Ok(Datum::Null);
    };
    for p in &args[1..] {
        json::remove(&mut doc, &path_arg(p)?)?;
    }
    Ok(json_result(doc))
}

fn eval_merge_preserve(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let mut merged: Option<Json> = None;
    for i in 0..args.len() {
        let Some(doc) = doc_arg(args, i, b, call)? else {
            return Ok(Datum::Null);
        };
        merged = Some(match merged {
            Some(acc) => json::merge_preserve(acc, doc),
            None => doc,
        });
    }
    Ok(merged.map(json_result).unwrap_or(Datum::Null))
}

/// A NULL operand makes the result NULL until a later non-object patch
/// replaces it
fn eval_merge_patch(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let mut merged: Option<Json> = None;
    for i in 0..args.len() {
        let patch = if args[i].is_null() {
            None
        } else {
            doc_arg(args, i, b, call)?
        };
        merged = match (merged, patch) {
            (_, None) => None,
            (Some(acc), Some(p)) => Some(json::merge_patch(acc, p)),
            (None, Some(p)) if i == 0 || !p.is_object() => Some(p),
            (None, Some(_)) => None,
        };
    }
    Ok(merged.map(json_result).unwrap_or(Datum::Null))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{eval, i, s};
    use crate::core::Datum;

    #[test]
    fn test_constructors() {
        assert_eq!(eval("JSON_ARRAY", &[i(1), s("a"), Datum::Null]), r#"[1, "a", null]"#);
        assert_eq!(eval("JSON_ARRAY", &[s("[1]")]), r#"["[1]"]"#);
        assert_eq!(eval("JSON_ARRAY", &[]), "[]");
        assert_eq!(
            eval("JSON_OBJECT", &[s("id"), i(87), s("name"), s("carrot")]),
            r#"{"id": 87, "name": "carrot"}"#
        );
        assert_eq!(eval("JSON_OBJECT", &[Datum::Null, i(1)]), "ERROR 3158");
        assert_eq!(eval("JSON_OBJECT", &[s("a")]), "ERROR 1582");
        assert_eq!(eval("JSON_QUOTE", &[s("null")]), r#""null""#);
        assert_eq!(eval("JSON_QUOTE", &[s("\"x\"\n")]), r#""\"x\"\n""#);
    }

    #[test]
    fn test_extract() {
        let doc = s(r#"{"a": [10, 20, {"b": 30}], "c": "x"}"#);
        assert_eq!(eval("JSON_EXTRACT", &[doc.clone(), s("$.a[1]")]), "20");
        assert_eq!(eval("JSON_EXTRACT", &[doc.clone(), s("$.a[2].b")]), "30");
        assert_eq!(eval("JSON_EXTRACT", &[doc.clone(), s("$.c")]), r#""x""#);
        assert_eq!(eval("JSON_EXTRACT", &[doc.clone(), s("$.a[0]"), s("$.c")]), r#"[10, "x"]"#);
        assert_eq!(eval("JSON_EXTRACT", &[doc.clone(), s("$.a[*]")]), r#"[10, 20, {"b": 30}]"#);
        assert_eq!(eval("JSON_EXTRACT", &[doc.clone(), s("$.missing")]), "NULL");
        assert_eq!(eval("JSON_EXTRACT", &[doc, s("$[")]), "ERROR 3143");
        assert_eq!(eval("JSON_EXTRACT", &[s("{oops"), s("$")]), "ERROR 3140");
        assert_eq!(eval("JSON_EXTRACT", &[i(1), s("$")]), "ERROR 3144");
    }

    #[test]
    fn test_unquote_type_valid() {
        assert_eq!(eval("JSON_UNQUOTE", &[s(r#""abc""#)]), "abc");
        assert_eq!(eval("JSON_UNQUOTE", &[s("[1, 2]")]), "[1, 2]");
        assert_eq!(eval("JSON_UNQUOTE", &[s(r#""\t2""#)]), "\t2");
        assert_eq!(eval("JSON_TYPE", &[s("[]")]), "ARRAY");
        assert_eq!(eval("JSON_TYPE", &[s("1.5")]), "DOUBLE");
        assert_eq!(eval("JSON_VALID", &[s(r#"{"a": 1}"#)]), "1");
        assert_eq!(eval("JSON_VALID", &[s("hello")]), "0");
        assert_eq!(eval("JSON_VALID", &[Datum::Null]), "NULL");
    }

    #[test]
    fn test_length_depth_keys() {
        assert_eq!(eval("JSON_LENGTH", &[s(r#"[1, 2, {"a": 3}]"#)]), "3");
        assert_eq!(eval("JSON_LENGTH", &[s(r#"{"a": 1, "b": {"c": 30}}"#), s("$.b")]), "1");
        assert_eq!(eval("JSON_LENGTH", &[s("[1]"), s("$[*]")]), "ERROR 3149");
        assert_eq!(eval("JSON_DEPTH", &[s(r#"[10, {"a": 20}]"#)]), "3");
        assert_eq!(eval("JSON_KEYS", &[s(r#"{"b": 1, "a": 2, "aa": 3}"#)]), r#"["a", "b", "aa"]"#);
        assert_eq!(eval("JSON_KEYS", &[s("[1]")]), "NULL");
    }

    #[test]
    fn test_contains() {
        let doc = s(r#"{"a": 1, "b": 2, "c": {"d": 4}}"#);
        assert_eq!(eval("JSON_CONTAINS", &[doc.clone(), s("1"), s("$.a")]), "1");
        assert_eq!(eval("JSON_CONTAINS", &[doc.clone(), s(r#"{"a": 1}"#)]), "1");
        assert_eq!(eval("JSON_CONTAINS", &[doc.clone(), s(r#"{"d": 4}"#), s("$.a")]), "0");
        assert_eq!(eval("JSON_CONTAINS_PATH", &[doc.clone(), s("one"), s("$.a"), s("$.e")]), "1");
        assert_eq!(eval("JSON_CONTAINS_PATH", &[doc.clone(), s("all"), s("$.a"), s("$.e")]), "0");
        assert_eq!(eval("JSON_CONTAINS_PATH", &[doc, s("some"), s("$.a")]), "ERROR 3154");
        assert_eq!(eval("JSON_OVERLAPS", &[s("[1, 3, 5]"), s("[2, 5, 7]")]), "1");
        assert_eq!(eval("MEMBER_OF", &[s("ab"), s(r#"[23, "abc", "ab"]"#)]), "1");
        assert_eq!(eval("MEMBER_OF", &[i(17), s("[23, 17]")]), "1");
    }

    #[test]
    fn test_search() {
        let doc = s(r#"["abc", [{"k": "10"}, "def"], {"x": "abc"}, {"y": "bcd"}]"#);
        assert_eq!(eval("JSON_SEARCH", &[doc.clone(), s("one"), s("abc")]), r#""$[0]""#);
        assert_eq!(
            eval("JSON_SEARCH", &[doc.clone(), s("all"), s("abc")]),
            r#"["$[0]", "$[2].x"]"#
        );
        assert_eq!(eval("JSON_SEARCH", &[doc.clone(), s("all"), s("ghi")]), "NULL");
        assert_eq!(eval("JSON_SEARCH", &[doc.clone(), s("all"), s("%b%"), Datum::Null, s("$[3]")]), r#""$[3].y""#);
        assert_eq!(eval("JSON_SEARCH", &[doc, s("all"), s("1_")]), r#""$[1][0].k""#);
    }

    #[test]
    fn test_modification() {
        let doc = s(r#"{"a": 1, "b": [2, 3]}"#);
        assert_eq!(
            eval("JSON_SET", &[doc.clone(), s("$.a"), i(10), s("$.c"), s("[true, false]")]),
            r#"{"a": 10, "b": [2, 3], "c": "[true, false]"}"#
        );
        assert_eq!(
            eval("JSON_INSERT", &[doc.clone(), s("$.a"), i(10), s("$.c"), Datum::Null]),
            r#"{"a": 1, "b": [2, 3], "c": null}"#
        );
        assert_eq!(
            eval("JSON_REPLACE", &[doc.clone(), s("$.a"), i(10), s("$.c"), i(5)]),
            r#"{"a": 10, "b": [2, 3]}"#
        );
        assert_eq!(eval("JSON_REMOVE", &[doc.clone(), s("$.b[0]")]), r#"{"a": 1, "b": [3]}"#);
        assert_eq!(eval("JSON_REMOVE", &[doc.clone(), s("$")]), "ERROR 3153");
        assert_eq!(
            eval("JSON_ARRAY_APPEND", &[doc.clone(), s("$.b"), i(4), s("$.a"), i(9)]),
            r#"{"a": [1, 9], "b": [2, 3, 4]}"#
        );
        assert_eq!(
            eval("JSON_ARRAY_INSERT", &[doc.clone(), s("$.b[0]"), s("x")]),
            r#"{"a": 1, "b": ["x", 2, 3]}"#
        );
        assert_eq!(eval("JSON_ARRAY_INSERT", &[doc.clone(), s("$.b"), i(1)]), "ERROR 3165");
        assert_eq!(eval("JSON_SET", &[doc.clone(), s("$.a")]), "ERROR 1582");
        assert_eq!(eval("JSON_SET", &[doc, Datum::Null, i(1)]), "NULL");
    }

    #[test]
    fn test_merge() {
        assert_eq!(
            eval("JSON_MERGE_PRESERVE", &[s("[1, 2]"), s("[true, false]")]),
            "[1, 2, true, false]"
        );
        assert_eq!(
            eval("JSON_MERGE_PRESERVE", &[s(r#"{"a": 1}"#), s(r#"{"a": 2}"#)]),
            r#"{"a": [1, 2]}"#
        );
        assert_eq!(
            eval("JSON_MERGE_PATCH", &[s(r#"{"a": 1, "b": 2}"#), s(r#"{"a": 3, "c": 4}"#)]),
            r#"{"a": 3, "b": 2, "c": 4}"#
        );
        assert_eq!(
            eval("JSON_MERGE_PATCH", &[s(r#"{"a": 1, "b": 2}"#), s(r#"{"b": null}"#)]),
            r#"{"a": 1}"#
        );
        assert_eq!(eval("JSON_MERGE_PATCH", &[Datum::Null, s(r#"{"a": 1}"#)]), "NULL");
        assert_eq!(eval("JSON_MERGE_PATCH", &[Datum::Null, s("[1]")]), "[1]");
    }

    #[test]
    fn test_pretty_and_size() {
        assert_eq!(eval("JSON_PRETTY", &[s("[1, {\"a\": 2}]")]), "[\n  1,\n  {\n    \"a\": 2\n  }\n]");
        assert_eq!(eval("JSON_STORAGE_SIZE", &[s("[1, 2]")]), "6");
    }
}
