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

//! JSON documents
//!
//! Documents are held as [`serde_json::Value`]. This module adds what the
//! SQL layer needs on top: MySQL's textual form (object keys ordered by
//! length, then bytes), path expressions, and the document operations
//! behind the JSON builtins.

use std::cmp::Ordering;
use std::fmt::Write as _;

use serde_json::{Map, Number};

use super::{Error, Result};

/// A JSON document
pub type Json = serde_json::Value;

/// Parse JSON text; the error carries the parser's message
pub fn parse(text: &str) -> std::result::Result<Json, String> {
    serde_json::from_str(text).map_err(|e| e.to_string())
}

/// MySQL object key order: shorter keys first, then bytewise
#[inline]
pub fn key_cmp(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Object keys in MySQL order
pub fn sorted_keys(map: &Map<String, Json>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by(|a, b| key_cmp(a, b));
    keys
}

/// Quote and escape a string as a JSON string literal
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    write_string(&mut out, s);
    out
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_json(out: &mut String, v: &Json) {
    match v {
        Json::Null => out.push_str("null"),
        Json::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Json::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Json::String(s) => write_string(out, s),
        Json::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_json(out, item);
            }
            out.push(']');
        }
        Json::Object(map) => {
            out.push('{');
            for (i, key) in sorted_keys(map).into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                out.push_str(": ");
                write_json(out, &map[key]);
            }
            out.push('}');
        }
    }
}

/// Render in MySQL's compact form, e.g. `{"a": 1, "b": [1, 2]}`
pub fn to_mysql_string(v: &Json) -> String {
    let mut out = String::new();
    write_json(&mut out, v);
    out
}

fn write_pretty(out: &mut String, v: &Json, indent: usize) {
    match v {
        Json::Array(items) if !items.is_empty() => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&" ".repeat(indent + 2));
                write_pretty(out, item, indent + 2);
            }
            out.push('\n');
            out.push_str(&" ".repeat(indent));
            out.push(']');
        }
        Json::Object(map) if !map.is_empty() => {
            out.push_str("{\n");
            for (i, key) in sorted_keys(map).into_iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&" ".repeat(indent + 2));
                write_string(out, key);
                out.push_str(": ");
                write_pretty(out, &map[key], indent + 2);
            }
            out.push('\n');
            out.push_str(&" ".repeat(indent));
            out.push('}');
        }
        Json::Array(_) => out.push_str("[]"),
        Json::Object(_) => out.push_str("{}"),
        other => write_json(out, other),
    }
}

/// JSON_PRETTY output
pub fn pretty(v: &Json) -> String {
    let mut out = String::new();
    write_pretty(&mut out, v, 0);
    out
}

/// JSON_TYPE name
pub fn type_name(v: &Json) -> &'static str {
    match v {
        Json::Null => "NULL",
        Json::Bool(_) => "BOOLEAN",
        Json::Number(n) if n.is_i64() => "INTEGER",
        Json::Number(n) if n.is_u64() => "UNSIGNED INTEGER",
        Json::Number(_) => "DOUBLE",
        Json::String(_) => "STRING",
        Json::Array(_) => "ARRAY",
        Json::Object(_) => "OBJECT",
    }
}

/// JSON_DEPTH
pub fn depth(v: &Json) -> i64 {
    match v {
        Json::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
        Json::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
        _ => 1,
    }
}

/// JSON_LENGTH
pub fn length(v: &Json) -> i64 {
    match v {
        Json::Array(items) => items.len() as i64,
        Json::Object(map) => map.len() as i64,
        _ => 1,
    }
}

/// JSON_UNQUOTE: strip and unescape a quoted JSON string, otherwise return the input
pub fn unquote(s: &str) -> Result<String> {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        return match parse(s) {
            Ok(Json::String(inner)) => Ok(inner),
            _ => Err(Error::invalid_json_text(1, "json_unquote", "Missing a closing quotation mark in string.")),
        };
    }
    Ok(s.to_string())
}

fn number_cmp(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    // an integer beyond i64 against a negative integer
    if a.is_u64() && b.is_i64() {
        return Ordering::Greater;
    }
    if a.is_i64() && b.is_u64() {
        return Ordering::Less;
    }
    let x = a.as_f64().unwrap_or(0.0);
    let y = b.as_f64().unwrap_or(0.0);
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}

fn rank(v: &Json) -> u8 {
    match v {
        Json::Null => 0,
        Json::Number(_) => 1,
        Json::String(_) => 2,
        Json::Object(_) => 3,
        Json::Array(_) => 4,
        Json::Bool(_) => 5,
    }
}

/// Ordering used by comparison operators on JSON values
pub fn compare(a: &Json, b: &Json) -> Ordering {
    let (ra, rb) = (rank(a), rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => number_cmp(x, y),
        (Json::String(x), Json::String(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        (Json::Array(x), Json::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Json::Object(x), Json::Object(y)) => {
            if x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map(|w| compare(v, w) == Ordering::Equal).unwrap_or(false))
            {
                Ordering::Equal
            } else {
                to_mysql_string(a).cmp(&to_mysql_string(b))
            }
        }
        _ => Ordering::Equal,
    }
}

/// JSON_CONTAINS(target, candidate)
pub fn contains(target: &Json, candidate: &Json) -> bool {
    match (target, candidate) {
        (Json::Object(t), Json::Object(c)) => c
            .iter()
            .all(|(k, cv)| t.get(k).map(|tv| contains(tv, cv)).unwrap_or(false)),
        (Json::Object(_), _) => false,
        (Json::Array(t), Json::Array(c)) => c.iter().all(|cv| t.iter().any(|tv| contains(tv, cv))),
        (Json::Array(t), c) => t.iter().any(|tv| contains(tv, c)),
        (_, Json::Array(_)) | (_, Json::Object(_)) => false,
        (t, c) => compare(t, c) == Ordering::Equal,
    }
}

/// JSON_OVERLAPS(a, b)
pub fn overlaps(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Array(x), Json::Array(y)) => x
            .iter()
            .any(|l| y.iter().any(|r| compare(l, r) == Ordering::Equal)),
        (Json::Array(x), other) | (other, Json::Array(x)) => {
            x.iter().any(|l| compare(l, other) == Ordering::Equal)
        }
        (Json::Object(x), Json::Object(y)) => x
            .iter()
            .any(|(k, v)| y.get(k).map(|w| compare(v, w) == Ordering::Equal).unwrap_or(false)),
        (l, r) => compare(l, r) == Ordering::Equal,
    }
}

/// JSON_MERGE_PRESERVE of two documents
pub fn merge_preserve(a: Json, b: Json) -> Json {
    match (a, b) {
        (Json::Object(mut left), Json::Object(right)) => {
            for (k, v) in right {
                let merged = match left.remove(&k) {
                    Some(existing) => merge_preserve(existing, v),
                    None => v,
                };
                left.insert(k, merged);
            }
            Json::Object(left)
        }
        (Json::Array(mut left), Json::Array(right)) => {
            left.extend(right);
            Json::Array(left)
        }
        (Json::Array(mut left), right) => {
            left.push(right);
            Json::Array(left)
        }
        (left, Json::Array(right)) => {
            let mut items = Vec::with_capacity(right.len() + 1);
            items.push(left);
            items.extend(right);
            Json::Array(items)
        }
        (left, right) => Json::Array(vec![left, right]),
    }
}

/// JSON_MERGE_PATCH of two documents (RFC 7396)
pub fn merge_patch(target: Json, patch: Json) -> Json {
    let Json::Object(patch) = patch else {
        return patch;
    };
    let mut map = match target {
        Json::Object(map) => map,
        _ => Map::new(),
    };
    for (k, v) in patch {
        if v.is_null() {
            map.remove(&k);
        } else {
            let existing = map.remove(&k).unwrap_or(Json::Null);
            map.insert(k, merge_patch(existing, v));
        }
    }
    Json::Object(map)
}

// ============================================================================
// Path expressions
// ============================================================================

/// Array position in a path leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayIndex {
    FromStart(usize),
    /// `last - n`
    FromLast(usize),
}

impl ArrayIndex {
    /// Position in an array of `len` elements
    pub fn resolve(self, len: usize) -> Option<usize> {
        match self {
            ArrayIndex::FromStart(n) if n < len => Some(n),
            ArrayIndex::FromLast(n) if n < len => Some(len - 1 - n),
            _ => None,
        }
    }

    fn is_first_of_one(self) -> bool {
        matches!(self, ArrayIndex::FromStart(0) | ArrayIndex::FromLast(0))
    }
}

/// One step of a path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLeg {
    Key(String),
    KeyWildcard,
    Index(ArrayIndex),
    Range(ArrayIndex, ArrayIndex),
    IndexWildcard,
    DoubleWildcard,
}

/// Concrete location inside a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// Parsed path expression such as `$.a[1].*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    legs: Vec<PathLeg>,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct PathParser<'a> {
    chars: Vec<(usize, char)>,
    pos: usize,
    text: &'a str,
}

impl<'a> PathParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().collect(),
            pos: 0,
            text,
        }
    }

    fn error(&self) -> Error {
        let position = self.chars.get(self.pos).map(|(i, _)| *i).unwrap_or(self.text.len());
        Error::InvalidJsonPath { position }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Result<usize> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error());
        }
        let digits: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();
        digits.parse().map_err(|_| self.error())
    }

    fn index(&mut self) -> Result<ArrayIndex> {
        self.skip_ws();
        if self.peek() == Some('l') {
            for expected in "last".chars() {
                if !self.eat(expected) {
                    return Err(self.error());
                }
            }
            self.skip_ws();
            if self.eat('-') {
                self.skip_ws();
                return Ok(ArrayIndex::FromLast(self.number()?));
            }
            return Ok(ArrayIndex::FromLast(0));
        }
        Ok(ArrayIndex::FromStart(self.number()?))
    }

    fn quoted_key(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek() {
                None => return Err(self.error()),
                Some('\\') => self.pos += 2,
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        let raw: String = self.chars[start..self.pos.min(self.chars.len())]
            .iter()
            .map(|(_, c)| *c)
            .collect();
        match parse(&raw) {
            Ok(Json::String(key)) => Ok(key),
            _ => Err(self.error()),
        }
    }

    fn parse(mut self) -> Result<JsonPath> {
        self.skip_ws();
        if !self.eat('$') {
            return Err(self.error());
        }
        let mut legs = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some('.') => {
                    self.pos += 1;
                    self.skip_ws();
                    match self.peek() {
                        Some('*') => {
                            self.pos += 1;
                            legs.push(PathLeg::KeyWildcard);
                        }
                        Some('"') => legs.push(PathLeg::Key(self.quoted_key()?)),
                        Some(c) if is_ident_start(c) => {
                            let start = self.pos;
                            while matches!(self.peek(), Some(c) if is_ident_char(c)) {
                                self.pos += 1;
                            }
                            let key: String =
                                self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();
                            legs.push(PathLeg::Key(key));
                        }
                        _ => return Err(self.error()),
                    }
                }
                Some('[') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.eat('*') {
                        legs.push(PathLeg::IndexWildcard);
                    } else {
                        let from = self.index()?;
                        self.skip_ws();
                        if self.peek() == Some('t') {
                            if !(self.eat('t') && self.eat('o')) {
                                return Err(self.error());
                            }
                            let to = self.index()?;
                            legs.push(PathLeg::Range(from, to));
                        } else {
                            legs.push(PathLeg::Index(from));
                        }
                    }
                    self.skip_ws();
                    if !self.eat(']') {
                        return Err(self.error());
                    }
                }
                Some('*') => {
                    self.pos += 1;
                    if !self.eat('*') {
                        return Err(self.error());
                    }
                    legs.push(PathLeg::DoubleWildcard);
                }
                Some(_) => return Err(self.error()),
            }
        }
        if matches!(legs.last(), Some(PathLeg::DoubleWildcard)) {
            return Err(self.error());
        }
        Ok(JsonPath { legs })
    }
}

impl JsonPath {
    /// Parse a path expression
    pub fn parse(text: &str) -> Result<JsonPath> {
        PathParser::new(text).parse()
    }

    pub fn legs(&self) -> &[PathLeg] {
        &self.legs
    }

    /// True if the path is just `$`
    pub fn is_root(&self) -> bool {
        self.legs.is_empty()
    }

    /// True if the path can match more than one location
    pub fn has_wildcard(&self) -> bool {
        self.legs.iter().any(|l| {
            matches!(
                l,
                PathLeg::KeyWildcard | PathLeg::IndexWildcard | PathLeg::DoubleWildcard | PathLeg::Range(..)
            )
        })
    }

    /// All values matched by the path, with their concrete locations
    pub fn locate<'a>(&self, doc: &'a Json) -> Vec<(Vec<PathStep>, &'a Json)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect(doc, &self.legs, &mut prefix, &mut out);
        if self.legs.iter().any(|l| matches!(l, PathLeg::DoubleWildcard)) {
            let mut seen: Vec<Vec<PathStep>> = Vec::new();
            out.retain(|(p, _)| {
                if seen.contains(p) {
                    false
                } else {
                    seen.push(p.clone());
                    true
                }
            });
        }
        out
    }

    /// All values matched by the path
    pub fn extract<'a>(&self, doc: &'a Json) -> Vec<&'a Json> {
        self.locate(doc).into_iter().map(|(_, v)| v).collect()
    }

    fn require_plain(&self) -> Result<()> {
        if self.has_wildcard() {
            return Err(Error::InvalidJsonPathWildcard);
        }
        Ok(())
    }
}

fn collect<'a>(
    v: &'a Json,
    legs: &[PathLeg],
    prefix: &mut Vec<PathStep>,
    out: &mut Vec<(Vec<PathStep>, &'a Json)>,
) {
    let Some((leg, rest)) = legs.split_first() else {
        out.push((prefix.clone(), v));
        return;
    };
    match leg {
        PathLeg::Key(k) => {
            if let Some(child) = v.as_object().and_then(|m| m.get(k)) {
                prefix.push(PathStep::Key(k.clone()));
                collect(child, rest, prefix, out);
                prefix.pop();
            }
        }
        PathLeg::KeyWildcard => {
            if let Some(map) = v.as_object() {
                for k in sorted_keys(map) {
                    prefix.push(PathStep::Key(k.clone()));
                    collect(&map[k], rest, prefix, out);
                    prefix.pop();
                }
            }
        }
        PathLeg::Index(idx) => match v.as_array() {
            Some(items) => {
                if let Some(pos) = idx.resolve(items.len()) {
                    prefix.push(PathStep::Index(pos));
                    collect(&items[pos], rest, prefix, out);
                    prefix.pop();
                }
            }
            None if idx.is_first_of_one() => collect(v, rest, prefix, out),
            None => {}
        },
        PathLeg::Range(from, to) => match v.as_array() {
            Some(items) => {
                let len = items.len();
                let start = match from {
                    ArrayIndex::FromStart(n) => *n,
                    ArrayIndex::FromLast(n) => len.saturating_sub(1 + n),
                };
                let end = match to {
                    ArrayIndex::FromStart(n) => (*n).min(len.saturating_sub(1)),
                    ArrayIndex::FromLast(n) => match len.checked_sub(1 + n) {
                        Some(e) => e,
                        None => return,
                    },
                };
                for pos in start..=end.min(len.saturating_sub(1)) {
                    if pos >= len {
                        break;
                    }
                    prefix.push(PathStep::Index(pos));
                    collect(&items[pos], rest, prefix, out);
                    prefix.pop();
                }
            }
            None if from.is_first_of_one() => collect(v, rest, prefix, out),
            None => {}
        },
        PathLeg::IndexWildcard => {
            if let Some(items) = v.as_array() {
                for (pos, item) in items.iter().enumerate() {
                    prefix.push(PathStep::Index(pos));
                    collect(item, rest, prefix, out);
                    prefix.pop();
                }
            }
        }
        PathLeg::DoubleWildcard => {
            collect(v, rest, prefix, out);
            match v {
                Json::Array(items) => {
                    for (pos, item) in items.iter().enumerate() {
                        prefix.push(PathStep::Index(pos));
                        collect(item, legs, prefix, out);
                        prefix.pop();
                    }
                }
                Json::Object(map) => {
                    for k in sorted_keys(map) {
                        prefix.push(PathStep::Key(k.clone()));
                        collect(&map[k], legs, prefix, out);
                        prefix.pop();
                    }
                }
                _ => {}
            }
        }
    }
}

/// Render a concrete location as path text, e.g. `$.a[0]."b c"`
pub fn format_path(steps: &[PathStep]) -> String {
    let mut out = String::from("$");
    for step in steps {
        match step {
            PathStep::Index(i) => {
                let _ = write!(out, "[{}]", i);
            }
            PathStep::Key(k) => {
                let mut chars = k.chars();
                let plain = chars.next().map(is_ident_start).unwrap_or(false) && chars.all(is_ident_char);
                out.push('.');
                if plain {
                    out.push_str(k);
                } else {
                    write_string(&mut out, k);
                }
            }
        }
    }
    out
}

fn lookup_mut<'a>(doc: &'a mut Json, legs: &[PathLeg]) -> Option<&'a mut Json> {
    let mut cur = doc;
    for leg in legs {
        cur = match leg {
            PathLeg::Key(k) => cur.as_object_mut()?.get_mut(k)?,
            PathLeg::Index(idx) => {
                if cur.is_array() {
                    let items = cur.as_array_mut()?;
                    let pos = idx.resolve(items.len())?;
                    &mut items[pos]
                } else if idx.is_first_of_one() {
                    cur
                } else {
                    return None;
                }
            }
            _ => return None,
        };
    }
    Some(cur)
}

/// How JSON_SET / JSON_INSERT / JSON_REPLACE treat existing and missing locations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyMode {
    Set,
    Insert,
    Replace,
}

impl ModifyMode {
    fn replaces(self) -> bool {
        matches!(self, ModifyMode::Set | ModifyMode::Replace)
    }

    fn inserts(self) -> bool {
        matches!(self, ModifyMode::Set | ModifyMode::Insert)
    }
}

/// Write `value` at `path` according to `mode`
pub fn modify(doc: &mut Json, path: &JsonPath, value: Json, mode: ModifyMode) -> Result<()> {
    path.require_plain()?;
    let Some((last, parent_legs)) = path.legs.split_last() else {
        if mode.replaces() {
            *doc = value;
        }
        return Ok(());
    };
    let Some(parent) = lookup_mut(doc, parent_legs) else {
        return Ok(());
    };
    match last {
        PathLeg::Key(k) => {
            if let Some(map) = parent.as_object_mut() {
                let exists = map.contains_key(k);
                if (exists && mode.replaces()) || (!exists && mode.inserts()) {
                    map.insert(k.clone(), value);
                }
            }
        }
        PathLeg::Index(idx) => {
            if let Some(items) = parent.as_array_mut() {
                match idx.resolve(items.len()) {
                    Some(pos) if mode.replaces() => items[pos] = value,
                    Some(_) => {}
                    None if mode.inserts() => items.push(value),
                    None => {}
                }
            } else if idx.is_first_of_one() {
                if mode.replaces() {
                    *parent = value;
                }
            } else if mode.inserts() {
                let old = std::mem::take(parent);
                *parent = Json::Array(vec![old, value]);
            }
        }
        _ => return Err(Error::InvalidJsonPathWildcard),
    }
    Ok(())
}

/// JSON_REMOVE of one path
pub fn remove(doc: &mut Json, path: &JsonPath) -> Result<()> {
    path.require_plain()?;
    let Some((last, parent_legs)) = path.legs.split_last() else {
        return Err(Error::JsonVacuousPath);
    };
    let Some(parent) = lookup_mut(doc, parent_legs) else {
        return Ok(());
    };
    match (last, parent) {
        (PathLeg::Key(k), Json::Object(map)) => {
            map.remove(k);
        }
        (PathLeg::Index(idx), Json::Array(items)) => {
            if let Some(pos) = idx.resolve(items.len()) {
                items.remove(pos);
            }
        }
        _ => {}
    }
    Ok(())
}

/// JSON_ARRAY_APPEND of one value
pub fn array_append(doc: &mut Json, path: &JsonPath, value: Json) -> Result<()> {
    path.require_plain()?;
    let Some(target) = lookup_mut(doc, &path.legs) else {
        return Ok(());
    };
    match target {
        Json::Array(items) => items.push(value),
        other => {
            let old = std::mem::take(other);
            *other = Json::Array(vec![old, value]);
        }
    }
    Ok(())
}

/// JSON_ARRAY_INSERT of one value
pub fn array_insert(doc: &mut Json, path: &JsonPath, value: Json) -> Result<()> {
    path.require_plain()?;
    let Some((PathLeg::Index(idx), parent_legs)) = path.legs.split_last() else {
        return Err(Error::JsonPathNotArrayCell);
    };
    if let Some(Json::Array(items)) = lookup_mut(doc, parent_legs) {
        let len = items.len();
        let pos = match idx {
            ArrayIndex::FromStart(n) => (*n).min(len),
            ArrayIndex::FromLast(n) => len.saturating_sub(1 + n),
        };
        items.insert(pos, value);
    }
    Ok(())
}

/// Locations of string scalars accepted by `matches`, in document order
pub fn search(doc: &Json, matches: &dyn Fn(&str) -> bool, all: bool) -> Vec<String> {
    fn walk(v: &Json, prefix: &mut Vec<PathStep>, matches: &dyn Fn(&str) -> bool, all: bool, out: &mut Vec<String>) {
        if !all && !out.is_empty() {
            return;
        }
        match v {
            Json::String(s) => {
                if matches(s) {
                    out.push(format_path(prefix));
                }
            }
            Json::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    prefix.push(PathStep::Index(i));
                    walk(item, prefix, matches, all, out);
                    prefix.pop();
                }
            }
            Json::Object(map) => {
                for k in sorted_keys(map) {
                    prefix.push(PathStep::Key(k.clone()));
                    walk(&map[k], prefix, matches, all, out);
                    prefix.pop();
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(doc, &mut Vec::new(), matches, all, &mut out);
    out
}

/// Like [`search`] but starting from located sub-documents
pub fn search_from(
    roots: Vec<(Vec<PathStep>, &Json)>,
    matches: &dyn Fn(&str) -> bool,
    all: bool,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (prefix, node) in roots {
        for found in search(node, matches, all) {
            let full = format!("{}{}", format_path(&prefix), &found[1..]);
            if !out.contains(&full) {
                out.push(full);
            }
        }
        if !all && !out.is_empty() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(s: &str) -> Json {
        parse(s).unwrap()
    }

    #[test]
    fn test_mysql_format() {
        let v = doc(r#"{"bb": 1, "a": [1, 2.5, "x"], "c": null}"#);
        assert_eq!(to_mysql_string(&v), r#"{"a": [1, 2.5, "x"], "c": null, "bb": 1}"#);
        assert_eq!(quote_string("a\"b\n"), r#""a\"b\n""#);
    }

    #[test]
    fn test_pretty() {
        let v = doc(r#"{"a": [1, 2], "b": {}}"#);
        assert_eq!(pretty(&v), "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {}\n}");
    }

    #[test]
    fn test_type_depth_length() {
        assert_eq!(type_name(&doc("1")), "INTEGER");
        assert_eq!(type_name(&doc("1.5")), "DOUBLE");
        assert_eq!(type_name(&doc("18446744073709551615")), "UNSIGNED INTEGER");
        assert_eq!(depth(&doc("[]")), 1);
        assert_eq!(depth(&doc("[10, {\"a\": 20}]")), 3);
        assert_eq!(length(&doc("{\"a\": 1, \"b\": 2}")), 2);
        assert_eq!(length(&doc("\"x\"")), 1);
    }

    #[test]
    fn test_path_parse() {
        let p = JsonPath::parse("$.a[1].\"b c\"[last-1]").unwrap();
        assert_eq!(
            p.legs(),
            &[
                PathLeg::Key("a".into()),
                PathLeg::Index(ArrayIndex::FromStart(1)),
                PathLeg::Key("b c".into()),
                PathLeg::Index(ArrayIndex::FromLast(1)),
            ]
        );
        assert!(JsonPath::parse("$**.a").unwrap().has_wildcard());
        assert!(JsonPath::parse("a.b").is_err());
        assert!(JsonPath::parse("$.").is_err());
        assert!(JsonPath::parse("$**").is_err());
        assert_eq!(JsonPath::parse("$[").unwrap_err().code(), 3143);
    }

    #[test]
    fn test_extract() {
        let v = doc(r#"{"a": [10, 20, {"b": 1}], "c": {"b": 2}}"#);
        let p = JsonPath::parse("$.a[1]").unwrap();
        assert_eq!(p.extract(&v), vec![&doc("20")]);
        let p = JsonPath::parse("$.a[last]").unwrap();
        assert_eq!(p.extract(&v), vec![&doc(r#"{"b": 1}"#)]);
        let p = JsonPath::parse("$**.b").unwrap();
        assert_eq!(p.extract(&v).len(), 2);
        let p = JsonPath::parse("$.a[0 to 1]").unwrap();
        assert_eq!(p.extract(&v), vec![&doc("10"), &doc("20")]);
        // Scalars act as one-element arrays
        let p = JsonPath::parse("$.c.b[0]").unwrap();
        assert_eq!(p.extract(&v), vec![&doc("2")]);
    }

    #[test]
    fn test_modify_modes() {
        let mut v = doc(r#"{"a": 1, "b": [1]}"#);
        modify(&mut v, &JsonPath::parse("$.a").unwrap(), doc("2"), ModifyMode::Insert).unwrap();
        modify(&mut v, &JsonPath::parse("$.c").unwrap(), doc("3"), ModifyMode::Replace).unwrap();
        modify(&mut v, &JsonPath::parse("$.b[5]").unwrap(), doc("9"), ModifyMode::Set).unwrap();
        assert_eq!(to_mysql_string(&v), r#"{"a": 1, "b": [1, 9]}"#);

        let mut v = doc("1");
        modify(&mut v, &JsonPath::parse("$[1]").unwrap(), doc("2"), ModifyMode::Set).unwrap();
        assert_eq!(to_mysql_string(&v), "[1, 2]");

        let mut v = doc("[1]");
        let err = modify(&mut v, &JsonPath::parse("$[*]").unwrap(), doc("2"), ModifyMode::Set);
        assert_eq!(err.unwrap_err().code(), 3149);
    }

    #[test]
    fn test_remove_and_arrays() {
        let mut v = doc(r#"[1, [2, 3], 4]"#);
        remove(&mut v, &JsonPath::parse("$[1][0]").unwrap()).unwrap();
        assert_eq!(to_mysql_string(&v), "[1, [3], 4]");
        assert_eq!(remove(&mut v, &JsonPath::parse("$").unwrap()).unwrap_err().code(), 3153);

        array_append(&mut v, &JsonPath::parse("$[0]").unwrap(), doc("5")).unwrap();
        assert_eq!(to_mysql_string(&v), "[[1, 5], [3], 4]");

        let mut v = doc("[1, 2, 3]");
        array_insert(&mut v, &JsonPath::parse("$[last]").unwrap(), doc("9")).unwrap();
        assert_eq!(to_mysql_string(&v), "[1, 2, 9, 3]");
        assert!(array_insert(&mut v, &JsonPath::parse("$.a").unwrap(), doc("9")).is_err());
    }

    #[test]
    fn test_merge() {
        let merged = merge_preserve(doc(r#"{"a": 1}"#), doc(r#"{"a": 2, "b": 3}"#));
        assert_eq!(to_mysql_string(&merged), r#"{"a": [1, 2], "b": 3}"#);
        assert_eq!(to_mysql_string(&merge_preserve(doc("1"), doc("[2]"))), "[1, 2]");

        let patched = merge_patch(doc(r#"{"a": 1, "b": 2}"#), doc(r#"{"a": null, "c": 3}"#));
        assert_eq!(to_mysql_string(&patched), r#"{"b": 2, "c": 3}"#);
    }

    #[test]
    fn test_contains_and_overlaps() {
        let target = doc(r#"{"a": 1, "b": [1, 2, {"c": 3}]}"#);
        assert!(contains(&target, &doc(r#"{"a": 1}"#)));
        assert!(contains(&target, &doc(r#"{"b": [2]}"#)));
        assert!(!contains(&target, &doc(r#"{"a": 2}"#)));
        assert!(contains(&doc("[1, 2]"), &doc("1.0")));
        assert!(overlaps(&doc("[1, 3]"), &doc("[3, 4]")));
        assert!(!overlaps(&doc("[1, 3]"), &doc("[4]")));
    }

    #[test]
    fn test_search() {
        let v = doc(r#"{"a": "abc", "b": ["x", "abd"], "c d": "ab"}"#);
        let found = search(&v, &|s: &str| s.starts_with("ab"), true);
        assert_eq!(found, vec!["$.a", "$.b[1]", "$.\"c d\""]);
        let one = search(&v, &|s: &str| s.starts_with("ab"), false);
        assert_eq!(one, vec!["$.a"]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a\tb""#).unwrap(), "a\tb");
        assert_eq!(unquote("abc").unwrap(), "abc");
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&doc("1"), &doc("1.0")), Ordering::Equal);
        assert_eq!(compare(&doc("1"), &doc("\"1\"")), Ordering::Less);
        assert_eq!(compare(&doc("[1, 2]"), &doc("[1, 3]")), Ordering::Less);
    }
}
