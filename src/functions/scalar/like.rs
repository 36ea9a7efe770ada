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

//! Pattern matching: `LIKE` and the `REGEXP` family
//!
//! LIKE patterns are compiled into a sequence of collation weights, so
//! `'Ä' LIKE 'a'` holds under an accent-insensitive collation. Simple
//! shapes take a fast path:
//!
//! - **Exact**: `'hello'`
//! - **Prefix**: `'hello%'`
//! - **Suffix**: `'%hello'`
//! - **Contains**: `'%hello%'`
//! - **General**: anything with `_` or an inner `%`
//!
//! Regular expressions use the `regex` crate. Case sensitivity follows the
//! collation unless a match type overrides it. Patterns that are constant
//! at the call site compile once at resolution; others go through a small
//! shared cache.

use std::sync::Arc;

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;

use super::{int_of, int_type, needs_cast, string_type, text_of};
use crate::collation::{self, Collation, Derivation};
use crate::core::{Datum, Error, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{
    ArgType, Call, FunctionImpl, FunctionInfo, FunctionSignature, FunctionType, PlanContext,
    Resolution, ScalarFunction,
};

pub(super) fn register(registry: &FunctionRegistry) {
    registry.register_scalar(Arc::new(Like));
    for op in [
        RegexpOp::Like,
        RegexpOp::Instr,
        RegexpOp::Substr,
        RegexpOp::Replace,
    ] {
        registry.register_scalar(Arc::new(Regexp { op, name: op.name() }));
    }
    registry.register_scalar(Arc::new(Regexp {
        op: RegexpOp::Like,
        name: "REGEXP",
    }));
    registry.register_scalar(Arc::new(Regexp {
        op: RegexpOp::Like,
        name: "RLIKE",
    }));
}

// ============================================================================
// LIKE patterns
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// A character, by collation weight
    Char(u32),
    /// `_`
    One,
    /// `%`
    Any,
}

#[derive(Debug, Clone)]
enum Shape {
    MatchAll,
    Exact(Vec<u32>),
    Prefix(Vec<u32>),
    Suffix(Vec<u32>),
    Contains(Vec<u32>),
    General,
}

/// A compiled LIKE pattern
#[derive(Debug, Clone)]
pub struct LikePattern {
    tokens: Vec<Token>,
    shape: Shape,
    collation: &'static Collation,
}

impl LikePattern {
    /// Compile `pattern`; `escape` quotes the next character
    pub fn compile(pattern: &str, escape: Option<char>, collation: &'static Collation) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            let token = match c {
                c if Some(c) == escape => match chars.next() {
                    Some(next) => Token::Char(collation.char_weight(next)),
                    None => Token::Char(collation.char_weight(c)),
                },
                '%' => {
                    if tokens.last() == Some(&Token::Any) {
                        continue;
                    }
                    Token::Any
                }
                '_' => Token::One,
                c => Token::Char(collation.char_weight(c)),
            };
            tokens.push(token);
        }
        let shape = Self::shape_of(&tokens);
        Self {
            tokens,
            shape,
            collation,
        }
    }

    fn shape_of(tokens: &[Token]) -> Shape {
        if tokens.contains(&Token::One) {
            return Shape::General;
        }
        let literal = |ts: &[Token]| -> Vec<u32> {
            ts.iter()
                .filter_map(|t| match t {
                    Token::Char(w) => Some(*w),
                    _ => None,
                })
                .collect()
        };
        let anys = tokens.iter().filter(|t| **t == Token::Any).count();
        let first_any = tokens.first() == Some(&Token::Any);
        let last_any = tokens.last() == Some(&Token::Any);
        match anys {
            0 => Shape::Exact(literal(tokens)),
            1 if tokens.len() == 1 => Shape::MatchAll,
            1 if last_any => Shape::Prefix(literal(tokens)),
            1 if first_any => Shape::Suffix(literal(tokens)),
            2 if first_any && last_any => Shape::Contains(literal(tokens)),
            _ => Shape::General,
        }
    }

    /// Whether `text` matches
    pub fn matches(&self, text: &str) -> bool {
        let weights: Vec<u32> = text.chars().map(|c| self.collation.char_weight(c)).collect();
        match &self.shape {
            Shape::MatchAll => true,
            Shape::Exact(p) => weights == *p,
            Shape::Prefix(p) => weights.starts_with(p),
            Shape::Suffix(p) => weights.ends_with(p),
            Shape::Contains(p) => {
                p.is_empty() || weights.windows(p.len()).any(|w| w == p.as_slice())
            }
            Shape::General => wildcard_match(&self.tokens, &weights),
        }
    }
}

/// Iterative wildcard matching with single-star backtracking
fn wildcard_match(tokens: &[Token], text: &[u32]) -> bool {
    let (mut t, mut s) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while s < text.len() {
        match tokens.get(t) {
            Some(Token::Any) => {
                star = Some((t, s));
                t += 1;
            }
            Some(Token::One) => {
                t += 1;
                s += 1;
            }
            Some(Token::Char(w)) if *w == text[s] => {
                t += 1;
                s += 1;
            }
            _ => match star {
                Some((st, ss)) => {
                    t = st + 1;
                    s = ss + 1;
                    star = Some((st, ss + 1));
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|tok| *tok == Token::Any)
}

/// `LIKE(str, pattern[, escape])`
pub struct Like;

impl ScalarFunction for Like {
    fn name(&self) -> &str {
        "LIKE"
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            "LIKE",
            FunctionType::Scalar,
            "Pattern match with % and _ wildcards",
            FunctionSignature::new(2, 3),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        FunctionSignature::new(2, 3).validate_arg_count("LIKE", args.len())?;
        let escape = match args.get(2) {
            None => Some('\\'),
            Some(a) => {
                let text = a
                    .const_text()
                    .ok_or_else(|| Error::incorrect_arguments("ESCAPE"))?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => None,
                    (Some(c), None) => Some(c),
                    _ => return Err(Error::incorrect_arguments("ESCAPE")),
                }
            }
        };
        let collation = comparison_collation(&args[..2], "like", plan)?;
        let text = string_type(collation);
        let mut casts: Vec<Option<FieldType>> = args[..2]
            .iter()
            .map(|a| needs_cast(&a.ty, &text).then(|| text.clone()))
            .collect();
        casts.resize(args.len(), None);
        let constant = args[1]
            .constant
            .as_ref()
            .filter(|d| !d.is_null())
            .map(|d| LikePattern::compile(&text_of(d), escape, collation));
        let ret = FieldType::boolean();
        Ok(Resolution {
            derivation: Derivation::numeric(&collation::BINARY),
            return_type: ret,
            casts,
            implementation: Arc::new(LikeImpl {
                collation,
                escape,
                constant,
            }),
        })
    }
}

fn comparison_collation(
    args: &[ArgType],
    operation: &str,
    plan: &PlanContext,
) -> Result<&'static Collation> {
    let ops: Vec<Derivation> = args
        .iter()
        .map(|a| super::string_operand(a, plan))
        .collect();
    let d = collation::resolve_for_comparison(&ops, operation)?;
    Ok(match d.coercibility {
        collation::Coercibility::Ignorable | collation::Coercibility::Numeric => plan.collation,
        _ => d.collation,
    })
}

struct LikeImpl {
    collation: &'static Collation,
    escape: Option<char>,
    constant: Option<LikePattern>,
}

impl FunctionImpl for LikeImpl {
    fn eval_row(&self, args: &[Datum], _call: &mut Call<'_>) -> Result<Datum> {
        let text = text_of(&args[0]);
        let matched = match &self.constant {
            Some(p) => p.matches(&text),
            None => LikePattern::compile(&text_of(&args[1]), self.escape, self.collation)
                .matches(&text),
        };
        Ok(Datum::boolean(matched))
    }
}

// ============================================================================
// Regular expressions
// ============================================================================

/// Maximum number of cached patterns
const MAX_CACHE_SIZE: usize = 256;

/// Flags a regular expression is compiled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RegexFlags {
    case_insensitive: bool,
    multi_line: bool,
    dot_all: bool,
}

impl RegexFlags {
    fn for_collation(collation: &Collation) -> Self {
        Self {
            case_insensitive: collation.is_case_insensitive(),
            multi_line: false,
            dot_all: false,
        }
    }

    /// Apply a MySQL match type string; later flags win
    fn with_match_type(mut self, match_type: &str) -> Result<Self> {
        for c in match_type.chars() {
            match c {
                'c' => self.case_insensitive = false,
                'i' => self.case_insensitive = true,
                'm' => self.multi_line = true,
                'n' => self.dot_all = true,
                'u' => {}
                _ => {
                    return Err(Error::Regexp(
                        "Invalid match mode flag in regular expression.".to_string(),
                    ))
                }
            }
        }
        Ok(self)
    }

    fn compile(self, pattern: &str) -> Result<Regex> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_all)
            .build()
            .map_err(|e| Error::Regexp(e.to_string()))
    }
}

/// Compiled patterns for non-constant pattern arguments
struct PatternCache {
    cache: RwLock<FxHashMap<(String, RegexFlags), Arc<Regex>>>,
}

impl PatternCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    fn get_or_compile(&self, pattern: &str, flags: RegexFlags) -> Result<Arc<Regex>> {
        let key = (pattern.to_string(), flags);
        if let Some(re) = self.cache.read().get(&key) {
            return Ok(Arc::clone(re));
        }
        let re = Arc::new(flags.compile(pattern)?);
        let mut cache = self.cache.write();
        if cache.len() >= MAX_CACHE_SIZE {
            // Simple eviction: clear half the cache
            let keys: Vec<_> = cache.keys().take(MAX_CACHE_SIZE / 2).cloned().collect();
            for k in keys {
                cache.remove(&k);
            }
        }
        cache.insert(key, Arc::clone(&re));
        Ok(re)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexpOp {
    /// `REGEXP_LIKE(expr, pat[, match_type])`
    Like,
    /// `REGEXP_INSTR(expr, pat[, pos[, occurrence[, return_option[, match_type]]]])`
    Instr,
    /// `REGEXP_SUBSTR(expr, pat[, pos[, occurrence[, match_type]]])`
    Substr,
    /// `REGEXP_REPLACE(expr, pat, repl[, pos[, occurrence[, match_type]]])`
    Replace,
}

impl RegexpOp {
    pub fn name(self) -> &'static str {
        match self {
            RegexpOp::Like => "REGEXP_LIKE",
            RegexpOp::Instr => "REGEXP_INSTR",
            RegexpOp::Substr => "REGEXP_SUBSTR",
            RegexpOp::Replace => "REGEXP_REPLACE",
        }
    }

    fn signature(self) -> FunctionSignature {
        match self {
            RegexpOp::Like => FunctionSignature::new(2, 3),
            RegexpOp::Instr => FunctionSignature::new(2, 6),
            RegexpOp::Substr => FunctionSignature::new(2, 5),
            RegexpOp::Replace => FunctionSignature::new(3, 6),
        }
    }

    /// Number of leading string arguments
    fn strings(self) -> usize {
        match self {
            RegexpOp::Replace => 3,
            _ => 2,
        }
    }

    /// Position of the match type argument
    fn match_type_index(self) -> usize {
        match self {
            RegexpOp::Like => 2,
            RegexpOp::Instr | RegexpOp::Replace => 5,
            RegexpOp::Substr => 4,
        }
    }
}

/// A function of the REGEXP family
pub struct Regexp {
    op: RegexpOp,
    name: &'static str,
}

impl ScalarFunction for Regexp {
    fn name(&self) -> &str {
        self.name
    }

    fn info(&self) -> FunctionInfo {
        FunctionInfo::new(
            self.name,
            FunctionType::Scalar,
            "Regular expression match",
            self.op.signature(),
        )
    }

    fn resolve(&self, args: &[ArgType], plan: &PlanContext) -> Result<Resolution> {
        self.op.signature().validate_arg_count(self.name, args.len())?;
        let operation = self.name.to_ascii_lowercase();
        let strings = self.op.strings();
        let collation = comparison_collation(&args[..strings], &operation, plan)?;
        let text = string_type(collation);
        let match_index = self.op.match_type_index();
        let casts = args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if i < strings || i == match_index {
                    needs_cast(&a.ty, &text).then(|| text.clone())
                } else {
                    needs_cast(&a.ty, &int_type()).then(int_type)
                }
            })
            .collect();

        let base = RegexFlags::for_collation(collation);
        let flags = match args.get(match_index) {
            None => Some(base),
            Some(a) => match a.const_text() {
                Some(t) => Some(base.with_match_type(&t)?),
                None => None,
            },
        };
        let constant = match (flags, args[1].constant.as_ref()) {
            (Some(flags), Some(p)) if !p.is_null() => Some(Arc::new(flags.compile(&text_of(p))?)),
            _ => None,
        };

        let (ret, derivation) = match self.op {
            RegexpOp::Like => (FieldType::boolean(), Derivation::numeric(&collation::BINARY)),
            RegexpOp::Instr => (FieldType::long_long(), Derivation::numeric(&collation::BINARY)),
            RegexpOp::Substr | RegexpOp::Replace => {
                let d = super::string_derivation(&args[..strings], &operation, plan)?;
                (text.clone(), Derivation { collation, ..d })
            }
        };
        Ok(Resolution {
            return_type: ret,
            derivation,
            casts,
            implementation: Arc::new(RegexpImpl {
                op: self.op,
                collation,
                constant,
                cache: PatternCache::new(),
            }),
        })
    }
}

struct RegexpImpl {
    op: RegexpOp,
    collation: &'static Collation,
    constant: Option<Arc<Regex>>,
    cache: PatternCache,
}

/// Byte offset of 1-based character position `pos`
fn byte_offset(text: &str, pos: i64) -> Result<usize> {
    let chars = text.chars().count() as i64;
    if pos < 1 || pos > chars + 1 {
        return Err(Error::Regexp(
            "Index out of bounds in regular expression search.".to_string(),
        ));
    }
    Ok(text
        .char_indices()
        .nth((pos - 1) as usize)
        .map(|(i, _)| i)
        .unwrap_or(text.len()))
}

impl RegexpImpl {
    fn regex(&self, args: &[Datum]) -> Result<Arc<Regex>> {
        if let Some(re) = &self.constant {
            return Ok(Arc::clone(re));
        }
        let mut flags = RegexFlags::for_collation(self.collation);
        if let Some(m) = args.get(self.op.match_type_index()) {
            flags = flags.with_match_type(&text_of(m))?;
        }
        self.cache.get_or_compile(&text_of(&args[1]), flags)
    }

    fn text(&self, s: &str) -> Datum {
        super::encode(s, self.collation)
    }
}

impl FunctionImpl for RegexpImpl {
    fn eval_row(&self, args: &[Datum], _call: &mut Call<'_>) -> Result<Datum> {
        let re = self.regex(args)?;
        let subject = text_of(&args[0]);
        let arg_int = |i: usize, default: i64| args.get(i).map(int_of).unwrap_or(default);
        match self.op {
            RegexpOp::Like => Ok(Datum::boolean(re.is_match(&subject))),
            RegexpOp::Instr => {
                let start = byte_offset(&subject, arg_int(2, 1))?;
                let occurrence = arg_int(3, 1).max(1) as usize;
                let return_end = match arg_int(4, 0) {
                    0 => false,
                    1 => true,
                    _ => return Err(Error::incorrect_arguments("regexp_instr")),
                };
                let found = re.find_iter(&subject[start..]).nth(occurrence - 1);
                Ok(Datum::Int(match found {
                    Some(m) => {
                        let byte = start + if return_end { m.end() } else { m.start() };
                        subject[..byte].chars().count() as i64 + 1
                    }
                    None => 0,
                }))
            }
            RegexpOp::Substr => {
                let start = byte_offset(&subject, arg_int(2, 1))?;
                let occurrence = arg_int(3, 1).max(1) as usize;
                Ok(match re.find_iter(&subject[start..]).nth(occurrence - 1) {
                    Some(m) => self.text(m.as_str()),
                    None => Datum::Null,
                })
            }
            RegexpOp::Replace => {
                let replacement = text_of(&args[2]);
                let start = byte_offset(&subject, arg_int(3, 1))?;
                let occurrence = arg_int(4, 0).max(0) as usize;
                let (head, tail) = subject.split_at(start);
                let replaced = if occurrence == 0 {
                    re.replace_all(tail, replacement.as_ref()).into_owned()
                } else {
                    replace_nth(&re, tail, &replacement, occurrence)
                };
                Ok(self.text(&format!("{}{}", head, replaced)))
            }
        }
    }
}

/// Replace only the `n`-th match (1-based)
fn replace_nth(re: &Regex, text: &str, replacement: &str, n: usize) -> String {
    match re.captures_iter(text).nth(n - 1) {
        Some(caps) => {
            let Some(m) = caps.get(0) else {
                return text.to_string();
            };
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..m.start()]);
            caps.expand(replacement, &mut out);
            out.push_str(&text[m.end()..]);
            out
        }
        None => text.to_string(),
    }
}
