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

//! String scalar functions
//!
//! Positions and lengths count characters, except `LENGTH` and
//! `BIT_LENGTH` which count bytes in the argument's character set.
//! Binary strings are handled byte by byte.
//!
//! `LOCATE`, `INSTR`, `FIELD` and `FIND_IN_SET` match under the resolved
//! collation; `REPLACE` and `SUBSTRING_INDEX` always match exactly.

use memchr::{memchr, memchr_iter, memmem};

use super::bitwise::bits_of;
use super::math::{conv_text, round_real};
use super::{
    decimal_type, int_of, int_type, needs_cast, numeric_class, real_of, register_all,
    string_derivation, string_type, text_of, Aux, Bound, Builtin, Signature,
};
use crate::collation::{self, Charset, Collation, Derivation};
use crate::core::{decimal, Datum, Error, EvalType, FieldType, Result};
use crate::functions::registry::FunctionRegistry;
use crate::functions::{ArgType, Call, FunctionSignature as Sig, PlanContext};

/// Longest string a function may build, as `max_allowed_packet`
pub const MAX_STRING_LENGTH: usize = 64 * 1024 * 1024;

pub(super) fn register(registry: &FunctionRegistry) {
    let length = Builtin::new("LENGTH", Sig::exact(1), resolve_measure, eval_length)
        .describe("Length of a string in bytes");
    let char_length = Builtin::new("CHAR_LENGTH", Sig::exact(1), resolve_measure, eval_char_length)
        .describe("Length of a string in characters");
    let lower = Builtin::new("LOWER", Sig::exact(1), resolve_text, eval_lower)
        .describe("Converts a string to lowercase");
    let upper = Builtin::new("UPPER", Sig::exact(1), resolve_text, eval_upper)
        .describe("Converts a string to uppercase");
    let substring = Builtin::new("SUBSTRING", Sig::new(2, 3), resolve_str_int, eval_substring)
        .describe("Substring starting at a position");
    register_all(
        registry,
        vec![
            length,
            length.alias("OCTET_LENGTH"),
            char_length,
            char_length.alias("CHARACTER_LENGTH"),
            Builtin::new("BIT_LENGTH", Sig::exact(1), resolve_measure, eval_bit_length),
            Builtin::new("ASCII", Sig::exact(1), resolve_measure, eval_ascii)
                .describe("Numeric value of the leftmost byte"),
            Builtin::new("ORD", Sig::exact(1), resolve_measure, eval_ord)
                .describe("Code of the leftmost character"),
            lower,
            lower.alias("LCASE"),
            upper,
            upper.alias("UCASE"),
            Builtin::new("CONCAT", Sig::variadic(1), resolve_text, eval_concat)
                .describe("Concatenates strings"),
            Builtin::new("CONCAT_WS", Sig::variadic(2), resolve_text, eval_concat_ws)
                .tolerant()
                .describe("Concatenates strings with a separator, skipping NULLs"),
            substring,
            substring.alias("SUBSTR"),
            substring.alias("MID"),
            Builtin::new("LEFT", Sig::exact(2), resolve_str_int, eval_left),
            Builtin::new("RIGHT", Sig::exact(2), resolve_str_int, eval_right),
            Builtin::new(
                "SUBSTRING_INDEX",
                Sig::exact(3),
                resolve_substring_index,
                eval_substring_index,
            )
            .describe("Substring before the count-th delimiter"),
            Builtin::new("LOCATE", Sig::new(2, 3), resolve_search, eval_locate)
                .describe("Position of the first occurrence of a substring"),
            Builtin::new("POSITION", Sig::exact(2), resolve_search, eval_locate),
            Builtin::new("INSTR", Sig::exact(2), resolve_search, eval_instr),
            Builtin::new("REPLACE", Sig::exact(3), resolve_text, eval_replace)
                .describe("Replaces every occurrence of a substring"),
            Builtin::new("REPEAT", Sig::exact(2), resolve_str_int, eval_repeat),
            Builtin::new("SPACE", Sig::exact(1), resolve_space, eval_space),
            Builtin::new("REVERSE", Sig::exact(1), resolve_text, eval_reverse),
            Builtin::new("INSERT", Sig::exact(4), resolve_insert, eval_insert)
                .describe("Replaces a substring at a position"),
            Builtin::new("LPAD", Sig::exact(3), resolve_pad, eval_lpad),
            Builtin::new("RPAD", Sig::exact(3), resolve_pad, eval_rpad),
            Builtin::new("LTRIM", Sig::exact(1), resolve_text, eval_ltrim),
            Builtin::new("RTRIM", Sig::exact(1), resolve_text, eval_rtrim),
            Builtin::new("TRIM", Sig::new(1, 3), resolve_trim, eval_trim)
                .describe("TRIM(str [, remstr [, 'BOTH' | 'LEADING' | 'TRAILING']])"),
            Builtin::new("FIELD", Sig::variadic(2), resolve_field, eval_field)
                .tolerant()
                .describe("Index of the first argument in the rest"),
            Builtin::new("FIND_IN_SET", Sig::exact(2), resolve_search, eval_find_in_set),
            Builtin::new("ELT", Sig::variadic(2), resolve_elt, eval_elt)
                .tolerant()
                .describe("N-th string of the list"),
            Builtin::new("MAKE_SET", Sig::variadic(2), resolve_make_set, eval_make_set)
                .tolerant(),
            Builtin::new("EXPORT_SET", Sig::new(3, 5), resolve_export_set, eval_export_set),
            Builtin::new("FORMAT", Sig::new(2, 3), resolve_format, eval_format)
                .describe("Number formatted as '#,###,###.##'"),
            Builtin::new("HEX", Sig::exact(1), resolve_hex, eval_hex),
            Builtin::new("UNHEX", Sig::exact(1), resolve_unhex, eval_unhex),
            Builtin::new("BIN", Sig::exact(1), resolve_radix, eval_bin),
            Builtin::new("OCT", Sig::exact(1), resolve_radix, eval_oct),
            Builtin::new("CHAR", Sig::variadic(1), resolve_char, eval_char)
                .tolerant()
                .describe("Binary string of the given byte codes"),
            Builtin::new("SOUNDEX", Sig::exact(1), resolve_text, eval_soundex),
            Builtin::new("QUOTE", Sig::exact(1), resolve_text, eval_quote)
                .tolerant()
                .describe("Quotes a string as an SQL literal"),
        ],
    );
}

// ============================================================================
// Resolution
// ============================================================================

/// How one argument position is converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// String in the unified collation
    Str,
    /// BIGINT
    Int,
    /// Kept as a number; strings become exact integers (bit masks)
    Bits,
}

/// Unify the collation over the `Str` slots and convert every argument.
/// The last slot repeats for variadic tails.
fn layout(
    args: &[ArgType],
    slots: &[Slot],
    comparison: bool,
    plan: &PlanContext,
) -> Result<(Derivation, Vec<Option<FieldType>>)> {
    let slot = |i: usize| slots.get(i).or(slots.last()).copied().unwrap_or(Slot::Str);
    let strings: Vec<ArgType> = args
        .iter()
        .enumerate()
        .filter(|(i, _)| slot(*i) == Slot::Str)
        .map(|(_, a)| a.clone())
        .collect();
    let mut d = string_derivation(&strings, "", plan)?;
    if comparison {
        let ops: Vec<Derivation> = strings
            .iter()
            .map(|a| super::string_operand(a, plan))
            .collect();
        if !ops.is_empty() {
            d.collation = collation::resolve_for_comparison(&ops, "")?.collation;
        }
    }
    let text = string_type(d.collation);
    let casts = args
        .iter()
        .enumerate()
        .map(|(i, a)| match slot(i) {
            Slot::Str => needs_cast(&a.ty, &text).then(|| text.clone()),
            Slot::Int => needs_cast(&a.ty, &int_type()).then(int_type),
            Slot::Bits => match a.eval_type() {
                EvalType::Int | EvalType::Decimal | EvalType::Real => None,
                _ if a.is_null() => None,
                _ => Some(decimal_type(21, 0)),
            },
        })
        .collect();
    Ok((d, casts))
}

fn text_signature(args: &[ArgType], slots: &[Slot], plan: &PlanContext) -> Result<Signature> {
    let (d, casts) = layout(args, slots, false, plan)?;
    Ok(Signature::new(string_type(d.collation))
        .casts(casts)
        .derivation(d))
}

/// Integer result computed under the comparison collation of the strings
fn search_signature(args: &[ArgType], slots: &[Slot], plan: &PlanContext) -> Result<Signature> {
    let (d, casts) = layout(args, slots, true, plan)?;
    Ok(Signature::new(FieldType::long_long())
        .casts(casts)
        .aux(Aux::Collation(d.collation)))
}

fn resolve_text(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(args, &[Slot::Str], plan)
}

fn resolve_str_int(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(args, &[Slot::Str, Slot::Int], plan)
}

fn resolve_substring_index(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(args, &[Slot::Str, Slot::Str, Slot::Int], plan)
}

fn resolve_insert(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(args, &[Slot::Str, Slot::Int, Slot::Int, Slot::Str], plan)
}

fn resolve_pad(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(args, &[Slot::Str, Slot::Int, Slot::Str], plan)
}

fn resolve_elt(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(args, &[Slot::Int, Slot::Str], plan)
}

fn resolve_make_set(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(args, &[Slot::Bits, Slot::Str], plan)
}

fn resolve_export_set(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    text_signature(
        args,
        &[Slot::Bits, Slot::Str, Slot::Str, Slot::Str, Slot::Int],
        plan,
    )
}

fn resolve_space(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let (_, casts) = layout(args, &[Slot::Int], false, plan)?;
    Ok(Signature::new(string_type(plan.collation)).casts(casts))
}

fn resolve_search(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    search_signature(args, &[Slot::Str, Slot::Str, Slot::Int], plan)
}

/// String measures: the argument keeps its own character set
fn resolve_measure(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let (_, casts) = layout(args, &[Slot::Str], false, plan)?;
    Ok(Signature::new(FieldType::long_long()).casts(casts))
}

/// TRIM direction, fixed at plan time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrimSide {
    Both = 0,
    Leading = 1,
    Trailing = 2,
}

fn resolve_trim(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let side = match args.get(2) {
        None => TrimSide::Both,
        Some(a) => match a.const_text().map(|t| t.to_ascii_uppercase()).as_deref() {
            Some("BOTH") => TrimSide::Both,
            Some("LEADING") => TrimSide::Leading,
            Some("TRAILING") => TrimSide::Trailing,
            _ => return Err(Error::incorrect_arguments("trim")),
        },
    };
    let mut sig = text_signature(&args[..args.len().min(2)], &[Slot::Str], plan)?;
    if args.len() == 3 {
        sig.casts.push(None);
    }
    Ok(sig.aux(Aux::Int(side as i64)))
}

/// FIELD compares as strings when every argument is a string, otherwise
/// as doubles
fn resolve_field(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let all_strings = args
        .iter()
        .filter(|a| !a.is_null())
        .all(|a| a.eval_type() == EvalType::String);
    if all_strings {
        return search_signature(args, &[Slot::Str], plan);
    }
    let double = FieldType::double();
    let casts = args
        .iter()
        .map(|a| needs_cast(&a.ty, &double).then(|| double.clone()))
        .collect();
    Ok(Signature::new(FieldType::long_long()).casts(casts))
}

fn resolve_format(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let number = match numeric_class(&args[0].ty) {
        EvalType::Real => FieldType::double(),
        _ => decimal_type(
            super::decimal_int_digits(&args[0].ty),
            super::decimal_scale(&args[0].ty),
        ),
    };
    let mut casts = vec![needs_cast(&args[0].ty, &number).then_some(number)];
    casts.push(needs_cast(&args[1].ty, &int_type()).then(int_type));
    let ret = string_type(plan.collation);
    Ok(Signature::new(ret).casts(casts))
}

/// HEX reads numbers as integers and everything else as a string
fn resolve_hex(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let cast = match args[0].eval_type() {
        EvalType::Int | EvalType::Decimal | EvalType::Real | EvalType::String => None,
        _ => Some(string_type(plan.collation)),
    };
    Ok(Signature::new(string_type(plan.collation)).casts(vec![cast]))
}

fn resolve_unhex(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let (_, casts) = layout(args, &[Slot::Str], false, plan)?;
    Ok(Signature::new(FieldType::varbinary()).casts(casts))
}

fn resolve_radix(_args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(plan.collation)))
}

fn resolve_char(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let (_, casts) = layout(args, &[Slot::Bits], false, plan)?;
    Ok(Signature::new(FieldType::varbinary()).casts(casts))
}

// ============================================================================
// Helpers
// ============================================================================

#[inline]
fn chars(d: &Datum) -> Vec<char> {
    text_of(d).chars().collect()
}

/// Bytes of a string in its own character set
pub(crate) fn charset_bytes(d: &Datum) -> Vec<u8> {
    match d {
        Datum::Bytes(b) => b.to_vec(),
        Datum::Str { text, collation } => match collation.charset {
            Charset::Ascii | Charset::Latin1 => text.chars().map(|c| c as u32 as u8).collect(),
            _ => text.as_bytes().to_vec(),
        },
        other => other.to_string().into_bytes(),
    }
}

fn byte_len(d: &Datum) -> usize {
    match d {
        Datum::Bytes(b) => b.len(),
        Datum::Str { text, collation } => collation.charset.byte_len(text),
        other => other.to_string().len(),
    }
}

fn collation_of(b: &Bound) -> &'static Collation {
    match b.aux {
        Aux::Collation(c) => c,
        _ => b.derivation.collation,
    }
}

/// Character index of the first match of `needle` in `hay` at or after
/// `from`, matching characters by collation weight
pub(crate) fn find_chars(
    hay: &[char],
    needle: &[char],
    collation: &Collation,
    from: usize,
) -> Option<usize> {
    if needle.is_empty() {
        return (from <= hay.len()).then_some(from);
    }
    if needle.len() > hay.len() || from > hay.len() - needle.len() {
        return None;
    }
    let exact = collation.is_binary();
    let same = |a: char, b: char| {
        if exact {
            a == b
        } else {
            a == b || collation.char_weight(a) == collation.char_weight(b)
        }
    };
    (from..=hay.len() - needle.len()).find(|&i| {
        hay[i..i + needle.len()]
            .iter()
            .zip(needle)
            .all(|(&a, &b)| same(a, b))
    })
}

/// Result too long to build
fn too_long(chars: usize) -> bool {
    chars > MAX_STRING_LENGTH
}

// ============================================================================
// Measures
// ============================================================================

fn eval_length(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(byte_len(&args[0]) as i64))
}

fn eval_char_length(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(text_of(&args[0]).chars().count() as i64))
}

fn eval_bit_length(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(byte_len(&args[0]) as i64 * 8))
}

fn eval_ascii(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(
        charset_bytes(&args[0]).first().copied().unwrap_or(0) as i64,
    ))
}

fn eval_ord(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let code = match &args[0] {
        Datum::Str { text, collation } if collation.charset.max_len() > 1 => {
            match text.chars().next() {
                Some(c) => {
                    let mut buf = [0u8; 4];
                    c.encode_utf8(&mut buf)
                        .bytes()
                        .fold(0i64, |acc, b| (acc << 8) | b as i64)
                }
                None => 0,
            }
        }
        other => charset_bytes(other).first().copied().unwrap_or(0) as i64,
    };
    Ok(Datum::Int(code))
}

// ============================================================================
// Case, concatenation
// ============================================================================

fn eval_lower(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if b.is_binary() {
        return Ok(args[0].clone());
    }
    Ok(b.text(text_of(&args[0]).to_lowercase()))
}

fn eval_upper(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if b.is_binary() {
        return Ok(args[0].clone());
    }
    Ok(b.text(text_of(&args[0]).to_uppercase()))
}

fn eval_concat(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let mut out = String::new();
    for a in args {
        out.push_str(&text_of(a));
    }
    if too_long(out.len()) {
        return Ok(Datum::Null);
    }
    Ok(b.text(out))
}

fn eval_concat_ws(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if args[0].is_null() {
        return Ok(Datum::Null);
    }
    let sep = text_of(&args[0]);
    let parts: Vec<_> = args[1..]
        .iter()
        .filter(|a| !a.is_null())
        .map(text_of)
        .collect();
    Ok(b.text(parts.join(sep.as_ref())))
}

// ============================================================================
// Substrings
// ============================================================================

fn substring(chars: &[char], pos: i64, len: Option<i64>) -> String {
    let n = chars.len() as i64;
    if pos == 0 || pos > n || pos < -n {
        return String::new();
    }
    let start = if pos > 0 { pos - 1 } else { n + pos };
    let len = len.unwrap_or(n);
    if len <= 0 {
        return String::new();
    }
    let end = start.saturating_add(len).min(n);
    chars[start as usize..end as usize].iter().collect()
}

fn eval_substring(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let pos = int_of(&args[1]);
    let len = args.get(2).map(int_of);
    Ok(b.text(substring(&chars(&args[0]), pos, len)))
}

fn eval_left(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let n = int_of(&args[1]).max(0) as usize;
    Ok(b.text(text_of(&args[0]).chars().take(n).collect::<String>()))
}

fn eval_right(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let c = chars(&args[0]);
    let n = (int_of(&args[1]).max(0) as usize).min(c.len());
    Ok(b.text(c[c.len() - n..].iter().collect::<String>()))
}

fn eval_substring_index(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let s = text_of(&args[0]);
    let delim = text_of(&args[1]);
    let count = int_of(&args[2]);
    if delim.is_empty() || count == 0 {
        return Ok(b.text(""));
    }
    let out = if count > 0 {
        match s.match_indices(delim.as_ref()).nth(count as usize - 1) {
            Some((i, _)) => &s[..i],
            None => &s[..],
        }
    } else {
        match s.rmatch_indices(delim.as_ref()).nth(count.unsigned_abs() as usize - 1) {
            Some((i, _)) => &s[i + delim.len()..],
            None => &s[..],
        }
    };
    Ok(b.text(out))
}

/// LOCATE(substr, str[, pos]); 1-based, 0 when absent
fn eval_locate(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let pos = args.get(2).map(int_of).unwrap_or(1);
    if pos < 1 {
        return Ok(Datum::Int(0));
    }
    let hay = chars(&args[1]);
    let needle = chars(&args[0]);
    let found = find_chars(&hay, &needle, collation_of(b), (pos - 1) as usize);
    Ok(Datum::Int(found.map(|i| i as i64 + 1).unwrap_or(0)))
}

fn eval_instr(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let found = find_chars(&chars(&args[0]), &chars(&args[1]), collation_of(b), 0);
    Ok(Datum::Int(found.map(|i| i as i64 + 1).unwrap_or(0)))
}

fn eval_replace(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let s = text_of(&args[0]);
    let from = text_of(&args[1]);
    if from.is_empty() {
        return Ok(b.text(s));
    }
    let to = text_of(&args[2]);
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for at in memmem::find_iter(s.as_bytes(), from.as_bytes()) {
        out.push_str(&s[last..at]);
        out.push_str(&to);
        last = at + from.len();
    }
    out.push_str(&s[last..]);
    if too_long(out.len()) {
        return Ok(Datum::Null);
    }
    Ok(b.text(out))
}

fn eval_insert(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let c = chars(&args[0]);
    let n = c.len() as i64;
    let (pos, len) = (int_of(&args[1]), int_of(&args[2]));
    if pos < 1 || pos > n {
        return Ok(b.text(text_of(&args[0])));
    }
    let start = (pos - 1) as usize;
    let end = if len < 0 || len > n - start as i64 {
        c.len()
    } else {
        start + len as usize
    };
    let mut out: String = c[..start].iter().collect();
    out.push_str(&text_of(&args[3]));
    out.extend(&c[end..]);
    Ok(b.text(out))
}

// ============================================================================
// Repetition and padding
// ============================================================================

fn eval_repeat(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let n = int_of(&args[1]);
    let s = text_of(&args[0]);
    if n < 1 || s.is_empty() {
        return Ok(b.text(""));
    }
    if too_long(s.len().saturating_mul(n as usize)) {
        return Ok(Datum::Null);
    }
    Ok(b.text(s.repeat(n as usize)))
}

fn eval_space(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let n = int_of(&args[0]).max(0) as usize;
    if too_long(n) {
        return Ok(Datum::Null);
    }
    Ok(b.text(" ".repeat(n)))
}

fn eval_reverse(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(text_of(&args[0]).chars().rev().collect::<String>()))
}

fn pad(args: &[Datum], b: &Bound, left: bool) -> Datum {
    let len = int_of(&args[1]);
    if len < 0 || too_long(len as usize) {
        return Datum::Null;
    }
    let len = len as usize;
    let c = chars(&args[0]);
    if len <= c.len() {
        return b.text(c[..len].iter().collect::<String>());
    }
    let filler: Vec<char> = chars(&args[2]);
    if filler.is_empty() {
        return Datum::Null;
    }
    let padding: String = filler.iter().cycle().take(len - c.len()).collect();
    let body: String = c.iter().collect();
    if left {
        b.text(padding + &body)
    } else {
        b.text(body + &padding)
    }
}

fn eval_lpad(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(pad(args, b, true))
}

fn eval_rpad(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(pad(args, b, false))
}

// ============================================================================
// Trimming
// ============================================================================

fn eval_ltrim(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(text_of(&args[0]).trim_start_matches(' ')))
}

fn eval_rtrim(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(text_of(&args[0]).trim_end_matches(' ')))
}

fn eval_trim(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let s = text_of(&args[0]);
    let rem = args.get(1).map(text_of);
    let rem = rem.as_deref().unwrap_or(" ");
    if rem.is_empty() {
        return Ok(b.text(s));
    }
    let side = match b.aux {
        Aux::Int(1) => TrimSide::Leading,
        Aux::Int(2) => TrimSide::Trailing,
        _ => TrimSide::Both,
    };
    let mut out: &str = &s;
    if side != TrimSide::Trailing {
        while let Some(rest) = out.strip_prefix(rem) {
            out = rest;
        }
    }
    if side != TrimSide::Leading {
        while let Some(rest) = out.strip_suffix(rem) {
            out = rest;
        }
    }
    Ok(b.text(out))
}

// ============================================================================
// Lists
// ============================================================================

fn eval_field(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if args[0].is_null() {
        return Ok(Datum::Int(0));
    }
    let position = match b.aux {
        Aux::Collation(c) => {
            let needle = text_of(&args[0]);
            args[1..]
                .iter()
                .position(|a| !a.is_null() && c.equals(&text_of(a), &needle))
        }
        _ => {
            let needle = real_of(&args[0]);
            args[1..]
                .iter()
                .position(|a| !a.is_null() && real_of(a) == needle)
        }
    };
    Ok(Datum::Int(position.map(|i| i as i64 + 1).unwrap_or(0)))
}

fn eval_find_in_set(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let needle = text_of(&args[0]);
    let list = text_of(&args[1]);
    if memchr(b',', needle.as_bytes()).is_some() || list.is_empty() {
        return Ok(Datum::Int(0));
    }
    let c = collation_of(b);
    let mut start = 0;
    let mut items = memchr_iter(b',', list.as_bytes())
        .chain(std::iter::once(list.len()))
        .map(|end| {
            let item = &list[start..end];
            start = end + 1;
            item
        });
    let position = items.position(|item| c.equals(item, &needle));
    Ok(Datum::Int(position.map(|i| i as i64 + 1).unwrap_or(0)))
}

fn eval_elt(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if args[0].is_null() {
        return Ok(Datum::Null);
    }
    let n = int_of(&args[0]);
    if n < 1 || n as usize >= args.len() {
        return Ok(Datum::Null);
    }
    match &args[n as usize] {
        Datum::Null => Ok(Datum::Null),
        d => Ok(b.text(text_of(d))),
    }
}

fn eval_make_set(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if args[0].is_null() {
        return Ok(Datum::Null);
    }
    let bits = bits_of(&args[0]);
    let parts: Vec<_> = args[1..]
        .iter()
        .enumerate()
        .filter(|(i, a)| *i < 64 && bits & (1u64 << i) != 0 && !a.is_null())
        .map(|(_, a)| text_of(a))
        .collect();
    Ok(b.text(parts.join(",")))
}

fn eval_export_set(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let bits = bits_of(&args[0]);
    let (on, off) = (text_of(&args[1]), text_of(&args[2]));
    let sep = args.get(3).map(text_of);
    let sep = sep.as_deref().unwrap_or(",");
    let count = match args.get(4).map(int_of) {
        Some(n) if (0..=64).contains(&n) => n as usize,
        _ => 64,
    };
    let parts: Vec<&str> = (0..count)
        .map(|i| if bits & (1u64 << i) != 0 { &*on } else { &*off })
        .collect();
    Ok(b.text(parts.join(sep)))
}

// ============================================================================
// FORMAT
// ============================================================================

/// Separators for FORMAT's optional locale
fn locale_separators(locale: &str) -> (char, char) {
    match locale.to_ascii_lowercase().as_str() {
        "de_de" | "es_es" | "it_it" | "nl_nl" | "pt_br" | "da_dk" | "id_id" => ('.', ','),
        "fr_fr" | "ru_ru" | "sv_se" | "fi_fi" | "nb_no" | "pl_pl" | "cs_cz" => (' ', ','),
        "de_ch" => ('\'', '.'),
        _ => (',', '.'),
    }
}

/// Group the integer digits of a plain decimal rendering
pub(crate) fn group_digits(plain: &str, group: char, point: char) -> String {
    let (sign, body) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let mut out = String::with_capacity(plain.len() + int_part.len() / 3 + 1);
    out.push_str(sign);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(group);
        }
        out.push(c);
    }
    if let Some(f) = frac {
        out.push(point);
        out.push_str(f);
    }
    out
}

fn eval_format(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let digits = int_of(&args[1]).clamp(0, 30);
    let plain = match &args[0] {
        Datum::Float(f) => {
            let r = round_real(*f, digits);
            if !r.is_finite() {
                return Ok(b.text(r.to_string()));
            }
            format!("{:.*}", digits as usize, r)
        }
        other => {
            let d = super::decimal_of(other);
            let scale = digits.min(decimal::MAX_SCALE as i64);
            let mut s = decimal::with_scale(decimal::round(d, scale), scale as u32).to_string();
            if digits > scale {
                if !s.contains('.') {
                    s.push('.');
                }
                s.extend(std::iter::repeat('0').take((digits - scale) as usize));
            }
            s
        }
    };
    let plain = if plain.starts_with("-") && plain.trim_start_matches(|c| c == '-' || c == '0' || c == '.').is_empty() {
        plain.trim_start_matches('-').to_string()
    } else {
        plain
    };
    let locale = args.get(2).map(text_of);
    let (group, point) = locale_separators(locale.as_deref().unwrap_or("en_US"));
    Ok(b.text(group_digits(&plain, group, point)))
}

// ============================================================================
// Radix conversions
// ============================================================================

fn eval_hex(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let out = match &args[0] {
        d @ (Datum::Int(_) | Datum::UInt(_) | Datum::Float(_) | Datum::Decimal(_)) => {
            format!("{:X}", bits_of(d))
        }
        other => hex::encode_upper(charset_bytes(other)),
    };
    Ok(b.text(out))
}

fn eval_unhex(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let text = text_of(&args[0]);
    let padded = if text.len() % 2 == 1 {
        format!("0{}", text)
    } else {
        text.into_owned()
    };
    Ok(match hex::decode(padded) {
        Ok(bytes) => Datum::bytes(bytes),
        Err(_) => Datum::Null,
    })
}

fn eval_bin(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(super::opt_text(b, conv_text(&text_of(&args[0]), 10, 2)))
}

fn eval_oct(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(super::opt_text(b, conv_text(&text_of(&args[0]), 10, 8)))
}

fn eval_char(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let mut out = Vec::with_capacity(args.len());
    for a in args.iter().filter(|a| !a.is_null()) {
        let code = bits_of(a) as u32;
        let bytes = code.to_be_bytes();
        let skip = bytes.iter().take(3).take_while(|&&b| b == 0).count();
        out.extend_from_slice(&bytes[skip..]);
    }
    Ok(Datum::bytes(out))
}

// ============================================================================
// SOUNDEX, QUOTE
// ============================================================================

const SOUNDEX_CODES: &[u8; 26] = b"01230120022455012623010202";

fn soundex_code(c: char) -> u8 {
    SOUNDEX_CODES[(c.to_ascii_uppercase() as u8 - b'A') as usize]
}

pub(crate) fn soundex(s: &str) -> String {
    let mut letters = s.chars().filter(char::is_ascii_alphabetic);
    let Some(first) = letters.next() else {
        return String::new();
    };
    let mut out = String::new();
    out.push(first.to_ascii_uppercase());
    let mut last = soundex_code(first);
    for c in letters {
        let code = soundex_code(c);
        if code != b'0' && code != last {
            out.push(code as char);
            last = code;
        }
    }
    while out.len() < 4 {
        out.push('0');
    }
    out
}

fn eval_soundex(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(b.text(soundex(&text_of(&args[0]))))
}

fn eval_quote(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    if args[0].is_null() {
        return Ok(b.text("NULL"));
    }
    let s = text_of(&args[0]);
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\0' => out.push_str("\\0"),
            '\u{1a}' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out.push('\'');
    Ok(b.text(out))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{dec, eval, eval_with, f, i, s};
    use super::*;
    use crate::collation::{LATIN1_SWEDISH_CI, UTF8MB4_BIN};
    use crate::diagnostics::Diagnostics;
    use crate::eval::EvalContext;

    #[test]
    fn test_lengths() {
        assert_eq!(eval("LENGTH", &[s("héllo")]), "6");
        assert_eq!(eval("CHAR_LENGTH", &[s("héllo")]), "5");
        assert_eq!(eval("BIT_LENGTH", &[s("ab")]), "16");
        assert_eq!(
            eval("LENGTH", &[Datum::text_in("é", &LATIN1_SWEDISH_CI)]),
            "1"
        );
        assert_eq!(eval("LENGTH", &[i(1234)]), "4");
        assert_eq!(eval("ASCII", &[s("2")]), "50");
        assert_eq!(eval("ASCII", &[s("")]), "0");
        assert_eq!(eval("ORD", &[s("é")]), "50089");
    }

    #[test]
    fn test_case_and_concat() {
        assert_eq!(eval("UPPER", &[s("héllo")]), "HÉLLO");
        assert_eq!(eval("LCASE", &[s("ABC")]), "abc");
        assert_eq!(eval("LOWER", &[Datum::bytes(b"ABC")]), "ABC");
        assert_eq!(eval("CONCAT", &[s("a"), i(1), f(1.5)]), "a11.5");
        assert_eq!(eval("CONCAT", &[s("a"), Datum::Null]), "NULL");
        assert_eq!(
            eval("CONCAT_WS", &[s(","), s("a"), Datum::Null, s("b")]),
            "a,b"
        );
        assert_eq!(eval("CONCAT_WS", &[Datum::Null, s("a")]), "NULL");
    }

    #[test]
    fn test_concat_collation_conflict() {
        let a = Datum::text_in("a", &UTF8MB4_BIN);
        let b = Datum::text_in("b", &crate::collation::UTF8MB4_GENERAL_CI);
        assert_eq!(eval("CONCAT", &[a, b]), "ab");
    }

    #[test]
    fn test_substrings() {
        assert_eq!(eval("SUBSTRING", &[s("Quadratically"), i(5)]), "ratically");
        assert_eq!(eval("SUBSTRING", &[s("Quadratically"), i(5), i(6)]), "ratica");
        assert_eq!(eval("SUBSTR", &[s("Sakila"), i(-3)]), "ila");
        assert_eq!(eval("MID", &[s("Sakila"), i(-5), i(3)]), "aki");
        assert_eq!(eval("SUBSTRING", &[s("Sakila"), i(0)]), "");
        assert_eq!(eval("LEFT", &[s("foobarbar"), i(5)]), "fooba");
        assert_eq!(eval("RIGHT", &[s("foobarbar"), i(4)]), "rbar");
        assert_eq!(eval("RIGHT", &[s("ab"), i(10)]), "ab");
        assert_eq!(
            eval("SUBSTRING_INDEX", &[s("www.mysql.com"), s("."), i(2)]),
            "www.mysql"
        );
        assert_eq!(
            eval("SUBSTRING_INDEX", &[s("www.mysql.com"), s("."), i(-2)]),
            "mysql.com"
        );
    }

    #[test]
    fn test_search() {
        assert_eq!(eval("LOCATE", &[s("bar"), s("foobarbar")]), "4");
        assert_eq!(eval("LOCATE", &[s("xbar"), s("foobar")]), "0");
        assert_eq!(eval("LOCATE", &[s("bar"), s("foobarbar"), i(5)]), "7");
        assert_eq!(eval("LOCATE", &[s("BAR"), s("foobar")]), "4");
        assert_eq!(eval("LOCATE", &[s(""), s("abc"), i(4)]), "4");
        assert_eq!(eval("POSITION", &[s("b"), s("abc")]), "2");
        assert_eq!(eval("INSTR", &[s("foobarbar"), s("bar")]), "4");
        let hay = Datum::text_in("foobar", &UTF8MB4_BIN);
        let needle = Datum::text_in("BAR", &UTF8MB4_BIN);
        assert_eq!(eval("INSTR", &[hay, needle]), "0");
    }

    #[test]
    fn test_replace_repeat_pad() {
        assert_eq!(eval("REPLACE", &[s("www.mysql.com"), s("w"), s("Ww")]), "WwWwWw.mysql.com");
        assert_eq!(eval("REPEAT", &[s("ab"), i(3)]), "ababab");
        assert_eq!(eval("REPEAT", &[s("ab"), i(-1)]), "");
        assert_eq!(eval("SPACE", &[i(3)]), "   ");
        assert_eq!(eval("REVERSE", &[s("abc")]), "cba");
        assert_eq!(eval("INSERT", &[s("Quadratic"), i(3), i(4), s("What")]), "QuWhattic");
        assert_eq!(eval("INSERT", &[s("Quadratic"), i(-1), i(4), s("What")]), "Quadratic");
        assert_eq!(eval("INSERT", &[s("Quadratic"), i(3), i(100), s("What")]), "QuWhat");
        assert_eq!(eval("INSERT", &[s("Quadratic"), i(3), i(i64::MAX), s("What")]), "QuWhat");
        assert_eq!(eval("INSERT", &[s("Quadratic"), i(9), i(i64::MAX), s("!")]), "Quadrati!");
        assert_eq!(eval("INSERT", &[s("Quadratic"), i(i64::MAX), i(1), s("What")]), "Quadratic");
        assert_eq!(eval("LPAD", &[s("hi"), i(4), s("??")]), "??hi");
        assert_eq!(eval("LPAD", &[s("hi"), i(1), s("??")]), "h");
        assert_eq!(eval("RPAD", &[s("hi"), i(5), s("?")]), "hi???");
        assert_eq!(eval("RPAD", &[s("hi"), i(5), s("")]), "NULL");
        assert_eq!(eval("LPAD", &[s("hi"), i(-1), s("?")]), "NULL");
    }

    #[test]
    fn test_trim() {
        assert_eq!(eval("LTRIM", &[s("  barbar ")]), "barbar ");
        assert_eq!(eval("RTRIM", &[s(" barbar   ")]), " barbar");
        assert_eq!(eval("TRIM", &[s("  bar   ")]), "bar");
        assert_eq!(eval("TRIM", &[s("xxxbarxxx"), s("x"), s("LEADING")]), "barxxx");
        assert_eq!(eval("TRIM", &[s("xxxbarxxx"), s("x")]), "bar");
        assert_eq!(eval("TRIM", &[s("barxxyz"), s("xyz"), s("TRAILING")]), "barx");
        assert_eq!(eval("TRIM", &[s("x"), s("x"), s("SIDEWAYS")]), "ERROR 1210");
    }

    #[test]
    fn test_lists() {
        assert_eq!(eval("FIELD", &[s("Bb"), s("Aa"), s("Bb"), s("Cc")]), "2");
        assert_eq!(eval("FIELD", &[s("bb"), s("Aa"), s("BB")]), "2");
        assert_eq!(eval("FIELD", &[s("Gg"), s("Aa"), s("Bb")]), "0");
        assert_eq!(eval("FIELD", &[Datum::Null, s("Aa")]), "0");
        assert_eq!(eval("FIELD", &[i(2), s("1"), s("2.0")]), "2");
        assert_eq!(eval("FIND_IN_SET", &[s("b"), s("a,b,c,d")]), "2");
        assert_eq!(eval("FIND_IN_SET", &[s("b,c"), s("a,b,c,d")]), "0");
        assert_eq!(eval("ELT", &[i(2), s("Aa"), s("Bb")]), "Bb");
        assert_eq!(eval("ELT", &[i(3), s("Aa"), s("Bb")]), "NULL");
        assert_eq!(eval("MAKE_SET", &[i(1 | 4), s("hello"), s("nice"), s("world")]), "hello,world");
        assert_eq!(eval("MAKE_SET", &[i(1 | 4), s("hello"), s("nice"), Datum::Null]), "hello");
        assert_eq!(eval("MAKE_SET", &[i(0), s("a")]), "");
        assert_eq!(eval("EXPORT_SET", &[i(5), s("Y"), s("N"), s(","), i(4)]), "Y,N,Y,N");
        assert_eq!(eval("EXPORT_SET", &[i(6), s("1"), s("0"), s(""), i(10)]), "0110000000");
    }

    #[test]
    fn test_format() {
        assert_eq!(eval("FORMAT", &[f(12332.123456), i(4)]), "12,332.1235");
        assert_eq!(eval("FORMAT", &[dec("12332.1"), i(4)]), "12,332.1000");
        assert_eq!(eval("FORMAT", &[dec("12332.2"), i(0)]), "12,332");
        assert_eq!(eval("FORMAT", &[i(-1234567), i(0)]), "-1,234,567");
        assert_eq!(eval("FORMAT", &[dec("12332.2"), i(2), s("de_DE")]), "12.332,20");
        assert_eq!(group_digits("100", ',', '.'), "100");
        assert_eq!(group_digits("-100000.5", ',', '.'), "-100,000.5");
    }

    #[test]
    fn test_radix() {
        assert_eq!(eval("HEX", &[i(255)]), "FF");
        assert_eq!(eval("HEX", &[s("abc")]), "616263");
        assert_eq!(eval("HEX", &[i(-1)]), "FFFFFFFFFFFFFFFF");
        assert_eq!(eval("UNHEX", &[s("4D7953514C")]), "MySQL");
        assert_eq!(eval("UNHEX", &[s("GG")]), "NULL");
        assert_eq!(eval("BIN", &[i(12)]), "1100");
        assert_eq!(eval("OCT", &[i(12)]), "14");
        assert_eq!(eval("CHAR", &[i(77), i(121), i(83), i(81), Datum::Null, i(76)]), "MySQL");
        assert_eq!(eval("HEX", &[Datum::Null]), "NULL");
    }

    #[test]
    fn test_soundex_and_quote() {
        assert_eq!(eval("SOUNDEX", &[s("Hello")]), "H400");
        assert_eq!(eval("SOUNDEX", &[s("Quadratically")]), "Q36324");
        assert_eq!(eval("QUOTE", &[s("Don't!")]), "'Don\\'t!'");
        assert_eq!(eval("QUOTE", &[Datum::Null]), "NULL");
    }

    #[test]
    fn test_repeat_limit() {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let out = eval_with("REPEAT", &[s("ab"), i(1 << 40)], &ctx, &mut diag).unwrap();
        assert!(out.is_null());
    }
}
