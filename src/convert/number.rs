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

//! Parsing numbers out of strings
//!
//! MySQL reads the longest numeric prefix and ignores the rest, flagging
//! the value as truncated. Leading and trailing whitespace is not
//! truncation.

const MAX_U64: i128 = u64::MAX as i128;

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')
}

fn skip_spaces(b: &[u8], mut i: usize) -> usize {
    while i < b.len() && is_space(b[i]) {
        i += 1;
    }
    i
}

/// Integer prefix of a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInt {
    /// Value clamped to ±(2^64 - 1)
    pub value: i128,
    /// Non-numeric content was ignored, or there were no digits at all
    pub truncated: bool,
    /// The digits exceeded the clamp range
    pub overflow: bool,
}

/// Parse `[spaces][+-]digits[spaces]`
pub fn parse_int_prefix(s: &str) -> ParsedInt {
    let b = s.as_bytes();
    let mut i = skip_spaces(b, 0);
    let neg = i < b.len() && b[i] == b'-';
    if i < b.len() && (b[i] == b'-' || b[i] == b'+') {
        i += 1;
    }
    let start = i;
    let mut value: i128 = 0;
    let mut overflow = false;
    while i < b.len() && b[i].is_ascii_digit() {
        if !overflow {
            value = value * 10 + (b[i] - b'0') as i128;
            if value > MAX_U64 {
                overflow = true;
                value = MAX_U64;
            }
        }
        i += 1;
    }
    let no_digits = i == start;
    let rest = skip_spaces(b, i);
    ParsedInt {
        value: if neg { -value } else { value },
        truncated: no_digits || rest < b.len(),
        overflow,
    }
}

/// Length of the longest float literal at the start of `b[i..]`
fn float_prefix_end(b: &[u8], start: usize) -> usize {
    let mut i = start;
    if i < b.len() && (b[i] == b'-' || b[i] == b'+') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let mut j = i + 1;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - i - 1;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return start;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'-' || b[j] == b'+') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Float prefix of a string: the value and whether anything was ignored
pub fn parse_float_prefix(s: &str) -> (f64, bool) {
    let b = s.as_bytes();
    let start = skip_spaces(b, 0);
    let end = float_prefix_end(b, start);
    if end == start {
        return (0.0, true);
    }
    let mut text = &s[start..end];
    if let Some(stripped) = text.strip_prefix('+') {
        text = stripped;
    }
    let value = text.parse::<f64>().unwrap_or(0.0);
    let truncated = skip_spaces(b, end) < b.len();
    if value.is_infinite() {
        let clamped = if value > 0.0 { f64::MAX } else { f64::MIN };
        return (clamped, true);
    }
    (value, truncated)
}

/// Returns true if the whole string is a number (with optional spaces)
pub fn is_numeric_text(s: &str) -> bool {
    let b = s.as_bytes();
    let start = skip_spaces(b, 0);
    let end = float_prefix_end(b, start);
    end > start && skip_spaces(b, end) == b.len()
}

/// Clamp a parsed integer to i64 (false if it did not fit)
pub fn clamp_i64(v: i128) -> (i64, bool) {
    if v > i64::MAX as i128 {
        (i64::MAX, false)
    } else if v < i64::MIN as i128 {
        (i64::MIN, false)
    } else {
        (v as i64, true)
    }
}

/// Round half to even, as C's `rint` does in the default rounding mode
pub fn rint(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_prefix() {
        let p = parse_int_prefix("  42  ");
        assert_eq!(p.value, 42);
        assert!(!p.truncated);

        let p = parse_int_prefix("12abc");
        assert_eq!(p.value, 12);
        assert!(p.truncated);

        let p = parse_int_prefix("");
        assert_eq!(p.value, 0);
        assert!(p.truncated);

        let p = parse_int_prefix("-9223372036854775809");
        assert_eq!(p.value, -9223372036854775809);

        let p = parse_int_prefix("18446744073709551616");
        assert_eq!(p.value, u64::MAX as i128);
        assert!(p.overflow);
        assert!(!p.truncated);
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(parse_float_prefix("1.5e3xyz"), (1500.0, true));
        assert_eq!(parse_float_prefix(" -.5 "), (-0.5, false));
        assert_eq!(parse_float_prefix("abc"), (0.0, true));
        assert_eq!(parse_float_prefix("1e"), (1.0, true));
        assert_eq!(parse_float_prefix("1e999"), (f64::MAX, true));
        assert_eq!(parse_float_prefix("5."), (5.0, false));
    }

    #[test]
    fn test_numeric_text() {
        assert!(is_numeric_text(" 1.5E+2 "));
        assert!(!is_numeric_text("1.5.2"));
        assert!(!is_numeric_text(""));
    }

    #[test]
    fn test_rint() {
        assert_eq!(rint(2.5), 2.0);
        assert_eq!(rint(3.5), 4.0);
        assert_eq!(rint(-2.5), -2.0);
        assert_eq!(rint(2.6), 3.0);
        assert_eq!(rint(-0.4), -0.0);
    }
}
