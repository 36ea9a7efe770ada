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

//! TIME values

use std::fmt;

use super::time::{push_fraction, ParseOptions, Time, MICROS_PER_SECOND};
use super::types::MAX_FSP;

/// Largest TIME magnitude, 838:59:59
pub const MAX_DURATION_MICROS: i64 = (838 * 3600 + 59 * 60 + 59) * MICROS_PER_SECOND;

const POW10: [i64; 7] = [1, 10, 100, 1_000, 10_000, 100_000, 1_000_000];

/// Result of parsing TIME text or numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDuration {
    pub duration: Duration,
    /// Trailing content was ignored
    pub truncated: bool,
    /// Value was clamped to the TIME range
    pub clamped: bool,
}

/// A TIME value: signed microseconds with a display precision
#[derive(Debug, Clone, Copy, Default)]
pub struct Duration {
    micros: i64,
    fsp: u8,
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.micros == other.micros
    }
}

impl Eq for Duration {}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.micros.cmp(&other.micros)
    }
}

impl std::hash::Hash for Duration {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.micros.hash(state);
    }
}

impl Duration {
    /// Build from microseconds without range checking
    pub const fn from_micros(micros: i64, fsp: u8) -> Self {
        Self { micros, fsp }
    }

    /// Build from parts; `None` if minutes or seconds are out of range
    pub fn from_hms(neg: bool, hour: u64, minute: u64, second: u64, micro: u64, fsp: u8) -> Option<Self> {
        if minute > 59 || second > 59 || micro > 999_999 {
            return None;
        }
        let total = ((hour.min(1_000_000) * 60 + minute) * 60 + second) as i64 * MICROS_PER_SECOND
            + micro as i64;
        Some(Self::from_micros(if neg { -total } else { total }, fsp.min(MAX_FSP)))
    }

    /// Clamp to ±838:59:59; the flag reports whether clamping happened
    pub fn clamp(self) -> (Self, bool) {
        if self.micros > MAX_DURATION_MICROS {
            (Self::from_micros(MAX_DURATION_MICROS, self.fsp), true)
        } else if self.micros < -MAX_DURATION_MICROS {
            (Self::from_micros(-MAX_DURATION_MICROS, self.fsp), true)
        } else {
            (self, false)
        }
    }

    /// Returns true if within ±838:59:59
    pub fn in_range(&self) -> bool {
        self.micros.abs() <= MAX_DURATION_MICROS
    }

    #[inline]
    pub fn micros(&self) -> i64 {
        self.micros
    }

    #[inline]
    pub fn fsp(&self) -> u8 {
        self.fsp
    }

    pub fn with_fsp(mut self, fsp: u8) -> Self {
        self.fsp = fsp.min(MAX_FSP);
        self
    }

    #[inline]
    pub fn is_neg(&self) -> bool {
        self.micros < 0
    }

    pub fn hours(&self) -> u64 {
        self.micros.unsigned_abs() / 3_600_000_000
    }

    pub fn minutes(&self) -> u64 {
        self.micros.unsigned_abs() / 60_000_000 % 60
    }

    pub fn seconds(&self) -> u64 {
        self.micros.unsigned_abs() / 1_000_000 % 60
    }

    pub fn micro_part(&self) -> u64 {
        self.micros.unsigned_abs() % 1_000_000
    }

    /// Whole seconds, truncated toward zero
    pub fn total_seconds(&self) -> i64 {
        self.micros / MICROS_PER_SECOND
    }

    /// Round (or truncate) to `fsp` fractional digits
    pub fn round_frac(&self, fsp: u8, truncate: bool) -> Self {
        let fsp = fsp.min(MAX_FSP);
        let unit = POW10[(MAX_FSP - fsp) as usize];
        let abs = self.micros.abs();
        let rounded = if truncate {
            abs / unit * unit
        } else {
            (abs + unit / 2) / unit * unit
        };
        Self::from_micros(if self.micros < 0 { -rounded } else { rounded }, fsp)
    }

    /// `HHMMSS` as a signed integer
    pub fn to_packed_number(&self) -> i64 {
        let v = (self.hours() * 10_000 + self.minutes() * 100 + self.seconds()) as i64;
        if self.is_neg() {
            -v
        } else {
            v
        }
    }

    /// Checked addition keeping the larger precision
    pub fn checked_add(&self, other: &Duration) -> Option<Duration> {
        let micros = self.micros.checked_add(other.micros)?;
        Some(Self::from_micros(micros, self.fsp.max(other.fsp)))
    }

    /// Interpret a number such as `101010` (10:10:10) or `-1010`
    pub fn from_number(nr: i64, fsp: u8) -> Option<ParsedDuration> {
        if nr.unsigned_abs() >= 10_000_000_000 {
            let (t, _) = Time::from_number(nr)?;
            let d = Duration::from_micros(t.time_of_day_micros(), fsp);
            return Some(ParsedDuration {
                duration: d,
                truncated: false,
                clamped: false,
            });
        }
        let neg = nr < 0;
        let abs = nr.unsigned_abs();
        let d = Duration::from_hms(neg, abs / 10_000, abs / 100 % 100, abs % 100, 0, fsp)?;
        let (duration, clamped) = d.clamp();
        Some(ParsedDuration {
            duration,
            truncated: false,
            clamped,
        })
    }

    /// Parse TIME text: `[-][D ]hh:mm[:ss[.ffffff]]`, `hhmmss[.ffffff]`,
    /// or a full datetime whose time part is taken
    pub fn parse(text: &str, opts: ParseOptions) -> Option<ParsedDuration> {
        let s = text.trim_matches(|c: char| c.is_ascii_whitespace());
        if s.is_empty() {
            return None;
        }
        let (neg, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, s),
        };

        // A full date-time: keep the time of day
        if !neg && body.len() >= 10 {
            let dashes = body.bytes().take(10).filter(|&b| b == b'-' || b == b'/').count();
            if dashes >= 2 {
                let p = Time::parse(body, opts)?;
                return Some(ParsedDuration {
                    duration: Duration::from_micros(p.time.time_of_day_micros(), opts.fsp),
                    truncated: p.truncated,
                    clamped: false,
                });
            }
        }

        let bytes = body.as_bytes();
        let mut i = 0;
        let read_num = |i: &mut usize| -> Option<u64> {
            let start = *i;
            while *i < bytes.len() && bytes[*i].is_ascii_digit() {
                *i += 1;
            }
            if *i == start || *i - start > 12 {
                return None;
            }
            body[start..*i].parse().ok()
        };

        let first = read_num(&mut i)?;
        let mut hour;
        let minute;
        let mut second;
        let mut days = 0u64;
        if i < bytes.len() && bytes[i] == b' ' && body[i..].contains(':') {
            days = first;
            i += 1;
            hour = read_num(&mut i)?;
        } else {
            hour = first;
        }

        if i < bytes.len() && bytes[i] == b':' {
            i += 1;
            minute = read_num(&mut i)?;
            second = 0;
            if i < bytes.len() && bytes[i] == b':' {
                i += 1;
                second = read_num(&mut i)?;
            }
        } else if days > 0 {
            minute = 0;
            second = 0;
        } else {
            // Packed digits, right aligned: [H...]HMMSS
            let packed = hour;
            hour = packed / 10_000;
            minute = packed / 100 % 100;
            second = packed % 100;
        }

        let mut micro = 0u64;
        let mut carry = false;
        if i < bytes.len() && bytes[i] == b'.' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let frac = &body[start..i];
            for (k, b) in frac.bytes().take(6).enumerate() {
                micro += (b - b'0') as u64 * POW10[5 - k] as u64;
            }
            carry = !opts.truncate_fraction && frac.len() > 6 && frac.as_bytes()[6] >= b'5';
        }
        let truncated = body[i..].bytes().any(|b| !b.is_ascii_whitespace());

        let d = Duration::from_hms(neg, days * 24 + hour, minute, second, micro, MAX_FSP)?;
        let d = if carry {
            Duration::from_micros(d.micros + if neg { -1 } else { 1 }, MAX_FSP)
        } else {
            d
        };
        let (d, clamped) = d.round_frac(opts.fsp, opts.truncate_fraction).clamp();
        Some(ParsedDuration {
            duration: d,
            truncated,
            clamped,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(16);
        if self.is_neg() {
            s.push('-');
        }
        s.push_str(&format!(
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        ));
        push_fraction(&mut s, self.micro_part() as u32, self.fsp);
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Duration {
        Duration::parse(s, ParseOptions::default()).unwrap().duration
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(parse("10:10:10").to_string(), "10:10:10");
        assert_eq!(parse("-10:10").to_string(), "-10:10:00");
        assert_eq!(parse("101010").to_string(), "10:10:10");
        assert_eq!(parse("1010").to_string(), "00:10:10");
        assert_eq!(parse("1 10:00:00").to_string(), "34:00:00");
        assert_eq!(parse("2011-11-11 10:10:10").to_string(), "10:10:10");
        assert!(Duration::parse("10:61:00", ParseOptions::default()).is_none());
    }

    #[test]
    fn test_parse_fraction() {
        let opts = ParseOptions {
            fsp: 2,
            ..Default::default()
        };
        let d = Duration::parse("00:00:01.125", opts).unwrap().duration;
        assert_eq!(d.to_string(), "00:00:01.13");
        let d = Duration::parse("-00:00:01.125", opts).unwrap().duration;
        assert_eq!(d.to_string(), "-00:00:01.13");
    }

    #[test]
    fn test_clamp() {
        let p = Duration::parse("900:00:00", ParseOptions::default()).unwrap();
        assert!(p.clamped);
        assert_eq!(p.duration.to_string(), "838:59:59");
        let p = Duration::parse("-900:00:00", ParseOptions::default()).unwrap();
        assert_eq!(p.duration.to_string(), "-838:59:59");
    }

    #[test]
    fn test_from_number() {
        let d = Duration::from_number(101010, 0).unwrap().duration;
        assert_eq!(d.to_string(), "10:10:10");
        let d = Duration::from_number(-1010, 0).unwrap().duration;
        assert_eq!(d.to_string(), "-00:10:10");
        assert!(Duration::from_number(1070, 0).is_none());
        assert!(Duration::from_number(9_000_000, 0).unwrap().clamped);
    }

    #[test]
    fn test_packed_number() {
        assert_eq!(parse("-12:34:56").to_packed_number(), -123456);
    }
}
