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

//! DATE / DATETIME values
//!
//! [`Time`] stores calendar fields directly so that zero dates
//! (`0000-00-00`) and dates with zero parts (`2011-00-10`) can be
//! represented, which chrono types cannot.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use super::sql_mode::SqlMode;
use super::types::MAX_FSP;

/// Microseconds in one day
pub const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Microseconds in one second
pub const MICROS_PER_SECOND: i64 = 1_000_000;

const POW10: [u32; 7] = [1, 10, 100, 1_000, 10_000, 100_000, 1_000_000];

/// Returns true for leap years (the zero year counts as a leap year)
#[inline]
pub fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` of `year`; 0 for month 0
pub fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days in `year`
#[inline]
pub fn days_in_year(year: u32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Day number counted from year 0, as MySQL's TO_DAYS computes it
pub fn calc_daynr(year: u32, month: u32, day: u32) -> i64 {
    if year == 0 && month == 0 {
        return 0;
    }
    let mut y = year as i64;
    let (m, d) = (month as i64, day as i64);
    let mut delsum = 365 * y + 31 * (m - 1) + d;
    if m <= 2 {
        y -= 1;
    } else {
        delsum -= (m * 4 + 23) / 10;
    }
    let temp = ((y / 100 + 1) * 3) / 4;
    delsum + y / 4 - temp
}

/// Inverse of [`calc_daynr`]; day numbers outside the calendar give `(0, 0, 0)`
pub fn date_from_daynr(daynr: i64) -> (u32, u32, u32) {
    if daynr <= 365 || daynr >= 3_652_500 {
        return (0, 0, 0);
    }
    let mut year = daynr * 100 / 36525;
    let temp = (((year - 1) / 100 + 1) * 3) / 4;
    let mut day_of_year = daynr - year * 365 - (year - 1) / 4 + temp;
    loop {
        let diy = days_in_year(year as u32) as i64;
        if day_of_year <= diy {
            break;
        }
        day_of_year -= diy;
        year += 1;
    }
    let mut leap_day = 0;
    if days_in_year(year as u32) == 366 && day_of_year > 31 + 28 {
        day_of_year -= 1;
        if day_of_year == 31 + 28 {
            leap_day = 1;
        }
    }
    let mut month = 1;
    loop {
        let dim = days_in_month(1, month) as i64;
        if day_of_year <= dim {
            break;
        }
        day_of_year -= dim;
        month += 1;
    }
    (year as u32, month, (day_of_year + leap_day) as u32)
}

/// Flags affecting how date text is parsed and validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Fractional second precision of the target
    pub fsp: u8,
    /// Drop extra fractional digits instead of rounding
    pub truncate_fraction: bool,
    /// Accept any day 1..=31 for any month
    pub allow_invalid_dates: bool,
}

impl ParseOptions {
    pub fn from_mode(mode: SqlMode, fsp: u8) -> Self {
        Self {
            fsp: fsp.min(MAX_FSP),
            truncate_fraction: mode.contains(SqlMode::TIME_TRUNCATE_FRACTIONAL),
            allow_invalid_dates: mode.contains(SqlMode::ALLOW_INVALID_DATES),
        }
    }
}

/// Result of parsing date/time text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTime {
    pub time: Time,
    /// Trailing content was ignored
    pub truncated: bool,
    /// The text had a time part
    pub has_time: bool,
}

/// A DATE or DATETIME value
#[derive(Debug, Clone, Copy, Default, Eq)]
pub struct Time {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub micro: u32,
    pub fsp: u8,
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.micro,
        )
            .cmp(&(
                other.year,
                other.month,
                other.day,
                other.hour,
                other.minute,
                other.second,
                other.micro,
            ))
    }
}

impl std::hash::Hash for Time {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.micro,
        )
            .hash(state);
    }
}

impl Time {
    /// `0000-00-00 00:00:00`
    pub const fn zero() -> Self {
        Self {
            year: 0,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
            micro: 0,
            fsp: 0,
        }
    }

    /// A date with zero time part
    pub fn from_ymd(year: u32, month: u32, day: u32) -> Self {
        Self {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            ..Self::zero()
        }
    }

    /// A datetime without fractional seconds
    pub fn from_ymd_hms(year: u32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
            ..Self::from_ymd(year, month, day)
        }
    }

    pub fn with_fsp(mut self, fsp: u8) -> Self {
        self.fsp = fsp.min(MAX_FSP);
        self
    }

    pub fn with_micro(mut self, micro: u32) -> Self {
        self.micro = micro;
        self
    }

    /// Year, month and day are all zero
    #[inline]
    pub fn is_zero_date(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }

    /// Month or day is zero but the date is not entirely zero
    #[inline]
    pub fn has_zero_in_date(&self) -> bool {
        !self.is_zero_date() && (self.month == 0 || self.day == 0)
    }

    /// Whole value including time part is zero
    pub fn is_zero(&self) -> bool {
        self.is_zero_date() && self.hour == 0 && self.minute == 0 && self.second == 0 && self.micro == 0
    }

    /// Date part only
    pub fn date(&self) -> Time {
        Time::from_ymd(self.year as u32, self.month as u32, self.day as u32)
    }

    /// Day number of the date part
    #[inline]
    pub fn daynr(&self) -> i64 {
        calc_daynr(self.year as u32, self.month as u32, self.day as u32)
    }

    /// Microseconds of the time-of-day part
    #[inline]
    pub fn time_of_day_micros(&self) -> i64 {
        ((self.hour as i64 * 60 + self.minute as i64) * 60 + self.second as i64) * MICROS_PER_SECOND
            + self.micro as i64
    }

    /// Microseconds since day number 0
    pub fn to_micros(&self) -> i64 {
        self.daynr() * MICROS_PER_DAY + self.time_of_day_micros()
    }

    /// Build from microseconds since day number 0; `None` outside 0001-01-01..9999-12-31
    pub fn from_micros(micros: i64, fsp: u8) -> Option<Time> {
        if micros < 0 {
            return None;
        }
        let daynr = micros / MICROS_PER_DAY;
        let mut rest = micros % MICROS_PER_DAY;
        let (year, month, day) = date_from_daynr(daynr);
        if year == 0 || year > 9999 {
            return None;
        }
        let micro = (rest % MICROS_PER_SECOND) as u32;
        rest /= MICROS_PER_SECOND;
        let second = (rest % 60) as u32;
        rest /= 60;
        let minute = (rest % 60) as u32;
        let hour = (rest / 60) as u32;
        Some(
            Time::from_ymd_hms(year, month, day, hour, minute, second)
                .with_micro(micro)
                .with_fsp(fsp),
        )
    }

    /// Day-of-week with 0 = Monday
    pub fn weekday(&self) -> u32 {
        ((self.daynr() + 5) % 7) as u32
    }

    /// Returns true if all parts are within their calendar ranges
    pub fn is_valid(&self, allow_invalid_dates: bool) -> bool {
        if self.month > 12 || self.day > 31 || self.hour > 23 || self.minute > 59 || self.second > 59 {
            return false;
        }
        if self.micro >= 1_000_000 || self.year > 9999 {
            return false;
        }
        if allow_invalid_dates || self.month == 0 || self.day == 0 {
            return true;
        }
        self.day as u32 <= days_in_month(self.year as u32, self.month as u32)
    }

    /// Round (or truncate) fractional seconds to `fsp` digits
    pub fn round_frac(&self, fsp: u8, truncate: bool) -> Option<Time> {
        let fsp = fsp.min(MAX_FSP);
        let unit = POW10[(MAX_FSP - fsp) as usize];
        let mut result = *self;
        result.fsp = fsp;
        if truncate {
            result.micro = self.micro / unit * unit;
            return Some(result);
        }
        let rounded = (self.micro + unit / 2) / unit * unit;
        if rounded < 1_000_000 {
            result.micro = rounded;
            return Some(result);
        }
        if self.is_zero_date() || self.has_zero_in_date() {
            // No calendar carry for invalid dates; clamp instead
            result.micro = 1_000_000 - unit;
            return Some(result);
        }
        let micros = self.to_micros() - self.micro as i64 + MICROS_PER_SECOND;
        Time::from_micros(micros, fsp)
    }

    /// Parse MySQL date/time text with permissive delimiters.
    ///
    /// Accepts `YYYY-MM-DD[ hh:mm:ss[.ffffff]]` with any punctuation as
    /// separator, `T` between date and time, two-digit years, and the
    /// pure-digit forms `YYMMDD`, `YYYYMMDD`, `YYMMDDhhmmss`,
    /// `YYYYMMDDhhmmss`. Returns `None` for text that is not a date.
    pub fn parse(text: &str, opts: ParseOptions) -> Option<ParsedTime> {
        let s = text.trim_matches(|c: char| c.is_ascii_whitespace());
        if s.is_empty() {
            return None;
        }
        let bytes = s.as_bytes();

        let digits_end = bytes.iter().position(|b| !b.is_ascii_digit()).unwrap_or(bytes.len());
        let only_digits = digits_end == bytes.len() || (bytes[digits_end] == b'.' && digits_end >= 6);
        let (mut fields, mut n, year_digits, mut pos) = if only_digits && digits_end >= 6 {
            let (fields, n, year_digits) = split_packed(&s[..digits_end])?;
            (fields, n, year_digits, digits_end)
        } else {
            let mut fields = [0u32; 6];
            let mut n = 0;
            let mut year_digits = 0;
            let mut i = 0;
            while n < 6 {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let len = i - start;
                if len == 0 {
                    break;
                }
                let max = if n == 0 { 4 } else { 2 };
                if len > max {
                    return None;
                }
                fields[n] = s[start..i].parse().ok()?;
                if n == 0 {
                    year_digits = len;
                }
                n += 1;
                if n == 6 || i >= bytes.len() {
                    break;
                }
                let sep = bytes[i];
                let is_sep = sep.is_ascii_punctuation() || sep == b' ' || (n == 3 && sep == b'T');
                if !is_sep || (sep == b'.' && n >= 3) {
                    break;
                }
                i += 1;
                if n == 3 {
                    while i < bytes.len() && bytes[i] == b' ' {
                        i += 1;
                    }
                }
            }
            (fields, n, year_digits, i)
        };
        if n < 3 {
            return None;
        }

        let mut micro = 0u32;
        let mut extra_round = false;
        if n >= 4 && pos < bytes.len() && bytes[pos] == b'.' {
            pos += 1;
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let frac = &s[start..pos];
            for (k, b) in frac.bytes().take(6).enumerate() {
                micro += (b - b'0') as u32 * POW10[5 - k];
            }
            extra_round = frac.len() > 6 && frac.as_bytes()[6] >= b'5';
        }
        let truncated = s[pos..].bytes().any(|b| !b.is_ascii_whitespace());

        if year_digits <= 2 && !(fields[0] == 0 && fields[1] == 0 && fields[2] == 0) {
            fields[0] += if fields[0] < 70 { 2000 } else { 1900 };
        }
        let has_time = n > 3;
        while n < 6 {
            fields[n] = 0;
            n += 1;
        }
        let time = Time::from_ymd_hms(fields[0], fields[1], fields[2], fields[3], fields[4], fields[5])
            .with_micro(micro);
        if !time.is_valid(opts.allow_invalid_dates) {
            return None;
        }
        // Digits beyond microseconds round the microsecond value first
        let time = if extra_round && !opts.truncate_fraction {
            if micro == 999_999 {
                let mut t = time;
                t.micro = 999_999;
                t.round_frac(0, false)?
            } else {
                time.with_micro(micro + 1)
            }
        } else {
            time
        };
        let time = time.round_frac(opts.fsp, opts.truncate_fraction)?;
        Some(ParsedTime {
            time,
            truncated,
            has_time,
        })
    }

    /// Interpret a number such as `20111111` or `111111101010` as a date.
    ///
    /// The second value is true when the number only had a date part.
    pub fn from_number(nr: i64) -> Option<(Time, bool)> {
        if nr == 0 {
            return Some((Time::zero(), true));
        }
        if nr < 0 || nr < 101 {
            return None;
        }
        let (nr, date_only) = if nr <= 691_231 {
            ((nr + 20_000_000) * 1_000_000, true)
        } else if nr < 700_101 {
            return None;
        } else if nr <= 991_231 {
            ((nr + 19_000_000) * 1_000_000, true)
        } else if nr < 10_000_101 {
            return None;
        } else if nr <= 99_991_231 {
            (nr * 1_000_000, true)
        } else if nr < 101_000_000 {
            return None;
        } else if nr <= 691_231_235_959 {
            (nr + 20_000_000_000_000, false)
        } else if nr < 700_101_000_000 {
            return None;
        } else if nr <= 991_231_235_959 {
            (nr + 19_000_000_000_000, false)
        } else if nr <= 99_991_231_235_959 {
            (nr, false)
        } else {
            return None;
        };
        let date = nr / 1_000_000;
        let time = nr % 1_000_000;
        let t = Time::from_ymd_hms(
            (date / 10_000) as u32,
            (date / 100 % 100) as u32,
            (date % 100) as u32,
            (time / 10_000) as u32,
            (time / 100 % 100) as u32,
            (time % 100) as u32,
        );
        if !t.is_valid(false) {
            return None;
        }
        Some((t, date_only))
    }

    /// `YYYYMMDD` for dates, `YYYYMMDDhhmmss` for datetimes
    pub fn to_packed_number(&self, date_only: bool) -> i64 {
        let date = self.year as i64 * 10_000 + self.month as i64 * 100 + self.day as i64;
        if date_only {
            return date;
        }
        date * 1_000_000 + self.hour as i64 * 10_000 + self.minute as i64 * 100 + self.second as i64
    }

    /// Convert to chrono; `None` for zero dates
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_micro_opt(
                self.hour as u32,
                self.minute as u32,
                self.second as u32,
                self.micro,
            )
    }

    /// Convert from chrono
    pub fn from_naive(dt: &NaiveDateTime, fsp: u8) -> Time {
        Time::from_ymd_hms(
            dt.year().max(0) as u32,
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
        .with_micro(dt.nanosecond() / 1_000 % 1_000_000)
        .round_frac(fsp, true)
        .unwrap_or_default()
    }

    /// `YYYY-MM-DD`
    pub fn format_date(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// `YYYY-MM-DD hh:mm:ss[.fff]` with the value's own precision
    pub fn format_datetime(&self) -> String {
        let mut s = format!(
            "{} {:02}:{:02}:{:02}",
            self.format_date(),
            self.hour,
            self.minute,
            self.second
        );
        push_fraction(&mut s, self.micro, self.fsp);
        s
    }
}

/// Append `.ffffff` truncated to `fsp` digits
pub(crate) fn push_fraction(s: &mut String, micro: u32, fsp: u8) {
    if fsp == 0 {
        return;
    }
    let digits = format!("{:06}", micro);
    s.push('.');
    s.push_str(&digits[..fsp.min(MAX_FSP) as usize]);
}

fn split_packed(digits: &str) -> Option<([u32; 6], usize, usize)> {
    let layout: &[usize] = match digits.len() {
        6 => &[2, 2, 2],
        8 => &[4, 2, 2],
        12 => &[2, 2, 2, 2, 2, 2],
        14 => &[4, 2, 2, 2, 2, 2],
        _ => return None,
    };
    let mut fields = [0u32; 6];
    let mut pos = 0;
    for (i, width) in layout.iter().enumerate() {
        fields[i] = digits[pos..pos + width].parse().ok()?;
        pos += width;
    }
    Some((fields, layout.len(), layout[0]))
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_datetime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Option<Time> {
        Time::parse(s, ParseOptions::default()).map(|p| p.time)
    }

    #[test]
    fn test_daynr_roundtrip() {
        assert_eq!(calc_daynr(2011, 11, 11), 734817);
        assert_eq!(calc_daynr(1, 1, 1), 366);
        for daynr in [366, 730_000, 734_817, 3_652_424] {
            let (y, m, d) = date_from_daynr(daynr);
            assert_eq!(calc_daynr(y, m, d), daynr);
        }
        assert_eq!(date_from_daynr(3_652_424), (9999, 12, 31));
    }

    #[test]
    fn test_leap_day_from_daynr() {
        let daynr = calc_daynr(2012, 2, 29);
        assert_eq!(date_from_daynr(daynr), (2012, 2, 29));
        assert_eq!(date_from_daynr(daynr + 1), (2012, 3, 1));
    }

    #[test]
    fn test_parse_delimited() {
        assert_eq!(
            parse("2011-11-11 10:10:10").unwrap(),
            Time::from_ymd_hms(2011, 11, 11, 10, 10, 10)
        );
        assert_eq!(parse("2011/1/2").unwrap(), Time::from_ymd(2011, 1, 2));
        assert_eq!(parse("2011@01@02T03:04:05").unwrap(), Time::from_ymd_hms(2011, 1, 2, 3, 4, 5));
        assert_eq!(parse("11-11-11").unwrap(), Time::from_ymd(2011, 11, 11));
        assert_eq!(parse("99-11-11").unwrap(), Time::from_ymd(1999, 11, 11));
        assert!(parse("2011-13-01").is_none());
        assert!(parse("2011-02-30").is_none());
        assert!(parse("2011-11").is_none());
        assert!(parse("abc").is_none());
    }

    #[test]
    fn test_parse_packed() {
        assert_eq!(parse("20111111").unwrap(), Time::from_ymd(2011, 11, 11));
        assert_eq!(parse("111111").unwrap(), Time::from_ymd(2011, 11, 11));
        assert_eq!(
            parse("20111111101010").unwrap(),
            Time::from_ymd_hms(2011, 11, 11, 10, 10, 10)
        );
    }

    #[test]
    fn test_parse_fraction() {
        let opts = ParseOptions {
            fsp: 3,
            ..Default::default()
        };
        let t = Time::parse("2011-11-11 10:10:10.123456", opts).unwrap().time;
        assert_eq!(t.micro, 123_000);
        let t = Time::parse("2011-11-11 10:10:10.1235", opts).unwrap().time;
        assert_eq!(t.micro, 124_000);
        let t = Time::parse("2011-12-31 23:59:59.9999", opts).unwrap().time;
        assert_eq!(t, Time::from_ymd(2012, 1, 1));

        let truncating = ParseOptions {
            fsp: 3,
            truncate_fraction: true,
            ..Default::default()
        };
        let t = Time::parse("2011-11-11 10:10:10.1239", truncating).unwrap().time;
        assert_eq!(t.micro, 123_000);
    }

    #[test]
    fn test_parse_zero_dates() {
        let t = parse("0000-00-00 12:12:09").unwrap();
        assert!(t.is_zero_date());
        assert_eq!(t.hour, 12);
        let t = parse("2011-00-10").unwrap();
        assert!(t.has_zero_in_date());
        assert!(!t.is_zero_date());
    }

    #[test]
    fn test_parse_truncated() {
        let p = Time::parse("2011-11-11 abc", ParseOptions::default()).unwrap();
        assert!(p.truncated);
        assert!(!p.has_time);
    }

    #[test]
    fn test_allow_invalid_dates() {
        let opts = ParseOptions {
            allow_invalid_dates: true,
            ..Default::default()
        };
        assert!(Time::parse("2011-02-30", opts).is_some());
    }

    #[test]
    fn test_from_number() {
        assert_eq!(Time::from_number(20111111).unwrap(), (Time::from_ymd(2011, 11, 11), true));
        assert_eq!(
            Time::from_number(20111111101010).unwrap().0,
            Time::from_ymd_hms(2011, 11, 11, 10, 10, 10)
        );
        assert_eq!(Time::from_number(111111).unwrap().0, Time::from_ymd(2011, 11, 11));
        assert!(Time::from_number(695555).is_none());
        assert!(Time::from_number(20111311).is_none());
    }

    #[test]
    fn test_micros_roundtrip() {
        let t = Time::from_ymd_hms(2020, 2, 29, 23, 59, 59).with_micro(5).with_fsp(6);
        assert_eq!(Time::from_micros(t.to_micros(), 6).unwrap(), t);
        assert!(Time::from_micros(Time::from_ymd(10000, 1, 1).to_micros(), 0).is_none());
    }

    #[test]
    fn test_format() {
        let t = Time::from_ymd_hms(2011, 1, 2, 3, 4, 5).with_micro(120_000).with_fsp(3);
        assert_eq!(t.format_datetime(), "2011-01-02 03:04:05.120");
        assert_eq!(t.format_date(), "2011-01-02");
        assert_eq!(Time::zero().format_datetime(), "0000-00-00 00:00:00");
    }

    #[test]
    fn test_weekday() {
        // 2011-11-11 was a Friday
        assert_eq!(Time::from_ymd(2011, 11, 11).weekday(), 4);
    }
}
