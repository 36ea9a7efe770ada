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

//! `DATE_FORMAT`, `TIME_FORMAT`, `STR_TO_DATE` and `GET_FORMAT`

use std::fmt::Write;

use super::calendar::{self, calc_week, day_of_year, week_mode};
use crate::core::time::{calc_daynr, date_from_daynr, days_in_month};
use crate::core::{Duration, Time};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Monday first
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn day_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

fn hour12(hour: u64) -> u64 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// Result shape implied by a format string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatShape {
    pub has_date: bool,
    pub has_time: bool,
    pub has_micro: bool,
}

/// Inspect which fields a format string mentions
pub fn shape(fmt: &str) -> FormatShape {
    let mut shape = FormatShape::default();
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some('a' | 'b' | 'c' | 'D' | 'd' | 'e' | 'j' | 'M' | 'm' | 'U' | 'u' | 'V' | 'v' | 'W' | 'w' | 'X' | 'x' | 'Y' | 'y') => {
                shape.has_date = true
            }
            Some('f') => {
                shape.has_time = true;
                shape.has_micro = true;
            }
            Some('H' | 'h' | 'I' | 'i' | 'k' | 'l' | 'p' | 'r' | 'S' | 's' | 'T') => shape.has_time = true,
            _ => {}
        }
    }
    shape
}

/// `DATE_FORMAT`. `None` when a name or week is asked of a zero date part.
pub fn format_time(t: &Time, fmt: &str) -> Option<String> {
    let mut out = String::with_capacity(fmt.len() * 2);
    let mut chars = fmt.chars();
    let zero_part = t.month == 0 || t.day == 0;
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(spec) = chars.next() else {
            break;
        };
        let hour = t.hour as u64;
        match spec {
            'a' | 'W' | 'w' | 'U' | 'u' | 'V' | 'v' | 'X' | 'x' | 'j' if zero_part => return None,
            'a' => out.push_str(&DAY_NAMES[t.weekday() as usize][..3]),
            'W' => out.push_str(DAY_NAMES[t.weekday() as usize]),
            'w' => {
                let _ = write!(out, "{}", (t.weekday() + 1) % 7);
            }
            'b' | 'M' if t.month == 0 => return None,
            'b' => out.push_str(&MONTH_NAMES[t.month as usize - 1][..3]),
            'M' => out.push_str(MONTH_NAMES[t.month as usize - 1]),
            'c' => {
                let _ = write!(out, "{}", t.month);
            }
            'D' => {
                let _ = write!(out, "{}{}", t.day, day_suffix(t.day as u32));
            }
            'd' => {
                let _ = write!(out, "{:02}", t.day);
            }
            'e' => {
                let _ = write!(out, "{}", t.day);
            }
            'f' => {
                let _ = write!(out, "{:06}", t.micro);
            }
            'H' => {
                let _ = write!(out, "{:02}", hour);
            }
            'h' | 'I' => {
                let _ = write!(out, "{:02}", hour12(hour));
            }
            'i' => {
                let _ = write!(out, "{:02}", t.minute);
            }
            'j' => {
                let _ = write!(out, "{:03}", day_of_year(t));
            }
            'k' => {
                let _ = write!(out, "{}", hour);
            }
            'l' => {
                let _ = write!(out, "{}", hour12(hour));
            }
            'm' => {
                let _ = write!(out, "{:02}", t.month);
            }
            'p' => out.push_str(if hour % 24 < 12 { "AM" } else { "PM" }),
            'r' => {
                let ampm = if hour % 24 < 12 { "AM" } else { "PM" };
                let _ = write!(out, "{:02}:{:02}:{:02} {}", hour12(hour), t.minute, t.second, ampm);
            }
            'S' | 's' => {
                let _ = write!(out, "{:02}", t.second);
            }
            'T' => {
                let _ = write!(out, "{:02}:{:02}:{:02}", hour, t.minute, t.second);
            }
            'U' => {
                let _ = write!(out, "{:02}", calc_week(t, week_mode(0)).0);
            }
            'u' => {
                let _ = write!(out, "{:02}", calc_week(t, week_mode(1)).0);
            }
            'V' => {
                let _ = write!(out, "{:02}", calc_week(t, week_mode(2)).0);
            }
            'v' => {
                let _ = write!(out, "{:02}", calc_week(t, week_mode(3)).0);
            }
            'X' => {
                let _ = write!(out, "{:04}", calc_week(t, week_mode(2)).1);
            }
            'x' => {
                let _ = write!(out, "{:04}", calc_week(t, week_mode(3)).1);
            }
            'Y' => {
                let _ = write!(out, "{:04}", t.year);
            }
            'y' => {
                let _ = write!(out, "{:02}", t.year % 100);
            }
            other => out.push(other),
        }
    }
    Some(out)
}

/// `TIME_FORMAT`. Only time specifiers are allowed.
pub fn format_duration(d: &Duration, fmt: &str) -> Option<String> {
    let mut out = String::with_capacity(fmt.len() * 2);
    let mut chars = fmt.chars();
    let hour = d.hours();
    let sign = if d.is_neg() { "-" } else { "" };
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(spec) = chars.next() else {
            break;
        };
        match spec {
            'f' => {
                let _ = write!(out, "{:06}", d.micro_part());
            }
            'H' => {
                let _ = write!(out, "{}{:02}", sign, hour);
            }
            'k' => {
                let _ = write!(out, "{}{}", sign, hour);
            }
            'h' | 'I' => {
                let _ = write!(out, "{:02}", hour12(hour));
            }
            'l' => {
                let _ = write!(out, "{}", hour12(hour));
            }
            'i' => {
                let _ = write!(out, "{:02}", d.minutes());
            }
            'S' | 's' => {
                let _ = write!(out, "{:02}", d.seconds());
            }
            'p' => out.push_str(if hour % 24 < 12 { "AM" } else { "PM" }),
            'r' => {
                let ampm = if hour % 24 < 12 { "AM" } else { "PM" };
                let _ = write!(out, "{:02}:{:02}:{:02} {}", hour12(hour), d.minutes(), d.seconds(), ampm);
            }
            'T' => {
                let _ = write!(out, "{}{:02}:{:02}:{:02}", sign, hour, d.minutes(), d.seconds());
            }
            'a' | 'b' | 'D' | 'j' | 'M' | 'U' | 'u' | 'V' | 'v' | 'W' | 'w' | 'X' | 'x' => return None,
            'c' | 'e' => out.push('0'),
            'd' | 'm' | 'y' => out.push_str("00"),
            'Y' => out.push_str("0000"),
            other => out.push(other),
        }
    }
    Some(out)
}

/// Outcome of `STR_TO_DATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed {
    pub time: Time,
    /// Input text remained after the format was consumed
    pub truncated: bool,
}

struct Cursor<'a> {
    s: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn skip_spaces(&mut self) {
        while self.pos < self.s.len() && self.s[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Up to `max` digits, optionally signed
    fn number(&mut self, max: usize) -> Option<u64> {
        let start = self.pos;
        let mut v: u64 = 0;
        while self.pos < self.s.len() && self.pos - start < max && self.s[self.pos].is_ascii_digit() {
            v = v * 10 + (self.s[self.pos] - b'0') as u64;
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(v)
        }
    }

    /// Fraction digits, scaled to microseconds
    fn micros(&mut self) -> Option<u64> {
        let start = self.pos;
        let v = self.number(6)?;
        let digits = self.pos - start;
        Some(v * 10u64.pow(6 - digits as u32))
    }

    /// Case-insensitive match of one of `names`, full or 3-letter prefix
    fn name(&mut self, names: &[&str], abbreviated: bool) -> Option<usize> {
        let rest = &self.s[self.pos..];
        for (i, name) in names.iter().enumerate() {
            let wanted = if abbreviated { &name[..3] } else { name };
            if rest.len() >= wanted.len() && rest[..wanted.len()].eq_ignore_ascii_case(wanted.as_bytes()) {
                self.pos += wanted.len();
                return Some(i);
            }
        }
        None
    }

    fn literal(&mut self, c: u8) -> Option<()> {
        if self.pos < self.s.len() && self.s[self.pos] == c {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    fn ampm(&mut self) -> Option<bool> {
        let rest = &self.s[self.pos..];
        if rest.len() < 2 {
            return None;
        }
        let pm = if rest[..2].eq_ignore_ascii_case(b"PM") {
            true
        } else if rest[..2].eq_ignore_ascii_case(b"AM") {
            false
        } else {
            return None;
        };
        self.pos += 2;
        Some(pm)
    }
}

#[derive(Default)]
struct Fields {
    year: u64,
    month: u64,
    day: u64,
    hour: u64,
    minute: u64,
    second: u64,
    micro: u64,
    pm: Option<bool>,
    twelve_hour: bool,
    yearday: Option<u64>,
    weekday: Option<u64>,
    week: Option<u64>,
    sunday_first: bool,
    strict_week: bool,
    week_year: Option<(u64, bool)>,
}

/// `STR_TO_DATE`. `None` when the text does not match the format.
pub fn parse_with_format(text: &str, fmt: &str, allow_invalid_dates: bool) -> Option<Parsed> {
    let mut cur = Cursor {
        s: text.as_bytes(),
        pos: 0,
    };
    let mut f = Fields::default();
    let fb = fmt.as_bytes();
    let mut i = 0;
    while i < fb.len() && !cur.at_end() {
        let c = fb[i];
        if c.is_ascii_whitespace() {
            cur.skip_spaces();
            i += 1;
            continue;
        }
        if c != b'%' || i + 1 >= fb.len() {
            cur.literal(c)?;
            i += 1;
            continue;
        }
        let spec = fb[i + 1];
        i += 2;
        if !matches!(spec, b'p' | b'M' | b'b' | b'W' | b'a' | b'%') {
            cur.skip_spaces();
        }
        match spec {
            b'Y' => {
                let start = cur.pos;
                let y = cur.number(4)?;
                f.year = if cur.pos - start <= 2 { calendar::expand_year(y as i64) as u64 } else { y };
            }
            b'y' => f.year = calendar::expand_year(cur.number(2)? as i64) as u64,
            b'm' | b'c' => f.month = cur.number(2)?,
            b'M' => f.month = cur.name(&MONTH_NAMES, false)? as u64 + 1,
            b'b' => f.month = cur.name(&MONTH_NAMES, true)? as u64 + 1,
            b'd' | b'e' => f.day = cur.number(2)?,
            b'D' => {
                f.day = cur.number(2)?;
                if cur.s.len() >= cur.pos + 2 {
                    cur.pos += 2;
                }
            }
            b'H' | b'k' => f.hour = cur.number(2)?,
            b'h' | b'I' | b'l' => {
                f.hour = cur.number(2)?;
                f.twelve_hour = true;
            }
            b'i' => f.minute = cur.number(2)?,
            b'S' | b's' => f.second = cur.number(2)?,
            b'f' => f.micro = cur.micros()?,
            b'p' => f.pm = Some(cur.ampm()?),
            b'r' => {
                f.hour = cur.number(2)?;
                cur.literal(b':')?;
                f.minute = cur.number(2)?;
                cur.literal(b':')?;
                f.second = cur.number(2)?;
                cur.skip_spaces();
                f.pm = Some(cur.ampm()?);
                f.twelve_hour = true;
            }
            b'T' => {
                f.hour = cur.number(2)?;
                cur.literal(b':')?;
                f.minute = cur.number(2)?;
                cur.literal(b':')?;
                f.second = cur.number(2)?;
            }
            b'j' => f.yearday = Some(cur.number(3)?),
            b'W' => f.weekday = Some(cur.name(&DAY_NAMES, false)? as u64 + 1),
            b'a' => f.weekday = Some(cur.name(&DAY_NAMES, true)? as u64 + 1),
            b'w' => {
                let w = cur.number(1)?;
                if w > 6 {
                    return None;
                }
                f.weekday = Some(if w == 0 { 7 } else { w });
            }
            b'U' | b'u' | b'V' | b'v' => {
                f.week = Some(cur.number(2)?);
                f.sunday_first = matches!(spec, b'U' | b'V');
                f.strict_week = matches!(spec, b'V' | b'v');
            }
            b'X' | b'x' => f.week_year = Some((cur.number(4)?, spec == b'X')),
            b'%' => cur.literal(b'%')?,
            other => cur.literal(other)?,
        }
    }
    cur.skip_spaces();
    let truncated = !cur.at_end();
    build(f, allow_invalid_dates).map(|time| Parsed { time, truncated })
}

fn build(mut f: Fields, allow_invalid_dates: bool) -> Option<Time> {
    if let Some(pm) = f.pm {
        if !f.twelve_hour || f.hour > 12 || f.hour < 1 {
            return None;
        }
        f.hour %= 12;
        if pm {
            f.hour += 12;
        }
    }
    if let Some(yearday) = f.yearday {
        if yearday > 0 {
            let daynr = calc_daynr(f.year as u32, 1, 1) + yearday as i64 - 1;
            let (y, m, d) = date_from_daynr(daynr);
            f.year = y as u64;
            f.month = m as u64;
            f.day = d as u64;
        }
    }
    if let (Some(week), Some(weekday)) = (f.week, f.weekday) {
        let year = match f.week_year {
            Some((y, sunday_first)) => {
                if !f.strict_week || sunday_first != f.sunday_first {
                    return None;
                }
                y
            }
            None if f.strict_week => return None,
            None => f.year,
        };
        let first = calc_daynr(year as u32, 1, 1);
        let wd = calendar::weekday(first, f.sunday_first) as i64;
        let week = week as i64;
        let days = if f.sunday_first {
            first + (if wd == 0 { 0 } else { 7 }) - wd + (week - 1) * 7 + (weekday as i64 % 7)
        } else {
            first + (if wd <= 3 { 0 } else { 7 }) - wd + (week - 1) * 7 + (weekday as i64 - 1)
        };
        if days <= 0 {
            return None;
        }
        let (y, m, d) = date_from_daynr(days);
        f.year = y as u64;
        f.month = m as u64;
        f.day = d as u64;
    }
    if f.year > 9999 || f.month > 12 || f.day > 31 || f.hour > 23 || f.minute > 59 || f.second > 59 {
        return None;
    }
    if !allow_invalid_dates && f.month > 0 && f.day > days_in_month(f.year as u32, f.month as u32) as u64 {
        return None;
    }
    Some(
        Time::from_ymd_hms(
            f.year as u32,
            f.month as u32,
            f.day as u32,
            f.hour as u32,
            f.minute as u32,
            f.second as u32,
        )
        .with_micro(f.micro as u32),
    )
}

/// `GET_FORMAT(type, locale)`
pub fn get_format(kind: &str, locale: &str) -> Option<&'static str> {
    let kind = kind.to_ascii_uppercase();
    let locale = locale.to_ascii_uppercase();
    let f = match (kind.as_str(), locale.as_str()) {
        ("DATE", "USA") => "%m.%d.%Y",
        ("DATE", "JIS" | "ISO") => "%Y-%m-%d",
        ("DATE", "EUR") => "%d.%m.%Y",
        ("DATE", "INTERNAL") => "%Y%m%d",
        ("DATETIME" | "TIMESTAMP", "USA" | "EUR") => "%Y-%m-%d %H.%i.%s",
        ("DATETIME" | "TIMESTAMP", "JIS" | "ISO") => "%Y-%m-%d %H:%i:%s",
        ("DATETIME" | "TIMESTAMP", "INTERNAL") => "%Y%m%d%H%i%s",
        ("TIME", "USA") => "%h:%i:%s %p",
        ("TIME", "JIS" | "ISO") => "%H:%i:%s",
        ("TIME", "EUR") => "%H.%i.%s",
        ("TIME", "INTERNAL") => "%H%i%s",
        _ => return None,
    };
    Some(f)
}
