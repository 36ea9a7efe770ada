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

//! `INTERVAL expr unit` values and date arithmetic

use std::fmt;
use std::str::FromStr;

use num_traits::ToPrimitive;

use crate::core::decimal;
use crate::core::time::{days_in_month, MICROS_PER_SECOND};
use crate::core::{format_f64, Decimal, Duration, Error, Result, Time};

/// Interval units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Microsecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    SecondMicrosecond,
    MinuteMicrosecond,
    MinuteSecond,
    HourMicrosecond,
    HourSecond,
    HourMinute,
    DayMicrosecond,
    DaySecond,
    DayMinute,
    DayHour,
    YearMonth,
}

/// Field slots of a decomposed interval, most significant first
const YEAR: usize = 0;
const MONTH: usize = 1;
const DAY: usize = 2;
const HOUR: usize = 3;
const MINUTE: usize = 4;
const SECOND: usize = 5;
const MICRO: usize = 6;

impl IntervalUnit {
    pub fn name(self) -> &'static str {
        match self {
            IntervalUnit::Microsecond => "MICROSECOND",
            IntervalUnit::Second => "SECOND",
            IntervalUnit::Minute => "MINUTE",
            IntervalUnit::Hour => "HOUR",
            IntervalUnit::Day => "DAY",
            IntervalUnit::Week => "WEEK",
            IntervalUnit::Month => "MONTH",
            IntervalUnit::Quarter => "QUARTER",
            IntervalUnit::Year => "YEAR",
            IntervalUnit::SecondMicrosecond => "SECOND_MICROSECOND",
            IntervalUnit::MinuteMicrosecond => "MINUTE_MICROSECOND",
            IntervalUnit::MinuteSecond => "MINUTE_SECOND",
            IntervalUnit::HourMicrosecond => "HOUR_MICROSECOND",
            IntervalUnit::HourSecond => "HOUR_SECOND",
            IntervalUnit::HourMinute => "HOUR_MINUTE",
            IntervalUnit::DayMicrosecond => "DAY_MICROSECOND",
            IntervalUnit::DaySecond => "DAY_SECOND",
            IntervalUnit::DayMinute => "DAY_MINUTE",
            IntervalUnit::DayHour => "DAY_HOUR",
            IntervalUnit::YearMonth => "YEAR_MONTH",
        }
    }

    /// Slots filled by a compound unit, in text order
    fn slots(self) -> &'static [usize] {
        match self {
            IntervalUnit::Microsecond => &[MICRO],
            IntervalUnit::Second => &[SECOND],
            IntervalUnit::Minute => &[MINUTE],
            IntervalUnit::Hour => &[HOUR],
            IntervalUnit::Day | IntervalUnit::Week => &[DAY],
            IntervalUnit::Month | IntervalUnit::Quarter => &[MONTH],
            IntervalUnit::Year => &[YEAR],
            IntervalUnit::SecondMicrosecond => &[SECOND, MICRO],
            IntervalUnit::MinuteMicrosecond => &[MINUTE, SECOND, MICRO],
            IntervalUnit::MinuteSecond => &[MINUTE, SECOND],
            IntervalUnit::HourMicrosecond => &[HOUR, MINUTE, SECOND, MICRO],
            IntervalUnit::HourSecond => &[HOUR, MINUTE, SECOND],
            IntervalUnit::HourMinute => &[HOUR, MINUTE],
            IntervalUnit::DayMicrosecond => &[DAY, HOUR, MINUTE, SECOND, MICRO],
            IntervalUnit::DaySecond => &[DAY, HOUR, MINUTE, SECOND],
            IntervalUnit::DayMinute => &[DAY, HOUR, MINUTE],
            IntervalUnit::DayHour => &[DAY, HOUR],
            IntervalUnit::YearMonth => &[YEAR, MONTH],
        }
    }

    /// Returns true for units made of more than one field
    pub fn is_compound(self) -> bool {
        self.slots().len() > 1
    }

    /// Returns true for units applied on the calendar month
    pub fn is_month_based(self) -> bool {
        matches!(
            self,
            IntervalUnit::Month | IntervalUnit::Quarter | IntervalUnit::Year | IntervalUnit::YearMonth
        )
    }

    /// Returns true if the unit has a time-of-day component
    pub fn has_time_part(self) -> bool {
        !matches!(
            self,
            IntervalUnit::Day
                | IntervalUnit::Week
                | IntervalUnit::Month
                | IntervalUnit::Quarter
                | IntervalUnit::Year
                | IntervalUnit::YearMonth
        )
    }

    /// Returns true if the unit carries microseconds
    pub fn has_micro_part(self) -> bool {
        self.slots().contains(&MICRO)
    }
}

impl FromStr for IntervalUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unit = match s.trim().to_ascii_uppercase().as_str() {
            "MICROSECOND" => IntervalUnit::Microsecond,
            "SECOND" => IntervalUnit::Second,
            "MINUTE" => IntervalUnit::Minute,
            "HOUR" => IntervalUnit::Hour,
            "DAY" => IntervalUnit::Day,
            "WEEK" => IntervalUnit::Week,
            "MONTH" => IntervalUnit::Month,
            "QUARTER" => IntervalUnit::Quarter,
            "YEAR" => IntervalUnit::Year,
            "SECOND_MICROSECOND" => IntervalUnit::SecondMicrosecond,
            "MINUTE_MICROSECOND" => IntervalUnit::MinuteMicrosecond,
            "MINUTE_SECOND" => IntervalUnit::MinuteSecond,
            "HOUR_MICROSECOND" => IntervalUnit::HourMicrosecond,
            "HOUR_SECOND" => IntervalUnit::HourSecond,
            "HOUR_MINUTE" => IntervalUnit::HourMinute,
            "DAY_MICROSECOND" => IntervalUnit::DayMicrosecond,
            "DAY_SECOND" => IntervalUnit::DaySecond,
            "DAY_MINUTE" => IntervalUnit::DayMinute,
            "DAY_HOUR" => IntervalUnit::DayHour,
            "YEAR_MONTH" => IntervalUnit::YearMonth,
            _ => return Err(Error::invalid_argument(format!("unknown interval unit '{}'", s))),
        };
        Ok(unit)
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decomposed interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    pub neg: bool,
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub micros: u64,
}

impl Interval {
    fn from_slots(neg: bool, v: [u64; 7]) -> Self {
        Self {
            neg,
            years: v[YEAR],
            months: v[MONTH],
            days: v[DAY],
            hours: v[HOUR],
            minutes: v[MINUTE],
            seconds: v[SECOND],
            micros: v[MICRO],
        }
    }

    /// Interval from a whole number of `unit`s
    pub fn from_int(value: i64, unit: IntervalUnit) -> Self {
        let neg = value < 0;
        let abs = value.unsigned_abs();
        let mut v = [0u64; 7];
        let slots = unit.slots();
        let last = slots[slots.len() - 1];
        v[last] = match unit {
            IntervalUnit::Week => abs.saturating_mul(7),
            IntervalUnit::Quarter => abs.saturating_mul(3),
            _ => abs,
        };
        Self::from_slots(neg, v)
    }

    /// Interval from a decimal amount.
    ///
    /// Compound units read the digits as text; `SECOND` keeps the fraction
    /// as microseconds; other units round half up to a whole number.
    pub fn from_decimal(value: Decimal, unit: IntervalUnit) -> Option<Self> {
        if unit.is_compound() {
            return Self::from_text(&value.to_string(), unit);
        }
        if unit == IntervalUnit::Second {
            let neg = value.is_sign_negative() && !value.is_zero();
            let abs = value.abs();
            let whole = abs.trunc();
            let micros = decimal::fraction_micros(&abs);
            let mut iv = Self::from_int(0, unit);
            iv.neg = neg;
            iv.seconds = whole.to_u64()?;
            iv.micros = micros;
            return Some(iv);
        }
        let rounded = value.round_dp(0);
        Some(Self::from_int(rounded.to_i64()?, unit))
    }

    /// Interval from a double; compound units use its text form
    pub fn from_real(value: f64, unit: IntervalUnit) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if unit.is_compound() {
            return Self::from_text(&format_f64(value), unit);
        }
        if unit == IntervalUnit::Second {
            let neg = value < 0.0;
            let abs = value.abs();
            let whole = abs.trunc();
            let mut iv = Self::from_int(0, unit);
            iv.neg = neg;
            iv.seconds = whole as u64;
            iv.micros = ((abs - whole) * 1e6).round() as u64;
            return Some(iv);
        }
        let rounded = value.round();
        if rounded.abs() >= 9.2e18 {
            return None;
        }
        Some(Self::from_int(rounded as i64, unit))
    }

    /// Interval from text such as `'11-1'` or `'-1 10:30'`.
    ///
    /// Digit groups are read left to right; when fewer groups than fields
    /// are given they fill the rightmost fields. A short microsecond group
    /// is left-aligned to six digits.
    pub fn from_text(text: &str, unit: IntervalUnit) -> Option<Self> {
        let s = text.trim_start();
        let (neg, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let slots = unit.slots();
        let count = slots.len();
        let bytes = body.as_bytes();

        let mut groups: Vec<(u64, usize)> = Vec::with_capacity(count);
        let mut i = 0;
        while i < bytes.len() && !bytes[i].is_ascii_digit() {
            i += 1;
        }
        while groups.len() < count && i < bytes.len() {
            let start = i;
            let mut value: u64 = 0;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                value = value.checked_mul(10)?.checked_add((bytes[i] - b'0') as u64)?;
                i += 1;
            }
            groups.push((value, i - start));
            while i < bytes.len() && !bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        if groups.is_empty() {
            groups.push((0, 0));
        }

        let mut v = [0u64; 7];
        let offset = count - groups.len();
        for (k, (value, digits)) in groups.iter().enumerate() {
            let slot = slots[offset + k];
            let mut value = *value;
            if slot == MICRO && count > 1 && offset + k == count - 1 && *digits < 6 {
                value *= 10u64.pow(6 - *digits as u32);
            }
            v[slot] = value;
        }
        if unit == IntervalUnit::Week {
            v[DAY] = v[DAY].saturating_mul(7);
        } else if unit == IntervalUnit::Quarter {
            v[MONTH] = v[MONTH].saturating_mul(3);
        }
        Some(Self::from_slots(neg, v))
    }

    /// Total months of a month-based interval, signed
    pub fn total_months(&self) -> Option<i64> {
        let m = self.years.checked_mul(12)?.checked_add(self.months)?;
        let m = i64::try_from(m).ok()?;
        Some(if self.neg { -m } else { m })
    }

    /// Exact microsecond delta of the day/time fields, signed
    pub fn total_micros(&self) -> Option<i64> {
        let secs = self
            .days
            .checked_mul(86_400)?
            .checked_add(self.hours.checked_mul(3_600)?)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;
        let micros = secs
            .checked_mul(MICROS_PER_SECOND as u64)?
            .checked_add(self.micros)?;
        let micros = i64::try_from(micros).ok()?;
        Some(if self.neg { -micros } else { micros })
    }

    /// Flip the sign (for `DATE_SUB`)
    pub fn negated(mut self) -> Self {
        self.neg = !self.neg;
        self
    }
}

/// Add an interval to a date/datetime. `None` when the result leaves
/// 0001-01-01..9999-12-31.
pub fn add_to_time(t: &Time, iv: &Interval, unit: IntervalUnit) -> Option<Time> {
    if unit.is_month_based() {
        let delta = iv.total_months()?;
        let period = (t.year as i64 * 12 + t.month as i64 - 1).checked_add(delta)?;
        if period < 0 {
            return None;
        }
        let year = period / 12;
        let month = (period % 12 + 1) as u32;
        if !(1..=9999).contains(&year) {
            return None;
        }
        let day = (t.day as u32).min(days_in_month(year as u32, month));
        let mut r = *t;
        r.year = year as u16;
        r.month = month as u8;
        r.day = day as u8;
        return Some(r);
    }
    let delta = iv.total_micros()?;
    let micros = t.to_micros().checked_add(delta)?;
    let fsp = if iv.micros != 0 { 6 } else { t.fsp };
    Time::from_micros(micros, fsp)
}

/// Add a day/time interval to a TIME value. `None` when the result leaves
/// the TIME range or the unit is month based.
pub fn add_to_duration(d: &Duration, iv: &Interval, unit: IntervalUnit) -> Option<Duration> {
    if unit.is_month_based() {
        return None;
    }
    let micros = d.micros().checked_add(iv.total_micros()?)?;
    let fsp = if iv.micros != 0 { 6 } else { d.fsp() };
    let r = Duration::from_micros(micros, fsp);
    if !r.in_range() {
        return None;
    }
    Some(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(text: &str) -> Time {
        Time::parse(text, crate::core::ParseOptions::default()).unwrap().time
    }

    #[test]
    fn test_year_month_text() {
        let iv = Interval::from_text("11-1", IntervalUnit::YearMonth).unwrap();
        assert_eq!((iv.years, iv.months), (11, 1));
        let r = add_to_time(&dt("2011-11-11 10:10:10"), &iv, IntervalUnit::YearMonth).unwrap();
        assert_eq!(r.format_datetime(), "2022-12-11 10:10:10");
    }

    #[test]
    fn test_short_text_fills_right() {
        let iv = Interval::from_text("5", IntervalUnit::DayHour).unwrap();
        assert_eq!((iv.days, iv.hours), (0, 5));
        let iv = Interval::from_text("-1 10", IntervalUnit::DayHour).unwrap();
        assert!(iv.neg);
        assert_eq!((iv.days, iv.hours), (1, 10));
    }

    #[test]
    fn test_microsecond_left_aligned() {
        let iv = Interval::from_text("1.5", IntervalUnit::SecondMicrosecond).unwrap();
        assert_eq!((iv.seconds, iv.micros), (1, 500_000));
        let iv = Interval::from_text("1.000005", IntervalUnit::SecondMicrosecond).unwrap();
        assert_eq!(iv.micros, 5);
    }

    #[test]
    fn test_decimal_amounts() {
        let d = |s: &str| s.parse::<Decimal>().unwrap();
        let iv = Interval::from_decimal(d("2.2"), IntervalUnit::Hour).unwrap();
        assert_eq!(iv.hours, 2);
        let iv = Interval::from_decimal(d("2.5"), IntervalUnit::Hour).unwrap();
        assert_eq!(iv.hours, 3);
        let iv = Interval::from_decimal(d("1.5"), IntervalUnit::Second).unwrap();
        assert_eq!((iv.seconds, iv.micros), (1, 500_000));
        let iv = Interval::from_decimal(d("1.5"), IntervalUnit::HourMinute).unwrap();
        assert_eq!((iv.hours, iv.minutes), (1, 5));
    }

    #[test]
    fn test_month_saturation() {
        let iv = Interval::from_int(1, IntervalUnit::Month);
        let r = add_to_time(&dt("2011-01-31"), &iv, IntervalUnit::Month).unwrap();
        assert_eq!(r.format_date(), "2011-02-28");
        let r = add_to_time(&dt("2012-01-31"), &iv, IntervalUnit::Month).unwrap();
        assert_eq!(r.format_date(), "2012-02-29");
    }

    #[test]
    fn test_day_carry_and_overflow() {
        let iv = Interval::from_int(1, IntervalUnit::Second);
        let r = add_to_time(&dt("2011-12-31 23:59:59"), &iv, IntervalUnit::Second).unwrap();
        assert_eq!(r.format_datetime(), "2012-01-01 00:00:00");

        let iv = Interval::from_int(1, IntervalUnit::Day);
        assert!(add_to_time(&dt("9999-12-31"), &iv, IntervalUnit::Day).is_none());
        let iv = Interval::from_int(-1, IntervalUnit::Day);
        assert!(add_to_time(&dt("0001-01-01"), &iv, IntervalUnit::Day).is_none());
    }

    #[test]
    fn test_duration_arithmetic() {
        let d = Duration::from_micros(10 * 3_600 * 1_000_000, 0);
        let iv = Interval::from_int(1, IntervalUnit::Day);
        let r = add_to_duration(&d, &iv, IntervalUnit::Day).unwrap();
        assert_eq!(r.to_string(), "34:00:00");
        let iv = Interval::from_int(40, IntervalUnit::Day);
        assert!(add_to_duration(&d, &iv, IntervalUnit::Day).is_none());
    }

    #[test]
    fn test_unit_names() {
        assert_eq!("year_month".parse::<IntervalUnit>().unwrap(), IntervalUnit::YearMonth);
        assert!("fortnight".parse::<IntervalUnit>().is_err());
    }
}
