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

//! Week numbering, periods and other calendar helpers

use crate::core::time::{calc_daynr, date_from_daynr, days_in_month, days_in_year};
use crate::core::Time;

/// Week starts on Monday
pub const WEEK_MONDAY_FIRST: u32 = 1;
/// Weeks belong to the year that holds most of their days
pub const WEEK_YEAR: u32 = 2;
/// Week 1 is the first week with a start day in the year
pub const WEEK_FIRST_WEEKDAY: u32 = 4;

/// Largest day number `FROM_DAYS` and `MAKEDATE` accept (9999-12-31)
pub const MAX_DAY_NUMBER: i64 = 3_652_424;

/// Behaviour flags of the `mode` argument of `WEEK()`
pub fn week_mode(mode: u32) -> u32 {
    let mut flags = mode & 7;
    if flags & WEEK_MONDAY_FIRST == 0 {
        flags ^= WEEK_FIRST_WEEKDAY;
    }
    flags
}

/// Day of week for a day number; 0 is Monday, or Sunday when `sunday_first`
pub fn weekday(daynr: i64, sunday_first: bool) -> u32 {
    ((daynr + 5 + sunday_first as i64) % 7) as u32
}

/// Week number and the year it belongs to
pub fn calc_week(t: &Time, behaviour: u32) -> (u32, u32) {
    let daynr = t.daynr();
    let mut year = t.year as u32;
    let mut first_daynr = calc_daynr(year, 1, 1);
    let monday_first = behaviour & WEEK_MONDAY_FIRST != 0;
    let mut week_year = behaviour & WEEK_YEAR != 0;
    let first_weekday = behaviour & WEEK_FIRST_WEEKDAY != 0;

    let mut wd = weekday(first_daynr, !monday_first);

    if t.month == 1 && (t.day as u32) <= 7 - wd {
        if !week_year && ((first_weekday && wd != 0) || (!first_weekday && wd >= 4)) {
            return (0, year);
        }
        week_year = true;
        year = year.saturating_sub(1);
        let days = days_in_year(year) as i64;
        first_daynr -= days;
        wd = ((wd as i64 + 53 * 7 - days) % 7) as u32;
    }

    let days = if (first_weekday && wd != 0) || (!first_weekday && wd >= 4) {
        daynr - (first_daynr + (7 - wd as i64))
    } else {
        daynr - (first_daynr - wd as i64)
    };

    if week_year && days >= 52 * 7 {
        let wd = (wd + days_in_year(year)) % 7;
        if (!first_weekday && wd < 4) || (first_weekday && wd == 0) {
            return (1, year + 1);
        }
    }
    ((days / 7 + 1) as u32, year)
}

/// `WEEK(date, mode)`
pub fn week(t: &Time, mode: u32) -> u32 {
    calc_week(t, week_mode(mode)).0
}

/// `YEARWEEK(date, mode)` as `YYYYWW`
pub fn year_week(t: &Time, mode: u32) -> i64 {
    let (week, year) = calc_week(t, week_mode(mode) | WEEK_YEAR);
    year as i64 * 100 + week as i64
}

/// Day of the year, 1-based
pub fn day_of_year(t: &Time) -> i64 {
    t.daynr() - calc_daynr(t.year as u32, 1, 1) + 1
}

/// Last day of the month of `t`
pub fn last_day(t: &Time) -> Time {
    let year = t.year as u32;
    let month = t.month as u32;
    Time::from_ymd(year, month, days_in_month(year, month))
}

/// `FROM_DAYS`; day numbers below 366 give the zero date
pub fn from_days(daynr: i64) -> Option<Time> {
    if daynr > MAX_DAY_NUMBER {
        return None;
    }
    if daynr < 366 {
        return Some(Time::zero());
    }
    let (y, m, d) = date_from_daynr(daynr);
    Some(Time::from_ymd(y, m, d))
}

/// Expand a two-digit year the way MySQL does: 0-69 → 2000s, 70-99 → 1900s
pub fn expand_year(year: i64) -> i64 {
    match year {
        0..=69 => year + 2000,
        70..=99 => year + 1900,
        _ => year,
    }
}

/// `MAKEDATE(year, dayofyear)`
pub fn make_date(year: i64, day_of_year: i64) -> Option<Time> {
    if !(0..=9999).contains(&year) || day_of_year <= 0 {
        return None;
    }
    let year = expand_year(year) as u32;
    let daynr = calc_daynr(year, 1, 1) + day_of_year - 1;
    if daynr > MAX_DAY_NUMBER {
        return None;
    }
    let (y, m, d) = date_from_daynr(daynr);
    Some(Time::from_ymd(y, m, d))
}

/// Months since year 0 of a `YYMM` or `YYYYMM` period
pub fn period_to_months(period: i64) -> i64 {
    if period == 0 {
        return 0;
    }
    let year = expand_year(period / 100);
    year * 12 + period % 100 - 1
}

/// Inverse of [`period_to_months`]
pub fn months_to_period(months: i64) -> i64 {
    if months == 0 {
        return 0;
    }
    let year = expand_year(months / 12);
    year * 100 + months % 12 + 1
}

/// Whether a period has a valid month part
pub fn is_valid_period(period: i64) -> bool {
    period >= 0 && (period == 0 || (1..=12).contains(&(period % 100)))
}
