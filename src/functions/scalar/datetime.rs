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

//! Date and Time Functions
//!
//! Functions that only read fields take their argument converted to
//! DATETIME or TIME by resolution, so malformed text is reported once by
//! the cast engine. Interval arithmetic (`DATE_ADD` and friends) reads
//! text itself because a string argument gives a string result whose shape
//! follows the input.
//!
//! Interval units are passed as a constant text argument: `DATE_ADD(d, n,
//! 'DAY')`, `TIMESTAMPDIFF('MONTH', a, b)`, `EXTRACT('YEAR', d)`.

use num_traits::ToPrimitive;

use super::{
    const_unit, decimal_of, decimal_type, int_of, int_type, opt_text, register_all, string_type,
    text_of, Aux, Bound, Builtin, Signature,
};
use crate::core::time::{MICROS_PER_DAY, MICROS_PER_SECOND};
use crate::core::types::MAX_FSP;
use crate::core::{
    decimal, Datum, Decimal, Duration, Error, EvalType, FieldKind, FieldType, ParseOptions, Result,
    SqlMode, Time,
};
use crate::datetime::{add_to_duration, add_to_time, calendar, format, Interval, IntervalUnit};
use crate::diagnostics::Recovery;
use crate::eval::TimeZone;
use crate::functions::registry::FunctionRegistry;
use crate::functions::{ArgType, Call, FunctionSignature as Sig, PlanContext};

/// `TO_DAYS('1970-01-01')`
const UNIX_EPOCH_DAYNR: i64 = 719_528;

/// Largest `UNIX_TIMESTAMP` result, 3001-01-18 23:59:59 UTC
const MAX_UNIX_SECONDS: i64 = 32_536_771_199;

/// Marks results whose argument was text: fractional digits are shown
/// only when the value has a fraction
const FSP_FROM_TEXT: i64 = 1;

pub(super) fn register(registry: &FunctionRegistry) {
    register_all(
        registry,
        vec![
            // Clock
            Builtin::new("NOW", Sig::new(0, 1), resolve_now, eval_now)
                .describe("Statement start time"),
            Builtin::new("CURRENT_TIMESTAMP", Sig::new(0, 1), resolve_now, eval_now),
            Builtin::new("LOCALTIME", Sig::new(0, 1), resolve_now, eval_now),
            Builtin::new("LOCALTIMESTAMP", Sig::new(0, 1), resolve_now, eval_now),
            Builtin::new("SYSDATE", Sig::new(0, 1), resolve_now, eval_sysdate)
                .volatile()
                .describe("Time at which the function executes"),
            Builtin::new("CURDATE", Sig::exact(0), resolve_curdate, eval_curdate)
                .describe("Current date"),
            Builtin::new("CURRENT_DATE", Sig::exact(0), resolve_curdate, eval_curdate),
            Builtin::new("CURTIME", Sig::new(0, 1), resolve_curtime, eval_curtime)
                .describe("Current time"),
            Builtin::new("CURRENT_TIME", Sig::new(0, 1), resolve_curtime, eval_curtime),
            Builtin::new("UTC_DATE", Sig::exact(0), resolve_curdate, eval_utc_date),
            Builtin::new("UTC_TIME", Sig::new(0, 1), resolve_curtime, eval_utc_time),
            Builtin::new("UTC_TIMESTAMP", Sig::new(0, 1), resolve_now, eval_utc_timestamp),
            // Construction
            Builtin::new("DATE", Sig::exact(1), resolve_date, eval_identity)
                .describe("Date part of a date or datetime"),
            Builtin::new("TIME", Sig::exact(1), resolve_time, eval_time)
                .describe("Time part of a time or datetime"),
            Builtin::new("TIMESTAMP", Sig::new(1, 2), resolve_timestamp, eval_timestamp)
                .describe("Datetime from a date, optionally plus a time"),
            Builtin::new("FROM_DAYS", Sig::exact(1), resolve_from_days, eval_from_days),
            Builtin::new("MAKEDATE", Sig::exact(2), resolve_makedate, eval_makedate)
                .describe("Date from a year and day of year"),
            Builtin::new("MAKETIME", Sig::exact(3), resolve_maketime, eval_maketime)
                .describe("Time from hour, minute and second"),
            Builtin::new("SEC_TO_TIME", Sig::exact(1), resolve_sec_to_time, eval_sec_to_time),
            Builtin::new("LAST_DAY", Sig::exact(1), resolve_last_day, eval_last_day)
                .describe("Last day of the month"),
            // Fields
            Builtin::new("YEAR", Sig::exact(1), resolve_date_int, eval_year),
            Builtin::new("MONTH", Sig::exact(1), resolve_date_int, eval_month),
            Builtin::new("DAY", Sig::exact(1), resolve_date_int, eval_day),
            Builtin::new("DAYOFMONTH", Sig::exact(1), resolve_date_int, eval_day),
            Builtin::new("QUARTER", Sig::exact(1), resolve_date_int, eval_quarter),
            Builtin::new("DAYOFYEAR", Sig::exact(1), resolve_date_int, eval_dayofyear),
            Builtin::new("DAYOFWEEK", Sig::exact(1), resolve_date_int, eval_dayofweek)
                .describe("Weekday index, 1 = Sunday"),
            Builtin::new("WEEKDAY", Sig::exact(1), resolve_date_int, eval_weekday)
                .describe("Weekday index, 0 = Monday"),
            Builtin::new("DAYNAME", Sig::exact(1), resolve_date_name, eval_dayname),
            Builtin::new("MONTHNAME", Sig::exact(1), resolve_date_name, eval_monthname),
            Builtin::new("WEEK", Sig::new(1, 2), resolve_date_int, eval_week)
                .describe("Week number for a week mode"),
            Builtin::new("WEEKOFYEAR", Sig::exact(1), resolve_date_int, eval_weekofyear),
            Builtin::new("YEARWEEK", Sig::new(1, 2), resolve_date_int, eval_yearweek),
            Builtin::new("TO_DAYS", Sig::exact(1), resolve_date_int, eval_to_days),
            Builtin::new("TO_SECONDS", Sig::exact(1), resolve_date_int, eval_to_seconds),
            Builtin::new("HOUR", Sig::exact(1), resolve_time_int, eval_hour),
            Builtin::new("MINUTE", Sig::exact(1), resolve_time_int, eval_minute),
            Builtin::new("SECOND", Sig::exact(1), resolve_time_int, eval_second),
            Builtin::new("MICROSECOND", Sig::exact(1), resolve_time_int, eval_microsecond),
            Builtin::new("TIME_TO_SEC", Sig::exact(1), resolve_time_int, eval_time_to_sec),
            Builtin::new("EXTRACT", Sig::exact(2), resolve_extract, eval_extract)
                .describe("Field of a date or time for an interval unit"),
            // Arithmetic
            Builtin::new("DATE_ADD", Sig::exact(3), resolve_date_add, eval_date_add)
                .describe("Add an interval to a date"),
            Builtin::new("DATE_SUB", Sig::exact(3), resolve_date_add, eval_date_sub)
                .describe("Subtract an interval from a date"),
            Builtin::new("ADDDATE", Sig::new(2, 3), resolve_adddate, eval_date_add),
            Builtin::new("SUBDATE", Sig::new(2, 3), resolve_adddate, eval_date_sub),
            Builtin::new("TIMESTAMPADD", Sig::exact(3), resolve_timestampadd, eval_timestampadd),
            Builtin::new("ADDTIME", Sig::exact(2), resolve_addtime, eval_addtime)
                .describe("Add a time to a time or datetime"),
            Builtin::new("SUBTIME", Sig::exact(2), resolve_addtime, eval_subtime),
            Builtin::new("TIMEDIFF", Sig::exact(2), resolve_timediff, eval_timediff),
            Builtin::new("DATEDIFF", Sig::exact(2), resolve_datediff, eval_datediff)
                .describe("Days between two dates"),
            Builtin::new("TIMESTAMPDIFF", Sig::exact(3), resolve_timestampdiff, eval_timestampdiff),
            Builtin::new("PERIOD_ADD", Sig::exact(2), resolve_period, eval_period_add),
            Builtin::new("PERIOD_DIFF", Sig::exact(2), resolve_period, eval_period_diff),
            // Formatting
            Builtin::new("DATE_FORMAT", Sig::exact(2), resolve_date_format, eval_date_format),
            Builtin::new("TIME_FORMAT", Sig::exact(2), resolve_time_format, eval_time_format),
            Builtin::new("STR_TO_DATE", Sig::exact(2), resolve_str_to_date, eval_str_to_date)
                .describe("Parse text with a format string"),
            Builtin::new("GET_FORMAT", Sig::exact(2), resolve_get_format, eval_get_format),
            // Unix time and zones
            Builtin::new("UNIX_TIMESTAMP", Sig::new(0, 1), resolve_unix_timestamp, eval_unix_timestamp),
            Builtin::new("FROM_UNIXTIME", Sig::new(1, 2), resolve_from_unixtime, eval_from_unixtime),
            Builtin::new("CONVERT_TZ", Sig::exact(3), resolve_convert_tz, eval_convert_tz)
                .describe("Move a datetime between time zones"),
        ],
    );
}

// ============================================================================
// Resolution
// ============================================================================

/// Fractional digits a value of this argument may carry
fn temporal_fsp(a: &ArgType) -> u8 {
    match a.eval_type() {
        EvalType::Datetime | EvalType::Duration => a.ty.fsp(),
        EvalType::Int => 0,
        EvalType::Decimal => a.ty.decimal.clamp(0, MAX_FSP as i32) as u8,
        _ if a.is_null() => 0,
        _ => MAX_FSP,
    }
}

fn datetime_cast(a: &ArgType) -> Option<FieldType> {
    if a.is_null() || a.eval_type() == EvalType::Datetime {
        None
    } else {
        Some(FieldType::datetime(MAX_FSP))
    }
}

fn duration_cast(a: &ArgType) -> Option<FieldType> {
    if a.is_null() || a.eval_type() == EvalType::Duration {
        None
    } else {
        Some(FieldType::duration(temporal_fsp(a)))
    }
}

fn int_cast(a: &ArgType) -> Option<FieldType> {
    if a.is_null() || a.eval_type() == EvalType::Int {
        None
    } else {
        Some(int_type())
    }
}

/// Whole seconds stay integers, everything else becomes an exact decimal
fn seconds_cast(a: &ArgType) -> Option<FieldType> {
    match a.eval_type() {
        EvalType::Int | EvalType::Decimal => None,
        _ if a.is_null() => None,
        _ => Some(decimal_type(20, MAX_FSP as i32)),
    }
}

fn fsp_aux(args: &[&ArgType]) -> Aux {
    if args.iter().any(|a| !a.is_null() && a.eval_type() == EvalType::String) {
        Aux::Int(FSP_FROM_TEXT)
    } else {
        Aux::None
    }
}

/// Constant precision argument of the clock functions
fn const_fsp(args: &[ArgType]) -> Result<u8> {
    let Some(a) = args.first() else {
        return Ok(0);
    };
    let fsp = a.const_int().ok_or_else(|| Error::incorrect_arguments(""))?;
    if fsp < 0 {
        return Err(Error::incorrect_arguments(""));
    }
    if fsp > MAX_FSP as i64 {
        return Err(Error::TooBigPrecision {
            precision: fsp.min(u32::MAX as i64) as u32,
            expr: String::new(),
            max: MAX_FSP as u32,
        });
    }
    Ok(fsp as u8)
}

fn resolve_now(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::datetime(const_fsp(args)?)))
}

fn resolve_curdate(_args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::date()))
}

fn resolve_curtime(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::duration(const_fsp(args)?)))
}

fn resolve_date(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let cast = (!args[0].is_null() && args[0].ty.kind != FieldKind::Date).then(FieldType::date);
    Ok(Signature::new(FieldType::date()).casts(vec![cast]))
}

fn resolve_time(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let ret = FieldType::duration(temporal_fsp(&args[0]));
    let cast = (!args[0].is_null() && args[0].ty != ret).then(|| ret.clone());
    Ok(Signature::new(ret)
        .casts(vec![cast])
        .aux(fsp_aux(&[&args[0]])))
}

fn resolve_timestamp(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let fsp = args.iter().map(temporal_fsp).max().unwrap_or(0);
    let mut casts = vec![datetime_cast(&args[0])];
    if let Some(a) = args.get(1) {
        casts.push(duration_cast(a));
    }
    let refs: Vec<&ArgType> = args.iter().collect();
    Ok(Signature::new(FieldType::datetime(fsp))
        .casts(casts)
        .aux(fsp_aux(&refs)))
}

fn resolve_from_days(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::date()).casts(vec![int_cast(&args[0])]))
}

fn resolve_makedate(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::date()).casts(args.iter().map(int_cast).collect()))
}

fn resolve_maketime(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::duration(temporal_fsp(&args[2])))
        .casts(vec![int_cast(&args[0]), int_cast(&args[1]), seconds_cast(&args[2])])
        .aux(fsp_aux(&[&args[2]])))
}

fn resolve_sec_to_time(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::duration(temporal_fsp(&args[0])))
        .casts(vec![seconds_cast(&args[0])])
        .aux(fsp_aux(&[&args[0]])))
}

fn resolve_last_day(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::date()).casts(vec![datetime_cast(&args[0])]))
}

/// Integer field of a date; a second argument is an integer mode
fn resolve_date_int(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let mut casts = vec![datetime_cast(&args[0])];
    if let Some(mode) = args.get(1) {
        casts.push(int_cast(mode));
    }
    Ok(Signature::new(int_type()).casts(casts))
}

fn resolve_date_name(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(plan.collation)).casts(vec![datetime_cast(&args[0])]))
}

fn resolve_time_int(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(int_type()).casts(vec![duration_cast(&args[0])]))
}

fn has_date_part(unit: IntervalUnit) -> bool {
    !matches!(
        unit,
        IntervalUnit::Microsecond
            | IntervalUnit::Second
            | IntervalUnit::Minute
            | IntervalUnit::Hour
            | IntervalUnit::SecondMicrosecond
            | IntervalUnit::MinuteMicrosecond
            | IntervalUnit::MinuteSecond
            | IntervalUnit::HourMicrosecond
            | IntervalUnit::HourSecond
            | IntervalUnit::HourMinute
    )
}

fn resolve_extract(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let unit = const_unit(&args[0], "")?;
    let value = &args[1];
    let cast = if value.eval_type() == EvalType::Duration {
        None
    } else if has_date_part(unit) {
        datetime_cast(value)
    } else {
        duration_cast(value)
    };
    Ok(Signature::new(int_type())
        .casts(vec![None, cast])
        .aux(Aux::Unit(unit)))
}

/// Result type of adding an interval to `date`
fn add_signature(date: &ArgType, amount: &ArgType, unit: IntervalUnit, plan: &PlanContext) -> Signature {
    let micro = if unit.has_micro_part() {
        MAX_FSP
    } else if unit == IntervalUnit::Second {
        temporal_fsp(amount)
    } else {
        0
    };
    let fsp = date.ty.fsp().max(micro);
    let ret = match date.ty.kind {
        FieldKind::Date if !unit.has_time_part() => FieldType::date(),
        FieldKind::Date | FieldKind::DateTime | FieldKind::Timestamp => FieldType::datetime(fsp),
        FieldKind::Duration => FieldType::duration(fsp),
        _ => string_type(plan.collation),
    };
    Signature::new(ret).aux(Aux::Unit(unit))
}

fn resolve_date_add(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let unit = const_unit(&args[2], "")?;
    Ok(add_signature(&args[0], &args[1], unit, plan))
}

/// `ADDDATE(d, days)` or `ADDDATE(d, n, unit)`
fn resolve_adddate(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let unit = match args.get(2) {
        Some(u) => const_unit(u, "")?,
        None => IntervalUnit::Day,
    };
    Ok(add_signature(&args[0], &args[1], unit, plan))
}

fn resolve_timestampadd(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let unit = const_unit(&args[0], "")?;
    if unit.is_compound() {
        return Err(Error::incorrect_arguments(""));
    }
    Ok(add_signature(&args[2], &args[1], unit, plan))
}

fn resolve_addtime(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let fsp = temporal_fsp(&args[0]).max(temporal_fsp(&args[1]));
    let ret = match args[0].ty.kind {
        FieldKind::Date | FieldKind::DateTime | FieldKind::Timestamp => FieldType::datetime(fsp),
        FieldKind::Duration => FieldType::duration(fsp),
        _ => string_type(plan.collation),
    };
    let delta = (!args[1].is_null() && args[1].eval_type() != EvalType::Duration)
        .then(|| FieldType::duration(temporal_fsp(&args[1])));
    Ok(Signature::new(ret)
        .casts(vec![None, delta])
        .aux(fsp_aux(&[&args[0], &args[1]])))
}

fn resolve_timediff(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let fsp = temporal_fsp(&args[0]).max(temporal_fsp(&args[1]));
    Ok(Signature::new(FieldType::duration(fsp)).aux(fsp_aux(&[&args[0], &args[1]])))
}

fn resolve_datediff(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(int_type()).casts(args.iter().map(datetime_cast).collect()))
}

fn resolve_timestampdiff(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let unit = const_unit(&args[0], "")?;
    if unit.is_compound() {
        return Err(Error::incorrect_arguments(""));
    }
    Ok(Signature::new(int_type())
        .casts(vec![None, datetime_cast(&args[1]), datetime_cast(&args[2])])
        .aux(Aux::Unit(unit)))
}

fn resolve_period(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(int_type()).casts(args.iter().map(int_cast).collect()))
}

fn resolve_date_format(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(plan.collation)).casts(vec![datetime_cast(&args[0]), None]))
}

fn resolve_time_format(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(plan.collation)).casts(vec![duration_cast(&args[0]), None]))
}

/// The shape of a constant format decides between DATE, TIME and DATETIME
fn resolve_str_to_date(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let ret = match args[1].const_text() {
        Some(fmt) => {
            let shape = format::shape(&fmt);
            let fsp = if shape.has_micro { MAX_FSP } else { 0 };
            match (shape.has_date, shape.has_time) {
                (true, false) => FieldType::date(),
                (false, true) => FieldType::duration(fsp),
                _ => FieldType::datetime(fsp),
            }
        }
        None => FieldType::datetime(MAX_FSP),
    };
    Ok(Signature::new(ret))
}

fn resolve_get_format(_args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(string_type(plan.collation)))
}

fn resolve_unix_timestamp(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    let Some(a) = args.first() else {
        return Ok(Signature::new(int_type()));
    };
    let fsp = temporal_fsp(a);
    let ret = if fsp == 0 {
        int_type()
    } else {
        decimal_type(12, fsp as i32)
    };
    Ok(Signature::new(ret).aux(fsp_aux(&[a])))
}

fn resolve_from_unixtime(args: &[ArgType], plan: &PlanContext) -> Result<Signature> {
    let ret = if args.len() == 2 {
        string_type(plan.collation)
    } else {
        FieldType::datetime(temporal_fsp(&args[0]))
    };
    Ok(Signature::new(ret).casts(vec![seconds_cast(&args[0])]))
}

fn resolve_convert_tz(args: &[ArgType], _plan: &PlanContext) -> Result<Signature> {
    Ok(Signature::new(FieldType::datetime(temporal_fsp(&args[0])))
        .casts(vec![datetime_cast(&args[0])])
        .aux(fsp_aux(&[&args[0]])))
}

// ============================================================================
// Value helpers
// ============================================================================

/// Precision to show a value with
fn shown_fsp(b: &Bound, micro: u64) -> u8 {
    match b.aux {
        Aux::Int(FSP_FROM_TEXT) if micro == 0 => 0,
        _ => b.ret.fsp(),
    }
}

/// Six fractional digits when there is a fraction, none otherwise
fn natural_fsp(micro: u64) -> u8 {
    if micro == 0 {
        0
    } else {
        MAX_FSP
    }
}

fn datetime_text(t: &Time) -> String {
    t.with_fsp(natural_fsp(t.micro as u64)).format_datetime()
}

fn zero_part(t: &Time) -> bool {
    t.month == 0 || t.day == 0
}

/// Date argument after resolution converted it
fn time_arg(d: &Datum) -> Time {
    d.as_time().copied().unwrap_or_default()
}

/// Time argument after resolution converted it
fn duration_arg(d: &Datum) -> Duration {
    d.as_duration().copied().unwrap_or(Duration::from_micros(0, 0))
}

fn overflow(call: &mut Call<'_>, type_name: &str) -> Result<Datum> {
    call.observe(Error::datetime_overflow(type_name))?;
    Ok(Datum::Null)
}

/// Apply the zero-date policy; false when the value must become NULL
fn zero_allowed(t: &Time, shown: &str, call: &mut Call<'_>) -> Result<bool> {
    let in_date = if t.is_zero_date() {
        false
    } else if t.has_zero_in_date() {
        true
    } else {
        return Ok(true);
    };
    Ok(call.observe(Error::zero_date("datetime", shown, in_date))? == Recovery::Keep)
}

/// Read any value as a date, with whether its source carried a time part
fn moment_of(d: &Datum, call: &mut Call<'_>) -> Result<Option<(Time, bool)>> {
    match d {
        Datum::Date(t) => return Ok(Some((*t, false))),
        Datum::DateTime(t) => return Ok(Some((*t, true))),
        _ => {}
    }
    let text = text_of(d);
    let opts = ParseOptions::from_mode(call.ctx.sql_mode(), MAX_FSP);
    let Some(parsed) = Time::parse(&text, opts) else {
        call.observe(Error::incorrect_datetime("datetime", text.to_string()))?;
        return Ok(None);
    };
    if parsed.truncated {
        call.observe(Error::truncated_wrong_value("datetime", text.to_string()))?;
    }
    if !zero_allowed(&parsed.time, &text, call)? {
        return Ok(None);
    }
    Ok(Some((parsed.time, parsed.has_time)))
}

fn span_of(text: &str, call: &mut Call<'_>) -> Result<Option<Duration>> {
    let opts = ParseOptions::from_mode(call.ctx.sql_mode(), MAX_FSP);
    let Some(parsed) = Duration::parse(text, opts) else {
        call.observe(Error::truncated_wrong_value("time", text))?;
        return Ok(None);
    };
    if parsed.truncated || parsed.clamped {
        call.observe(Error::truncated_wrong_value("time", text))?;
    }
    Ok(Some(parsed.duration))
}

/// Text with a date part, e.g. `2011-11-11 10:00:00`
fn looks_like_datetime(text: &str) -> bool {
    let s = text.trim_start();
    s.len() >= 8
        && s.bytes()
            .take(10)
            .filter(|&c| c == b'-' || c == b'/')
            .count()
            >= 2
}

/// A point in time or a time span, as `ADDTIME` and `TIMEDIFF` see their
/// arguments
enum Temporal {
    Moment(Time),
    Span(Duration),
}

fn temporal_of(d: &Datum, call: &mut Call<'_>) -> Result<Option<Temporal>> {
    match d {
        Datum::Date(t) | Datum::DateTime(t) => Ok(Some(Temporal::Moment(*t))),
        Datum::Duration(v) => Ok(Some(Temporal::Span(*v))),
        other => {
            let text = text_of(other);
            if looks_like_datetime(&text) {
                Ok(moment_of(other, call)?.map(|(t, _)| Temporal::Moment(t)))
            } else {
                Ok(span_of(&text, call)?.map(Temporal::Span))
            }
        }
    }
}

/// Clamp to the TIME range, warning when the value did not fit
fn clamp_duration(micros: i64, fsp: u8, call: &mut Call<'_>) -> Result<Duration> {
    let raw = Duration::from_micros(micros, fsp);
    let (d, clamped) = raw.clamp();
    if clamped {
        call.observe(Error::truncated_wrong_value("time", raw.to_string()))?;
    }
    Ok(d)
}

/// Interval of `amount` units
fn interval_of(amount: &Datum, unit: IntervalUnit) -> Option<Interval> {
    match amount {
        Datum::Int(v) => Some(Interval::from_int(*v, unit)),
        Datum::UInt(v) => Some(Interval::from_int(i64::try_from(*v).ok()?, unit)),
        Datum::Decimal(v) => Interval::from_decimal(*v, unit),
        Datum::Float(f) => Interval::from_real(*f, unit),
        other => Interval::from_text(&text_of(other), unit),
    }
}

/// Seconds as microseconds, saturating far outside the TIME range
fn seconds_micros(d: &Datum) -> i64 {
    let secs = decimal_of(d);
    decimal::round(secs, MAX_FSP as i64)
        .checked_mul(Decimal::from(MICROS_PER_SECOND))
        .and_then(|m| m.to_i64())
        .unwrap_or(if secs.is_sign_negative() { i64::MIN } else { i64::MAX })
}

// ============================================================================
// Clock
// ============================================================================

fn eval_now(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::DateTime(call.ctx.now_time(b.ret.fsp())))
}

fn eval_sysdate(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let offset = chrono::Duration::seconds(call.ctx.time_zone().offset_seconds() as i64);
    let now = chrono::Utc::now().naive_utc() + offset;
    Ok(Datum::DateTime(Time::from_naive(&now, b.ret.fsp())))
}

fn eval_curdate(_args: &[Datum], _b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Date(call.ctx.now_time(0).date()))
}

fn eval_curtime(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let fsp = b.ret.fsp();
    let t = call.ctx.now_time(fsp);
    Ok(Datum::Duration(Duration::from_micros(t.time_of_day_micros(), fsp)))
}

fn eval_utc_date(_args: &[Datum], _b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Date(Time::from_naive(&call.ctx.utc_now(), 0).date()))
}

fn eval_utc_time(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let fsp = b.ret.fsp();
    let t = Time::from_naive(&call.ctx.utc_now(), fsp);
    Ok(Datum::Duration(Duration::from_micros(t.time_of_day_micros(), fsp)))
}

fn eval_utc_timestamp(_args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::DateTime(Time::from_naive(&call.ctx.utc_now(), b.ret.fsp())))
}

// ============================================================================
// Construction
// ============================================================================

fn eval_identity(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(args[0].clone())
}

fn eval_time(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let d = duration_arg(&args[0]);
    Ok(Datum::Duration(d.with_fsp(shown_fsp(b, d.micro_part()))))
}

fn eval_timestamp(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let mut t = time_arg(&args[0]);
    if let Some(d) = args.get(1).and_then(Datum::as_duration) {
        if zero_part(&t) {
            return Ok(Datum::Null);
        }
        t = match Time::from_micros(t.to_micros() + d.micros(), b.ret.fsp()) {
            Some(r) => r,
            None => return overflow(call, "datetime"),
        };
    }
    Ok(Datum::DateTime(t.with_fsp(shown_fsp(b, t.micro as u64))))
}

fn eval_from_days(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(match calendar::from_days(int_of(&args[0])) {
        Some(t) => Datum::Date(t),
        None => Datum::Null,
    })
}

fn eval_makedate(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(match calendar::make_date(int_of(&args[0]), int_of(&args[1])) {
        Some(t) => Datum::Date(t),
        None => Datum::Null,
    })
}

fn eval_maketime(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let hour = int_of(&args[0]);
    let minute = int_of(&args[1]);
    let second = seconds_micros(&args[2]);
    if !(0..60).contains(&minute) || !(0..60 * MICROS_PER_SECOND).contains(&second) {
        return Ok(Datum::Null);
    }
    let magnitude = (hour.unsigned_abs() as i128 * 3600 + minute as i128 * 60) * MICROS_PER_SECOND as i128
        + second as i128;
    let magnitude = magnitude.min(i64::MAX as i128) as i64;
    let micros = if hour < 0 { -magnitude } else { magnitude };
    let d = clamp_duration(micros, b.ret.fsp(), call)?;
    Ok(Datum::Duration(d.with_fsp(shown_fsp(b, d.micro_part()))))
}

fn eval_sec_to_time(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let d = clamp_duration(seconds_micros(&args[0]), b.ret.fsp(), call)?;
    Ok(Datum::Duration(d.with_fsp(shown_fsp(b, d.micro_part()))))
}

fn eval_last_day(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let t = time_arg(&args[0]);
    if zero_part(&t) {
        return Ok(Datum::Null);
    }
    Ok(Datum::Date(calendar::last_day(&t)))
}

// ============================================================================
// Fields
// ============================================================================

fn eval_year(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(time_arg(&args[0]).year as i64))
}

fn eval_month(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(time_arg(&args[0]).month as i64))
}

fn eval_day(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(time_arg(&args[0]).day as i64))
}

fn eval_quarter(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int((time_arg(&args[0]).month as i64 + 2) / 3))
}

/// Run `f` on a date with valid month and day, NULL otherwise
fn with_date(d: &Datum, f: impl FnOnce(&Time) -> Datum) -> Result<Datum> {
    let t = time_arg(d);
    if zero_part(&t) {
        return Ok(Datum::Null);
    }
    Ok(f(&t))
}

fn eval_dayofyear(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    with_date(&args[0], |t| Datum::Int(calendar::day_of_year(t)))
}

fn eval_dayofweek(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    with_date(&args[0], |t| Datum::Int(((t.weekday() + 1) % 7 + 1) as i64))
}

fn eval_weekday(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    with_date(&args[0], |t| Datum::Int(t.weekday() as i64))
}

fn eval_dayname(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    with_date(&args[0], |t| b.text(format::DAY_NAMES[t.weekday() as usize]))
}

fn eval_monthname(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let t = time_arg(&args[0]);
    if t.month == 0 {
        return Ok(Datum::Null);
    }
    Ok(b.text(format::MONTH_NAMES[t.month as usize - 1]))
}

fn mode_arg(args: &[Datum]) -> u32 {
    args.get(1).map(|m| int_of(m) as u32).unwrap_or(0)
}

fn eval_week(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let mode = mode_arg(args);
    with_date(&args[0], |t| Datum::Int(calendar::week(t, mode) as i64))
}

fn eval_weekofyear(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    with_date(&args[0], |t| Datum::Int(calendar::week(t, 3) as i64))
}

fn eval_yearweek(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let mode = mode_arg(args);
    with_date(&args[0], |t| Datum::Int(calendar::year_week(t, mode)))
}

fn eval_to_days(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    with_date(&args[0], |t| Datum::Int(t.daynr()))
}

fn eval_to_seconds(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    with_date(&args[0], |t| {
        Datum::Int(t.daynr() * 86_400 + t.time_of_day_micros() / MICROS_PER_SECOND)
    })
}

fn eval_hour(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(duration_arg(&args[0]).hours() as i64))
}

fn eval_minute(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(duration_arg(&args[0]).minutes() as i64))
}

fn eval_second(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(duration_arg(&args[0]).seconds() as i64))
}

fn eval_microsecond(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(duration_arg(&args[0]).micro_part() as i64))
}

fn eval_time_to_sec(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    Ok(Datum::Int(duration_arg(&args[0]).total_seconds()))
}

/// Calendar fields read by `EXTRACT`
struct Parts {
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
    micro: i64,
}

fn extract(unit: IntervalUnit, p: &Parts, week: i64) -> i64 {
    let day_hour = p.day * 100 + p.hour;
    let hour_minute = p.hour * 100 + p.minute;
    let minute_second = p.minute * 100 + p.second;
    match unit {
        IntervalUnit::Year => p.year,
        IntervalUnit::Quarter => (p.month + 2) / 3,
        IntervalUnit::Month => p.month,
        IntervalUnit::Week => week,
        IntervalUnit::Day => p.day,
        IntervalUnit::Hour => p.hour,
        IntervalUnit::Minute => p.minute,
        IntervalUnit::Second => p.second,
        IntervalUnit::Microsecond => p.micro,
        IntervalUnit::YearMonth => p.year * 100 + p.month,
        IntervalUnit::DayHour => day_hour,
        IntervalUnit::DayMinute => day_hour * 100 + p.minute,
        IntervalUnit::DaySecond => (day_hour * 100 + p.minute) * 100 + p.second,
        IntervalUnit::DayMicrosecond => {
            ((day_hour * 100 + p.minute) * 100 + p.second) * 1_000_000 + p.micro
        }
        IntervalUnit::HourMinute => hour_minute,
        IntervalUnit::HourSecond => hour_minute * 100 + p.second,
        IntervalUnit::HourMicrosecond => (hour_minute * 100 + p.second) * 1_000_000 + p.micro,
        IntervalUnit::MinuteSecond => minute_second,
        IntervalUnit::MinuteMicrosecond => minute_second * 1_000_000 + p.micro,
        IntervalUnit::SecondMicrosecond => p.second * 1_000_000 + p.micro,
    }
}

fn eval_extract(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let unit = b.unit();
    if let Datum::Duration(d) = &args[1] {
        let hours = d.hours() as i64;
        let parts = Parts {
            year: 0,
            month: 0,
            day: hours / 24,
            hour: hours % 24,
            minute: d.minutes() as i64,
            second: d.seconds() as i64,
            micro: d.micro_part() as i64,
        };
        let v = extract(unit, &parts, 0);
        return Ok(Datum::Int(if d.is_neg() { -v } else { v }));
    }
    let t = time_arg(&args[1]);
    if unit == IntervalUnit::Week && zero_part(&t) {
        return Ok(Datum::Null);
    }
    let week = if unit == IntervalUnit::Week {
        calendar::week(&t, 0) as i64
    } else {
        0
    };
    let parts = Parts {
        year: t.year as i64,
        month: t.month as i64,
        day: t.day as i64,
        hour: t.hour as i64,
        minute: t.minute as i64,
        second: t.second as i64,
        micro: t.micro as i64,
    };
    Ok(Datum::Int(extract(unit, &parts, week)))
}

// ============================================================================
// Arithmetic
// ============================================================================

fn add_interval(date: &Datum, amount: &Datum, b: &Bound, negate: bool, call: &mut Call<'_>) -> Result<Datum> {
    let unit = b.unit();
    let Some(mut iv) = interval_of(amount, unit) else {
        return Ok(Datum::Null);
    };
    if negate {
        iv = iv.negated();
    }

    if let Datum::Duration(d) = date {
        return match add_to_duration(d, &iv, unit) {
            Some(r) => Ok(Datum::Duration(r.with_fsp(b.ret.fsp()))),
            None if unit.is_month_based() => Ok(Datum::Null),
            None => overflow(call, "time"),
        };
    }

    let Some((t, has_time)) = moment_of(date, call)? else {
        return Ok(Datum::Null);
    };
    if zero_part(&t) {
        call.observe(Error::incorrect_datetime("datetime", date.to_string()))?;
        return Ok(Datum::Null);
    }
    let Some(r) = add_to_time(&t, &iv, unit) else {
        return overflow(call, "datetime");
    };
    Ok(match b.ret.kind {
        FieldKind::Date => Datum::Date(r.date()),
        FieldKind::DateTime => Datum::DateTime(r.with_fsp(b.ret.fsp())),
        _ if has_time || unit.has_time_part() => b.text(datetime_text(&r)),
        _ => b.text(r.format_date()),
    })
}

fn eval_date_add(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    add_interval(&args[0], &args[1], b, false, call)
}

fn eval_date_sub(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    add_interval(&args[0], &args[1], b, true, call)
}

fn eval_timestampadd(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    add_interval(&args[2], &args[1], b, false, call)
}

fn add_time(args: &[Datum], b: &Bound, negate: bool, call: &mut Call<'_>) -> Result<Datum> {
    let delta = duration_arg(&args[1]).micros();
    let delta = if negate { -delta } else { delta };
    let as_text = b.ret.eval_type() == EvalType::String;
    match temporal_of(&args[0], call)? {
        None => Ok(Datum::Null),
        Some(Temporal::Moment(t)) => {
            if zero_part(&t) {
                return Ok(Datum::Null);
            }
            let Some(r) = Time::from_micros(t.to_micros() + delta, MAX_FSP) else {
                return overflow(call, "datetime");
            };
            if as_text {
                return Ok(b.text(datetime_text(&r)));
            }
            Ok(Datum::DateTime(r.with_fsp(shown_fsp(b, r.micro as u64))))
        }
        Some(Temporal::Span(d)) => {
            let r = clamp_duration(d.micros().saturating_add(delta), MAX_FSP, call)?;
            if as_text {
                return Ok(b.text(r.with_fsp(natural_fsp(r.micro_part())).to_string()));
            }
            Ok(Datum::Duration(r.with_fsp(shown_fsp(b, r.micro_part()))))
        }
    }
}

fn eval_addtime(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    add_time(args, b, false, call)
}

fn eval_subtime(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    add_time(args, b, true, call)
}

fn eval_timediff(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let lhs = temporal_of(&args[0], call)?;
    let rhs = temporal_of(&args[1], call)?;
    let micros = match (lhs, rhs) {
        (Some(Temporal::Moment(x)), Some(Temporal::Moment(y))) => {
            if zero_part(&x) || zero_part(&y) {
                return Ok(Datum::Null);
            }
            x.to_micros() - y.to_micros()
        }
        (Some(Temporal::Span(x)), Some(Temporal::Span(y))) => x.micros() - y.micros(),
        _ => return Ok(Datum::Null),
    };
    let fsp = shown_fsp(b, micros.unsigned_abs() % 1_000_000);
    Ok(Datum::Duration(clamp_duration(micros, fsp, call)?))
}

fn eval_datediff(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let (x, y) = (time_arg(&args[0]), time_arg(&args[1]));
    if zero_part(&x) || zero_part(&y) {
        return Ok(Datum::Null);
    }
    Ok(Datum::Int(x.daynr() - y.daynr()))
}

/// Whole months from `from` to `to`, counting a month only once the day
/// and time of day are reached
fn month_diff(from: &Time, to: &Time) -> i64 {
    let (lo, hi, sign) = if to.to_micros() >= from.to_micros() {
        (from, to, 1)
    } else {
        (to, from, -1)
    };
    let mut months = (hi.year as i64 - lo.year as i64) * 12 + hi.month as i64 - lo.month as i64;
    if (hi.day, hi.time_of_day_micros()) < (lo.day, lo.time_of_day_micros()) {
        months -= 1;
    }
    sign * months
}

fn eval_timestampdiff(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let (from, to) = (time_arg(&args[1]), time_arg(&args[2]));
    if zero_part(&from) || zero_part(&to) {
        return Ok(Datum::Null);
    }
    let unit = b.unit();
    if unit.is_month_based() {
        let months = month_diff(&from, &to);
        return Ok(Datum::Int(match unit {
            IntervalUnit::Year => months / 12,
            IntervalUnit::Quarter => months / 3,
            _ => months,
        }));
    }
    let per = match unit {
        IntervalUnit::Microsecond => 1,
        IntervalUnit::Second => MICROS_PER_SECOND,
        IntervalUnit::Minute => 60 * MICROS_PER_SECOND,
        IntervalUnit::Hour => 3_600 * MICROS_PER_SECOND,
        IntervalUnit::Week => 7 * MICROS_PER_DAY,
        _ => MICROS_PER_DAY,
    };
    Ok(Datum::Int((to.to_micros() - from.to_micros()) / per))
}

fn eval_period_add(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let (period, months) = (int_of(&args[0]), int_of(&args[1]));
    if !calendar::is_valid_period(period) {
        return Err(Error::incorrect_arguments("period_add"));
    }
    let total = calendar::period_to_months(period)
        .checked_add(months)
        .ok_or_else(|| Error::incorrect_arguments("period_add"))?;
    Ok(Datum::Int(calendar::months_to_period(total)))
}

fn eval_period_diff(args: &[Datum], _b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let (a, b) = (int_of(&args[0]), int_of(&args[1]));
    if !calendar::is_valid_period(a) || !calendar::is_valid_period(b) {
        return Err(Error::incorrect_arguments("period_diff"));
    }
    Ok(Datum::Int(
        calendar::period_to_months(a) - calendar::period_to_months(b),
    ))
}

// ============================================================================
// Formatting
// ============================================================================

fn eval_date_format(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let t = time_arg(&args[0]);
    Ok(opt_text(b, format::format_time(&t, &text_of(&args[1]))))
}

fn eval_time_format(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let d = duration_arg(&args[0]);
    Ok(opt_text(b, format::format_duration(&d, &text_of(&args[1]))))
}

fn eval_str_to_date(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let text = text_of(&args[0]);
    let fmt = text_of(&args[1]);
    let allow_invalid = call.ctx.sql_mode().contains(SqlMode::ALLOW_INVALID_DATES);
    let Some(parsed) = format::parse_with_format(&text, &fmt, allow_invalid) else {
        call.observe(Error::WrongValueForType {
            type_name: "datetime".to_string(),
            value: text.to_string(),
            function: "str_to_date".to_string(),
        })?;
        return Ok(Datum::Null);
    };
    if parsed.truncated {
        call.observe(Error::truncated_wrong_value("datetime", text.to_string()))?;
    }
    let t = parsed.time;
    if b.ret.kind == FieldKind::Duration {
        return Ok(Datum::Duration(Duration::from_micros(t.time_of_day_micros(), b.ret.fsp())));
    }
    if !zero_allowed(&t, &text, call)? {
        return Ok(Datum::Null);
    }
    Ok(match b.ret.kind {
        FieldKind::Date => Datum::Date(t.date()),
        _ => Datum::DateTime(t.with_fsp(b.ret.fsp())),
    })
}

fn eval_get_format(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let f = format::get_format(&text_of(&args[0]), &text_of(&args[1]));
    Ok(opt_text(b, f.map(str::to_string)))
}

// ============================================================================
// Unix time and zones
// ============================================================================

/// Microseconds since the epoch of a session-local datetime; `None` outside
/// the supported range
fn unix_micros(t: &Time, tz: &TimeZone) -> Option<i64> {
    if zero_part(t) {
        return None;
    }
    let utc = t.to_micros()
        - UNIX_EPOCH_DAYNR * MICROS_PER_DAY
        - tz.offset_seconds() as i64 * MICROS_PER_SECOND;
    (0..(MAX_UNIX_SECONDS + 1) * MICROS_PER_SECOND)
        .contains(&utc)
        .then_some(utc)
}

fn eval_unix_timestamp(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let Some(arg) = args.first() else {
        let now = call.ctx.now_time(0);
        let micros = unix_micros(&now, call.ctx.time_zone()).unwrap_or(0);
        return Ok(Datum::Int(micros / MICROS_PER_SECOND));
    };
    let Some((t, _)) = moment_of(arg, call)? else {
        return Ok(Datum::Null);
    };
    let micros = unix_micros(&t, call.ctx.time_zone()).unwrap_or(0);
    if b.ret.eval_type() == EvalType::Int {
        return Ok(Datum::Int(micros / MICROS_PER_SECOND));
    }
    let secs = Decimal::new(micros, MAX_FSP as u32);
    Ok(Datum::Decimal(match b.aux {
        Aux::Int(FSP_FROM_TEXT) => secs.normalize(),
        _ => decimal::with_scale(secs, b.ret.decimal.max(0) as u32),
    }))
}

fn eval_from_unixtime(args: &[Datum], b: &Bound, call: &mut Call<'_>) -> Result<Datum> {
    let secs = decimal_of(&args[0]);
    if secs.is_sign_negative() && !secs.is_zero() {
        return Ok(Datum::Null);
    }
    let micros = seconds_micros(&args[0]);
    if micros >= (MAX_UNIX_SECONDS + 1) * MICROS_PER_SECOND {
        return Ok(Datum::Null);
    }
    let local = micros
        + UNIX_EPOCH_DAYNR * MICROS_PER_DAY
        + call.ctx.time_zone().offset_seconds() as i64 * MICROS_PER_SECOND;
    let Some(t) = Time::from_micros(local, MAX_FSP) else {
        return Ok(Datum::Null);
    };
    if let Some(fmt) = args.get(1) {
        return Ok(opt_text(b, format::format_time(&t, &text_of(fmt))));
    }
    let truncate = call.ctx.sql_mode().contains(SqlMode::TIME_TRUNCATE_FRACTIONAL);
    Ok(match t.round_frac(b.ret.fsp(), truncate) {
        Some(r) => Datum::DateTime(r),
        None => Datum::Null,
    })
}

fn eval_convert_tz(args: &[Datum], b: &Bound, _call: &mut Call<'_>) -> Result<Datum> {
    let t = time_arg(&args[0]);
    if zero_part(&t) {
        return Ok(Datum::Null);
    }
    let (Ok(from), Ok(to)) = (
        TimeZone::parse(&text_of(&args[1])),
        TimeZone::parse(&text_of(&args[2])),
    ) else {
        return Ok(Datum::Null);
    };
    let delta = (to.offset_seconds() - from.offset_seconds()) as i64 * MICROS_PER_SECOND;
    Ok(match Time::from_micros(t.to_micros() + delta, b.ret.fsp()) {
        Some(r) => Datum::DateTime(r.with_fsp(shown_fsp(b, r.micro as u64))),
        None => Datum::Null,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::super::test_util::{dec, eval, eval_with, f, i, s};
    use crate::core::{Datum, SqlMode, Time};
    use crate::diagnostics::Diagnostics;
    use crate::eval::{EvalContext, TimeZone};

    fn date(y: u32, m: u32, d: u32) -> Datum {
        Datum::Date(Time::from_ymd(y, m, d))
    }

    fn fixed_clock() -> EvalContext {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_micro_opt(13, 45, 30, 250_000)
            .unwrap();
        EvalContext::builder().now(now).build()
    }

    fn eval_at(ctx: &EvalContext, name: &str, args: &[Datum]) -> String {
        let mut diag = Diagnostics::default();
        match eval_with(name, args, ctx, &mut diag) {
            Ok(d) => d.to_string(),
            Err(e) => format!("ERROR {}", e.code()),
        }
    }

    #[test]
    fn test_clock_functions() {
        let ctx = fixed_clock();
        assert_eq!(eval_at(&ctx, "NOW", &[]), "2024-03-15 13:45:30");
        assert_eq!(eval_at(&ctx, "NOW", &[i(3)]), "2024-03-15 13:45:30.250");
        assert_eq!(eval_at(&ctx, "CURDATE", &[]), "2024-03-15");
        assert_eq!(eval_at(&ctx, "CURTIME", &[]), "13:45:30");
        assert_eq!(eval_at(&ctx, "UTC_TIMESTAMP", &[]), "2024-03-15 13:45:30");
        assert_eq!(eval_at(&ctx, "NOW", &[i(7)]), "ERROR 1426");
    }

    #[test]
    fn test_clock_follows_time_zone() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        let ctx = EvalContext::builder()
            .time_zone(TimeZone::parse("+05:00").unwrap())
            .now(now)
            .build();
        assert_eq!(eval_at(&ctx, "UTC_DATE", &[]), "2024-03-14");
        assert_eq!(eval_at(&ctx, "UTC_TIME", &[]), "20:00:00");
    }

    #[test]
    fn test_date_add_compound_units() {
        assert_eq!(
            eval("DATE_ADD", &[s("2011-11-11 10:10:10"), s("11-1"), s("YEAR_MONTH")]),
            "2022-12-11 10:10:10"
        );
        assert_eq!(
            eval("DATE_ADD", &[s("2011-01-01 00:00:00"), s("1 1:1:1"), s("DAY_SECOND")]),
            "2011-01-02 01:01:01"
        );
        assert_eq!(
            eval("DATE_ADD", &[s("2011-01-01 00:00:00"), dec("1.5"), s("HOUR_MINUTE")]),
            "2011-01-01 01:05:00"
        );
    }

    #[test]
    fn test_date_add_fractional_amounts() {
        let t = s("2011-01-01 00:00:00");
        assert_eq!(eval("DATE_ADD", &[t.clone(), dec("2.2"), s("HOUR")]), "2011-01-01 02:00:00");
        assert_eq!(
            eval("DATE_ADD", &[t.clone(), dec("1.5"), s("SECOND")]),
            "2011-01-01 00:00:01.500000"
        );
        assert_eq!(
            eval("DATE_ADD", &[t, dec("1.5"), s("SECOND_MICROSECOND")]),
            "2011-01-01 00:00:01.500000"
        );
    }

    #[test]
    fn test_date_add_month_saturates() {
        assert_eq!(eval("DATE_ADD", &[date(2011, 1, 31), i(1), s("MONTH")]), "2011-02-28");
        assert_eq!(eval("DATE_ADD", &[date(2012, 1, 31), i(1), s("MONTH")]), "2012-02-29");
        assert_eq!(eval("DATE_SUB", &[s("2012-03-31"), i(1), s("MONTH")]), "2012-02-29");
    }

    #[test]
    fn test_date_add_result_shape() {
        // DATE with a time unit becomes DATETIME
        assert_eq!(eval("DATE_ADD", &[date(2011, 1, 1), i(1), s("HOUR")]), "2011-01-01 01:00:00");
        assert_eq!(eval("ADDDATE", &[s("2011-01-01"), i(31)]), "2011-02-01");
        assert_eq!(eval("SUBDATE", &[s("2011-01-01 10:00:00"), i(1)]), "2010-12-31 10:00:00");
        assert_eq!(eval("TIMESTAMPADD", &[s("WEEK"), i(1), s("2003-01-02")]), "2003-01-09");
    }

    #[test]
    fn test_date_add_overflow_and_errors() {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let r = eval_with("DATE_ADD", &[s("9999-12-31"), i(1), s("DAY")], &ctx, &mut diag).unwrap();
        assert!(r.is_null());
        assert_eq!(diag.warnings()[0].code, 1441);

        assert_eq!(eval("DATE_ADD", &[s("2011-01-01"), i(1), s("FORTNIGHT")]), "ERROR 1210");
        assert_eq!(eval("DATE_ADD", &[s("not a date"), i(1), s("DAY")]), "NULL");
        assert_eq!(eval("DATE_ADD", &[Datum::Null, i(1), s("DAY")]), "NULL");
    }

    #[test]
    fn test_date_add_on_time() {
        let t = Datum::Duration(crate::core::Duration::from_micros(3_600_000_000, 0));
        assert_eq!(eval("DATE_ADD", &[t.clone(), i(30), s("MINUTE")]), "01:30:00");
        assert_eq!(eval("DATE_ADD", &[t, i(1), s("MONTH")]), "NULL");
    }

    #[test]
    fn test_date_zero_policy() {
        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let r = eval_with("DATE", &[s("0000-00-00 12:12:09")], &ctx, &mut diag).unwrap();
        assert_eq!(r.to_string(), "0000-00-00");
        assert!(diag.warnings().is_empty());

        let strict = EvalContext::builder().sql_mode(SqlMode::NO_ZERO_DATE).build();
        let mut diag = Diagnostics::default();
        assert!(eval_with("DATE", &[s("0000-00-00 12:12:09")], &strict, &mut diag).is_err());

        let ignore = EvalContext::builder()
            .sql_mode(SqlMode::NO_ZERO_DATE)
            .ignore_errors(true)
            .build();
        let mut diag = Diagnostics::default();
        let r = eval_with("DATE", &[s("0000-00-00 12:12:09")], &ignore, &mut diag).unwrap();
        assert!(r.is_null());
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn test_time_and_timestamp() {
        assert_eq!(eval("TIME", &[s("2003-12-31 01:02:03")]), "01:02:03");
        assert_eq!(eval("TIME", &[s("2003-12-31 01:02:03.000123")]), "01:02:03.000123");
        assert_eq!(eval("TIMESTAMP", &[s("2003-12-31")]), "2003-12-31 00:00:00");
        assert_eq!(
            eval("TIMESTAMP", &[s("2003-12-31 12:00:00"), s("12:00:00")]),
            "2004-01-01 00:00:00"
        );
    }

    #[test]
    fn test_field_functions() {
        let t = s("2008-02-03 22:23:00");
        assert_eq!(eval("YEAR", &[t.clone()]), "2008");
        assert_eq!(eval("MONTH", &[t.clone()]), "2");
        assert_eq!(eval("DAYOFMONTH", &[t.clone()]), "3");
        assert_eq!(eval("QUARTER", &[s("2008-04-01")]), "2");
        assert_eq!(eval("DAYOFYEAR", &[s("2007-02-03")]), "34");
        assert_eq!(eval("DAYOFWEEK", &[s("2007-02-03")]), "7");
        assert_eq!(eval("WEEKDAY", &[t.clone()]), "6");
        assert_eq!(eval("DAYNAME", &[s("2007-02-03")]), "Saturday");
        assert_eq!(eval("MONTHNAME", &[t]), "February");
        assert_eq!(eval("YEAR", &[s("0000-00-00")]), "0");
        assert_eq!(eval("DAYNAME", &[s("0000-00-00")]), "NULL");
    }

    #[test]
    fn test_week_numbers() {
        assert_eq!(eval("WEEK", &[s("2008-02-20")]), "7");
        assert_eq!(eval("WEEK", &[s("2008-02-20"), i(1)]), "8");
        assert_eq!(eval("WEEK", &[s("2008-12-31"), i(1)]), "53");
        assert_eq!(eval("WEEKOFYEAR", &[s("2008-02-20")]), "8");
        assert_eq!(eval("YEARWEEK", &[s("1987-01-01")]), "198652");
    }

    #[test]
    fn test_time_fields() {
        assert_eq!(eval("HOUR", &[s("272:59:59")]), "272");
        assert_eq!(eval("HOUR", &[s("2011-11-11 10:05:03")]), "10");
        assert_eq!(eval("MINUTE", &[s("2008-02-03 10:05:03")]), "5");
        assert_eq!(eval("SECOND", &[s("10:05:03")]), "3");
        assert_eq!(eval("MICROSECOND", &[s("12:00:00.123456")]), "123456");
        assert_eq!(eval("TIME_TO_SEC", &[s("22:23:00")]), "80580");
        assert_eq!(eval("TIME_TO_SEC", &[s("-00:39:38")]), "-2378");
    }

    #[test]
    fn test_extract() {
        let t = s("2019-07-02 01:02:03");
        assert_eq!(eval("EXTRACT", &[s("YEAR"), t.clone()]), "2019");
        assert_eq!(eval("EXTRACT", &[s("YEAR_MONTH"), t.clone()]), "201907");
        assert_eq!(eval("EXTRACT", &[s("DAY_MINUTE"), t]), "20102");
        assert_eq!(
            eval("EXTRACT", &[s("MICROSECOND"), s("2003-01-02 10:30:00.000123")]),
            "123"
        );
        assert_eq!(eval("EXTRACT", &[s("HOUR"), s("10:30:00")]), "10");
    }

    #[test]
    fn test_day_numbers() {
        assert_eq!(eval("TO_DAYS", &[s("2007-10-07")]), "733321");
        assert_eq!(eval("TO_DAYS", &[i(950501)]), "728779");
        assert_eq!(eval("FROM_DAYS", &[i(730669)]), "2000-07-03");
        assert_eq!(eval("FROM_DAYS", &[i(100)]), "0000-00-00");
        assert_eq!(eval("TO_SECONDS", &[s("2009-11-29")]), "63426672000");
        assert_eq!(eval("LAST_DAY", &[s("2004-02-05")]), "2004-02-29");
        assert_eq!(eval("LAST_DAY", &[s("2003-03-32")]), "NULL");
        assert_eq!(eval("MAKEDATE", &[i(2011), i(32)]), "2011-02-01");
        assert_eq!(eval("MAKEDATE", &[i(2011), i(0)]), "NULL");
    }

    #[test]
    fn test_make_and_convert_times() {
        assert_eq!(eval("MAKETIME", &[i(12), i(15), i(30)]), "12:15:30");
        assert_eq!(eval("MAKETIME", &[i(12), i(60), i(30)]), "NULL");
        assert_eq!(eval("MAKETIME", &[i(-1), i(0), dec("1.5")]), "-01:00:01.5");
        assert_eq!(eval("SEC_TO_TIME", &[i(2378)]), "00:39:38");
        assert_eq!(eval("SEC_TO_TIME", &[i(-2378)]), "-00:39:38");

        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let r = eval_with("SEC_TO_TIME", &[i(4_000_000)], &ctx, &mut diag).unwrap();
        assert_eq!(r.to_string(), "838:59:59");
        assert_eq!(diag.warnings()[0].code, 1292);
    }

    #[test]
    fn test_addtime_and_timediff() {
        assert_eq!(
            eval("ADDTIME", &[s("2007-12-31 23:59:59.999999"), s("1 1:1:1.000002")]),
            "2008-01-02 01:01:01.000001"
        );
        assert_eq!(
            eval("ADDTIME", &[s("01:00:00.999999"), s("02:00:00.999998")]),
            "03:00:01.999997"
        );
        assert_eq!(eval("SUBTIME", &[s("01:00:00"), s("02:00:00")]), "-01:00:00");
        assert_eq!(
            eval("TIMEDIFF", &[s("2000-01-01 00:00:00"), s("2000-01-01 00:00:00.000001")]),
            "-00:00:00.000001"
        );
        assert_eq!(
            eval("TIMEDIFF", &[s("2008-12-31 23:59:59.000001"), s("2008-12-30 01:01:01.000002")]),
            "46:58:57.999999"
        );
        assert_eq!(eval("TIMEDIFF", &[s("10:00:00"), s("2000-01-01 00:00:00")]), "NULL");
    }

    #[test]
    fn test_date_differences() {
        assert_eq!(eval("DATEDIFF", &[s("2007-12-31 23:59:59"), s("2007-12-30")]), "1");
        assert_eq!(eval("DATEDIFF", &[s("2010-11-30 23:59:59"), s("2010-12-31")]), "-31");
        assert_eq!(
            eval("TIMESTAMPDIFF", &[s("MONTH"), s("2003-02-01"), s("2003-05-01")]),
            "3"
        );
        assert_eq!(
            eval("TIMESTAMPDIFF", &[s("YEAR"), s("2002-05-01"), s("2001-01-01")]),
            "-1"
        );
        assert_eq!(
            eval("TIMESTAMPDIFF", &[s("MINUTE"), s("2003-02-01"), s("2003-05-01 12:05:55")]),
            "128885"
        );
        assert_eq!(
            eval("TIMESTAMPDIFF", &[s("MONTH"), s("2003-01-31"), s("2003-02-28")]),
            "0"
        );
    }

    #[test]
    fn test_periods() {
        assert_eq!(eval("PERIOD_ADD", &[i(200801), i(2)]), "200803");
        assert_eq!(eval("PERIOD_ADD", &[i(9912), i(1)]), "200001");
        assert_eq!(eval("PERIOD_DIFF", &[i(200802), i(200703)]), "11");
        assert_eq!(eval("PERIOD_ADD", &[i(200813), i(1)]), "ERROR 1210");
    }

    #[test]
    fn test_formatting() {
        assert_eq!(
            eval("DATE_FORMAT", &[s("2009-10-04 22:23:00"), s("%W %M %Y")]),
            "Sunday October 2009"
        );
        assert_eq!(
            eval("TIME_FORMAT", &[s("100:00:00"), s("%H %k %h %I %l")]),
            "100 100 04 04 4"
        );
        assert_eq!(eval("GET_FORMAT", &[s("DATE"), s("EUR")]), "%d.%m.%Y");
        assert_eq!(eval("GET_FORMAT", &[s("DATE"), s("MARS")]), "NULL");
    }

    #[test]
    fn test_str_to_date() {
        assert_eq!(eval("STR_TO_DATE", &[s("01,5,2013"), s("%d,%m,%Y")]), "2013-05-01");
        assert_eq!(eval("STR_TO_DATE", &[s("a09:30:17"), s("a%h:%i:%s")]), "09:30:17");
        assert_eq!(
            eval("STR_TO_DATE", &[s("2013-05-01 10:11:12"), s("%Y-%m-%d %H:%i:%s")]),
            "2013-05-01 10:11:12"
        );

        let ctx = EvalContext::new();
        let mut diag = Diagnostics::default();
        let r = eval_with("STR_TO_DATE", &[s("nope"), s("%Y")], &ctx, &mut diag).unwrap();
        assert!(r.is_null());
        assert_eq!(diag.warnings()[0].code, 1411);
    }

    #[test]
    fn test_unix_time() {
        assert_eq!(eval("UNIX_TIMESTAMP", &[s("2015-11-13 10:20:19")]), "1447410019");
        assert_eq!(eval("UNIX_TIMESTAMP", &[s("2015-11-13 10:20:19.012")]), "1447410019.012");
        assert_eq!(eval("UNIX_TIMESTAMP", &[s("1969-12-31 23:59:59")]), "0");
        assert_eq!(eval("FROM_UNIXTIME", &[i(1447430881)]), "2015-11-13 16:08:01");
        assert_eq!(eval("FROM_UNIXTIME", &[dec("1447430881.5")]), "2015-11-13 16:08:01.5");
        assert_eq!(eval("FROM_UNIXTIME", &[i(1447430881), s("%Y %D %M")]), "2015 13th November");
        assert_eq!(eval("FROM_UNIXTIME", &[i(-1)]), "NULL");
        assert_eq!(eval("FROM_UNIXTIME", &[f(1.0)]), "1970-01-01 00:00:01.000000");

        let ctx = EvalContext::builder()
            .time_zone(TimeZone::parse("+01:00").unwrap())
            .build();
        assert_eq!(eval_at(&ctx, "FROM_UNIXTIME", &[i(0)]), "1970-01-01 01:00:00");
        assert_eq!(eval_at(&ctx, "UNIX_TIMESTAMP", &[s("1970-01-01 01:00:00")]), "0");
    }

    #[test]
    fn test_convert_tz() {
        assert_eq!(
            eval("CONVERT_TZ", &[s("2004-01-01 12:00:00"), s("+00:00"), s("+10:00")]),
            "2004-01-01 22:00:00"
        );
        assert_eq!(
            eval("CONVERT_TZ", &[s("2004-01-01 12:00:00"), s("UTC"), s("-05:30")]),
            "2004-01-01 06:30:00"
        );
        assert_eq!(
            eval("CONVERT_TZ", &[s("2004-01-01 12:00:00"), s("Mars/Base"), s("UTC")]),
            "NULL"
        );
    }
}
