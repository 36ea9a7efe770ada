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

//! Evaluation Context
//!
//! The per-statement, read-only state every evaluation call receives:
//! SQL mode, session time zone, the statement timestamp, the connection
//! collation, and the IGNORE flag. Nothing here is read from globals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{FixedOffset, Local, NaiveDateTime, Offset, Utc};

use crate::collation::{Collation, UTF8MB4_0900_AI_CI};
use crate::config::EvalConfig;
use crate::core::{Error, Result, SqlMode, Time};

/// Session time zone with a fixed UTC offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZone {
    name: String,
    offset: FixedOffset,
}

impl TimeZone {
    /// UTC
    pub fn utc() -> Self {
        Self {
            name: "+00:00".to_string(),
            offset: Utc.fix(),
        }
    }

    /// Parse `SYSTEM`, `UTC`, or an offset in `[+-]HH:MM` between -13:59 and +14:00
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("SYSTEM") {
            let offset = Local::now().offset().fix();
            return Ok(Self {
                name: "SYSTEM".to_string(),
                offset,
            });
        }
        if trimmed.eq_ignore_ascii_case("UTC") || trimmed.eq_ignore_ascii_case("GMT") {
            return Ok(Self {
                name: trimmed.to_ascii_uppercase(),
                offset: Self::utc().offset,
            });
        }
        let seconds = parse_offset(trimmed).ok_or_else(|| Error::UnknownTimeZone(name.to_string()))?;
        let offset =
            FixedOffset::east_opt(seconds).ok_or_else(|| Error::UnknownTimeZone(name.to_string()))?;
        Ok(Self {
            name: trimmed.to_string(),
            offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset from UTC in seconds
    pub fn offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }
}

/// Parse `+HH:MM` into seconds east of UTC
pub fn parse_offset(s: &str) -> Option<i32> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (h, m) = rest.split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let hours: i32 = h.parse().ok()?;
    let minutes: i32 = m.parse().ok()?;
    if minutes > 59 {
        return None;
    }
    let total = sign * (hours * 3600 + minutes * 60);
    if !(-(13 * 3600 + 59 * 60)..=14 * 3600).contains(&total) {
        return None;
    }
    Some(total)
}

/// Identity of the connected session for information functions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// `user@host` as sent by the client
    pub user: String,
    /// Authenticated account
    pub current_user: String,
    /// Default database, if any
    pub database: Option<String>,
    pub connection_id: u64,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            user: "root@localhost".to_string(),
            current_user: "root@localhost".to_string(),
            database: None,
            connection_id: 1,
        }
    }
}

/// Handle for cancelling a statement from another thread
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    /// Cancel the statement
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if the statement has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Read-only context for one statement
#[derive(Debug, Clone)]
pub struct EvalContext {
    sql_mode: SqlMode,
    time_zone: TimeZone,
    /// Statement start, in the session time zone
    now: NaiveDateTime,
    collation: &'static Collation,
    ignore_errors: bool,
    div_precision_increment: u32,
    group_concat_max_len: usize,
    session: Arc<SessionInfo>,
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    /// Context with an empty sql_mode, UTC, and the current time
    pub fn new() -> Self {
        Self {
            sql_mode: SqlMode::empty(),
            time_zone: TimeZone::utc(),
            now: Utc::now().naive_utc(),
            collation: &UTF8MB4_0900_AI_CI,
            ignore_errors: false,
            div_precision_increment: 4,
            group_concat_max_len: 1024,
            session: Arc::new(SessionInfo::default()),
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Build a context from server configuration
    pub fn from_config(config: &EvalConfig) -> Result<Self> {
        let builder = EvalContextBuilder::new()
            .sql_mode(config.parsed_sql_mode()?)
            .time_zone(TimeZone::parse(&config.time_zone)?)
            .collation(config.collation)
            .div_precision_increment(config.div_precision_increment)
            .group_concat_max_len(config.group_concat_max_len);
        Ok(builder.build())
    }

    pub fn builder() -> EvalContextBuilder {
        EvalContextBuilder::new()
    }

    #[inline]
    pub fn sql_mode(&self) -> SqlMode {
        self.sql_mode
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    /// Statement timestamp in the session time zone
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Statement timestamp as a DATETIME with `fsp` digits
    pub fn now_time(&self, fsp: u8) -> Time {
        Time::from_naive(&self.now, fsp)
    }

    /// Statement timestamp in UTC
    pub fn utc_now(&self) -> NaiveDateTime {
        self.now - chrono::Duration::seconds(self.time_zone.offset_seconds() as i64)
    }

    /// Connection collation
    #[inline]
    pub fn collation(&self) -> &'static Collation {
        self.collation
    }

    /// True inside an IGNORE statement
    #[inline]
    pub fn ignore_errors(&self) -> bool {
        self.ignore_errors
    }

    pub fn div_precision_increment(&self) -> u32 {
        self.div_precision_increment
    }

    pub fn group_concat_max_len(&self) -> usize {
        self.group_concat_max_len
    }

    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// Copy of this context for an IGNORE statement
    pub fn with_ignore_errors(&self, ignore: bool) -> Self {
        Self {
            ignore_errors: ignore,
            ..self.clone()
        }
    }

    /// Copy of this context with another sql_mode
    pub fn with_sql_mode(&self, sql_mode: SqlMode) -> Self {
        Self {
            sql_mode,
            ..self.clone()
        }
    }

    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            cancelled: self.cancelled.clone(),
        }
    }

    /// Check for cancellation or an expired deadline
    pub fn check_interrupted(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(Error::QueryInterrupted);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::QueryTimeout);
            }
        }
        Ok(())
    }
}

/// Builder for EvalContext
pub struct EvalContextBuilder {
    ctx: EvalContext,
}

impl EvalContextBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            ctx: EvalContext::new(),
        }
    }

    pub fn sql_mode(mut self, sql_mode: SqlMode) -> Self {
        self.ctx.sql_mode = sql_mode;
        self
    }

    /// Set the time zone; `now` is shifted into it unless set explicitly afterwards
    pub fn time_zone(mut self, tz: TimeZone) -> Self {
        let utc = self.ctx.utc_now();
        self.ctx.now = utc + chrono::Duration::seconds(tz.offset_seconds() as i64);
        self.ctx.time_zone = tz;
        self
    }

    /// Fix the statement timestamp (session time zone)
    pub fn now(mut self, now: NaiveDateTime) -> Self {
        self.ctx.now = now;
        self
    }

    pub fn collation(mut self, collation: &'static Collation) -> Self {
        self.ctx.collation = collation;
        self
    }

    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ctx.ignore_errors = ignore;
        self
    }

    pub fn div_precision_increment(mut self, digits: u32) -> Self {
        self.ctx.div_precision_increment = digits.min(30);
        self
    }

    pub fn group_concat_max_len(mut self, bytes: usize) -> Self {
        self.ctx.group_concat_max_len = bytes;
        self
    }

    pub fn session(mut self, session: SessionInfo) -> Self {
        self.ctx.session = Arc::new(session);
        self
    }

    /// Abort evaluation at the first batch boundary after `deadline`
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.ctx.deadline = Some(deadline);
        self
    }

    /// Build the context
    pub fn build(self) -> EvalContext {
        self.ctx
    }
}

impl Default for EvalContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(TimeZone::parse("+08:00").unwrap().offset_seconds(), 8 * 3600);
        assert_eq!(TimeZone::parse("-05:30").unwrap().offset_seconds(), -(5 * 3600 + 1800));
        assert_eq!(TimeZone::parse("UTC").unwrap().offset_seconds(), 0);
        assert_eq!(TimeZone::parse("+15:00").unwrap_err().code(), 1298);
        assert!(TimeZone::parse("Mars/Base").is_err());
    }

    #[test]
    fn test_builder() {
        let now = NaiveDate::from_ymd_opt(2011, 11, 11)
            .unwrap()
            .and_hms_opt(10, 10, 10)
            .unwrap();
        let ctx = EvalContext::builder()
            .time_zone(TimeZone::parse("+01:00").unwrap())
            .now(now)
            .sql_mode(SqlMode::NO_ZERO_DATE)
            .ignore_errors(true)
            .build();
        assert_eq!(ctx.now_time(0).to_string(), "2011-11-11 10:10:10");
        assert_eq!(ctx.utc_now().to_string(), "2011-11-11 09:10:10");
        assert!(ctx.sql_mode().contains(SqlMode::NO_ZERO_DATE));
        assert!(ctx.ignore_errors());
    }

    #[test]
    fn test_cancellation() {
        let ctx = EvalContext::new();
        assert!(ctx.check_interrupted().is_ok());
        let handle = ctx.cancellation_handle();
        handle.cancel();
        assert_eq!(ctx.check_interrupted().unwrap_err(), Error::QueryInterrupted);
    }

    #[test]
    fn test_deadline() {
        let ctx = EvalContext::builder().deadline(Instant::now()).build();
        assert_eq!(ctx.check_interrupted().unwrap_err(), Error::QueryTimeout);
    }

    #[test]
    fn test_from_config() {
        let config = EvalConfig::new().with_sql_mode("bogus");
        assert_eq!(EvalContext::from_config(&config).unwrap_err().code(), 1231);
        let ctx = EvalContext::from_config(&EvalConfig::mysql_default()).unwrap();
        assert!(ctx.sql_mode().is_strict());
    }
}
