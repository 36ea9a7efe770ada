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

//! Diagnostics Context
//!
//! Owns the warning list of one statement and decides, in one place, how
//! a runtime condition is handled under the current SQL mode:
//!
//! | condition | default | escalated by | under IGNORE |
//! |---|---|---|---|
//! | out of range, invalid JSON | error | - | warning + NULL |
//! | truncated / incorrect value | warning | strict mode | warning |
//! | zero date | silent | NO_ZERO_DATE / NO_ZERO_IN_DATE | warning + NULL |
//! | division by zero | warning + NULL | ERROR_FOR_DIVISION_BY_ZERO | warning + NULL |
//! | datetime overflow | warning + NULL | - | warning + NULL |
//! | collation mix, bad arguments | error | - | error |
//!
//! During batch evaluation warnings are tagged with their row and
//! reordered at the end of the batch, so the final list matches what
//! row-at-a-time evaluation would have produced.

use std::fmt;

use log::{debug, warn};

use crate::config::DEFAULT_MAX_WARNINGS;
use crate::core::{Error, Result, SqlMode};
use crate::eval::EvalContext;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Note => "Note",
            Level::Warning => "Warning",
            Level::Error => "Error",
        })
    }
}

/// One entry of the statement's warning list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub level: Level,
    pub code: u16,
    pub message: String,
}

impl Warning {
    pub fn from_error(level: Level, err: &Error) -> Self {
        Self {
            level,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.level, self.code, self.message)
    }
}

/// What a builtin should do after a condition was downgraded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Continue with the best-effort value
    Keep,
    /// Return NULL for this row
    Null,
}

/// Position in the warning list, for rolling back a failed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    stored: usize,
    total: usize,
    pending: usize,
}

/// Per-statement warning collector
#[derive(Debug, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    total: usize,
    max: usize,
    row: usize,
    /// Row-tagged warnings of the batch in progress
    pending: Option<Vec<(usize, Warning)>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WARNINGS)
    }
}

impl Diagnostics {
    /// Create a collector keeping at most `max` warnings
    pub fn new(max: usize) -> Self {
        Self {
            warnings: Vec::new(),
            total: 0,
            max,
            row: 0,
            pending: None,
        }
    }

    /// Stored warnings in emission order
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of conditions raised, including ones past the cap
    pub fn warning_count(&self) -> usize {
        self.total + self.pending.as_ref().map(|p| p.len()).unwrap_or(0)
    }

    /// Drain the stored warnings
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        self.total = 0;
        std::mem::take(&mut self.warnings)
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
        self.total = 0;
        self.pending = None;
    }

    /// Row the next warnings belong to (batch mode)
    #[inline]
    pub fn set_row(&mut self, row: usize) {
        self.row = row;
    }

    #[inline]
    pub fn row(&self) -> usize {
        self.row
    }

    /// True between [`begin_batch`](Self::begin_batch) and [`end_batch`](Self::end_batch)
    pub fn in_batch(&self) -> bool {
        self.pending.is_some()
    }

    /// Start collecting row-tagged warnings
    pub fn begin_batch(&mut self) {
        self.row = 0;
        if self.pending.is_none() {
            self.pending = Some(Vec::new());
        }
    }

    /// Flush the batch's warnings in row order
    pub fn end_batch(&mut self) {
        let Some(mut pending) = self.pending.take() else {
            return;
        };
        pending.sort_by_key(|(row, _)| *row);
        for (_, w) in pending {
            self.store(w);
        }
        self.row = 0;
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            stored: self.warnings.len(),
            total: self.total,
            pending: self.pending.as_ref().map(|p| p.len()).unwrap_or(0),
        }
    }

    /// Forget everything raised after `cp`
    pub fn rollback(&mut self, cp: Checkpoint) {
        self.warnings.truncate(cp.stored);
        self.total = cp.total;
        if let Some(pending) = self.pending.as_mut() {
            pending.truncate(cp.pending);
        }
    }

    fn store(&mut self, w: Warning) {
        self.total += 1;
        if self.warnings.len() < self.max {
            self.warnings.push(w);
        } else if self.warnings.len() == self.max && self.total == self.max + 1 {
            warn!("warning list full at {} entries, further warnings are counted only", self.max);
        }
    }

    /// Record a diagnostic
    pub fn push(&mut self, level: Level, err: &Error) {
        debug!("{} {}: {}", level, err.code(), err);
        let w = Warning::from_error(level, err);
        match self.pending.as_mut() {
            Some(pending) => pending.push((self.row, w)),
            None => self.store(w),
        }
    }

    /// Record a warning-level diagnostic
    #[inline]
    pub fn push_warning(&mut self, err: &Error) {
        self.push(Level::Warning, err);
    }

    /// Record the error that aborted the statement
    pub fn record_error(&mut self, err: &Error) {
        self.push(Level::Error, err);
    }

    /// Apply the SQL-mode policy to a runtime condition.
    ///
    /// Returns `Err` when the condition aborts the statement; otherwise the
    /// condition has been recorded (or deliberately ignored) and the caller
    /// continues as [`Recovery`] says.
    pub fn observe(&mut self, err: Error, ctx: &EvalContext) -> Result<Recovery> {
        let mode = ctx.sql_mode();
        let ignore = ctx.ignore_errors();
        match &err {
            Error::TruncatedWrongValue { .. }
            | Error::IncorrectDatetimeValue { .. }
            | Error::WrongValueForType { .. }
            | Error::DataTruncated(_) => {
                if mode.is_strict() && !ignore {
                    return Err(err);
                }
                self.push_warning(&err);
                Ok(Recovery::Keep)
            }
            Error::ZeroDate { in_date, .. } => {
                let flag = if *in_date {
                    SqlMode::NO_ZERO_IN_DATE
                } else {
                    SqlMode::NO_ZERO_DATE
                };
                if !mode.contains(flag) {
                    return Ok(Recovery::Keep);
                }
                if ignore {
                    self.push_warning(&err);
                    return Ok(Recovery::Null);
                }
                Err(err)
            }
            Error::DivisionByZero => {
                if mode.contains(SqlMode::ERROR_FOR_DIVISION_BY_ZERO) && !ignore {
                    return Err(err);
                }
                self.push_warning(&err);
                Ok(Recovery::Null)
            }
            Error::OutOfRange { .. } | Error::InvalidJsonText { .. } => {
                if ignore {
                    self.push_warning(&err);
                    return Ok(Recovery::Null);
                }
                Err(err)
            }
            Error::DatetimeOverflow(_) => {
                self.push_warning(&err);
                Ok(Recovery::Null)
            }
            Error::Saturated { .. } | Error::GroupConcatCut(_) => {
                self.push_warning(&err);
                Ok(Recovery::Keep)
            }
            _ => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(mode: SqlMode, ignore: bool) -> EvalContext {
        EvalContext::builder().sql_mode(mode).ignore_errors(ignore).build()
    }

    #[test]
    fn test_truncation_policy() {
        let mut diag = Diagnostics::default();
        let err = Error::truncated_wrong_value("INTEGER", "1a");
        let r = diag.observe(err.clone(), &ctx(SqlMode::empty(), false)).unwrap();
        assert_eq!(r, Recovery::Keep);
        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(diag.warnings()[0].code, 1292);

        assert!(diag.observe(err.clone(), &ctx(SqlMode::STRICT_TRANS_TABLES, false)).is_err());
        let r = diag.observe(err, &ctx(SqlMode::STRICT_TRANS_TABLES, true)).unwrap();
        assert_eq!(r, Recovery::Keep);
    }

    #[test]
    fn test_zero_date_policy() {
        let mut diag = Diagnostics::default();
        let err = Error::zero_date("datetime", "0000-00-00 12:12:09", false);
        let r = diag.observe(err.clone(), &ctx(SqlMode::empty(), false)).unwrap();
        assert_eq!(r, Recovery::Keep);
        assert!(diag.warnings().is_empty());

        assert!(diag.observe(err.clone(), &ctx(SqlMode::NO_ZERO_DATE, false)).is_err());
        let r = diag.observe(err, &ctx(SqlMode::NO_ZERO_DATE, true)).unwrap();
        assert_eq!(r, Recovery::Null);
        assert_eq!(diag.warnings().len(), 1);

        // In-date zeros are governed by their own flag
        let err = Error::zero_date("date", "2011-00-01", true);
        assert!(diag.observe(err.clone(), &ctx(SqlMode::NO_ZERO_DATE, false)).is_ok());
        assert!(diag.observe(err, &ctx(SqlMode::NO_ZERO_IN_DATE, false)).is_err());
    }

    #[test]
    fn test_division_by_zero_policy() {
        let mut diag = Diagnostics::default();
        let r = diag.observe(Error::DivisionByZero, &ctx(SqlMode::empty(), false)).unwrap();
        assert_eq!(r, Recovery::Null);
        assert!(diag
            .observe(Error::DivisionByZero, &ctx(SqlMode::ERROR_FOR_DIVISION_BY_ZERO, false))
            .is_err());
        let r = diag
            .observe(Error::DivisionByZero, &ctx(SqlMode::ERROR_FOR_DIVISION_BY_ZERO, true))
            .unwrap();
        assert_eq!(r, Recovery::Null);
    }

    #[test]
    fn test_never_downgraded() {
        let mut diag = Diagnostics::default();
        let mix = Error::illegal_mix(vec![], "=");
        assert!(diag.observe(mix, &ctx(SqlMode::empty(), true)).is_err());
        let args = Error::incorrect_arguments("NAME_CONST");
        assert!(diag.observe(args, &ctx(SqlMode::empty(), true)).is_err());

        let oor = Error::out_of_range("BIGINT", "(a + 1)");
        assert!(diag.observe(oor.clone(), &ctx(SqlMode::empty(), false)).is_err());
        assert_eq!(diag.observe(oor, &ctx(SqlMode::empty(), true)).unwrap(), Recovery::Null);
    }

    #[test]
    fn test_batch_reorders_by_row() {
        let mut diag = Diagnostics::default();
        diag.begin_batch();
        for row in [0, 1, 2] {
            diag.set_row(row);
            diag.push_warning(&Error::truncated_wrong_value("INTEGER", format!("inner{}", row)));
        }
        for row in [0, 2] {
            diag.set_row(row);
            diag.push_warning(&Error::truncated_wrong_value("DOUBLE", format!("outer{}", row)));
        }
        diag.end_batch();
        let messages: Vec<&str> = diag.warnings().iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Truncated incorrect INTEGER value: 'inner0'",
                "Truncated incorrect DOUBLE value: 'outer0'",
                "Truncated incorrect INTEGER value: 'inner1'",
                "Truncated incorrect INTEGER value: 'inner2'",
                "Truncated incorrect DOUBLE value: 'outer2'",
            ]
        );
    }

    #[test]
    fn test_cap_and_rollback() {
        let mut diag = Diagnostics::new(2);
        for i in 0..3 {
            diag.push_warning(&Error::truncated_wrong_value("INTEGER", i.to_string()));
        }
        assert_eq!(diag.warnings().len(), 2);
        assert_eq!(diag.warning_count(), 3);

        let mut diag = Diagnostics::default();
        diag.push_warning(&Error::DivisionByZero);
        let cp = diag.checkpoint();
        diag.push_warning(&Error::DivisionByZero);
        diag.rollback(cp);
        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(diag.warning_count(), 1);
    }
}
