//! Reporting windows: relative day counts and explicit date ranges.
//!
//! All date math is calendar-day arithmetic on `chrono::NaiveDate`; nothing
//! here reads the clock. The reference date is always supplied by the
//! caller, which keeps window resolution reproducible.

use crate::error::{ReconError, Result};
use chrono::{Duration, NaiveDate};

/// A requested reporting window, before resolution against a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    /// The last `n` calendar days, ending at the reference date inclusive.
    LastDays(u32),

    /// An explicit inclusive date range for ad-hoc reports.
    Range { start: NaiveDate, end: NaiveDate },
}

impl ReportWindow {
    /// Resolves the window into a concrete date range.
    ///
    /// Bounds are validated here regardless of caller-side checks: a
    /// zero-day window and an inverted range are rejected, never clamped.
    pub fn resolve(&self, as_of: NaiveDate) -> Result<DateRange> {
        match *self {
            ReportWindow::LastDays(0) => Err(ReconError::EmptyWindow { days: 0 }),
            ReportWindow::LastDays(days) => {
                let start = as_of
                    .checked_sub_signed(Duration::days(i64::from(days) - 1))
                    .ok_or(ReconError::OversizedWindow { days })?;
                Ok(DateRange { start, end: as_of })
            }
            ReportWindow::Range { start, end } => {
                if end < start {
                    return Err(ReconError::InvertedRange { start, end });
                }
                Ok(DateRange { start, end })
            }
        }
    }

    /// Whether this window asks for a comparison against the prior period.
    ///
    /// Relative windows do (trend reporting); explicit ranges are ad-hoc
    /// exports and do not.
    pub fn compares_previous_period(&self) -> bool {
        matches!(self, ReportWindow::LastDays(_))
    }
}

/// A resolved reporting range of whole calendar days, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of days covered; at least 1 for any resolved range.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The equal-length range immediately preceding this one, contiguous
    /// and non-overlapping.
    ///
    /// A preceding period that would fall off the calendar is rejected as
    /// an oversized window, the same bound `resolve` enforces.
    pub fn previous(&self) -> Result<DateRange> {
        let days = self.num_days();
        let end = self
            .start
            .checked_sub_signed(Duration::days(1))
            .ok_or(ReconError::OversizedWindow { days: days as u32 })?;
        let start = end
            .checked_sub_signed(Duration::days(days - 1))
            .ok_or(ReconError::OversizedWindow { days: days as u32 })?;
        Ok(DateRange { start, end })
    }

    /// Whether the date falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterates the days of the range, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.num_days() as usize)
    }
}
