//! Hold time: how many minutes a member held a status over a date range,
//! replayed from the status log.
//!
//! Every day in the range is folded on its own: the cursor starts at local
//! midnight with no status, walks that day's bucket, and closes out at
//! `23:59:59.999`. Nothing carries over from the previous day, so a day
//! without a bucket contributes zero even if the member was in the target
//! status all day. Callers that need continuity seed each day with a
//! midnight snapshot entry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::MemberId;
use crate::status::Status;
use crate::status_log::{LogDay, StatusLog, StatusLogEntry};
use crate::time::{Timestamp, end_of_day, parse_date, start_of_day};

/// A validated hold-time query. Dates are whole days, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldTimeQuery {
    pub member_id: MemberId,
    pub status: Status,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl HoldTimeQuery {
    /// Validate raw query parameters.
    ///
    /// Time-of-day components on the dates are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingParameter`] for an absent field,
    /// and the matching parse error for a malformed one (including a status
    /// code outside the known set).
    pub fn parse(
        member_id: Option<&str>,
        status: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let member_id = required("member_id", member_id)?.parse()?;
        let status_raw = required("status", status)?;
        let code: i64 = status_raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidParameter {
                field: "status",
                value: status_raw.to_owned(),
            })?;
        let status = Status::from_code(code)?;
        let start_date = parse_date(required("start_date", start_date)?)?;
        let end_date = parse_date(required("end_date", end_date)?)?;
        Ok(Self {
            member_id,
            status,
            start_date,
            end_date,
        })
    }

    /// Lazily enumerate the days of the range. Empty when `start > end`.
    #[must_use]
    pub fn days(&self) -> DayRange {
        DayRange::new(self.start_date, self.end_date)
    }
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::MissingParameter(field))
}

/// Inclusive, lazily produced sequence of calendar days.
#[derive(Debug, Clone)]
pub struct DayRange {
    next: Option<LogDay>,
    last: LogDay,
}

impl DayRange {
    #[must_use]
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            next: (first <= last).then_some(LogDay::new(first)),
            last: LogDay::new(last),
        }
    }
}

impl Iterator for DayRange {
    type Item = LogDay;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next().filter(|day| *day <= self.last);
        Some(current)
    }
}

/// Total whole minutes during which `target` was held across `days`.
///
/// Days without a bucket in `log` are skipped.
#[must_use]
pub fn hold_minutes(log: &StatusLog, target: Status, days: impl IntoIterator<Item = LogDay>) -> u64 {
    days.into_iter()
        .filter_map(|day| log.bucket(day).map(|entries| day_minutes(day, entries, target)))
        .sum()
}

/// Minutes `target` was held within a single day bucket.
fn day_minutes(day: LogDay, entries: &[StatusLogEntry], target: Status) -> u64 {
    let mut cursor_time = start_of_day(day.date());
    let mut cursor_status: Option<Status> = None;
    let mut minutes = 0;

    for entry in entries {
        if Some(entry.update_status) != cursor_status && cursor_status == Some(target) {
            minutes += whole_minutes(cursor_time, entry.date);
        }
        cursor_time = entry.date;
        cursor_status = Some(entry.update_status);
    }

    if cursor_status == Some(target) {
        minutes += whole_minutes(cursor_time, end_of_day(day.date()));
    }
    minutes
}

/// Whole minutes from `from` to `to`, rounded down. Out-of-order pairs count zero.
fn whole_minutes(from: Timestamp, to: Timestamp) -> u64 {
    u64::try_from((to - from).num_minutes()).unwrap_or(0)
}
