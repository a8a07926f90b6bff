//! Status log: the append-only audit trail of a member's status writes.
//!
//! Entries are grouped into calendar-day buckets keyed `YYYYMMDD`. Within a
//! bucket they keep insertion order, which is also chronological order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::MemberId;
use crate::status::Status;
use crate::time::Timestamp;

/// A calendar day, used as the bucket key of the status log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogDay(NaiveDate);

impl LogDay {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Day containing `ts`.
    #[must_use]
    pub fn of(ts: &Timestamp) -> Self {
        Self(ts.date())
    }

    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// Bucket key, e.g. `20240401`.
    #[must_use]
    pub fn key(self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// The following calendar day, or `None` past the end of the calendar.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }
}

impl fmt::Display for LogDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for LogDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|_| ValidationError::InvalidDayKey(s.to_owned()))
    }
}

/// One immutable audit record: at `date` the member's status became `update_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    pub member_id: MemberId,
    pub date: Timestamp,
    pub update_status: Status,
}

impl StatusLogEntry {
    #[must_use]
    pub fn new(member_id: MemberId, date: Timestamp, update_status: Status) -> Self {
        Self {
            member_id,
            date,
            update_status,
        }
    }

    /// Day bucket this entry belongs to.
    #[must_use]
    pub fn day(&self) -> LogDay {
        LogDay::of(&self.date)
    }
}

/// A member's status log, bucketed by day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLog {
    buckets: BTreeMap<LogDay, Vec<StatusLogEntry>>,
}

impl StatusLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the end of its day bucket.
    pub fn push(&mut self, entry: StatusLogEntry) {
        self.buckets.entry(entry.day()).or_default().push(entry);
    }

    /// Entries recorded on `day`, in insertion order. `None` if the bucket
    /// does not exist.
    #[must_use]
    pub fn bucket(&self, day: LogDay) -> Option<&[StatusLogEntry]> {
        self.buckets.get(&day).map(Vec::as_slice)
    }

    /// Whether no bucket exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of entries across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// All entries, bucket by bucket.
    pub fn entries(&self) -> impl Iterator<Item = &StatusLogEntry> {
        self.buckets.values().flatten()
    }
}

impl FromIterator<StatusLogEntry> for StatusLog {
    fn from_iter<T: IntoIterator<Item = StatusLogEntry>>(iter: T) -> Self {
        let mut log = Self::new();
        for entry in iter {
            log.push(entry);
        }
        log
    }
}
