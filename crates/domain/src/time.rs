//! Time and timestamp helpers.
//!
//! Presence data is recorded in the wall-clock time of the site being
//! tracked, so a [`Timestamp`] is a naive local date-time and day buckets
//! follow local midnight. The [`Clock`] knows which UTC offset that is.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::ValidationError;

/// Local wall-clock timestamp used for log entries and `last_update_date`.
pub type Timestamp = NaiveDateTime;

/// Storage and wire format for timestamps (millisecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Source of "now" in local wall-clock time.
///
/// `Fixed` pins the time for tests and replays; `System` reads the host
/// clock and shifts it by the configured offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    System(FixedOffset),
    Fixed(Timestamp),
}

impl Clock {
    /// System clock shifted to the given UTC offset.
    #[must_use]
    pub fn system(offset: FixedOffset) -> Self {
        Self::System(offset)
    }

    /// Clock frozen at `at`.
    #[must_use]
    pub fn fixed(at: Timestamp) -> Self {
        Self::Fixed(at)
    }

    /// Current local wall-clock time.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        match self {
            Self::System(offset) => Utc::now().with_timezone(offset).naive_local(),
            Self::Fixed(at) => *at,
        }
    }

    /// Current local calendar day.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Midnight at the start of `day`.
#[must_use]
pub fn start_of_day(day: NaiveDate) -> Timestamp {
    day.and_time(NaiveTime::MIN)
}

/// `23:59:59.999` on `day`, the last instant a day bucket covers.
#[must_use]
pub fn end_of_day(day: NaiveDate) -> Timestamp {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    day.and_time(last)
}

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written by [`format_timestamp`] (fractional seconds optional).
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimestamp`] when `value` does not match.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, ValidationError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTimestamp(value.to_owned()))
}

/// Parse a calendar date, dropping any time-of-day component.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, and full timestamps in either
/// `T`- or space-separated form.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] when nothing matches.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts.date());
        }
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::InvalidDate(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn should_return_fixed_time_when_clock_is_fixed() {
        let at = ts("2024-04-01T09:30:00.000");
        assert_eq!(Clock::fixed(at).now(), at);
        assert_eq!(Clock::fixed(at).today(), at.date());
    }

    #[test]
    fn should_shift_system_time_by_offset() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let before = Utc::now().naive_utc();
        let local = Clock::system(offset).now();
        let after = Utc::now().naive_utc();
        assert!(local >= before + chrono::Duration::hours(9));
        assert!(local <= after + chrono::Duration::hours(9));
    }

    #[test]
    fn should_bound_day_with_start_and_end() {
        let day = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert_eq!(format_timestamp(&start_of_day(day)), "2024-04-01T00:00:00.000");
        assert_eq!(format_timestamp(&end_of_day(day)), "2024-04-01T23:59:59.999");
    }

    #[test]
    fn should_parse_timestamp_without_fraction() {
        assert_eq!(ts("2024-04-01T09:30:00"), ts("2024-04-01T09:30:00.000"));
    }

    #[test]
    fn should_reject_garbage_timestamp() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(ValidationError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn should_truncate_time_when_parsing_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert_eq!(parse_date("2024-04-01").unwrap(), expected);
        assert_eq!(parse_date("2024/04/01").unwrap(), expected);
        assert_eq!(parse_date("2024-04-01T17:45:12.250").unwrap(), expected);
        assert_eq!(parse_date("2024/04/01 17:45:12").unwrap(), expected);
        assert_eq!(parse_date("2024-04-01T17:45:12+09:00").unwrap(), expected);
    }

    #[test]
    fn should_reject_unparseable_date() {
        assert!(matches!(
            parse_date("01-04-2024x"),
            Err(ValidationError::InvalidDate(_))
        ));
    }
}
