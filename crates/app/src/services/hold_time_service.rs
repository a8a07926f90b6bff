//! Hold-time service: replays the status log over a date range.

use presence_domain::error::PresenceError;
use presence_domain::hold_time::{HoldTimeQuery, hold_minutes};
use presence_domain::id::MemberId;
use presence_domain::status_log::{LogDay, StatusLogEntry};

use crate::ports::StatusLogRepository;

/// Application service answering hold-time queries.
pub struct HoldTimeService<R> {
    logs: R,
}

impl<R: StatusLogRepository> HoldTimeService<R> {
    pub fn new(logs: R) -> Self {
        Self { logs }
    }

    /// Whole minutes the member held the queried status.
    ///
    /// A reversed range yields zero without touching storage. Unknown members
    /// have no log and also yield zero.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self), fields(member_id = %query.member_id, status = %query.status))]
    pub async fn hold_time(&self, query: &HoldTimeQuery) -> Result<u64, PresenceError> {
        if query.start_date > query.end_date {
            return Ok(0);
        }
        let log = self
            .logs
            .load_range(
                query.member_id,
                LogDay::new(query.start_date),
                LogDay::new(query.end_date),
            )
            .await?;
        let minutes = hold_minutes(&log, query.status, query.days());
        tracing::debug!(minutes, entries = log.len(), "hold time computed");
        Ok(minutes)
    }

    /// A single day bucket of a member's log, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn day_entries(
        &self,
        member_id: MemberId,
        day: LogDay,
    ) -> Result<Vec<StatusLogEntry>, PresenceError> {
        let log = self.logs.load_range(member_id, day, day).await?;
        Ok(log.bucket(day).map(<[_]>::to_vec).unwrap_or_default())
    }
}
