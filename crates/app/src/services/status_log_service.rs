//! Status log service: scheduled maintenance of the audit log.

use chrono::{Months, NaiveDate};

use presence_domain::error::{PresenceError, ValidationError};
use presence_domain::status_log::StatusLogEntry;
use presence_domain::time::{Clock, start_of_day};

use crate::ports::{MemberRepository, StatusLogRepository};

/// Application service for the daily log jobs.
pub struct StatusLogService<MR, LR> {
    members: MR,
    logs: LR,
    clock: Clock,
}

impl<MR: MemberRepository, LR: StatusLogRepository> StatusLogService<MR, LR> {
    pub fn new(members: MR, logs: LR, clock: Clock) -> Self {
        Self {
            members,
            logs,
            clock,
        }
    }

    /// Append a snapshot of every member's current status at the midnight
    /// opening `day`, so each day bucket opens with a known status.
    ///
    /// A failed append for one member is logged and does not stop the others.
    /// Returns how many snapshots were written.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the member list cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn record_daily_snapshot(&self, day: NaiveDate) -> Result<usize, PresenceError> {
        let midnight = start_of_day(day);
        let mut written = 0;
        for member in self.members.get_all().await? {
            let entry = StatusLogEntry::new(member.id, midnight, member.status);
            match self.logs.append(entry).await {
                Ok(_) => written += 1,
                Err(err) => {
                    tracing::warn!(member_id = %member.id, error = ?err, "snapshot append failed");
                }
            }
        }
        tracing::info!(written, "daily status snapshot recorded");
        Ok(written)
    }

    /// Drop entries older than `months` calendar months before today's midnight.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn purge_older_than(&self, months: u32) -> Result<u64, PresenceError> {
        let cutoff = self
            .clock
            .today()
            .checked_sub_months(Months::new(months))
            .ok_or(ValidationError::InvalidParameter {
                field: "retention_months",
                value: months.to_string(),
            })?;
        let removed = self.logs.purge_before(start_of_day(cutoff)).await?;
        tracing::info!(removed, %cutoff, "status log purged");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryMemberRepo, InMemoryStatusLogRepo};
    use presence_domain::id::MemberId;
    use presence_domain::member::Member;
    use presence_domain::status::Status;
    use presence_domain::time::parse_timestamp;

    fn member(id: i64, status: Status) -> Member {
        Member::builder()
            .id(MemberId::new(id))
            .name("Mio")
            .status(status)
            .build()
            .unwrap()
    }

    fn clock() -> Clock {
        Clock::fixed(parse_timestamp("2024-04-02T00:00:05").unwrap())
    }

    #[tokio::test]
    async fn should_snapshot_every_member_at_midnight() {
        let logs = InMemoryStatusLogRepo::default();
        let svc = StatusLogService::new(
            InMemoryMemberRepo::with([member(1, Status::Present), member(2, Status::OnLeave)]),
            logs.clone(),
            clock(),
        );

        let written = svc
            .record_daily_snapshot(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap())
            .await
            .unwrap();

        assert_eq!(written, 2);
        let entries = logs.all();
        assert!(
            entries
                .iter()
                .all(|e| e.date == parse_timestamp("2024-04-02T00:00:00").unwrap())
        );
        assert!(
            entries
                .iter()
                .any(|e| e.member_id == MemberId::new(2) && e.update_status == Status::OnLeave)
        );
    }

    #[tokio::test]
    async fn should_open_the_next_day_when_woken_before_midnight() {
        let at = |s: &str| parse_timestamp(s).unwrap();
        let logs = InMemoryStatusLogRepo::with([
            StatusLogEntry::new(MemberId::new(1), at("2024-04-01T09:00:00"), Status::Present),
            StatusLogEntry::new(MemberId::new(1), at("2024-04-01T12:00:00"), Status::Away),
        ]);
        let svc = StatusLogService::new(
            InMemoryMemberRepo::with([member(1, Status::Away)]),
            logs.clone(),
            Clock::fixed(at("2024-04-01T23:59:59.995")),
        );

        svc.record_daily_snapshot(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap())
            .await
            .unwrap();

        let entries = logs.all();
        let first_day = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert_eq!(entries.iter().filter(|e| e.date.date() == first_day).count(), 2);
        assert!(
            entries
                .iter()
                .any(|e| e.date == at("2024-04-02T00:00:00") && e.update_status == Status::Away)
        );
    }

    #[tokio::test]
    async fn should_purge_entries_older_than_retention() {
        let at = |s: &str| parse_timestamp(s).unwrap();
        let logs = InMemoryStatusLogRepo::with([
            StatusLogEntry::new(MemberId::new(1), at("2023-12-31T23:00:00"), Status::Present),
            StatusLogEntry::new(MemberId::new(1), at("2024-01-02T00:00:00"), Status::Away),
        ]);
        let svc = StatusLogService::new(InMemoryMemberRepo::default(), logs.clone(), clock());

        let removed = svc.purge_older_than(3).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(logs.all().len(), 1);
    }
}
