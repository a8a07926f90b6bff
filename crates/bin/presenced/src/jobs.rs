//! Daily maintenance of the status log.

use std::time::Duration;

use chrono::NaiveDate;
use presence_app::ports::{MemberRepository, StatusLogRepository};
use presence_app::services::status_log_service::StatusLogService;
use presence_domain::time::{Clock, Timestamp, start_of_day};

/// Time left until the next local midnight.
///
/// Exactly at midnight this is a full day, so a job that just ran does not
/// fire again immediately.
#[must_use]
pub fn until_next_midnight(now: Timestamp) -> Duration {
    (next_midnight(now) - now).to_std().unwrap_or(Duration::ZERO)
}

/// The first local midnight strictly after `now`.
#[must_use]
pub fn next_midnight(now: Timestamp) -> Timestamp {
    now.date().succ_opt().map_or(now, start_of_day)
}

/// Run the snapshot and retention jobs at every local midnight, forever.
///
/// The target midnight is fixed before sleeping, so a timer that fires a
/// little early still snapshots the day that is about to open. A failing job
/// is logged and retried the next night.
pub async fn run_daily<MR, LR>(
    service: StatusLogService<MR, LR>,
    clock: Clock,
    snapshot: bool,
    retention_months: u32,
) where
    MR: MemberRepository + Send + Sync,
    LR: StatusLogRepository + Send + Sync,
{
    let mut target = next_midnight(clock.now());
    loop {
        let wait = (target - clock.now()).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(wait_secs = wait.as_secs(), %target, "next status log maintenance scheduled");
        tokio::time::sleep(wait).await;
        run_once(&service, target.date(), snapshot, retention_months).await;
        target = next_midnight(clock.now().max(target));
    }
}

async fn run_once<MR, LR>(
    service: &StatusLogService<MR, LR>,
    day: NaiveDate,
    snapshot: bool,
    retention_months: u32,
) where
    MR: MemberRepository + Send + Sync,
    LR: StatusLogRepository + Send + Sync,
{
    if snapshot && let Err(err) = service.record_daily_snapshot(day).await {
        tracing::error!(error = ?err, "daily status snapshot failed");
    }
    if retention_months > 0
        && let Err(err) = service.purge_older_than(retention_months).await
    {
        tracing::error!(error = ?err, "status log purge failed");
    }
}
