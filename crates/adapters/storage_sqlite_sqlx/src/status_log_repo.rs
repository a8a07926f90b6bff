//! `SQLite` implementation of [`StatusLogRepository`].
//!
//! Each row carries its day key, and rows within a day keep insertion order
//! through the autoincrement id.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use presence_app::ports::StatusLogRepository;
use presence_domain::error::PresenceError;
use presence_domain::id::MemberId;
use presence_domain::status::Status;
use presence_domain::status_log::{LogDay, StatusLog, StatusLogEntry};
use presence_domain::time::{Timestamp, format_timestamp, parse_timestamp};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// the domain with sqlx derives.
struct Wrapper(StatusLogEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let member_id: i64 = row.try_get("member_id")?;
        let date: String = row.try_get("date")?;
        let update_status: i64 = row.try_get("update_status")?;

        let date = parse_timestamp(&date).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let update_status =
            Status::from_code(update_status).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(StatusLogEntry::new(
            MemberId::new(member_id),
            date,
            update_status,
        )))
    }
}

const INSERT: &str =
    "INSERT INTO status_logs (member_id, day_key, date, update_status) VALUES (?, ?, ?, ?)";
const SELECT_RANGE: &str = "SELECT member_id, date, update_status FROM status_logs WHERE member_id = ? AND day_key >= ? AND day_key <= ? ORDER BY day_key, id";
const DELETE_BEFORE: &str = "DELETE FROM status_logs WHERE date < ?";

/// `SQLite`-backed status log.
#[derive(Clone)]
pub struct SqliteStatusLogRepository {
    pool: SqlitePool,
}

impl SqliteStatusLogRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl StatusLogRepository for SqliteStatusLogRepository {
    fn append(
        &self,
        entry: StatusLogEntry,
    ) -> impl Future<Output = Result<StatusLogEntry, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(entry.member_id.as_i64())
                .bind(entry.day().key())
                .bind(format_timestamp(&entry.date))
                .bind(entry.update_status.code())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(entry)
        }
    }

    fn load_range(
        &self,
        member_id: MemberId,
        first: LogDay,
        last: LogDay,
    ) -> impl Future<Output = Result<StatusLog, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RANGE)
                .bind(member_id.as_i64())
                .bind(first.key())
                .bind(last.key())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn purge_before(
        &self,
        before: Timestamp,
    ) -> impl Future<Output = Result<u64, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_BEFORE)
                .bind(format_timestamp(&before))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteStatusLogRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteStatusLogRepository::new(db.pool().clone())
    }

    fn entry(member: i64, at: &str, status: Status) -> StatusLogEntry {
        StatusLogEntry::new(MemberId::new(member), parse_timestamp(at).unwrap(), status)
    }

    fn day(key: &str) -> LogDay {
        key.parse().unwrap()
    }

    #[tokio::test]
    async fn should_append_and_load_bucketed_entries() {
        let repo = setup().await;
        repo.append(entry(7, "2024-04-01T09:00:00", Status::Present))
            .await
            .unwrap();
        repo.append(entry(7, "2024-04-01T12:00:00.500", Status::InClass))
            .await
            .unwrap();
        repo.append(entry(7, "2024-04-02T08:00:00", Status::Present))
            .await
            .unwrap();

        let log = repo
            .load_range(MemberId::new(7), day("20240401"), day("20240401"))
            .await
            .unwrap();

        let bucket = log.bucket(day("20240401")).unwrap();
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket[1], entry(7, "2024-04-01T12:00:00.500", Status::InClass));
        assert!(log.bucket(day("20240402")).is_none());
    }

    #[tokio::test]
    async fn should_keep_insertion_order_within_a_day() {
        let repo = setup().await;
        repo.append(entry(7, "2024-04-01T10:00:00", Status::Present))
            .await
            .unwrap();
        repo.append(entry(7, "2024-04-01T09:00:00", Status::Away))
            .await
            .unwrap();

        let log = repo
            .load_range(MemberId::new(7), day("20240401"), day("20240401"))
            .await
            .unwrap();

        let statuses: Vec<Status> = log.entries().map(|e| e.update_status).collect();
        assert_eq!(statuses, vec![Status::Present, Status::Away]);
    }

    #[tokio::test]
    async fn should_filter_by_member() {
        let repo = setup().await;
        repo.append(entry(7, "2024-04-01T09:00:00", Status::Present))
            .await
            .unwrap();
        repo.append(entry(8, "2024-04-01T09:00:00", Status::Present))
            .await
            .unwrap();

        let log = repo
            .load_range(MemberId::new(8), day("20240401"), day("20240430"))
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn should_purge_entries_before_timestamp() {
        let repo = setup().await;
        repo.append(entry(7, "2024-01-01T09:00:00", Status::Present))
            .await
            .unwrap();
        repo.append(entry(7, "2024-04-01T09:00:00", Status::Present))
            .await
            .unwrap();

        let removed = repo
            .purge_before(parse_timestamp("2024-04-01T00:00:00").unwrap())
            .await
            .unwrap();

        assert_eq!(removed, 1);
        let log = repo
            .load_range(MemberId::new(7), day("20240101"), day("20241231"))
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }
}
