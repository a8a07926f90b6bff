//! `SQLite` implementation of [`MemberRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use presence_app::ports::MemberRepository;
use presence_domain::error::PresenceError;
use presence_domain::id::MemberId;
use presence_domain::member::Member;
use presence_domain::status::{Status, UpdateOrigin};
use presence_domain::time::{Timestamp, format_timestamp};

use crate::error::StorageError;
use crate::{decode_timestamp, encode_timestamp};

/// Wrapper for converting database rows into domain [`Member`].
struct Wrapper(Member);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Member> {
        value.map(|w| w.0)
    }
}

fn decode_status(code: i64) -> Result<Status, sqlx::Error> {
    Status::from_code(code).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let status: i64 = row.try_get("status")?;
        let last_status: Option<i64> = row.try_get("last_status")?;
        let last_update_is_auto: bool = row.try_get("last_update_is_auto")?;
        let last_update_date: Option<String> = row.try_get("last_update_date")?;
        let geofence_message: Option<String> = row.try_get("geofence_message")?;

        Ok(Self(Member {
            id: MemberId::new(id),
            name,
            status: decode_status(status)?,
            last_status: last_status.map(decode_status).transpose()?,
            last_update_is_auto,
            last_update_date: decode_timestamp(last_update_date)?,
            geofence_message,
        }))
    }
}

const INSERT: &str = "INSERT INTO members (id, name, status, prev_status, last_status, last_update_is_auto, last_update_date, geofence_message) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM members WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM members ORDER BY id";
// SET expressions read the pre-update row, so prev_status captures the old status.
const UPDATE_STATUS: &str = "UPDATE members SET prev_status = status, status = ?, last_update_is_auto = ? WHERE id = ? RETURNING prev_status";
const UPDATE_LAST_STATUS: &str =
    "UPDATE members SET last_status = ?, last_update_date = ? WHERE id = ?";
const UPDATE_GEOFENCE_MESSAGE: &str = "UPDATE members SET geofence_message = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM members WHERE id = ?";

/// `SQLite`-backed member repository.
#[derive(Clone)]
pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MemberRepository for SqliteMemberRepository {
    fn create(&self, member: Member) -> impl Future<Output = Result<Member, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(member.id.as_i64())
                .bind(&member.name)
                .bind(member.status.code())
                .bind(member.status.code())
                .bind(member.last_status.map(Status::code))
                .bind(member.last_update_is_auto)
                .bind(encode_timestamp(member.last_update_date))
                .bind(&member.geofence_message)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(member)
        }
    }

    fn get_by_id(
        &self,
        id: MemberId,
    ) -> impl Future<Output = Result<Option<Member>, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.as_i64())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Member>, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn set_status(
        &self,
        id: MemberId,
        status: Status,
        origin: UpdateOrigin,
    ) -> impl Future<Output = Result<Option<Status>, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let before: Option<i64> = sqlx::query_scalar(UPDATE_STATUS)
                .bind(status.code())
                .bind(origin.is_auto())
                .bind(id.as_i64())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let before = before
                .map(decode_status)
                .transpose()
                .map_err(StorageError::from)?;

            Ok(before)
        }
    }

    fn set_last_status(
        &self,
        id: MemberId,
        last_status: Status,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE_LAST_STATUS)
                .bind(last_status.code())
                .bind(format_timestamp(&at))
                .bind(id.as_i64())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn set_geofence_message(
        &self,
        id: MemberId,
        message: String,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE_GEOFENCE_MESSAGE)
                .bind(message)
                .bind(id.as_i64())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn delete(&self, id: MemberId) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE_BY_ID)
                .bind(id.as_i64())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
