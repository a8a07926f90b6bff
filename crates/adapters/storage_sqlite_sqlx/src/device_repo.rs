//! `SQLite` implementation of [`DeviceRepository`].
//!
//! The geofence map is stored as a JSON object keyed by region identifier.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use presence_app::ports::DeviceRepository;
use presence_domain::device::Device;
use presence_domain::error::PresenceError;
use presence_domain::geofence::GeofenceStatus;
use presence_domain::id::{DeviceId, MemberId};
use presence_domain::time::{Timestamp, format_timestamp};

use crate::error::StorageError;
use crate::{decode_timestamp, encode_timestamp};

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let member_id: Option<i64> = row.try_get("member_id")?;
        let geofence_status: String = row.try_get("geofence_status")?;
        let notification_token: Option<String> = row.try_get("notification_token")?;
        let last_update_date: Option<String> = row.try_get("last_update_date")?;

        let geofence_status: GeofenceStatus = serde_json::from_str(&geofence_status)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Device {
            id: DeviceId::new(id),
            member_id: member_id.map(MemberId::new),
            geofence_status,
            notification_token,
            last_update_date: decode_timestamp(last_update_date)?,
        }))
    }
}

const INSERT: &str = "INSERT INTO devices (id, member_id, geofence_status, notification_token, last_update_date) VALUES (?, ?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY id";
const SELECT_BY_MEMBER: &str = "SELECT * FROM devices WHERE member_id = ? ORDER BY id";
const UPDATE: &str = "UPDATE devices SET member_id = ?, geofence_status = ?, notification_token = ?, last_update_date = ? WHERE id = ?";
const UPDATE_GEOFENCE_STATUS: &str = "UPDATE devices SET geofence_status = ? WHERE id = ?";
const MERGE_GEOFENCE_STATUS: &str = "UPDATE devices SET geofence_status = json_patch(geofence_status, ?) WHERE id = ? RETURNING geofence_status";
const UPDATE_MEMBER: &str = "UPDATE devices SET member_id = ? WHERE id = ?";
const UPDATE_LAST_UPDATE_DATE: &str = "UPDATE devices SET last_update_date = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM devices WHERE id = ?";

/// `SQLite`-backed device repository.
#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let geofence_status =
                serde_json::to_string(&device.geofence_status).map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(device.id.as_str())
                .bind(device.member_id.map(MemberId::as_i64))
                .bind(geofence_status)
                .bind(&device.notification_token)
                .bind(encode_timestamp(device.last_update_date))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }

    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, PresenceError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_by_member(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = Result<Vec<Device>, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_MEMBER)
                .bind(member_id.as_i64())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, PresenceError>> + Send {
        let pool = self.pool.clone();
        async move {
            let geofence_status =
                serde_json::to_string(&device.geofence_status).map_err(StorageError::from)?;

            sqlx::query(UPDATE)
                .bind(device.member_id.map(MemberId::as_i64))
                .bind(geofence_status)
                .bind(&device.notification_token)
                .bind(encode_timestamp(device.last_update_date))
                .bind(device.id.as_str())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }

    fn set_geofence_status(
        &self,
        id: &DeviceId,
        status: GeofenceStatus,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let status = serde_json::to_string(&status).map_err(StorageError::from)?;

            sqlx::query(UPDATE_GEOFENCE_STATUS)
                .bind(status)
                .bind(id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn merge_geofence_status(
        &self,
        id: &DeviceId,
        updates: GeofenceStatus,
    ) -> impl Future<Output = Result<Option<GeofenceStatus>, PresenceError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            let updates = serde_json::to_string(&updates).map_err(StorageError::from)?;

            let merged: Option<String> = sqlx::query_scalar(MERGE_GEOFENCE_STATUS)
                .bind(updates)
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let merged = merged
                .map(|raw| serde_json::from_str::<GeofenceStatus>(&raw))
                .transpose()
                .map_err(StorageError::from)?;
            Ok(merged)
        }
    }

    fn set_member(
        &self,
        id: &DeviceId,
        member_id: Option<MemberId>,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            sqlx::query(UPDATE_MEMBER)
                .bind(member_id.map(MemberId::as_i64))
                .bind(id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn touch(
        &self,
        id: &DeviceId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            sqlx::query(UPDATE_LAST_UPDATE_DATE)
                .bind(format_timestamp(&at))
                .bind(id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }

    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let pool = self.pool.clone();
        let id = id.to_string();
        async move {
            sqlx::query(DELETE_BY_ID)
                .bind(id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use presence_domain::region::GeofenceRegion;
    use presence_domain::time::parse_timestamp;

    async fn setup() -> SqliteDeviceRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteDeviceRepository::new(db.pool().clone())
    }

    fn device(id: &str, member: Option<i64>) -> Device {
        let mut builder = Device::builder()
            .id(id)
            .notification_token(format!("tok-{id}"))
            .geofence_status(GeofenceStatus::all_clear().with(GeofenceRegion::CampusNorth, true));
        if let Some(member) = member {
            builder = builder.member_id(MemberId::new(member));
        }
        builder.build().unwrap()
    }

    #[tokio::test]
    async fn should_create_and_retrieve_device_with_geofence_map() {
        let repo = setup().await;
        let created = repo.create(device("ios-aiko", Some(1))).await.unwrap();

        let fetched = repo
            .get_by_id(&DeviceId::new("ios-aiko"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);
        assert!(fetched.geofence_status.is_inside(GeofenceRegion::CampusNorth));
    }

    #[tokio::test]
    async fn should_return_none_when_device_not_found() {
        let repo = setup().await;
        let result = repo.get_by_id(&DeviceId::new("ghost")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_find_devices_by_member() {
        let repo = setup().await;
        repo.create(device("ios-aiko", Some(1))).await.unwrap();
        repo.create(device("ipad-aiko", Some(1))).await.unwrap();
        repo.create(device("ios-ren", Some(2))).await.unwrap();
        repo.create(device("spare", None)).await.unwrap();

        let found = repo.find_by_member(MemberId::new(1)).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["ios-aiko", "ipad-aiko"]);
        assert_eq!(repo.get_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn should_update_single_fields() {
        let repo = setup().await;
        repo.create(device("ios-aiko", None)).await.unwrap();
        let id = DeviceId::new("ios-aiko");
        let at = parse_timestamp("2024-04-01T09:30:00").unwrap();

        repo.set_geofence_status(&id, GeofenceStatus::all_clear())
            .await
            .unwrap();
        repo.set_member(&id, Some(MemberId::new(3))).await.unwrap();
        repo.touch(&id, at).await.unwrap();

        let stored = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.geofence_status, GeofenceStatus::all_clear());
        assert_eq!(stored.member_id, Some(MemberId::new(3)));
        assert_eq!(stored.last_update_date, Some(at));
        assert_eq!(stored.notification_token.as_deref(), Some("tok-ios-aiko"));
    }

    #[tokio::test]
    async fn should_keep_both_regions_when_merges_interleave() {
        let repo = setup().await;
        repo.create(device("ios-aiko", Some(1))).await.unwrap();
        let id = DeviceId::new("ios-aiko");

        let (north, south) = tokio::join!(
            repo.merge_geofence_status(
                &id,
                GeofenceStatus::default().with(GeofenceRegion::CampusNorth, false),
            ),
            repo.merge_geofence_status(
                &id,
                GeofenceStatus::default().with(GeofenceRegion::CampusSouth, true),
            ),
        );
        assert!(north.unwrap().is_some());
        assert!(south.unwrap().is_some());

        let stored = repo.get_by_id(&id).await.unwrap().unwrap();
        assert!(!stored.geofence_status.is_inside(GeofenceRegion::CampusNorth));
        assert!(stored.geofence_status.is_inside(GeofenceRegion::CampusSouth));
        assert!(stored.geofence_status.is_initialized());
    }

    #[tokio::test]
    async fn should_return_merged_map_and_none_for_unknown_device() {
        let repo = setup().await;
        repo.create(device("ios-aiko", None)).await.unwrap();

        let merged = repo
            .merge_geofence_status(
                &DeviceId::new("ios-aiko"),
                GeofenceStatus::default().with(GeofenceRegion::CampusMain, true),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(merged.is_inside(GeofenceRegion::CampusMain));
        assert!(merged.is_inside(GeofenceRegion::CampusNorth));

        let missing = repo
            .merge_geofence_status(&DeviceId::new("ghost"), GeofenceStatus::all_clear())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn should_update_whole_record() {
        let repo = setup().await;
        let mut stored = repo.create(device("ios-aiko", Some(1))).await.unwrap();
        stored.notification_token = None;
        stored.member_id = None;

        repo.update(stored.clone()).await.unwrap();

        let fetched = repo.get_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn should_delete_device() {
        let repo = setup().await;
        repo.create(device("ios-aiko", None)).await.unwrap();
        repo.delete(&DeviceId::new("ios-aiko")).await.unwrap();
        assert!(repo.get_all().await.unwrap().is_empty());
    }
}
