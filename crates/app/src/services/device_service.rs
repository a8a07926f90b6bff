//! Device service: registration, geofence reports and member assignment.

use presence_domain::device::Device;
use presence_domain::error::{NotFoundError, PresenceError};
use presence_domain::event::PresenceEvent;
use presence_domain::geofence::GeofenceStatus;
use presence_domain::id::{DeviceId, MemberId};
use presence_domain::time::Clock;

use crate::ports::{DeviceRepository, EventPublisher, MemberRepository};

/// Store `after` as the geofence map of `device` and publish
/// [`PresenceEvent::GeofenceStatusChanged`] when it differs from the stored map.
///
/// Returns whether anything changed.
///
/// # Errors
///
/// Returns a storage error from the repository.
pub async fn write_geofence_status<R, P>(
    repo: &R,
    publisher: &P,
    device: &Device,
    after: GeofenceStatus,
) -> Result<bool, PresenceError>
where
    R: DeviceRepository,
    P: EventPublisher,
{
    if device.geofence_status == after {
        return Ok(false);
    }
    repo.set_geofence_status(&device.id, after.clone()).await?;
    publish_geofence_change(publisher, device, after).await;
    Ok(true)
}

async fn publish_geofence_change<P: EventPublisher>(
    publisher: &P,
    device: &Device,
    after: GeofenceStatus,
) {
    let event = PresenceEvent::GeofenceStatusChanged {
        device_id: device.id.clone(),
        before: device.geofence_status.clone(),
        after,
    };
    if let Err(err) = publisher.publish(event).await {
        tracing::warn!(device_id = %device.id, error = ?err, "geofence change not published");
    }
}

/// Application service for devices.
pub struct DeviceService<DR, MR, P> {
    devices: DR,
    members: MR,
    publisher: P,
    clock: Clock,
}

impl<DR, MR, P> DeviceService<DR, MR, P>
where
    DR: DeviceRepository,
    MR: MemberRepository,
    P: EventPublisher,
{
    /// Create a new service.
    pub fn new(devices: DR, members: MR, publisher: P, clock: Clock) -> Self {
        Self {
            devices,
            members,
            publisher,
            clock,
        }
    }

    /// Register a device, or refresh an existing registration.
    ///
    /// Every known region missing from the geofence map is filled in as
    /// "not inside". A re-registration keeps the stored geofence map and
    /// assignment and only replaces the notification token when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn register_device(&self, mut device: Device) -> Result<Device, PresenceError> {
        device.validate()?;
        let now = self.clock.now();

        if let Some(mut existing) = self.devices.get_by_id(&device.id).await? {
            existing.geofence_status.initialize_missing();
            if device.notification_token.is_some() {
                existing.notification_token = device.notification_token;
            }
            existing.last_update_date = Some(now);
            return self.devices.update(existing).await;
        }

        device.geofence_status.initialize_missing();
        device.last_update_date = Some(now);
        self.devices.create(device).await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, PresenceError> {
        self.devices.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, PresenceError> {
        self.devices.get_all().await
    }

    /// Merge a geofence report into the device's map.
    ///
    /// Regions absent from `report` keep the value stored at write time, so
    /// concurrent reports for different regions do not overwrite each other.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::NotFound`] when the device does not exist, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self, report))]
    pub async fn report_geofence(
        &self,
        id: &DeviceId,
        report: &GeofenceStatus,
    ) -> Result<Device, PresenceError> {
        let mut device = self.get_device(id).await?;
        let after = self
            .devices
            .merge_geofence_status(id, report.clone())
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: id.to_string(),
            })?;
        if after != device.geofence_status {
            tracing::debug!(entered = ?after.entered(), "geofence status changed");
            publish_geofence_change(&self.publisher, &device, after.clone()).await;
        }
        device.geofence_status = after;
        Ok(device)
    }

    /// Change which member a device reports for.
    ///
    /// When neither the previous nor the new member exists the assignment is
    /// left alone and only the device timestamp moves.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::NotFound`] when the device does not exist, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn assign_member(
        &self,
        id: &DeviceId,
        member_id: Option<MemberId>,
    ) -> Result<Device, PresenceError> {
        let device = self.get_device(id).await?;
        let now = self.clock.now();

        let known = match (device.member_id, member_id) {
            (Some(old), Some(new)) => {
                self.member_exists(old).await? || self.member_exists(new).await?
            }
            (None, Some(new)) => self.member_exists(new).await?,
            (_, None) => true,
        };

        if known {
            self.devices.set_member(id, member_id).await?;
        } else {
            tracing::warn!("neither previous nor new member exists, assignment skipped");
        }
        self.devices.touch(id, now).await?;
        self.get_device(id).await
    }

    /// Delete a device by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_device(&self, id: &DeviceId) -> Result<(), PresenceError> {
        self.devices.delete(id).await
    }

    async fn member_exists(&self, id: MemberId) -> Result<bool, PresenceError> {
        Ok(self.members.get_by_id(id).await?.is_some())
    }
}
