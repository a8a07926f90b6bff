//! Device: a phone that reports geofence membership for a member.

use serde::{Deserialize, Serialize};

use crate::error::{PresenceError, ValidationError};
use crate::geofence::GeofenceStatus;
use crate::id::{DeviceId, MemberId};
use crate::time::Timestamp;

/// A registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Member this device reports for; `None` while unassigned.
    pub member_id: Option<MemberId>,
    pub geofence_status: GeofenceStatus,
    /// Opaque push delivery token.
    pub notification_token: Option<String>,
    pub last_update_date: Option<Timestamp>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] when `id` is blank.
    pub fn validate(&self) -> Result<(), PresenceError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    member_id: Option<MemberId>,
    geofence_status: Option<GeofenceStatus>,
    notification_token: Option<String>,
    last_update_date: Option<Timestamp>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn member_id(mut self, member_id: MemberId) -> Self {
        self.member_id = Some(member_id);
        self
    }

    #[must_use]
    pub fn geofence_status(mut self, status: GeofenceStatus) -> Self {
        self.geofence_status = Some(status);
        self
    }

    #[must_use]
    pub fn notification_token(mut self, token: impl Into<String>) -> Self {
        self.notification_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn last_update_date(mut self, at: Timestamp) -> Self {
        self.last_update_date = Some(at);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] if `id` is missing or blank.
    pub fn build(self) -> Result<Device, PresenceError> {
        let device = Device {
            id: self.id.unwrap_or_else(|| DeviceId::new("")),
            member_id: self.member_id,
            geofence_status: self.geofence_status.unwrap_or_default(),
            notification_token: self.notification_token,
            last_update_date: self.last_update_date,
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::GeofenceRegion;

    #[test]
    fn should_build_unassigned_device() {
        let device = Device::builder().id("ios-aiko").build().unwrap();
        assert_eq!(device.id.as_str(), "ios-aiko");
        assert!(device.member_id.is_none());
        assert!(device.notification_token.is_none());
    }

    #[test]
    fn should_return_validation_error_when_id_missing() {
        let result = Device::builder().build();
        assert!(matches!(
            result,
            Err(PresenceError::Validation(ValidationError::EmptyDeviceId))
        ));
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let device = Device::builder()
            .id("ios-aiko")
            .member_id(MemberId::new(7))
            .notification_token("tok-1")
            .geofence_status(GeofenceStatus::all_clear().with(GeofenceRegion::CampusMain, true))
            .build()
            .unwrap();
        let json = serde_json::to_string(&device).unwrap();
        let parsed: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, device);
    }
}
