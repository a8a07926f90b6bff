//! Event: an immutable record of a field change that drives a reaction.
//!
//! Events carry the value before and after the write, the way a
//! change-trigger on a document store delivers them.

use serde::{Deserialize, Serialize};

use crate::geofence::GeofenceStatus;
use crate::id::{DeviceId, MemberId};
use crate::status::Status;

/// A change the presence engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// A device's geofence map was written with a different value.
    GeofenceStatusChanged {
        device_id: DeviceId,
        before: GeofenceStatus,
        after: GeofenceStatus,
    },
    /// A member's status was written with a different value.
    MemberStatusChanged {
        member_id: MemberId,
        before: Status,
        after: Status,
    },
}

impl PresenceEvent {
    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GeofenceStatusChanged { .. } => "geofence_status_changed",
            Self::MemberStatusChanged { .. } => "member_status_changed",
        }
    }
}
