//! Member: a person whose presence status is tracked.

use serde::{Deserialize, Serialize};

use crate::error::{PresenceError, ValidationError};
use crate::id::MemberId;
use crate::status::{Status, UpdateOrigin};
use crate::time::Timestamp;

/// A tracked member and their current presence status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub status: Status,
    /// Status held before the most recent change.
    pub last_status: Option<Status>,
    /// Whether the most recent status write came from the geofence engine.
    /// Starts `true`: a member nobody has touched is treated as automatic.
    pub last_update_is_auto: bool,
    pub last_update_date: Option<Timestamp>,
    /// Derived description of the regions the member's device is in.
    pub geofence_message: Option<String>,
}

impl Member {
    /// Create a builder for constructing a [`Member`].
    #[must_use]
    pub fn builder() -> MemberBuilder {
        MemberBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), PresenceError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Origin of the most recent status write.
    #[must_use]
    pub fn last_update_origin(&self) -> UpdateOrigin {
        UpdateOrigin::from_flag(self.last_update_is_auto)
    }
}

/// Step-by-step builder for [`Member`].
#[derive(Debug, Default)]
pub struct MemberBuilder {
    id: Option<MemberId>,
    name: Option<String>,
    status: Option<Status>,
    last_update_is_auto: Option<bool>,
}

impl MemberBuilder {
    #[must_use]
    pub fn id(mut self, id: MemberId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn last_update_origin(mut self, origin: UpdateOrigin) -> Self {
        self.last_update_is_auto = Some(origin.is_auto());
        self
    }

    /// Consume the builder, validate, and return a [`Member`].
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Member, PresenceError> {
        let member = Member {
            id: self.id.unwrap_or(MemberId::new(0)),
            name: self.name.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            last_status: None,
            last_update_is_auto: self.last_update_is_auto.unwrap_or(true),
            last_update_date: None,
            geofence_message: None,
        };
        member.validate()?;
        Ok(member)
    }
}
