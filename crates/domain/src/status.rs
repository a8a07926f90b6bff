//! Status: the closed set of presence codes a member can hold.
//!
//! Only [`Status::Away`] and [`Status::Present`] are ever assigned by the
//! geofence engine. Every other code is manual-only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Presence status code. Serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Status {
    /// Not at any tracked site (gone home).
    #[default]
    Away,
    /// On site.
    Present,
    /// Attending a lecture.
    InClass,
    /// In a meeting.
    InMeeting,
    /// Out on an errand or business trip.
    OutOnBusiness,
    /// On leave for the day.
    OnLeave,
}

impl Status {
    /// Every status, in code order.
    pub const ALL: [Self; 6] = [
        Self::Away,
        Self::Present,
        Self::InClass,
        Self::InMeeting,
        Self::OutOnBusiness,
        Self::OnLeave,
    ];

    /// Numeric code as stored in the status log.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Away => 0,
            Self::Present => 1,
            Self::InClass => 2,
            Self::InMeeting => 3,
            Self::OutOnBusiness => 4,
            Self::OnLeave => 5,
        }
    }

    /// Resolve a numeric code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownStatus`] for codes outside the set.
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(ValidationError::UnknownStatus(code))
    }

    /// Human-readable English label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Away => "Away",
            Self::Present => "Present",
            Self::InClass => "In class",
            Self::InMeeting => "In a meeting",
            Self::OutOnBusiness => "Out on business",
            Self::OnLeave => "On leave",
        }
    }

    /// Human-readable Japanese label.
    #[must_use]
    pub fn label_ja(self) -> &'static str {
        match self {
            Self::Away => "帰宅",
            Self::Present => "学内",
            Self::InClass => "講義",
            Self::InMeeting => "会議",
            Self::OutOnBusiness => "外出",
            Self::OnLeave => "休暇",
        }
    }
}

impl TryFrom<i64> for Status {
    type Error = ValidationError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<Status> for i64 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who originated a status write.
///
/// Persisted on the member as the single `last_update_is_auto` bit; only the
/// most recent write's origin is remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOrigin {
    /// Written by the geofence engine.
    Automatic,
    /// Written by a person (app, admin tool).
    Manual,
}

impl UpdateOrigin {
    /// Value of the `last_update_is_auto` flag for this origin.
    #[must_use]
    pub fn is_auto(self) -> bool {
        matches!(self, Self::Automatic)
    }

    /// Origin recorded by a stored `last_update_is_auto` flag.
    #[must_use]
    pub fn from_flag(is_auto: bool) -> Self {
        if is_auto { Self::Automatic } else { Self::Manual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_every_code() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()).unwrap(), status);
        }
    }

    #[test]
    fn should_reject_unknown_code() {
        assert_eq!(
            Status::from_code(99),
            Err(ValidationError::UnknownStatus(99))
        );
    }

    #[test]
    fn should_serialize_as_integer_code() {
        assert_eq!(serde_json::to_string(&Status::Present).unwrap(), "1");
        let parsed: Status = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Status::InMeeting);
    }

    #[test]
    fn should_fail_deserializing_unknown_code() {
        let result: Result<Status, _> = serde_json::from_str("42");
        assert!(result.is_err());
    }

    #[test]
    fn should_map_origin_to_flag_and_back() {
        assert!(UpdateOrigin::Automatic.is_auto());
        assert!(!UpdateOrigin::Manual.is_auto());
        assert_eq!(UpdateOrigin::from_flag(true), UpdateOrigin::Automatic);
        assert_eq!(UpdateOrigin::from_flag(false), UpdateOrigin::Manual);
    }
}
