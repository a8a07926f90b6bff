//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`PresenceError`] via `From`. Adapter errors are boxed so the domain
//! never depends on an IO crate.

/// Top-level error shared by the domain, application and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// Malformed or missing input, surfaced to the caller as a rejection.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced member or device does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A persistence operation failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Push notification dispatch failed.
    #[error("notification error")]
    Notification(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PresenceError {
    /// Whether this error means "the referenced record is missing".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Input that violates a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("member name must not be empty")]
    EmptyName,

    #[error("unknown status code {0}")]
    UnknownStatus(i64),

    #[error("unknown geofence region {0:?}")]
    UnknownRegion(String),

    #[error("missing parameter {0:?}")]
    MissingParameter(&'static str),

    #[error("invalid {field}: {value:?}")]
    InvalidParameter { field: &'static str, value: String },

    #[error("invalid date {0:?}")]
    InvalidDate(String),

    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid day key {0:?}")]
    InvalidDayKey(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_presence_error() {
        let err: PresenceError = ValidationError::UnknownStatus(42).into();
        assert!(matches!(
            err,
            PresenceError::Validation(ValidationError::UnknownStatus(42))
        ));
    }

    #[test]
    fn should_report_not_found() {
        let err: PresenceError = NotFoundError {
            entity: "Member",
            id: "7".to_string(),
        }
        .into();
        assert!(err.is_not_found());
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("Member 7 not found".to_string())
        );
    }

    #[test]
    fn should_format_missing_parameter() {
        let err = ValidationError::MissingParameter("start_date");
        assert_eq!(err.to_string(), "missing parameter \"start_date\"");
    }
}
