//! Push-specific error type wrapping reqwest errors.

use presence_domain::error::PresenceError;

/// Errors originating from push delivery.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The request could not be sent or the client could not be built.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("push gateway rejected the notification with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<PushError> for PresenceError {
    fn from(err: PushError) -> Self {
        Self::Notification(Box::new(err))
    }
}
