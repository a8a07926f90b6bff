//! # presence-adapter-push-http
//!
//! Implements the `Notifier` port defined in `presence-app`.
//!
//! - [`HttpPushNotifier`] posts each notification as JSON to a push gateway
//!   that fans it out to the device tokens.
//! - [`LogNotifier`] only logs, for deployments without a gateway.
//! - [`PushNotifier`] picks one of the two at startup.
//!
//! Delivery is best-effort: a failed request is reported once and never
//! retried.

mod error;
mod http;
mod logging;

pub use error::PushError;
pub use http::{HttpPushNotifier, PushRequest};
pub use logging::LogNotifier;

use std::future::Future;

use presence_app::ports::{Notifier, PushNotification};
use presence_domain::error::PresenceError;

/// Notifier selected from configuration.
pub enum PushNotifier {
    Http(HttpPushNotifier),
    Log(LogNotifier),
}

impl Notifier for PushNotifier {
    fn send(
        &self,
        tokens: Vec<String>,
        notification: PushNotification,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        async move {
            match self {
                Self::Http(inner) => inner.send(tokens, notification).await,
                Self::Log(inner) => inner.send(tokens, notification).await,
            }
        }
    }
}
