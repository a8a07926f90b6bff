//! Notifier port: best-effort push notification delivery.

use std::future::Future;

use presence_domain::error::PresenceError;

/// Content of a push notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    /// Extra key/values delivered alongside the message.
    pub data: serde_json::Value,
}

/// Delivers push notifications to device tokens.
///
/// Delivery is fire-and-forget from the caller's point of view: an error
/// is reported so it can be logged, never retried.
pub trait Notifier {
    /// Send `notification` to every token in `tokens`.
    fn send(
        &self,
        tokens: Vec<String>,
        notification: PushNotification,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;
}

impl<T: Notifier + Send + Sync> Notifier for std::sync::Arc<T> {
    fn send(
        &self,
        tokens: Vec<String>,
        notification: PushNotification,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        (**self).send(tokens, notification)
    }
}
