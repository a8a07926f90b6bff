//! Notifier that only writes to the log.

use std::future::Future;

use presence_app::ports::{Notifier, PushNotification};
use presence_domain::error::PresenceError;

/// Logs notifications instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(
        &self,
        tokens: Vec<String>,
        notification: PushNotification,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        tracing::info!(
            tokens = tokens.len(),
            title = %notification.title,
            body = %notification.body,
            "push gateway not configured, notification logged only"
        );
        async { Ok(()) }
    }
}
