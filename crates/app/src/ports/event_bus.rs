//! Event bus port: publish/subscribe for change events.

use std::future::Future;

use presence_domain::error::PresenceError;
use presence_domain::event::PresenceEvent;

/// Publishes change events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: PresenceEvent)
    -> impl Future<Output = Result<(), PresenceError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: PresenceEvent,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        (**self).publish(event)
    }
}
