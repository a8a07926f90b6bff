//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use presence_domain::error::PresenceError;
use presence_domain::event::PresenceEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<PresenceEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(
        &self,
        event: PresenceEvent,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        // Zero receivers is the only failure mode.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_domain::geofence::GeofenceStatus;
    use presence_domain::id::{DeviceId, MemberId};
    use presence_domain::region::GeofenceRegion;
    use presence_domain::status::Status;

    fn status_changed(after: Status) -> PresenceEvent {
        PresenceEvent::MemberStatusChanged {
            member_id: MemberId::new(1),
            before: Status::Away,
            after,
        }
    }

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        let event = PresenceEvent::GeofenceStatusChanged {
            device_id: DeviceId::new("ios-1"),
            before: GeofenceStatus::all_clear(),
            after: GeofenceStatus::all_clear().with(GeofenceRegion::CampusMain, true),
        };
        bus.publish(event.clone()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(status_changed(Status::Present)).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap(), status_changed(Status::Present));
        assert_eq!(rx2.recv().await.unwrap(), status_changed(Status::Present));
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        let result = bus.publish(status_changed(Status::Present)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(status_changed(Status::InClass)).await.unwrap();

        let mut rx = bus.subscribe();
        bus.publish(status_changed(Status::Present)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), status_changed(Status::Present));
    }
}
