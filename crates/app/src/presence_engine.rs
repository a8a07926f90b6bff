//! Presence engine: the transition controller.
//!
//! Subscribes to the event bus and reacts to two kinds of change:
//!
//! - **Geofence change** on a device: derive presence from the new map and
//!   move the owning member between `Away` and `Present` automatically.
//! - **Status change** on a member: append to the audit log, and either
//!   reset the member's geofence maps (a manual `Away`) or notify the
//!   member's devices (an automatic change).
//!
//! The second rule is the feedback-loop guard. A manual `Away` clears every
//! geofence map of the member so a stale "inside" cannot immediately flip
//! them back to `Present`. Automatic writes never trigger a reset.
//!
//! Side effects inside one reaction run concurrently and fail independently:
//! a failing write is logged and never cancels its siblings.

use std::future::Future;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast;

use presence_domain::error::PresenceError;
use presence_domain::event::PresenceEvent;
use presence_domain::geofence::{GeofencePresence, GeofenceStatus, MessageLocale};
use presence_domain::id::{DeviceId, MemberId};
use presence_domain::status::{Status, UpdateOrigin};
use presence_domain::status_log::StatusLogEntry;
use presence_domain::time::Clock;

use crate::ports::{
    DeviceRepository, EventPublisher, MemberRepository, Notifier, PushNotification,
    StatusLogRepository,
};
use crate::services::device_service::write_geofence_status;
use crate::services::member_service::{StatusWrite, write_status};

/// Status the geofence rule moves a member to, if any.
///
/// Only a member who is `Away` is promoted to `Present`; any other status
/// (in class, on leave, ...) is never overridden by entering a region.
/// Leaving every region demotes from any status.
#[must_use]
pub fn transition_for(current: Status, presence: GeofencePresence) -> Option<Status> {
    if current == Status::Away && presence.any_entered {
        Some(Status::Present)
    } else if presence.none_entered {
        Some(Status::Away)
    } else {
        None
    }
}

/// Push notification announcing an automatic status change.
#[must_use]
pub fn status_notification(
    locale: MessageLocale,
    member_id: MemberId,
    status: Status,
) -> PushNotification {
    let (title, body) = match locale {
        MessageLocale::En => (
            "Status updated automatically".to_string(),
            format!("Your status was changed to \u{201c}{}\u{201d}.", status.label()),
        ),
        MessageLocale::Ja => (
            "ステータス自動更新".to_string(),
            format!("ステータスを「{}」に更新しました。", status.label_ja()),
        ),
    };
    PushNotification {
        title,
        body,
        data: json!({
            "member_id": member_id.as_i64(),
            "status": status.code(),
        }),
    }
}

/// What a geofence change led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceReaction {
    /// The device no longer exists.
    DeviceMissing,
    /// The device has no member; only its timestamp moved.
    Unassigned,
    /// The assigned member does not exist.
    MemberMissing(MemberId),
    /// Presence was evaluated for the member.
    Evaluated {
        member_id: MemberId,
        /// Status the rule asked for.
        transition: Option<Status>,
        /// Whether the stored status actually changed.
        changed: bool,
    },
}

/// What a member status change led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusReaction {
    pub logged: bool,
    /// Devices whose geofence map was reset.
    pub geofences_reset: usize,
    /// Tokens a notification was delivered to.
    pub notified: usize,
}

/// Reacts to [`PresenceEvent`]s.
pub struct PresenceEngine<MR, DR, LR, N, P> {
    members: MR,
    devices: DR,
    logs: LR,
    notifier: N,
    publisher: P,
    clock: Clock,
    locale: MessageLocale,
}

impl<MR, DR, LR, N, P> PresenceEngine<MR, DR, LR, N, P>
where
    MR: MemberRepository + Send + Sync,
    DR: DeviceRepository + Send + Sync,
    LR: StatusLogRepository + Send + Sync,
    N: Notifier + Send + Sync,
    P: EventPublisher + Send + Sync,
{
    pub fn new(
        members: MR,
        devices: DR,
        logs: LR,
        notifier: N,
        publisher: P,
        clock: Clock,
        locale: MessageLocale,
    ) -> Self {
        Self {
            members,
            devices,
            logs,
            notifier,
            publisher,
            clock,
            locale,
        }
    }

    /// Consume events until the bus closes, one task per event.
    ///
    /// When the receiver falls behind, the skipped events are logged and
    /// processing resumes with the oldest one still buffered.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<PresenceEvent>)
    where
        MR: 'static,
        DR: 'static,
        LR: 'static,
        N: 'static,
        P: 'static,
    {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let engine = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(err) = engine.process_event(&event).await {
                            tracing::error!(kind = event.kind(), error = ?err, "event reaction failed");
                        }
                    });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "presence engine lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("event bus closed, presence engine stopping");
                    break;
                }
            }
        }
    }

    /// Dispatch one event to its reaction.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the records a reaction starts from
    /// cannot be read.
    pub async fn process_event(&self, event: &PresenceEvent) -> Result<(), PresenceError> {
        match event {
            PresenceEvent::GeofenceStatusChanged {
                device_id, after, ..
            } => {
                let reaction = self.on_geofence_changed(device_id, after).await?;
                tracing::debug!(?reaction, "geofence change handled");
            }
            PresenceEvent::MemberStatusChanged {
                member_id,
                before,
                after,
            } => {
                let reaction = self
                    .on_member_status_changed(*member_id, *before, *after)
                    .await?;
                tracing::debug!(?reaction, "status change handled");
            }
        }
        Ok(())
    }

    /// React to a device's new geofence map.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the device or member cannot be read.
    #[tracing::instrument(skip(self, after))]
    pub async fn on_geofence_changed(
        &self,
        device_id: &DeviceId,
        after: &GeofenceStatus,
    ) -> Result<GeofenceReaction, PresenceError> {
        let Some(device) = self.devices.get_by_id(device_id).await? else {
            tracing::warn!("device not found");
            return Ok(GeofenceReaction::DeviceMissing);
        };
        let now = self.clock.now();
        let touch = isolated("touch device", self.devices.touch(device_id, now));

        let Some(member_id) = device.member_id else {
            touch.await;
            return Ok(GeofenceReaction::Unassigned);
        };
        let Some(member) = self.members.get_by_id(member_id).await? else {
            tracing::warn!(%member_id, "member not found");
            touch.await;
            return Ok(GeofenceReaction::MemberMissing(member_id));
        };

        let transition = transition_for(member.status, after.presence());
        let message = self.locale.geofence_message(after);

        let status_write = async {
            match transition {
                Some(status) => {
                    isolated(
                        "write automatic status",
                        write_status(
                            &self.members,
                            &self.publisher,
                            member_id,
                            status,
                            UpdateOrigin::Automatic,
                        ),
                    )
                    .await
                }
                None => None,
            }
        };
        let (written, (), ()) = tokio::join!(
            status_write,
            async {
                touch.await;
            },
            async {
                isolated(
                    "write geofence message",
                    self.members.set_geofence_message(member_id, message),
                )
                .await;
            },
        );

        Ok(GeofenceReaction::Evaluated {
            member_id,
            transition,
            changed: written.is_some_and(|w: StatusWrite| w.changed()),
        })
    }

    /// React to a member's status changing from `before` to `after`.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the member cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn on_member_status_changed(
        &self,
        member_id: MemberId,
        before: Status,
        after: Status,
    ) -> Result<StatusReaction, PresenceError> {
        let now = self.clock.now();
        let origin = match self.members.get_by_id(member_id).await? {
            Some(member) => Some(member.last_update_origin()),
            None => {
                tracing::warn!("member not found, audit only");
                None
            }
        };

        let (logged, _, geofences_reset, notified) = tokio::join!(
            isolated(
                "append status log",
                self.logs
                    .append(StatusLogEntry::new(member_id, now, after)),
            ),
            isolated(
                "write last status",
                self.members.set_last_status(member_id, before, now),
            ),
            async {
                if after == Status::Away && origin == Some(UpdateOrigin::Manual) {
                    self.reset_geofences(member_id).await
                } else {
                    0
                }
            },
            async {
                if origin == Some(UpdateOrigin::Automatic) {
                    self.notify(member_id, after).await
                } else {
                    0
                }
            },
        );

        Ok(StatusReaction {
            logged: logged.is_some(),
            geofences_reset,
            notified,
        })
    }

    async fn reset_geofences(&self, member_id: MemberId) -> usize {
        let Some(devices) = isolated(
            "list member devices",
            self.devices.find_by_member(member_id),
        )
        .await
        else {
            return 0;
        };
        let mut reset = 0;
        for device in &devices {
            let cleared = isolated(
                "reset geofence status",
                write_geofence_status(
                    &self.devices,
                    &self.publisher,
                    device,
                    GeofenceStatus::all_clear(),
                ),
            )
            .await;
            if cleared.is_some() {
                reset += 1;
            }
        }
        reset
    }

    async fn notify(&self, member_id: MemberId, status: Status) -> usize {
        let Some(devices) = isolated(
            "list member devices",
            self.devices.find_by_member(member_id),
        )
        .await
        else {
            return 0;
        };
        let tokens: Vec<String> = devices
            .into_iter()
            .filter_map(|d| d.notification_token)
            .collect();
        if tokens.is_empty() {
            return 0;
        }
        let count = tokens.len();
        let notification = status_notification(self.locale, member_id, status);
        match isolated("send notification", self.notifier.send(tokens, notification)).await {
            Some(()) => count,
            None => 0,
        }
    }
}

/// Await a side effect, logging and discarding its error.
async fn isolated<T>(
    what: &'static str,
    effect: impl Future<Output = Result<T, PresenceError>>,
) -> Option<T> {
    match effect.await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(effect = what, error = ?err, "side effect failed");
            None
        }
    }
}
