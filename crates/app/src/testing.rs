//! In-memory port implementations shared by the service and engine tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use presence_domain::device::Device;
use presence_domain::error::PresenceError;
use presence_domain::event::PresenceEvent;
use presence_domain::geofence::GeofenceStatus;
use presence_domain::id::{DeviceId, MemberId};
use presence_domain::member::Member;
use presence_domain::status::{Status, UpdateOrigin};
use presence_domain::status_log::{LogDay, StatusLog, StatusLogEntry};
use presence_domain::time::Timestamp;

use crate::ports::{
    DeviceRepository, EventPublisher, MemberRepository, Notifier, PushNotification,
    StatusLogRepository,
};

#[derive(Clone, Default)]
pub struct InMemoryMemberRepo {
    pub store: Arc<Mutex<HashMap<MemberId, Member>>>,
}

impl InMemoryMemberRepo {
    pub fn with(members: impl IntoIterator<Item = Member>) -> Self {
        let repo = Self::default();
        repo.store
            .lock()
            .unwrap()
            .extend(members.into_iter().map(|m| (m.id, m)));
        repo
    }

    pub fn get(&self, id: MemberId) -> Member {
        self.store.lock().unwrap().get(&id).cloned().unwrap()
    }
}

impl MemberRepository for InMemoryMemberRepo {
    fn create(&self, member: Member) -> impl Future<Output = Result<Member, PresenceError>> + Send {
        self.store.lock().unwrap().insert(member.id, member.clone());
        async { Ok(member) }
    }

    fn get_by_id(
        &self,
        id: MemberId,
    ) -> impl Future<Output = Result<Option<Member>, PresenceError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Member>, PresenceError>> + Send {
        let mut result: Vec<Member> = self.store.lock().unwrap().values().cloned().collect();
        result.sort_by_key(|m| m.id);
        async { Ok(result) }
    }

    fn set_status(
        &self,
        id: MemberId,
        status: Status,
        origin: UpdateOrigin,
    ) -> impl Future<Output = Result<Option<Status>, PresenceError>> + Send {
        let mut store = self.store.lock().unwrap();
        let before = store.get_mut(&id).map(|m| {
            let before = m.status;
            m.status = status;
            m.last_update_is_auto = origin.is_auto();
            before
        });
        async move { Ok(before) }
    }

    fn set_last_status(
        &self,
        id: MemberId,
        last_status: Status,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        if let Some(m) = self.store.lock().unwrap().get_mut(&id) {
            m.last_status = Some(last_status);
            m.last_update_date = Some(at);
        }
        async { Ok(()) }
    }

    fn set_geofence_message(
        &self,
        id: MemberId,
        message: String,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        if let Some(m) = self.store.lock().unwrap().get_mut(&id) {
            m.geofence_message = Some(message);
        }
        async { Ok(()) }
    }

    fn delete(&self, id: MemberId) -> impl Future<Output = Result<(), PresenceError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeviceRepo {
    pub store: Arc<Mutex<HashMap<DeviceId, Device>>>,
}

impl InMemoryDeviceRepo {
    pub fn with(devices: impl IntoIterator<Item = Device>) -> Self {
        let repo = Self::default();
        repo.store
            .lock()
            .unwrap()
            .extend(devices.into_iter().map(|d| (d.id.clone(), d)));
        repo
    }

    pub fn get(&self, id: &str) -> Device {
        self.store
            .lock()
            .unwrap()
            .get(&DeviceId::new(id))
            .cloned()
            .unwrap()
    }
}

impl DeviceRepository for InMemoryDeviceRepo {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, PresenceError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(device.id.clone(), device.clone());
        async { Ok(device) }
    }

    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, PresenceError>> + Send {
        let result = self.store.lock().unwrap().get(id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, PresenceError>> + Send {
        let mut result: Vec<Device> = self.store.lock().unwrap().values().cloned().collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        async { Ok(result) }
    }

    fn find_by_member(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = Result<Vec<Device>, PresenceError>> + Send {
        let mut result: Vec<Device> = self
            .store
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.member_id == Some(member_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        async { Ok(result) }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, PresenceError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(device.id.clone(), device.clone());
        async { Ok(device) }
    }

    fn set_geofence_status(
        &self,
        id: &DeviceId,
        status: GeofenceStatus,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        if let Some(d) = self.store.lock().unwrap().get_mut(id) {
            d.geofence_status = status;
        }
        async { Ok(()) }
    }

    fn merge_geofence_status(
        &self,
        id: &DeviceId,
        updates: GeofenceStatus,
    ) -> impl Future<Output = Result<Option<GeofenceStatus>, PresenceError>> + Send {
        let merged = self.store.lock().unwrap().get_mut(id).map(|d| {
            d.geofence_status.merge(&updates);
            d.geofence_status.clone()
        });
        async { Ok(merged) }
    }

    fn set_member(
        &self,
        id: &DeviceId,
        member_id: Option<MemberId>,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        if let Some(d) = self.store.lock().unwrap().get_mut(id) {
            d.member_id = member_id;
        }
        async { Ok(()) }
    }

    fn touch(
        &self,
        id: &DeviceId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        if let Some(d) = self.store.lock().unwrap().get_mut(id) {
            d.last_update_date = Some(at);
        }
        async { Ok(()) }
    }

    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<(), PresenceError>> + Send {
        self.store.lock().unwrap().remove(id);
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStatusLogRepo {
    pub entries: Arc<Mutex<Vec<StatusLogEntry>>>,
}

impl InMemoryStatusLogRepo {
    pub fn with(entries: impl IntoIterator<Item = StatusLogEntry>) -> Self {
        let repo = Self::default();
        repo.entries.lock().unwrap().extend(entries);
        repo
    }

    pub fn all(&self) -> Vec<StatusLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl StatusLogRepository for InMemoryStatusLogRepo {
    fn append(
        &self,
        entry: StatusLogEntry,
    ) -> impl Future<Output = Result<StatusLogEntry, PresenceError>> + Send {
        self.entries.lock().unwrap().push(entry.clone());
        async { Ok(entry) }
    }

    fn load_range(
        &self,
        member_id: MemberId,
        first: LogDay,
        last: LogDay,
    ) -> impl Future<Output = Result<StatusLog, PresenceError>> + Send {
        let log: StatusLog = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.member_id == member_id && e.day() >= first && e.day() <= last)
            .cloned()
            .collect();
        async { Ok(log) }
    }

    fn purge_before(
        &self,
        before: Timestamp,
    ) -> impl Future<Output = Result<u64, PresenceError>> + Send {
        let mut entries = self.entries.lock().unwrap();
        let len = entries.len();
        entries.retain(|e| e.date >= before);
        let removed = (len - entries.len()) as u64;
        async move { Ok(removed) }
    }
}

#[derive(Clone, Default)]
pub struct SpyPublisher {
    pub events: Arc<Mutex<Vec<PresenceEvent>>>,
}

impl SpyPublisher {
    pub fn published(&self) -> Vec<PresenceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(
        &self,
        event: PresenceEvent,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct SpyNotifier {
    pub sent: Arc<Mutex<Vec<(Vec<String>, PushNotification)>>>,
    pub fail: bool,
}

impl SpyNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(Vec<String>, PushNotification)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for SpyNotifier {
    fn send(
        &self,
        tokens: Vec<String>,
        notification: PushNotification,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send {
        let fail = self.fail;
        if !fail {
            self.sent.lock().unwrap().push((tokens, notification));
        }
        async move {
            if fail {
                Err(PresenceError::Notification("gateway unreachable".into()))
            } else {
                Ok(())
            }
        }
    }
}
