//! Storage port: repository traits for persistence.
//!
//! Status fields are written field by field rather than as whole records so
//! that concurrent reactions touching different fields of the same member or
//! device never overwrite each other.

use std::future::Future;

use presence_domain::device::Device;
use presence_domain::error::PresenceError;
use presence_domain::geofence::GeofenceStatus;
use presence_domain::id::{DeviceId, MemberId};
use presence_domain::member::Member;
use presence_domain::status::{Status, UpdateOrigin};
use presence_domain::status_log::{LogDay, StatusLog, StatusLogEntry};
use presence_domain::time::Timestamp;

/// Persistence for members and their status fields.
pub trait MemberRepository {
    /// Persist a new member.
    fn create(&self, member: Member) -> impl Future<Output = Result<Member, PresenceError>> + Send;

    /// Look up a member by id.
    fn get_by_id(
        &self,
        id: MemberId,
    ) -> impl Future<Output = Result<Option<Member>, PresenceError>> + Send;

    /// List every member.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Member>, PresenceError>> + Send;

    /// Write `status` together with its origin flag.
    ///
    /// Returns the status held before the write, or `None` when the member
    /// does not exist (nothing is written).
    fn set_status(
        &self,
        id: MemberId,
        status: Status,
        origin: UpdateOrigin,
    ) -> impl Future<Output = Result<Option<Status>, PresenceError>> + Send;

    /// Record the outcome of the latest transition.
    fn set_last_status(
        &self,
        id: MemberId,
        last_status: Status,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    /// Replace the human-readable geofence message.
    fn set_geofence_message(
        &self,
        id: MemberId,
        message: String,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    /// Delete a member.
    fn delete(&self, id: MemberId) -> impl Future<Output = Result<(), PresenceError>> + Send;
}

/// Persistence for devices.
pub trait DeviceRepository {
    /// Persist a new device.
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, PresenceError>> + Send;

    /// Look up a device by id.
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, PresenceError>> + Send;

    /// List every device.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, PresenceError>> + Send;

    /// Devices currently assigned to `member_id`.
    fn find_by_member(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = Result<Vec<Device>, PresenceError>> + Send;

    /// Overwrite a whole device record.
    fn update(&self, device: Device) -> impl Future<Output = Result<Device, PresenceError>> + Send;

    /// Replace the geofence map.
    fn set_geofence_status(
        &self,
        id: &DeviceId,
        status: GeofenceStatus,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    /// Overlay `updates` onto the stored geofence map in a single write and
    /// return the resulting map, or `None` when the device does not exist.
    ///
    /// Regions absent from `updates` keep whatever is stored at write time.
    fn merge_geofence_status(
        &self,
        id: &DeviceId,
        updates: GeofenceStatus,
    ) -> impl Future<Output = Result<Option<GeofenceStatus>, PresenceError>> + Send;

    /// Change the assigned member.
    fn set_member(
        &self,
        id: &DeviceId,
        member_id: Option<MemberId>,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    /// Stamp `last_update_date`.
    fn touch(
        &self,
        id: &DeviceId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    /// Delete a device.
    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<(), PresenceError>> + Send;
}

/// Append-only status audit log.
pub trait StatusLogRepository {
    /// Append an entry to the end of its day bucket.
    fn append(
        &self,
        entry: StatusLogEntry,
    ) -> impl Future<Output = Result<StatusLogEntry, PresenceError>> + Send;

    /// Load a member's buckets from `first` to `last` inclusive.
    fn load_range(
        &self,
        member_id: MemberId,
        first: LogDay,
        last: LogDay,
    ) -> impl Future<Output = Result<StatusLog, PresenceError>> + Send;

    /// Remove every entry recorded before `before`, returning how many went.
    fn purge_before(
        &self,
        before: Timestamp,
    ) -> impl Future<Output = Result<u64, PresenceError>> + Send;
}
