//! Shared application state for axum handlers.

use std::sync::Arc;

use presence_app::ports::{DeviceRepository, EventPublisher, MemberRepository, StatusLogRepository};
use presence_app::services::device_service::DeviceService;
use presence_app::services::hold_time_service::HoldTimeService;
use presence_app::services::member_service::MemberService;

/// Application state shared across all axum handlers.
///
/// Generic over the repository types and the event publisher to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying
/// types themselves do not need to be `Clone`; only the `Arc` wrappers
/// are cloned.
pub struct AppState<MR, DR, LR, EP> {
    /// Member registration and manual status writes.
    pub member_service: Arc<MemberService<MR, EP>>,
    /// Device registration, geofence reports and assignment.
    pub device_service: Arc<DeviceService<DR, MR, EP>>,
    /// Hold-time queries over the status log.
    pub hold_time_service: Arc<HoldTimeService<LR>>,
}

impl<MR, DR, LR, EP> Clone for AppState<MR, DR, LR, EP> {
    fn clone(&self) -> Self {
        Self {
            member_service: Arc::clone(&self.member_service),
            device_service: Arc::clone(&self.device_service),
            hold_time_service: Arc::clone(&self.hold_time_service),
        }
    }
}

impl<MR, DR, LR, EP> AppState<MR, DR, LR, EP>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        member_service: MemberService<MR, EP>,
        device_service: DeviceService<DR, MR, EP>,
        hold_time_service: HoldTimeService<LR>,
    ) -> Self {
        Self {
            member_service: Arc::new(member_service),
            device_service: Arc::new(device_service),
            hold_time_service: Arc::new(hold_time_service),
        }
    }
}
