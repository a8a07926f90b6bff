//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod members;

use axum::Router;
use axum::routing::{get, put};

use presence_app::ports::{DeviceRepository, EventPublisher, MemberRepository, StatusLogRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<MR, DR, LR, EP>() -> Router<AppState<MR, DR, LR, EP>>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Members
        .route(
            "/members",
            get(members::list::<MR, DR, LR, EP>).post(members::create::<MR, DR, LR, EP>),
        )
        .route(
            "/members/{id}",
            get(members::get::<MR, DR, LR, EP>).delete(members::delete::<MR, DR, LR, EP>),
        )
        .route(
            "/members/{id}/status",
            put(members::set_status::<MR, DR, LR, EP>),
        )
        .route(
            "/members/{id}/hold-time",
            get(members::hold_time::<MR, DR, LR, EP>),
        )
        .route(
            "/members/{id}/logs/{day}",
            get(members::day_log::<MR, DR, LR, EP>),
        )
        // Devices
        .route(
            "/devices",
            get(devices::list::<MR, DR, LR, EP>).post(devices::register::<MR, DR, LR, EP>),
        )
        .route(
            "/devices/{id}",
            get(devices::get::<MR, DR, LR, EP>).delete(devices::delete::<MR, DR, LR, EP>),
        )
        .route(
            "/devices/{id}/geofence",
            put(devices::report_geofence::<MR, DR, LR, EP>),
        )
        .route(
            "/devices/{id}/member",
            put(devices::assign_member::<MR, DR, LR, EP>),
        )
}
