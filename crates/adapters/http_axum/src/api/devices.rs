//! JSON REST handlers for devices.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use presence_app::ports::{DeviceRepository, EventPublisher, MemberRepository, StatusLogRepository};
use presence_domain::device::Device;
use presence_domain::geofence::GeofenceStatus;
use presence_domain::id::{DeviceId, MemberId};

use crate::error::ApiError;
use crate::state::AppState;

/// Raw `region id → inside` map as sent by the phone.
type RawGeofence = BTreeMap<String, bool>;

fn parse_geofence(raw: &RawGeofence) -> Result<GeofenceStatus, ApiError> {
    GeofenceStatus::from_raw(raw.iter().map(|(id, inside)| (id.as_str(), *inside)))
        .map_err(ApiError::from)
}

/// Request body for registering a device.
#[derive(Deserialize)]
pub struct RegisterDeviceRequest {
    pub id: String,
    pub member_id: Option<i64>,
    pub notification_token: Option<String>,
    #[serde(default)]
    pub geofence_status: RawGeofence,
}

/// Request body for changing a device's member.
#[derive(Deserialize)]
pub struct AssignMemberRequest {
    pub member_id: Option<i64>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints returning a single device.
pub enum GetResponse {
    Ok(Json<Device>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the register endpoint.
pub enum RegisterResponse {
    Created(Json<Device>),
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
) -> Result<ListResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let devices = state.device_service.list_devices().await?;
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/devices/{id}`
pub async fn get<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let device = state.device_service.get_device(&DeviceId::new(id)).await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/devices`
pub async fn register<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<RegisterResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let mut builder = Device::builder()
        .id(DeviceId::new(req.id))
        .geofence_status(parse_geofence(&req.geofence_status)?);
    if let Some(member_id) = req.member_id {
        builder = builder.member_id(MemberId::new(member_id));
    }
    if let Some(token) = req.notification_token {
        builder = builder.notification_token(token);
    }

    let device = builder.build()?;
    let registered = state.device_service.register_device(device).await?;
    Ok(RegisterResponse::Created(Json(registered)))
}

/// `PUT /api/devices/{id}/geofence`
///
/// Body is a partial `region id → inside` map; regions left out keep their value.
pub async fn report_geofence<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Path(id): Path<String>,
    Json(req): Json<RawGeofence>,
) -> Result<GetResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let report = parse_geofence(&req)?;
    let device = state
        .device_service
        .report_geofence(&DeviceId::new(id), &report)
        .await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `PUT /api/devices/{id}/member`
pub async fn assign_member<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Path(id): Path<String>,
    Json(req): Json<AssignMemberRequest>,
) -> Result<GetResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let device = state
        .device_service
        .assign_member(&DeviceId::new(id), req.member_id.map(MemberId::new))
        .await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `DELETE /api/devices/{id}`
pub async fn delete<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    state
        .device_service
        .delete_device(&DeviceId::new(id))
        .await?;
    Ok(DeleteResponse::NoContent)
}
