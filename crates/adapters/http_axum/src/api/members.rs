//! JSON REST handlers for members, their status and their hold times.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use presence_app::ports::{DeviceRepository, EventPublisher, MemberRepository, StatusLogRepository};
use presence_domain::hold_time::HoldTimeQuery;
use presence_domain::id::MemberId;
use presence_domain::member::Member;
use presence_domain::status::{Status, UpdateOrigin};
use presence_domain::status_log::{LogDay, StatusLogEntry};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a member.
#[derive(Deserialize)]
pub struct CreateMemberRequest {
    pub id: i64,
    pub name: String,
    /// Initial status code, `Away` when omitted.
    pub status: Option<i64>,
}

/// Request body for a manual status write.
#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status: i64,
}

/// Query string of the hold-time endpoint. Fields are validated by
/// [`HoldTimeQuery::parse`] so a missing one becomes a 400, not a rejection.
#[derive(Deserialize)]
pub struct HoldTimeParams {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Hold-time answer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoldTimeResponse {
    pub member_id: MemberId,
    pub status: Status,
    pub start_date: String,
    pub end_date: String,
    pub minutes: u64,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Member>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and status endpoints.
pub enum GetResponse {
    Ok(Json<Member>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Member>),
}

impl IntoResponse for CreateResponse {
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

/// Possible responses from the hold-time endpoint.
pub enum HoldTimeResult {
    Ok(Json<HoldTimeResponse>),
}

impl IntoResponse for HoldTimeResult {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the day log endpoint.
pub enum DayLogResponse {
    Ok(Json<Vec<StatusLogEntry>>),
}

impl IntoResponse for DayLogResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/members`
pub async fn list<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
) -> Result<ListResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let members = state.member_service.list_members().await?;
    Ok(ListResponse::Ok(Json(members)))
}

/// `GET /api/members/{id}`
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
    let member_id: MemberId = id.parse()?;
    let member = state.member_service.get_member(member_id).await?;
    Ok(GetResponse::Ok(Json(member)))
}

/// `POST /api/members`
pub async fn create<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<CreateResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let mut builder = Member::builder().id(MemberId::new(req.id)).name(req.name);
    if let Some(code) = req.status {
        builder = builder.status(Status::from_code(code)?);
    }

    let member = builder.build()?;
    let created = state.member_service.create_member(member).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/members/{id}/status`
///
/// A person setting their own status: the write is recorded as manual.
pub async fn set_status<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<GetResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let member_id: MemberId = id.parse()?;
    let status = Status::from_code(req.status)?;
    let member = state
        .member_service
        .set_status(member_id, status, UpdateOrigin::Manual)
        .await?;
    Ok(GetResponse::Ok(Json(member)))
}

/// `GET /api/members/{id}/hold-time?status=&start_date=&end_date=`
pub async fn hold_time<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Path(id): Path<String>,
    Query(params): Query<HoldTimeParams>,
) -> Result<HoldTimeResult, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let query = HoldTimeQuery::parse(
        Some(&id),
        params.status.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    )?;
    let minutes = state.hold_time_service.hold_time(&query).await?;
    Ok(HoldTimeResult::Ok(Json(HoldTimeResponse {
        member_id: query.member_id,
        status: query.status,
        start_date: query.start_date.to_string(),
        end_date: query.end_date.to_string(),
        minutes,
    })))
}

/// `GET /api/members/{id}/logs/{day}` with `day` as `YYYYMMDD`.
pub async fn day_log<MR, DR, LR, EP>(
    State(state): State<AppState<MR, DR, LR, EP>>,
    Path((id, day)): Path<(String, String)>,
) -> Result<DayLogResponse, ApiError>
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    let member_id: MemberId = id.parse()?;
    let day: LogDay = day.parse()?;
    let entries = state.hold_time_service.day_entries(member_id, day).await?;
    Ok(DayLogResponse::Ok(Json(entries)))
}

/// `DELETE /api/members/{id}`
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
    let member_id: MemberId = id.parse()?;
    state.member_service.delete_member(member_id).await?;
    Ok(DeleteResponse::NoContent)
}
