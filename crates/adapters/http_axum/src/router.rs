//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use presence_app::ports::{DeviceRepository, EventPublisher, MemberRepository, StatusLogRepository};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` and includes a [`TraceLayer`] that logs
/// each HTTP request/response at the `DEBUG` level.
pub fn build<MR, DR, LR, EP>(state: AppState<MR, DR, LR, EP>) -> Router
where
    MR: MemberRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    LR: StatusLogRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
