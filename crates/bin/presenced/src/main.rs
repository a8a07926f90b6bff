//! # presenced: presence daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Start the presence engine on the event bus and the daily log jobs
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;
mod jobs;

use std::sync::Arc;
use std::time::Duration;

use presence_adapter_http_axum::state::AppState;
use presence_adapter_push_http::{HttpPushNotifier, LogNotifier, PushNotifier};
use presence_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteDeviceRepository, SqliteMemberRepository,
    SqliteStatusLogRepository,
};
use presence_app::event_bus::InProcessEventBus;
use presence_app::presence_engine::PresenceEngine;
use presence_app::services::device_service::DeviceService;
use presence_app::services::hold_time_service::HoldTimeService;
use presence_app::services::member_service::MemberService;
use presence_app::services::status_log_service::StatusLogService;
use presence_domain::time::Clock;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_target(true)
        .init();

    let clock = Clock::system(config.utc_offset()?);

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let member_repo = SqliteMemberRepository::new(pool.clone());
    let device_repo = SqliteDeviceRepository::new(pool.clone());
    let log_repo = SqliteStatusLogRepository::new(pool);

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));
    let events = event_bus.subscribe();

    // Notifications
    let notifier = match config.push.endpoint.as_deref() {
        Some(endpoint) => {
            tracing::info!(endpoint, "push gateway configured");
            PushNotifier::Http(HttpPushNotifier::new(
                endpoint,
                Duration::from_secs(config.push.timeout_secs),
            )?)
        }
        None => PushNotifier::Log(LogNotifier),
    };

    // Presence engine
    let engine = Arc::new(PresenceEngine::new(
        member_repo.clone(),
        device_repo.clone(),
        log_repo.clone(),
        notifier,
        Arc::clone(&event_bus),
        clock,
        config.presence.locale,
    ));
    let engine_task = tokio::spawn(engine.run(events));

    // Daily jobs
    let jobs_task = tokio::spawn(jobs::run_daily(
        StatusLogService::new(member_repo.clone(), log_repo.clone(), clock),
        clock,
        config.jobs.daily_snapshot,
        config.jobs.retention_months,
    ));

    // HTTP
    let state = AppState::new(
        MemberService::new(member_repo.clone(), Arc::clone(&event_bus)),
        DeviceService::new(device_repo, member_repo, Arc::clone(&event_bus), clock),
        HoldTimeService::new(log_repo),
    );
    let app = presence_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "presenced listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    jobs_task.abort();
    engine_task.abort();
    tracing::info!("presenced stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
