//! # presence-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `presence-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! Timestamps are stored as text in the domain's fixed-width format, so
//! string comparison orders them chronologically.
//!
//! ## Dependency rule
//! Depends on `presence-app` (for port traits) and `presence-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod device_repo;
mod error;
mod member_repo;
mod pool;
mod status_log_repo;

pub use device_repo::SqliteDeviceRepository;
pub use error::StorageError;
pub use member_repo::SqliteMemberRepository;
pub use pool::{Config, Database};
pub use status_log_repo::SqliteStatusLogRepository;

use presence_domain::time::{Timestamp, format_timestamp, parse_timestamp};

fn encode_timestamp(ts: Option<Timestamp>) -> Option<String> {
    ts.as_ref().map(format_timestamp)
}

fn decode_timestamp(raw: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    raw.as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}
