//! # presence-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `MemberRepository`: members and their status fields
//!   - `DeviceRepository`: devices and their geofence maps
//!   - `StatusLogRepository`: append & replay the status audit log
//!   - `Notifier`: best-effort push delivery
//!   - `EventPublisher`: broadcast change events
//! - Define **driving/inbound ports** as use-case structs:
//!   - `MemberService`: register members, manual status writes
//!   - `DeviceService`: register devices, geofence reports, member assignment
//!   - `HoldTimeService`: replay the log into hold times
//!   - `StatusLogService`: daily snapshots and retention
//!   - `PresenceEngine`: react to geofence and status changes
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `presence-domain` only (plus `tokio` for channels and task fan-out).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod presence_engine;
pub mod services;

#[cfg(test)]
mod testing;
