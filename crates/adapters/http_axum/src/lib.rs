//! # presence-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **REST-ish JSON API** for programmatic access
//!   (`/api/members`, `/api/devices`, `/api/members/{id}/hold-time`, …)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application results and errors into JSON responses
//!
//! Status writes made through this API are *manual*: they clear the
//! automatic-update flag, which arms the geofence reset on a manual `Away`.
//! Geofence reports go through the same path a phone would use.
//!
//! ## Dependency rule
//! Depends on `presence-app` (for port traits and services) and `presence-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
