//! # presence-domain
//!
//! Pure domain model for the presence tracking system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, wall-clock timestamps
//! - Define **Statuses** (the closed set of presence codes) and **Regions**
//!   (the closed set of geofence identifiers)
//! - Define **Members** (people whose presence is tracked) and **Devices**
//!   (phones reporting geofence membership on behalf of a member)
//! - Reduce a device's geofence map into a single presence signal
//! - Define the **status log** (append-only audit trail bucketed by day)
//!   and replay it into hold times
//! - Define **Events** (geofence and status changes that drive reactions)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod event;
pub mod geofence;
pub mod hold_time;
pub mod member;
pub mod region;
pub mod status;
pub mod status_log;
