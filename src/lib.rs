//! ndpxd - IPv6 Neighbor Discovery responder and proxy
//!
//! Answers neighbor solicitations on behalf of addresses that live
//! elsewhere, or relays discovery between two interfaces, so routed
//! hosts stay reachable from segments expecting on-link neighbors.

pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod protocol;
pub mod telemetry;

pub use error::{Error, Result};
