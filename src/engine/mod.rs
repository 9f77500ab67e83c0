//! NDP responder and proxy engine
//!
//! Wires capture listeners to reply workers and manages their
//! lifecycle. A responder answers solicitations on one interface; a
//! proxy relays discovery between two.

mod listener;
mod proxy;
mod questions;
mod responder;
mod types;
mod worker;

pub use proxy::{Proxy, ProxyConfig};
pub use responder::{Responder, ResponderConfig};
pub use types::{CapturedRequest, NdpMessage, PendingQuestion, Whitelist, is_ipv6, parse_filter};
