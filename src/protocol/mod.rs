//! Wire formats for the Neighbor Discovery fast path

pub mod ethernet;
pub mod icmpv6;
pub mod ipv6;
pub mod types;

pub use types::*;
