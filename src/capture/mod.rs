//! Raw socket plumbing
//!
//! Everything that talks to the kernel's packet layer lives here: the
//! AF_PACKET capture socket with its attached BPF filter, and the raw
//! IPv6 socket replies go out of.

mod af_packet;
mod raw6;

pub use af_packet::{CAPTURE_LEN, NdpCaptureSocket};
pub use raw6::Ipv6TxSocket;
