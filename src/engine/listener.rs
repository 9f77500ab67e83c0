//! Capture-side worker: turns raw frames into requests

use super::types::{CapturedRequest, NdpMessage};
use crate::capture::{CAPTURE_LEN, NdpCaptureSocket};
use crate::protocol::MacAddr;
use crate::protocol::ethernet::{self, ETHERTYPE_IPV6, Frame};
use crate::protocol::icmpv6::{
    self, Icmpv6Packet, NdpMessageType, NeighborAdvertisement, NeighborSolicitation,
};
use crate::protocol::ipv6::{self, Ipv6Header, NEXT_HEADER_ICMPV6};
use crate::telemetry::EngineMetrics;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, trace};

/// Shortest frame carrying a complete solicitation or advertisement
pub(crate) const MIN_FRAME_LEN: usize =
    ethernet::HEADER_SIZE + ipv6::HEADER_SIZE + icmpv6::NDP_MSG_SIZE;

/// Reads NDP frames of one type off one interface and feeds them to a
/// responder over a bounded channel.
pub struct Listener {
    socket: NdpCaptureSocket,
    iface: String,
    msg_type: NdpMessageType,
    tx: mpsc::Sender<CapturedRequest>,
    metrics: Arc<EngineMetrics>,
}

impl Listener {
    pub fn new(
        socket: NdpCaptureSocket,
        iface: &str,
        msg_type: NdpMessageType,
        tx: mpsc::Sender<CapturedRequest>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            socket,
            iface: iface.to_string(),
            msg_type,
            tx,
            metrics,
        }
    }

    /// Capture until the shutdown signal fires or the responder side
    /// goes away. A full queue drops the frame rather than blocking
    /// the capture loop.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let own_mac = self.socket.mac_addr();
        let mut buf = [0u8; CAPTURE_LEN];

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!(iface = %self.iface, msg_type = ?self.msg_type, "listener stopping");
                    break;
                }
                result = self.socket.recv(&mut buf) => {
                    let len = match result {
                        Ok(len) => len,
                        Err(e) => {
                            error!(iface = %self.iface, error = %e, "capture read failed");
                            break;
                        }
                    };

                    let Some(request) =
                        decode_request(&buf[..len], own_mac, self.msg_type, &self.iface)
                    else {
                        continue;
                    };

                    match self.msg_type {
                        NdpMessageType::NeighborSolicitation => {
                            self.metrics.solicitations_received.inc()
                        }
                        NdpMessageType::NeighborAdvertisement => {
                            self.metrics.advertisements_received.inc()
                        }
                    }
                    trace!(
                        iface = %self.iface,
                        target = %request.message.target_addr(),
                        src = %request.src_ip,
                        "captured request"
                    );

                    match self.tx.try_send(request) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            self.metrics.queue_drops.inc();
                            debug!(iface = %self.iface, "request queue full, dropping frame");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => break,
                    }
                }
            }
        }
    }
}

/// Validate one captured frame and copy its fields out into an owned
/// request. Anything malformed, self-originated or of the wrong type
/// is discarded.
fn decode_request(
    buf: &[u8],
    own_mac: MacAddr,
    msg_type: NdpMessageType,
    iface: &str,
) -> Option<CapturedRequest> {
    if buf.len() < MIN_FRAME_LEN {
        return None;
    }

    let frame = Frame::parse(buf).ok()?;
    if frame.src_mac() == own_mac {
        return None;
    }
    if frame.ethertype() != ETHERTYPE_IPV6 {
        return None;
    }

    let header = Ipv6Header::parse(frame.payload()).ok()?;
    if header.next_header() != NEXT_HEADER_ICMPV6 {
        return None;
    }

    let payload = header.payload();
    let packet = Icmpv6Packet::parse(payload).ok()?;
    if packet.msg_type() != msg_type as u8 {
        return None;
    }

    let message = match msg_type {
        NdpMessageType::NeighborSolicitation => {
            NdpMessage::Solicitation(NeighborSolicitation::parse(packet.body()).ok()?)
        }
        NdpMessageType::NeighborAdvertisement => {
            let na = NeighborAdvertisement::parse(packet.body()).ok()?;
            // An advertisement with no semantic flags carries no
            // usable answer.
            if !(na.router_flag || na.solicited_flag || na.override_flag) {
                return None;
            }
            NdpMessage::Advertisement(na)
        }
    };

    Some(CapturedRequest {
        message,
        src_ip: header.src_addr(),
        dst_ip: header.dst_addr(),
        iface: iface.to_string(),
        payload: payload.to_vec(),
    })
}
