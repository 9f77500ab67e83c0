//! Reply-side worker: validates requests and emits answers

use super::questions::PendingQuestions;
use super::types::{CapturedRequest, NdpMessage, PendingQuestion, Whitelist};
use crate::capture::Ipv6TxSocket;
use crate::monitor::InterfaceMonitor;
use crate::protocol::MacAddr;
use crate::protocol::icmpv6::{self, NeighborAdvertisement, NeighborSolicitation};
use crate::protocol::ipv6::{Ipv6Builder, NEXT_HEADER_ICMPV6};
use crate::telemetry::EngineMetrics;
use std::net::Ipv6Addr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

/// A built packet ready for the raw transmit socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutboundPacket {
    pub dst: Ipv6Addr,
    pub packet: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplyMode {
    /// Answer solicitations directly on the capture interface.
    Answer,
    /// Re-emit solicitations on the paired interface, recording who
    /// asked so the returning advertisement can be routed back.
    ForwardSolicitation,
    /// Re-emit advertisements to whichever peer asked for the target.
    ForwardAdvertisement,
}

/// Consumes captured requests for one egress interface and produces
/// outbound NDP packets. Advertisement-forwarding workers additionally
/// consume the question channel fed by the opposite direction.
pub(crate) struct ReplyWorker {
    iface: String,
    mode: ReplyMode,
    own_mac: MacAddr,
    whitelist: Whitelist,
    monitor: Arc<InterfaceMonitor>,
    questions_tx: Option<mpsc::Sender<PendingQuestion>>,
    questions_rx: Option<mpsc::Receiver<PendingQuestion>>,
    pending: PendingQuestions,
    metrics: Arc<EngineMetrics>,
}

impl ReplyWorker {
    pub fn answer(
        iface: &str,
        own_mac: MacAddr,
        whitelist: Whitelist,
        monitor: Arc<InterfaceMonitor>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            iface: iface.to_string(),
            mode: ReplyMode::Answer,
            own_mac,
            whitelist,
            monitor,
            questions_tx: None,
            questions_rx: None,
            pending: PendingQuestions::new(),
            metrics,
        }
    }

    pub fn forward_solicitations(
        iface: &str,
        own_mac: MacAddr,
        whitelist: Whitelist,
        monitor: Arc<InterfaceMonitor>,
        questions: mpsc::Sender<PendingQuestion>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            iface: iface.to_string(),
            mode: ReplyMode::ForwardSolicitation,
            own_mac,
            whitelist,
            monitor,
            questions_tx: Some(questions),
            questions_rx: None,
            pending: PendingQuestions::new(),
            metrics,
        }
    }

    pub fn forward_advertisements(
        iface: &str,
        own_mac: MacAddr,
        monitor: Arc<InterfaceMonitor>,
        questions: mpsc::Receiver<PendingQuestion>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            iface: iface.to_string(),
            mode: ReplyMode::ForwardAdvertisement,
            own_mac,
            whitelist: Whitelist::All,
            monitor,
            questions_tx: None,
            questions_rx: Some(questions),
            pending: PendingQuestions::new(),
            metrics,
        }
    }

    /// Serve requests until shutdown fires or the listener side goes
    /// away. Questions from the paired solicitation leg are folded
    /// into the pending list as they arrive.
    pub async fn run(
        mut self,
        mut socket: Ipv6TxSocket,
        mut rx: mpsc::Receiver<CapturedRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut questions_rx = self.questions_rx.take();

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!(iface = %self.iface, "reply worker stopping");
                    break;
                }
                Some(question) = recv_question(&mut questions_rx) => {
                    self.pending.push(question);
                }
                request = rx.recv() => {
                    let Some(request) = request else { break };
                    let Some(out) = self.process(&request) else { continue };

                    match socket.send_to(&out.packet, out.dst).await {
                        Ok(_) => self.metrics.packets_sent.inc(),
                        Err(e) => {
                            self.metrics.tx_errors.inc();
                            warn!(
                                iface = %self.iface,
                                dst = %out.dst,
                                error = %e,
                                "send failed"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Run one request through the reply pipeline. Returns the packet
    /// to transmit, or `None` when the request is dropped.
    pub(crate) fn process(&mut self, req: &CapturedRequest) -> Option<OutboundPacket> {
        if !icmpv6::validate_checksum(&req.src_ip, &req.dst_ip, &req.payload) {
            self.metrics.checksum_drops.inc();
            trace!(iface = %self.iface, src = %req.src_ip, "dropping request with bad checksum");
            return None;
        }

        let target = req.message.target_addr();
        // Link-local addresses are only valid on their own segment,
        // never answered for.
        if target.is_unicast_link_local() {
            return None;
        }

        if !self.whitelist.permits(&target, &self.monitor) {
            self.metrics.whitelist_drops.inc();
            debug!(iface = %self.iface, target = %target, "target not whitelisted");
            return None;
        }

        // A solicitation from the all-zero address is duplicate
        // address detection; the answer has to come from the all-zero
        // address as well.
        let source = if req.src_ip.is_unspecified() {
            Ipv6Addr::UNSPECIFIED
        } else {
            self.monitor
                .snapshot(&self.iface)
                .map(|snap| snap.source_for(&target))
                .unwrap_or(Ipv6Addr::UNSPECIFIED)
        };

        let (dst, mut bytes) = match self.mode {
            ReplyMode::Answer => (
                req.src_ip,
                NeighborAdvertisement::solicited_reply(target, self.own_mac).to_bytes(),
            ),
            ReplyMode::ForwardSolicitation => {
                if let Some(tx) = &self.questions_tx {
                    let question = PendingQuestion {
                        target_addr: target,
                        asked_by: req.src_ip,
                    };
                    if tx.try_send(question).is_err() {
                        self.metrics.queue_drops.inc();
                        debug!(iface = %self.iface, "question queue full, dropping");
                    }
                }
                (
                    req.dst_ip,
                    NeighborSolicitation::new(target, Some(self.own_mac)).to_bytes(),
                )
            }
            ReplyMode::ForwardAdvertisement => {
                let unsolicited_announcement = req.dst_ip.is_multicast()
                    && matches!(&req.message, NdpMessage::Advertisement(na) if !na.solicited_flag);

                let dst = if unsolicited_announcement {
                    req.dst_ip
                } else {
                    match self.pending.take(&target) {
                        Some(question) => question.asked_by,
                        None => {
                            self.metrics.uncorrelated_drops.inc();
                            debug!(
                                iface = %self.iface,
                                target = %target,
                                "nobody asked for this address"
                            );
                            return None;
                        }
                    }
                };
                (
                    dst,
                    NeighborAdvertisement::solicited_reply(target, self.own_mac).to_bytes(),
                )
            }
        };

        icmpv6::set_checksum(&mut bytes, &source, &dst);

        let packet = Ipv6Builder::new()
            .next_header(NEXT_HEADER_ICMPV6)
            .hop_limit(255)
            .src_addr(source)
            .dst_addr(dst)
            .payload(&bytes)
            .build();

        Some(OutboundPacket { dst, packet })
    }
}

async fn recv_question(
    rx: &mut Option<mpsc::Receiver<PendingQuestion>>,
) -> Option<PendingQuestion> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
