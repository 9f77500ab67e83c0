//! Two-interface proxy lifecycle

use super::listener::Listener;
use super::types::{QUEUE_DEPTH, SHUTDOWN_TIMEOUT, Whitelist};
use super::worker::ReplyWorker;
use crate::Result;
use crate::capture::{Ipv6TxSocket, NdpCaptureSocket};
use crate::monitor::InterfaceMonitor;
use crate::protocol::icmpv6::NdpMessageType;
use crate::telemetry::EngineMetrics;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Settings for a two-interface proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Side the solicitations to be filtered arrive on.
    pub wan_iface: String,
    /// Side holding the hosts being advertised.
    pub lan_iface: String,
    /// Whitelist entries, each a semicolon-separated network list.
    pub filter: Vec<String>,
    /// Whitelist whatever networks this interface currently has.
    pub autosense: Option<String>,
    /// Keep following address changes after startup.
    pub monitor_changes: bool,
}

/// Relays neighbor discovery across two interfaces: solicitations
/// heard on one side are re-asked on the other, and the advertisements
/// that come back are returned to the original asker.
///
/// Four worker pairs run concurrently, one per (interface, message
/// type). Two question channels carry the asker bookkeeping, each
/// linking one side's solicitation leg to the other side's
/// advertisement leg.
pub struct Proxy {
    wan_iface: String,
    lan_iface: String,
    whitelist: Whitelist,
    monitor_changes: bool,
    monitor: Arc<InterfaceMonitor>,
    metrics: Arc<EngineMetrics>,
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
    registered: Vec<String>,
}

impl Proxy {
    pub fn new(
        config: ProxyConfig,
        monitor: Arc<InterfaceMonitor>,
        metrics: Arc<EngineMetrics>,
    ) -> Result<Self> {
        let whitelist = Whitelist::from_settings(&config.filter, config.autosense.as_deref())?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            wan_iface: config.wan_iface,
            lan_iface: config.lan_iface,
            whitelist,
            monitor_changes: config.monitor_changes,
            monitor,
            metrics,
            shutdown,
            tasks: JoinSet::new(),
            registered: Vec::new(),
        })
    }

    /// Validate both interfaces, register them with the address
    /// monitor and spawn all four worker pairs.
    pub async fn start(&mut self) -> Result<()> {
        if self.whitelist.is_all() {
            warn!(
                wan = %self.wan_iface,
                lan = %self.lan_iface,
                "no whitelist configured, proxying every solicitation"
            );
        }

        self.register_interfaces()?;

        let wan = self.wan_iface.clone();
        let lan = self.lan_iface.clone();

        let wan_sol = NdpCaptureSocket::open(&wan, NdpMessageType::NeighborSolicitation)?;
        let lan_sol = NdpCaptureSocket::open(&lan, NdpMessageType::NeighborSolicitation)?;
        let wan_adv = NdpCaptureSocket::open(&wan, NdpMessageType::NeighborAdvertisement)?;
        let lan_adv = NdpCaptureSocket::open(&lan, NdpMessageType::NeighborAdvertisement)?;
        let wan_mac = wan_sol.mac_addr();
        let lan_mac = lan_sol.mac_addr();

        let (wan_questions_tx, wan_questions_rx) = mpsc::channel(QUEUE_DEPTH);
        let (lan_questions_tx, lan_questions_rx) = mpsc::channel(QUEUE_DEPTH);

        // Solicitations heard on the wan side are re-asked on the lan
        // side; only this leg is subject to the whitelist.
        let worker = ReplyWorker::forward_solicitations(
            &lan,
            lan_mac,
            self.whitelist.clone(),
            Arc::clone(&self.monitor),
            wan_questions_tx,
            Arc::clone(&self.metrics),
        );
        self.spawn_leg(
            wan_sol,
            &wan,
            NdpMessageType::NeighborSolicitation,
            worker,
            Ipv6TxSocket::open(&lan)?,
        );

        // Advertisements heard on the lan side go back to whoever
        // asked on the wan side.
        let worker = ReplyWorker::forward_advertisements(
            &wan,
            wan_mac,
            Arc::clone(&self.monitor),
            wan_questions_rx,
            Arc::clone(&self.metrics),
        );
        self.spawn_leg(
            lan_adv,
            &lan,
            NdpMessageType::NeighborAdvertisement,
            worker,
            Ipv6TxSocket::open(&wan)?,
        );

        // The reverse direction is wired the same way, unfiltered.
        let worker = ReplyWorker::forward_solicitations(
            &wan,
            wan_mac,
            Whitelist::All,
            Arc::clone(&self.monitor),
            lan_questions_tx,
            Arc::clone(&self.metrics),
        );
        self.spawn_leg(
            lan_sol,
            &lan,
            NdpMessageType::NeighborSolicitation,
            worker,
            Ipv6TxSocket::open(&wan)?,
        );

        let worker = ReplyWorker::forward_advertisements(
            &lan,
            lan_mac,
            Arc::clone(&self.monitor),
            lan_questions_rx,
            Arc::clone(&self.metrics),
        );
        self.spawn_leg(
            wan_adv,
            &wan,
            NdpMessageType::NeighborAdvertisement,
            worker,
            Ipv6TxSocket::open(&lan)?,
        );

        info!(wan = %wan, lan = %lan, "proxy started");
        Ok(())
    }

    /// The whitelist reads the autosense interface's live networks on
    /// every request, so that interface is watched unconditionally;
    /// `monitor_changes` only governs the proxy's own interfaces.
    fn register_interfaces(&mut self) -> Result<()> {
        for iface in [self.wan_iface.clone(), self.lan_iface.clone()] {
            self.monitor.register(&iface, self.monitor_changes)?;
            self.registered.push(iface);
        }
        if let Whitelist::Autosense(source) = self.whitelist.clone() {
            self.monitor.register(&source, true)?;
            self.registered.push(source);
        }
        Ok(())
    }

    fn spawn_leg(
        &mut self,
        capture: NdpCaptureSocket,
        capture_iface: &str,
        msg_type: NdpMessageType,
        worker: ReplyWorker,
        tx_socket: Ipv6TxSocket,
    ) {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let listener = Listener::new(
            capture,
            capture_iface,
            msg_type,
            tx,
            Arc::clone(&self.metrics),
        );

        self.tasks.spawn(listener.run(self.shutdown.subscribe()));
        self.tasks.spawn(worker.run(tx_socket, rx, self.shutdown.subscribe()));
    }

    /// Signal all eight workers and wait for them to finish. Returns
    /// false when the grace period expires first. Both interfaces are
    /// always deregistered from the monitor.
    pub async fn stop(mut self) -> bool {
        let _ = self.shutdown.send(true);

        let finished = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !finished {
            warn!(
                wan = %self.wan_iface,
                lan = %self.lan_iface,
                timeout = ?SHUTDOWN_TIMEOUT,
                "workers still running, giving up on them"
            );
        }

        for iface in &self.registered {
            self.monitor.deregister(iface).await;
        }
        finished
    }
}
