//! Single-interface responder lifecycle

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

/// Settings for a single-interface responder.
#[derive(Debug, Clone, Default)]
pub struct ResponderConfig {
    pub iface: String,
    /// Whitelist entries, each a semicolon-separated network list.
    /// Empty means answer for every address.
    pub filter: Vec<String>,
    /// Answer for whatever networks this interface currently has.
    pub autosense: Option<String>,
    /// Keep following address changes after startup.
    pub monitor_changes: bool,
}

/// Answers neighbor solicitations seen on one interface.
///
/// `start` spawns a capture worker and a reply worker; `stop` signals
/// both and reports whether they wound down within the grace period.
pub struct Responder {
    iface: String,
    whitelist: Whitelist,
    monitor_changes: bool,
    monitor: Arc<InterfaceMonitor>,
    metrics: Arc<EngineMetrics>,
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
    registered: Vec<String>,
}

impl Responder {
    pub fn new(
        config: ResponderConfig,
        monitor: Arc<InterfaceMonitor>,
        metrics: Arc<EngineMetrics>,
    ) -> Result<Self> {
        let whitelist = Whitelist::from_settings(&config.filter, config.autosense.as_deref())?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            iface: config.iface,
            whitelist,
            monitor_changes: config.monitor_changes,
            monitor,
            metrics,
            shutdown,
            tasks: JoinSet::new(),
            registered: Vec::new(),
        })
    }

    /// Validate the interface, register it with the address monitor
    /// and spawn the workers. Returns once everything is running.
    pub async fn start(&mut self) -> Result<()> {
        if self.whitelist.is_all() {
            warn!(
                iface = %self.iface,
                "no whitelist configured, answering for every address"
            );
        }

        self.register_interfaces()?;

        let capture =
            NdpCaptureSocket::open(&self.iface, NdpMessageType::NeighborSolicitation)?;
        let tx_socket = Ipv6TxSocket::open(&self.iface)?;
        let own_mac = capture.mac_addr();

        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let listener = Listener::new(
            capture,
            &self.iface,
            NdpMessageType::NeighborSolicitation,
            tx,
            Arc::clone(&self.metrics),
        );
        let worker = ReplyWorker::answer(
            &self.iface,
            own_mac,
            self.whitelist.clone(),
            Arc::clone(&self.monitor),
            Arc::clone(&self.metrics),
        );

        self.tasks.spawn(listener.run(self.shutdown.subscribe()));
        self.tasks.spawn(worker.run(tx_socket, rx, self.shutdown.subscribe()));

        info!(iface = %self.iface, "responder started");
        Ok(())
    }

    /// The whitelist reads the autosense interface's live networks on
    /// every request, so that interface is watched unconditionally;
    /// `monitor_changes` only governs the responder's own interface.
    fn register_interfaces(&mut self) -> Result<()> {
        self.monitor.register(&self.iface, self.monitor_changes)?;
        self.registered.push(self.iface.clone());
        if let Whitelist::Autosense(source) = &self.whitelist {
            self.monitor.register(source, true)?;
            self.registered.push(source.clone());
        }
        Ok(())
    }

    /// Signal the workers and wait for them to finish. Returns false
    /// when the grace period expires first. The interface is always
    /// deregistered from the monitor.
    pub async fn stop(mut self) -> bool {
        let _ = self.shutdown.send(true);

        let finished = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !finished {
            warn!(
                iface = %self.iface,
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
