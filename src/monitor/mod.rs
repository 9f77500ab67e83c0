//! Interface address tracking.
//!
//! Every responder and proxy registers the interfaces it answers from.
//! The monitor scans their addresses once at registration and, for
//! interfaces registered as watched, rescans whenever rtnetlink
//! reports an address change. A single netlink task serves all
//! registrations and is started lazily with the first one.

mod netlink;
mod scan;

pub use scan::AddrSnapshot;

use crate::{Error, Result};
use netlink::{AddressEvent, NetlinkSocket};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct MonitoredEntry {
    ifindex: u32,
    refs: usize,
    watched: bool,
    snapshot: Arc<AddrSnapshot>,
}

struct NetlinkTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct InterfaceMonitor {
    entries: RwLock<HashMap<String, MonitoredEntry>>,
    netlink_task: Mutex<Option<NetlinkTask>>,
}

impl InterfaceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `ifname`. Registrations are refcounted, so a
    /// proxy and a responder sharing an interface each register it.
    /// `watched` interfaces are rescanned on address changes; once any
    /// registration asks for watching, the interface stays watched.
    pub fn register(self: &Arc<Self>, ifname: &str, watched: bool) -> Result<()> {
        let ifindex = nix::net::if_::if_nametoindex(ifname).map_err(|_| {
            Error::InterfaceNotFound {
                name: ifname.to_string(),
            }
        })?;

        {
            let mut entries = self.entries.write().unwrap();
            if let Some(entry) = entries.get_mut(ifname) {
                entry.refs += 1;
                entry.watched |= watched;
                debug!(iface = ifname, refs = entry.refs, "interface already tracked");
                return Ok(());
            }
        }

        self.ensure_netlink_task()?;

        let snapshot = scan::scan_interface(ifname)?;
        debug!(
            iface = ifname,
            gua = ?snapshot.gua,
            ula = ?snapshot.ula,
            networks = snapshot.networks.len(),
            "scanned interface addresses"
        );

        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(ifname.to_string()).or_insert(MonitoredEntry {
            ifindex: ifindex as u32,
            refs: 0,
            watched,
            snapshot: Arc::new(snapshot),
        });
        entry.refs += 1;
        entry.watched |= watched;
        info!(iface = ifname, watched = entry.watched, "tracking interface");
        Ok(())
    }

    /// Drop one registration of `ifname`. The last deregistration of
    /// the last interface also stops the netlink task.
    pub async fn deregister(&self, ifname: &str) {
        let stop_task = {
            let mut entries = self.entries.write().unwrap();
            match entries.get_mut(ifname) {
                Some(entry) => {
                    entry.refs -= 1;
                    if entry.refs == 0 {
                        entries.remove(ifname);
                        info!(iface = ifname, "stopped tracking interface");
                    }
                }
                None => warn!(iface = ifname, "deregister for untracked interface"),
            }
            entries.is_empty()
        };

        if stop_task {
            self.stop_netlink_task().await;
        }
    }

    /// Current address snapshot for a tracked interface
    pub fn snapshot(&self, ifname: &str) -> Option<Arc<AddrSnapshot>> {
        self.entries
            .read()
            .unwrap()
            .get(ifname)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    fn ensure_netlink_task(self: &Arc<Self>) -> Result<()> {
        let mut task = self.netlink_task.lock().unwrap();
        if task.is_some() {
            return Ok(());
        }

        let socket = NetlinkSocket::open()?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(run_netlink(monitor, socket, stop_rx));
        *task = Some(NetlinkTask {
            stop: stop_tx,
            handle,
        });
        info!("address change monitor started");
        Ok(())
    }

    async fn stop_netlink_task(&self) {
        let task = self.netlink_task.lock().unwrap().take();
        if let Some(task) = task {
            let _ = task.stop.send(true);
            if let Err(e) = task.handle.await {
                warn!(error = %e, "address change monitor task failed");
            }
            info!("address change monitor stopped");
        }
    }

    fn handle_event(&self, event: &AddressEvent) {
        if !event.is_ipv6() {
            return;
        }

        let name = {
            let entries = self.entries.read().unwrap();
            entries
                .iter()
                .find(|(_, entry)| entry.ifindex == event.ifindex && entry.watched)
                .map(|(name, _)| name.clone())
        };
        let Some(name) = name else { return };

        // Rescan outside the lock; getifaddrs walks the whole table.
        match scan::scan_interface(&name) {
            Ok(snapshot) => {
                debug!(
                    iface = %name,
                    added = event.added,
                    gua = ?snapshot.gua,
                    ula = ?snapshot.ula,
                    "interface addresses changed"
                );
                let mut entries = self.entries.write().unwrap();
                if let Some(entry) = entries.get_mut(&name) {
                    entry.snapshot = Arc::new(snapshot);
                }
            }
            Err(e) => warn!(iface = %name, error = %e, "address rescan failed"),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_watched(&self, ifname: &str) -> Option<bool> {
        self.entries
            .read()
            .unwrap()
            .get(ifname)
            .map(|entry| entry.watched)
    }

    #[cfg(test)]
    pub(crate) fn insert_for_tests(&self, ifname: &str, snapshot: AddrSnapshot) {
        self.entries.write().unwrap().insert(
            ifname.to_string(),
            MonitoredEntry {
                ifindex: 0,
                refs: 1,
                watched: false,
                snapshot: Arc::new(snapshot),
            },
        );
    }
}

async fn run_netlink(
    monitor: Arc<InterfaceMonitor>,
    mut socket: NetlinkSocket,
    mut stop: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; netlink::RECV_BUF_LEN];
    loop {
        tokio::select! {
            _ = stop.changed() => break,
            result = socket.next_events(&mut buf) => match result {
                Ok(events) => {
                    for event in &events {
                        monitor.handle_event(event);
                    }
                }
                Err(e) => {
                    error!(error = %e, "netlink receive failed");
                    break;
                }
            }
        }
    }
}
