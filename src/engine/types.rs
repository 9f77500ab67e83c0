//! Types shared between listeners and responders

use crate::monitor::InterfaceMonitor;
use crate::protocol::icmpv6::{NdpMessageType, NeighborAdvertisement, NeighborSolicitation};
use crate::{Error, Result};
use ipnet::Ipv6Net;
use std::net::Ipv6Addr;
use std::time::Duration;

/// Depth of the bounded channels linking listeners to reply workers.
pub(crate) const QUEUE_DEPTH: usize = 100;

/// How long `stop` waits for workers before reporting failure.
pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// A parsed Neighbor Discovery message, either direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NdpMessage {
    Solicitation(NeighborSolicitation),
    Advertisement(NeighborAdvertisement),
}

impl NdpMessage {
    pub fn msg_type(&self) -> NdpMessageType {
        match self {
            NdpMessage::Solicitation(_) => NdpMessageType::NeighborSolicitation,
            NdpMessage::Advertisement(_) => NdpMessageType::NeighborAdvertisement,
        }
    }

    /// The address being asked about or advertised
    pub fn target_addr(&self) -> Ipv6Addr {
        match self {
            NdpMessage::Solicitation(ns) => ns.target_addr,
            NdpMessage::Advertisement(na) => na.target_addr,
        }
    }
}

/// One captured NDP request, handed from a listener to a responder.
/// Fields are copied out of the capture buffer, so the request owns
/// its data and can cross a channel boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    pub message: NdpMessage,
    pub src_ip: Ipv6Addr,
    pub dst_ip: Ipv6Addr,
    /// Interface the frame was captured on
    pub iface: String,
    /// Raw ICMPv6 bytes, checksum untouched
    pub payload: Vec<u8>,
}

/// A solicitation forwarded to the other side of a proxy, waiting
/// for the matching advertisement to come back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingQuestion {
    pub target_addr: Ipv6Addr,
    pub asked_by: Ipv6Addr,
}

/// Which target addresses a responder answers for
#[derive(Debug, Clone)]
pub enum Whitelist {
    /// Every target
    All,
    /// Targets inside one of these networks
    Static(Vec<Ipv6Net>),
    /// Targets covered by the networks currently assigned to the
    /// named interface
    Autosense(String),
}

impl Whitelist {
    pub fn permits(&self, target: &Ipv6Addr, monitor: &InterfaceMonitor) -> bool {
        match self {
            Whitelist::All => true,
            Whitelist::Static(networks) => networks.iter().any(|net| net.contains(target)),
            Whitelist::Autosense(iface) => monitor
                .snapshot(iface)
                .is_some_and(|snap| snap.covers(target)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Whitelist::All)
    }

    /// Build a whitelist from validated settings. A static filter and
    /// autosense cannot be combined; with neither, every target is
    /// answered.
    pub fn from_settings(filter: &[String], autosense: Option<&str>) -> Result<Whitelist> {
        match (filter.is_empty(), autosense) {
            (false, Some(_)) => Err(Error::Config(
                "filter and autosense are mutually exclusive".to_string(),
            )),
            (false, None) => {
                let mut networks = Vec::new();
                for entry in filter {
                    networks.extend(parse_filter(entry)?);
                }
                Ok(Whitelist::Static(networks))
            }
            (true, Some(iface)) => Ok(Whitelist::Autosense(iface.to_string())),
            (true, None) => Ok(Whitelist::All),
        }
    }
}

/// Returns true when `s` is a literal IPv6 address.
pub fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

/// Parse a semicolon-separated list of IPv6 networks. A bare address
/// counts as a /128.
pub fn parse_filter(filter: &str) -> Result<Vec<Ipv6Net>> {
    let mut networks = Vec::new();

    for part in filter.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (addr_part, prefix_part) = match part.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (part, None),
        };

        let Ok(addr) = addr_part.parse::<Ipv6Addr>() else {
            return Err(Error::Config(format!(
                "filter entry '{}' is not an IPv6 network",
                part
            )));
        };

        let prefix = match prefix_part {
            Some(p) => p.parse::<u8>().map_err(|_| {
                Error::Config(format!("filter entry '{}' has an invalid prefix", part))
            })?,
            None => 128,
        };
        let net = Ipv6Net::new(addr, prefix)
            .map_err(|_| Error::Config(format!("filter entry '{}' has an invalid prefix", part)))?;
        networks.push(net.trunc());
    }

    Ok(networks)
}
