//! Interface address scanning and source selection

use crate::Result;
use ipnet::Ipv6Net;
use std::net::Ipv6Addr;

/// Addresses and networks assigned to one interface at scan time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddrSnapshot {
    /// Preferred global unicast address (link-local fallback)
    pub gua: Option<Ipv6Addr>,
    /// Preferred unique-local address, if any
    pub ula: Option<Ipv6Addr>,
    /// IPv6 networks the interface is attached to
    pub networks: Vec<Ipv6Net>,
}

impl AddrSnapshot {
    /// Pick the source address for a reply about `target`.
    ///
    /// Unique-local targets are answered from the unique-local address
    /// when one exists; everything else uses the global unicast pick.
    /// With no usable address at all the unspecified address is
    /// returned and the kernel is left to refuse or route it.
    pub fn source_for(&self, target: &Ipv6Addr) -> Ipv6Addr {
        if target.is_unique_local() {
            if let Some(ula) = self.ula {
                return ula;
            }
        }
        self.gua.unwrap_or(Ipv6Addr::UNSPECIFIED)
    }

    /// Whether any recorded network covers `addr`
    pub fn covers(&self, addr: &Ipv6Addr) -> bool {
        self.networks.iter().any(|net| net.contains(addr))
    }
}

/// Global unicast in the routing sense: anything that is not loopback,
/// multicast, link-local or unspecified. Unique-local addresses pass
/// this test and are claimed by the ULA slot first.
fn is_global_unicast(addr: &Ipv6Addr) -> bool {
    !(addr.is_loopback()
        || addr.is_multicast()
        || addr.is_unicast_link_local()
        || addr.is_unspecified())
}

/// Fold (address, prefix length) pairs into a snapshot. The first
/// address of each class wins.
fn build_snapshot(addrs: impl IntoIterator<Item = (Ipv6Addr, u8)>) -> AddrSnapshot {
    let mut gua: Option<Ipv6Addr> = None;
    let mut ula: Option<Ipv6Addr> = None;
    let mut link_local: Option<Ipv6Addr> = None;
    let mut networks: Vec<Ipv6Net> = Vec::new();

    for (addr, prefix_len) in addrs {
        if let Ok(net) = Ipv6Net::new(addr, prefix_len) {
            let net = net.trunc();
            if !networks.contains(&net) {
                networks.push(net);
            }
        }

        if addr.is_unique_local() {
            ula.get_or_insert(addr);
        } else if is_global_unicast(&addr) {
            gua.get_or_insert(addr);
        } else if addr.is_unicast_link_local() {
            link_local.get_or_insert(addr);
        }
    }

    AddrSnapshot {
        gua: gua.or(link_local),
        ula,
        networks,
    }
}

/// Scan the IPv6 addresses currently assigned to `ifname`.
///
/// An interface with no IPv6 addresses (or an unknown name) yields an
/// empty snapshot; existence is checked at registration, not here.
pub(crate) fn scan_interface(ifname: &str) -> Result<AddrSnapshot> {
    let addrs = nix::ifaddrs::getifaddrs().map_err(|e| crate::Error::Io(e.into()))?;

    let pairs = addrs.filter(|ifa| ifa.interface_name == ifname).filter_map(|ifa| {
        let addr = ifa.address.as_ref()?.as_sockaddr_in6()?.ip();
        let prefix_len = match ifa.netmask.as_ref().and_then(|m| m.as_sockaddr_in6()) {
            Some(mask) => u128::from(mask.ip()).count_ones() as u8,
            None => 128,
        };
        Some((addr, prefix_len))
    });

    Ok(build_snapshot(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Ipv6Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_snapshot_prefers_first_gua() {
        let snap = build_snapshot([
            (addr("fe80::1"), 64),
            (addr("2001:db8::10"), 64),
            (addr("2001:db8:1::10"), 64),
        ]);

        assert_eq!(snap.gua, Some(addr("2001:db8::10")));
        assert_eq!(snap.ula, None);
        assert_eq!(snap.networks.len(), 3);
    }

    #[test]
    fn test_snapshot_link_local_fallback() {
        let snap = build_snapshot([(addr("fe80::1"), 64)]);

        assert_eq!(snap.gua, Some(addr("fe80::1")));
        assert_eq!(snap.ula, None);
    }

    #[test]
    fn test_snapshot_ula_never_claims_gua_slot() {
        let snap = build_snapshot([(addr("fd00::5"), 64), (addr("fe80::1"), 64)]);

        assert_eq!(snap.ula, Some(addr("fd00::5")));
        assert_eq!(snap.gua, Some(addr("fe80::1")));
    }

    #[test]
    fn test_snapshot_both_classes() {
        let snap = build_snapshot([
            (addr("fd00::5"), 64),
            (addr("2001:db8::10"), 64),
            (addr("fe80::1"), 64),
        ]);

        assert_eq!(snap.gua, Some(addr("2001:db8::10")));
        assert_eq!(snap.ula, Some(addr("fd00::5")));
    }

    #[test]
    fn test_snapshot_loopback_excluded() {
        let snap = build_snapshot([(addr("::1"), 128)]);

        assert_eq!(snap.gua, None);
        assert_eq!(snap.ula, None);
        assert_eq!(snap.networks, vec!["::1/128".parse::<Ipv6Net>().unwrap()]);
    }

    #[test]
    fn test_snapshot_dedups_networks() {
        let snap = build_snapshot([(addr("2001:db8::10"), 64), (addr("2001:db8::11"), 64)]);

        assert_eq!(
            snap.networks,
            vec!["2001:db8::/64".parse::<Ipv6Net>().unwrap()]
        );
    }

    #[test]
    fn test_source_for_global_target() {
        let snap = build_snapshot([(addr("fd00::5"), 64), (addr("2001:db8::10"), 64)]);

        assert_eq!(snap.source_for(&addr("2001:db8::99")), addr("2001:db8::10"));
    }

    #[test]
    fn test_source_for_ula_target() {
        let snap = build_snapshot([(addr("fd00::5"), 64), (addr("2001:db8::10"), 64)]);

        assert_eq!(snap.source_for(&addr("fd12::99")), addr("fd00::5"));
    }

    #[test]
    fn test_source_for_ula_target_without_ula() {
        let snap = build_snapshot([(addr("2001:db8::10"), 64)]);

        assert_eq!(snap.source_for(&addr("fd12::99")), addr("2001:db8::10"));
    }

    #[test]
    fn test_source_for_empty_snapshot() {
        let snap = AddrSnapshot::default();

        assert_eq!(snap.source_for(&addr("2001:db8::1")), Ipv6Addr::UNSPECIFIED);
    }

    #[test]
    fn test_covers() {
        let snap = build_snapshot([(addr("2001:db8::10"), 64)]);

        assert!(snap.covers(&addr("2001:db8::ffff")));
        assert!(!snap.covers(&addr("2001:db9::1")));
    }

    #[test]
    fn test_scan_loopback() {
        // Whatever addresses lo carries, none of them qualify as a
        // global unicast or unique-local source.
        let snap = scan_interface("lo").unwrap();

        assert_eq!(snap.gua, None);
        assert_eq!(snap.ula, None);
    }

    #[test]
    fn test_scan_unknown_interface_is_empty() {
        let snap = scan_interface("does-not-exist0").unwrap();

        assert_eq!(snap, AddrSnapshot::default());
    }
}
