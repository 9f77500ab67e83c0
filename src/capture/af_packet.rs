//! AF_PACKET capture socket with a Neighbor Discovery BPF filter

use crate::protocol::ethernet::ETHERTYPE_IPV6;
use crate::protocol::icmpv6::NdpMessageType;
use crate::protocol::ipv6::NEXT_HEADER_ICMPV6;
use crate::protocol::MacAddr;
use crate::{Error, Result};
use std::ffi::CString;
use std::os::unix::io::RawFd;
use tokio::io::unix::AsyncFd;

/// Accepted frames are truncated by the filter to Ethernet + IPv6 +
/// ICMPv6 NDP message + one 8-byte link-layer option.
pub const CAPTURE_LEN: usize = 86;

/// AF_PACKET socket bound to one interface, delivering only Neighbor
/// Solicitations or only Neighbor Advertisements
pub struct NdpCaptureSocket {
    async_fd: AsyncFd<RawFd>,
    ifindex: i32,
    mac: MacAddr,
}

impl NdpCaptureSocket {
    /// Open a capture socket on the given interface for one NDP message type
    pub fn open(ifname: &str, msg_type: NdpMessageType) -> Result<Self> {
        let fd = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (libc::ETH_P_IPV6 as u16).to_be() as i32,
            )
        };

        if fd < 0 {
            return Err(Error::Io(std::io::Error::last_os_error()));
        }

        let ifindex = match get_ifindex(fd, ifname) {
            Ok(idx) => idx,
            Err(e) => {
                unsafe { libc::close(fd) };
                return Err(e);
            }
        };

        let mac = match get_hwaddr(fd, ifname) {
            Ok(mac) => mac,
            Err(e) => {
                unsafe { libc::close(fd) };
                return Err(e);
            }
        };

        // Attach the filter before bind so no unfiltered frame is ever queued
        if let Err(e) = attach_ndp_filter(fd, msg_type) {
            unsafe { libc::close(fd) };
            return Err(e);
        }

        // Bind to interface
        let sockaddr = libc::sockaddr_ll {
            sll_family: libc::AF_PACKET as u16,
            sll_protocol: (libc::ETH_P_IPV6 as u16).to_be(),
            sll_ifindex: ifindex,
            sll_hatype: 0,
            sll_pkttype: 0,
            sll_halen: 0,
            sll_addr: [0; 8],
        };

        let ret = unsafe {
            libc::bind(
                fd,
                &sockaddr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<libc::sockaddr_ll>() as u32,
            )
        };

        if ret < 0 {
            unsafe { libc::close(fd) };
            return Err(Error::Io(std::io::Error::last_os_error()));
        }

        // Set non-blocking
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };

        // Enable promiscuous mode for the lifetime of the socket
        if let Err(e) = set_promisc(fd, ifindex, true) {
            unsafe { libc::close(fd) };
            return Err(e);
        }

        let async_fd = match AsyncFd::new(fd) {
            Ok(async_fd) => async_fd,
            Err(e) => {
                let _ = set_promisc(fd, ifindex, false);
                unsafe { libc::close(fd) };
                return Err(Error::Io(e));
            }
        };

        Ok(Self {
            async_fd,
            ifindex,
            mac,
        })
    }

    /// Receive one frame (async)
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let mut guard = self.async_fd.readable_mut().await.map_err(Error::Io)?;

            match guard.try_io(|inner| {
                let fd = *inner.get_ref();
                let n = unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut _, buf.len(), 0) };
                if n < 0 {
                    Err(std::io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            }) {
                Ok(Ok(len)) => return Ok(len),
                Ok(Err(e)) => return Err(Error::Io(e)),
                Err(_would_block) => continue,
            }
        }
    }

    /// Hardware address of the bound interface
    pub fn mac_addr(&self) -> MacAddr {
        self.mac
    }
}

impl Drop for NdpCaptureSocket {
    fn drop(&mut self) {
        let _ = set_promisc(*self.async_fd.get_ref(), self.ifindex, false);
        unsafe { libc::close(*self.async_fd.get_ref()) };
    }
}

/// Classic BPF program: EtherType == IPv6, next header == ICMPv6,
/// ICMPv6 type == the requested NDP message type. Matches are truncated
/// to CAPTURE_LEN bytes.
fn ndp_filter(msg_type: NdpMessageType) -> [libc::sock_filter; 8] {
    let accept = libc::sock_filter {
        code: 0x06,
        jt: 0,
        jf: 0,
        k: CAPTURE_LEN as u32,
    };
    let reject = libc::sock_filter {
        code: 0x06,
        jt: 0,
        jf: 0,
        k: 0,
    };

    [
        // ldh [12] (EtherType)
        libc::sock_filter {
            code: 0x28,
            jt: 0,
            jf: 0,
            k: 12,
        },
        // jne #0x86dd, reject
        libc::sock_filter {
            code: 0x15,
            jt: 0,
            jf: 5,
            k: ETHERTYPE_IPV6 as u32,
        },
        // ldb [20] (IPv6 next header)
        libc::sock_filter {
            code: 0x30,
            jt: 0,
            jf: 0,
            k: 20,
        },
        // jne #58, reject
        libc::sock_filter {
            code: 0x15,
            jt: 0,
            jf: 3,
            k: NEXT_HEADER_ICMPV6 as u32,
        },
        // ldb [54] (ICMPv6 type)
        libc::sock_filter {
            code: 0x30,
            jt: 0,
            jf: 0,
            k: 54,
        },
        // jne #msg_type, reject
        libc::sock_filter {
            code: 0x15,
            jt: 0,
            jf: 1,
            k: msg_type as u32,
        },
        accept,
        reject,
    ]
}

fn attach_ndp_filter(fd: RawFd, msg_type: NdpMessageType) -> Result<()> {
    let mut filter = ndp_filter(msg_type);
    let prog = libc::sock_fprog {
        len: filter.len() as u16,
        filter: filter.as_mut_ptr(),
    };

    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ATTACH_FILTER,
            &prog as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::sock_fprog>() as u32,
        )
    };

    if ret < 0 {
        return Err(Error::Io(std::io::Error::last_os_error()));
    }

    Ok(())
}

fn ifreq_for(ifname: &str) -> Result<libc::ifreq> {
    let ifname_c = CString::new(ifname).map_err(|_| Error::InterfaceNotFound {
        name: ifname.to_string(),
    })?;

    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    let name_bytes = ifname_c.as_bytes_with_nul();
    if name_bytes.len() > ifr.ifr_name.len() {
        return Err(Error::InterfaceNotFound {
            name: ifname.to_string(),
        });
    }
    ifr.ifr_name[..name_bytes.len()].copy_from_slice(unsafe {
        std::slice::from_raw_parts(name_bytes.as_ptr() as *const i8, name_bytes.len())
    });

    Ok(ifr)
}

pub(crate) fn get_ifindex(fd: RawFd, ifname: &str) -> Result<i32> {
    let mut ifr = ifreq_for(ifname)?;

    let ret = unsafe { libc::ioctl(fd, libc::SIOCGIFINDEX, &mut ifr) };
    if ret < 0 {
        return Err(Error::InterfaceNotFound {
            name: ifname.to_string(),
        });
    }

    Ok(unsafe { ifr.ifr_ifru.ifru_ifindex })
}

pub(crate) fn get_hwaddr(fd: RawFd, ifname: &str) -> Result<MacAddr> {
    let mut ifr = ifreq_for(ifname)?;

    let ret = unsafe { libc::ioctl(fd, libc::SIOCGIFHWADDR, &mut ifr) };
    if ret < 0 {
        return Err(Error::InterfaceNotFound {
            name: ifname.to_string(),
        });
    }

    let sa_data = unsafe { ifr.ifr_ifru.ifru_hwaddr.sa_data };
    let mut mac = [0u8; 6];
    for (i, byte) in sa_data[..6].iter().enumerate() {
        mac[i] = *byte as u8;
    }

    Ok(MacAddr(mac))
}

fn set_promisc(fd: RawFd, ifindex: i32, enable: bool) -> Result<()> {
    let mreq = libc::packet_mreq {
        mr_ifindex: ifindex,
        mr_type: libc::PACKET_MR_PROMISC as u16,
        mr_alen: 0,
        mr_address: [0; 8],
    };

    let optname = if enable {
        libc::PACKET_ADD_MEMBERSHIP
    } else {
        libc::PACKET_DROP_MEMBERSHIP
    };

    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_PACKET,
            optname,
            &mreq as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::packet_mreq>() as u32,
        )
    };

    if ret < 0 {
        return Err(Error::Io(std::io::Error::last_os_error()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_selects_message_type() {
        let sol = ndp_filter(NdpMessageType::NeighborSolicitation);
        let adv = ndp_filter(NdpMessageType::NeighborAdvertisement);

        assert_eq!(sol[5].k, 135);
        assert_eq!(adv[5].k, 136);
        // Everything but the type comparison is shared
        for i in [0, 1, 2, 3, 4, 6, 7] {
            assert_eq!(sol[i].code, adv[i].code);
            assert_eq!(sol[i].k, adv[i].k);
        }
    }

    #[test]
    fn test_filter_accept_and_reject_returns() {
        let prog = ndp_filter(NdpMessageType::NeighborSolicitation);
        assert_eq!(prog[6].code, 0x06);
        assert_eq!(prog[6].k, CAPTURE_LEN as u32);
        assert_eq!(prog[7].code, 0x06);
        assert_eq!(prog[7].k, 0);
    }

    #[test]
    fn test_filter_jumps_target_reject() {
        let prog = ndp_filter(NdpMessageType::NeighborAdvertisement);
        // Each jeq falls through on match and jumps to the final reject
        // instruction on mismatch.
        for (idx, insn) in prog.iter().enumerate() {
            if insn.code == 0x15 {
                assert_eq!(idx + 1 + insn.jf as usize, 7);
            }
        }
    }
}
