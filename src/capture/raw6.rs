//! Raw IPv6 transmit socket

use super::af_packet::get_ifindex;
use crate::{Error, Result};
use std::net::Ipv6Addr;
use std::os::unix::io::RawFd;
use tokio::io::unix::AsyncFd;

/// AF_INET6 raw socket bound to one device, used to transmit fully
/// formed IPv6 packets (header included, IPPROTO_RAW)
pub struct Ipv6TxSocket {
    async_fd: AsyncFd<RawFd>,
    ifindex: i32,
}

impl Ipv6TxSocket {
    /// Open a transmit socket bound to the given interface
    pub fn open(ifname: &str) -> Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_INET6, libc::SOCK_RAW, libc::IPPROTO_RAW) };

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

        let ret = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_BINDTODEVICE,
                ifname.as_ptr() as *const libc::c_void,
                ifname.len() as u32,
            )
        };

        if ret < 0 {
            unsafe { libc::close(fd) };
            return Err(Error::Io(std::io::Error::last_os_error()));
        }

        // Set non-blocking
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };

        let async_fd = match AsyncFd::new(fd) {
            Ok(async_fd) => async_fd,
            Err(e) => {
                unsafe { libc::close(fd) };
                return Err(Error::Io(e));
            }
        };

        Ok(Self { async_fd, ifindex })
    }

    /// Send a complete IPv6 packet to the given destination (async)
    pub async fn send_to(&mut self, packet: &[u8], dst: Ipv6Addr) -> Result<usize> {
        let mut sockaddr: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
        sockaddr.sin6_family = libc::AF_INET6 as u16;
        sockaddr.sin6_addr = libc::in6_addr {
            s6_addr: dst.octets(),
        };
        // Scope disambiguates link-local and multicast destinations
        sockaddr.sin6_scope_id = self.ifindex as u32;

        loop {
            let mut guard = self.async_fd.writable_mut().await.map_err(Error::Io)?;

            match guard.try_io(|inner| {
                let fd = *inner.get_ref();
                let n = unsafe {
                    libc::sendto(
                        fd,
                        packet.as_ptr() as *const _,
                        packet.len(),
                        0,
                        &sockaddr as *const _ as *const libc::sockaddr,
                        std::mem::size_of::<libc::sockaddr_in6>() as u32,
                    )
                };
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
}

impl Drop for Ipv6TxSocket {
    fn drop(&mut self) {
        unsafe { libc::close(*self.async_fd.get_ref()) };
    }
}
