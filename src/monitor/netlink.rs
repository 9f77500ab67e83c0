//! Rtnetlink subscription for address change events

use crate::Result;
use std::io;
use std::mem;
use std::os::fd::RawFd;
use tokio::io::unix::AsyncFd;

/// Large enough for a full multipart address dump
pub(crate) const RECV_BUF_LEN: usize = 8192;

const NLMSG_HDR_LEN: usize = 16;
const IFADDRMSG_LEN: usize = 8;

/// One RTM_NEWADDR / RTM_DELADDR notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AddressEvent {
    pub ifindex: u32,
    pub family: u8,
    pub added: bool,
}

impl AddressEvent {
    pub fn is_ipv6(&self) -> bool {
        self.family == libc::AF_INET6 as u8
    }
}

/// Non-blocking NETLINK_ROUTE socket subscribed to the IPv4 and IPv6
/// address groups. Decoding skips IPv4 events later; subscribing to
/// both keeps the kernel from coalescing mixed batches oddly.
pub(crate) struct NetlinkSocket {
    async_fd: AsyncFd<RawFd>,
}

impl NetlinkSocket {
    pub fn open() -> Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_NETLINK, libc::SOCK_RAW, libc::NETLINK_ROUTE) };
        if fd < 0 {
            return Err(io::Error::last_os_error().into());
        }

        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        addr.nl_groups = (libc::RTMGRP_IPV4_IFADDR | libc::RTMGRP_IPV6_IFADDR) as u32;

        let rc = unsafe {
            libc::bind(
                fd,
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err.into());
        }

        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err.into());
        }

        let async_fd = match AsyncFd::new(fd) {
            Ok(async_fd) => async_fd,
            Err(e) => {
                unsafe { libc::close(fd) };
                return Err(e.into());
            }
        };

        Ok(Self { async_fd })
    }

    /// Wait for the next batch of notifications. Messages not sent by
    /// the kernel itself are discarded.
    pub async fn next_events(&mut self, buf: &mut [u8]) -> Result<Vec<AddressEvent>> {
        loop {
            let mut guard = self.async_fd.readable_mut().await?;

            match guard.try_io(|inner| {
                let fd = *inner.get_ref();
                let mut src: libc::sockaddr_nl = unsafe { mem::zeroed() };
                let mut src_len = mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;
                let n = unsafe {
                    libc::recvfrom(
                        fd,
                        buf.as_mut_ptr() as *mut libc::c_void,
                        buf.len(),
                        0,
                        &mut src as *mut libc::sockaddr_nl as *mut libc::sockaddr,
                        &mut src_len,
                    )
                };
                if n < 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok((n as usize, src.nl_pid))
            }) {
                Ok(Ok((len, src_pid))) => {
                    if src_pid != 0 {
                        continue;
                    }
                    return Ok(decode_events(&buf[..len]));
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }
}

impl Drop for NetlinkSocket {
    fn drop(&mut self) {
        unsafe { libc::close(*self.async_fd.get_ref()) };
    }
}

/// Walk a buffer of netlink messages and pull out the address events.
/// Malformed lengths end the walk; unrelated message types are skipped.
fn decode_events(buf: &[u8]) -> Vec<AddressEvent> {
    let mut events = Vec::new();
    let mut offset = 0usize;

    while offset + NLMSG_HDR_LEN <= buf.len() {
        let msg_len = u32::from_ne_bytes(buf[offset..offset + 4].try_into().unwrap()) as usize;
        let msg_type = u16::from_ne_bytes(buf[offset + 4..offset + 6].try_into().unwrap());

        if msg_len < NLMSG_HDR_LEN || offset + msg_len > buf.len() {
            break;
        }
        if msg_type == libc::NLMSG_DONE as u16 {
            break;
        }

        if (msg_type == libc::RTM_NEWADDR || msg_type == libc::RTM_DELADDR)
            && msg_len >= NLMSG_HDR_LEN + IFADDRMSG_LEN
        {
            let body = &buf[offset + NLMSG_HDR_LEN..];
            let family = body[0];
            let ifindex = u32::from_ne_bytes(body[4..8].try_into().unwrap());
            events.push(AddressEvent {
                ifindex,
                family,
                added: msg_type == libc::RTM_NEWADDR,
            });
        }

        // NLMSG_ALIGN
        offset += (msg_len + 3) & !3;
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr_msg(msg_type: u16, family: u8, ifindex: u32) -> Vec<u8> {
        let len = (NLMSG_HDR_LEN + IFADDRMSG_LEN) as u32;
        let mut buf = vec![0u8; len as usize];
        buf[0..4].copy_from_slice(&len.to_ne_bytes());
        buf[4..6].copy_from_slice(&msg_type.to_ne_bytes());
        buf[16] = family;
        buf[20..24].copy_from_slice(&ifindex.to_ne_bytes());
        buf
    }

    #[test]
    fn test_decode_new_address() {
        let buf = addr_msg(libc::RTM_NEWADDR, libc::AF_INET6 as u8, 3);
        let events = decode_events(&buf);

        assert_eq!(
            events,
            vec![AddressEvent {
                ifindex: 3,
                family: libc::AF_INET6 as u8,
                added: true,
            }]
        );
        assert!(events[0].is_ipv6());
    }

    #[test]
    fn test_decode_deleted_address() {
        let buf = addr_msg(libc::RTM_DELADDR, libc::AF_INET6 as u8, 7);
        let events = decode_events(&buf);

        assert_eq!(events.len(), 1);
        assert!(!events[0].added);
        assert_eq!(events[0].ifindex, 7);
    }

    #[test]
    fn test_decode_ipv4_event_kept_with_family() {
        let buf = addr_msg(libc::RTM_NEWADDR, libc::AF_INET as u8, 2);
        let events = decode_events(&buf);

        assert_eq!(events.len(), 1);
        assert!(!events[0].is_ipv6());
    }

    #[test]
    fn test_decode_batch() {
        let mut buf = addr_msg(libc::RTM_NEWADDR, libc::AF_INET6 as u8, 2);
        buf.extend_from_slice(&addr_msg(libc::RTM_DELADDR, libc::AF_INET6 as u8, 5));
        let events = decode_events(&buf);

        assert_eq!(events.len(), 2);
        assert!(events[0].added);
        assert!(!events[1].added);
    }

    #[test]
    fn test_decode_stops_at_done() {
        let mut buf = vec![0u8; NLMSG_HDR_LEN];
        buf[0..4].copy_from_slice(&(NLMSG_HDR_LEN as u32).to_ne_bytes());
        buf[4..6].copy_from_slice(&(libc::NLMSG_DONE as u16).to_ne_bytes());
        buf.extend_from_slice(&addr_msg(libc::RTM_NEWADDR, libc::AF_INET6 as u8, 2));

        assert!(decode_events(&buf).is_empty());
    }

    #[test]
    fn test_decode_skips_unrelated_types() {
        // RTM_NEWLINK
        let buf = addr_msg(16, libc::AF_INET6 as u8, 2);

        assert!(decode_events(&buf).is_empty());
    }

    #[test]
    fn test_decode_runt_length_ends_walk() {
        let mut buf = addr_msg(libc::RTM_NEWADDR, libc::AF_INET6 as u8, 2);
        // Corrupt the length so it can no longer hold a header.
        buf[0..4].copy_from_slice(&4u32.to_ne_bytes());

        assert!(decode_events(&buf).is_empty());
    }

    #[test]
    fn test_decode_truncated_tail_ignored() {
        let mut buf = addr_msg(libc::RTM_NEWADDR, libc::AF_INET6 as u8, 2);
        buf.extend_from_slice(&[0u8; 5]);
        let events = decode_events(&buf);

        assert_eq!(events.len(), 1);
    }
}
