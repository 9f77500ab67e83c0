//! IPv6 protocol - RFC 8200

use crate::{Error, Result};
use std::net::Ipv6Addr;

/// IPv6 header size (fixed, unlike IPv4)
pub const HEADER_SIZE: usize = 40;

/// Next Header value for ICMPv6
pub const NEXT_HEADER_ICMPV6: u8 = 58;

/// Parsed IPv6 header (zero-copy reference)
#[derive(Debug)]
pub struct Ipv6Header<'a> {
    buffer: &'a [u8],
}

impl<'a> Ipv6Header<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::Parse("IPv6 header too short".into()));
        }

        let version = buffer[0] >> 4;
        if version != 6 {
            return Err(Error::Parse("not an IPv6 packet".into()));
        }

        Ok(Self { buffer })
    }

    /// Version (always 6)
    pub fn version(&self) -> u8 {
        self.buffer[0] >> 4
    }

    /// Traffic Class (6 bits from byte 0, 2 bits from byte 1)
    pub fn traffic_class(&self) -> u8 {
        ((self.buffer[0] & 0x0F) << 4) | (self.buffer[1] >> 4)
    }

    /// Flow Label (20 bits)
    pub fn flow_label(&self) -> u32 {
        let b1 = (self.buffer[1] & 0x0F) as u32;
        let b2 = self.buffer[2] as u32;
        let b3 = self.buffer[3] as u32;
        (b1 << 16) | (b2 << 8) | b3
    }

    /// Payload Length (does not include header)
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes([self.buffer[4], self.buffer[5]])
    }

    /// Next Header (protocol)
    pub fn next_header(&self) -> u8 {
        self.buffer[6]
    }

    /// Hop Limit (equivalent to IPv4 TTL)
    pub fn hop_limit(&self) -> u8 {
        self.buffer[7]
    }

    /// Source Address
    pub fn src_addr(&self) -> Ipv6Addr {
        let bytes: [u8; 16] = self.buffer[8..24].try_into().unwrap();
        Ipv6Addr::from(bytes)
    }

    /// Destination Address
    pub fn dst_addr(&self) -> Ipv6Addr {
        let bytes: [u8; 16] = self.buffer[24..40].try_into().unwrap();
        Ipv6Addr::from(bytes)
    }

    /// Payload (after header)
    pub fn payload(&self) -> &[u8] {
        &self.buffer[HEADER_SIZE..]
    }
}

/// Builder for constructing IPv6 packets
///
/// Traffic Class and Flow Label are always zero; Neighbor Discovery
/// replies have no use for either.
#[derive(Debug, Clone)]
pub struct Ipv6Builder {
    next_header: u8,
    hop_limit: u8,
    src_addr: Ipv6Addr,
    dst_addr: Ipv6Addr,
    payload: Vec<u8>,
}

impl Ipv6Builder {
    pub fn new() -> Self {
        Self {
            next_header: 0,
            hop_limit: 64,
            src_addr: Ipv6Addr::UNSPECIFIED,
            dst_addr: Ipv6Addr::UNSPECIFIED,
            payload: Vec::new(),
        }
    }

    pub fn next_header(mut self, nh: u8) -> Self {
        self.next_header = nh;
        self
    }

    pub fn hop_limit(mut self, hl: u8) -> Self {
        self.hop_limit = hl;
        self
    }

    pub fn src_addr(mut self, addr: Ipv6Addr) -> Self {
        self.src_addr = addr;
        self
    }

    pub fn dst_addr(mut self, addr: Ipv6Addr) -> Self {
        self.dst_addr = addr;
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let payload_length = self.payload.len() as u16;
        let mut buffer = vec![0u8; HEADER_SIZE + self.payload.len()];

        // Version (6), Traffic Class and Flow Label zero
        buffer[0] = 0x60;

        // Payload Length
        buffer[4..6].copy_from_slice(&payload_length.to_be_bytes());

        // Next Header
        buffer[6] = self.next_header;

        // Hop Limit
        buffer[7] = self.hop_limit;

        // Source Address
        buffer[8..24].copy_from_slice(&self.src_addr.octets());

        // Destination Address
        buffer[24..40].copy_from_slice(&self.dst_addr.octets());

        // Payload
        buffer[HEADER_SIZE..].copy_from_slice(&self.payload);

        buffer
    }
}

impl Default for Ipv6Builder {
    fn default() -> Self {
        Self::new()
    }
}
