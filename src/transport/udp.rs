//! UDP (User Datagram Protocol) header format
//!
//! This module provides the UDP header and the pseudo-header checksum used
//! both to fill outgoing datagrams and to verify incoming ones.

use std::net::Ipv4Addr;

use crate::network::{checksum, protocol};
use byteorder::{BigEndian, ByteOrder};

/// UDP header length in bytes
pub const UDP_HEADER_LEN: usize = 8;

pub const PSEUDO_HEADER_LEN: usize = 12;

/// UDP packet header structure
///
/// Represents the standard 8-byte UDP header as defined in RFC 768
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16, // Length of UDP header and data
    pub checksum: u16,
}

impl UdpHeader {
    /// Parse UDP header from byte slice
    ///
    /// Returns None if the data is too short to contain a valid UDP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < UDP_HEADER_LEN {
            return None;
        }

        Some(UdpHeader {
            src_port: BigEndian::read_u16(&data[0..2]),
            dst_port: BigEndian::read_u16(&data[2..4]),
            length: BigEndian::read_u16(&data[4..6]),
            checksum: BigEndian::read_u16(&data[6..8]),
        })
    }

    pub fn to_bytes(&self) -> [u8; UDP_HEADER_LEN] {
        let mut bytes = [0u8; UDP_HEADER_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.src_port);
        BigEndian::write_u16(&mut bytes[2..4], self.dst_port);
        BigEndian::write_u16(&mut bytes[4..6], self.length);
        BigEndian::write_u16(&mut bytes[6..8], self.checksum);
        bytes
    }
}

/// The IPv4 pseudo-header. It only ever exists inside a checksum
/// computation and is never transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoHeader {
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub protocol: u8,
    pub length: u16,
}

impl PseudoHeader {
    pub fn to_bytes(&self) -> [u8; PSEUDO_HEADER_LEN] {
        let mut bytes = [0u8; PSEUDO_HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.src_addr.octets());
        bytes[4..8].copy_from_slice(&self.dst_addr.octets());
        // bytes[8] stays zero
        bytes[9] = self.protocol;
        BigEndian::write_u16(&mut bytes[10..12], self.length);
        bytes
    }
}

/// Calculate UDP checksum with pseudo header
///
/// `datagram` is the UDP header followed by its payload. The checksum field
/// inside it is treated as zero, so the same call produces the value for an
/// outgoing datagram and the expected value for an incoming one. Odd
/// lengths are padded with a zero byte for the sum only. Input shorter
/// than a UDP header has no checksum field and is summed as given.
pub fn udp_checksum(src_addr: Ipv4Addr, dst_addr: Ipv4Addr, datagram: &[u8]) -> u16 {
    let pseudo = PseudoHeader {
        src_addr,
        dst_addr,
        protocol: protocol::UDP,
        length: datagram.len() as u16,
    };

    let mut scratch = Vec::with_capacity(PSEUDO_HEADER_LEN + datagram.len() + 1);
    scratch.extend_from_slice(&pseudo.to_bytes());
    scratch.extend_from_slice(datagram);
    if let Some(field) = scratch.get_mut(PSEUDO_HEADER_LEN + 6..PSEUDO_HEADER_LEN + 8) {
        field.fill(0);
    }
    if scratch.len() % 2 != 0 {
        scratch.push(0);
    }

    checksum(&scratch)
}
