//! Network layer wire formats
//!
//! This module contains the header formats of the network layer:
//! - IPv4: Internet Protocol version 4
//! - ICMP: Internet Control Message Protocol
//!
//! and the internet checksum shared by IPv4, ICMP and UDP.

pub mod icmp;
pub mod ipv4;

pub use icmp::{IcmpHeader, UnreachableCode, ICMP_HEADER_LEN};
pub use ipv4::{flags, protocol, Ipv4Header, IPV4_HEADER_LEN};

/// Calculate Internet checksum (RFC 1071)
///
/// Sums the data as big-endian 16-bit words, folding carries back in, and
/// returns the one's complement of the sum. An odd trailing byte is treated
/// as if followed by a zero byte.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    if let [last] = chunks.remainder() {
        sum += (*last as u32) << 8;
    }

    while (sum >> 16) > 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !sum as u16
}
