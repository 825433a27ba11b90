//! IPv4 header format
//!
//! Parsing, serialization and checksum handling for the fixed 20-byte IPv4
//! header. Options are accepted on input (the header length field is
//! honoured) but never generated.

use std::net::Ipv4Addr;

use crate::network::checksum;
use byteorder::{BigEndian, ByteOrder};

pub const IPV4_HEADER_LEN: usize = 20;
pub const IPV4_VERSION: u8 = 4;
const DEFAULT_IHL: u8 = 5; // 5 * 4 = 20 bytes
const CHECKSUM_FIELD: std::ops::Range<usize> = 10..12;

/// IPv4 protocol numbers
pub mod protocol {
    pub const ICMP: u8 = 1;
    pub const UDP: u8 = 17;
}

/// IPv4 flags constants
pub mod flags {
    pub const DONT_FRAGMENT: u16 = 0x4000;
    pub const MORE_FRAGMENTS: u16 = 0x2000;
    pub const FRAGMENT_OFFSET_MASK: u16 = 0x1FFF;
}

/// IPv4 packet header structure
///
/// Represents the IPv4 header as defined in RFC 791
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    pub ihl: u8, // Internet Header Length, in 32-bit words
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub flags_frag_offset: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
}

impl Ipv4Header {
    /// A 20-byte header for one datagram or fragment.
    ///
    /// `offset` is in bytes and must be a multiple of 8. The checksum is left
    /// zero; call [`Ipv4Header::update_checksum`] once all fields are final.
    pub fn new(
        src_addr: Ipv4Addr,
        dst_addr: Ipv4Addr,
        protocol: u8,
        payload_len: u16,
        id: u16,
        offset: u16,
        more_fragments: bool,
        ttl: u8,
    ) -> Self {
        let mut flags_frag_offset = (offset >> 3) & flags::FRAGMENT_OFFSET_MASK;
        if more_fragments {
            flags_frag_offset |= flags::MORE_FRAGMENTS;
        }

        Ipv4Header {
            version: IPV4_VERSION,
            ihl: DEFAULT_IHL,
            tos: 0,
            total_len: IPV4_HEADER_LEN as u16 + payload_len,
            id,
            flags_frag_offset,
            ttl,
            protocol,
            checksum: 0,
            src_addr,
            dst_addr,
        }
    }

    /// Parse IPv4 header from byte slice
    ///
    /// Returns None if the data is too short or if the version field is not 4
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < IPV4_HEADER_LEN {
            return None;
        }

        let version = data[0] >> 4;
        if version != IPV4_VERSION {
            return None;
        }

        Some(Ipv4Header {
            version,
            ihl: data[0] & 0x0F,
            tos: data[1],
            total_len: BigEndian::read_u16(&data[2..4]),
            id: BigEndian::read_u16(&data[4..6]),
            flags_frag_offset: BigEndian::read_u16(&data[6..8]),
            ttl: data[8],
            protocol: data[9],
            checksum: BigEndian::read_u16(&data[10..12]),
            src_addr: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            dst_addr: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
        })
    }

    /// Serializes the fixed part of the header
    pub fn to_bytes(&self) -> [u8; IPV4_HEADER_LEN] {
        let mut bytes = [0u8; IPV4_HEADER_LEN];
        bytes[0] = (self.version << 4) | self.ihl;
        bytes[1] = self.tos;
        BigEndian::write_u16(&mut bytes[2..4], self.total_len);
        BigEndian::write_u16(&mut bytes[4..6], self.id);
        BigEndian::write_u16(&mut bytes[6..8], self.flags_frag_offset);
        bytes[8] = self.ttl;
        bytes[9] = self.protocol;
        BigEndian::write_u16(&mut bytes[CHECKSUM_FIELD], self.checksum);
        bytes[12..16].copy_from_slice(&self.src_addr.octets());
        bytes[16..20].copy_from_slice(&self.dst_addr.octets());
        bytes
    }

    /// Recalculates the checksum over the serialized header.
    pub fn update_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = checksum(&self.to_bytes());
    }

    /// Checks the stored checksum against the raw header bytes (including
    /// any options), recomputed with the checksum field zeroed.
    pub fn checksum_matches(&self, header_bytes: &[u8]) -> bool {
        let mut scratch = header_bytes.to_vec();
        scratch[CHECKSUM_FIELD].fill(0);
        checksum(&scratch) == self.checksum
    }

    /// Get the header length in bytes
    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    /// Fragment offset in bytes
    pub fn fragment_offset(&self) -> usize {
        ((self.flags_frag_offset & flags::FRAGMENT_OFFSET_MASK) as usize) << 3
    }

    pub fn more_fragments(&self) -> bool {
        self.flags_frag_offset & flags::MORE_FRAGMENTS != 0
    }

    /// True for any piece of a fragmented datagram.
    pub fn is_fragment(&self) -> bool {
        self.more_fragments() || self.fragment_offset() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Ipv4Header {
        let mut header = Ipv4Header::new(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            protocol::UDP,
            12,
            0x1C46,
            0,
            false,
            64,
        );
        header.update_checksum();
        header
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample_header().to_bytes();
        assert_eq!(bytes[0], 0x45);
        assert_eq!(&bytes[2..4], &[0, 32]);
        assert_eq!(&bytes[4..6], &[0x1C, 0x46]);
        assert_eq!(bytes[8], 64);
        assert_eq!(bytes[9], 17);
        assert_eq!(&bytes[12..16], &[10, 0, 0, 1]);
        assert_eq!(&bytes[16..20], &[10, 0, 0, 2]);
        assert_eq!(Ipv4Header::from_bytes(&bytes), Some(sample_header()));
    }

    #[test]
    fn test_checksum_verifies() {
        let header = sample_header();
        let bytes = header.to_bytes();
        assert!(header.checksum_matches(&bytes));
        assert_eq!(checksum(&bytes), 0);

        let mut corrupted = bytes;
        corrupted[8] = 1;
        let parsed = Ipv4Header::from_bytes(&corrupted).unwrap();
        assert!(!parsed.checksum_matches(&corrupted));
    }

    #[test]
    fn test_fragment_fields() {
        let header = Ipv4Header::new(
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::LOCALHOST,
            protocol::ICMP,
            8,
            1,
            2960,
            true,
            64,
        );
        assert_eq!(header.flags_frag_offset, flags::MORE_FRAGMENTS | 370);
        assert_eq!(header.fragment_offset(), 2960);
        assert!(header.more_fragments());
        assert!(header.is_fragment());
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut bytes = sample_header().to_bytes();
        bytes[0] = 0x65;
        assert!(Ipv4Header::from_bytes(&bytes).is_none());
        assert!(Ipv4Header::from_bytes(&bytes[..19]).is_none());
    }
}
