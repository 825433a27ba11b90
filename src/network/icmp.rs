//! ICMP (Internet Control Message Protocol) header format
//!
//! Covers the messages this stack speaks: echo request/reply and
//! destination unreachable.

use byteorder::{BigEndian, ByteOrder};

/// ICMP header length in bytes
pub const ICMP_HEADER_LEN: usize = 8;

pub const ICMP_TYPE_ECHO_REPLY: u8 = 0;
pub const ICMP_TYPE_DEST_UNREACHABLE: u8 = 3;
pub const ICMP_TYPE_ECHO_REQUEST: u8 = 8;

/// Bytes of the offending datagram's payload quoted in an error message,
/// enough to cover the transport ports.
pub const ICMP_QUOTED_PAYLOAD_LEN: usize = 8;

/// Destination unreachable codes generated by this stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UnreachableCode {
    Protocol = 2,
    Port = 3,
}

/// The 8-byte ICMP header (RFC 792)
///
/// `identifier` and `sequence` are only meaningful for echo messages and are
/// zero in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub msg_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl IcmpHeader {
    pub fn unreachable(code: UnreachableCode) -> Self {
        IcmpHeader {
            msg_type: ICMP_TYPE_DEST_UNREACHABLE,
            code: code as u8,
            checksum: 0,
            identifier: 0,
            sequence: 0,
        }
    }

    /// Returns None if the data is too short to contain an ICMP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ICMP_HEADER_LEN {
            return None;
        }

        Some(IcmpHeader {
            msg_type: data[0],
            code: data[1],
            checksum: BigEndian::read_u16(&data[2..4]),
            identifier: BigEndian::read_u16(&data[4..6]),
            sequence: BigEndian::read_u16(&data[6..8]),
        })
    }

    pub fn to_bytes(&self) -> [u8; ICMP_HEADER_LEN] {
        let mut bytes = [0u8; ICMP_HEADER_LEN];
        bytes[0] = self.msg_type;
        bytes[1] = self.code;
        BigEndian::write_u16(&mut bytes[2..4], self.checksum);
        BigEndian::write_u16(&mut bytes[4..6], self.identifier);
        BigEndian::write_u16(&mut bytes[6..8], self.sequence);
        bytes
    }

    pub fn is_echo_request(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REQUEST
    }

    pub fn is_echo_reply(&self) -> bool {
        self.msg_type == ICMP_TYPE_ECHO_REPLY
    }
}

/// Writes the checksum of a whole ICMP message into its header.
pub fn fill_checksum(message: &mut [u8]) {
    message[2..4].fill(0);
    let sum = crate::network::checksum(message);
    BigEndian::write_u16(&mut message[2..4], sum);
}
