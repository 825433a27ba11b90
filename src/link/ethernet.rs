//! Ethernet II framing
//!
//! Only the 14-byte header is handled here; no VLAN tags, no frame check
//! sequence (the driver strips and appends it).

use std::fmt;

use byteorder::{BigEndian, ByteOrder};

pub const ETHERNET_HEADER_LEN: usize = 14;

/// Smallest payload carried in a frame. Shorter payloads are zero-padded.
pub const ETHERNET_MIN_PAYLOAD: usize = 46;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// 48-bit hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);
    pub const ZERO: MacAddr = MacAddr([0; 6]);

    /// Reads an address from the first 6 bytes of `data`, or `None` when
    /// there are fewer.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        let mut octets = [0u8; 6];
        octets.copy_from_slice(data.get(..6)?);
        Some(MacAddr(octets))
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ethertype: u16,
}

impl EthernetHeader {
    /// Returns None if the frame is shorter than the header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ETHERNET_HEADER_LEN {
            return None;
        }

        Some(EthernetHeader {
            dst: MacAddr::from_slice(&data[0..6])?,
            src: MacAddr::from_slice(&data[6..12])?,
            ethertype: BigEndian::read_u16(&data[12..14]),
        })
    }

    pub fn to_bytes(&self) -> [u8; ETHERNET_HEADER_LEN] {
        let mut bytes = [0u8; ETHERNET_HEADER_LEN];
        bytes[0..6].copy_from_slice(&self.dst.0);
        bytes[6..12].copy_from_slice(&self.src.0);
        BigEndian::write_u16(&mut bytes[12..14], self.ethertype);
        bytes
    }
}
