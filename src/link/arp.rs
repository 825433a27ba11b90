//! ARP packet format for Ethernet/IPv4 (RFC 826)

use std::net::Ipv4Addr;

use byteorder::{BigEndian, ByteOrder};

use crate::link::ethernet::{MacAddr, ETHERTYPE_IPV4};

pub const ARP_PACKET_LEN: usize = 28;

pub const ARP_HW_ETHERNET: u16 = 1;
pub const ARP_REQUEST: u16 = 1;
pub const ARP_REPLY: u16 = 2;

const MAC_LEN: u8 = 6;
const IPV4_LEN: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub hw_type: u16,
    pub proto_type: u16,
    pub hw_len: u8,
    pub proto_len: u8,
    pub opcode: u16,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    fn ethernet_ipv4(opcode: u16, sender_mac: MacAddr, sender_ip: Ipv4Addr) -> Self {
        ArpPacket {
            hw_type: ARP_HW_ETHERNET,
            proto_type: ETHERTYPE_IPV4,
            hw_len: MAC_LEN,
            proto_len: IPV4_LEN,
            opcode,
            sender_mac,
            sender_ip,
            target_mac: MacAddr::ZERO,
            target_ip: Ipv4Addr::UNSPECIFIED,
        }
    }

    /// Who-has `target_ip`; the target hardware address is left zero.
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        ArpPacket {
            target_ip,
            ..Self::ethernet_ipv4(ARP_REQUEST, sender_mac, sender_ip)
        }
    }

    pub fn reply(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpPacket {
            target_mac,
            target_ip,
            ..Self::ethernet_ipv4(ARP_REPLY, sender_mac, sender_ip)
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ARP_PACKET_LEN {
            return None;
        }

        Some(ArpPacket {
            hw_type: BigEndian::read_u16(&data[0..2]),
            proto_type: BigEndian::read_u16(&data[2..4]),
            hw_len: data[4],
            proto_len: data[5],
            opcode: BigEndian::read_u16(&data[6..8]),
            sender_mac: MacAddr::from_slice(&data[8..14])?,
            sender_ip: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_mac: MacAddr::from_slice(&data[18..24])?,
            target_ip: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }

    pub fn to_bytes(&self) -> [u8; ARP_PACKET_LEN] {
        let mut bytes = [0u8; ARP_PACKET_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.hw_type);
        BigEndian::write_u16(&mut bytes[2..4], self.proto_type);
        bytes[4] = self.hw_len;
        bytes[5] = self.proto_len;
        BigEndian::write_u16(&mut bytes[6..8], self.opcode);
        bytes[8..14].copy_from_slice(&self.sender_mac.0);
        bytes[14..18].copy_from_slice(&self.sender_ip.octets());
        bytes[18..24].copy_from_slice(&self.target_mac.0);
        bytes[24..28].copy_from_slice(&self.target_ip.octets());
        bytes
    }

    /// True when the fixed fields describe Ethernet hardware and IPv4
    /// protocol addresses, the only combination this stack resolves.
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hw_type == ARP_HW_ETHERNET
            && self.proto_type == ETHERTYPE_IPV4
            && self.hw_len == MAC_LEN
            && self.proto_len == IPV4_LEN
    }
}
