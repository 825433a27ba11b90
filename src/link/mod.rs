//! Link layer wire formats
//!
//! - Ethernet II header and hardware addresses
//! - ARP for Ethernet/IPv4

pub mod arp;
pub mod ethernet;

pub use arp::{ArpPacket, ARP_PACKET_LEN, ARP_REPLY, ARP_REQUEST};
pub use ethernet::{
    EthernetHeader, MacAddr, ETHERNET_HEADER_LEN, ETHERNET_MIN_PAYLOAD, ETHERTYPE_ARP,
    ETHERTYPE_IPV4,
};
