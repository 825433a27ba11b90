//! Address resolution
//!
//! The cache maps IPv4 addresses to hardware addresses and is refreshed by
//! every accepted request or reply. A datagram for an unresolved
//! destination is parked in the pending store while a request is out; only
//! the first one is kept, later ones for the same destination are dropped
//! until the reply arrives or the pending entry expires.

use std::net::Ipv4Addr;
use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::buffer::NetBuf;
use crate::error::Result;
use crate::iface::{Interface, LinkProtocol};
use crate::link::{
    ArpPacket, MacAddr, ARP_PACKET_LEN, ARP_REPLY, ARP_REQUEST, ETHERNET_MIN_PAYLOAD,
    ETHERTYPE_ARP, ETHERTYPE_IPV4,
};

pub(crate) struct ArpProtocol;

impl LinkProtocol for ArpProtocol {
    fn receive(&self, iface: &mut Interface, buf: NetBuf, src_mac: MacAddr) {
        iface.arp_in(buf, src_mac);
    }
}

impl Interface {
    pub(super) fn arp_init(&mut self) -> Result<()> {
        self.add_link_protocol(ETHERTYPE_ARP, ArpProtocol)?;
        let own_ip = self.config.ip;
        self.arp_request(own_ip)
    }

    /// Broadcasts a request for the hardware address of `target_ip`.
    pub fn arp_request(&mut self, target_ip: Ipv4Addr) -> Result<()> {
        debug!("arp: who-has {} tell {}", target_ip, self.config.ip);
        let packet = ArpPacket::request(self.config.mac, self.config.ip, target_ip);
        self.arp_send(&packet, MacAddr::BROADCAST)
    }

    fn arp_reply(&mut self, target_ip: Ipv4Addr, target_mac: MacAddr) -> Result<()> {
        debug!("arp: {} is-at {} (to {})", self.config.ip, self.config.mac, target_ip);
        let packet = ArpPacket::reply(self.config.mac, self.config.ip, target_mac, target_ip);
        self.arp_send(&packet, target_mac)
    }

    fn arp_send(&mut self, packet: &ArpPacket, dst: MacAddr) -> Result<()> {
        // Sized to the Ethernet minimum so the trailing padding is explicit.
        let mut buf = NetBuf::new(ETHERNET_MIN_PAYLOAD);
        buf.as_mut_slice()[..ARP_PACKET_LEN].copy_from_slice(&packet.to_bytes());
        self.ethernet_out(buf, dst, ETHERTYPE_ARP)
    }

    /// Sends an IPv4 datagram to `target_ip`, resolving its hardware address
    /// first if needed.
    pub(crate) fn arp_out(&mut self, buf: NetBuf, target_ip: Ipv4Addr) -> Result<()> {
        let now = self.now();
        let cached = self.arp_cache.get(&target_ip, now).copied();
        if let Some(mac) = cached {
            return self.ethernet_out(buf, mac, ETHERTYPE_IPV4);
        }

        if self.arp_pending.contains(&target_ip, now) {
            trace!("arp: {} still unresolved, dropping {} bytes", target_ip, buf.len());
            return Ok(());
        }

        self.arp_pending.insert(target_ip, buf, now);
        if let Err(e) = self.arp_request(target_ip) {
            self.arp_pending.remove(&target_ip, now);
            return Err(e);
        }
        Ok(())
    }

    pub(crate) fn arp_in(&mut self, buf: NetBuf, _src_mac: MacAddr) {
        let packet = match ArpPacket::from_bytes(buf.as_slice()) {
            Some(packet) => packet,
            None => {
                trace!("arp: dropping {}-byte packet", buf.len());
                return;
            }
        };
        if !packet.is_ethernet_ipv4() {
            trace!(
                "arp: dropping hw type {} / proto type {:#06x}",
                packet.hw_type,
                packet.proto_type
            );
            return;
        }

        let result = match packet.opcode {
            ARP_REPLY => self.arp_handle_reply(&packet),
            ARP_REQUEST => self.arp_handle_request(&packet),
            opcode => {
                trace!("arp: ignoring opcode {}", opcode);
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("arp: failed to answer {}: {}", packet.sender_ip, e);
        }
    }

    fn arp_handle_request(&mut self, packet: &ArpPacket) -> Result<()> {
        if packet.target_ip != self.config.ip {
            return Ok(());
        }

        let now = self.now();
        self.arp_cache.insert(packet.sender_ip, packet.sender_mac, now);
        self.arp_reply(packet.sender_ip, packet.sender_mac)
    }

    /// Only replies to our own requests are accepted: both target fields
    /// must name this interface.
    fn arp_handle_reply(&mut self, packet: &ArpPacket) -> Result<()> {
        if packet.target_ip != self.config.ip || packet.target_mac != self.config.mac {
            trace!("arp: ignoring reply for {} / {}", packet.target_ip, packet.target_mac);
            return Ok(());
        }

        let now = self.now();
        debug!("arp: learned {} is-at {}", packet.sender_ip, packet.sender_mac);
        self.arp_cache.insert(packet.sender_ip, packet.sender_mac, now);

        match self.arp_pending.remove(&packet.sender_ip, now) {
            Some(pending) => self.ethernet_out(pending, packet.sender_mac, ETHERTYPE_IPV4),
            None => Ok(()),
        }
    }

    /// Live ARP cache entries with the time each was last refreshed.
    pub fn arp_entries(&self) -> Vec<(Ipv4Addr, MacAddr, Instant)> {
        let mut entries: Vec<_> = self
            .arp_cache
            .iter(self.now())
            .map(|(&ip, &mac, updated)| (ip, mac, updated))
            .collect();
        entries.sort_by_key(|&(ip, _, _)| ip);
        entries
    }

    pub fn log_arp_table(&self) {
        let now = self.now();
        info!("arp table ({} entries)", self.arp_entries().len());
        for (ip, mac, updated) in self.arp_entries() {
            info!(
                "  {:<15} {}  {}s ago",
                ip.to_string(),
                mac,
                now.saturating_duration_since(updated).as_secs()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::iface::testing::{
        ethernet_frame, learn_peer, parse_arp_frame, test_config, test_interface, CaptureDriver,
        LOCAL_IP, LOCAL_MAC, PEER_IP, PEER_MAC,
    };
    use crate::store::ManualClock;

    fn inject_reply(driver: &CaptureDriver, target_mac: MacAddr, target_ip: Ipv4Addr) {
        let reply = ArpPacket::reply(PEER_MAC, PEER_IP, target_mac, target_ip);
        driver.inject(ethernet_frame(LOCAL_MAC, PEER_MAC, ETHERTYPE_ARP, &reply.to_bytes()));
    }

    #[test]
    fn test_init_announces_own_address() {
        let driver = CaptureDriver::default();
        let _iface = Interface::with_clock(test_config(), driver.clone(), ManualClock::new()).unwrap();

        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 60);
        let (eth, packet) = parse_arp_frame(&sent[0]);
        assert!(eth.dst.is_broadcast());
        assert_eq!(packet.opcode, ARP_REQUEST);
        assert_eq!(packet.sender_ip, LOCAL_IP);
        assert_eq!(packet.sender_mac, LOCAL_MAC);
        assert_eq!(packet.target_ip, LOCAL_IP);
        assert_eq!(packet.target_mac, MacAddr::ZERO);
    }

    #[test]
    fn test_request_for_us_answered_and_cached() {
        let (mut iface, driver, _clock) = test_interface();
        let request = ArpPacket::request(PEER_MAC, PEER_IP, LOCAL_IP);
        driver.inject(ethernet_frame(MacAddr::BROADCAST, PEER_MAC, ETHERTYPE_ARP, &request.to_bytes()));
        iface.poll().unwrap();

        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        let (eth, packet) = parse_arp_frame(&sent[0]);
        assert_eq!(eth.dst, PEER_MAC);
        assert_eq!(packet.opcode, ARP_REPLY);
        assert_eq!(packet.sender_ip, LOCAL_IP);
        assert_eq!(packet.sender_mac, LOCAL_MAC);
        assert_eq!(packet.target_ip, PEER_IP);
        assert_eq!(packet.target_mac, PEER_MAC);

        let entries = iface.arp_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!((entries[0].0, entries[0].1), (PEER_IP, PEER_MAC));
    }

    #[test]
    fn test_request_for_other_host_ignored() {
        let (mut iface, driver, _clock) = test_interface();
        let request = ArpPacket::request(PEER_MAC, PEER_IP, Ipv4Addr::new(10, 0, 0, 9));
        driver.inject(ethernet_frame(MacAddr::BROADCAST, PEER_MAC, ETHERTYPE_ARP, &request.to_bytes()));
        iface.poll().unwrap();

        assert!(driver.take_sent().is_empty());
        assert!(iface.arp_entries().is_empty());
    }

    #[test]
    fn test_unresolved_destination_coalesced() {
        let (mut iface, driver, _clock) = test_interface();
        iface.arp_out(NetBuf::from_slice(b"first"), PEER_IP).unwrap();
        iface.arp_out(NetBuf::from_slice(b"second"), PEER_IP).unwrap();

        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        let (_, packet) = parse_arp_frame(&sent[0]);
        assert_eq!(packet.opcode, ARP_REQUEST);
        assert_eq!(packet.target_ip, PEER_IP);

        inject_reply(&driver, LOCAL_MAC, LOCAL_IP);
        iface.poll().unwrap();
        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][0..6], &PEER_MAC.0);
        assert_eq!(&sent[0][12..14], &[0x08, 0x00]);
        assert_eq!(&sent[0][14..19], b"first");

        // The pending entry is gone: a repeated reply replays nothing.
        inject_reply(&driver, LOCAL_MAC, LOCAL_IP);
        iface.poll().unwrap();
        assert!(driver.take_sent().is_empty());
    }

    #[test]
    fn test_failed_request_leaves_nothing_pending() {
        let (mut iface, driver, _clock) = test_interface();
        driver.fail_sends(true);
        assert!(iface.arp_out(NetBuf::from_slice(b"lost"), PEER_IP).is_err());

        driver.fail_sends(false);
        iface.arp_out(NetBuf::from_slice(b"retry"), PEER_IP).unwrap();
        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(parse_arp_frame(&sent[0]).1.target_ip, PEER_IP);

        inject_reply(&driver, LOCAL_MAC, LOCAL_IP);
        iface.poll().unwrap();
        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][14..19], b"retry");
    }

    #[test]
    fn test_cached_destination_sent_directly() {
        let (mut iface, driver, _clock) = test_interface();
        learn_peer(&mut iface, &driver);
        iface.arp_out(NetBuf::from_slice(b"data"), PEER_IP).unwrap();

        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][0..6], &PEER_MAC.0);
        assert_eq!(&sent[0][14..18], b"data");
    }

    #[test]
    fn test_reply_for_someone_else_ignored() {
        let (mut iface, driver, _clock) = test_interface();
        iface.arp_out(NetBuf::from_slice(b"queued"), PEER_IP).unwrap();
        driver.take_sent();

        inject_reply(&driver, MacAddr([0x02, 0, 0, 0, 0, 0x99]), LOCAL_IP);
        iface.poll().unwrap();
        inject_reply(&driver, LOCAL_MAC, Ipv4Addr::new(10, 0, 0, 9));
        iface.poll().unwrap();

        assert!(driver.take_sent().is_empty());
        assert!(iface.arp_entries().is_empty());

        // Still pending, so a matching reply releases it.
        inject_reply(&driver, LOCAL_MAC, LOCAL_IP);
        iface.poll().unwrap();
        assert_eq!(driver.take_sent().len(), 1);
    }

    #[test]
    fn test_pending_entry_expires() {
        let (mut iface, driver, clock) = test_interface();
        iface.arp_out(NetBuf::from_slice(b"stale"), PEER_IP).unwrap();
        assert_eq!(driver.take_sent().len(), 1);

        clock.advance(Duration::from_secs(2));
        inject_reply(&driver, LOCAL_MAC, LOCAL_IP);
        iface.poll().unwrap();
        assert!(driver.take_sent().is_empty());
        assert_eq!(iface.arp_entries().len(), 1);
    }

    #[test]
    fn test_new_request_after_pending_expiry() {
        let (mut iface, driver, clock) = test_interface();
        iface.arp_out(NetBuf::from_slice(b"one"), PEER_IP).unwrap();
        clock.advance(Duration::from_secs(2));
        iface.arp_out(NetBuf::from_slice(b"two"), PEER_IP).unwrap();

        let sent = driver.take_sent();
        assert_eq!(sent.len(), 2);
        for frame in &sent {
            let (_, packet) = parse_arp_frame(frame);
            assert_eq!(packet.target_ip, PEER_IP);
        }

        inject_reply(&driver, LOCAL_MAC, LOCAL_IP);
        iface.poll().unwrap();
        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0][14..17], b"two");
    }

    #[test]
    fn test_cache_entry_expires() {
        let (mut iface, driver, clock) = test_interface();
        learn_peer(&mut iface, &driver);
        clock.advance(Duration::from_secs(300));
        assert!(iface.arp_entries().is_empty());

        iface.arp_out(NetBuf::from_slice(b"data"), PEER_IP).unwrap();
        let sent = driver.take_sent();
        assert_eq!(sent.len(), 1);
        let (eth, packet) = parse_arp_frame(&sent[0]);
        assert!(eth.dst.is_broadcast());
        assert_eq!(packet.target_ip, PEER_IP);
    }

    #[test]
    fn test_malformed_packets_dropped() {
        let (mut iface, driver, _clock) = test_interface();
        let mut bytes = ArpPacket::request(PEER_MAC, PEER_IP, LOCAL_IP).to_bytes();
        bytes[5] = 16; // IPv6-sized protocol address
        driver.inject(ethernet_frame(MacAddr::BROADCAST, PEER_MAC, ETHERTYPE_ARP, &bytes));
        driver.inject(ethernet_frame(MacAddr::BROADCAST, PEER_MAC, ETHERTYPE_ARP, &bytes[..20]));
        iface.poll().unwrap();
        iface.poll().unwrap();

        assert!(driver.take_sent().is_empty());
        assert!(iface.arp_entries().is_empty());
    }
}
