//! Test fixtures: a capture driver, canned addresses and frame builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::rc::Rc;

use crate::buffer::NetBuf;
use crate::config::StackConfig;
use crate::driver::Driver;
use crate::iface::{Interface, IpProtocol};
use crate::link::{ArpPacket, EthernetHeader, MacAddr, ETHERTYPE_ARP, ETHERTYPE_IPV4};
use crate::network::{Ipv4Header, IPV4_HEADER_LEN};
use crate::store::ManualClock;
use crate::transport::udp::{udp_checksum, UdpHeader, UDP_HEADER_LEN};

pub(crate) const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub(crate) const LOCAL_MAC: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
pub(crate) const PEER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
pub(crate) const PEER_MAC: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);

#[derive(Default)]
struct Queues {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    fail_sends: bool,
}

/// Driver whose queues stay reachable from the test after the interface
/// takes ownership of it.
#[derive(Clone, Default)]
pub(crate) struct CaptureDriver {
    queues: Rc<RefCell<Queues>>,
}

impl CaptureDriver {
    pub(crate) fn inject(&self, frame: Vec<u8>) {
        self.queues.borrow_mut().inbound.push_back(frame);
    }

    pub(crate) fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.queues.borrow_mut().sent)
    }

    /// While set, every send fails with a broken pipe.
    pub(crate) fn fail_sends(&self, fail: bool) {
        self.queues.borrow_mut().fail_sends = fail;
    }
}

impl Driver for CaptureDriver {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut queues = self.queues.borrow_mut();
        if queues.fail_sends {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "capture driver down"));
        }
        queues.sent.push(frame.to_vec());
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.queues.borrow_mut().inbound.pop_front() {
            Some(frame) => {
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                Ok(Some(len))
            }
            None => Ok(None),
        }
    }
}

/// IP protocol handler that records every payload it is given.
pub(crate) struct RecordingProtocol {
    seen: Rc<RefCell<Vec<(Vec<u8>, Ipv4Addr)>>>,
}

impl RecordingProtocol {
    pub(crate) fn new() -> (Self, Rc<RefCell<Vec<(Vec<u8>, Ipv4Addr)>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        (RecordingProtocol { seen: seen.clone() }, seen)
    }
}

impl IpProtocol for RecordingProtocol {
    fn receive(&self, _iface: &mut Interface, buf: NetBuf, header: &Ipv4Header) {
        self.seen
            .borrow_mut()
            .push((buf.as_slice().to_vec(), header.src_addr));
    }
}

pub(crate) fn test_config() -> StackConfig {
    StackConfig::new(LOCAL_IP, LOCAL_MAC)
}

/// An interface on [`LOCAL_IP`] with the start-up ARP probe already drained.
pub(crate) fn test_interface() -> (Interface, CaptureDriver, ManualClock) {
    let driver = CaptureDriver::default();
    let clock = ManualClock::new();
    let iface = Interface::with_clock(test_config(), driver.clone(), clock.clone())
        .expect("interface comes up");
    driver.take_sent();
    (iface, driver, clock)
}

/// Teaches the interface [`PEER_MAC`] by letting the peer ask for our
/// address. The reply is drained.
pub(crate) fn learn_peer(iface: &mut Interface, driver: &CaptureDriver) {
    let request = ArpPacket::request(PEER_MAC, PEER_IP, LOCAL_IP);
    driver.inject(ethernet_frame(
        MacAddr::BROADCAST,
        PEER_MAC,
        ETHERTYPE_ARP,
        &request.to_bytes(),
    ));
    assert!(iface.poll().unwrap());
    driver.take_sent();
}

pub(crate) fn ethernet_frame(dst: MacAddr, src: MacAddr, ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let header = EthernetHeader {
        dst,
        src,
        ethertype,
    };
    let mut frame = header.to_bytes().to_vec();
    frame.extend_from_slice(payload);
    frame
}

pub(crate) fn ipv4_packet(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, payload: &[u8]) -> Vec<u8> {
    let mut header = Ipv4Header::new(src, dst, protocol, payload.len() as u16, 0x4242, 0, false, 64);
    header.update_checksum();
    let mut packet = header.to_bytes().to_vec();
    packet.extend_from_slice(payload);
    packet
}

/// An IPv4 frame from the peer to us.
pub(crate) fn ipv4_frame_from_peer(protocol: u8, payload: &[u8]) -> Vec<u8> {
    ethernet_frame(
        LOCAL_MAC,
        PEER_MAC,
        ETHERTYPE_IPV4,
        &ipv4_packet(PEER_IP, LOCAL_IP, protocol, payload),
    )
}

pub(crate) fn udp_datagram(
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let header = UdpHeader {
        src_port,
        dst_port,
        length: (UDP_HEADER_LEN + payload.len()) as u16,
        checksum: 0,
    };
    let mut datagram = header.to_bytes().to_vec();
    datagram.extend_from_slice(payload);
    let sum = udp_checksum(src_ip, dst_ip, &datagram);
    datagram[6..8].copy_from_slice(&sum.to_be_bytes());
    datagram
}

/// Splits a sent IPv4 frame into its headers and the datagram payload,
/// dropping any Ethernet padding.
pub(crate) fn parse_ipv4_frame(frame: &[u8]) -> (EthernetHeader, Ipv4Header, Vec<u8>) {
    let eth = EthernetHeader::from_bytes(frame).expect("ethernet header");
    assert_eq!(eth.ethertype, ETHERTYPE_IPV4);
    let packet = &frame[14..];
    let ip = Ipv4Header::from_bytes(packet).expect("ipv4 header");
    assert!(ip.checksum_matches(&packet[..IPV4_HEADER_LEN]));
    let payload = packet[ip.header_len()..ip.total_len as usize].to_vec();
    (eth, ip, payload)
}

pub(crate) fn parse_arp_frame(frame: &[u8]) -> (EthernetHeader, ArpPacket) {
    let eth = EthernetHeader::from_bytes(frame).expect("ethernet header");
    assert_eq!(eth.ethertype, ETHERTYPE_ARP);
    let packet = ArpPacket::from_bytes(&frame[14..]).expect("arp packet");
    (eth, packet)
}
