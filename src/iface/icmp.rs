//! ICMP input and error generation
//!
//! Echo requests are answered; every other incoming message is ignored, so
//! the stack never sends an ICMP error about an ICMP message.

use std::net::Ipv4Addr;

use log::{debug, trace, warn};

use crate::buffer::NetBuf;
use crate::error::Result;
use crate::iface::{Interface, IpProtocol};
use crate::network::icmp::{fill_checksum, ICMP_QUOTED_PAYLOAD_LEN, ICMP_TYPE_ECHO_REPLY};
use crate::network::{protocol, IcmpHeader, Ipv4Header, UnreachableCode, ICMP_HEADER_LEN, IPV4_HEADER_LEN};

pub(crate) struct IcmpProtocol;

impl IpProtocol for IcmpProtocol {
    fn receive(&self, iface: &mut Interface, buf: NetBuf, header: &Ipv4Header) {
        iface.icmp_in(buf, header.src_addr);
    }
}

impl Interface {
    pub(super) fn icmp_init(&mut self) -> Result<()> {
        self.add_ip_protocol(protocol::ICMP, IcmpProtocol)
    }

    pub(crate) fn icmp_in(&mut self, buf: NetBuf, src_ip: Ipv4Addr) {
        let header = match IcmpHeader::from_bytes(buf.as_slice()) {
            Some(header) => header,
            None => {
                trace!("icmp: dropping {}-byte message from {}", buf.len(), src_ip);
                return;
            }
        };

        if !header.is_echo_request() {
            trace!("icmp: ignoring type {} from {}", header.msg_type, src_ip);
            return;
        }

        debug!(
            "icmp: echo request from {} (id {:#06x}, seq {})",
            src_ip, header.identifier, header.sequence
        );
        if let Err(e) = self.icmp_echo_reply(&buf, src_ip) {
            warn!("icmp: failed to send echo reply to {}: {}", src_ip, e);
        }
    }

    /// The reply is the request verbatim with the type changed, so the
    /// identifier, sequence number and data come back untouched.
    fn icmp_echo_reply(&mut self, request: &NetBuf, dst_ip: Ipv4Addr) -> Result<()> {
        let mut reply = NetBuf::from_slice(request.as_slice());
        let message = reply.as_mut_slice();
        message[0] = ICMP_TYPE_ECHO_REPLY;
        message[1] = 0;
        fill_checksum(message);

        self.ipv4_out(reply, dst_ip, protocol::ICMP)
    }

    /// Reports an undeliverable datagram back to `dst_ip`.
    ///
    /// `datagram` is the offending IPv4 datagram starting at its header. The
    /// message quotes the header and the first 8 payload bytes.
    pub fn icmp_unreachable(
        &mut self,
        datagram: &[u8],
        dst_ip: Ipv4Addr,
        code: UnreachableCode,
    ) -> Result<()> {
        let header_len = Ipv4Header::from_bytes(datagram)
            .map(|header| header.header_len())
            .unwrap_or(IPV4_HEADER_LEN);
        let quoted_len = (header_len + ICMP_QUOTED_PAYLOAD_LEN).min(datagram.len());

        let mut buf = NetBuf::new(ICMP_HEADER_LEN + quoted_len);
        let message = buf.as_mut_slice();
        message[..ICMP_HEADER_LEN].copy_from_slice(&IcmpHeader::unreachable(code).to_bytes());
        message[ICMP_HEADER_LEN..].copy_from_slice(&datagram[..quoted_len]);
        fill_checksum(message);

        debug!("icmp: {:?} unreachable, notifying {}", code, dst_ip);
        self.ipv4_out(buf, dst_ip, protocol::ICMP)
    }
}
