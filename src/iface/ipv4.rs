//! IPv4 input and output
//!
//! Input validates the header, trims link padding and dispatches on the
//! protocol number. Output fragments payloads that do not fit the MTU.
//! Incoming fragments are passed up as they are; there is no reassembly.

use std::net::Ipv4Addr;

use log::{debug, trace, warn};

use crate::buffer::NetBuf;
use crate::error::{Result, StackError};
use crate::iface::{Interface, LinkProtocol};
use crate::link::{MacAddr, ETHERTYPE_IPV4};
use crate::network::{Ipv4Header, UnreachableCode, IPV4_HEADER_LEN};

pub(crate) struct Ipv4Protocol;

impl LinkProtocol for Ipv4Protocol {
    fn receive(&self, iface: &mut Interface, buf: NetBuf, src_mac: MacAddr) {
        iface.ipv4_in(buf, src_mac);
    }
}

impl Interface {
    pub(super) fn ipv4_init(&mut self) -> Result<()> {
        self.add_link_protocol(ETHERTYPE_IPV4, Ipv4Protocol)
    }

    /// Largest payload carried by one datagram or fragment. Kept a multiple
    /// of 8 so every fragment but the last ends on an offset boundary.
    pub fn max_fragment_payload(&self) -> usize {
        (self.config.mtu - IPV4_HEADER_LEN) & !7
    }

    pub(crate) fn ipv4_in(&mut self, mut buf: NetBuf, _src_mac: MacAddr) {
        let data = buf.as_slice();
        let header = match Ipv4Header::from_bytes(data) {
            Some(header) => header,
            None => {
                trace!("ipv4: dropping {}-byte packet (short or not version 4)", data.len());
                return;
            }
        };

        let header_len = header.header_len();
        if header_len < IPV4_HEADER_LEN || header_len > data.len() {
            trace!("ipv4: dropping packet with header length {}", header_len);
            return;
        }
        if !header.checksum_matches(&data[..header_len]) {
            trace!("ipv4: dropping packet from {} with bad checksum", header.src_addr);
            return;
        }
        if header.dst_addr != self.config.ip {
            trace!("ipv4: dropping packet for {}", header.dst_addr);
            return;
        }

        let total_len = header.total_len as usize;
        if total_len < header_len || total_len > data.len() {
            trace!(
                "ipv4: dropping packet with total length {} in {} bytes",
                total_len,
                data.len()
            );
            return;
        }
        let padding = data.len() - total_len;
        if padding > 0 && buf.pull_padding(padding).is_err() {
            return;
        }

        if header.is_fragment() {
            debug!(
                "ipv4: fragment of datagram {} from {} at offset {} passed up unassembled",
                header.id,
                header.src_addr,
                header.fragment_offset()
            );
        }

        if buf.pull_header(header_len).is_err() {
            return;
        }
        if let Err(mut buf) = self.dispatch_ip(buf, &header) {
            debug!(
                "ipv4: protocol {} unreachable for {}",
                header.protocol, header.src_addr
            );
            if buf.push_header(header_len).is_err() {
                return;
            }
            if let Err(e) =
                self.icmp_unreachable(buf.as_slice(), header.src_addr, UnreachableCode::Protocol)
            {
                warn!("ipv4: failed to report unreachable protocol: {}", e);
            }
        }
    }

    /// Sends `buf` as the payload of one datagram, fragmenting it when it
    /// exceeds [`Interface::max_fragment_payload`]. All fragments share one
    /// identifier.
    pub fn ipv4_out(&mut self, buf: NetBuf, dst_ip: Ipv4Addr, protocol: u8) -> Result<()> {
        if buf.len() > u16::MAX as usize - IPV4_HEADER_LEN {
            return Err(StackError::PayloadTooLarge(buf.len()));
        }

        let id = self.next_ip_id;
        self.next_ip_id = self.next_ip_id.wrapping_add(1);

        let max_payload = self.max_fragment_payload();
        if buf.len() <= max_payload {
            return self.ipv4_fragment_out(buf, dst_ip, protocol, id, 0, false);
        }

        let total = buf.len();
        debug!(
            "ipv4: fragmenting {} bytes to {} (id {})",
            total, dst_ip, id
        );
        let mut offset = 0;
        while offset < total {
            let size = (total - offset).min(max_payload);
            let fragment = NetBuf::from_slice(&buf.as_slice()[offset..offset + size]);
            let more_fragments = offset + size != total;
            self.ipv4_fragment_out(fragment, dst_ip, protocol, id, offset, more_fragments)?;
            offset += size;
        }
        Ok(())
    }

    fn ipv4_fragment_out(
        &mut self,
        mut buf: NetBuf,
        dst_ip: Ipv4Addr,
        protocol: u8,
        id: u16,
        offset: usize,
        more_fragments: bool,
    ) -> Result<()> {
        let mut header = Ipv4Header::new(
            self.config.ip,
            dst_ip,
            protocol,
            buf.len() as u16,
            id,
            offset as u16,
            more_fragments,
            self.config.ttl,
        );
        header.update_checksum();
        buf.push_header(IPV4_HEADER_LEN)?
            .copy_from_slice(&header.to_bytes());

        self.arp_out(buf, dst_ip)
    }
}
