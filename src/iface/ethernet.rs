//! Ethernet framing and the receive poll

use log::trace;

use crate::buffer::NetBuf;
use crate::error::Result;
use crate::iface::Interface;
use crate::link::{EthernetHeader, MacAddr, ETHERNET_HEADER_LEN, ETHERNET_MIN_PAYLOAD};

impl Interface {
    pub(super) fn ethernet_init(&mut self) {
        self.rx_frame = vec![0u8; self.config.mtu + ETHERNET_HEADER_LEN];
    }

    /// Reads at most one frame from the driver and processes it completely.
    ///
    /// Returns `Ok(false)` when no frame was waiting. Not reentrant: handlers
    /// invoked from here must not call `poll` themselves.
    pub fn poll(&mut self) -> Result<bool> {
        let len = match self.driver.recv(&mut self.rx_frame)? {
            Some(len) => len,
            None => return Ok(false),
        };
        let frame = NetBuf::from_slice(&self.rx_frame[..len]);
        self.ethernet_in(frame);
        Ok(true)
    }

    pub(crate) fn ethernet_in(&mut self, mut buf: NetBuf) {
        let header = match EthernetHeader::from_bytes(buf.as_slice()) {
            Some(header) => header,
            None => {
                trace!("eth: dropping {}-byte runt frame", buf.len());
                return;
            }
        };
        if buf.pull_header(ETHERNET_HEADER_LEN).is_err() {
            return;
        }

        if self.dispatch_link(buf, header.ethertype, header.src).is_err() {
            trace!(
                "eth: no handler for ethertype {:#06x} from {}",
                header.ethertype,
                header.src
            );
        }
    }

    /// Frames `buf` for `dst` and hands it to the driver. Payloads shorter
    /// than the Ethernet minimum are zero-padded first.
    pub(crate) fn ethernet_out(&mut self, mut buf: NetBuf, dst: MacAddr, ethertype: u16) -> Result<()> {
        if buf.len() < ETHERNET_MIN_PAYLOAD {
            buf.push_padding(ETHERNET_MIN_PAYLOAD - buf.len())?;
        }

        let header = EthernetHeader {
            dst,
            src: self.config.mac,
            ethertype,
        };
        buf.push_header(ETHERNET_HEADER_LEN)?
            .copy_from_slice(&header.to_bytes());

        trace!(
            "eth: sending {} bytes to {} (ethertype {:#06x})",
            buf.len(),
            dst,
            ethertype
        );
        self.driver.send(buf.as_slice())?;
        Ok(())
    }
}
