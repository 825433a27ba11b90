//! UDP port dispatch and the datagram API

use std::net::Ipv4Addr;
use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace, warn};

use crate::buffer::NetBuf;
use crate::error::{Result, StackError};
use crate::iface::{Interface, IpProtocol};
use crate::network::{protocol, Ipv4Header, UnreachableCode};
use crate::transport::udp::{udp_checksum, UdpHeader, UDP_HEADER_LEN};

/// Receiver for datagrams arriving on an open port.
///
/// The interface is passed in so a handler can answer straight away with
/// [`Interface::udp_send`]. Closures of the matching shape are handlers.
pub trait UdpHandler {
    fn on_datagram(&self, iface: &mut Interface, data: &[u8], src_ip: Ipv4Addr, src_port: u16);
}

impl<F> UdpHandler for F
where
    F: Fn(&mut Interface, &[u8], Ipv4Addr, u16),
{
    fn on_datagram(&self, iface: &mut Interface, data: &[u8], src_ip: Ipv4Addr, src_port: u16) {
        self(iface, data, src_ip, src_port)
    }
}

pub(crate) struct UdpProtocol;

impl IpProtocol for UdpProtocol {
    fn receive(&self, iface: &mut Interface, buf: NetBuf, header: &Ipv4Header) {
        iface.udp_in(buf, header);
    }
}

impl Interface {
    pub(super) fn udp_init(&mut self) -> Result<()> {
        self.add_ip_protocol(protocol::UDP, UdpProtocol)
    }

    /// Opens `port` and routes its datagrams to `handler`. Fails with
    /// [`StackError::PortInUse`] if the port is already open.
    pub fn udp_open(&mut self, port: u16, handler: impl UdpHandler + 'static) -> Result<()> {
        self.udp_ports
            .register(port, Rc::new(handler))
            .map_err(|_| StackError::PortInUse(port))?;
        debug!("udp: opened port {}", port);
        Ok(())
    }

    pub fn udp_close(&mut self, port: u16) {
        if self.udp_ports.unregister(&port).is_some() {
            debug!("udp: closed port {}", port);
        }
    }

    /// Sends `data` from `src_port` to `dst_ip:dst_port`.
    pub fn udp_send(
        &mut self,
        data: &[u8],
        src_port: u16,
        dst_ip: Ipv4Addr,
        dst_port: u16,
    ) -> Result<()> {
        self.udp_out(NetBuf::from_slice(data), src_port, dst_ip, dst_port)
    }

    pub fn udp_out(
        &mut self,
        mut buf: NetBuf,
        src_port: u16,
        dst_ip: Ipv4Addr,
        dst_port: u16,
    ) -> Result<()> {
        let length = UDP_HEADER_LEN + buf.len();
        if length > u16::MAX as usize {
            return Err(StackError::PayloadTooLarge(buf.len()));
        }

        let header = UdpHeader {
            src_port,
            dst_port,
            length: length as u16,
            checksum: 0,
        };
        buf.push_header(UDP_HEADER_LEN)?
            .copy_from_slice(&header.to_bytes());
        let checksum = udp_checksum(self.config.ip, dst_ip, buf.as_slice());
        BigEndian::write_u16(&mut buf.as_mut_slice()[6..8], checksum);

        self.ipv4_out(buf, dst_ip, protocol::UDP)
    }

    pub(crate) fn udp_in(&mut self, mut buf: NetBuf, ip: &Ipv4Header) {
        let data = buf.as_slice();
        let header = match UdpHeader::from_bytes(data) {
            Some(header) => header,
            None => {
                trace!("udp: dropping {}-byte datagram from {}", data.len(), ip.src_addr);
                return;
            }
        };

        let length = header.length as usize;
        if length < UDP_HEADER_LEN || length > data.len() {
            trace!(
                "udp: dropping datagram claiming {} bytes in {}",
                length,
                data.len()
            );
            return;
        }
        // A zero checksum means the sender did not compute one.
        if header.checksum != 0
            && udp_checksum(ip.src_addr, ip.dst_addr, &data[..length]) != header.checksum
        {
            trace!("udp: dropping datagram from {} with bad checksum", ip.src_addr);
            return;
        }

        match self.udp_ports.get(&header.dst_port).cloned() {
            Some(handler) => {
                handler.on_datagram(
                    self,
                    &data[UDP_HEADER_LEN..length],
                    ip.src_addr,
                    header.src_port,
                );
            }
            None => {
                debug!(
                    "udp: port {} unreachable for {}:{}",
                    header.dst_port, ip.src_addr, header.src_port
                );
                if buf.push_header(ip.header_len()).is_err() {
                    return;
                }
                if let Err(e) =
                    self.icmp_unreachable(buf.as_slice(), ip.src_addr, UnreachableCode::Port)
                {
                    warn!("udp: failed to report unreachable port: {}", e);
                }
            }
        }
    }
}
