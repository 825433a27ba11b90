//! Protocol dispatch
//!
//! Received payloads are routed by a small integer key: the ethertype at the
//! link layer, the protocol number at the IP layer and the destination port
//! for UDP. Each key maps to exactly one handler.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use log::debug;

use crate::buffer::NetBuf;
use crate::error::{Result, StackError};
use crate::iface::Interface;
use crate::link::MacAddr;
use crate::network::Ipv4Header;

/// Handler for one ethertype. Receives the frame payload with the Ethernet
/// header already stripped.
pub trait LinkProtocol {
    fn receive(&self, iface: &mut Interface, buf: NetBuf, src_mac: MacAddr);
}

/// Handler for one IP protocol number. Receives the datagram payload with
/// the IPv4 header stripped; the header itself is passed alongside.
pub trait IpProtocol {
    fn receive(&self, iface: &mut Interface, buf: NetBuf, header: &Ipv4Header);
}

#[derive(Debug)]
pub struct Registry<K, H> {
    handlers: HashMap<K, H>,
}

impl<K: Eq + Hash, H> Registry<K, H> {
    pub fn new() -> Self {
        Registry {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `key`. A key that is already taken keeps its
    /// handler and the new one is handed back.
    pub fn register(&mut self, key: K, handler: H) -> std::result::Result<(), H> {
        if self.handlers.contains_key(&key) {
            return Err(handler);
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    pub fn unregister(&mut self, key: &K) -> Option<H> {
        self.handlers.remove(key)
    }

    pub fn get(&self, key: &K) -> Option<&H> {
        self.handlers.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<K: Eq + Hash, H> Default for Registry<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface {
    pub fn add_link_protocol(
        &mut self,
        ethertype: u16,
        handler: impl LinkProtocol + 'static,
    ) -> Result<()> {
        self.link_protocols
            .register(ethertype, Rc::new(handler))
            .map_err(|_| StackError::ProtocolInUse(ethertype))?;
        debug!("registered ethertype {:#06x}", ethertype);
        Ok(())
    }

    pub fn add_ip_protocol(
        &mut self,
        protocol: u8,
        handler: impl IpProtocol + 'static,
    ) -> Result<()> {
        self.ip_protocols
            .register(protocol, Rc::new(handler))
            .map_err(|_| StackError::ProtocolInUse(protocol as u16))?;
        debug!("registered ip protocol {}", protocol);
        Ok(())
    }

    /// Hands `buf` to the handler for `ethertype`, or gives it back when
    /// there is none.
    pub(crate) fn dispatch_link(
        &mut self,
        buf: NetBuf,
        ethertype: u16,
        src_mac: MacAddr,
    ) -> std::result::Result<(), NetBuf> {
        match self.link_protocols.get(&ethertype).cloned() {
            Some(handler) => {
                handler.receive(self, buf, src_mac);
                Ok(())
            }
            None => Err(buf),
        }
    }

    pub(crate) fn dispatch_ip(
        &mut self,
        buf: NetBuf,
        header: &Ipv4Header,
    ) -> std::result::Result<(), NetBuf> {
        match self.ip_protocols.get(&header.protocol).cloned() {
            Some(handler) => {
                handler.receive(self, buf, header);
                Ok(())
            }
            None => Err(buf),
        }
    }
}
