//! Network interface and packet processing
//!
//! [`Interface`] is the whole stack for one Ethernet interface. It owns the
//! driver, the ARP cache and pending queue, the protocol and port
//! registries and the datagram identifier counter. Each layer is an `impl
//! Interface` block in its own file:
//!
//! - `ethernet`: framing and the receive poll
//! - `arp`: address resolution
//! - `ipv4`: validation, fragmentation and protocol dispatch
//! - `icmp`: echo replies and unreachable messages
//! - `udp`: port dispatch and the datagram API
//!
//! Processing is synchronous and single-threaded. One call to
//! [`Interface::poll`] handles one received frame to completion, including
//! every reply it triggers, before returning.

mod arp;
pub mod dispatch;
mod ethernet;
mod icmp;
mod ipv4;
mod udp;

#[cfg(test)]
pub(crate) mod testing;

use std::net::Ipv4Addr;
use std::rc::Rc;
use std::time::Instant;

use log::info;

use crate::buffer::NetBuf;
use crate::config::StackConfig;
use crate::driver::Driver;
use crate::error::Result;
use crate::link::MacAddr;
use crate::store::{Clock, ExpiringMap, SystemClock};

pub use dispatch::{IpProtocol, LinkProtocol, Registry};
pub use udp::UdpHandler;

pub struct Interface {
    config: StackConfig,
    driver: Box<dyn Driver>,
    clock: Box<dyn Clock>,
    link_protocols: Registry<u16, Rc<dyn LinkProtocol>>,
    ip_protocols: Registry<u8, Rc<dyn IpProtocol>>,
    udp_ports: Registry<u16, Rc<dyn UdpHandler>>,
    arp_cache: ExpiringMap<Ipv4Addr, MacAddr>,
    /// At most one datagram per unresolved destination.
    arp_pending: ExpiringMap<Ipv4Addr, NetBuf>,
    next_ip_id: u16,
    /// Receive scratch space, reused by every poll.
    rx_frame: Vec<u8>,
}

impl Interface {
    /// Brings the stack up on `driver`.
    ///
    /// Layers are initialised bottom-up: Ethernet, ARP (which announces the
    /// interface with a request for its own address), IPv4, ICMP, UDP.
    pub fn new(config: StackConfig, driver: impl Driver + 'static) -> Result<Self> {
        Self::with_clock(config, driver, SystemClock)
    }

    /// Like [`Interface::new`] with a custom time source for cache expiry.
    pub fn with_clock(
        config: StackConfig,
        driver: impl Driver + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self> {
        config.validate()?;

        let arp_timeout = config.arp_timeout;
        let arp_min_interval = config.arp_min_interval;
        let mut iface = Interface {
            config,
            driver: Box::new(driver),
            clock: Box::new(clock),
            link_protocols: Registry::new(),
            ip_protocols: Registry::new(),
            udp_ports: Registry::new(),
            arp_cache: ExpiringMap::new(Some(arp_timeout)),
            arp_pending: ExpiringMap::new(Some(arp_min_interval)),
            next_ip_id: 0,
            rx_frame: Vec::new(),
        };

        iface.ethernet_init();
        iface.arp_init()?;
        iface.ipv4_init()?;
        iface.icmp_init()?;
        iface.udp_init()?;

        info!(
            "interface up: {} ({}), mtu {}",
            iface.config.ip, iface.config.mac, iface.config.mtu
        );
        Ok(iface)
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.config.ip
    }

    pub fn mac(&self) -> MacAddr {
        self.config.mac
    }

    fn now(&self) -> Instant {
        self.clock.now()
    }
}
