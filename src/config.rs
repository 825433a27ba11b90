//! Interface configuration

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::{Result, StackError};
use crate::link::MacAddr;

pub const DEFAULT_MTU: usize = 1500;
pub const DEFAULT_TTL: u8 = 64;
pub const DEFAULT_ARP_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_ARP_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Smallest MTU every IPv4 host must accept (RFC 791).
const MIN_MTU: usize = 68;

/// Address and tuning parameters of the single interface the stack drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    /// Largest Ethernet payload, i.e. the largest IPv4 datagram on the wire.
    pub mtu: usize,
    /// TTL written into outgoing datagrams.
    pub ttl: u8,
    /// Lifetime of a resolved ARP cache entry.
    pub arp_timeout: Duration,
    /// How long a packet waits for an ARP reply before it is dropped and a
    /// new request may be sent.
    pub arp_min_interval: Duration,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            ip: Ipv4Addr::new(10, 0, 0, 1),
            mac: MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]),
            mtu: DEFAULT_MTU,
            ttl: DEFAULT_TTL,
            arp_timeout: DEFAULT_ARP_TIMEOUT,
            arp_min_interval: DEFAULT_ARP_MIN_INTERVAL,
        }
    }
}

impl StackConfig {
    pub fn new(ip: Ipv4Addr, mac: MacAddr) -> Self {
        StackConfig {
            ip,
            mac,
            ..Default::default()
        }
    }

    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_arp_timeout(mut self, timeout: Duration) -> Self {
        self.arp_timeout = timeout;
        self
    }

    pub fn with_arp_min_interval(mut self, interval: Duration) -> Self {
        self.arp_min_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.mtu < MIN_MTU {
            return Err(StackError::InvalidConfig("MTU below 68 bytes"));
        }
        if self.mtu > u16::MAX as usize {
            return Err(StackError::InvalidConfig("MTU above 65535 bytes"));
        }
        if self.ttl == 0 {
            return Err(StackError::InvalidConfig("TTL must be non-zero"));
        }
        Ok(())
    }
}
