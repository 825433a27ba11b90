//! A small user-space IPv4 stack
//!
//! This library implements just enough of the Internet protocol suite to
//! answer pings and exchange UDP datagrams over an Ethernet device:
//! - Ethernet II framing
//! - ARP resolution with a timed cache
//! - IPv4 input validation and fragmenting output
//! - ICMP echo replies and destination unreachable messages
//! - UDP port dispatch
//!
//! Everything hangs off an [`Interface`], which is driven by calling
//! [`Interface::poll`] in a loop.

pub mod buffer;
pub mod config;
pub mod driver;
pub mod error;
pub mod iface;
pub mod link;
pub mod network;
pub mod store;
pub mod transport;

// Re-export commonly used types
pub use buffer::NetBuf;
pub use config::StackConfig;
pub use driver::{Driver, TapDriver};
pub use error::{Result, StackError};
pub use iface::{Interface, IpProtocol, UdpHandler};
pub use link::MacAddr;
pub use network::{Ipv4Header, UnreachableCode};
pub use store::{Clock, ManualClock, SystemClock};
