//! Transport layer wire formats
//!
//! - UDP: User Datagram Protocol header and pseudo-header checksum

pub mod udp;

pub use udp::{PseudoHeader, UdpHeader, UDP_HEADER_LEN};
