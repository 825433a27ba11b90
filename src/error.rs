//! Error types for the outbound paths of the stack.
//!
//! Inbound packets that fail validation are dropped without an error value;
//! only operations a caller can act on return a [`StackError`].

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("UDP port {0} already has a handler")]
    PortInUse(u16),

    #[error("protocol {0:#06x} already has a handler")]
    ProtocolInUse(u16),

    #[error("not enough headroom: need {needed} bytes, have {available}")]
    Headroom { needed: usize, available: usize },

    #[error("not enough tailroom: need {needed} bytes, have {available}")]
    Tailroom { needed: usize, available: usize },

    #[error("cannot remove {requested} bytes from a {len}-byte buffer")]
    Underflow { requested: usize, len: usize },

    #[error("payload of {0} bytes does not fit in an IPv4 datagram")]
    PayloadTooLarge(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("driver error: {0}")]
    Driver(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, StackError>;
