//! Helpers shared by the demos: host-side interface setup and a stderr
//! logger.

pub mod logger;
pub mod network;

pub use logger::init_logger;
pub use network::configure_interface;
