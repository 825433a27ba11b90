//! Link drivers
//!
//! The stack exchanges whole Ethernet frames with a [`Driver`]. On Linux a
//! TAP device is the natural backend: the kernel hands over and accepts
//! frames complete with the Ethernet header.

use std::io;

use tun_tap::{Iface, Mode};

pub trait Driver {
    /// Transmits one complete Ethernet frame.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Reads one frame into `buf`. Returns `Ok(None)` when nothing is
    /// waiting.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// Driver backed by a non-blocking Linux TAP device.
pub struct TapDriver {
    iface: Iface,
}

impl TapDriver {
    /// Opens (or creates) the TAP device `name`. Needs CAP_NET_ADMIN.
    pub fn open(name: &str) -> io::Result<Self> {
        let iface = Iface::without_packet_info(name, Mode::Tap)?;
        iface.set_non_blocking()?;
        Ok(TapDriver { iface })
    }

    /// Name the kernel gave the device.
    pub fn name(&self) -> &str {
        self.iface.name()
    }
}

impl Driver for TapDriver {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        let written = self.iface.send(frame)?;
        if written != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, frame.len()),
            ));
        }
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.iface.recv(buf) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}
