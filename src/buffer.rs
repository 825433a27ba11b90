//! Packet buffer with reserved room for headers and trailing padding.
//!
//! A [`NetBuf`] owns a fixed-size allocation and exposes a window into it.
//! Layers grow the window backwards to attach their header on the way out
//! and shrink it forwards to strip it on the way in. Bytes outside the
//! window are left untouched, so a header that was pulled can be pushed back
//! and reappears exactly as it was received.

use crate::error::{Result, StackError};

/// Room kept in front of the payload for Ethernet, IPv4 and UDP headers.
pub const DEFAULT_HEADROOM: usize = 128;

/// Room kept behind the payload so short frames can be padded in place.
pub const DEFAULT_TAILROOM: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetBuf {
    storage: Vec<u8>,
    start: usize,
    end: usize,
}

impl NetBuf {
    /// A zero-filled buffer of `len` bytes with default head and tail room.
    pub fn new(len: usize) -> Self {
        Self::with_room(len, DEFAULT_HEADROOM, DEFAULT_TAILROOM)
    }

    pub fn with_room(len: usize, headroom: usize, tailroom: usize) -> Self {
        NetBuf {
            storage: vec![0u8; headroom + len + tailroom],
            start: headroom,
            end: headroom + len,
        }
    }

    /// Copies `data` into a fresh buffer with default head and tail room.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut buf = Self::new(data.len());
        buf.as_mut_slice().copy_from_slice(data);
        buf
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn headroom(&self) -> usize {
        self.start
    }

    pub fn tailroom(&self) -> usize {
        self.storage.len() - self.end
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.end]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.end]
    }

    /// Extends the window `n` bytes towards the front and returns the newly
    /// exposed bytes so the caller can write a header into them.
    pub fn push_header(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.start {
            return Err(StackError::Headroom {
                needed: n,
                available: self.start,
            });
        }
        self.start -= n;
        Ok(&mut self.storage[self.start..self.start + n])
    }

    pub fn pull_header(&mut self, n: usize) -> Result<()> {
        if n > self.len() {
            return Err(StackError::Underflow {
                requested: n,
                len: self.len(),
            });
        }
        self.start += n;
        Ok(())
    }

    /// Appends `n` zero bytes to the end of the window.
    pub fn push_padding(&mut self, n: usize) -> Result<()> {
        if n > self.tailroom() {
            return Err(StackError::Tailroom {
                needed: n,
                available: self.tailroom(),
            });
        }
        self.storage[self.end..self.end + n].fill(0);
        self.end += n;
        Ok(())
    }

    pub fn pull_padding(&mut self, n: usize) -> Result<()> {
        if n > self.len() {
            return Err(StackError::Underflow {
                requested: n,
                len: self.len(),
            });
        }
        self.end -= n;
        Ok(())
    }
}
