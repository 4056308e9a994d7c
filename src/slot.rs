//! Fixed-capacity read buffers handed between the reader and the parser.
//!
//! A slot moves through a small state machine:
//!
//! ```text
//! Empty --fill(n > 0)--> Full --claim--> Busy --release--> Empty
//! Empty --fill(0)------> Done
//! ```
//!
//! Only the actor currently holding the `Slot` value may transition it, so
//! ownership of the bytes travels with the state change.

use std::collections::TryReserveError;
use std::io::{self, Read};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Available to the reader.
    Empty,
    /// Holds unparsed bytes.
    Full,
    /// Being parsed.
    Busy,
    /// Input ended; never refilled.
    Done,
}

#[derive(Debug)]
pub struct Slot {
    index: usize,
    state: SlotState,
    buf: Vec<u8>,
    len: usize,
}

impl Slot {
    pub fn new(index: usize, capacity: usize) -> Result<Self, TryReserveError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)?;
        buf.resize(capacity, 0);
        Ok(Self {
            index,
            state: SlotState::Empty,
            buf,
            len: 0,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when the last fill stopped before the slot was full, which
    /// means the input has no more bytes.
    pub fn is_short(&self) -> bool {
        self.len < self.buf.len()
    }

    /// Read until the slot is full or the input is exhausted.
    ///
    /// Interrupted reads are retried. A fill of zero bytes moves the slot to
    /// `Done`, anything else to `Full`.
    pub fn fill_from<R: Read + ?Sized>(&mut self, input: &mut R) -> io::Result<usize> {
        debug_assert_eq!(self.state, SlotState::Empty, "slot {} refilled", self.index);
        let mut filled = 0;
        while filled < self.buf.len() {
            match input.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.len = filled;
        self.state = if filled == 0 {
            SlotState::Done
        } else {
            SlotState::Full
        };
        trace!(slot = self.index, bytes = filled, state = ?self.state, "slot filled");
        Ok(filled)
    }

    /// Take a full slot for parsing and expose its bytes.
    pub fn claim(&mut self) -> &[u8] {
        debug_assert_eq!(self.state, SlotState::Full, "slot {} claimed", self.index);
        self.state = SlotState::Busy;
        &self.buf[..self.len]
    }

    /// Hand a parsed slot back for reuse.
    pub fn release(&mut self) {
        debug_assert_eq!(self.state, SlotState::Busy, "slot {} released", self.index);
        self.state = SlotState::Empty;
        self.len = 0;
        trace!(slot = self.index, "slot released");
    }
}
