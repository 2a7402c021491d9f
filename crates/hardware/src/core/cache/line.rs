//! Cache line state.
//!
//! A `CacheLine` is created Invalid when its cache is built and is reused in place for
//! the lifetime of the cache. Its slot number within the owning set never changes, which
//! is what lets sibling caches address "the same" line positionally during a snoop.

use std::fmt;

/// MSI coherence state of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MsiState {
    /// No valid data.
    #[default]
    Invalid,
    /// Readable copy, possibly replicated in other caches.
    Shared,
    /// Exclusive, dirty copy.
    Modified,
}

impl MsiState {
    /// Returns the protocol letter (`I`, `S` or `M`).
    pub const fn as_char(self) -> char {
        match self {
            Self::Invalid => 'I',
            Self::Shared => 'S',
            Self::Modified => 'M',
        }
    }
}

impl fmt::Display for MsiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One cache line: tag, valid/dirty bits, MSI state and LRU recency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheLine {
    tag: u32,
    valid: bool,
    dirty: bool,
    state: MsiState,
    /// Accesses to the set since this line was last used (0 = most recent).
    lru_counter: u64,
    slot: usize,
}

impl CacheLine {
    /// Creates an Invalid line at position `slot` of its set.
    pub const fn new(slot: usize) -> Self {
        Self {
            tag: 0,
            valid: false,
            dirty: false,
            state: MsiState::Invalid,
            lru_counter: 0,
            slot,
        }
    }

    /// Stored tag (0 while invalid).
    #[inline]
    pub const fn tag(&self) -> u32 {
        self.tag
    }

    /// Valid bit.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Dirty bit.
    #[inline]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Coherence state.
    #[inline]
    pub const fn state(&self) -> MsiState {
        self.state
    }

    /// LRU recency counter.
    #[inline]
    pub const fn lru_counter(&self) -> u64 {
        self.lru_counter
    }

    /// Position of this line within its set.
    #[inline]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Returns true if the line is valid and holds `tag`.
    #[inline]
    pub const fn holds(&self, tag: u32) -> bool {
        self.valid && self.tag == tag
    }

    pub(crate) const fn age(&mut self) {
        self.lru_counter += 1;
    }

    pub(crate) const fn make_most_recent(&mut self) {
        self.lru_counter = 0;
    }

    /// Installs `tag` in the given state. Dirty is set for Modified fills and left
    /// untouched otherwise.
    pub(crate) const fn fill(&mut self, tag: u32, state: MsiState) {
        self.tag = tag;
        self.state = state;
        self.valid = true;
        if matches!(state, MsiState::Modified) {
            self.dirty = true;
        }
    }

    /// Drops the line back to Invalid, clearing tag, flags and recency.
    pub(crate) const fn invalidate(&mut self) {
        self.state = MsiState::Invalid;
        self.valid = false;
        self.dirty = false;
        self.tag = 0;
        self.lru_counter = 0;
    }
}
