//! Replacement set: the lines sharing one set index.
//!
//! Lookup is a linear scan over the ways. Victim selection is LRU by recency counter:
//! every access to the set ages the other lines by one and resets the touched line to 0,
//! so the line with the highest counter is the least recently used.
//!
//! # Performance
//!
//! - `find_by_tag()`, `find_unused()`, `select_lru_victim()`, `touch()`: O(W) where W
//!   is the associativity.

use crate::common::error::CoherenceError;

use super::line::CacheLine;

/// A fixed-capacity set of cache lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplacementSet {
    id: usize,
    lines: Vec<CacheLine>,
    in_use: usize,
}

impl ReplacementSet {
    /// Creates set `id` with `ways` Invalid lines.
    pub fn new(id: usize, ways: usize) -> Self {
        Self {
            id,
            lines: (0..ways).map(CacheLine::new).collect(),
            in_use: 0,
        }
    }

    /// Index of this set within its cache.
    #[inline]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Number of lines (the associativity).
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.lines.len()
    }

    /// Number of lines currently in use.
    #[inline]
    pub const fn in_use(&self) -> usize {
        self.in_use
    }

    /// Returns true when every line is in use.
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.in_use == self.lines.len()
    }

    /// All lines, in slot order.
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    /// The line at `slot`, if it exists.
    pub fn line(&self, slot: usize) -> Option<&CacheLine> {
        self.lines.get(slot)
    }

    pub(crate) fn line_mut(&mut self, slot: usize) -> Result<&mut CacheLine, CoherenceError> {
        let set = self.id;
        self.lines
            .get_mut(slot)
            .ok_or(CoherenceError::SlotOutOfRange { set, slot })
    }

    /// Slot of the valid line holding `tag`. At most one can match.
    pub fn find_by_tag(&self, tag: u32) -> Option<usize> {
        self.lines.iter().position(|line| line.holds(tag))
    }

    /// Slot of the valid line holding `tag`.
    ///
    /// # Errors
    ///
    /// Returns `CoherenceError::MissingTag` when no valid line holds it.
    pub fn slot_of(&self, tag: u32) -> Result<usize, CoherenceError> {
        self.find_by_tag(tag)
            .ok_or(CoherenceError::MissingTag { set: self.id, tag })
    }

    /// First slot whose line is not valid.
    ///
    /// # Errors
    ///
    /// Returns `CoherenceError::SetFull` when every line is in use.
    pub fn find_unused(&self) -> Result<usize, CoherenceError> {
        let full = || CoherenceError::SetFull {
            set: self.id,
            in_use: self.in_use,
            capacity: self.lines.len(),
        };
        if self.is_full() {
            return Err(full());
        }
        self.lines
            .iter()
            .position(|line| !line.is_valid())
            .ok_or_else(full)
    }

    /// Slot with the strictly highest recency counter; ties go to the lowest slot.
    ///
    /// # Errors
    ///
    /// Returns `CoherenceError::SetNotFull` when the set still has an unused line.
    pub fn select_lru_victim(&self) -> Result<usize, CoherenceError> {
        if !self.is_full() {
            return Err(CoherenceError::SetNotFull {
                set: self.id,
                in_use: self.in_use,
                capacity: self.lines.len(),
            });
        }
        let mut victim = 0;
        for (slot, line) in self.lines.iter().enumerate().skip(1) {
            if line.lru_counter() > self.lines[victim].lru_counter() {
                victim = slot;
            }
        }
        Ok(victim)
    }

    /// Reserves the first unused line and counts it as in use.
    ///
    /// # Errors
    ///
    /// Returns `CoherenceError::SetFull` when no line is free.
    pub(crate) fn claim_unused(&mut self) -> Result<usize, CoherenceError> {
        let slot = self.find_unused()?;
        self.in_use += 1;
        Ok(slot)
    }

    /// Makes `slot` the most recently used line and ages every other line.
    pub fn touch(&mut self, slot: usize) {
        for (i, line) in self.lines.iter_mut().enumerate() {
            if i == slot {
                line.make_most_recent();
            } else {
                line.age();
            }
        }
    }

    /// Invalidates the line at `slot`, releasing it if it was in use.
    pub(crate) fn evict(&mut self, slot: usize) -> Result<(), CoherenceError> {
        let line = self.line_mut(slot)?;
        let was_valid = line.is_valid();
        line.invalidate();
        if was_valid {
            self.in_use -= 1;
        }
        Ok(())
    }

    /// Number of valid lines, recounted from scratch.
    pub fn valid_lines(&self) -> usize {
        self.lines.iter().filter(|line| line.is_valid()).count()
    }
}
