//! Snoop bus trait for cache coherence.
//!
//! This module defines the seam between a coherent cache and the domain that owns its
//! siblings. It provides:
//! 1. **Requests:** `BusRequest`, the three MSI bus transactions a cache can issue.
//! 2. **Replies:** `SnoopReply`, what one sibling did to its corresponding line.
//! 3. **Broadcast:** `SnoopBus`, which delivers a request to every other cache at the
//!    same `(set, slot)` coordinate and tallies the replies.

use crate::common::error::CoherenceError;

/// A coherence transaction issued by the cache performing an access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusRequest {
    /// Read fill of a line that was Invalid locally.
    Read,
    /// Write fill of a line that was Invalid locally.
    ReadExclusive,
    /// Local write to a Shared line.
    Upgrade,
}

/// What a sibling cache did with its corresponding line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SnoopReply {
    /// Nothing to do.
    Ignored,
    /// A Modified line was written to memory and invalidated.
    Flushed,
    /// A Shared line was invalidated.
    Invalidated,
}

/// Tally of the replies to one broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SnoopSummary {
    /// Siblings that flushed a Modified line.
    pub flushed: u64,
    /// Siblings that dropped a Shared line.
    pub invalidated: u64,
}

impl SnoopSummary {
    /// Adds one reply to the tally.
    pub const fn record(&mut self, reply: SnoopReply) {
        match reply {
            SnoopReply::Ignored => {}
            SnoopReply::Flushed => self.flushed += 1,
            SnoopReply::Invalidated => self.invalidated += 1,
        }
    }

    /// Total sibling lines this broadcast invalidated.
    pub const fn lines_invalidated(&self) -> u64 {
        self.flushed + self.invalidated
    }
}

/// Delivers bus requests to the caches sharing a coherence domain.
pub trait SnoopBus {
    /// Sends `request` for line `(set, slot)` to every cache except the requester.
    ///
    /// # Errors
    ///
    /// Returns a `CoherenceError` if a sibling cannot address the line.
    fn broadcast(
        &mut self,
        request: BusRequest,
        set: usize,
        slot: usize,
    ) -> Result<SnoopSummary, CoherenceError>;
}
