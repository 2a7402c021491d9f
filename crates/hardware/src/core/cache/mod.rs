//! Coherent set-associative cache.
//!
//! One `CoherentCache` models the private cache of one core. It owns its sets, its
//! geometry and its counters, and handles the read and write paths of the MSI protocol:
//! 1. **Classification:** hit on a valid matching line, otherwise fill an unused line or
//!    replace the LRU victim of a full set.
//! 2. **Coherence:** depending on the pre-access state of the chosen line, a bus request
//!    is broadcast to the sibling caches through a [`SnoopBus`].
//! 3. **Write policy:** after the coherence step, write-through and write-back decide the
//!    memory traffic of a write.
//! 4. **Finalization:** LRU bump, new tag, Shared (read) or Modified (write) state.
//!
//! Sibling caches react to broadcasts through [`CoherentCache::snoop`].

/// Cache line and MSI state.
pub mod line;

/// Replacement set with LRU victim selection.
pub mod set;

use tracing::{debug, trace};

use crate::common::addr::{CacheGeometry, DecodedAddr};
use crate::common::data::AccessType;
use crate::common::error::CoherenceError;
use crate::config::{Config, WritePolicy};
use crate::soc::traits::{BusRequest, SnoopBus, SnoopReply, SnoopSummary};
use crate::stats::{CacheReport, CacheStats, CacheSummary};

pub use self::line::{CacheLine, MsiState};
pub use self::set::ReplacementSet;

/// Result of one access, as seen by the cache that performed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessOutcome {
    /// Read or write.
    pub kind: AccessType,
    /// True when a valid line already held the tag.
    pub hit: bool,
    /// Set index.
    pub set: usize,
    /// Line used within the set.
    pub slot: usize,
    /// Tag now held by the line.
    pub tag: u32,
    /// State of the line before the access.
    pub previous: MsiState,
    /// Tag of the valid line replaced on an LRU eviction.
    pub evicted: Option<u32>,
    /// Sibling replies to the bus request, if one was issued.
    pub snoop: SnoopSummary,
    /// Writes to memory charged to this cache by the access.
    pub memory_writes: u64,
}

/// Line chosen for an access before any state changes.
#[derive(Clone, Copy, Debug)]
struct Placement {
    slot: usize,
    hit: bool,
    evicted: Option<u32>,
}

/// Private cache of one core.
#[derive(Clone, Debug)]
pub struct CoherentCache {
    id: usize,
    geometry: CacheGeometry,
    write_policy: WritePolicy,
    miss_penalty: u64,
    sets: Vec<ReplacementSet>,
    stats: CacheStats,
}

impl CoherentCache {
    /// Creates an empty cache for core `id`.
    ///
    /// # Arguments
    ///
    /// * `id` - Core (and cache) number.
    /// * `geometry` - Geometry shared by the whole domain.
    /// * `config` - Source of the write policy and miss penalty.
    pub fn new(id: usize, geometry: CacheGeometry, config: &Config) -> Self {
        let ways = geometry.associativity() as usize;
        let sets = (0..geometry.num_sets() as usize)
            .map(|set| ReplacementSet::new(set, ways))
            .collect();
        Self {
            id,
            geometry,
            write_policy: config.write_policy,
            miss_penalty: config.miss_penalty,
            sets,
            stats: CacheStats::default(),
        }
    }

    /// Core (and cache) number.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Cache geometry.
    pub const fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Configured write policy.
    pub const fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Cycles charged per miss.
    pub const fn miss_penalty(&self) -> u64 {
        self.miss_penalty
    }

    /// Operation counters.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// All sets, in index order.
    pub fn sets(&self) -> &[ReplacementSet] {
        &self.sets
    }

    /// The set at `index`, if it exists.
    pub fn set(&self, index: usize) -> Option<&ReplacementSet> {
        self.sets.get(index)
    }

    /// The line at `(set, slot)`, if it exists.
    pub fn line(&self, set: usize, slot: usize) -> Option<&CacheLine> {
        self.sets.get(set).and_then(|s| s.line(slot))
    }

    /// The valid line holding the block of `addr`.
    ///
    /// # Errors
    ///
    /// Returns `CoherenceError::MissingTag` when the block is not cached.
    pub fn lookup(&self, addr: DecodedAddr) -> Result<&CacheLine, CoherenceError> {
        let set = self
            .sets
            .get(addr.index)
            .ok_or(CoherenceError::SlotOutOfRange { set: addr.index, slot: 0 })?;
        let slot = set.slot_of(addr.tag)?;
        set.line(slot)
            .ok_or(CoherenceError::SlotOutOfRange { set: addr.index, slot })
    }

    /// Hit ratio and average memory access time from the current counters.
    pub fn summary(&self) -> CacheSummary {
        CacheSummary::from_stats(&self.stats, self.miss_penalty)
    }

    /// Final report for this cache.
    pub fn report(&self) -> CacheReport {
        CacheReport::new(
            self.id,
            self.write_policy,
            self.geometry,
            self.stats.clone(),
            self.miss_penalty,
        )
    }

    /// Handles one access, snooping sibling caches through `bus` as required.
    ///
    /// # Errors
    ///
    /// Returns a `CoherenceError` if a set invariant is found broken.
    pub fn access<B>(
        &mut self,
        kind: AccessType,
        addr: DecodedAddr,
        bus: &mut B,
    ) -> Result<AccessOutcome, CoherenceError>
    where
        B: SnoopBus + ?Sized,
    {
        self.stats.instructions += 1;
        match kind {
            AccessType::Read => self.read(addr, bus),
            AccessType::Write => self.write(addr, bus),
        }
    }

    fn read<B>(&mut self, addr: DecodedAddr, bus: &mut B) -> Result<AccessOutcome, CoherenceError>
    where
        B: SnoopBus + ?Sized,
    {
        self.stats.reads += 1;
        let placement = self.place(addr)?;
        if placement.hit {
            self.stats.hits += 1;
            self.stats.read_hits += 1;
        } else {
            self.stats.cycles += self.miss_penalty;
            self.stats.misses += 1;
            self.stats.writes_to_cache += 1;
            self.stats.writes_to_cache_read_miss += 1;
            self.stats.read_misses += 1;
        }

        let previous = self.line_mut(addr.index, placement.slot)?.state();
        let snoop = match previous {
            MsiState::Invalid => bus.broadcast(BusRequest::Read, addr.index, placement.slot)?,
            // A Shared or Modified line already supplies the data.
            MsiState::Shared | MsiState::Modified => SnoopSummary::default(),
        };
        self.stats.remote_invalidations += snoop.lines_invalidated();
        if snoop.flushed == 0 && previous == MsiState::Invalid {
            trace!(core = self.id, set = addr.index, "no Modified copy, filling from memory");
        }

        self.finalize(addr, placement.slot, MsiState::Shared)?;
        Ok(AccessOutcome {
            kind: AccessType::Read,
            hit: placement.hit,
            set: addr.index,
            slot: placement.slot,
            tag: addr.tag,
            previous,
            evicted: placement.evicted,
            snoop,
            memory_writes: 0,
        })
    }

    fn write<B>(&mut self, addr: DecodedAddr, bus: &mut B) -> Result<AccessOutcome, CoherenceError>
    where
        B: SnoopBus + ?Sized,
    {
        self.stats.writes += 1;
        self.stats.writes_to_cache += 1;
        self.stats.writes_to_cache_write_op += 1;
        let placement = self.place(addr)?;
        if placement.hit {
            self.stats.hits += 1;
            self.stats.write_hits += 1;
        } else {
            self.stats.cycles += self.miss_penalty;
            self.stats.misses += 1;
            self.stats.write_misses += 1;
        }

        let line = self.line_mut(addr.index, placement.slot)?;
        let previous = line.state();
        let dirty_before = line.is_valid() && line.is_dirty();

        let mut memory_writes = 0;
        let snoop = match previous {
            MsiState::Invalid => {
                bus.broadcast(BusRequest::ReadExclusive, addr.index, placement.slot)?
            }
            MsiState::Modified => SnoopSummary::default(),
            MsiState::Shared => {
                let summary = bus.broadcast(BusRequest::Upgrade, addr.index, placement.slot)?;
                // The upgrade is charged as a memory write even under write-back.
                self.stats.write_backs_access_need += 1;
                self.stats.writes_to_memory += 1;
                memory_writes += 1;
                summary
            }
        };
        self.stats.remote_invalidations += snoop.lines_invalidated();

        match (self.write_policy, dirty_before) {
            (WritePolicy::WriteThrough, _) => {
                trace!(core = self.id, "write-through: writing new value to memory");
                self.stats.writes_to_memory += 1;
                self.stats.write_throughs += 1;
                memory_writes += 1;
            }
            (WritePolicy::WriteBack, true) => {
                trace!(core = self.id, "write-back: writing dirty block to memory");
                self.stats.write_backs_dirty += 1;
                self.stats.writes_to_memory += 1;
                memory_writes += 1;
            }
            (WritePolicy::WriteBack, false) => {}
        }

        self.finalize(addr, placement.slot, MsiState::Modified)?;
        Ok(AccessOutcome {
            kind: AccessType::Write,
            hit: placement.hit,
            set: addr.index,
            slot: placement.slot,
            tag: addr.tag,
            previous,
            evicted: placement.evicted,
            snoop,
            memory_writes,
        })
    }

    /// Reacts to a bus request from another cache for the line at `(set, slot)`.
    ///
    /// # Errors
    ///
    /// Returns `CoherenceError::SlotOutOfRange` if the coordinate is not in this cache.
    pub fn snoop(
        &mut self,
        request: BusRequest,
        set: usize,
        slot: usize,
    ) -> Result<SnoopReply, CoherenceError> {
        let state = self
            .line(set, slot)
            .ok_or(CoherenceError::SlotOutOfRange { set, slot })?
            .state();

        let reply = match (request, state) {
            (_, MsiState::Invalid) | (BusRequest::Read, MsiState::Shared) => SnoopReply::Ignored,
            // Unreachable while exclusivity holds for Upgrade; flushed all the same.
            (_, MsiState::Modified) => {
                self.stats.writes_to_memory += 1;
                self.stats.blocks_invalidated += 1;
                SnoopReply::Flushed
            }
            (BusRequest::ReadExclusive, MsiState::Shared) => SnoopReply::Invalidated,
            (BusRequest::Upgrade, MsiState::Shared) => {
                self.stats.writes_to_memory += 1;
                self.stats.blocks_invalidated += 1;
                SnoopReply::Invalidated
            }
        };

        if reply != SnoopReply::Ignored {
            debug!(core = self.id, set, slot, ?request, ?reply, "snoop invalidated line");
            self.set_mut(set)?.evict(slot)?;
        }
        Ok(reply)
    }

    fn place(&mut self, addr: DecodedAddr) -> Result<Placement, CoherenceError> {
        let core = self.id;
        let set = self.set_mut(addr.index)?;

        if let Some(slot) = set.find_by_tag(addr.tag) {
            debug!(core, set = addr.index, slot, tag = addr.tag, "hit");
            return Ok(Placement {
                slot,
                hit: true,
                evicted: None,
            });
        }

        if set.is_full() {
            let slot = set.select_lru_victim()?;
            let evicted = set.line(slot).map(CacheLine::tag);
            debug!(core, set = addr.index, slot, tag = addr.tag, "miss, replacing LRU line");
            self.stats.evictions += 1;
            return Ok(Placement {
                slot,
                hit: false,
                evicted,
            });
        }

        let slot = set.claim_unused()?;
        debug!(core, set = addr.index, slot, tag = addr.tag, "miss, filling unused line");
        Ok(Placement {
            slot,
            hit: false,
            evicted: None,
        })
    }

    fn finalize(&mut self, addr: DecodedAddr, slot: usize, state: MsiState) -> Result<(), CoherenceError> {
        let set = self.set_mut(addr.index)?;
        set.touch(slot);
        set.line_mut(slot)?.fill(addr.tag, state);
        Ok(())
    }

    fn set_mut(&mut self, index: usize) -> Result<&mut ReplacementSet, CoherenceError> {
        self.sets
            .get_mut(index)
            .ok_or(CoherenceError::SlotOutOfRange { set: index, slot: 0 })
    }

    fn line_mut(&mut self, set: usize, slot: usize) -> Result<&mut CacheLine, CoherenceError> {
        self.set_mut(set)?.line_mut(slot)
    }
}
