//! Coherence domain: the per-core caches and the snoop routing between them.
//!
//! This module implements the component that replaces a real snooping bus. It provides:
//! 1. **Ownership:** One `CoherentCache` per core, all built from the same geometry.
//! 2. **Dispatch:** Each access is decoded once and handed to the target cache.
//! 3. **Snoop routing:** The target cache broadcasts through a borrowed view of its
//!    siblings; every sibling is addressed at the same `(set, slot)` coordinate.
//!    Identical geometry is what makes that positional correspondence meaningful.
//! 4. **Checking:** `check_invariants` verifies in-use counts and MSI exclusivity.

use tracing::trace;

use super::traits::{BusRequest, SnoopBus, SnoopSummary};
use crate::common::addr::{CacheGeometry, PhysAddr};
use crate::common::data::AccessType;
use crate::common::error::{CoherenceError, ConfigError, SimError};
use crate::config::Config;
use crate::core::cache::{AccessOutcome, CacheLine, CoherentCache, MsiState};
use crate::stats::{CacheReport, CacheSummary};

/// Every cache of a simulated multicore system.
#[derive(Clone, Debug)]
pub struct CoherenceDomain {
    config: Config,
    geometry: CacheGeometry,
    caches: Vec<CoherentCache>,
}

impl CoherenceDomain {
    /// Builds one empty cache per configured core.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` of the first invalid configuration parameter.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let geometry = config.geometry()?;
        let caches = (0..config.cores as usize)
            .map(|id| CoherentCache::new(id, geometry, config))
            .collect();
        Ok(Self {
            config: config.clone(),
            geometry,
            caches,
        })
    }

    /// Applies one memory operation issued by `core`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::CoreOutOfRange` for an unknown core, or `SimError::Coherence`
    /// if a set invariant is broken.
    pub fn access(
        &mut self,
        core: usize,
        addr: PhysAddr,
        kind: AccessType,
    ) -> Result<AccessOutcome, SimError> {
        let cores = self.caches.len();
        let decoded = self.geometry.decode(addr);
        let (before, rest) = self.caches.split_at_mut(core.min(cores));
        let (current, after) = rest
            .split_first_mut()
            .ok_or(SimError::CoreOutOfRange { core, cores })?;

        trace!(core, addr = addr.val(), tag = decoded.tag, set = decoded.index, %kind, "access");
        let mut siblings = Siblings { before, after };
        Ok(current.access(kind, decoded, &mut siblings)?)
    }

    /// The configuration the domain was built from.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Geometry shared by every cache.
    pub const fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Number of cores (and caches).
    pub fn num_cores(&self) -> usize {
        self.caches.len()
    }

    /// All caches, in core order.
    pub fn caches(&self) -> &[CoherentCache] {
        &self.caches
    }

    /// The cache of `core`, if it exists.
    pub fn cache(&self, core: usize) -> Option<&CoherentCache> {
        self.caches.get(core)
    }

    /// The line of cache `core` at `(set, slot)`: the line corresponding to the same
    /// coordinate in every other cache of the domain.
    pub fn corresponding_line(&self, core: usize, set: usize, slot: usize) -> Option<&CacheLine> {
        self.caches.get(core).and_then(|c| c.line(set, slot))
    }

    /// Hit ratio and average access time of every cache.
    pub fn summaries(&self) -> Vec<CacheSummary> {
        self.caches.iter().map(CoherentCache::summary).collect()
    }

    /// Final per-cache reports.
    pub fn reports(&self) -> Vec<CacheReport> {
        self.caches.iter().map(CoherentCache::report).collect()
    }

    /// Verifies that every set's in-use count matches its valid lines and that no line
    /// Modified in one cache is valid in another.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), CoherenceError> {
        for cache in &self.caches {
            for set in cache.sets() {
                let valid = set.valid_lines();
                if set.in_use() != valid || valid > set.capacity() {
                    return Err(CoherenceError::InUseMismatch {
                        core: cache.id(),
                        set: set.id(),
                        in_use: set.in_use(),
                        valid,
                    });
                }
                for line in set.lines().iter().filter(|l| l.state() == MsiState::Modified) {
                    for other in self.caches.iter().filter(|c| c.id() != cache.id()) {
                        let peer = other
                            .line(set.id(), line.slot())
                            .ok_or(CoherenceError::SlotOutOfRange {
                                set: set.id(),
                                slot: line.slot(),
                            })?;
                        if peer.state() != MsiState::Invalid {
                            return Err(CoherenceError::ExclusivityViolated {
                                set: set.id(),
                                slot: line.slot(),
                                owner: cache.id(),
                                other: other.id(),
                                state: peer.state().as_char(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// The caches other than the one performing an access, in core order.
#[derive(Debug)]
struct Siblings<'a> {
    before: &'a mut [CoherentCache],
    after: &'a mut [CoherentCache],
}

impl SnoopBus for Siblings<'_> {
    fn broadcast(
        &mut self,
        request: BusRequest,
        set: usize,
        slot: usize,
    ) -> Result<SnoopSummary, CoherenceError> {
        let mut summary = SnoopSummary::default();
        for cache in self.before.iter_mut().chain(self.after.iter_mut()) {
            summary.record(cache.snoop(request, set, slot)?);
        }
        Ok(summary)
    }
}
