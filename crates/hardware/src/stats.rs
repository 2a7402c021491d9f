//! Simulation statistics collection and reporting.
//!
//! This module tracks the counters of every coherent cache and derives the final figures.
//! It provides:
//! 1. **Counters:** `CacheStats`, the flat per-cache operation counters updated by the
//!    read/write handlers and by sibling snoops.
//! 2. **Aggregation:** `CacheSummary`, the hit ratio and average memory access time,
//!    computed once after the trace has been replayed.
//! 3. **Reporting:** `Report`, the per-cache report printed by the CLI or rendered as JSON.

use std::fmt;

use serde::Serialize;

use crate::common::addr::CacheGeometry;
use crate::common::constants::{BITS_PER_BYTE, CYCLES_PER_HIT};
use crate::config::WritePolicy;

/// Per-cache operation counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Memory operations handled by this cache.
    pub instructions: u64,
    /// Read operations.
    pub reads: u64,
    /// Write operations.
    pub writes: u64,
    /// Reads that found a valid matching line.
    pub read_hits: u64,
    /// Reads that had to fill a line.
    pub read_misses: u64,
    /// Writes that found a valid matching line.
    pub write_hits: u64,
    /// Writes that had to fill a line.
    pub write_misses: u64,
    /// Total hits.
    pub hits: u64,
    /// Total misses.
    pub misses: u64,
    /// Miss penalty cycles accumulated.
    pub cycles: u64,
    /// Misses that replaced a valid LRU victim.
    pub evictions: u64,

    /// Writes into the cache, all causes.
    pub writes_to_cache: u64,
    /// Writes into the cache filling a read miss.
    pub writes_to_cache_read_miss: u64,
    /// Writes into the cache performed by write operations.
    pub writes_to_cache_write_op: u64,

    /// Writes to memory, all causes.
    pub writes_to_memory: u64,
    /// Writes to memory when upgrading a Shared line for a local write.
    pub write_backs_access_need: u64,
    /// Writes to memory made when a remote request invalidated one of this cache's lines.
    pub blocks_invalidated: u64,
    /// Writes to memory of a dirty line about to be overwritten (write-back policy).
    pub write_backs_dirty: u64,
    /// Writes to memory forced by the write-through policy.
    pub write_throughs: u64,

    /// Lines in other caches invalidated by this cache's accesses.
    pub remote_invalidations: u64,
}

impl CacheStats {
    /// Sum of the per-cause memory write counters. Always equals `writes_to_memory`.
    pub const fn memory_writes_by_cause(&self) -> u64 {
        self.write_backs_access_need
            + self.blocks_invalidated
            + self.write_backs_dirty
            + self.write_throughs
    }
}

/// Figures derived from the final counters of one cache.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CacheSummary {
    /// `hits / instructions` (0 when the cache saw no operations).
    pub hit_ratio: f64,
    /// `hit_time + (1 - hit_ratio) * miss_penalty`, in cycles.
    pub avg_mem_access_time: f64,
}

impl CacheSummary {
    /// Computes the summary of one cache.
    pub fn from_stats(stats: &CacheStats, miss_penalty: u64) -> Self {
        let hit_ratio = if stats.instructions == 0 {
            0.0
        } else {
            stats.hits as f64 / stats.instructions as f64
        };
        let hit_time = CYCLES_PER_HIT as f64;
        let avg_mem_access_time = hit_time + (1.0 - hit_ratio) * miss_penalty as f64;
        Self {
            hit_ratio,
            avg_mem_access_time,
        }
    }
}

/// Final report for one cache.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheReport {
    /// Cache (core) id.
    pub cache_id: usize,
    /// Configured write policy.
    pub write_policy: WritePolicy,
    /// Cache geometry.
    pub geometry: CacheGeometry,
    /// Metadata bits stored per cache.
    pub overhead_bits: u64,
    /// Metadata bytes (bits rounded up to whole bytes).
    pub overhead_bytes: u64,
    /// Final counters.
    pub stats: CacheStats,
    /// Derived hit ratio and access time.
    pub summary: CacheSummary,
}

impl CacheReport {
    /// Builds the report of one cache from its geometry and counters.
    pub fn new(
        cache_id: usize,
        write_policy: WritePolicy,
        geometry: CacheGeometry,
        stats: CacheStats,
        miss_penalty: u64,
    ) -> Self {
        let overhead_bits =
            geometry.overhead_bits(matches!(write_policy, WritePolicy::WriteBack));
        Self {
            cache_id,
            write_policy,
            geometry,
            overhead_bits,
            overhead_bytes: overhead_bits.div_ceil(u64::from(BITS_PER_BYTE)),
            summary: CacheSummary::from_stats(&stats, miss_penalty),
            stats,
        }
    }
}

impl fmt::Display for CacheReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.geometry;
        let s = &self.stats;
        writeln!(f, "Cache ID: {}", self.cache_id)?;
        writeln!(f, "Total size of cache (data only) in bytes: {}", g.data_bytes())?;
        writeln!(f, "Total size of cache (data only) in words: {}", g.data_words())?;
        writeln!(f, "Total size of each block (data only) in bytes: {}", g.block_bytes())?;
        writeln!(f, "Total size of each block (data only) in words: {}", g.block_words())?;
        writeln!(f, "Total number of cache overhead bytes: {}", self.overhead_bytes)?;
        writeln!(f, "Total number of memory operations: {}", s.instructions)?;
        writeln!(f, "Total number of write ops: {}", s.writes)?;
        writeln!(f, "Total number of write hits: {}", s.write_hits)?;
        writeln!(f, "Total number of write misses: {}", s.write_misses)?;
        writeln!(f, "Total number of read ops: {}", s.reads)?;
        writeln!(f, "Total number of read hits: {}", s.read_hits)?;
        writeln!(f, "Total number of read misses: {}", s.read_misses)?;
        writeln!(f, "Total number of writes to mem: {}", s.writes_to_memory)?;
        writeln!(
            f,
            "Total number of writes to mem due to another cache needing access to shared block: {}",
            s.write_backs_access_need
        )?;
        writeln!(
            f,
            "Total number of writes to mem due to another cache invalidating and then modifying shared block: {}",
            s.blocks_invalidated
        )?;
        match self.write_policy {
            WritePolicy::WriteBack => writeln!(
                f,
                "Total number of writes to mem due to a read miss on a dirty block: {}",
                s.write_backs_dirty
            )?,
            WritePolicy::WriteThrough => writeln!(
                f,
                "Total number of writes to mem due to cache write w/ write-through policy: {}",
                s.write_throughs
            )?,
        }
        writeln!(f, "Total number of writes to cache: {}", s.writes_to_cache)?;
        writeln!(
            f,
            "Total number of writes to cache due to read misses(read from mem, write to cache): {}",
            s.writes_to_cache_read_miss
        )?;
        writeln!(
            f,
            "Total number of writes to cache due to write operations: {}",
            s.writes_to_cache_write_op
        )?;
        writeln!(f, "Total number of lines invalidated in other caches: {}", s.remote_invalidations)?;
        writeln!(f, "Hit ratio: {:.6}", self.summary.hit_ratio)?;
        writeln!(
            f,
            "Average memory access time: {:.6} cycles",
            self.summary.avg_mem_access_time
        )
    }
}

/// Final report of a whole simulation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    /// Number of cores (and caches).
    pub cores: usize,
    /// Trace operations applied.
    pub operations: u64,
    /// Trace lines skipped as malformed or out of range.
    pub skipped: u64,
    /// One report per cache, in core order.
    pub caches: Vec<CacheReport>,
}

impl Report {
    /// Miss penalty cycles summed over every cache.
    pub fn total_cycles(&self) -> u64 {
        self.caches.iter().map(|c| c.stats.cycles).sum()
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Prints the report to stdout.
    pub fn print(&self) {
        print!("{self}");
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of cores: {}", self.cores)?;
        for cache in &self.caches {
            writeln!(f, "{cache}")?;
        }
        Ok(())
    }
}

/// Writes the construction banner describing one cache's geometry.
///
/// # Errors
///
/// Propagates formatter errors.
pub fn write_geometry(
    f: &mut impl fmt::Write,
    geometry: &CacheGeometry,
    write_policy: WritePolicy,
) -> fmt::Result {
    writeln!(f, "Caches constructed!")?;
    writeln!(f, "Total size of each cache (data only) in bytes: {}", geometry.data_bytes())?;
    writeln!(f, "set associativity: {}", geometry.associativity())?;
    writeln!(f, "write policy: {write_policy}")?;
    writeln!(f, "bytes per block: {}", geometry.block_bytes())?;
    writeln!(f, "words per block: {}", geometry.block_words())?;
    writeln!(f, "num entries: {}", geometry.num_lines())?;
    writeln!(f, "num sets: {}", geometry.num_sets())?;
    writeln!(f, "entries per set: {}", geometry.associativity())?;
    writeln!(f, "tag length: {}", geometry.tag_bits())?;
    writeln!(f, "index length: {}", geometry.index_bits())?;
    writeln!(f, "offset length: {}", geometry.offset_bits())
}
