//! Multicore cache coherence simulator library.
//!
//! This crate replays a trace of memory operations through one private cache per core and
//! keeps the caches coherent with the MSI snooping protocol:
//! 1. **Common:** Address decoding, access types, constants and error types.
//! 2. **Config:** Geometry, miss penalty, write policy and core count, with validation.
//! 3. **Core:** The per-core coherent cache (lines, LRU sets, read/write handlers).
//! 4. **SoC:** The coherence domain owning every cache and routing snoops between them.
//! 5. **Simulation:** Trace parsing, in-order replay and statistics reporting.

/// Common types and constants (addresses, geometry, access types, errors).
pub mod common;
/// Simulator configuration (defaults, write policy, validation).
pub mod config;
/// Per-core coherent cache.
pub mod core;
/// Trace parsing and replay.
pub mod sim;
/// Coherence domain and snoop bus.
pub mod soc;
/// Statistics counters, aggregation and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// The caches of every core; construct with `CoherenceDomain::new`.
pub use crate::soc::CoherenceDomain;
/// Trace replay driver.
pub use crate::sim::Simulator;
/// Final simulation report.
pub use crate::stats::Report;
