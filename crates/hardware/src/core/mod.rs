//! Per-core cache model.
//!
//! This module contains the private cache of each core: its lines, its replacement
//! sets and the MSI read/write handlers.

/// Coherent set-associative cache (lines, sets, read/write handling).
pub mod cache;

pub use self::cache::CoherentCache;
