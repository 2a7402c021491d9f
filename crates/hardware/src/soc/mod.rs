//! Coherence domain components.
//!
//! This module organizes the pieces that connect the per-core caches: the snoop bus
//! trait and the domain that owns every cache and mediates snooping between them.

/// Coherence domain: the caches of every core and snoop routing between them.
pub mod interconnect;

/// Snoop bus trait and bus transaction types.
pub mod traits;

pub use interconnect::CoherenceDomain;
