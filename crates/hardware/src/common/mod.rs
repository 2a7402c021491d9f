//! Common utilities and types used throughout the cache simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Address Types:** A strong byte-address type and the tag/index/offset decoder.
//! 2. **Constants:** Address width, word size and overhead widths.
//! 3. **Memory Access:** The read/write classification of trace operations.
//! 4. **Error Handling:** Configuration, coherence and top-level simulation errors.

/// Byte addresses and cache geometry (address decoding).
pub mod addr;

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::{CacheGeometry, DecodedAddr, PhysAddr};
pub use constants::ADDRESS_LENGTH;
pub use data::AccessType;
pub use error::{CoherenceError, ConfigError, SimError};
