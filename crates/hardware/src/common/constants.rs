//! Global Simulator Constants.
//!
//! This module defines the fixed machine parameters shared by every cache in the
//! simulator. It includes:
//! 1. **Address Constants:** Address width and word size used for tag/index/offset decoding.
//! 2. **Overhead Constants:** Per-line metadata widths used for overhead accounting.
//! 3. **Timing Constants:** The fixed hit time used by the average access time model.

/// Width of a byte address in bits.
pub const ADDRESS_LENGTH: u32 = 32;

/// Number of bits in a byte.
pub const BITS_PER_BYTE: u32 = 8;

/// Number of bytes in a data word.
pub const BYTES_PER_WORD: u32 = 4;

/// Bits of LRU recency state charged per line in overhead accounting.
pub const BITS_PER_LRU: u32 = 2;

/// Bits of valid state per line.
pub const BITS_PER_VALID: u32 = 1;

/// Bits of dirty state per line (only charged under write-back).
pub const BITS_PER_DIRTY: u32 = 1;

/// Cycles charged for a cache hit.
pub const CYCLES_PER_HIT: u64 = 1;
