//! Byte addresses and cache geometry.
//!
//! This module defines the address type replayed from traces and the decoder that
//! splits it into cache coordinates. It provides the following:
//! 1. **Type Safety:** `PhysAddr` keeps raw trace addresses apart from tags and indices.
//! 2. **Geometry:** `CacheGeometry` derives set count and tag/index/offset widths from
//!    block size, capacity and associativity, rejecting non-power-of-two layouts.
//! 3. **Decoding:** `CacheGeometry::decode` maps a byte address to `(tag, index, offset)`.

use serde::Serialize;

use super::constants::{
    ADDRESS_LENGTH, BITS_PER_DIRTY, BITS_PER_LRU, BITS_PER_VALID, BYTES_PER_WORD,
};
use super::error::ConfigError;

/// A 32-bit byte address as it appears in a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysAddr(pub u32);

impl PhysAddr {
    /// Creates a new address from a raw 32-bit value.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw 32-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PhysAddr {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}

/// A byte address split into cache coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedAddr {
    /// The top `tag_bits` bits of the address.
    pub tag: u32,
    /// Set index, `(address / block_bytes) % num_sets`.
    pub index: usize,
    /// Byte offset within the block. Not consumed by the coherence engine.
    pub offset: u32,
}

/// Geometry shared by every cache of a coherence domain.
///
/// A `CacheGeometry` can only be built from power-of-two parameters that describe
/// at least one full set, so every value of this type is safe to decode with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    block_words: u32,
    data_words: u32,
    associativity: u32,
    num_lines: u32,
    num_sets: u32,
    offset_bits: u32,
    index_bits: u32,
    tag_bits: u32,
}

impl CacheGeometry {
    /// Builds the geometry of one cache.
    ///
    /// # Arguments
    ///
    /// * `block_words` - Block size in 4-byte words.
    /// * `data_words` - Total data capacity in words.
    /// * `associativity` - Number of lines per set.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` for the first violated constraint: each parameter
    /// must be a power of two, the block must fit the capacity, and the associativity
    /// may not exceed the number of lines.
    pub fn new(block_words: u32, data_words: u32, associativity: u32) -> Result<Self, ConfigError> {
        if !block_words.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(block_words));
        }
        if !data_words.is_power_of_two() {
            return Err(ConfigError::DataWordsNotPowerOfTwo(data_words));
        }
        if !associativity.is_power_of_two() {
            return Err(ConfigError::AssociativityNotPowerOfTwo(associativity));
        }
        if block_words > data_words {
            return Err(ConfigError::BlockExceedsCapacity {
                block_words,
                data_words,
            });
        }

        let num_lines = data_words / block_words;
        if associativity > num_lines {
            return Err(ConfigError::AssociativityExceedsLines {
                associativity,
                lines: num_lines,
            });
        }

        let num_sets = num_lines / associativity;
        let index_bits = num_sets.trailing_zeros();
        let offset_bits = block_words.trailing_zeros() + BYTES_PER_WORD.trailing_zeros();
        let tag_bits = ADDRESS_LENGTH.saturating_sub(index_bits + offset_bits);

        Ok(Self {
            block_words,
            data_words,
            associativity,
            num_lines,
            num_sets,
            offset_bits,
            index_bits,
            tag_bits,
        })
    }

    /// Splits a byte address into tag, set index and block offset.
    #[inline]
    pub fn decode(&self, addr: PhysAddr) -> DecodedAddr {
        let raw = u64::from(addr.val());
        let block_addr = raw / self.block_bytes();
        let index = (block_addr % u64::from(self.num_sets)) as usize;
        let tag = raw
            .checked_shr(self.index_bits + self.offset_bits)
            .unwrap_or(0) as u32;
        let offset = (raw & (self.block_bytes() - 1)) as u32;
        DecodedAddr { tag, index, offset }
    }

    /// Block size in words.
    pub const fn block_words(&self) -> u32 {
        self.block_words
    }

    /// Block size in bytes.
    pub const fn block_bytes(&self) -> u64 {
        self.block_words as u64 * BYTES_PER_WORD as u64
    }

    /// Data capacity in words.
    pub const fn data_words(&self) -> u32 {
        self.data_words
    }

    /// Data capacity in bytes.
    pub const fn data_bytes(&self) -> u64 {
        self.data_words as u64 * BYTES_PER_WORD as u64
    }

    /// Lines per set.
    pub const fn associativity(&self) -> u32 {
        self.associativity
    }

    /// Total number of lines (`num_sets * associativity`).
    pub const fn num_lines(&self) -> u32 {
        self.num_lines
    }

    /// Number of sets.
    pub const fn num_sets(&self) -> u32 {
        self.num_sets
    }

    /// Width of the block offset field (`log2(block_bytes)`).
    pub const fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    /// Width of the set index field (`log2(num_sets)`).
    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Width of the tag field.
    pub const fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    /// Metadata bits stored alongside the data: LRU, valid and tag bits for every
    /// line, plus a dirty bit per line when `dirty_bit` is set (write-back caches).
    pub const fn overhead_bits(&self, dirty_bit: bool) -> u64 {
        let per_line = BITS_PER_LRU + BITS_PER_VALID + self.tag_bits;
        let per_line = if dirty_bit {
            per_line + BITS_PER_DIRTY
        } else {
            per_line
        };
        per_line as u64 * self.num_lines as u64
    }
}
