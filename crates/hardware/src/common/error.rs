//! Error definitions.
//!
//! This module defines every failure the simulator can report. It provides:
//! 1. **Configuration Errors:** One variant per violated configuration constraint,
//!    each with a distinct process exit code, detected before any cache is built.
//! 2. **Coherence Errors:** Internal-consistency defects (a broken set invariant).
//!    These are never caused by user input and are surfaced instead of asserted.
//! 3. **Simulation Errors:** The top-level error returned by the replay driver.

use std::io;

use thiserror::Error;

/// A rejected simulator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Block size (in words) is not a power of two.
    #[error("number of words per block must be a power of 2 (got {0})")]
    BlockSizeNotPowerOfTwo(u32),

    /// Total data words is not a power of two.
    #[error("number of data words must be a power of 2 (got {0})")]
    DataWordsNotPowerOfTwo(u32),

    /// Miss penalty is zero or negative.
    #[error("number of cycles per miss must be positive (got {0})")]
    NonPositiveMissPenalty(i64),

    /// Set associativity is not a power of two.
    #[error("set associativity must be a power of 2 (got {0})")]
    AssociativityNotPowerOfTwo(u32),

    /// Core count is not a power of two.
    #[error("number of cores/caches must be a power of 2 (got {0})")]
    CoreCountNotPowerOfTwo(u32),

    /// Write policy is neither `T` nor `B`.
    #[error("invalid write policy {0:?}: valid policies are 'T' (write-through) or 'B' (write-back)")]
    InvalidWritePolicy(String),

    /// A single block is larger than the whole cache.
    #[error("block of {block_words} words does not fit in {data_words} data words")]
    BlockExceedsCapacity {
        /// Block size in words.
        block_words: u32,
        /// Capacity in words.
        data_words: u32,
    },

    /// More ways per set than lines in the cache.
    #[error("associativity {associativity} exceeds the {lines} lines of the cache")]
    AssociativityExceedsLines {
        /// Requested associativity.
        associativity: u32,
        /// Number of lines available.
        lines: u32,
    },

    /// A configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ConfigError {
    /// Process exit status reported for this condition.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::BlockSizeNotPowerOfTwo(_) => 3,
            Self::NonPositiveMissPenalty(_) => 4,
            Self::DataWordsNotPowerOfTwo(_) => 5,
            Self::InvalidWritePolicy(_) => 6,
            Self::Malformed(_) => 7,
            Self::AssociativityNotPowerOfTwo(_) => 8,
            Self::CoreCountNotPowerOfTwo(_) => 9,
            Self::BlockExceedsCapacity { .. } => 10,
            Self::AssociativityExceedsLines { .. } => 11,
        }
    }
}

/// A violated set invariant inside the coherence engine.
///
/// Reaching any of these means the caller's own guard logic is wrong.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoherenceError {
    /// A valid line holding `tag` was expected in the set but is absent.
    #[error("set {set}: no valid line holds tag {tag:#x}")]
    MissingTag {
        /// Set index.
        set: usize,
        /// Tag searched for.
        tag: u32,
    },

    /// An unused line was requested from a set with no free slot.
    #[error("set {set}: no unused line ({in_use}/{capacity} in use)")]
    SetFull {
        /// Set index.
        set: usize,
        /// Lines in use.
        in_use: usize,
        /// Lines in the set.
        capacity: usize,
    },

    /// An LRU victim was requested from a set that still has room.
    #[error("set {set}: LRU victim requested with only {in_use}/{capacity} lines in use")]
    SetNotFull {
        /// Set index.
        set: usize,
        /// Lines in use.
        in_use: usize,
        /// Lines in the set.
        capacity: usize,
    },

    /// A line or set coordinate lies outside the cache.
    #[error("line ({set}, {slot}) is outside the cache")]
    SlotOutOfRange {
        /// Set index.
        set: usize,
        /// Line index within the set.
        slot: usize,
    },

    /// The in-use count of a set disagrees with its valid lines.
    #[error("cache {core} set {set}: {in_use} lines marked in use but {valid} valid")]
    InUseMismatch {
        /// Cache id.
        core: usize,
        /// Set index.
        set: usize,
        /// Recorded in-use count.
        in_use: usize,
        /// Actual number of valid lines.
        valid: usize,
    },

    /// A Modified line coexists with a valid copy in a sibling cache.
    #[error("line ({set}, {slot}) is Modified in cache {owner} but {state} in cache {other}")]
    ExclusivityViolated {
        /// Set index.
        set: usize,
        /// Line index within the set.
        slot: usize,
        /// Cache holding the Modified line.
        owner: usize,
        /// Cache holding the conflicting copy.
        other: usize,
        /// State of the conflicting copy.
        state: char,
    },
}

/// Top-level simulation error.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The coherence engine detected a broken invariant.
    #[error("internal coherence error: {0}")]
    Coherence(#[from] CoherenceError),

    /// A core id outside the domain was addressed.
    #[error("core {core} out of range for a {cores}-core domain")]
    CoreOutOfRange {
        /// Requested core.
        core: usize,
        /// Cores in the domain.
        cores: usize,
    },

    /// Reading the trace failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
