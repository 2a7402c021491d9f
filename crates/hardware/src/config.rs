//! Configuration system for the cache simulator.
//!
//! This module defines the configuration structure used to parameterize every cache of a
//! coherence domain. It provides:
//! 1. **Defaults:** Baseline geometry, miss penalty, write policy and core count.
//! 2. **Structures:** A flat `Config` deserializable from (partial) JSON documents.
//! 3. **Validation:** `Config::validate` rejects each invalid parameter with its own error.
//!
//! The CLI fills a `Config` from flags (optionally on top of a JSON file); the core
//! itself only ever sees a configuration that passed `validate`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::addr::CacheGeometry;
use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Block size in words.
    pub const BLOCK_WORDS: u32 = 1;

    /// Total data capacity of each cache in words.
    pub const DATA_WORDS: u32 = 1024;

    /// Cycles charged on every miss.
    pub const MISS_PENALTY: u64 = 100;

    /// Lines per set (1 = direct-mapped).
    pub const ASSOCIATIVITY: u32 = 1;

    /// Number of cores, one private cache each.
    pub const CORES: u32 = 2;
}

/// Write policy applied after the coherence step of every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WritePolicy {
    /// Every write also goes to memory (`T`).
    #[default]
    #[serde(rename = "T", alias = "WriteThrough")]
    WriteThrough,
    /// Writes stay in the cache until a dirty line is overwritten (`B`).
    #[serde(rename = "B", alias = "WriteBack")]
    WriteBack,
}

impl WritePolicy {
    /// Returns the single-character flag value (`T` or `B`).
    pub const fn as_char(self) -> char {
        match self {
            Self::WriteThrough => 'T',
            Self::WriteBack => 'B',
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteThrough => write!(f, "write-through"),
            Self::WriteBack => write!(f, "write-back"),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "T" => Ok(Self::WriteThrough),
            "B" => Ok(Self::WriteBack),
            other => Err(ConfigError::InvalidWritePolicy(other.to_owned())),
        }
    }
}

/// Root simulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Block size in words (power of two).
    #[serde(default = "Config::default_block_words")]
    pub block_words: u32,

    /// Total data words per cache (power of two).
    #[serde(default = "Config::default_data_words")]
    pub data_words: u32,

    /// Cycles added on every miss.
    #[serde(default = "Config::default_miss_penalty")]
    pub miss_penalty: u64,

    /// Lines per set (power of two).
    #[serde(default = "Config::default_associativity")]
    pub associativity: u32,

    /// Write-through or write-back.
    #[serde(default)]
    pub write_policy: WritePolicy,

    /// Number of cores, each with a private cache (power of two).
    #[serde(default = "Config::default_cores")]
    pub cores: u32,
}

impl Config {
    fn default_block_words() -> u32 {
        defaults::BLOCK_WORDS
    }

    fn default_data_words() -> u32 {
        defaults::DATA_WORDS
    }

    fn default_miss_penalty() -> u64 {
        defaults::MISS_PENALTY
    }

    fn default_associativity() -> u32 {
        defaults::ASSOCIATIVITY
    }

    fn default_cores() -> u32 {
        defaults::CORES
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Malformed` when the document is not valid JSON or a
    /// field has the wrong type (including an unknown write policy string).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks every constraint the simulation relies on.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` for the first violated constraint, checked in the
    /// order: block size, data words, miss penalty, associativity, core count,
    /// then the derived geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.block_words.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(self.block_words));
        }
        if !self.data_words.is_power_of_two() {
            return Err(ConfigError::DataWordsNotPowerOfTwo(self.data_words));
        }
        if self.miss_penalty == 0 {
            return Err(ConfigError::NonPositiveMissPenalty(0));
        }
        if !self.associativity.is_power_of_two() {
            return Err(ConfigError::AssociativityNotPowerOfTwo(self.associativity));
        }
        if !self.cores.is_power_of_two() {
            return Err(ConfigError::CoreCountNotPowerOfTwo(self.cores));
        }
        let _ = self.geometry()?;
        Ok(())
    }

    /// Derives the per-cache geometry.
    ///
    /// # Errors
    ///
    /// Returns the geometry `ConfigError` when the sizes do not describe a valid cache.
    pub fn geometry(&self) -> Result<CacheGeometry, ConfigError> {
        CacheGeometry::new(self.block_words, self.data_words, self.associativity)
    }
}

impl Default for Config {
    /// Creates the default configuration: two direct-mapped write-through caches of
    /// 1024 one-word blocks with a 100-cycle miss penalty.
    fn default() -> Self {
        Self {
            block_words: defaults::BLOCK_WORDS,
            data_words: defaults::DATA_WORDS,
            miss_penalty: defaults::MISS_PENALTY,
            associativity: defaults::ASSOCIATIVITY,
            write_policy: WritePolicy::default(),
            cores: defaults::CORES,
        }
    }
}
