//! Memory Access Types.
//!
//! This module defines the classification of memory operations replayed from a trace.
//! These types are used for the following:
//! 1. **Dispatch:** Selecting the read or write handler of a coherent cache.
//! 2. **Trace Parsing:** Mapping the `R`/`W` mode column of a trace line.
//! 3. **Statistics Tracking:** Attributing hits and misses to the read or write family.

use std::fmt;
use std::str::FromStr;

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Data read access (`R`).
    ///
    /// Fills the line in the Shared state and never marks it dirty.
    Read,

    /// Data write access (`W`).
    ///
    /// Leaves the line Modified and dirty, and may generate memory traffic
    /// depending on the configured write policy.
    Write,
}

impl AccessType {
    /// Returns the single-character trace mnemonic (`R` or `W`).
    #[inline]
    pub const fn as_char(self) -> char {
        match self {
            Self::Read => 'R',
            Self::Write => 'W',
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for AccessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" => Ok(Self::Read),
            "W" => Ok(Self::Write),
            other => Err(other.to_owned()),
        }
    }
}
