//! Trace input.
//!
//! A trace is a text file with one memory operation per line: `<core> <hex address> <R|W>`.
//! This module provides:
//! 1. **Parsing:** `TraceOp` implements `FromStr` for a single line.
//! 2. **Reading:** `TraceReader` iterates over a `BufRead`, skipping blank, malformed and
//!    non-UTF-8 lines with a warning while surfacing genuine I/O failures.

use std::fmt;
use std::io::{self, BufRead};
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

use crate::common::addr::PhysAddr;
use crate::common::data::AccessType;

/// A trace line that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TraceParseError {
    /// The line does not have exactly three fields.
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),
    /// The core id is not a decimal integer.
    #[error("invalid core id {0:?}")]
    Core(String),
    /// The address is not a 32-bit hexadecimal integer.
    #[error("invalid hex address {0:?}")]
    Address(String),
    /// The mode is neither `R` nor `W`.
    #[error("invalid mode {0:?}, expected R or W")]
    Mode(String),
}

/// One memory operation of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TraceOp {
    /// Issuing core.
    pub core: usize,
    /// Byte address.
    pub addr: PhysAddr,
    /// Read or write.
    pub kind: AccessType,
}

impl TraceOp {
    /// Creates an operation.
    pub const fn new(core: usize, addr: u32, kind: AccessType) -> Self {
        Self {
            core,
            addr: PhysAddr::new(addr),
            kind,
        }
    }
}

impl fmt::Display for TraceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:x} {}", self.core, self.addr.val(), self.kind)
    }
}

impl FromStr for TraceOp {
    type Err = TraceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        let [core, addr, mode] = fields.as_slice() else {
            return Err(TraceParseError::FieldCount(fields.len()));
        };

        let core = core
            .parse::<usize>()
            .map_err(|_| TraceParseError::Core((*core).to_owned()))?;
        let digits = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .unwrap_or(*addr);
        let addr = u32::from_str_radix(digits, 16)
            .map_err(|_| TraceParseError::Address((*addr).to_owned()))?;
        let kind = mode.parse::<AccessType>().map_err(TraceParseError::Mode)?;

        Ok(Self::new(core, addr, kind))
    }
}

/// Iterator over the operations of a trace.
#[derive(Debug)]
pub struct TraceReader<R> {
    inner: R,
    buf: String,
    line: u64,
    skipped: u64,
}

impl<R: BufRead> TraceReader<R> {
    /// Wraps a buffered reader.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            buf: String::new(),
            line: 0,
            skipped: 0,
        }
    }

    /// Lines skipped so far as malformed or unreadable.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Lines read so far, including skipped ones.
    pub const fn lines_read(&self) -> u64 {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = io::Result<TraceOp>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let text = self.buf.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match text.parse::<TraceOp>() {
                        Ok(op) => return Some(Ok(op)),
                        Err(error) => {
                            warn!(line = self.line, %error, "skipping malformed trace line");
                            self.skipped += 1;
                        }
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::InvalidData => {
                    self.line += 1;
                    warn!(line = self.line, %error, "skipping unreadable trace line");
                    self.skipped += 1;
                }
                Err(error) => return Some(Err(error)),
            }
        }
    }
}
