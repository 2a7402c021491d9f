//! Simulator: replays a trace through a coherence domain.
//!
//! Operations are applied strictly in file order, one at a time and to completion, so the
//! outcome of operation N depends only on the state left by operations 0..N-1. When the
//! trace is exhausted the statistics are aggregated once into a [`Report`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use super::trace::{TraceOp, TraceReader};
use crate::common::error::{ConfigError, SimError};
use crate::config::Config;
use crate::core::cache::AccessOutcome;
use crate::soc::CoherenceDomain;
use crate::stats::Report;

/// Top-level simulator: the coherence domain plus replay bookkeeping.
#[derive(Clone, Debug)]
pub struct Simulator {
    domain: CoherenceDomain,
    applied: u64,
    skipped: u64,
}

impl Simulator {
    /// Creates a simulator with empty caches.
    ///
    /// # Errors
    ///
    /// Returns the `ConfigError` of the first invalid configuration parameter.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            domain: CoherenceDomain::new(config)?,
            applied: 0,
            skipped: 0,
        })
    }

    /// The simulated caches.
    pub const fn domain(&self) -> &CoherenceDomain {
        &self.domain
    }

    /// Operations applied so far.
    pub const fn applied(&self) -> u64 {
        self.applied
    }

    /// Trace lines skipped so far.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Applies one operation.
    ///
    /// # Errors
    ///
    /// Returns `SimError::CoreOutOfRange` for an unknown core, or `SimError::Coherence`
    /// if the engine detects a broken invariant.
    pub fn step(&mut self, op: TraceOp) -> Result<AccessOutcome, SimError> {
        let outcome = self.domain.access(op.core, op.addr, op.kind)?;
        self.applied += 1;
        Ok(outcome)
    }

    /// Replays every operation of `reader`. Lines naming a core outside the domain are
    /// skipped like malformed lines.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if reading fails, or `SimError::Coherence` on an engine defect.
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<(), SimError> {
        let cores = self.domain.num_cores();
        let mut trace = TraceReader::new(reader);
        for op in &mut trace {
            let op = op?;
            if op.core >= cores {
                warn!(core = op.core, cores, "skipping trace line for unknown core");
                self.skipped += 1;
                continue;
            }
            let _ = self.step(op)?;
        }
        self.skipped += trace.skipped();
        info!(
            applied = self.applied,
            skipped = self.skipped,
            lines = trace.lines_read(),
            "trace replay complete"
        );
        Ok(())
    }

    /// Replays `reader` and returns the final report.
    ///
    /// # Errors
    ///
    /// See [`Simulator::replay`].
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<Report, SimError> {
        self.replay(reader)?;
        Ok(self.report())
    }

    /// Opens the trace at `path`, replays it and returns the final report.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Io` if the file cannot be opened or read.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<Report, SimError> {
        let file = File::open(path)?;
        self.run(BufReader::new(file))
    }

    /// Aggregates the current counters into a report.
    pub fn report(&self) -> Report {
        Report {
            cores: self.domain.num_cores(),
            operations: self.applied,
            skipped: self.skipped,
            caches: self.domain.reports(),
        }
    }
}
