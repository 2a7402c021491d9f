//! Trace replay.
//!
//! Provides the trace parser and the driver that feeds parsed operations, in order,
//! into a coherence domain.

/// Trace replay driver.
pub mod simulator;

/// Trace line parsing and reading.
pub mod trace;

pub use simulator::Simulator;
pub use trace::{TraceOp, TraceParseError, TraceReader};
