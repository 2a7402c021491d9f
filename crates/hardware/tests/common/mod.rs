//! Shared test infrastructure.

/// Test harness wrapping a `Simulator`.
pub mod harness;

pub use harness::TestContext;
