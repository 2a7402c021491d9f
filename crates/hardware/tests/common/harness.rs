use msisim_core::Simulator;
use msisim_core::common::addr::PhysAddr;
use msisim_core::common::data::AccessType;
use msisim_core::config::{Config, WritePolicy};
use msisim_core::core::cache::{AccessOutcome, CacheLine, MsiState};
use msisim_core::sim::TraceOp;
use msisim_core::stats::CacheStats;

/// Routes `tracing` output through the test writer so it only shows for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Builds a configuration from the fields tests usually vary.
pub fn config(
    cores: u32,
    data_words: u32,
    block_words: u32,
    associativity: u32,
    write_policy: WritePolicy,
) -> Config {
    Config {
        block_words,
        data_words,
        associativity,
        write_policy,
        cores,
        ..Config::default()
    }
}

#[derive(Debug)]
pub struct TestContext {
    pub sim: Simulator,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl TestContext {
    pub fn new(config: &Config) -> Self {
        init_tracing();
        let sim = Simulator::new(config).expect("test configuration must be valid");
        Self { sim }
    }

    /// Issues a read from `core` and checks the domain invariants afterwards.
    pub fn read(&mut self, core: usize, addr: u32) -> AccessOutcome {
        self.apply(core, addr, AccessType::Read)
    }

    /// Issues a write from `core` and checks the domain invariants afterwards.
    pub fn write(&mut self, core: usize, addr: u32) -> AccessOutcome {
        self.apply(core, addr, AccessType::Write)
    }

    fn apply(&mut self, core: usize, addr: u32, kind: AccessType) -> AccessOutcome {
        let outcome = self
            .sim
            .step(TraceOp::new(core, addr, kind))
            .expect("access should succeed");
        self.sim
            .domain()
            .check_invariants()
            .expect("coherence invariants should hold");
        outcome
    }

    /// Counters of the cache owned by `core`.
    pub fn stats(&self, core: usize) -> &CacheStats {
        self.sim.domain().cache(core).expect("core exists").stats()
    }

    /// The valid line of `core` holding `addr`, if any.
    pub fn line_for(&self, core: usize, addr: u32) -> Option<&CacheLine> {
        let domain = self.sim.domain();
        let decoded = domain.geometry().decode(PhysAddr::new(addr));
        domain.cache(core)?.lookup(decoded).ok()
    }

    /// MSI state of `addr` in the cache of `core` (Invalid when not held).
    pub fn state_of(&self, core: usize, addr: u32) -> MsiState {
        self.line_for(core, addr)
            .map_or(MsiState::Invalid, CacheLine::state)
    }
}
