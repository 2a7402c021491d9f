//! Randomized Invariant Tests.
//!
//! Replays random traces over small caches, where conflicts and sharing are frequent,
//! and checks after every operation that:
//! - each set's in-use count matches its valid lines,
//! - a Modified line has no valid counterpart in any other cache,
//! - the per-cause memory write counters add up to the total,
//! - hit/miss and read/write counters partition the operations.

use msisim_core::Simulator;
use msisim_core::common::data::AccessType;
use msisim_core::config::{Config, WritePolicy};
use msisim_core::sim::TraceOp;
use proptest::prelude::*;

fn arb_config() -> impl Strategy<Value = Config> {
    (
        0u32..3,
        0u32..3,
        0u32..2,
        prop_oneof![Just(WritePolicy::WriteThrough), Just(WritePolicy::WriteBack)],
        0u32..3,
    )
        .prop_map(|(assoc_log, cores_log, block_log, write_policy, extra)| Config {
            block_words: 1 << block_log,
            data_words: 1 << (block_log + assoc_log + extra),
            associativity: 1 << assoc_log,
            write_policy,
            cores: 1 << cores_log,
            ..Config::default()
        })
}

fn arb_ops() -> impl Strategy<Value = Vec<TraceOp>> {
    prop::collection::vec(
        (0usize..4, 0u32..64, any::<bool>()).prop_map(|(core, word, write)| {
            let kind = if write {
                AccessType::Write
            } else {
                AccessType::Read
            };
            TraceOp::new(core, word * 4, kind)
        }),
        1..200,
    )
}

fn replay(config: &Config, ops: &[TraceOp]) -> Result<Simulator, TestCaseError> {
    let mut sim = Simulator::new(config).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let cores = sim.domain().num_cores();
    for op in ops.iter().filter(|op| op.core < cores) {
        let _ = sim
            .step(*op)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        sim.domain()
            .check_invariants()
            .map_err(|e| TestCaseError::fail(format!("after {op}: {e}")))?;
    }
    Ok(sim)
}

proptest! {
    #[test]
    fn invariants_hold_after_every_operation(config in arb_config(), ops in arb_ops()) {
        let sim = replay(&config, &ops)?;
        for cache in sim.domain().caches() {
            let s = cache.stats();
            prop_assert_eq!(s.memory_writes_by_cause(), s.writes_to_memory);
            prop_assert_eq!(s.hits + s.misses, s.instructions);
            prop_assert_eq!(s.reads + s.writes, s.instructions);
            prop_assert_eq!(s.read_hits + s.read_misses, s.reads);
            prop_assert_eq!(s.write_hits + s.write_misses, s.writes);
            prop_assert_eq!(s.writes_to_cache, s.read_misses + s.writes);
            prop_assert_eq!(s.cycles, s.misses * config.miss_penalty);
            prop_assert!(s.evictions <= s.misses);
        }
    }

    #[test]
    fn replay_is_deterministic(config in arb_config(), ops in arb_ops()) {
        let first = replay(&config, &ops)?.report();
        let second = replay(&config, &ops)?.report();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn snoop_charges_never_exceed_invalidations(config in arb_config(), ops in arb_ops()) {
        // Every charged snoop also invalidated a line, but a write miss drops Shared
        // copies without charging them.
        let sim = replay(&config, &ops)?;
        let caches = sim.domain().caches();
        let charged: u64 = caches.iter().map(|c| c.stats().blocks_invalidated).sum();
        let invalidated: u64 = caches.iter().map(|c| c.stats().remote_invalidations).sum();
        prop_assert!(charged <= invalidated);
    }
}
