//! Coherence Scenario Tests.
//!
//! Two- and four-core domains with direct-mapped caches, so that the same address
//! always lands at the same `(set, slot)` coordinate in every cache.

use msisim_core::common::addr::PhysAddr;
use msisim_core::common::data::AccessType;
use msisim_core::common::error::SimError;
use msisim_core::config::WritePolicy;
use msisim_core::core::cache::MsiState;
use msisim_core::sim::TraceOp;
use pretty_assertions::assert_eq;

use crate::common::TestContext;
use crate::common::harness::config;

const X: u32 = 0x1000;

fn cores(n: u32, policy: WritePolicy) -> TestContext {
    TestContext::new(&config(n, 1024, 1, 1, policy))
}

// ══════════════════════════════════════════════════════════
// 1. Read Sharing
// ══════════════════════════════════════════════════════════

#[test]
fn concurrent_readers_share_the_line() {
    let mut ctx = cores(2, WritePolicy::WriteThrough);
    let _ = ctx.read(0, X);
    let out = ctx.read(1, X);

    assert_eq!(out.snoop.lines_invalidated(), 0);
    assert_eq!(ctx.state_of(0, X), MsiState::Shared);
    assert_eq!(ctx.state_of(1, X), MsiState::Shared);
    assert_eq!(ctx.stats(0).blocks_invalidated, 0);
    assert_eq!(ctx.stats(1).remote_invalidations, 0);
}

// ══════════════════════════════════════════════════════════
// 2. Read Of A Remote Modified Line
// ══════════════════════════════════════════════════════════

#[test]
fn read_flushes_remote_modified_line() {
    let mut ctx = cores(2, WritePolicy::WriteBack);
    let _ = ctx.write(0, X);
    assert_eq!(ctx.state_of(0, X), MsiState::Modified);

    let out = ctx.read(1, X);
    assert_eq!(out.snoop.flushed, 1);
    assert_eq!(ctx.state_of(0, X), MsiState::Invalid);
    assert_eq!(ctx.state_of(1, X), MsiState::Shared);

    let s0 = ctx.stats(0);
    assert_eq!(s0.blocks_invalidated, 1);
    assert_eq!(s0.writes_to_memory, 1);
    let s1 = ctx.stats(1);
    assert_eq!(s1.remote_invalidations, 1);
    assert_eq!(s1.writes_to_memory, 0);

    let set = ctx.sim.domain().cache(0).unwrap().set(out.set).unwrap();
    assert_eq!(set.in_use(), 0);
}

// ══════════════════════════════════════════════════════════
// 3. Writes
// ══════════════════════════════════════════════════════════

#[test]
fn write_after_remote_write_invalidates_it() {
    let mut ctx = cores(2, WritePolicy::WriteThrough);
    let _ = ctx.write(0, X);
    assert_eq!(ctx.stats(0).writes_to_memory, 1);

    let out = ctx.write(1, X);
    assert_eq!(out.previous, MsiState::Invalid);
    assert_eq!(out.snoop.flushed, 1);
    assert_eq!(ctx.state_of(0, X), MsiState::Invalid);
    assert_eq!(ctx.state_of(1, X), MsiState::Modified);

    // Each cache pays its own write-through; core 0 also pays the flush.
    assert_eq!(ctx.stats(0).writes_to_memory, 2);
    assert_eq!(ctx.stats(0).write_throughs, 1);
    assert_eq!(ctx.stats(0).blocks_invalidated, 1);
    assert_eq!(ctx.stats(1).writes_to_memory, 1);
    assert_eq!(ctx.stats(1).write_throughs, 1);
}

#[test]
fn write_miss_silently_drops_remote_shared_copy() {
    let mut ctx = cores(2, WritePolicy::WriteBack);
    let _ = ctx.read(1, X);
    let out = ctx.write(0, X);

    assert_eq!(out.snoop.invalidated, 1);
    assert_eq!(ctx.state_of(1, X), MsiState::Invalid);
    assert_eq!(ctx.stats(1).writes_to_memory, 0);
    assert_eq!(ctx.stats(1).blocks_invalidated, 0);
    assert_eq!(ctx.stats(0).remote_invalidations, 1);
}

#[test]
fn upgrade_invalidates_every_sharer() {
    let mut ctx = cores(4, WritePolicy::WriteBack);
    for core in 0..4 {
        let _ = ctx.read(core, X);
    }
    let out = ctx.write(3, X);

    assert!(out.hit);
    assert_eq!(out.previous, MsiState::Shared);
    assert_eq!(out.snoop.invalidated, 3);
    for core in 0..3 {
        assert_eq!(ctx.state_of(core, X), MsiState::Invalid);
        assert_eq!(ctx.stats(core).blocks_invalidated, 1);
        assert_eq!(ctx.stats(core).writes_to_memory, 1);
    }
    let s3 = ctx.stats(3);
    assert_eq!(s3.write_backs_access_need, 1);
    assert_eq!(s3.remote_invalidations, 3);
    assert_eq!(ctx.state_of(3, X), MsiState::Modified);
}

#[test]
fn modified_owner_writes_without_snooping() {
    let mut ctx = cores(2, WritePolicy::WriteThrough);
    let _ = ctx.write(0, X);
    let out = ctx.write(0, X);

    assert_eq!(out.snoop.lines_invalidated(), 0);
    assert_eq!(ctx.stats(1).instructions, 0);
    assert_eq!(ctx.stats(0).remote_invalidations, 0);
}

#[test]
fn ownership_migrates_through_readers() {
    let mut ctx = cores(4, WritePolicy::WriteBack);
    let _ = ctx.write(0, X);
    let _ = ctx.read(1, X);
    let _ = ctx.read(2, X);

    assert_eq!(ctx.state_of(0, X), MsiState::Invalid);
    assert_eq!(ctx.state_of(1, X), MsiState::Shared);
    assert_eq!(ctx.state_of(2, X), MsiState::Shared);
    assert_eq!(ctx.stats(0).blocks_invalidated, 1);
    assert_eq!(ctx.stats(1).remote_invalidations, 1);
    assert_eq!(ctx.stats(2).remote_invalidations, 0);
}

// ══════════════════════════════════════════════════════════
// 4. Domain Boundaries
// ══════════════════════════════════════════════════════════

#[test]
fn unknown_core_is_rejected() {
    let mut ctx = cores(2, WritePolicy::WriteThrough);
    let err = ctx
        .sim
        .step(TraceOp::new(2, X, AccessType::Read))
        .unwrap_err();
    assert!(matches!(err, SimError::CoreOutOfRange { core: 2, cores: 2 }));

    let err = ctx
        .sim
        .domain()
        .clone()
        .access(usize::MAX, PhysAddr::new(X), AccessType::Write)
        .unwrap_err();
    assert!(matches!(err, SimError::CoreOutOfRange { .. }));
    assert_eq!(ctx.sim.applied(), 0);
}

#[test]
fn every_cache_uses_the_domain_configuration() {
    let ctx = TestContext::new(&config(4, 256, 4, 2, WritePolicy::WriteBack));
    let domain = ctx.sim.domain();

    assert_eq!(domain.num_cores(), 4);
    for (core, cache) in domain.caches().iter().enumerate() {
        assert_eq!(cache.id(), core);
        assert_eq!(cache.geometry(), domain.geometry());
        assert_eq!(cache.write_policy(), WritePolicy::WriteBack);
        assert_eq!(cache.miss_penalty(), domain.config().miss_penalty);
        assert_eq!(cache.sets().len(), cache.geometry().num_sets() as usize);
    }
}

#[test]
fn corresponding_lines_share_coordinates() {
    let mut ctx = cores(2, WritePolicy::WriteThrough);
    let out = ctx.read(0, X);
    let domain = ctx.sim.domain();

    let mine = domain.corresponding_line(0, out.set, out.slot).unwrap();
    let theirs = domain.corresponding_line(1, out.set, out.slot).unwrap();
    assert_eq!(mine.slot(), theirs.slot());
    assert!(mine.is_valid());
    assert!(!theirs.is_valid());
    assert!(domain.corresponding_line(2, out.set, out.slot).is_none());
}
