//! Workload profiles and utilities for benchmarking the slotbump allocator.
//!
//! Provides seeded operation streams for benchmarks and soak tests:
//!
//! - [`churn_profile`]: mixed small allocations with frequent frees
//! - [`reset_heavy_profile`]: frame-style allocate-then-reset cycles
//! - [`generate_ops`]: deterministic op stream from a profile and seed
//! - [`run_workload`]: replay an op stream against an [`Allocator`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use slotbump_arena::{AllocError, Allocator, Handle};

/// One step of a generated workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate `size` bytes at `align`.
    Allocate {
        /// Bytes requested.
        size: usize,
        /// Alignment, always a power of two.
        align: usize,
    },
    /// Free the live handle at `pick % live.len()`, if any.
    Free {
        /// Selector into the live set.
        pick: usize,
    },
    /// Resolve and write the live handle at `pick % live.len()`, if any.
    Touch {
        /// Selector into the live set.
        pick: usize,
    },
    /// Reset the allocator.
    Reset,
}

/// Shape of a generated workload.
#[derive(Clone, Debug)]
pub struct WorkloadProfile {
    /// Arena size the workload is tuned for.
    pub capacity: usize,
    /// Number of ops to generate.
    pub ops: usize,
    /// Allocation sizes are drawn from `1..=max_size`.
    pub max_size: usize,
    /// Alignments are drawn from `2^0..=2^max_align_shift`.
    pub max_align_shift: u32,
    /// Relative weights of allocate, free, and touch ops.
    pub weights: (u32, u32, u32),
    /// Emit a reset after every this many ops, if set.
    pub reset_every: Option<usize>,
}

/// Mixed churn: many small blocks, frees about half as often as allocations.
pub fn churn_profile() -> WorkloadProfile {
    WorkloadProfile {
        capacity: 1 << 20,
        ops: 10_000,
        max_size: 256,
        max_align_shift: 4,
        weights: (5, 3, 2),
        reset_every: None,
    }
}

/// Frame-style use: allocate a burst, touch it, reset every 256 ops.
pub fn reset_heavy_profile() -> WorkloadProfile {
    WorkloadProfile {
        capacity: 1 << 16,
        ops: 10_000,
        max_size: 64,
        max_align_shift: 3,
        weights: (8, 0, 2),
        reset_every: Some(256),
    }
}

/// Generate a deterministic op stream for `profile`.
///
/// The same `(profile, seed)` pair always yields the same ops.
pub fn generate_ops(profile: &WorkloadProfile, seed: u64) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (alloc_w, free_w, touch_w) = profile.weights;
    let total = alloc_w + free_w + touch_w;
    assert!(total > 0, "workload weights must not all be zero");

    let mut ops = Vec::with_capacity(profile.ops);
    for i in 0..profile.ops {
        if let Some(every) = profile.reset_every {
            if i > 0 && i % every == 0 {
                ops.push(Op::Reset);
                continue;
            }
        }
        let roll = rng.random_range(0..total);
        let op = if roll < alloc_w {
            Op::Allocate {
                size: rng.random_range(1..=profile.max_size),
                align: 1 << rng.random_range(0..=profile.max_align_shift),
            }
        } else if roll < alloc_w + free_w {
            Op::Free { pick: rng.random::<u64>() as usize }
        } else {
            Op::Touch { pick: rng.random::<u64>() as usize }
        };
        ops.push(op);
    }
    ops
}

/// Counters from [`run_workload`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkloadReport {
    /// Successful allocations.
    pub allocated: usize,
    /// Successful frees.
    pub freed: usize,
    /// Successful resolves.
    pub touched: usize,
    /// Resets performed.
    pub resets: usize,
    /// Allocations refused for lack of space or slots.
    pub exhausted: usize,
    /// Highest `bytes_used` observed.
    pub peak_bytes: usize,
}

/// Replay `ops` against `alloc`, tracking live handles.
///
/// Exhaustion errors are counted, not propagated; any other error means the
/// allocator broke its contract and is returned.
pub fn run_workload(alloc: &mut Allocator, ops: &[Op]) -> Result<WorkloadReport, AllocError> {
    let mut live: Vec<Handle> = Vec::new();
    let mut report = WorkloadReport::default();

    for op in ops {
        match *op {
            Op::Allocate { size, align } => match alloc.allocate(size, align) {
                Ok(h) => {
                    live.push(h);
                    report.allocated += 1;
                }
                Err(e) if e.is_exhaustion() => report.exhausted += 1,
                Err(e) => return Err(e),
            },
            Op::Free { pick } => {
                if !live.is_empty() {
                    let h = live.swap_remove(pick % live.len());
                    alloc.free(h)?;
                    report.freed += 1;
                }
            }
            Op::Touch { pick } => {
                if !live.is_empty() {
                    let h = live[pick % live.len()];
                    if let Some(first) = alloc.resolve(h)?.first_mut() {
                        *first = first.wrapping_add(1);
                    }
                    report.touched += 1;
                }
            }
            Op::Reset => {
                alloc.reset();
                live.clear();
                report.resets += 1;
            }
        }
        report.peak_bytes = report.peak_bytes.max(alloc.bytes_used());
    }

    Ok(report)
}
