//! Benchmark workloads for the rawr memory primitives.
//!
//! - [`arena_workload`]: seeded mix of bump allocations, grows and resets
//! - [`run_arena_workload`]: replay such a mix against an [`Arena`]
//! - [`append_batches`]: seeded batch sizes for array append benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rawr_arena::Arena;
use rawr_core::AllocError;
use rawr_dynarr::{Dynarr, Reallocator};

/// One step of an arena workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaOp {
    /// Bump-allocate `size` bytes at `alignment`.
    Alloc { size: usize, alignment: usize },
    /// Grow the most recent allocation to `new_size` bytes.
    Grow { new_size: usize },
    /// Reset the arena.
    Reset,
}

/// Counters collected while replaying a workload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkloadStats {
    pub allocations: usize,
    pub grows: usize,
    pub resets: usize,
    pub failures: usize,
}

/// Build `n` deterministic arena operations from `seed`.
///
/// Roughly 70% allocations of 1..=256 bytes at alignments 1..=16, 25% grows
/// of the last allocation, 5% resets.
pub fn arena_workload(seed: u64, n: usize) -> Vec<ArenaOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut last_size = 0usize;
    (0..n)
        .map(|_| {
            let roll = rng.next_u64() % 100;
            if roll < 70 {
                let size = 1 + (rng.next_u64() % 256) as usize;
                let alignment = 1 << (rng.next_u64() % 5);
                last_size = size;
                ArenaOp::Alloc { size, alignment }
            } else if roll < 95 {
                last_size += 1 + (rng.next_u64() % 64) as usize;
                ArenaOp::Grow {
                    new_size: last_size,
                }
            } else {
                last_size = 0;
                ArenaOp::Reset
            }
        })
        .collect()
}

/// Replay `ops` against `arena`. Exhaustion is counted, not fatal.
pub fn run_arena_workload(arena: &mut Arena, ops: &[ArenaOp]) -> WorkloadStats {
    let mut stats = WorkloadStats::default();
    for (i, segment) in ops.split(|op| *op == ArenaOp::Reset).enumerate() {
        if i > 0 {
            arena.reset();
            stats.resets += 1;
        }
        run_segment(arena, segment, &mut stats);
    }
    stats
}

fn run_segment(arena: &Arena, ops: &[ArenaOp], stats: &mut WorkloadStats) {
    let mut last: Option<&mut [u8]> = None;
    for op in ops {
        match *op {
            ArenaOp::Alloc { size, alignment } => match arena.alloc_bytes(size, alignment) {
                Ok(bytes) => {
                    bytes[0] = size as u8;
                    stats.allocations += 1;
                    last = Some(bytes);
                }
                Err(_) => stats.failures += 1,
            },
            ArenaOp::Grow { new_size } => {
                if let Some(bytes) = last.as_mut() {
                    match arena.grow_bytes(bytes, new_size, 1) {
                        Ok(()) => stats.grows += 1,
                        Err(_) => stats.failures += 1,
                    }
                }
            }
            ArenaOp::Reset => {}
        }
    }
}

/// `n` deterministic append batch sizes in `1..=max_batch`.
pub fn append_batches(seed: u64, n: usize, max_batch: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| 1 + (rng.next_u64() % max_batch.max(1) as u64) as usize)
        .collect()
}

/// Append every batch to a fresh array and return its final length.
pub fn fill_dynarr<A: Reallocator>(allocator: A, batches: &[usize]) -> Result<usize, AllocError> {
    let mut arr: Dynarr<u64, A> = Dynarr::new_in(allocator)?;
    for &n in batches {
        arr.extend(n)?;
        let len = arr.len() as u64;
        *arr.last_mut() = len;
    }
    Ok(arr.len())
}
