//! Allocator that fails deterministically.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use rawr_core::{AllocError, Reallocator, SystemAllocator};

/// Heap reallocator that succeeds a fixed number of times, then fails.
///
/// Only calls that produce a block consume the budget. Releases and no-ops
/// always go through, so a failing array can still be dropped cleanly.
#[derive(Debug)]
pub struct FailingAllocator {
    remaining: AtomicUsize,
    calls: AtomicUsize,
}

impl FailingAllocator {
    /// Succeed `succeed_count` times, then report `OutOfMemory`.
    pub fn after(succeed_count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(succeed_count),
            calls: AtomicUsize::new(0),
        }
    }

    /// Successes left before failures start.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Grant `n` more successes.
    pub fn allow(&self, n: usize) {
        self.remaining.fetch_add(n, Ordering::Relaxed);
    }

    /// Calls that asked for a block, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

// SAFETY: successful calls are forwarded unchanged to `SystemAllocator`;
// failing calls return `Err` without touching the block.
#[allow(unsafe_code)]
unsafe impl Reallocator for FailingAllocator {
    unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
        old_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        if new_size > 0 {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let granted = self
                .remaining
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
            if granted.is_err() {
                return Err(AllocError::OutOfMemory { size: new_size });
            }
        }
        // SAFETY: the caller upholds the contract.
        unsafe { SystemAllocator.realloc(ptr, new_size, old_size) }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn fails_after_budget() {
        let alloc = FailingAllocator::after(1);
        let block = unsafe { alloc.realloc(None, 16, 0) }.unwrap();
        let err = unsafe { alloc.realloc(block, 32, 16) }.unwrap_err();
        assert_eq!(err, AllocError::OutOfMemory { size: 32 });
        assert_eq!(alloc.calls(), 2);
        assert_eq!(unsafe { alloc.realloc(block, 0, 16) }, Ok(None));
    }

    #[test]
    fn allow_extends_budget() {
        let alloc = FailingAllocator::after(0);
        assert!(unsafe { alloc.realloc(None, 8, 0) }.is_err());
        alloc.allow(1);
        let block = unsafe { alloc.realloc(None, 8, 0) }.unwrap();
        assert_eq!(alloc.remaining(), 0);
        unsafe { alloc.realloc(block, 0, 8) }.unwrap();
    }
}
