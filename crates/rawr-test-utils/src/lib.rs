//! Instrumented reallocators for rawr development.
//!
//! [`AllocLog`] records every block handed out through its
//! [`TrackingAllocator`] and checks that callers report the right
//! `old_size`. [`FailingAllocator`] runs out of memory on demand.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::FailingAllocator;

use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

use indexmap::IndexMap;
use rawr_core::{AllocError, Reallocator, SystemAllocator};

/// Ledger of live blocks, keyed by address, in allocation order.
#[derive(Debug, Default)]
pub struct AllocLog {
    live: RefCell<IndexMap<usize, usize>>,
    calls: Cell<usize>,
    relocations: Cell<usize>,
    releases: Cell<usize>,
}

impl AllocLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reallocator that records into this log.
    pub fn allocator(&self) -> TrackingAllocator<'_> {
        TrackingAllocator { log: self }
    }

    /// Total `realloc` calls, including no-ops and releases.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Resizes that returned a different address.
    pub fn relocations(&self) -> usize {
        self.relocations.get()
    }

    pub fn releases(&self) -> usize {
        self.releases.get()
    }

    /// `(address, size)` of every live block, oldest first.
    pub fn live_blocks(&self) -> Vec<(usize, usize)> {
        self.live.borrow().iter().map(|(&a, &s)| (a, s)).collect()
    }

    pub fn live_bytes(&self) -> usize {
        self.live.borrow().values().sum()
    }

    /// Whether every block handed out has been released.
    pub fn is_balanced(&self) -> bool {
        self.live.borrow().is_empty()
    }

    /// Panic with the leaked blocks if any are still live.
    pub fn assert_no_leaks(&self) {
        let live = self.live_blocks();
        assert!(live.is_empty(), "{} leaked block(s): {live:?}", live.len());
    }

    fn check_live(&self, ptr: NonNull<u8>, old_size: usize) {
        let address = ptr.as_ptr() as usize;
        match self.live.borrow().get(&address) {
            Some(&size) => assert_eq!(
                size, old_size,
                "block {address:#x} is {size} bytes, caller reported {old_size}"
            ),
            None => panic!("block {address:#x} is not live (double free or foreign pointer)"),
        }
    }
}

/// [`SystemAllocator`] wrapper that reports into an [`AllocLog`].
///
/// # Panics
///
/// Panics inside `realloc` if the caller passes a block that is not live or
/// reports an `old_size` different from the size it was given.
#[derive(Clone, Copy, Debug)]
pub struct TrackingAllocator<'a> {
    log: &'a AllocLog,
}

impl<'a> TrackingAllocator<'a> {
    pub fn log(&self) -> &'a AllocLog {
        self.log
    }
}

// SAFETY: every call is forwarded unchanged to `SystemAllocator`; the log
// only observes results.
#[allow(unsafe_code)]
unsafe impl Reallocator for TrackingAllocator<'_> {
    unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
        old_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        let log = self.log;
        log.calls.set(log.calls.get() + 1);
        if let Some(old) = ptr {
            log.check_live(old, old_size);
        }

        // SAFETY: the caller upholds the contract; `check_live` verified the
        // block and its size against the log.
        let result = unsafe { SystemAllocator.realloc(ptr, new_size, old_size) }?;

        let mut live = log.live.borrow_mut();
        if let Some(old) = ptr {
            live.shift_remove(&(old.as_ptr() as usize));
        }
        match (ptr, result) {
            (_, Some(new)) => {
                if ptr.is_some_and(|old| old != new) {
                    log.relocations.set(log.relocations.get() + 1);
                }
                live.insert(new.as_ptr() as usize, new_size);
            }
            (Some(_), None) => log.releases.set(log.releases.get() + 1),
            (None, None) => {}
        }
        Ok(result)
    }
}
