//! The reallocation contract and its process-heap implementation.
//!
//! A [`Reallocator`] folds allocate, resize and release into a single
//! call keyed on `(existing pointer, new size, old size)`:
//!
//! | `ptr`   | `new_size` | effect                                      |
//! |---------|------------|---------------------------------------------|
//! | `None`  | `> 0`      | fresh block of `new_size` bytes             |
//! | `Some`  | `0`        | release the block, returns `Ok(None)`       |
//! | `Some`  | `> 0`      | resize, keeping `min(old, new)` leading bytes |
//! | `None`  | `0`        | no-op, returns `Ok(None)`                   |
//!
//! Growable arrays store a reallocator by value next to their elements,
//! so each array instance carries its own allocation strategy.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocError;

/// Alignment of every block handed out through a [`Reallocator`].
///
/// Matches `alignof(max_align_t)` on mainstream 64-bit targets, which is
/// enough for any element type a growable array accepts.
pub const MAX_ALIGN: usize = 16;

/// Layout of a `size`-byte block at [`MAX_ALIGN`].
pub fn block_layout(size: usize) -> Result<Layout, AllocError> {
    Layout::from_size_align(size, MAX_ALIGN).map_err(|_| AllocError::SizeOverflow)
}

/// Source of resizable memory blocks.
///
/// # Safety
///
/// Implementors must uphold, for every call that returns `Ok(Some(p))`:
/// - `p` is aligned to [`MAX_ALIGN`] and valid for reads and writes of
///   `new_size` bytes until it is passed back to `realloc`;
/// - when `ptr` was `Some`, the first `min(old_size, new_size)` bytes of the
///   old block are present at `p`.
///
/// A call returning `Err` must leave the block behind `ptr` untouched and
/// still owned by the caller.
pub unsafe trait Reallocator {
    /// Allocate, resize or release a block.
    ///
    /// # Safety
    ///
    /// `ptr`, when `Some`, must have been returned by this same reallocator
    /// (or a copy of it) with size `old_size`, and must not have been
    /// released since. After a successful call the old pointer must no
    /// longer be used.
    unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
        old_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError>;
}

// SAFETY: forwards to `R`, which upholds the contract.
unsafe impl<R: Reallocator + ?Sized> Reallocator for &R {
    unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
        old_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        // SAFETY: the caller's guarantees carry over unchanged.
        unsafe { (**self).realloc(ptr, new_size, old_size) }
    }
}

/// The default reallocator, backed by the global allocator.
///
/// Rust's global allocator needs the original layout to resize or free a
/// block, so `old_size` is used to rebuild it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemAllocator;

// SAFETY: every block comes from `std::alloc` at `MAX_ALIGN`; `std::alloc::realloc`
// preserves the common prefix and leaves the old block intact on failure.
unsafe impl Reallocator for SystemAllocator {
    unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
        old_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        match ptr {
            None if new_size == 0 => Ok(None),
            None => {
                let layout = block_layout(new_size)?;
                // SAFETY: layout has non-zero size.
                let raw = unsafe { std::alloc::alloc(layout) };
                NonNull::new(raw)
                    .map(Some)
                    .ok_or(AllocError::OutOfMemory { size: new_size })
            }
            Some(ptr) => {
                // Zero-sized blocks are never handed out, see the `None` arm.
                debug_assert!(old_size > 0, "live system block cannot be empty");
                let old_layout = block_layout(old_size)?;
                if new_size == 0 {
                    // SAFETY: `ptr` was allocated by us with `old_layout`.
                    unsafe { std::alloc::dealloc(ptr.as_ptr(), old_layout) };
                    return Ok(None);
                }
                block_layout(new_size)?;
                // SAFETY: `ptr` was allocated by us with `old_layout`; `new_size`
                // is non-zero and forms a valid layout at the same alignment.
                let raw = unsafe { std::alloc::realloc(ptr.as_ptr(), old_layout, new_size) };
                NonNull::new(raw)
                    .map(Some)
                    .ok_or(AllocError::OutOfMemory { size: new_size })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_zero_is_a_noop() {
        let result = unsafe { SystemAllocator.realloc(None, 0, 0) };
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn fresh_block_is_max_aligned() {
        let block = unsafe { SystemAllocator.realloc(None, 24, 0) }
            .unwrap()
            .unwrap();
        assert_eq!(block.as_ptr() as usize % MAX_ALIGN, 0);
        let released = unsafe { SystemAllocator.realloc(Some(block), 0, 24) };
        assert_eq!(released, Ok(None));
    }

    #[test]
    fn resize_preserves_prefix() {
        let block = unsafe { SystemAllocator.realloc(None, 8, 0) }
            .unwrap()
            .unwrap();
        unsafe {
            for i in 0..8u8 {
                block.as_ptr().add(i as usize).write(i);
            }
        }
        let grown = unsafe { SystemAllocator.realloc(Some(block), 4096, 8) }
            .unwrap()
            .unwrap();
        let prefix = unsafe { std::slice::from_raw_parts(grown.as_ptr(), 8) };
        assert_eq!(prefix, &[0, 1, 2, 3, 4, 5, 6, 7]);

        let shrunk = unsafe { SystemAllocator.realloc(Some(grown), 3, 4096) }
            .unwrap()
            .unwrap();
        let prefix = unsafe { std::slice::from_raw_parts(shrunk.as_ptr(), 3) };
        assert_eq!(prefix, &[0, 1, 2]);
        unsafe { SystemAllocator.realloc(Some(shrunk), 0, 3) }.unwrap();
    }

    #[test]
    fn oversized_request_is_size_overflow() {
        let result = unsafe { SystemAllocator.realloc(None, usize::MAX, 0) };
        assert_eq!(result, Err(AllocError::SizeOverflow));
    }

    #[test]
    fn reference_forwards_to_inner_allocator() {
        let system = SystemAllocator;
        let by_ref = &system;
        let block = unsafe { by_ref.realloc(None, 32, 0) }.unwrap();
        assert!(block.is_some());
        assert_eq!(unsafe { by_ref.realloc(block, 0, 32) }, Ok(None));
    }

    #[test]
    fn block_layout_rejects_overflow() {
        assert!(block_layout(64).is_ok());
        assert_eq!(block_layout(usize::MAX), Err(AllocError::SizeOverflow));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn resize_chain_keeps_common_prefix(
                sizes in proptest::collection::vec(1usize..2048, 1..12),
            ) {
                let mut size = sizes[0];
                let mut block = unsafe { SystemAllocator.realloc(None, size, 0) }
                    .unwrap()
                    .unwrap();
                unsafe { std::ptr::write_bytes(block.as_ptr(), 0xAB, size) };
                let mut intact = size;
                for &next in &sizes[1..] {
                    block = unsafe { SystemAllocator.realloc(Some(block), next, size) }
                        .unwrap()
                        .unwrap();
                    prop_assert_eq!(block.as_ptr() as usize % MAX_ALIGN, 0);
                    intact = intact.min(next);
                    let bytes = unsafe { std::slice::from_raw_parts(block.as_ptr(), intact) };
                    prop_assert!(bytes.iter().all(|&b| b == 0xAB));
                    size = next;
                }
                unsafe { SystemAllocator.realloc(Some(block), 0, size) }.unwrap();
            }
        }
    }
}
