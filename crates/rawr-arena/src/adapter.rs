//! Arena-backed [`Reallocator`] for growable arrays.
//!
//! [`ArenaAllocator`] borrows an [`Arena`] and serves the reallocation
//! contract from it at [`MAX_ALIGN`]. Released blocks are not reclaimed:
//! their bytes stay reserved until the arena is reset. Because the adapter
//! holds a shared borrow, the arena cannot be reset or dropped while any
//! array built on it is alive.

use std::ptr::NonNull;

use rawr_core::{AllocError, Reallocator, MAX_ALIGN};

use crate::arena::Arena;

/// A [`Reallocator`] drawing blocks from a borrowed [`Arena`].
#[derive(Clone, Copy, Debug)]
pub struct ArenaAllocator<'a> {
    arena: &'a Arena,
}

impl<'a> ArenaAllocator<'a> {
    /// Wrap `arena`. Equivalent to [`Arena::allocator`].
    pub fn new(arena: &'a Arena) -> Self {
        Self { arena }
    }

    /// The arena this allocator draws from.
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }
}

// SAFETY: blocks come from `Arena::alloc_raw`/`realloc_raw` at `MAX_ALIGN`,
// which preserve the common prefix and leave the cursor untouched on
// failure. The borrow of the arena keeps every block valid until the
// allocator (and anything storing it) is gone.
#[allow(unsafe_code)]
unsafe impl Reallocator for ArenaAllocator<'_> {
    unsafe fn realloc(
        &self,
        ptr: Option<NonNull<u8>>,
        new_size: usize,
        old_size: usize,
    ) -> Result<Option<NonNull<u8>>, AllocError> {
        match ptr {
            Some(_) if new_size == 0 => Ok(None),
            // SAFETY: the contract guarantees `ptr` is a live block of
            // `old_size` bytes from this arena, allocated at `MAX_ALIGN`.
            Some(ptr) => unsafe { self.arena.realloc_raw(ptr, new_size, old_size, MAX_ALIGN) }
                .map(Some),
            None if new_size > 0 => self.arena.alloc_raw(new_size, MAX_ALIGN).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn fresh_block_is_max_aligned() {
        let arena = Arena::new(256).unwrap();
        arena.alloc_raw(3, 1).unwrap();
        let block = unsafe { arena.allocator().realloc(None, 40, 0) }
            .unwrap()
            .unwrap();
        assert_eq!(block.as_ptr() as usize % MAX_ALIGN, 0);
    }

    #[test]
    fn none_and_zero_is_a_noop() {
        let arena = Arena::new(64).unwrap();
        let result = unsafe { arena.allocator().realloc(None, 0, 0) };
        assert_eq!(result, Ok(None));
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn release_returns_none_and_keeps_bytes_reserved() {
        let arena = Arena::new(64).unwrap();
        let alloc = arena.allocator();
        let block = unsafe { alloc.realloc(None, 32, 0) }.unwrap();
        assert_eq!(unsafe { alloc.realloc(block, 0, 32) }, Ok(None));
        assert_eq!(arena.used(), 32);
    }

    #[test]
    fn most_recent_block_grows_in_place() {
        let arena = Arena::new(128).unwrap();
        let alloc = arena.allocator();
        let block = unsafe { alloc.realloc(None, 32, 0) }.unwrap();
        let grown = unsafe { alloc.realloc(block, 64, 32) }.unwrap();
        assert_eq!(block, grown);
        assert_eq!(arena.used(), 64);
    }

    #[test]
    fn exhaustion_is_reported() {
        let arena = Arena::new(64).unwrap();
        let alloc = arena.allocator();
        let block = unsafe { alloc.realloc(None, 48, 0) }.unwrap();
        let err = unsafe { alloc.realloc(block, 96, 48) }.unwrap_err();
        assert!(matches!(err, AllocError::CapacityExceeded { .. }));
        assert_eq!(arena.used(), 48);
    }

    #[test]
    fn arena_accessor_returns_backing_arena() {
        let arena = Arena::new(16).unwrap();
        let alloc = ArenaAllocator::new(&arena);
        assert!(std::ptr::eq(alloc.arena(), &arena));
    }
}
