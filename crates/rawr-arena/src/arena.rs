//! The fixed-capacity bump arena.
//!
//! An [`Arena`] is a single pre-allocated buffer with a cursor that
//! advances on each allocation. Arenas are never grown and never freed
//! piecemeal: they are reset in bulk or dropped.

use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

use rawr_core::AllocError;

use crate::adapter::ArenaAllocator;
use crate::config::ArenaConfig;
use crate::raw;

/// Padding needed to lift `address` to the next multiple of `alignment`.
pub fn padding_for(address: usize, alignment: usize) -> usize {
    (alignment - address % alignment) % alignment
}

/// A fixed-capacity bump allocator.
///
/// Allocation takes `&self`: the cursor lives in a [`Cell`], so many
/// allocations can be alive at once while the arena is shared. That also
/// makes the arena `!Sync`; it belongs to one thread of control at a time.
/// Regions handed out stay valid until [`Arena::reset`] or drop, both of
/// which need exclusive access.
pub struct Arena {
    /// Start of the backing buffer, aligned to `MAX_ALIGN`.
    base: NonNull<u8>,
    /// Total size of the backing buffer in bytes.
    capacity: usize,
    /// Bump pointer: bytes consumed since the last reset.
    used: Cell<usize>,
    /// Number of resets performed so far.
    generation: u64,
}

impl Arena {
    /// Create an arena with `capacity` bytes of backing storage.
    ///
    /// Returns `Err(AllocError)` if the process allocator cannot provide
    /// the buffer.
    pub fn new(capacity: usize) -> Result<Self, AllocError> {
        Self::with_config(ArenaConfig::new(capacity))
    }

    /// Create an arena from a configuration.
    pub fn with_config(config: ArenaConfig) -> Result<Self, AllocError> {
        let base = raw::alloc_buffer(config.capacity)?;
        tracing::debug!(capacity = config.capacity, "arena created");
        Ok(Self {
            base,
            capacity: config.capacity,
            used: Cell::new(0),
            generation: 0,
        })
    }

    /// Reserve `size` bytes aligned to `alignment`.
    ///
    /// Padding is computed from the address of the next free byte. Returns
    /// `Err(AllocError::CapacityExceeded)` if padding plus `size` does not
    /// fit in the remaining capacity; the cursor is unchanged in that case.
    /// The returned memory is uninitialized and valid until the next reset.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    pub fn alloc_raw(&self, size: usize, alignment: usize) -> Result<NonNull<u8>, AllocError> {
        assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );
        let used = self.used.get();
        let padding = padding_for(self.base.as_ptr() as usize + used, alignment);
        let requested = padding.checked_add(size).ok_or(AllocError::SizeOverflow)?;
        let available = self.capacity - used;
        if requested > available {
            tracing::trace!(
                requested,
                available,
                generation = self.generation,
                "arena exhausted"
            );
            return Err(AllocError::CapacityExceeded {
                requested,
                available,
            });
        }
        self.used.set(used + requested);
        Ok(raw::at_offset(self.base, used + padding))
    }

    /// Resize an allocation, in place when it is the most recent one.
    ///
    /// - `new_size <= old_size`: returns `ptr` unchanged; the tail stays
    ///   reserved until reset.
    /// - `ptr + old_size` is the current top of the arena: the cursor is
    ///   advanced by `new_size - old_size` and the same address returned.
    /// - otherwise: a fresh region is allocated at `alignment` and the first
    ///   `old_size` bytes are copied into it; the old region stays reserved
    ///   until reset.
    ///
    /// On `Err` nothing changed and `ptr` is still valid.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `old_size` bytes. To be grown in
    /// place it must have been returned by this arena since the last reset.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two or `ptr` is not aligned
    /// to it. Use the alignment of the original allocation.
    #[allow(unsafe_code)]
    pub unsafe fn realloc_raw(
        &self,
        ptr: NonNull<u8>,
        new_size: usize,
        old_size: usize,
        alignment: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        assert!(
            alignment.is_power_of_two(),
            "alignment must be a power of two, got {alignment}"
        );
        assert!(
            ptr.as_ptr() as usize % alignment == 0,
            "pointer is not aligned to {alignment}"
        );

        if new_size <= old_size {
            return Ok(ptr);
        }

        if let Some(offset) = self.top_offset_of(ptr, old_size) {
            let delta = new_size - old_size;
            let used = self.used.get();
            let available = self.capacity - used;
            if delta > available {
                tracing::trace!(
                    requested = delta,
                    available,
                    generation = self.generation,
                    "arena exhausted growing in place"
                );
                return Err(AllocError::CapacityExceeded {
                    requested: delta,
                    available,
                });
            }
            self.used.set(used + delta);
            return Ok(raw::at_offset(self.base, offset));
        }

        let fresh = self.alloc_raw(new_size, alignment)?;
        // SAFETY: the caller guarantees `ptr` is readable for `old_size`
        // bytes; `fresh` was just reserved past the old top, so it is
        // writable for `new_size > old_size` bytes and disjoint from `ptr`.
        unsafe { raw::copy_prefix(ptr, fresh, old_size) };
        Ok(fresh)
    }

    /// Offset of `ptr` within the buffer if `ptr + len` is the current top.
    fn top_offset_of(&self, ptr: NonNull<u8>, len: usize) -> Option<usize> {
        let base = self.base.as_ptr() as usize;
        let start = ptr.as_ptr() as usize;
        let offset = start.checked_sub(base)?;
        (offset.checked_add(len)? == self.used.get()).then_some(offset)
    }

    /// Reserve `size` zero-filled bytes aligned to `alignment`.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc_bytes(&self, size: usize, alignment: usize) -> Result<&mut [u8], AllocError> {
        let ptr = self.alloc_raw(size, alignment)?;
        // SAFETY: the region was just reserved, is disjoint from every other
        // live allocation and stays valid while `self` is borrowed.
        Ok(unsafe { raw::fill(ptr, size, 0u8) })
    }

    /// Move `value` into the arena.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc_value<T: Copy>(&self, value: T) -> Result<&mut T, AllocError> {
        let ptr = self.alloc_raw(std::mem::size_of::<T>(), std::mem::align_of::<T>())?;
        // SAFETY: fresh, aligned for `T`, sized for one `T`, not aliased.
        let slot = unsafe { raw::fill(ptr, 1, value) };
        Ok(&mut slot[0])
    }

    /// Reserve `len` elements of `T`, each set to `T::default()`.
    #[allow(unsafe_code, clippy::mut_from_ref)]
    pub fn alloc_slice<T: Copy + Default>(&self, len: usize) -> Result<&mut [T], AllocError> {
        let size = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(AllocError::SizeOverflow)?;
        let ptr = self.alloc_raw(size, std::mem::align_of::<T>())?;
        // SAFETY: fresh, aligned for `T`, sized for `len` values, not aliased.
        Ok(unsafe { raw::fill(ptr, len, T::default()) })
    }

    /// Resize a byte slice previously returned by this arena.
    ///
    /// Applies the same policy as [`Arena::realloc_raw`] and updates `bytes`
    /// to view the resized region. Bytes gained by growth are zero-filled.
    /// A shrink only narrows the view. A slice that does not start inside
    /// this arena is always copied, never grown in place. On `Err`, `bytes`
    /// is left as it was.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is not aligned to `alignment`.
    #[allow(unsafe_code)]
    pub fn grow_bytes<'a>(
        &'a self,
        bytes: &mut &'a mut [u8],
        new_size: usize,
        alignment: usize,
    ) -> Result<(), AllocError> {
        let old_size = bytes.len();
        if new_size <= old_size {
            let whole = std::mem::take(bytes);
            *bytes = &mut whole[..new_size];
            return Ok(());
        }

        let ptr = NonNull::from(&mut **bytes).cast::<u8>();
        // SAFETY: `bytes` is a live slice of `old_size` initialized bytes.
        let grown = unsafe { self.realloc_raw(ptr, new_size, old_size, alignment)? };
        // The result always lies inside our buffer; re-derive it from `base`
        // so the new view is not limited to the old slice's extent.
        let offset = grown.as_ptr() as usize - self.base.as_ptr() as usize;
        let grown = raw::at_offset(self.base, offset);

        // The old view overlaps the new one when grown in place.
        std::mem::take(bytes);
        // SAFETY: `grown` holds `old_size` initialized bytes (kept in place or
        // copied) followed by freshly reserved bytes; the tail is zeroed
        // before the whole region is viewed. Nothing else borrows it.
        unsafe {
            raw::fill(raw::at_offset(grown, old_size), new_size - old_size, 0u8);
            *bytes = raw::slice_mut(grown, new_size);
        }
        Ok(())
    }

    /// Rewind the cursor to zero, invalidating every previous allocation.
    ///
    /// The backing memory is neither freed nor zeroed.
    pub fn reset(&mut self) {
        self.used.set(0);
        self.generation = self.generation.wrapping_add(1);
        tracing::trace!(generation = self.generation, "arena reset");
    }

    /// An allocator that lets a growable array draw storage from this arena.
    pub fn allocator(&self) -> ArenaAllocator<'_> {
        ArenaAllocator::new(self)
    }

    /// Bytes consumed since the last reset, padding included.
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes still free.
    pub fn remaining(&self) -> usize {
        self.capacity - self.used.get()
    }

    /// Number of times the arena has been reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Arena {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        tracing::debug!(
            capacity = self.capacity,
            generation = self.generation,
            "arena destroyed"
        );
        // SAFETY: `base` came from `alloc_buffer(capacity)` and is freed once.
        unsafe { raw::free_buffer(self.base, self.capacity) };
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("used", &self.used.get())
            .field("capacity", &self.capacity)
            .field("generation", &self.generation)
            .finish()
    }
}
