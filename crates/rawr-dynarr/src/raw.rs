//! Untyped growth routine shared by every element type.
//!
//! [`RawDynarr`] owns a header-prefixed block and knows nothing about the
//! elements beyond the [`ElementLayout`] passed to each call. The typed
//! wrapper must pass the same layout for the whole life of an instance.

#![allow(unsafe_code)]

use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

use rawr_core::{AllocError, Reallocator};

use crate::layout::{ElementLayout, Header};

/// Multiplier applied to the requested length when resizing past capacity.
pub const GROWTH_NUMERATOR: usize = 3;

/// Divisor applied after [`GROWTH_NUMERATOR`]; integer division truncates.
pub const GROWTH_DENOMINATOR: usize = 2;

/// Capacity chosen when a resize to `length` outgrows the current block.
pub(crate) fn amortized_capacity(length: usize) -> Result<usize, AllocError> {
    length
        .checked_mul(GROWTH_NUMERATOR)
        .map(|n| n / GROWTH_DENOMINATOR)
        .ok_or(AllocError::SizeOverflow)
}

/// Handle to a live array block.
pub(crate) struct RawDynarr<A: Reallocator> {
    header: NonNull<Header<A>>,
}

impl<A: Reallocator> RawDynarr<A> {
    /// Reserve a block for `capacity` elements and record `length`.
    ///
    /// # Panics
    ///
    /// Panics if `length > capacity`.
    pub(crate) fn create(
        length: usize,
        capacity: usize,
        allocator: A,
        layout: ElementLayout,
    ) -> Result<Self, AllocError> {
        assert!(
            length <= capacity,
            "length {length} exceeds capacity {capacity}"
        );
        let size = layout.block_size(capacity)?;
        // SAFETY: no existing block is passed.
        let block = unsafe { allocator.realloc(None, size, 0)? }
            .ok_or(AllocError::OutOfMemory { size })?;
        let header = block.cast::<Header<A>>();
        // SAFETY: the block is `MAX_ALIGN`-aligned and at least
        // `padded_header_size >= size_of::<Header<A>>()` bytes long.
        unsafe {
            header.as_ptr().write(Header {
                length,
                capacity,
                allocator,
            })
        };
        tracing::trace!(length, capacity, bytes = size, "dynarr created");
        Ok(Self { header })
    }

    fn header(&self) -> &Header<A> {
        // SAFETY: `header` points to an initialized header for as long as
        // `self` is alive.
        unsafe { self.header.as_ref() }
    }

    fn header_mut(&mut self) -> &mut Header<A> {
        // SAFETY: as in `header`, and `&mut self` makes the access unique.
        unsafe { self.header.as_mut() }
    }

    pub(crate) fn len(&self) -> usize {
        self.header().length
    }

    pub(crate) fn capacity(&self) -> usize {
        self.header().capacity
    }

    pub(crate) fn allocator(&self) -> &A {
        &self.header().allocator
    }

    /// Start of the element region.
    pub(crate) fn data(&self, layout: ElementLayout) -> NonNull<u8> {
        // SAFETY: `padded_header_size` is within the block (the block is at
        // least that long), so the offset pointer is in bounds and non-null.
        unsafe {
            let block = self.header.cast::<u8>().as_ptr();
            NonNull::new_unchecked(block.add(layout.padded_header_size))
        }
    }

    /// Exact byte size of the live block.
    pub(crate) fn allocation_size(&self, layout: ElementLayout) -> usize {
        // Validated by `block_size` when the block was sized.
        layout.padded_header_size + self.capacity() * layout.element_size
    }

    /// Reallocate the block to hold exactly `new_capacity` elements.
    ///
    /// On failure nothing changes. On success a length above the new
    /// capacity is truncated to it.
    pub(crate) fn set_capacity(
        &mut self,
        new_capacity: usize,
        layout: ElementLayout,
    ) -> Result<(), AllocError> {
        let new_size = layout.block_size(new_capacity)?;
        let old_size = self.allocation_size(layout);
        let old_capacity = self.capacity();
        let block = self.header.cast::<u8>();

        // The allocator lives inside the block it is about to move. Work on a
        // copy and write it back into whichever block survives; until then
        // the header copy stays the owner, so a panic cannot drop it twice.
        // SAFETY: the header is initialized; the copy is never dropped.
        let allocator = ManuallyDrop::new(unsafe {
            ptr::read(ptr::addr_of!((*self.header.as_ptr()).allocator))
        });
        // SAFETY: `block` came from this allocator with size `old_size`.
        let result = unsafe { allocator.realloc(Some(block), new_size, old_size) };

        match result {
            Ok(Some(new_block)) => {
                let header = new_block.cast::<Header<A>>();
                // SAFETY: the new block holds at least the header, whose
                // bytes were carried over from the old block.
                unsafe {
                    let h = header.as_ptr();
                    let slot = ptr::addr_of_mut!((*h).allocator);
                    slot.write(ManuallyDrop::into_inner(allocator));
                    (*h).capacity = new_capacity;
                    if (*h).length > new_capacity {
                        (*h).length = new_capacity;
                    }
                }
                self.header = header;
                tracing::trace!(
                    old_capacity,
                    new_capacity,
                    bytes = new_size,
                    "dynarr capacity changed"
                );
                Ok(())
            }
            Ok(None) => panic!("reallocator released a block on a {new_size}-byte resize"),
            Err(err) => {
                // SAFETY: the old block is untouched on `Err`; its header
                // takes the allocator back, including any state it updated.
                unsafe {
                    let slot = ptr::addr_of_mut!((*self.header.as_ptr()).allocator);
                    slot.write(ManuallyDrop::into_inner(allocator));
                }
                tracing::trace!(old_capacity, new_capacity, %err, "dynarr capacity change failed");
                Err(err)
            }
        }
    }

    /// Set the length; amortized growth past capacity.
    pub(crate) fn resize(
        &mut self,
        new_length: usize,
        layout: ElementLayout,
    ) -> Result<(), AllocError> {
        if new_length > self.capacity() {
            self.set_capacity(amortized_capacity(new_length)?, layout)?;
        }
        self.header_mut().length = new_length;
        Ok(())
    }

    /// Set the length and make capacity exactly match it.
    pub(crate) fn resize_exact(
        &mut self,
        new_length: usize,
        layout: ElementLayout,
    ) -> Result<(), AllocError> {
        self.set_capacity(new_length, layout)?;
        self.header_mut().length = new_length;
        Ok(())
    }

    /// Grow the length by `n` with amortized capacity growth.
    pub(crate) fn extend(&mut self, n: usize, layout: ElementLayout) -> Result<(), AllocError> {
        let new_length = self.len().checked_add(n).ok_or(AllocError::SizeOverflow)?;
        self.resize(new_length, layout)
    }

    /// Drop the last `n` elements from view without reallocating.
    ///
    /// # Panics
    ///
    /// Panics if `n > len`.
    pub(crate) fn contract(&mut self, n: usize) {
        let length = self.len();
        assert!(n <= length, "cannot contract by {n}: length is {length}");
        self.header_mut().length = length - n;
    }

    /// Index of the last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    pub(crate) fn last_index(&self) -> usize {
        let length = self.len();
        assert!(length > 0, "last_index called on an empty array");
        length - 1
    }

    /// Release the block through the stored allocator.
    ///
    /// # Safety
    ///
    /// `self` must not be used afterwards.
    pub(crate) unsafe fn release(&mut self, layout: ElementLayout) {
        let size = self.allocation_size(layout);
        // SAFETY: the header is initialized and is not read again after the
        // block is released, so this copy becomes the only owner.
        let allocator = unsafe { ptr::read(ptr::addr_of!((*self.header.as_ptr()).allocator)) };
        // SAFETY: the block came from this allocator with size `size`.
        if let Err(err) = unsafe { allocator.realloc(Some(self.header.cast()), 0, size) } {
            tracing::warn!(%err, bytes = size, "failed to release dynarr block");
        }
    }
}
