//! Block layout of a growable array.
//!
//! The untyped routine never sees the element type; it only needs the
//! element size and where the element region starts. [`ElementLayout`]
//! carries exactly those two numbers.

use rawr_core::AllocError;

/// Bookkeeping at the start of every array block.
#[repr(C)]
pub(crate) struct Header<A> {
    pub(crate) length: usize,
    pub(crate) capacity: usize,
    pub(crate) allocator: A,
}

/// Element size and data offset for one array type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementLayout {
    /// Size of one element in bytes.
    pub element_size: usize,
    /// Offset of the first element from the block start: the header size
    /// rounded up to the element alignment.
    pub padded_header_size: usize,
}

impl ElementLayout {
    /// Layout of an array of `T` whose header stores an `A`.
    pub const fn of<T, A>() -> Self {
        let header = std::mem::size_of::<Header<A>>();
        let align = std::mem::align_of::<T>();
        Self {
            element_size: std::mem::size_of::<T>(),
            padded_header_size: (header + align - 1) & !(align - 1),
        }
    }

    /// Bytes needed for a block holding `capacity` elements.
    ///
    /// Returns `Err(AllocError::SizeOverflow)` if the size does not fit in
    /// `usize`.
    pub fn block_size(&self, capacity: usize) -> Result<usize, AllocError> {
        capacity
            .checked_mul(self.element_size)
            .and_then(|bytes| bytes.checked_add(self.padded_header_size))
            .ok_or(AllocError::SizeOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawr_core::SystemAllocator;

    #[allow(dead_code)]
    #[repr(align(16))]
    struct Wide([u8; 16]);

    #[test]
    fn header_is_two_words_for_zero_sized_allocator() {
        let layout = ElementLayout::of::<u32, SystemAllocator>();
        assert_eq!(layout.element_size, 4);
        assert_eq!(layout.padded_header_size, 2 * std::mem::size_of::<usize>());
    }

    #[test]
    fn header_is_padded_to_element_alignment() {
        // Header with a one-word allocator: three words, rounded up to 16.
        let layout = ElementLayout::of::<Wide, &SystemAllocator>();
        assert_eq!(layout.padded_header_size % 16, 0);
        assert!(layout.padded_header_size >= 3 * std::mem::size_of::<usize>());
        assert_eq!(layout.element_size, 16);
    }

    #[test]
    fn block_size_counts_header_and_slots() {
        let layout = ElementLayout {
            element_size: 4,
            padded_header_size: 16,
        };
        assert_eq!(layout.block_size(0), Ok(16));
        assert_eq!(layout.block_size(7), Ok(44));
    }

    #[test]
    fn block_size_overflow_is_reported() {
        let layout = ElementLayout {
            element_size: 8,
            padded_header_size: 16,
        };
        assert_eq!(layout.block_size(usize::MAX), Err(AllocError::SizeOverflow));
    }
}
