//! Typed growable array.
//!
//! [`Dynarr`] pairs the untyped block routine with a concrete element type.
//! Elements are plain `Copy` data. Every slot below `capacity` always holds
//! an initialized value: slots gained by growing the block are set to
//! `T::default()`, and slots hidden by [`Dynarr::contract`] keep their
//! values until the length grows over them again.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use rawr_core::{AllocError, Reallocator, SystemAllocator, MAX_ALIGN};

use crate::layout::{ElementLayout, Header};
use crate::raw::{amortized_capacity, RawDynarr};

/// A growable array stored in one header-prefixed block.
///
/// The reallocator `A` is stored by value inside the block, so every
/// instance carries its own allocation strategy. With
/// `rawr_arena::ArenaAllocator` the array borrows an arena and cannot
/// outlive it.
///
/// # Example
///
/// ```
/// use rawr_dynarr::Dynarr;
///
/// let mut arr: Dynarr<u32> = Dynarr::new().unwrap();
/// arr.push(7).unwrap();
/// arr.push(9).unwrap();
/// assert_eq!(arr.as_slice(), &[7, 9]);
/// assert_eq!(arr.capacity(), 3);
/// ```
pub struct Dynarr<T: Copy + Default, A: Reallocator = SystemAllocator> {
    raw: RawDynarr<A>,
    _marker: PhantomData<T>,
}

impl<T: Copy + Default> Dynarr<T> {
    /// Empty heap-backed array with no element slots.
    pub fn new() -> Result<Self, AllocError> {
        Self::new_in(SystemAllocator)
    }

    /// Empty heap-backed array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::with_capacity_in(capacity, SystemAllocator)
    }

    /// Heap-backed array of `length` default elements, amortized capacity.
    pub fn with_length(length: usize) -> Result<Self, AllocError> {
        Self::with_length_in(length, SystemAllocator)
    }

    /// Heap-backed array of `length` default elements, capacity exactly `length`.
    pub fn with_length_exact(length: usize) -> Result<Self, AllocError> {
        Self::with_length_exact_in(length, SystemAllocator)
    }
}

impl<T: Copy + Default, A: Reallocator> Dynarr<T, A> {
    const LAYOUT: ElementLayout = {
        assert!(
            std::mem::align_of::<T>() <= MAX_ALIGN,
            "element alignment exceeds MAX_ALIGN"
        );
        assert!(
            std::mem::align_of::<Header<A>>() <= MAX_ALIGN,
            "allocator alignment exceeds MAX_ALIGN"
        );
        ElementLayout::of::<T, A>()
    };

    /// Create an array of `length` default elements with room for `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `length > capacity`.
    pub fn create_in(length: usize, capacity: usize, allocator: A) -> Result<Self, AllocError> {
        let fill = T::default();
        let raw = RawDynarr::create(length, capacity, allocator, Self::LAYOUT)?;
        let mut arr = Self {
            raw,
            _marker: PhantomData,
        };
        arr.init_slots(0, fill);
        Ok(arr)
    }

    /// Empty array with no element slots.
    pub fn new_in(allocator: A) -> Result<Self, AllocError> {
        Self::create_in(0, 0, allocator)
    }

    /// Empty array with room for `capacity` elements.
    pub fn with_capacity_in(capacity: usize, allocator: A) -> Result<Self, AllocError> {
        Self::create_in(0, capacity, allocator)
    }

    /// Array of `length` default elements with capacity `length * 3 / 2`.
    pub fn with_length_in(length: usize, allocator: A) -> Result<Self, AllocError> {
        Self::create_in(length, amortized_capacity(length)?, allocator)
    }

    /// Array of `length` default elements with capacity exactly `length`.
    pub fn with_length_exact_in(length: usize, allocator: A) -> Result<Self, AllocError> {
        Self::create_in(length, length, allocator)
    }

    /// Release the block. Same as dropping the array.
    pub fn destroy(self) {
        drop(self);
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the array has no live elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of element slots in the block.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// The reallocator stored in the block.
    pub fn allocator(&self) -> &A {
        self.raw.allocator()
    }

    /// Element size and data offset used for this array type.
    pub fn element_layout(&self) -> ElementLayout {
        Self::LAYOUT
    }

    /// Exact byte size of the block: header plus `capacity` slots.
    pub fn allocation_size(&self) -> usize {
        self.raw.allocation_size(Self::LAYOUT)
    }

    /// Reallocate to exactly `new_capacity` slots.
    ///
    /// If the length exceeds `new_capacity` it is silently truncated; the
    /// surviving elements keep their values. On `Err` the array is unchanged.
    pub fn set_capacity(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        self.reshape(|raw, layout| raw.set_capacity(new_capacity, layout))
    }

    /// Set the length to `new_length`.
    ///
    /// Within capacity this never reallocates. Past capacity the block is
    /// grown to `new_length * 3 / 2` slots first. On `Err` the array is
    /// unchanged.
    pub fn resize(&mut self, new_length: usize) -> Result<(), AllocError> {
        self.reshape(|raw, layout| raw.resize(new_length, layout))
    }

    /// Set the length to `new_length` and the capacity to exactly that.
    pub fn resize_exact(&mut self, new_length: usize) -> Result<(), AllocError> {
        self.reshape(|raw, layout| raw.resize_exact(new_length, layout))
    }

    /// Grow the length by `n`, as `resize(len + n)`.
    pub fn extend(&mut self, n: usize) -> Result<(), AllocError> {
        self.reshape(|raw, layout| raw.extend(n, layout))
    }

    /// Hide the last `n` elements without reallocating.
    ///
    /// Their values survive and reappear if the length grows back.
    ///
    /// # Panics
    ///
    /// Panics if `n > len`.
    pub fn contract(&mut self, n: usize) {
        self.raw.contract(n);
    }

    /// Index of the last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    pub fn last_index(&self) -> usize {
        self.raw.last_index()
    }

    /// The last element.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    pub fn last(&self) -> &T {
        &self.as_slice()[self.last_index()]
    }

    /// The last element, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    pub fn last_mut(&mut self) -> &mut T {
        let index = self.last_index();
        &mut self.as_mut_slice()[index]
    }

    /// Append `value`, growing the block by the amortized policy if needed.
    pub fn push(&mut self, value: T) -> Result<(), AllocError> {
        self.extend(1)?;
        *self.last_mut() = value;
        Ok(())
    }

    /// The live elements.
    #[allow(unsafe_code)]
    pub fn as_slice(&self) -> &[T] {
        let data = self.raw.data(Self::LAYOUT).cast::<T>();
        // SAFETY: the data region is aligned for `T` and every slot below
        // capacity, hence below length, is initialized.
        unsafe { std::slice::from_raw_parts(data.as_ptr(), self.len()) }
    }

    /// The live elements, mutably.
    #[allow(unsafe_code)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let data = self.raw.data(Self::LAYOUT).cast::<T>();
        // SAFETY: as in `as_slice`; `&mut self` makes the access unique.
        unsafe { std::slice::from_raw_parts_mut(data.as_ptr(), self.len()) }
    }

    /// Run a block-changing operation, then initialize any slots it added.
    ///
    /// `T::default()` runs before the block changes: from the operation
    /// until every new slot is written nothing can panic, so no length or
    /// capacity ever covers uninitialized slots.
    fn reshape(
        &mut self,
        op: impl FnOnce(&mut RawDynarr<A>, ElementLayout) -> Result<(), AllocError>,
    ) -> Result<(), AllocError> {
        let fill = T::default();
        let old_capacity = self.capacity();
        op(&mut self.raw, Self::LAYOUT)?;
        self.init_slots(old_capacity, fill);
        Ok(())
    }

    /// Set slots `from..capacity` to `fill`.
    #[allow(unsafe_code)]
    fn init_slots(&mut self, from: usize, fill: T) {
        let data = self.raw.data(Self::LAYOUT).cast::<T>();
        for i in from..self.capacity() {
            // SAFETY: `i < capacity`, so the slot lies inside the block.
            unsafe { data.as_ptr().add(i).write(fill) };
        }
    }
}

impl<T: Copy + Default, A: Reallocator> Drop for Dynarr<T, A> {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: `self.raw` is never touched again.
        unsafe { self.raw.release(Self::LAYOUT) };
    }
}

impl<T: Copy + Default, A: Reallocator> Deref for Dynarr<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy + Default, A: Reallocator> DerefMut for Dynarr<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy + Default + fmt::Debug, A: Reallocator> fmt::Debug for Dynarr<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynarr")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("elements", &self.as_slice())
            .finish()
    }
}
