//! Low-level primitives for arena memory operations.
//!
//! Every `unsafe` operation the arena performs lives here, each with a
//! `// SAFETY:` comment at the call site. The rest of the crate deals in
//! offsets and lengths checked against the cursor.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use rawr_core::{block_layout, AllocError};

/// Stand-in type whose dangling pointer is aligned to `MAX_ALIGN`.
#[repr(align(16))]
struct MaxAligned;

const _: () = assert!(std::mem::align_of::<MaxAligned>() == rawr_core::MAX_ALIGN);

/// Reserve the backing buffer for an arena of `capacity` bytes.
///
/// A zero-capacity arena owns no allocation and gets an aligned dangling
/// pointer instead.
pub(crate) fn alloc_buffer(capacity: usize) -> Result<NonNull<u8>, AllocError> {
    if capacity == 0 {
        return Ok(NonNull::<MaxAligned>::dangling().cast());
    }
    let layout = block_layout(capacity)?;
    // SAFETY: layout has non-zero size.
    let raw = unsafe { std::alloc::alloc(layout) };
    NonNull::new(raw).ok_or(AllocError::OutOfMemory { size: capacity })
}

/// Release a buffer obtained from [`alloc_buffer`].
///
/// # Safety
///
/// `base` must come from `alloc_buffer(capacity)` and not have been freed.
pub(crate) unsafe fn free_buffer(base: NonNull<u8>, capacity: usize) {
    if capacity == 0 {
        return;
    }
    if let Ok(layout) = block_layout(capacity) {
        // SAFETY: same pointer and layout as the original allocation.
        unsafe { std::alloc::dealloc(base.as_ptr(), layout) };
    }
}

/// Pointer `offset` bytes into the buffer starting at `base`.
///
/// Deriving from `base` keeps provenance over the whole buffer.
pub(crate) fn at_offset(base: NonNull<u8>, offset: usize) -> NonNull<u8> {
    // SAFETY: callers only pass `offset <= capacity`, which stays within (or
    // one past the end of) the buffer, so the result is non-null.
    unsafe { NonNull::new_unchecked(base.as_ptr().add(offset)) }
}

/// Copy `len` bytes from `src` to `dst`.
///
/// # Safety
///
/// `src` must be valid for reads and `dst` for writes of `len` bytes, and
/// the two regions must not overlap.
pub(crate) unsafe fn copy_prefix(src: NonNull<u8>, dst: NonNull<u8>, len: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), len) };
}

/// Write `value` into each of `len` slots at `ptr`, then view them as a slice.
///
/// # Safety
///
/// `ptr` must be aligned for `T` and valid for writes of `len` values of `T`
/// for `'a`, and no other reference to that region may exist during `'a`.
pub(crate) unsafe fn fill<'a, T: Copy>(ptr: NonNull<u8>, len: usize, value: T) -> &'a mut [T] {
    let ptr = ptr.cast::<T>().as_ptr();
    // SAFETY: forwarded from the caller; every slot is initialized before the
    // slice is formed.
    unsafe {
        for i in 0..len {
            ptr.add(i).write(value);
        }
        std::slice::from_raw_parts_mut(ptr, len)
    }
}

/// View `len` initialized bytes at `ptr` as a mutable slice.
///
/// # Safety
///
/// Same as [`fill`], and the bytes must already be initialized.
pub(crate) unsafe fn slice_mut<'a>(ptr: NonNull<u8>, len: usize) -> &'a mut [u8] {
    // SAFETY: forwarded from the caller.
    unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) }
}
