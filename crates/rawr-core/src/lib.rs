//! Core types and traits shared by the rawr memory primitives.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the allocation error type and the [`Reallocator`] contract through
//! which a growable array obtains its storage, together with the
//! default [`SystemAllocator`] backed by the process heap.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod alloc;
pub mod error;

pub use alloc::{block_layout, Reallocator, SystemAllocator, MAX_ALIGN};
pub use error::AllocError;
