//! Fixed-capacity bump arena for rawr.
//!
//! An [`Arena`] reserves one contiguous buffer up front and hands out
//! sub-regions of it in O(1) by advancing a cursor. Nothing is freed
//! individually; [`Arena::reset`] rewinds the cursor and recycles the whole
//! buffer at once. The arena never grows once created.
//!
//! # Architecture
//!
//! ```text
//! Arena
//! ├── buffer: capacity bytes at MAX_ALIGN (one process allocation)
//! ├── used:   bump cursor, 0 <= used <= capacity
//! └── ArenaAllocator<'a> (adapter) ── implements rawr_core::Reallocator
//! ```
//!
//! # Grow in place
//!
//! Resizing the most recent allocation, when nothing has been allocated
//! after it, only moves the cursor. Any other allocation is grown by
//! copying into a fresh region; the old bytes stay reserved until reset.
//!
//! # Lifetimes
//!
//! Safe allocations borrow the arena (`&'a Arena -> &'a mut [u8]`) and
//! [`Arena::reset`] takes `&mut self`, so a reset while any allocation or
//! arena-backed array is still alive is rejected at compile time. All
//! `unsafe` is confined to `raw.rs` and the pointer-level entry points.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod arena;
pub mod config;
mod raw;

// Public re-exports for the primary API surface.
pub use adapter::ArenaAllocator;
pub use arena::Arena;
pub use config::ArenaConfig;
pub use rawr_core::AllocError;
