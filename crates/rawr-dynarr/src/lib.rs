//! Growable arrays over a pluggable reallocator.
//!
//! A [`Dynarr`] keeps its bookkeeping and its elements in one block:
//!
//! ```text
//! ┌──────────────────────────────┬─────────┬──────────────────────────┐
//! │ Header { length, capacity,   │ padding │ capacity × element slots │
//! │          allocator: A }      │         │                          │
//! └──────────────────────────────┴─────────┴──────────────────────────┘
//! ^ block start (MAX_ALIGN)                ^ padded_header_size
//! ```
//!
//! Every capacity change reallocates the whole block through the
//! [`Reallocator`](rawr_core::Reallocator) stored in the header, so an
//! array can live on the process heap ([`SystemAllocator`]) or inside a
//! bump arena without knowing which.
//!
//! The growth policy (exact capacity changes, 3/2 amortized resizing,
//! silent truncation on shrink) lives in one untyped routine that works on
//! an [`ElementLayout`] instead of a concrete element type, so all element
//! types share it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod dynarr;
pub mod layout;
mod raw;

pub use dynarr::Dynarr;
pub use layout::ElementLayout;
pub use raw::{GROWTH_DENOMINATOR, GROWTH_NUMERATOR};
pub use rawr_core::{AllocError, Reallocator, SystemAllocator};
