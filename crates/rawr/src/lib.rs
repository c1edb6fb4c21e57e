//! rawr: a bump arena, a growable array, and the allocator adapter that
//! lets the array live inside the arena.
//!
//! This is the facade crate re-exporting the public API of the rawr
//! sub-crates. Adding `rawr` as a single dependency is enough for most
//! users.
//!
//! # Quick start
//!
//! ```rust
//! use rawr::prelude::*;
//!
//! // Heap-backed array.
//! let mut squares: Dynarr<u64> = Dynarr::new().unwrap();
//! for i in 0..4 {
//!     squares.push(i * i).unwrap();
//! }
//! assert_eq!(&squares[..], &[0, 1, 4, 9]);
//!
//! // Arena-backed array: the borrow keeps the arena alive and un-reset.
//! let mut arena = Arena::with_config(ArenaConfig::new(1024)).unwrap();
//! {
//!     let mut ids: Dynarr<u32, ArenaAllocator<'_>> = Dynarr::new_in(arena.allocator()).unwrap();
//!     ids.extend(3).unwrap();
//!     *ids.last_mut() = 7;
//!     assert_eq!(ids.as_slice(), &[0, 0, 7]);
//!     assert_eq!(arena.used(), ids.allocation_size());
//! }
//! arena.reset();
//! assert_eq!(arena.used(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `rawr-core` | `AllocError`, the `Reallocator` contract, `SystemAllocator` |
//! | [`arena`] | `rawr-arena` | `Arena`, `ArenaConfig`, `ArenaAllocator` |
//! | [`dynarr`] | `rawr-dynarr` | `Dynarr`, `ElementLayout`, growth constants |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Allocation error and the reallocation contract (`rawr-core`).
///
/// Implement [`types::Reallocator`] to give arrays a custom storage source.
pub use rawr_core as types;

/// Fixed-capacity bump arena (`rawr-arena`).
///
/// [`arena::Arena::allocator`] yields the [`arena::ArenaAllocator`] that
/// backs arrays with arena memory.
pub use rawr_arena as arena;

/// Growable array in a single header-prefixed block (`rawr-dynarr`).
pub use rawr_dynarr as dynarr;

/// Common imports for typical rawr usage.
///
/// ```rust
/// use rawr::prelude::*;
/// ```
pub mod prelude {
    pub use rawr_arena::{Arena, ArenaAllocator, ArenaConfig};
    pub use rawr_core::{AllocError, Reallocator, SystemAllocator, MAX_ALIGN};
    pub use rawr_dynarr::Dynarr;
}
