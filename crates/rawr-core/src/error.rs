//! Allocation error type.
//!
//! Allocation failure is the only recoverable error in rawr. Misuse such
//! as contracting past the length of an array or passing a misaligned
//! pointer is a programmer error and panics instead.

use std::error::Error;
use std::fmt;

/// A reservation or growth request that could not be satisfied.
///
/// The structure that issued the request is left exactly as it was
/// before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// A fixed-capacity arena does not have room for the request.
    CapacityExceeded {
        /// Bytes requested, including alignment padding.
        requested: usize,
        /// Bytes still free in the arena at the time of the request.
        available: usize,
    },
    /// The process allocator returned no memory.
    OutOfMemory {
        /// Size of the failed request in bytes.
        size: usize,
    },
    /// The requested size overflows `usize` or is not a valid layout.
    SizeOverflow,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                available,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, {available} bytes available"
                )
            }
            Self::OutOfMemory { size } => {
                write!(f, "process allocator failed to provide {size} bytes")
            }
            Self::SizeOverflow => write!(f, "allocation size overflows the address space"),
        }
    }
}

impl Error for AllocError {}
