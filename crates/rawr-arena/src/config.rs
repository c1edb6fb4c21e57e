//! Arena configuration parameters.

/// Configuration for an [`Arena`](crate::Arena).
///
/// Capacity is fixed for the lifetime of the arena; there is no growth
/// policy to configure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of the backing buffer in bytes.
    ///
    /// Default: 65_536 (64KB).
    pub capacity: usize,
}

impl ArenaConfig {
    /// Default arena capacity: 64KB.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    /// Create a config for an arena of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
