//! Error type shared by the allocator, both engines and the collections.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Malformed input: non-positive length or count, negative position.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("no matching element")]
    NotFound,

    #[error("key already present")]
    DuplicateKey,

    /// An extent, rank total or the handle space would leave its range.
    #[error("arithmetic overflow")]
    Overflow,

    #[error("node capacity of {capacity} exhausted")]
    CapacityExhausted { capacity: u32 },

    /// A fast enumerator was advanced after the tree changed shape.
    #[error("tree was modified; enumeration cannot continue")]
    StaleEnumerator,
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;
