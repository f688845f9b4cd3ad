use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanarIndexError {
    /// A nearest-neighbor query was issued against a tree holding no points.
    #[error("Cannot query an empty index.")]
    EmptyIndex,

    /// A point had a coordinate that cannot be totally ordered, such as NaN.
    #[error("Point at index {index} has a coordinate that cannot be ordered.")]
    InvalidPoint { index: u32 },

    #[error("Added {added} items when expected {expected}.")]
    ItemCountMismatch { expected: usize, added: usize },

    #[error("Too many items: {0}. At most u32::MAX items can be indexed.")]
    TooManyItems(usize),
}

pub type Result<T> = std::result::Result<T, PlanarIndexError>;
