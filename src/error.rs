use thiserror::Error;

/// Errors reported by views and their backing buffers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The view was disposed and no longer observes its source.
    #[error("view has been disposed")]
    Disposed,

    /// Two entries of a sorted view produced the same identity key.
    #[error("duplicate identity key in sorted view")]
    DuplicateKey,

    /// No entry is stored under the requested alternate index.
    #[error("no entry at alternate index {0}")]
    AlternateIndexNotFound(usize),

    #[error("index {index} out of range for length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("collection is empty")]
    Empty,
}

pub type Result<T> = std::result::Result<T, Error>;
