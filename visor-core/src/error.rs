//! Error types for visor-core.

use thiserror::Error;

/// Result type for visor-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for visor-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An offset whose end lies before its begin.
    #[error("Invalid offset: end {end} is before begin {begin}")]
    InvalidOffset {
        /// Requested begin
        begin: usize,
        /// Requested end
        end: usize,
    },

    /// A suggestion was added to a group belonging to another document.
    #[error("Document mismatch: group belongs to '{expected}', suggestion to '{found}'")]
    DocumentMismatch {
        /// Document of the group
        expected: String,
        /// Document of the rejected suggestion
        found: String,
    },
}

impl Error {
    /// Create a document mismatch error.
    #[must_use]
    pub fn document_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::DocumentMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
