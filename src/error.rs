//! Error types for visor.

use crate::{LayerId, Offset, SuggestionId};
use thiserror::Error;

/// Result type for visor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for visor operations.
///
/// None of these are produced by the visibility engine itself; they come
/// from the orchestration boundary, configuration loading, and the stores.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the core data model.
    #[error(transparent)]
    Core(#[from] visor_core::Error),

    /// Layer not known to the overlap policy.
    #[error("Unknown layer: {0}")]
    UnknownLayer(LayerId),

    /// Document not known to the session.
    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    /// No suggestion with this id in the current predictions.
    #[error("Unknown suggestion: {0}")]
    UnknownSuggestion(SuggestionId),

    /// Committing a suggestion would clash with an existing annotation.
    #[error("Annotation conflict: layer {layer} already has a conflicting annotation at {offset}")]
    AnnotationConflict {
        /// Layer of the suggestion
        layer: LayerId,
        /// Position of the suggestion
        offset: Offset,
    },

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an unknown document error.
    #[must_use]
    pub fn unknown_document(name: impl Into<String>) -> Self {
        Error::UnknownDocument(name.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
