//! Common error types for Canopy.

use thiserror::Error;

/// Errors that can occur while loading or assembling graph data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The document could not be parsed.
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// A resource is stored under a type it does not declare.
    #[error("Resource {id} declares type {declared} but is stored under {expected}")]
    TypeMismatch {
        id: String,
        declared: String,
        expected: String,
    },

    /// A resource is stored under a key that differs from its id.
    #[error("Resource {id} of type {type_name} is stored under key {key}")]
    IdMismatch {
        type_name: String,
        id: String,
        key: String,
    },

    /// Two resources share the same type and id.
    #[error("Duplicate resource: {type_name}:{id}")]
    DuplicateResource { type_name: String, id: String },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
