//! Error types for sample storage

use thiserror::Error;

use crate::value::{ElementType, Shape};

/// Error raised by [`Sample`](crate::Sample) implementations.
#[derive(Debug, Error)]
pub enum SampleError {
    /// A typed accessor was used on a key holding a different shape.
    #[error("key `{key}` holds a {found} but a {expected} was requested")]
    ShapeMismatch {
        key: String,
        expected: Shape,
        found: Shape,
    },

    /// An element did not match the declared element type.
    #[error("expected {expected} element, found {found}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    /// The value cannot be represented by the backend.
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// The container file is malformed.
    #[error("corrupt sample file: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sample operations
pub type Result<T> = std::result::Result<T, SampleError>;
