//! Error types for the learning components

use cutforge_core::{Category, SampleError};
use thiserror::Error;

/// Main error type for learning operations
#[derive(Debug, Error)]
pub enum LearnError {
    /// Error reading or writing a sample
    #[error("Sample error: {0}")]
    Sample(#[from] SampleError),

    /// Error encoding or decoding a violation set
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Constraint identifier has no text form
    #[error("constraint identifier {0:?} is not valid UTF-8")]
    NonUtf8Identifier(Vec<u8>),

    /// Sample lacks the instance feature vector
    #[error("sample has no numeric instance features under `{0}`")]
    MissingInstanceFeatures(String),

    /// Sample lacks the enforced-violation set
    #[error("sample has no enforced constraints under `{0}`")]
    MissingEnforced(String),

    /// Scalar holds the wrong primitive type
    #[error("scalar `{key}` must be a {expected}")]
    ScalarType { key: String, expected: &'static str },

    /// Predicting on a category no model was fitted for
    #[error("no model was fitted for category `{0}`")]
    UnknownCategory(Category),

    /// Features without labels were passed to fitting
    #[error("category `{0}` has features but no labels")]
    MissingLabels(Category),

    /// Inconsistent matrix dimensions
    #[error("Dimension error: {0}")]
    Dimension(String),

    /// Learner used before fitting
    #[error("{0} used before fit")]
    NotFitted(&'static str),

    /// Feature extraction failed
    #[error("Extractor error: {0}")]
    Extractor(String),

    /// Fit thread pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Result type alias for learning operations
pub type Result<T> = std::result::Result<T, LearnError>;
