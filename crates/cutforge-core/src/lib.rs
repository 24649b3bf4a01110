//! cutforge Core - typed training-sample storage
//!
//! This crate provides the storage layer the learning components are built on:
//! - Constraint identifiers and categories
//! - A closed value model (scalars, vectors, ragged vector-lists)
//! - The [`Sample`] trait with an in-memory and an on-disk implementation

pub mod error;
pub mod id;
pub mod sample;
pub mod value;

pub use error::{Result, SampleError};
pub use id::{Category, ConstraintId};
pub use sample::{FileSample, MemorySample, Sample};
pub use value::{ElementType, Primitive, Shape, Value, Vector, VectorList};
