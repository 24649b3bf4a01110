//! Key-value storage of training data.
//!
//! A [`Sample`] maps string keys to [`Value`]s. Two implementations share
//! the same external behavior:
//! - [`MemorySample`] keeps values in a process-local map
//! - [`FileSample`] backs onto a self-describing binary container file
//!
//! # Examples
//!
//! ```
//! use cutforge_core::{MemorySample, Primitive, Sample, Vector, VectorList};
//!
//! let mut sample = MemorySample::new();
//! sample.put_scalar("objective", Primitive::Float(42.0)).unwrap();
//! sample.put_vector("static_instance_features", Vector::from(vec![1.0, 2.0])).unwrap();
//! sample
//!     .put_vector_list("lhs", VectorList::Int(vec![Some(vec![1, 2]), None]))
//!     .unwrap();
//!
//! assert_eq!(sample.get_scalar("objective").unwrap(), Some(Primitive::Float(42.0)));
//! assert_eq!(sample.get_scalar("missing").unwrap(), None);
//! // Wrong accessor for the stored shape is an error, never a coercion
//! assert!(sample.get_vector("objective").is_err());
//! ```

mod container;
mod file;
mod memory;

pub use file::FileSample;
pub use memory::MemorySample;

use crate::error::{Result, SampleError};
use crate::value::{Primitive, Shape, Value, Vector, VectorList};

/// Dictionary-like store of training data for one problem instance.
///
/// `put_*` silently replaces any previous value under the same key.
/// `get_*` returns `Ok(None)` for missing keys and
/// [`SampleError::ShapeMismatch`] when the key holds a different shape.
pub trait Sample {
    /// Returns the value stored under `key`, whatever its shape.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: Value) -> Result<()>;

    /// Returns the keys currently present, in ascending order.
    fn keys(&self) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.keys().iter().any(|k| k == key)
    }

    fn get_scalar(&self, key: &str) -> Result<Option<Primitive>> {
        match self.get(key)? {
            None => Ok(None),
            Some(Value::Scalar(p)) => Ok(Some(p)),
            Some(other) => Err(shape_mismatch(key, Shape::Scalar, &other)),
        }
    }

    fn put_scalar(&mut self, key: &str, value: Primitive) -> Result<()> {
        self.put(key, Value::Scalar(value))
    }

    fn get_vector(&self, key: &str) -> Result<Option<Vector>> {
        match self.get(key)? {
            None => Ok(None),
            Some(Value::Vector(v)) => Ok(Some(v)),
            Some(other) => Err(shape_mismatch(key, Shape::Vector, &other)),
        }
    }

    fn put_vector(&mut self, key: &str, value: Vector) -> Result<()> {
        self.put(key, Value::Vector(value))
    }

    fn get_vector_list(&self, key: &str) -> Result<Option<VectorList>> {
        match self.get(key)? {
            None => Ok(None),
            Some(Value::VectorList(v)) => Ok(Some(v)),
            Some(other) => Err(shape_mismatch(key, Shape::VectorList, &other)),
        }
    }

    fn put_vector_list(&mut self, key: &str, value: VectorList) -> Result<()> {
        self.put(key, Value::VectorList(value))
    }
}

fn shape_mismatch(key: &str, expected: Shape, found: &Value) -> SampleError {
    SampleError::ShapeMismatch {
        key: key.to_string(),
        expected,
        found: found.shape(),
    }
}
