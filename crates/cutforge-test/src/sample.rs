//! Sample builders.
//!
//! # Example
//!
//! ```
//! use cutforge_core::Sample;
//! use cutforge_test::training_sample;
//!
//! let sample = training_sample(vec![1.0, 2.0], &["c1", "c3"]);
//! assert!(sample.contains("static_instance_features"));
//! assert!(sample.contains("mip_constr_lazy_enforced"));
//! ```

use cutforge_config::{DEFAULT_INSTANCE_FEATURES_KEY, DEFAULT_LAZY_ATTR};
use cutforge_core::{MemorySample, Primitive, Sample, Vector};
use cutforge_learn::{codec, ViolationRegistry};
use serde_json::Value;

/// Registry of `ids` with null metadata.
pub fn registry(ids: &[&str]) -> ViolationRegistry {
    ids.iter().map(|&id| (id.into(), Value::Null)).collect()
}

/// Sample holding instance features but no enforced set.
pub fn unlabeled_sample(instance_features: Vec<f64>) -> MemorySample {
    let mut sample = MemorySample::new();
    sample
        .put_vector(DEFAULT_INSTANCE_FEATURES_KEY, Vector::from(instance_features))
        .expect("memory samples accept any vector");
    sample
}

/// Sample holding instance features and the lazy constraints enforced
/// during its solve.
pub fn training_sample(instance_features: Vec<f64>, enforced: &[&str]) -> MemorySample {
    let mut sample = unlabeled_sample(instance_features);
    let encoded = codec::encode(&registry(enforced)).expect("text identifiers encode");
    sample
        .put_scalar(DEFAULT_LAZY_ATTR, Primitive::Str(encoded))
        .expect("memory samples accept any scalar");
    sample
}
