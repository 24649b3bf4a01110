//! cutforge - learning which lazy constraints and cuts a solve will need
//!
//! Record what each solve enforced in a [`Sample`], fit a component over the
//! corpus, then enforce its prediction ahead of the next solve.
//!
//! # Example
//!
//! ```rust
//! use cutforge::prelude::*;
//!
//! let eval = ClassifierEvaluation::new(8, 80, 2, 10);
//! assert_eq!(eval.total(), 100);
//! assert_eq!(eval.precision(), 0.8);
//! ```

// Storage
pub use cutforge_core::{
    Category, ConstraintId, ElementType, FileSample, MemorySample, Primitive, Sample,
    SampleError, Shape, Value, Vector, VectorList,
};

// Configuration
pub use cutforge_config::{
    ComponentConfig, ConfigError, FitThreadCount, LearnConfig, MemorizingConfig, ThresholdConfig,
};

// Learning components
pub use cutforge_learn::{
    codec, Classifier, ClassifierEvaluation, ComponentOptions, ConfiguredThreshold,
    ConstraintEnforcer, ConstraintFeaturesExtractor, ConstraintInstance, CountingClassifier,
    DynamicConstraintsComponent, KNearestNeighbors, LearnError, MemorizingLazyComponent,
    MinPrecisionThreshold, MinProbabilityThreshold, MultiLabelClassifier, Threshold,
    UserFeaturesExtractor, ViolationRegistry,
};

#[cfg(feature = "console")]
pub mod console;

pub mod prelude {
    pub use super::{
        Category, ConstraintId, FileSample, MemorySample, Primitive, Sample, Vector, VectorList,
    };
    pub use super::{FitThreadCount, LearnConfig, ThresholdConfig};
    pub use super::{
        Classifier, ClassifierEvaluation, ConfiguredThreshold, ConstraintEnforcer,
        ConstraintInstance, CountingClassifier, DynamicConstraintsComponent, KNearestNeighbors,
        MemorizingLazyComponent, MinPrecisionThreshold, MinProbabilityThreshold, Threshold,
        ViolationRegistry,
    };
}
