//! cutforge Learn - predicting the lazy constraints and cuts a solve needs
//!
//! This crate provides:
//! - Pluggable classifier and threshold traits with simple built-in learners
//! - The extractor boundary to user problem instances
//! - [`DynamicConstraintsComponent`] for lazy constraints and user cuts
//! - [`MemorizingLazyComponent`] for instance-level memorization
//! - Encoding of enforced-constraint sets and confusion-matrix evaluation

pub mod classifier;
pub mod codec;
pub mod component;
pub mod error;
pub mod evaluation;
pub mod extractor;

pub use classifier::{
    Classifier, ConfiguredThreshold, CountingClassifier, KNearestNeighbors, MinPrecisionThreshold,
    MinProbabilityThreshold, MultiLabelClassifier, Threshold,
};
pub use codec::ViolationRegistry;
pub use component::{
    CategoryModel, ComponentOptions, ConstraintDataset, ConstraintEnforcer,
    DynamicConstraintsComponent, FeatureTable, FitState, LabelTable, MemorizingLazyComponent,
};
pub use error::{LearnError, Result};
pub use evaluation::ClassifierEvaluation;
pub use extractor::{
    ConstraintFeatures, ConstraintFeaturesExtractor, ConstraintInstance, UserFeaturesExtractor,
};
