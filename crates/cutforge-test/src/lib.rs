//! Shared test fixtures for cutforge crates.
//!
//! - [`instance`] - scripted problem instances
//! - [`classifier`] - deterministic classifiers that record their training data
//! - [`sample`] - builders for training and test samples
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cutforge-test = { workspace = true }
//! ```
//!
//! The fixtures implement `cutforge-learn` traits, so use them from
//! integration tests (`tests/`) rather than from unit tests of that crate.

pub mod classifier;
pub mod instance;
pub mod sample;

pub use classifier::{ColumnClassifier, FitRecord};
pub use instance::ScriptedInstance;
pub use sample::{registry, training_sample, unlabeled_sample};
