//! Learning components.
//!
//! - [`DynamicConstraintsComponent`] - per-category classifiers over a growing
//!   universe of constraint identifiers (lazy constraints and user cuts)
//! - [`MemorizingLazyComponent`] - instance features to needed lazy constraints

mod dynamic;
mod memorizing;

pub use dynamic::{
    CategoryModel, ConstraintDataset, DynamicConstraintsComponent, FeatureTable, FitState,
    LabelTable,
};
pub use memorizing::MemorizingLazyComponent;

use cutforge_config::{FitThreadCount, LearnConfig, DEFAULT_INSTANCE_FEATURES_KEY, DEFAULT_LAZY_ATTR};
use cutforge_core::{ConstraintId, Sample};

use crate::error::{LearnError, Result};

/// Solver-side hook receiving the constraints predicted ahead of a solve.
pub trait ConstraintEnforcer {
    fn enforce_constraints(&mut self, cids: &[ConstraintId]) -> Result<()>;
}

/// Collects the identifiers instead of enforcing them.
impl ConstraintEnforcer for Vec<ConstraintId> {
    fn enforce_constraints(&mut self, cids: &[ConstraintId]) -> Result<()> {
        self.extend_from_slice(cids);
        Ok(())
    }
}

/// Sample keys and fit settings of a dynamic constraints component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Key of the enforced-violation set.
    pub attr: String,
    /// Key of the instance feature vector.
    pub instance_features_key: String,
    pub fit_thread_count: FitThreadCount,
}

impl ComponentOptions {
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            instance_features_key: DEFAULT_INSTANCE_FEATURES_KEY.to_string(),
            fit_thread_count: FitThreadCount::default(),
        }
    }

    /// Options of the lazy-constraint component.
    pub fn lazy(config: &LearnConfig) -> Self {
        Self::from_config(config, config.lazy_attr())
    }

    /// Options of the user-cut component.
    pub fn user_cuts(config: &LearnConfig) -> Self {
        Self::from_config(config, config.user_cuts_attr())
    }

    fn from_config(config: &LearnConfig, attr: &str) -> Self {
        Self {
            attr: attr.to_string(),
            instance_features_key: config.instance_features_key.clone(),
            fit_thread_count: config.fit_thread_count,
        }
    }
}

impl Default for ComponentOptions {
    fn default() -> Self {
        Self::new(DEFAULT_LAZY_ATTR)
    }
}

/// Reads the numeric instance feature vector stored under `key`.
fn instance_features<S: Sample + ?Sized>(sample: &S, key: &str) -> Result<Vec<f64>> {
    sample
        .get_vector(key)?
        .and_then(|v| v.to_f64())
        .ok_or_else(|| LearnError::MissingInstanceFeatures(key.to_string()))
}

/// Reads a text scalar, rejecting scalars of any other type.
fn text_scalar<S: Sample + ?Sized>(sample: &S, key: &str) -> Result<Option<String>> {
    match sample.get_scalar(key)? {
        None => Ok(None),
        Some(p) => match p.as_str() {
            Some(text) => Ok(Some(text.to_string())),
            None => Err(LearnError::ScalarType {
                key: key.to_string(),
                expected: "string",
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutforge_config::DEFAULT_USER_CUTS_ATTR;
    use cutforge_core::{MemorySample, Primitive, Vector};

    #[test]
    fn test_options_from_config() {
        let config = LearnConfig::new()
            .with_instance_features_key("x")
            .with_fit_thread_count(FitThreadCount::None);

        let lazy = ComponentOptions::lazy(&config);
        assert_eq!(lazy.attr, DEFAULT_LAZY_ATTR);
        assert_eq!(lazy.instance_features_key, "x");
        assert_eq!(lazy.fit_thread_count, FitThreadCount::None);

        assert_eq!(ComponentOptions::user_cuts(&config).attr, DEFAULT_USER_CUTS_ATTR);
        assert_eq!(ComponentOptions::default().attr, DEFAULT_LAZY_ATTR);
    }

    #[test]
    fn test_vec_enforcer_collects() {
        let mut enforced: Vec<ConstraintId> = Vec::new();
        enforced.enforce_constraints(&["a".into()]).unwrap();
        enforced.enforce_constraints(&["b".into()]).unwrap();
        assert_eq!(enforced, vec!["a".into(), "b".into()]);
    }

    #[test]
    fn test_instance_features() {
        let mut sample = MemorySample::new();
        sample.put_vector("ints", Vector::from(vec![1i64, 2])).unwrap();
        sample.put_vector("names", Vector::from(vec!["a"])).unwrap();

        assert_eq!(instance_features(&sample, "ints").unwrap(), vec![1.0, 2.0]);
        assert!(matches!(
            instance_features(&sample, "names"),
            Err(LearnError::MissingInstanceFeatures(_))
        ));
        assert!(instance_features(&sample, "missing").is_err());
    }

    #[test]
    fn test_text_scalar() {
        let mut sample = MemorySample::new();
        sample.put_scalar("text", Primitive::from("{}")).unwrap();
        sample.put_scalar("number", Primitive::Int(3)).unwrap();

        assert_eq!(text_scalar(&sample, "text").unwrap().as_deref(), Some("{}"));
        assert_eq!(text_scalar(&sample, "missing").unwrap(), None);
        assert!(matches!(
            text_scalar(&sample, "number"),
            Err(LearnError::ScalarType { .. })
        ));
    }
}
