//! Scripted problem instances.
//!
//! # Example
//!
//! ```
//! use cutforge_learn::ConstraintInstance;
//! use cutforge_test::ScriptedInstance;
//!
//! let instance = ScriptedInstance::new()
//!     .with_constraint("c1", "A", vec![0.9])
//!     .with_lazy_constraint("c2", "B", vec![0.1]);
//!
//! assert_eq!(instance.constraint_features(&"c1".into()), Some(vec![0.9]));
//! assert!(instance.is_constraint_lazy(&"c2".into()));
//! assert_eq!(instance.constraint_category(&"zz".into()), None);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;

use cutforge_core::{Category, ConstraintId};
use cutforge_learn::ConstraintInstance;

#[derive(Debug, Clone)]
struct ScriptedConstraint {
    category: Category,
    features: Vec<f64>,
    lazy: bool,
}

/// Instance answering from a fixed table of constraints.
///
/// Identifiers missing from the table have no category. Every identifier
/// the instance is asked about is recorded, in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInstance {
    constraints: BTreeMap<ConstraintId, ScriptedConstraint>,
    requested: RefCell<Vec<ConstraintId>>,
}

impl ScriptedInstance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint with the given category and features.
    pub fn with_constraint(
        self,
        cid: impl Into<ConstraintId>,
        category: impl Into<Category>,
        features: Vec<f64>,
    ) -> Self {
        self.insert(cid.into(), category.into(), features, false)
    }

    /// Adds a constraint flagged as lazy.
    pub fn with_lazy_constraint(
        self,
        cid: impl Into<ConstraintId>,
        category: impl Into<Category>,
        features: Vec<f64>,
    ) -> Self {
        self.insert(cid.into(), category.into(), features, true)
    }

    fn insert(mut self, cid: ConstraintId, category: Category, features: Vec<f64>, lazy: bool) -> Self {
        self.constraints.insert(
            cid,
            ScriptedConstraint {
                category,
                features,
                lazy,
            },
        );
        self
    }

    /// Identifiers asked for a category so far, in request order.
    pub fn requested(&self) -> Vec<ConstraintId> {
        self.requested.borrow().clone()
    }
}

impl ConstraintInstance for ScriptedInstance {
    fn constraint_category(&self, cid: &ConstraintId) -> Option<Category> {
        self.requested.borrow_mut().push(cid.clone());
        self.constraints.get(cid).map(|c| c.category.clone())
    }

    fn constraint_features(&self, cid: &ConstraintId) -> Option<Vec<f64>> {
        self.constraints.get(cid).map(|c| c.features.clone())
    }

    fn is_constraint_lazy(&self, cid: &ConstraintId) -> bool {
        self.constraints.get(cid).is_some_and(|c| c.lazy)
    }
}
