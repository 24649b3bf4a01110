//! Boundary between the learning components and problem instances.

use cutforge_core::{Category, ConstraintId};

use crate::error::{LearnError, Result};

/// User-supplied knowledge about the constraints of one problem instance.
///
/// Implemented by the solver driver. Constraints without a category are
/// ignored by the learning components.
pub trait ConstraintInstance {
    /// Family the constraint belongs to, or `None` to leave it out.
    fn constraint_category(&self, cid: &ConstraintId) -> Option<Category>;

    /// Numeric features of a categorised constraint.
    fn constraint_features(&self, cid: &ConstraintId) -> Option<Vec<f64>>;

    fn is_constraint_lazy(&self, _cid: &ConstraintId) -> bool {
        false
    }
}

/// Per-identifier rows returned by an extractor, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintFeatures {
    /// Feature row per identifier; empty for uncategorised identifiers.
    pub features: Vec<Vec<f64>>,
    pub categories: Vec<Option<Category>>,
    pub lazy: Vec<bool>,
}

impl ConstraintFeatures {
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Produces constraint feature rows for an explicit list of identifiers.
pub trait ConstraintFeaturesExtractor<I: ?Sized> {
    /// Returns exactly one row per entry of `cids`, in the same order.
    fn extract_constraint_features(
        &self,
        instance: &I,
        cids: &[ConstraintId],
    ) -> Result<ConstraintFeatures>;
}

/// Extractor reading categories and features straight from a
/// [`ConstraintInstance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFeaturesExtractor;

impl<I: ConstraintInstance + ?Sized> ConstraintFeaturesExtractor<I> for UserFeaturesExtractor {
    fn extract_constraint_features(
        &self,
        instance: &I,
        cids: &[ConstraintId],
    ) -> Result<ConstraintFeatures> {
        let mut out = ConstraintFeatures {
            features: Vec::with_capacity(cids.len()),
            categories: Vec::with_capacity(cids.len()),
            lazy: Vec::with_capacity(cids.len()),
        };

        for cid in cids {
            let category = instance.constraint_category(cid);
            let features = match &category {
                Some(category) => instance.constraint_features(cid).ok_or_else(|| {
                    LearnError::Extractor(format!(
                        "constraint {cid} in category `{category}` has no features"
                    ))
                })?,
                None => Vec::new(),
            };
            out.lazy.push(category.is_some() && instance.is_constraint_lazy(cid));
            out.features.push(features);
            out.categories.push(category);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Knapsack;

    impl ConstraintInstance for Knapsack {
        fn constraint_category(&self, cid: &ConstraintId) -> Option<Category> {
            match cid.as_text()? {
                "skip" => None,
                name => Some(Category::new(&name[..1])),
            }
        }

        fn constraint_features(&self, cid: &ConstraintId) -> Option<Vec<f64>> {
            match cid.as_text()? {
                "b-bad" => None,
                name => Some(vec![name.len() as f64]),
            }
        }

        fn is_constraint_lazy(&self, cid: &ConstraintId) -> bool {
            cid.as_text().is_some_and(|name| name.starts_with('a'))
        }
    }

    #[test]
    fn test_rows_follow_request_order() {
        let cids: Vec<ConstraintId> = vec!["b1".into(), "skip".into(), "a22".into()];
        let out = UserFeaturesExtractor
            .extract_constraint_features(&Knapsack, &cids)
            .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.features, vec![vec![2.0], vec![], vec![3.0]]);
        assert_eq!(
            out.categories,
            vec![Some(Category::new("b")), None, Some(Category::new("a"))]
        );
        assert_eq!(out.lazy, vec![false, false, true]);
    }

    #[test]
    fn test_categorised_row_needs_features() {
        let cids: Vec<ConstraintId> = vec!["b-bad".into()];
        let result = UserFeaturesExtractor.extract_constraint_features(&Knapsack, &cids);
        assert!(matches!(result, Err(LearnError::Extractor(_))));
    }

    #[test]
    fn test_empty_request() {
        let out = UserFeaturesExtractor
            .extract_constraint_features(&Knapsack, &[])
            .unwrap();
        assert!(out.is_empty());
    }
}
