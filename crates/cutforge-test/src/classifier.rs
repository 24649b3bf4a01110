//! Deterministic classifiers for component tests.

use std::sync::{Arc, Mutex, MutexGuard};

use cutforge_learn::{Classifier, Result};

/// Training data one clone of a classifier received.
#[derive(Debug, Clone, PartialEq)]
pub struct FitRecord {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<[bool; 2]>,
}

/// Reads the positive-class probability from one feature column.
///
/// All clones share one log of the data they were fitted on, so a test can
/// inspect what a component trained each category with.
///
/// # Example
///
/// ```
/// use cutforge_learn::Classifier;
/// use cutforge_test::ColumnClassifier;
///
/// let clf = ColumnClassifier::new(1);
/// let mut clone = clf.clone();
/// clone.fit(&[vec![5.0, 0.9]], &[[false, true]]).unwrap();
///
/// assert_eq!(clone.predict_proba(&[vec![5.0, 0.9]]).unwrap()[0][1], 0.9);
/// assert_eq!(clf.fits().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnClassifier {
    column: usize,
    fits: Arc<Mutex<Vec<FitRecord>>>,
}

impl ColumnClassifier {
    pub fn new(column: usize) -> Self {
        Self {
            column,
            fits: Arc::default(),
        }
    }

    /// Every fit made by this classifier or its clones, in call order.
    pub fn fits(&self) -> Vec<FitRecord> {
        self.log().clone()
    }

    fn log(&self) -> MutexGuard<'_, Vec<FitRecord>> {
        self.fits.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Classifier for ColumnClassifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[[bool; 2]]) -> Result<()> {
        self.log().push(FitRecord {
            x: x.to_vec(),
            y: y.to_vec(),
        });
        Ok(())
    }

    fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
        Ok(x.iter()
            .map(|row| {
                let p = row.get(self.column).copied().unwrap_or(0.0);
                [1.0 - p, p]
            })
            .collect())
    }
}
