//! Pluggable learners.
//!
//! The learning components only talk to learners through the traits in
//! this module. A few simple implementations ship with the crate:
//! - [`CountingClassifier`] - predicts the training label frequencies
//! - [`KNearestNeighbors`] - multi-label scores from the closest training rows
//! - [`MinProbabilityThreshold`], [`MinPrecisionThreshold`] - decision boundaries

mod threshold;

pub use threshold::{ConfiguredThreshold, MinPrecisionThreshold, MinProbabilityThreshold, Threshold};

use crate::error::{LearnError, Result};

/// Binary classifier over dense feature rows.
///
/// Labels and probabilities are `[negative, positive]` pairs.
/// Prototypes are cloned once per category; each clone is fitted and then
/// only queried.
pub trait Classifier: Send {
    /// Trains the classifier on `x` with one label pair per row.
    fn fit(&mut self, x: &[Vec<f64>], y: &[[bool; 2]]) -> Result<()>;

    /// Returns `[P(negative), P(positive)]` for every row of `x`.
    fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<[f64; 2]>>;
}

/// Classifier predicting several independent binary targets at once.
pub trait MultiLabelClassifier: Send {
    /// Trains on `x` with one label row (one entry per target) per sample.
    fn fit(&mut self, x: &[Vec<f64>], y: &[Vec<bool>]) -> Result<()>;

    /// Returns one score per target for every row of `x`.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}

/// Checks that `x` is a non-empty matrix with one label per row and
/// returns its width.
pub fn check_training_data<L>(x: &[Vec<f64>], y: &[L]) -> Result<usize> {
    if x.len() != y.len() {
        return Err(LearnError::Dimension(format!(
            "{} feature rows but {} label rows",
            x.len(),
            y.len()
        )));
    }
    let width = x
        .first()
        .map(Vec::len)
        .ok_or_else(|| LearnError::Dimension("training set is empty".to_string()))?;
    check_width(x, width)?;
    Ok(width)
}

/// Checks that every row of `x` has `width` columns.
pub fn check_width(x: &[Vec<f64>], width: usize) -> Result<()> {
    match x.iter().position(|row| row.len() != width) {
        Some(i) => Err(LearnError::Dimension(format!(
            "row {i} has {} features, expected {width}",
            x[i].len()
        ))),
        None => Ok(()),
    }
}

/// Predicts, for every row, the label frequencies seen during training.
///
/// # Examples
///
/// ```
/// use cutforge_learn::{Classifier, CountingClassifier};
///
/// let mut clf = CountingClassifier::new();
/// let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
/// let y = vec![[true, false], [false, true], [false, true], [false, true]];
/// clf.fit(&x, &y).unwrap();
/// assert_eq!(clf.predict_proba(&[vec![9.0]]).unwrap(), vec![[0.25, 0.75]]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountingClassifier {
    mean: Option<[f64; 2]>,
    n_features: usize,
}

impl CountingClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for CountingClassifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[[bool; 2]]) -> Result<()> {
        self.n_features = check_training_data(x, y)?;
        let n = y.len() as f64;
        let mut sum = [0.0; 2];
        for row in y {
            for (s, &label) in sum.iter_mut().zip(row) {
                if label {
                    *s += 1.0;
                }
            }
        }
        self.mean = Some([sum[0] / n, sum[1] / n]);
        Ok(())
    }

    fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
        let mean = self.mean.ok_or(LearnError::NotFitted("CountingClassifier"))?;
        check_width(x, self.n_features)?;
        Ok(vec![mean; x.len()])
    }
}

/// Multi-label k-nearest-neighbors: the score of a target is the fraction
/// of the `k` closest training rows (Euclidean distance) that have it.
#[derive(Debug, Clone, PartialEq)]
pub struct KNearestNeighbors {
    k: usize,
    x: Vec<Vec<f64>>,
    y: Vec<Vec<bool>>,
}

impl KNearestNeighbors {
    /// Creates a classifier using `k` neighbors (at least one).
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            x: Vec::new(),
            y: Vec::new(),
        }
    }
}

impl Default for KNearestNeighbors {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MultiLabelClassifier for KNearestNeighbors {
    fn fit(&mut self, x: &[Vec<f64>], y: &[Vec<bool>]) -> Result<()> {
        check_training_data(x, y)?;
        let targets = y[0].len();
        if let Some(i) = y.iter().position(|row| row.len() != targets) {
            return Err(LearnError::Dimension(format!(
                "label row {i} has {} targets, expected {targets}",
                y[i].len()
            )));
        }
        self.x = x.to_vec();
        self.y = y.to_vec();
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let width = self
            .x
            .first()
            .map(Vec::len)
            .ok_or(LearnError::NotFitted("KNearestNeighbors"))?;
        check_width(x, width)?;
        let k = self.k.min(self.x.len());
        let targets = self.y[0].len();

        Ok(x.iter()
            .map(|row| {
                let mut by_distance: Vec<(f64, usize)> = self
                    .x
                    .iter()
                    .enumerate()
                    .map(|(i, train)| (squared_distance(row, train), i))
                    .collect();
                by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

                let mut scores = vec![0.0; targets];
                for &(_, i) in &by_distance[..k] {
                    for (s, &label) in scores.iter_mut().zip(&self.y[i]) {
                        if label {
                            *s += 1.0;
                        }
                    }
                }
                scores.iter_mut().for_each(|s| *s /= k as f64);
                scores
            })
            .collect())
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests;
