//! Decision boundaries over classifier probabilities.

use cutforge_config::ThresholdConfig;

use super::{check_training_data, Classifier};
use crate::error::{LearnError, Result};

/// Converts a classifier's probabilities into a `[low, high]` boundary pair.
///
/// A row is predicted positive when its positive-class probability is
/// strictly greater than the second entry.
pub trait Threshold: Send {
    /// Fits the boundary against an already fitted classifier.
    fn fit(&mut self, clf: &dyn Classifier, x: &[Vec<f64>], y: &[[bool; 2]]) -> Result<()>;

    /// Returns the boundary for the rows in `x`.
    fn predict(&self, x: &[Vec<f64>]) -> Result<[f64; 2]>;
}

/// Fixed boundary, independent of the training data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinProbabilityThreshold {
    min_probability: [f64; 2],
}

impl MinProbabilityThreshold {
    pub fn new(min_probability: [f64; 2]) -> Self {
        Self { min_probability }
    }
}

impl Default for MinProbabilityThreshold {
    fn default() -> Self {
        Self::new([0.5, 0.5])
    }
}

impl Threshold for MinProbabilityThreshold {
    fn fit(&mut self, _clf: &dyn Classifier, _x: &[Vec<f64>], _y: &[[bool; 2]]) -> Result<()> {
        Ok(())
    }

    fn predict(&self, _x: &[Vec<f64>]) -> Result<[f64; 2]> {
        Ok(self.min_probability)
    }
}

/// Per class, the lowest score threshold whose training precision reaches
/// the requested minimum.
///
/// A class whose target precision is never reached gets `+inf`, so nothing
/// is predicted for it.
///
/// # Examples
///
/// ```
/// use cutforge_learn::{Classifier, CountingClassifier, MinPrecisionThreshold, Threshold};
///
/// let x = vec![vec![0.0], vec![1.0]];
/// let y = vec![[false, true], [false, true]];
/// let mut clf = CountingClassifier::new();
/// clf.fit(&x, &y).unwrap();
///
/// let mut threshold = MinPrecisionThreshold::new([1.0, 1.0]);
/// threshold.fit(&clf, &x, &y).unwrap();
/// assert_eq!(threshold.predict(&x).unwrap(), [f64::INFINITY, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MinPrecisionThreshold {
    min_precision: [f64; 2],
    computed: Option<[f64; 2]>,
}

impl MinPrecisionThreshold {
    pub fn new(min_precision: [f64; 2]) -> Self {
        Self {
            min_precision,
            computed: None,
        }
    }
}

impl Threshold for MinPrecisionThreshold {
    fn fit(&mut self, clf: &dyn Classifier, x: &[Vec<f64>], y: &[[bool; 2]]) -> Result<()> {
        check_training_data(x, y)?;
        let proba = clf.predict_proba(x)?;
        if proba.len() != y.len() {
            return Err(LearnError::Dimension(format!(
                "classifier returned {} rows for {} inputs",
                proba.len(),
                y.len()
            )));
        }

        let mut computed = [f64::INFINITY; 2];
        for (class, slot) in computed.iter_mut().enumerate() {
            let scored: Vec<(f64, bool)> = proba
                .iter()
                .zip(y)
                .map(|(p, labels)| (p[class], labels[class]))
                .collect();
            *slot = lowest_threshold_with_precision(scored, self.min_precision[class]);
        }
        self.computed = Some(computed);
        Ok(())
    }

    fn predict(&self, _x: &[Vec<f64>]) -> Result<[f64; 2]> {
        self.computed.ok_or(LearnError::NotFitted("MinPrecisionThreshold"))
    }
}

/// Walks the binary classification curve from the lowest distinct score
/// upwards and returns the first score whose precision is high enough.
fn lowest_threshold_with_precision(mut scored: Vec<(f64, bool)>, min_precision: f64) -> f64 {
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    // (threshold, tp, fp) at each distinct score, highest score first.
    let mut curve: Vec<(f64, usize, usize)> = Vec::new();
    let (mut tp, mut fp) = (0, 0);
    for (i, &(score, label)) in scored.iter().enumerate() {
        if label {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = scored.get(i + 1).map_or(true, |next| next.0 != score);
        if last_of_score {
            curve.push((score, tp, fp));
        }
    }

    curve
        .iter()
        .rev()
        .find(|&&(_, tp, fp)| tp as f64 / (tp + fp) as f64 >= min_precision)
        .map_or(f64::INFINITY, |&(threshold, _, _)| threshold)
}

/// Threshold chosen at run time from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfiguredThreshold {
    MinProbability(MinProbabilityThreshold),
    MinPrecision(MinPrecisionThreshold),
}

impl Default for ConfiguredThreshold {
    fn default() -> Self {
        ConfiguredThreshold::MinProbability(MinProbabilityThreshold::default())
    }
}

impl From<&ThresholdConfig> for ConfiguredThreshold {
    fn from(config: &ThresholdConfig) -> Self {
        match config {
            ThresholdConfig::MinProbability { min_probability } => {
                ConfiguredThreshold::MinProbability(MinProbabilityThreshold::new(*min_probability))
            }
            ThresholdConfig::MinPrecision { min_precision } => {
                ConfiguredThreshold::MinPrecision(MinPrecisionThreshold::new(*min_precision))
            }
        }
    }
}

impl Threshold for ConfiguredThreshold {
    fn fit(&mut self, clf: &dyn Classifier, x: &[Vec<f64>], y: &[[bool; 2]]) -> Result<()> {
        match self {
            ConfiguredThreshold::MinProbability(t) => t.fit(clf, x, y),
            ConfiguredThreshold::MinPrecision(t) => t.fit(clf, x, y),
        }
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<[f64; 2]> {
        match self {
            ConfiguredThreshold::MinProbability(t) => t.predict(x),
            ConfiguredThreshold::MinPrecision(t) => t.predict(x),
        }
    }
}
