//! Tests for the built-in learners.

use super::*;
use crate::error::LearnError;

/// Reports the first feature as the positive-class probability.
struct FirstColumn;

impl Classifier for FirstColumn {
    fn fit(&mut self, _x: &[Vec<f64>], _y: &[[bool; 2]]) -> crate::Result<()> {
        Ok(())
    }

    fn predict_proba(&self, x: &[Vec<f64>]) -> crate::Result<Vec<[f64; 2]>> {
        Ok(x.iter().map(|row| [1.0 - row[0], row[0]]).collect())
    }
}

fn labels(positive: &[bool]) -> Vec<[bool; 2]> {
    positive.iter().map(|&p| [!p, p]).collect()
}

#[test]
fn test_counting_classifier_mean() {
    let mut clf = CountingClassifier::new();
    let x = vec![vec![1.0, 2.0]; 4];
    let y = labels(&[true, false, false, false]);
    clf.fit(&x, &y).unwrap();

    let proba = clf.predict_proba(&[vec![0.0, 0.0], vec![5.0, 5.0]]).unwrap();
    assert_eq!(proba, vec![[0.75, 0.25], [0.75, 0.25]]);
}

#[test]
fn test_counting_classifier_requires_fit() {
    let clf = CountingClassifier::new();
    assert!(matches!(
        clf.predict_proba(&[vec![0.0]]),
        Err(LearnError::NotFitted(_))
    ));
}

#[test]
fn test_counting_classifier_checks_width() {
    let mut clf = CountingClassifier::new();
    clf.fit(&[vec![1.0, 2.0]], &labels(&[true])).unwrap();
    assert!(matches!(
        clf.predict_proba(&[vec![1.0]]),
        Err(LearnError::Dimension(_))
    ));
}

#[test]
fn test_check_training_data() {
    assert_eq!(check_training_data(&[vec![0.0; 3]], &[0]).unwrap(), 3);
    assert!(check_training_data::<u8>(&[], &[]).is_err());
    assert!(check_training_data(&[vec![0.0]], &[0, 1]).is_err());
    assert!(check_training_data(&[vec![0.0], vec![0.0, 1.0]], &[0, 1]).is_err());
}

#[test]
fn test_min_probability_threshold() {
    let mut threshold = MinProbabilityThreshold::new([0.3, 0.7]);
    threshold.fit(&FirstColumn, &[vec![0.1]], &labels(&[true])).unwrap();
    assert_eq!(threshold.predict(&[vec![0.9]]).unwrap(), [0.3, 0.7]);
}

#[test]
fn test_min_precision_threshold() {
    let x = vec![vec![0.9], vec![0.8], vec![0.7], vec![0.3]];
    let y = labels(&[true, false, true, false]);

    let mut threshold = MinPrecisionThreshold::new([0.0, 0.6]);
    threshold.fit(&FirstColumn, &x, &y).unwrap();
    assert_eq!(threshold.predict(&x).unwrap()[1], 0.7);

    let mut strict = MinPrecisionThreshold::new([0.0, 0.9]);
    strict.fit(&FirstColumn, &x, &y).unwrap();
    assert_eq!(strict.predict(&x).unwrap()[1], 0.9);
}

#[test]
fn test_min_precision_groups_tied_scores() {
    let x = vec![vec![0.5], vec![0.5]];
    let y = labels(&[true, false]);

    let mut threshold = MinPrecisionThreshold::new([0.0, 0.5]);
    threshold.fit(&FirstColumn, &x, &y).unwrap();
    assert_eq!(threshold.predict(&x).unwrap()[1], 0.5);

    let mut unreachable = MinPrecisionThreshold::new([0.0, 0.75]);
    unreachable.fit(&FirstColumn, &x, &y).unwrap();
    assert_eq!(unreachable.predict(&x).unwrap()[1], f64::INFINITY);
}

#[test]
fn test_min_precision_requires_fit() {
    let threshold = MinPrecisionThreshold::new([0.5, 0.5]);
    assert!(threshold.predict(&[vec![0.0]]).is_err());
}

#[test]
fn test_configured_threshold_from_config() {
    let config = cutforge_config::ThresholdConfig::MinPrecision {
        min_precision: [0.0, 1.0],
    };
    let mut threshold = ConfiguredThreshold::from(&config);
    assert!(matches!(threshold, ConfiguredThreshold::MinPrecision(_)));

    let x = vec![vec![0.2], vec![0.6]];
    threshold.fit(&FirstColumn, &x, &labels(&[false, true])).unwrap();
    assert_eq!(threshold.predict(&x).unwrap()[1], 0.6);

    assert_eq!(
        ConfiguredThreshold::default().predict(&x).unwrap(),
        [0.5, 0.5]
    );
}

#[test]
fn test_knn_scores() {
    let mut knn = KNearestNeighbors::new(2);
    let x = vec![vec![0.0], vec![1.0], vec![10.0]];
    let y = vec![
        vec![true, false],
        vec![true, true],
        vec![false, true],
    ];
    knn.fit(&x, &y).unwrap();

    let scores = knn.predict(&[vec![0.2], vec![9.0]]).unwrap();
    assert_eq!(scores, vec![vec![1.0, 0.5], vec![0.5, 1.0]]);
}

#[test]
fn test_knn_clamps_k() {
    let mut knn = KNearestNeighbors::new(10);
    knn.fit(&[vec![0.0], vec![1.0]], &[vec![true], vec![false]])
        .unwrap();
    assert_eq!(knn.predict(&[vec![0.0]]).unwrap(), vec![vec![0.5]]);
}

#[test]
fn test_knn_rejects_ragged_labels() {
    let mut knn = KNearestNeighbors::default();
    let result = knn.fit(&[vec![0.0], vec![1.0]], &[vec![true], vec![true, false]]);
    assert!(matches!(result, Err(LearnError::Dimension(_))));
}
