//! Component memorizing which lazy constraints similar instances needed.

use std::collections::HashMap;
use std::path::Path;

use cutforge_config::{LearnConfig, DEFAULT_INSTANCE_FEATURES_KEY, DEFAULT_MEMORIZING_ATTR};
use cutforge_core::{ConstraintId, FileSample, Primitive, Sample};
use tracing::info;

use super::{instance_features, text_scalar, ConstraintEnforcer};
use crate::classifier::MultiLabelClassifier;
use crate::codec;
use crate::error::{LearnError, Result};

/// Maps instance features straight to the set of lazy constraints needed.
///
/// Every constraint seen in training becomes one target of a multi-label
/// classifier, numbered in first-seen order.
#[derive(Debug, Clone)]
pub struct MemorizingLazyComponent<M> {
    classifier: M,
    attr: String,
    instance_features_key: String,
    probability_cutoff: f64,
    targets: Vec<ConstraintId>,
    n_features: Option<usize>,
}

impl<M: MultiLabelClassifier> MemorizingLazyComponent<M> {
    pub fn new(classifier: M) -> Self {
        Self {
            classifier,
            attr: DEFAULT_MEMORIZING_ATTR.to_string(),
            instance_features_key: DEFAULT_INSTANCE_FEATURES_KEY.to_string(),
            probability_cutoff: 0.5,
            targets: Vec::new(),
            n_features: None,
        }
    }

    pub fn from_config(config: &LearnConfig, classifier: M) -> Self {
        Self {
            attr: config.memorizing.attr.clone(),
            instance_features_key: config.instance_features_key.clone(),
            probability_cutoff: config.memorizing.probability_cutoff,
            ..Self::new(classifier)
        }
    }

    pub fn with_probability_cutoff(mut self, cutoff: f64) -> Self {
        self.probability_cutoff = cutoff;
        self
    }

    /// Sample key of the list of needed constraints.
    pub fn attr(&self) -> &str {
        &self.attr
    }

    /// Constraints known to the classifier, in target order.
    pub fn targets(&self) -> &[ConstraintId] {
        &self.targets
    }

    pub fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }

    /// Stores the constraints a solve needed under this component's key.
    pub fn record_needed<S: Sample + ?Sized>(&self, sample: &mut S, cids: &[ConstraintId]) -> Result<()> {
        let encoded = codec::encode_list(cids)?;
        sample.put_scalar(&self.attr, Primitive::Str(encoded))?;
        Ok(())
    }

    /// Trains on samples carrying both instance features and needed constraints.
    pub fn fit<S: Sample + ?Sized>(&mut self, samples: &[&S]) -> Result<()> {
        info!("Reading training data...");
        let rows = samples
            .iter()
            .map(|sample| self.read_training_row(*sample))
            .collect::<Result<Vec<_>>>()?;
        self.fit_rows(rows)
    }

    /// Same as [`fit`](Self::fit), opening each sample file only while it is read.
    pub fn fit_from_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        info!("Reading training data...");
        let rows = paths
            .iter()
            .map(|path| FileSample::with_file(path, |sample| self.read_training_row(&*sample)))
            .collect::<Result<Vec<_>>>()?;
        self.fit_rows(rows)
    }

    fn read_training_row<S: Sample + ?Sized>(
        &self,
        sample: &S,
    ) -> Result<(Vec<f64>, Vec<ConstraintId>)> {
        let encoded = text_scalar(sample, &self.attr)?
            .ok_or_else(|| LearnError::MissingEnforced(self.attr.clone()))?;
        let cids = codec::decode_list(&encoded)?;
        let x = instance_features(sample, &self.instance_features_key)?;
        Ok((x, cids))
    }

    fn fit_rows(&mut self, rows: Vec<(Vec<f64>, Vec<ConstraintId>)>) -> Result<()> {
        let n_features = rows
            .first()
            .map(|(x, _)| x.len())
            .ok_or_else(|| LearnError::Dimension("no training samples".to_string()))?;

        let mut targets: Vec<ConstraintId> = Vec::new();
        let mut index: HashMap<ConstraintId, usize> = HashMap::new();
        let mut x = Vec::with_capacity(rows.len());
        let mut needed = Vec::with_capacity(rows.len());
        for (i, (features, cids)) in rows.into_iter().enumerate() {
            if features.len() != n_features {
                return Err(LearnError::Dimension(format!(
                    "sample {i} has {} instance features, expected {n_features}",
                    features.len()
                )));
            }
            let ids: Vec<usize> = cids
                .into_iter()
                .map(|cid| {
                    *index.entry(cid.clone()).or_insert_with(|| {
                        targets.push(cid);
                        targets.len() - 1
                    })
                })
                .collect();
            x.push(features);
            needed.push(ids);
        }

        let y: Vec<Vec<bool>> = needed
            .iter()
            .map(|ids| {
                let mut row = vec![false; targets.len()];
                for &i in ids {
                    row[i] = true;
                }
                row
            })
            .collect();

        info!(
            event = "memorizing_fit",
            samples = x.len(),
            features = n_features,
            targets = targets.len(),
        );
        self.classifier.fit(&x, &y)?;
        self.targets = targets;
        self.n_features = Some(n_features);
        Ok(())
    }

    /// Constraints whose score exceeds the cutoff for `sample`.
    pub fn predict<S: Sample + ?Sized>(&self, sample: &S) -> Result<Vec<ConstraintId>> {
        let n_features = self
            .n_features
            .ok_or(LearnError::NotFitted("MemorizingLazyComponent"))?;
        let x = instance_features(sample, &self.instance_features_key)?;
        if x.len() != n_features {
            return Err(LearnError::Dimension(format!(
                "sample has {} instance features, expected {n_features}",
                x.len()
            )));
        }

        info!("Predicting violated lazy constraints...");
        let scores = self.classifier.predict(&[x])?;
        let scores = match scores.as_slice() {
            [row] if row.len() == self.targets.len() => row,
            _ => {
                return Err(LearnError::Dimension(format!(
                    "classifier output does not match {} targets",
                    self.targets.len()
                )))
            }
        };

        Ok(self
            .targets
            .iter()
            .zip(scores)
            .filter(|&(_, &score)| score > self.probability_cutoff)
            .map(|(cid, _)| cid.clone())
            .collect())
    }

    /// Predicts for `sample` and enforces the result ahead of the solve.
    pub fn before_solve<S, F>(&self, sample: &S, enforcer: &mut F) -> Result<usize>
    where
        S: Sample + ?Sized,
        F: ConstraintEnforcer + ?Sized,
    {
        let cids = self.predict(sample)?;
        info!(
            event = "enforce_ahead",
            attr = %self.attr,
            count = cids.len(),
        );
        enforcer.enforce_constraints(&cids)?;
        Ok(cids.len())
    }
}
