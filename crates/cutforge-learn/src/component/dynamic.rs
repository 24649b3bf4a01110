//! Component predicting which dynamic constraints a solve will need.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Instant;

use cutforge_config::{FitThreadCount, LearnConfig, DEFAULT_LAZY_ATTR, DEFAULT_USER_CUTS_ATTR};
use cutforge_core::{Category, ConstraintId, FileSample, Primitive, Sample};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::{instance_features, text_scalar, ComponentOptions, ConstraintEnforcer};
use crate::classifier::{Classifier, ConfiguredThreshold, Threshold};
use crate::codec::{self, ViolationRegistry};
use crate::error::{LearnError, Result};
use crate::evaluation::ClassifierEvaluation;
use crate::extractor::{ConstraintFeaturesExtractor, UserFeaturesExtractor};

/// Feature rows per category.
pub type FeatureTable = BTreeMap<Category, Vec<Vec<f64>>>;

/// `[not enforced, enforced]` label rows per category.
pub type LabelTable = BTreeMap<Category, Vec<[bool; 2]>>;

/// Per-category supervised data built from one sample.
///
/// Row `i` of `x[c]`, `y[c]` and `cids[c]` all describe the same
/// constraint. `y` is empty when the sample records no enforced set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintDataset {
    pub x: FeatureTable,
    pub y: LabelTable,
    pub cids: BTreeMap<Category, Vec<ConstraintId>>,
}

/// Classifier and threshold fitted for one category.
#[derive(Debug, Clone)]
pub struct CategoryModel<C, T> {
    pub classifier: C,
    pub threshold: T,
}

/// Whether [`DynamicConstraintsComponent::fit_xy`] has run.
///
/// A fit over data with no category yields `Fitted` with an empty map,
/// which is distinct from never having been fitted.
#[derive(Debug, Clone)]
pub enum FitState<C, T> {
    Unfit,
    Fitted(BTreeMap<Category, CategoryModel<C, T>>),
}

impl<C, T> Default for FitState<C, T> {
    fn default() -> Self {
        FitState::Unfit
    }
}

/// Learns, per constraint category, which known constraints end up enforced.
///
/// Fitting runs in two stages. [`pre_fit`](Self::pre_fit) merges the
/// enforced sets of all training samples into the known-violation registry,
/// then every sample is turned into per-category feature and label rows
/// over that registry and one classifier/threshold pair is fitted per
/// category. Prediction rebuilds the same rows for a new sample and keeps
/// the identifiers whose positive probability exceeds the threshold.
///
/// # Examples
///
/// ```
/// use cutforge_core::{Category, ConstraintId, MemorySample, Sample, Vector};
/// use cutforge_learn::codec::ViolationRegistry;
/// use cutforge_learn::{
///     ConstraintInstance, CountingClassifier, DynamicConstraintsComponent,
///     MinProbabilityThreshold,
/// };
///
/// struct Tour;
///
/// impl ConstraintInstance for Tour {
///     fn constraint_category(&self, _cid: &ConstraintId) -> Option<Category> {
///         Some(Category::new("subtour"))
///     }
///
///     fn constraint_features(&self, _cid: &ConstraintId) -> Option<Vec<f64>> {
///         Some(vec![1.0])
///     }
/// }
///
/// let mut component = DynamicConstraintsComponent::lazy(
///     CountingClassifier::new(),
///     MinProbabilityThreshold::new([0.5, 0.5]),
/// );
///
/// let mut sample = MemorySample::new();
/// sample.put_vector("static_instance_features", Vector::from(vec![5.0])).unwrap();
/// let mut enforced = ViolationRegistry::new();
/// enforced.insert("s1".into(), serde_json::Value::Null);
/// component.record_enforced(&mut sample, &enforced).unwrap();
///
/// component.fit(&[(&Tour, &sample)]).unwrap();
/// assert_eq!(component.sample_predict(&Tour, &sample).unwrap(), vec![ConstraintId::from("s1")]);
/// ```
#[derive(Debug, Clone)]
pub struct DynamicConstraintsComponent<C, T, E = UserFeaturesExtractor> {
    options: ComponentOptions,
    classifier_prototype: C,
    threshold_prototype: T,
    extractor: E,
    known_violations: ViolationRegistry,
    state: FitState<C, T>,
}

impl<C, T> DynamicConstraintsComponent<C, T> {
    /// Creates a component reading enforced sets from `attr`.
    pub fn new(attr: impl Into<String>, classifier: C, threshold: T) -> Self {
        Self::with_options(ComponentOptions::new(attr), classifier, threshold)
    }

    /// Component learning lazy constraints.
    pub fn lazy(classifier: C, threshold: T) -> Self {
        Self::new(DEFAULT_LAZY_ATTR, classifier, threshold)
    }

    /// Component learning user cuts.
    pub fn user_cuts(classifier: C, threshold: T) -> Self {
        Self::new(DEFAULT_USER_CUTS_ATTR, classifier, threshold)
    }

    pub fn with_options(options: ComponentOptions, classifier: C, threshold: T) -> Self {
        Self {
            options,
            classifier_prototype: classifier,
            threshold_prototype: threshold,
            extractor: UserFeaturesExtractor,
            known_violations: ViolationRegistry::new(),
            state: FitState::Unfit,
        }
    }
}

impl<C> DynamicConstraintsComponent<C, ConfiguredThreshold> {
    /// Lazy-constraint component with keys and threshold from `config`.
    pub fn lazy_from_config(config: &LearnConfig, classifier: C) -> Self {
        Self::with_options(
            ComponentOptions::lazy(config),
            classifier,
            ConfiguredThreshold::from(&config.threshold),
        )
    }

    /// User-cut component with keys and threshold from `config`.
    pub fn user_cuts_from_config(config: &LearnConfig, classifier: C) -> Self {
        Self::with_options(
            ComponentOptions::user_cuts(config),
            classifier,
            ConfiguredThreshold::from(&config.threshold),
        )
    }
}

impl<C, T, E> DynamicConstraintsComponent<C, T, E> {
    /// Replaces the feature extractor.
    pub fn with_extractor<E2>(self, extractor: E2) -> DynamicConstraintsComponent<C, T, E2> {
        DynamicConstraintsComponent {
            options: self.options,
            classifier_prototype: self.classifier_prototype,
            threshold_prototype: self.threshold_prototype,
            extractor,
            known_violations: self.known_violations,
            state: self.state,
        }
    }

    pub fn with_instance_features_key(mut self, key: impl Into<String>) -> Self {
        self.options.instance_features_key = key.into();
        self
    }

    pub fn with_fit_thread_count(mut self, count: FitThreadCount) -> Self {
        self.options.fit_thread_count = count;
        self
    }

    /// Sample key of the enforced-violation set.
    pub fn attr(&self) -> &str {
        &self.options.attr
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.options
    }

    /// Identifiers the component can reason about, with their metadata.
    pub fn known_violations(&self) -> &ViolationRegistry {
        &self.known_violations
    }

    pub fn fit_state(&self) -> &FitState<C, T> {
        &self.state
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.state, FitState::Fitted(_))
    }

    /// Categories a model was fitted for.
    pub fn categories(&self) -> Vec<&Category> {
        match &self.state {
            FitState::Unfit => Vec::new(),
            FitState::Fitted(models) => models.keys().collect(),
        }
    }

    /// Stores `enforced` in `sample` under this component's key.
    pub fn record_enforced<S: Sample + ?Sized>(
        &self,
        sample: &mut S,
        enforced: &ViolationRegistry,
    ) -> Result<()> {
        let encoded = codec::encode(enforced)?;
        sample.put_scalar(&self.options.attr, Primitive::Str(encoded))?;
        Ok(())
    }

    /// Reads the enforced set a training sample must carry.
    pub fn pre_sample_xy<I: ?Sized, S: Sample + ?Sized>(
        &self,
        _instance: &I,
        sample: &S,
    ) -> Result<ViolationRegistry> {
        self.enforced(sample)?
            .ok_or_else(|| LearnError::MissingEnforced(self.options.attr.clone()))
    }

    /// Replaces the known-violation registry with the union of `pre`.
    ///
    /// Later registries win when an identifier appears more than once.
    /// Models fitted over the previous registry are dropped.
    pub fn pre_fit(&mut self, pre: Vec<ViolationRegistry>) {
        self.state = FitState::Unfit;
        self.known_violations.clear();
        for violations in pre {
            for (cid, data) in violations {
                if let Some(previous) = self.known_violations.get(&cid) {
                    if *previous != data {
                        warn!(
                            event = "violation_metadata_conflict",
                            cid = %cid,
                            "Metadata differs between samples; keeping the latest"
                        );
                    }
                }
                self.known_violations.insert(cid, data);
            }
        }
        debug!(
            event = "pre_fit",
            known_violations = self.known_violations.len()
        );
    }

    fn enforced<S: Sample + ?Sized>(&self, sample: &S) -> Result<Option<ViolationRegistry>> {
        text_scalar(sample, &self.options.attr)?
            .map(|text| codec::decode(&text))
            .transpose()
    }

    /// Builds per-category rows over the known identifiers.
    ///
    /// Identifiers are passed to the extractor in byte order. Each row is the
    /// sample's instance features followed by the constraint features.
    /// Identifiers without a category are left out.
    pub fn sample_xy_with_cids<I, S>(&self, instance: &I, sample: &S) -> Result<ConstraintDataset>
    where
        I: ?Sized,
        S: Sample + ?Sized,
        E: ConstraintFeaturesExtractor<I>,
    {
        let mut dataset = ConstraintDataset::default();
        if self.known_violations.is_empty() {
            return Ok(dataset);
        }

        let known_cids: Vec<ConstraintId> = self.known_violations.keys().cloned().collect();
        let enforced = self.enforced(sample)?;

        let extracted = self
            .extractor
            .extract_constraint_features(instance, &known_cids)?;
        if extracted.len() != known_cids.len() || extracted.features.len() != known_cids.len() {
            return Err(LearnError::Dimension(format!(
                "extractor returned {} rows for {} constraints",
                extracted.len(),
                known_cids.len()
            )));
        }

        let prefix = instance_features(sample, &self.options.instance_features_key)?;

        for ((cid, category), features) in known_cids
            .into_iter()
            .zip(extracted.categories)
            .zip(extracted.features)
        {
            let Some(category) = category else {
                debug!(event = "skip_uncategorised", cid = %cid);
                continue;
            };

            let mut row = Vec::with_capacity(prefix.len() + features.len());
            row.extend_from_slice(&prefix);
            row.extend(features);

            let rows = dataset.x.entry(category.clone()).or_default();
            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(LearnError::Dimension(format!(
                        "category `{category}`: constraint {cid} has {} features, expected {}",
                        row.len(),
                        first.len()
                    )));
                }
            }
            rows.push(row);

            if let Some(enforced) = &enforced {
                let hit = enforced.contains_key(&cid);
                dataset.y.entry(category.clone()).or_default().push([!hit, hit]);
            }
            dataset.cids.entry(category).or_default().push(cid);
        }
        Ok(dataset)
    }

    /// Same as [`sample_xy_with_cids`](Self::sample_xy_with_cids) without the identifiers.
    pub fn sample_xy<I, S>(&self, instance: &I, sample: &S) -> Result<(FeatureTable, LabelTable)>
    where
        I: ?Sized,
        S: Sample + ?Sized,
        E: ConstraintFeaturesExtractor<I>,
    {
        let dataset = self.sample_xy_with_cids(instance, sample)?;
        Ok((dataset.x, dataset.y))
    }

    /// Identifiers predicted to be enforced for `sample`, in row order.
    ///
    /// Returns an empty list when the component was never fitted or knows
    /// no violations.
    pub fn sample_predict<I, S>(&self, instance: &I, sample: &S) -> Result<Vec<ConstraintId>>
    where
        I: ?Sized,
        S: Sample + ?Sized,
        C: Classifier,
        T: Threshold,
        E: ConstraintFeaturesExtractor<I>,
    {
        let models = match &self.state {
            FitState::Fitted(models) if !self.known_violations.is_empty() => models,
            _ => {
                info!("Classifiers not fitted. Skipping.");
                return Ok(Vec::new());
            }
        };

        let dataset = self.sample_xy_with_cids(instance, sample)?;
        let mut pred = Vec::new();
        for (category, x) in &dataset.x {
            let model = models
                .get(category)
                .ok_or_else(|| LearnError::UnknownCategory(category.clone()))?;
            let proba = model.classifier.predict_proba(x)?;
            if proba.len() != x.len() {
                return Err(LearnError::Dimension(format!(
                    "category `{category}`: classifier returned {} rows for {}",
                    proba.len(),
                    x.len()
                )));
            }
            let t = model.threshold.predict(x)?;
            let cids = &dataset.cids[category];
            for (p, cid) in proba.iter().zip(cids) {
                if p[1] > t[1] {
                    pred.push(cid.clone());
                }
            }
        }
        debug!(event = "predict", predicted = pred.len());
        Ok(pred)
    }

    /// Confusion counts of the prediction against the sample's enforced set,
    /// over every known identifier.
    pub fn sample_evaluate<I, S>(&self, instance: &I, sample: &S) -> Result<ClassifierEvaluation>
    where
        I: ?Sized,
        S: Sample + ?Sized,
        C: Classifier,
        T: Threshold,
        E: ConstraintFeaturesExtractor<I>,
    {
        let actual = self.pre_sample_xy(instance, sample)?;
        let pred: BTreeSet<ConstraintId> =
            self.sample_predict(instance, sample)?.into_iter().collect();

        let mut eval = ClassifierEvaluation::default();
        for cid in self.known_violations.keys() {
            match (pred.contains(cid), actual.contains_key(cid)) {
                (true, true) => eval.tp += 1,
                (true, false) => eval.fp += 1,
                (false, true) => eval.fn_ += 1,
                (false, false) => eval.tn += 1,
            }
        }
        Ok(eval)
    }

    /// Predicts for `sample` and hands the result to `enforcer`.
    ///
    /// Returns the number of constraints enforced.
    pub fn before_solve<I, S, F>(&self, instance: &I, sample: &S, enforcer: &mut F) -> Result<usize>
    where
        I: ?Sized,
        S: Sample + ?Sized,
        F: ConstraintEnforcer + ?Sized,
        C: Classifier,
        T: Threshold,
        E: ConstraintFeaturesExtractor<I>,
    {
        let cids = self.sample_predict(instance, sample)?;
        info!(
            event = "enforce_ahead",
            attr = %self.options.attr,
            count = cids.len(),
        );
        enforcer.enforce_constraints(&cids)?;
        Ok(cids.len())
    }
}

impl<C, T, E> DynamicConstraintsComponent<C, T, E>
where
    C: Classifier + Clone + Sync,
    T: Threshold + Clone + Sync,
{
    /// Fits one fresh classifier/threshold pair per category in `x`.
    ///
    /// Replaces any previous fit entirely; on error the component is left unfit.
    pub fn fit_xy(&mut self, x: &FeatureTable, y: &LabelTable) -> Result<()> {
        self.state = FitState::Unfit;
        let jobs = x
            .iter()
            .map(|(category, rows)| {
                let labels = y
                    .get(category)
                    .ok_or_else(|| LearnError::MissingLabels(category.clone()))?;
                Ok((category, rows.as_slice(), labels.as_slice()))
            })
            .collect::<Result<Vec<_>>>()?;

        let start = Instant::now();
        info!(
            event = "fit_start",
            attr = %self.options.attr,
            categories = jobs.len(),
            known_violations = self.known_violations.len(),
        );

        let (classifier, threshold) = (&self.classifier_prototype, &self.threshold_prototype);
        let fit_one = |&(category, x, y): &(&Category, &[Vec<f64>], &[[bool; 2]])| {
            fit_category(classifier, threshold, category, x, y)
        };

        let fitted = match self.options.fit_thread_count {
            FitThreadCount::None => jobs.iter().map(fit_one).collect::<Result<Vec<_>>>()?,
            FitThreadCount::Auto => jobs.par_iter().map(fit_one).collect::<Result<Vec<_>>>()?,
            FitThreadCount::Count(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| LearnError::ThreadPool(e.to_string()))?;
                pool.install(|| jobs.par_iter().map(fit_one).collect::<Result<Vec<_>>>())?
            }
        };

        self.state = FitState::Fitted(fitted.into_iter().collect());
        info!(
            event = "fit_end",
            attr = %self.options.attr,
            categories = self.categories().len(),
            duration_ms = start.elapsed().as_millis() as u64,
        );
        Ok(())
    }

    /// Fits from `(instance, sample)` pairs.
    ///
    /// Every sample must carry an enforced set.
    pub fn fit<I, S>(&mut self, samples: &[(&I, &S)]) -> Result<()>
    where
        I: ?Sized,
        S: Sample + ?Sized,
        E: ConstraintFeaturesExtractor<I>,
    {
        let pre = samples
            .iter()
            .map(|&(instance, sample)| self.pre_sample_xy(instance, sample))
            .collect::<Result<Vec<_>>>()?;
        self.pre_fit(pre);

        let mut x = FeatureTable::new();
        let mut y = LabelTable::new();
        for &(instance, sample) in samples {
            let (sx, sy) = self.sample_xy(instance, sample)?;
            merge_tables(&mut x, &mut y, sx, sy)?;
        }
        self.fit_xy(&x, &y)
    }

    /// Fits from `(instance, path)` pairs, opening each sample file only
    /// while it is read.
    pub fn fit_from_files<I, P>(&mut self, samples: &[(&I, P)]) -> Result<()>
    where
        I: ?Sized,
        P: AsRef<Path>,
        E: ConstraintFeaturesExtractor<I>,
    {
        let pre = samples
            .iter()
            .map(|(instance, path)| {
                FileSample::with_file(path, |sample| self.pre_sample_xy(*instance, &*sample))
            })
            .collect::<Result<Vec<_>>>()?;
        self.pre_fit(pre);

        let mut x = FeatureTable::new();
        let mut y = LabelTable::new();
        for (instance, path) in samples {
            let (sx, sy) = FileSample::with_file(path, |sample| self.sample_xy(*instance, &*sample))?;
            merge_tables(&mut x, &mut y, sx, sy)?;
        }
        self.fit_xy(&x, &y)
    }
}

fn fit_category<C, T>(
    classifier_prototype: &C,
    threshold_prototype: &T,
    category: &Category,
    x: &[Vec<f64>],
    y: &[[bool; 2]],
) -> Result<(Category, CategoryModel<C, T>)>
where
    C: Classifier + Clone,
    T: Threshold + Clone,
{
    let mut classifier = classifier_prototype.clone();
    let mut threshold = threshold_prototype.clone();
    classifier.fit(x, y)?;
    threshold.fit(&classifier, x, y)?;
    debug!(event = "fit_category", category = %category, rows = x.len());
    Ok((
        category.clone(),
        CategoryModel {
            classifier,
            threshold,
        },
    ))
}

fn merge_tables(
    x: &mut FeatureTable,
    y: &mut LabelTable,
    sx: FeatureTable,
    sy: LabelTable,
) -> Result<()> {
    for (category, rows) in sx {
        let merged = x.entry(category.clone()).or_default();
        if let (Some(first), Some(incoming)) = (merged.first(), rows.first()) {
            if first.len() != incoming.len() {
                return Err(LearnError::Dimension(format!(
                    "category `{category}`: sample rows have {} features, earlier samples {}",
                    incoming.len(),
                    first.len()
                )));
            }
        }
        merged.extend(rows);
    }
    for (category, rows) in sy {
        y.entry(category).or_default().extend(rows);
    }
    Ok(())
}
