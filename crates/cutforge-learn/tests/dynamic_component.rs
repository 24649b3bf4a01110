//! End-to-end tests of the dynamic constraints component.

use std::collections::BTreeSet;

use cutforge_config::{FitThreadCount, LearnConfig, ThresholdConfig};
use cutforge_core::{Category, ConstraintId, FileSample, MemorySample, Sample, Vector};
use cutforge_learn::{
    ClassifierEvaluation, ConstraintFeatures, ConstraintFeaturesExtractor, CountingClassifier,
    DynamicConstraintsComponent, FitState, LearnError, MinProbabilityThreshold,
};
use cutforge_test::{registry, training_sample, unlabeled_sample, ColumnClassifier, ScriptedInstance};
use serde_json::json;

type Component = DynamicConstraintsComponent<ColumnClassifier, MinProbabilityThreshold>;

fn component(clf: &ColumnClassifier) -> Component {
    DynamicConstraintsComponent::lazy(clf.clone(), MinProbabilityThreshold::new([0.5, 0.5]))
        .with_fit_thread_count(FitThreadCount::None)
}

fn ids(names: &[&str]) -> Vec<ConstraintId> {
    names.iter().map(|&n| n.into()).collect()
}

#[test]
fn test_labels_mark_enforced_rows() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.0])
        .with_constraint("c2", "A", vec![0.0])
        .with_constraint("c3", "A", vec![0.0]);
    let clf = ColumnClassifier::new(1);
    let mut component = component(&clf);

    let enforcing_c2 = training_sample(vec![7.0], &["c2"]);
    let enforcing_c1_c3 = training_sample(vec![7.0], &["c1", "c3"]);
    component.pre_fit(vec![registry(&["c2"]), registry(&["c1", "c3"])]);
    let dataset = component
        .sample_xy_with_cids(&instance, &enforcing_c1_c3)
        .unwrap();

    let a = Category::new("A");
    assert_eq!(dataset.cids[&a], ids(&["c1", "c2", "c3"]));
    assert_eq!(
        dataset.y[&a],
        vec![[false, true], [true, false], [false, true]]
    );
    assert_eq!(dataset.x[&a], vec![vec![7.0, 0.0]; 3]);

    component
        .fit(&[(&instance, &enforcing_c2), (&instance, &enforcing_c1_c3)])
        .unwrap();
    let fits = clf.fits();
    assert_eq!(fits.len(), 1);
    assert_eq!(
        fits[0].y,
        vec![
            [true, false],
            [false, true],
            [true, false],
            [false, true],
            [true, false],
            [false, true],
        ]
    );
}

#[test]
fn test_identifiers_extracted_in_byte_order() {
    let instance = ScriptedInstance::new();
    let mut component = component(&ColumnClassifier::new(1));
    component.pre_fit(vec![registry(&["c2", "c10"]), registry(&["c1", "B"])]);

    component
        .sample_xy_with_cids(&instance, &unlabeled_sample(vec![1.0]))
        .unwrap();
    assert_eq!(instance.requested(), ids(&["B", "c1", "c10", "c2"]));
}

#[test]
fn test_sample_without_enforced_set_has_no_labels() {
    let instance = ScriptedInstance::new().with_constraint("c1", "A", vec![0.3]);
    let mut component = component(&ColumnClassifier::new(1));
    component.pre_fit(vec![registry(&["c1"])]);

    let dataset = component
        .sample_xy_with_cids(&instance, &unlabeled_sample(vec![1.0, 2.0]))
        .unwrap();
    assert_eq!(dataset.x[&Category::new("A")], vec![vec![1.0, 2.0, 0.3]]);
    assert!(dataset.y.is_empty());
}

#[test]
fn test_partition_covers_known_identifiers() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.1])
        .with_constraint("c2", "B", vec![0.2, 0.2])
        .with_constraint("c3", "A", vec![0.3])
        .with_constraint("c4", "B", vec![0.4, 0.4]);
    let mut component = component(&ColumnClassifier::new(1));
    component.pre_fit(vec![registry(&["c1", "c4"]), registry(&["c2", "c3"])]);

    let dataset = component
        .sample_xy_with_cids(&instance, &training_sample(vec![0.0], &["c4"]))
        .unwrap();

    let mut seen: Vec<ConstraintId> = dataset.cids.values().flatten().cloned().collect();
    seen.sort();
    let known: Vec<ConstraintId> = component.known_violations().keys().cloned().collect();
    assert_eq!(seen, known);
    assert_eq!(dataset.cids[&Category::new("B")], ids(&["c2", "c4"]));
    for (category, cids) in &dataset.cids {
        assert_eq!(dataset.x[category].len(), cids.len());
        assert_eq!(dataset.y[category].len(), cids.len());
    }
}

#[test]
fn test_uncategorised_identifiers_are_skipped() {
    let instance = ScriptedInstance::new().with_constraint("c1", "A", vec![0.1]);
    let mut component = component(&ColumnClassifier::new(1));
    component.pre_fit(vec![registry(&["c1", "gone"])]);

    let dataset = component
        .sample_xy_with_cids(&instance, &unlabeled_sample(vec![0.0]))
        .unwrap();
    assert_eq!(dataset.cids.len(), 1);
    assert_eq!(dataset.cids[&Category::new("A")], ids(&["c1"]));
}

#[test]
fn test_predict_uses_strict_threshold() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.9])
        .with_constraint("c2", "A", vec![0.4])
        .with_constraint("c3", "A", vec![0.5]);
    let mut component = component(&ColumnClassifier::new(1));
    component
        .fit(&[(&instance, &training_sample(vec![7.0], &["c1", "c2", "c3"]))])
        .unwrap();

    let pred = component
        .sample_predict(&instance, &unlabeled_sample(vec![7.0]))
        .unwrap();
    assert_eq!(pred, ids(&["c1"]));
}

#[test]
fn test_evaluate_counts_every_known_identifier() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.9])
        .with_constraint("c2", "A", vec![0.8])
        .with_constraint("c3", "A", vec![0.1]);
    let mut component = component(&ColumnClassifier::new(1));
    component
        .fit(&[
            (&instance, &training_sample(vec![7.0], &["c1", "c2"])),
            (&instance, &training_sample(vec![7.0], &["c3"])),
        ])
        .unwrap();

    let eval = component
        .sample_evaluate(&instance, &training_sample(vec![7.0], &["c1"]))
        .unwrap();
    assert_eq!(eval, ClassifierEvaluation::new(1, 1, 1, 0));
    assert_eq!(eval.total(), component.known_violations().len());
}

#[test]
fn test_unfit_component_predicts_nothing() {
    let instance = ScriptedInstance::new().with_constraint("c1", "A", vec![0.9]);
    let component = component(&ColumnClassifier::new(1));

    assert!(!component.is_fitted());
    let sample = training_sample(vec![1.0], &["c1"]);
    assert!(component.sample_predict(&instance, &sample).unwrap().is_empty());
    assert_eq!(
        component.sample_evaluate(&instance, &sample).unwrap(),
        ClassifierEvaluation::default()
    );
}

#[test]
fn test_fit_without_violations() {
    let instance = ScriptedInstance::new().with_constraint("c1", "A", vec![0.9]);
    let clf = ColumnClassifier::new(1);
    let mut component = component(&clf);
    component
        .fit(&[(&instance, &training_sample(vec![1.0], &[]))])
        .unwrap();

    assert!(component.is_fitted());
    assert!(component.categories().is_empty());
    assert!(clf.fits().is_empty());
    assert!(component
        .sample_predict(&instance, &unlabeled_sample(vec![1.0]))
        .unwrap()
        .is_empty());
}

#[test]
fn test_unknown_category_is_an_error() {
    let trained = ScriptedInstance::new().with_constraint("c1", "A", vec![0.9]);
    let mut component = component(&ColumnClassifier::new(1));
    component
        .fit(&[(&trained, &training_sample(vec![1.0], &["c1"]))])
        .unwrap();

    let moved = ScriptedInstance::new().with_constraint("c1", "B", vec![0.9]);
    let result = component.sample_predict(&moved, &unlabeled_sample(vec![1.0]));
    assert!(matches!(result, Err(LearnError::UnknownCategory(c)) if c.as_str() == "B"));
}

#[test]
fn test_refit_replaces_state() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.9])
        .with_constraint("c2", "B", vec![0.9]);
    let mut component = component(&ColumnClassifier::new(1));

    component
        .fit(&[(&instance, &training_sample(vec![1.0], &["c1"]))])
        .unwrap();
    assert_eq!(component.categories(), vec![&Category::new("A")]);

    component
        .fit(&[(&instance, &training_sample(vec![1.0], &["c2"]))])
        .unwrap();
    assert_eq!(component.categories(), vec![&Category::new("B")]);
    assert_eq!(
        component.known_violations().keys().cloned().collect::<Vec<_>>(),
        ids(&["c2"])
    );
    assert_eq!(
        component
            .sample_predict(&instance, &unlabeled_sample(vec![1.0]))
            .unwrap(),
        ids(&["c2"])
    );
}

#[test]
fn test_failed_refit_leaves_component_unfit() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.9])
        .with_constraint("c2", "B", vec![0.9]);
    let mut component = component(&ColumnClassifier::new(1));
    component
        .fit(&[(&instance, &training_sample(vec![1.0], &["c1"]))])
        .unwrap();
    assert!(component.is_fitted());

    let mut no_features = MemorySample::new();
    component
        .record_enforced(&mut no_features, &registry(&["c2"]))
        .unwrap();
    let result = component.fit(&[
        (&instance, &training_sample(vec![1.0], &["c2"])),
        (&instance, &no_features),
    ]);
    assert!(matches!(result, Err(LearnError::MissingInstanceFeatures(_))));

    assert!(!component.is_fitted());
    assert!(component.categories().is_empty());
    assert_eq!(
        component
            .sample_predict(&instance, &unlabeled_sample(vec![1.0]))
            .unwrap(),
        Vec::<ConstraintId>::new()
    );
}

#[test]
fn test_failed_fit_xy_leaves_component_unfit() {
    let instance = ScriptedInstance::new().with_constraint("c1", "A", vec![0.9]);
    let mut component = component(&ColumnClassifier::new(1));
    component
        .fit(&[(&instance, &training_sample(vec![1.0], &["c1"]))])
        .unwrap();

    let (x, _) = component
        .sample_xy(&instance, &unlabeled_sample(vec![1.0]))
        .unwrap();
    let result = component.fit_xy(&x, &Default::default());
    assert!(matches!(result, Err(LearnError::MissingLabels(_))));
    assert!(!component.is_fitted());
}

#[test]
fn test_samples_must_share_instance_feature_width() {
    let instance = ScriptedInstance::new().with_constraint("c1", "A", vec![0.9]);
    let mut component = component(&ColumnClassifier::new(1));
    let result = component.fit(&[
        (&instance, &training_sample(vec![1.0], &["c1"])),
        (&instance, &training_sample(vec![1.0, 2.0], &["c1"])),
    ]);
    assert!(matches!(result, Err(LearnError::Dimension(_))));
    assert!(!component.is_fitted());
}

#[test]
fn test_pre_fit_keeps_latest_metadata() {
    let mut component = component(&ColumnClassifier::new(1));
    let mut first = registry(&["c1", "c2"]);
    first.insert("c1".into(), json!({"rhs": 1}));
    let mut second = registry(&[]);
    second.insert("c1".into(), json!({"rhs": 2}));

    component.pre_fit(vec![first, second]);
    assert_eq!(component.known_violations()[&ConstraintId::from("c1")], json!({"rhs": 2}));
    assert_eq!(component.known_violations().len(), 2);
}

#[test]
fn test_missing_training_data_is_an_error() {
    let instance = ScriptedInstance::new().with_constraint("c1", "A", vec![0.9]);
    let mut component = component(&ColumnClassifier::new(1));

    let result = component.fit(&[(&instance, &unlabeled_sample(vec![1.0]))]);
    assert!(matches!(result, Err(LearnError::MissingEnforced(_))));

    let mut no_features = MemorySample::new();
    component
        .record_enforced(&mut no_features, &registry(&["c1"]))
        .unwrap();
    let result = component.fit(&[(&instance, &no_features)]);
    assert!(matches!(result, Err(LearnError::MissingInstanceFeatures(_))));
}

#[test]
fn test_category_rows_must_share_width() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.9])
        .with_constraint("c2", "A", vec![0.9, 0.1]);
    let mut component = component(&ColumnClassifier::new(1));
    let result = component.fit(&[(&instance, &training_sample(vec![1.0], &["c1", "c2"]))]);
    assert!(matches!(result, Err(LearnError::Dimension(_))));
}

#[test]
fn test_thread_counts_agree() {
    let instance = ScriptedInstance::new()
        .with_constraint("a1", "A", vec![0.9])
        .with_constraint("b1", "B", vec![0.2])
        .with_constraint("c1", "C", vec![0.7])
        .with_constraint("d1", "D", vec![0.6]);
    let sample = training_sample(vec![0.0], &["a1", "b1", "c1", "d1"]);

    let predictions: Vec<BTreeSet<ConstraintId>> = [
        FitThreadCount::None,
        FitThreadCount::Auto,
        FitThreadCount::Count(2),
    ]
    .into_iter()
    .map(|threads| {
        let mut component = component(&ColumnClassifier::new(1)).with_fit_thread_count(threads);
        component.fit(&[(&instance, &sample)]).unwrap();
        assert_eq!(component.categories().len(), 4);
        component
            .sample_predict(&instance, &sample)
            .unwrap()
            .into_iter()
            .collect()
    })
    .collect();

    let expected: BTreeSet<ConstraintId> = ids(&["a1", "c1", "d1"]).into_iter().collect();
    for pred in predictions {
        assert_eq!(pred, expected);
    }
}

#[test]
fn test_before_solve_hands_prediction_to_enforcer() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.9])
        .with_constraint("c2", "A", vec![0.1]);
    let mut component = component(&ColumnClassifier::new(1));
    component
        .fit(&[(&instance, &training_sample(vec![1.0], &["c1", "c2"]))])
        .unwrap();

    let mut enforced: Vec<ConstraintId> = Vec::new();
    let count = component
        .before_solve(&instance, &unlabeled_sample(vec![1.0]), &mut enforced)
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(enforced, ids(&["c1"]));
}

#[test]
fn test_user_cuts_from_config() {
    let config = LearnConfig::new()
        .with_instance_features_key("features")
        .with_fit_thread_count(FitThreadCount::None)
        .with_threshold(ThresholdConfig::MinProbability {
            min_probability: [0.5, 0.3],
        });
    let mut component =
        DynamicConstraintsComponent::user_cuts_from_config(&config, ColumnClassifier::new(1));
    assert_eq!(component.attr(), "mip_user_cuts_enforced");

    let instance = ScriptedInstance::new()
        .with_constraint("cut1", "gomory", vec![0.4])
        .with_constraint("cut2", "gomory", vec![0.2]);
    let mut sample = MemorySample::new();
    sample
        .put_vector("features", Vector::from(vec![3.0]))
        .unwrap();
    component
        .record_enforced(&mut sample, &registry(&["cut1", "cut2"]))
        .unwrap();

    component.fit(&[(&instance, &sample)]).unwrap();
    assert_eq!(
        component.sample_predict(&instance, &sample).unwrap(),
        ids(&["cut1"])
    );
}

#[test]
fn test_counting_classifier_pipeline() {
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![1.0])
        .with_constraint("c2", "A", vec![2.0])
        .with_constraint("c3", "A", vec![3.0])
        .with_constraint("c4", "A", vec![4.0]);
    let mut component = DynamicConstraintsComponent::lazy(
        CountingClassifier::new(),
        MinProbabilityThreshold::new([0.5, 0.6]),
    );
    let first = training_sample(vec![0.0], &["c1", "c2", "c3"]);
    let second = training_sample(vec![0.0], &["c1", "c2", "c4"]);
    component
        .fit(&[(&instance, &first), (&instance, &second)])
        .unwrap();
    assert!(matches!(component.fit_state(), FitState::Fitted(models) if models.len() == 1));

    // 6 of 8 training rows are enforced, so every row scores 0.75 > 0.6
    let pred = component
        .sample_predict(&instance, &unlabeled_sample(vec![0.0]))
        .unwrap();
    assert_eq!(pred, ids(&["c1", "c2", "c3", "c4"]));
}

#[test]
fn test_fit_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let instance = ScriptedInstance::new()
        .with_constraint("c1", "A", vec![0.9])
        .with_constraint("c2", "A", vec![0.3]);
    let mut component = component(&ColumnClassifier::new(1));

    let paths: Vec<_> = [&["c1"][..], &["c2"][..]]
        .iter()
        .enumerate()
        .map(|(i, enforced)| {
            let path = dir.path().join(format!("sample{i}.cfs"));
            let mut sample = FileSample::create(&path).unwrap();
            sample
                .put_vector("static_instance_features", Vector::from(vec![5.0]))
                .unwrap();
            component
                .record_enforced(&mut sample, &registry(enforced))
                .unwrap();
            sample.close().unwrap();
            path
        })
        .collect();

    let pairs: Vec<(&ScriptedInstance, _)> = paths.iter().map(|p| (&instance, p)).collect();
    component.fit_from_files(&pairs).unwrap();
    assert_eq!(component.known_violations().len(), 2);

    let eval = FileSample::with_file(&paths[0], |sample| {
        component.sample_evaluate(&instance, &*sample)
    })
    .unwrap();
    assert_eq!(eval, ClassifierEvaluation::new(1, 1, 0, 0));
}

/// Puts every constraint in the category named by the instance; constraints
/// starting with `hot` get a high score.
struct PrefixExtractor;

impl ConstraintFeaturesExtractor<str> for PrefixExtractor {
    fn extract_constraint_features(
        &self,
        instance: &str,
        cids: &[ConstraintId],
    ) -> cutforge_learn::Result<ConstraintFeatures> {
        Ok(ConstraintFeatures {
            features: cids
                .iter()
                .map(|cid| {
                    let hot = cid.as_bytes().starts_with(b"hot");
                    vec![if hot { 0.9 } else { 0.1 }]
                })
                .collect(),
            categories: vec![Some(Category::new(instance)); cids.len()],
            lazy: vec![true; cids.len()],
        })
    }
}

#[test]
fn test_custom_extractor() {
    let mut component = component(&ColumnClassifier::new(1)).with_extractor(PrefixExtractor);
    let sample = training_sample(vec![0.0], &["hot1", "cold1"]);
    component.fit(&[("tsp", &sample)]).unwrap();

    assert_eq!(component.categories(), vec![&Category::new("tsp")]);
    assert_eq!(
        component.sample_predict("tsp", &sample).unwrap(),
        ids(&["hot1"])
    );
}
