//! Accuracy regression tests for boolforest-rf.
//!
//! These tests verify that algorithmic changes do not degrade classification
//! accuracy on deterministic synthetic boolean datasets.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use boolforest_rf::{
    AccuracyPoint, Dataset, DecisionTree, FeatureIndex, ForestConfig, Node, Phase, RandomForest,
    Record, SamplingPlan, TreeSample,
};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic boolean dataset
// ---------------------------------------------------------------------------

/// Generate a boolean dataset of `n_records` records over 9 features.
///
/// The label is a fair coin. f0, f1 and f2 copy the label with 5%, 10% and 15%
/// flips respectively. Features f3-f8 are pure noise.
fn make_redundant(n_records: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_features = 9;
    let records = (0..n_records)
        .map(|_| {
            let label: bool = rng.r#gen();
            let fs: Vec<bool> = (0..n_features)
                .map(|f| match f {
                    0..=2 => {
                        let flip = 0.05 * (f + 1) as f64;
                        if rng.gen_bool(flip) { !label } else { label }
                    }
                    _ => rng.r#gen(),
                })
                .collect();
            Record::labeled(&fs, label)
        })
        .collect();
    let names = (0..n_features).map(|f| format!("f{f}")).collect();
    Dataset::new(names, records).unwrap()
}

fn all_features(n: usize) -> impl Iterator<Item = FeatureIndex> {
    (0..n).map(FeatureIndex::new)
}

// ---------------------------------------------------------------------------
// a) single tree on a perfectly correlated feature
// ---------------------------------------------------------------------------

/// Feature f0 equals the label; f1-f3 are unrelated. The root must split on f0
/// into two pure leaves and classify the training set perfectly.
#[test]
fn correlated_feature_splits_root() {
    let rows: [([bool; 4], bool); 8] = [
        ([true, false, true, false], true),
        ([true, true, false, false], true),
        ([true, false, false, true], true),
        ([true, true, true, true], true),
        ([false, false, true, false], false),
        ([false, true, false, true], false),
        ([false, true, true, false], false),
        ([false, false, false, true], false),
    ];
    let records: Vec<Record> = rows.iter().map(|(fs, l)| Record::labeled(fs, *l)).collect();
    let names: Vec<String> = (0..4).map(|f| format!("f{f}")).collect();

    let mut tree = DecisionTree::new(names);
    tree.train(&records, all_features(4)).unwrap();

    assert_eq!(tree.root().split_feature(), Some("f0"));
    let (left, right) = tree.root().children().unwrap();
    let left = tree.node(left).unwrap();
    let right = tree.node(right).unwrap();
    assert!(left.is_leaf() && right.is_leaf());
    assert_eq!((left.counts().pos, left.counts().neg), (4, 0));
    assert_eq!((right.counts().pos, right.counts().neg), (0, 4));
    assert_eq!(tree.evaluate(&records).unwrap().accuracy(), Some(1.0));
}

// ---------------------------------------------------------------------------
// b) constant label
// ---------------------------------------------------------------------------

#[test]
fn constant_label_yields_root_leaf() {
    let records: Vec<Record> = (0..6)
        .map(|i| Record::labeled(&[i % 2 == 0, i % 3 == 0], true))
        .collect();
    let mut tree = DecisionTree::new(vec!["a".to_string(), "b".to_string()]);
    tree.train(&records, all_features(2)).unwrap();

    assert!(matches!(tree.root(), Node::Leaf { .. }));
    assert_eq!(tree.n_nodes(), 1);
    for fs in [[true, true], [false, false], [true, false]] {
        assert!(tree.decide(&Record::labeled(&fs, false)).unwrap());
    }
}

// ---------------------------------------------------------------------------
// c) single-tree forest equals its tree
// ---------------------------------------------------------------------------

#[test]
fn single_tree_forest_decides_like_its_tree() {
    let data = make_redundant(150, 1);
    let config = ForestConfig::new(1).unwrap().with_seed(5);
    let mut forest = RandomForest::new(config.clone());
    forest.train(&data, &mut Vec::new()).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let plan = SamplingPlan::resolve(&config, data.n_features(), data.len());
    let round = TreeSample::draw(&plan, data.n_features(), data.len(), &mut rng);
    let mut tree = DecisionTree::new(data.feature_names().to_vec());
    tree.train_sample(data.records(), &round.in_bag, round.features.iter().copied())
        .unwrap();

    for record in data.records() {
        assert_eq!(forest.decide(record).unwrap(), tree.decide(record).unwrap());
    }
}

// ---------------------------------------------------------------------------
// d) forest accuracy on unseen data
// ---------------------------------------------------------------------------

/// 60 trees on 400 records must exceed 0.80 accuracy on 400 unseen records.
#[test]
fn test_accuracy_above_threshold() {
    let train = make_redundant(400, 42);
    let unseen = make_redundant(400, 43);
    let mut forest = RandomForest::new(ForestConfig::new(60).unwrap().with_seed(42));
    forest.train(&train, &mut Vec::new()).unwrap();

    let mut points: Vec<AccuracyPoint> = Vec::new();
    let evaluation = forest.test(&unseen, &mut points).unwrap();
    let accuracy = evaluation.accuracy().unwrap();
    assert!(accuracy > 0.80, "test accuracy {accuracy} <= 0.80");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].phase, Phase::Test);
}

// ---------------------------------------------------------------------------
// e) running held-out accuracy
// ---------------------------------------------------------------------------

#[test]
fn validation_curve_has_one_point_per_tree() {
    let data = make_redundant(300, 7);
    let mut forest = RandomForest::new(ForestConfig::new(20).unwrap());
    let mut points: Vec<AccuracyPoint> = Vec::new();
    forest.train(&data, &mut points).unwrap();

    assert_eq!(points.len(), 20);
    for (i, p) in points.iter().enumerate() {
        assert_eq!(p.n_trees, i + 1);
        assert_eq!(p.phase, Phase::Validation);
        // About a third of 300 records is never drawn.
        assert!(p.evaluation.total() > 50, "held-out size {}", p.evaluation.total());
        let accuracy = p.accuracy.unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }
}

// ---------------------------------------------------------------------------
// f) determinism
// ---------------------------------------------------------------------------

/// Same config and seed must produce identical decisions across two runs.
#[test]
fn deterministic_decisions() {
    let data = make_redundant(200, 11);
    let config = ForestConfig::new(15).unwrap().with_seed(42);

    let mut a = RandomForest::new(config.clone());
    let mut b = RandomForest::new(config);
    let mut curve_a: Vec<AccuracyPoint> = Vec::new();
    let mut curve_b: Vec<AccuracyPoint> = Vec::new();
    a.train(&data, &mut curve_a).unwrap();
    b.train(&data, &mut curve_b).unwrap();

    assert_eq!(
        a.decide_batch(data.records()).unwrap(),
        b.decide_batch(data.records()).unwrap(),
        "decisions differ across runs with the same seed"
    );
    assert_eq!(curve_a, curve_b);
}

// ---------------------------------------------------------------------------
// g) reloaded model
// ---------------------------------------------------------------------------

#[test]
fn saved_model_decides_identically() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("forest.bin");
    let data = make_redundant(120, 13);

    let mut forest = RandomForest::new(ForestConfig::new(9).unwrap());
    forest.train(&data, &mut Vec::new()).unwrap();
    forest.save(&path).unwrap();

    let loaded = RandomForest::load(&path).unwrap();
    assert_eq!(
        loaded.decide_batch(data.records()).unwrap(),
        forest.decide_batch(data.records()).unwrap()
    );
}
