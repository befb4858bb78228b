//! Random forest training: per-tree subsampling and running held-out accuracy.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument, warn};

use crate::config::ForestConfig;
use crate::error::RfError;
use crate::record::RecordSource;
use crate::report::{AccuracyPoint, AccuracySink, Phase};
use crate::result::TrainingSummary;
use crate::sampling::{SamplingPlan, TreeSample};
use crate::tree::DecisionTree;

/// An ensemble of mutual-information decision trees over boolean records.
///
/// Grows one tree at a time up to the configured count. Once trained it is
/// only read, so concurrent inference needs no synchronization.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ForestParts")]
pub struct RandomForest {
    pub(crate) config: ForestConfig,
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) feature_names: Option<Vec<String>>,
    pub(crate) sampling: Option<SamplingPlan>,
}

/// Unchecked wire form of a [`RandomForest`].
#[derive(serde::Deserialize)]
struct ForestParts {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    feature_names: Option<Vec<String>>,
    sampling: Option<SamplingPlan>,
}

impl TryFrom<ForestParts> for RandomForest {
    type Error = RfError;

    fn try_from(parts: ForestParts) -> Result<Self, Self::Error> {
        let forest = Self {
            config: parts.config,
            trees: parts.trees,
            feature_names: parts.feature_names,
            sampling: parts.sampling,
        };
        forest.validate()?;
        Ok(forest)
    }
}

impl RandomForest {
    /// Create an empty forest that will grow to `config.n_trees()` trees.
    #[must_use]
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_names: None,
            sampling: None,
        }
    }

    /// Assemble a forest from trees trained elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::FeatureListMismatch`] if any tree was built over a
    /// different feature list.
    pub fn from_trees(
        config: ForestConfig,
        feature_names: Vec<String>,
        trees: Vec<DecisionTree>,
    ) -> Result<Self, RfError> {
        let mut forest = Self::new(config);
        forest.feature_names = Some(feature_names);
        for tree in trees {
            forest.push_tree(tree)?;
        }
        Ok(forest)
    }

    /// Append one externally trained tree.
    ///
    /// The first tree fixes the feature list of a forest that has none yet.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::FeatureListMismatch`] if the tree's feature list
    /// differs from the forest's.
    pub fn push_tree(&mut self, tree: DecisionTree) -> Result<(), RfError> {
        self.fix_features(tree.feature_names())?;
        self.trees.push(tree);
        Ok(())
    }

    /// Train with a generator seeded from the configured seed.
    ///
    /// # Errors
    ///
    /// See [`RandomForest::train_with_rng`].
    pub fn train(
        &mut self,
        source: &impl RecordSource,
        sink: &mut impl AccuracySink,
    ) -> Result<TrainingSummary, RfError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.train_with_rng(source, &mut rng, sink)
    }

    /// Load labeled records and grow trees until the target count is reached.
    ///
    /// Each round draws a feature subset without replacement and a record
    /// sample with replacement, trains a tree on them, appends it, then
    /// evaluates the whole forest on the records that round never drew and
    /// reports the result to `sink`. Rounds run one after another.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::InvalidMaxFeatures`] / [`RfError::InvalidSampleFraction`] | invalid config |
    /// | [`RfError::Source`] | the record source failed |
    /// | [`RfError::RecordLengthMismatch`] | a loaded record has the wrong width |
    /// | [`RfError::FeatureListMismatch`] | the source's features differ from the forest's |
    #[instrument(skip_all, fields(n_trees = self.config.n_trees))]
    pub fn train_with_rng(
        &mut self,
        source: &impl RecordSource,
        rng: &mut impl Rng,
        sink: &mut impl AccuracySink,
    ) -> Result<TrainingSummary, RfError> {
        self.config.validate()?;

        let dataset = source.load()?;
        self.fix_features(dataset.feature_names())?;

        let n_features = dataset.n_features();
        let n_records = dataset.len();
        let plan = SamplingPlan::resolve(&self.config, n_features, n_records);
        self.sampling = Some(plan);

        info!(
            n_features,
            n_records,
            feature_subset_size = plan.feature_subset_size,
            sample_size = plan.sample_size,
            existing_trees = self.trees.len(),
            "training random forest"
        );
        if plan.sample_size == 0 {
            warn!(n_records, "training sample is empty; trees will be 0/0 leaves");
        }

        let records = dataset.records();
        let mut last_accuracy = None;

        while self.trees.len() < self.config.n_trees {
            let round = TreeSample::draw(&plan, n_features, n_records, rng);

            let mut tree = DecisionTree::new(dataset.feature_names().to_vec());
            tree.train_sample(records, &round.in_bag, round.features.iter().copied())?;
            self.trees.push(tree);

            let held_out: Vec<_> = round.held_out.iter().map(|&i| records[i].clone()).collect();
            let evaluation = self.evaluate(&held_out)?;
            let point = AccuracyPoint::new(Phase::Validation, self.trees.len(), evaluation);

            debug!(
                n_trees = self.trees.len(),
                features = ?round.features,
                n_held_out = held_out.len(),
                accuracy = ?point.accuracy,
                "tree added"
            );

            last_accuracy = point.accuracy;
            sink.record(point);
        }

        info!(
            n_trees = self.trees.len(),
            last_accuracy = ?last_accuracy,
            "random forest training complete"
        );

        Ok(TrainingSummary {
            n_trees: self.trees.len(),
            n_features,
            n_records,
            sampling: plan,
            last_accuracy,
        })
    }

    /// Evaluate the forest on unseen labeled records and report one test point.
    ///
    /// Does not modify the forest.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::Source`] | the record source failed |
    /// | [`RfError::FeatureListMismatch`] | the source's features differ from the forest's |
    /// | [`RfError::UnknownSplitFeature`] | a tree is inconsistent with the feature list |
    #[instrument(skip_all, fields(n_trees = self.trees.len()))]
    pub fn test(
        &self,
        source: &impl RecordSource,
        sink: &mut impl AccuracySink,
    ) -> Result<crate::eval::Evaluation, RfError> {
        let dataset = source.load()?;
        if dataset.feature_names() != self.feature_names() {
            return Err(RfError::FeatureListMismatch {
                expected: self.feature_names().to_vec(),
                got: dataset.feature_names().to_vec(),
            });
        }

        let evaluation = self.evaluate(dataset.records())?;
        let point = AccuracyPoint::new(Phase::Test, self.trees.len(), evaluation);
        info!(
            n_records = dataset.len(),
            accuracy = ?point.accuracy,
            "random forest tested"
        );
        sink.record(point);
        Ok(evaluation)
    }

    /// Check the configuration and that every tree is sound and shares the
    /// forest's feature list.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::InvalidTreeCount`] and other config errors | the configuration is invalid |
    /// | [`RfError::FeatureListMismatch`] | a tree's feature list differs from the forest's |
    /// | tree structure errors | see [`DecisionTree::validate`] |
    pub fn validate(&self) -> Result<(), RfError> {
        self.config.validate()?;
        for tree in &self.trees {
            tree.validate()?;
            if tree.feature_names() != self.feature_names() {
                return Err(RfError::FeatureListMismatch {
                    expected: self.feature_names().to_vec(),
                    got: tree.feature_names().to_vec(),
                });
            }
        }
        Ok(())
    }

    fn fix_features(&mut self, names: &[String]) -> Result<(), RfError> {
        match &self.feature_names {
            Some(existing) if existing.as_slice() != names => Err(RfError::FeatureListMismatch {
                expected: existing.clone(),
                got: names.to_vec(),
            }),
            Some(_) => Ok(()),
            None => {
                self.feature_names = Some(names.to_vec());
                Ok(())
            }
        }
    }
}
