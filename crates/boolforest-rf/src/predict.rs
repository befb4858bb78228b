//! Inference methods for the random forest ensemble.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::ForestConfig;
use crate::error::RfError;
use crate::eval::Evaluation;
use crate::forest::RandomForest;
use crate::record::{Record, validate_widths};
use crate::sampling::SamplingPlan;
use crate::tree::DecisionTree;
use crate::vote::FOREST_VOTE;

impl RandomForest {
    /// Count tree decisions for a record as `(pos, neg)`.
    ///
    /// # Errors
    ///
    /// Returns the first error a tree reports from [`DecisionTree::decide`].
    pub fn votes(&self, record: &Record) -> Result<(usize, usize), RfError> {
        let mut pos = 0;
        for tree in &self.trees {
            if tree.decide(record)? {
                pos += 1;
            }
        }
        Ok((pos, self.trees.len() - pos))
    }

    /// Decide the label of a record by vote.
    ///
    /// `true` when at least as many trees vote `true` as `false`, so an even
    /// split (including an empty forest) decides `true`.
    ///
    /// # Errors
    ///
    /// See [`RandomForest::votes`].
    pub fn decide(&self, record: &Record) -> Result<bool, RfError> {
        let (pos, neg) = self.votes(record)?;
        Ok(FOREST_VOTE.decide(pos, neg))
    }

    /// Decide a batch of records in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::RecordLengthMismatch`] naming the first bad record,
    /// or any error a tree reports.
    pub fn decide_batch(&self, records: &[Record]) -> Result<Vec<bool>, RfError> {
        validate_widths(records, self.feature_names().len())?;
        records
            .par_iter()
            .map(|record| self.decide(record))
            .collect()
    }

    /// Decide every record and tally the outcome against the labels.
    ///
    /// An empty slice yields an empty evaluation whose accuracy is `None`.
    ///
    /// # Errors
    ///
    /// See [`RandomForest::decide_batch`].
    pub fn evaluate(&self, records: &[Record]) -> Result<Evaluation, RfError> {
        let decisions = self.decide_batch(records)?;
        Ok(Evaluation::from_pairs(
            decisions
                .into_iter()
                .zip(records.iter().map(Record::label)),
        ))
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of trees training grows to.
    #[must_use]
    pub fn target_trees(&self) -> usize {
        self.config.n_trees()
    }

    /// Return the trees in insertion order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the feature names, empty until the forest sees data or a tree.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        self.feature_names.as_deref().unwrap_or(&[])
    }

    /// Return the training configuration.
    #[must_use]
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Return the sampling sizes of the last training call, if any.
    #[must_use]
    pub fn sampling(&self) -> Option<SamplingPlan> {
        self.sampling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FeatureIndex;

    fn names() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    /// Tree that always decides `a`.
    fn tree_on_a() -> DecisionTree {
        let records = vec![
            Record::labeled(&[true, false], true),
            Record::labeled(&[false, false], false),
            Record::labeled(&[true, true], true),
            Record::labeled(&[false, true], false),
        ];
        let mut tree = DecisionTree::new(names());
        tree.train(&records, [FeatureIndex::new(0)]).unwrap();
        tree
    }

    /// Tree that always decides `!a`.
    fn tree_against_a() -> DecisionTree {
        let records = vec![
            Record::labeled(&[true, false], false),
            Record::labeled(&[false, false], true),
        ];
        let mut tree = DecisionTree::new(names());
        tree.train(&records, [FeatureIndex::new(0)]).unwrap();
        tree
    }

    fn forest(trees: Vec<DecisionTree>) -> RandomForest {
        let n = trees.len().max(1);
        RandomForest::from_trees(ForestConfig::new(n).unwrap(), names(), trees).unwrap()
    }

    #[test]
    fn tie_decides_true() {
        let f = forest(vec![tree_on_a(), tree_against_a()]);
        let r = Record::labeled(&[false, false], false);
        assert_eq!(f.votes(&r).unwrap(), (1, 1));
        assert!(f.decide(&r).unwrap());
    }

    #[test]
    fn majority_wins() {
        let f = forest(vec![tree_on_a(), tree_on_a(), tree_against_a()]);
        assert!(f.decide(&Record::labeled(&[true, false], false)).unwrap());
        assert!(!f.decide(&Record::labeled(&[false, false], false)).unwrap());
    }

    #[test]
    fn empty_forest_decides_true() {
        let f = forest(Vec::new());
        assert_eq!(f.n_trees(), 0);
        assert!(f.decide(&Record::labeled(&[false, false], false)).unwrap());
    }

    #[test]
    fn batch_matches_single_decisions() {
        let f = forest(vec![tree_on_a(), tree_on_a(), tree_against_a()]);
        let records: Vec<Record> = [[true, true], [false, true], [true, false], [false, false]]
            .iter()
            .map(|fs| Record::labeled(fs, fs[0]))
            .collect();
        let batch = f.decide_batch(&records).unwrap();
        let single: Vec<bool> = records.iter().map(|r| f.decide(r).unwrap()).collect();
        assert_eq!(batch, single);
        assert_eq!(f.evaluate(&records).unwrap().accuracy(), Some(1.0));
    }

    #[test]
    fn batch_names_the_bad_record() {
        let f = forest(vec![tree_on_a()]);
        let records = vec![
            Record::labeled(&[true, true], true),
            Record::labeled(&[true], true),
        ];
        assert!(matches!(
            f.decide_batch(&records),
            Err(RfError::RecordLengthMismatch {
                record_index: 1,
                ..
            })
        ));
    }

    #[test]
    fn evaluate_empty_has_no_accuracy() {
        let f = forest(vec![tree_on_a()]);
        assert_eq!(f.evaluate(&[]).unwrap().accuracy(), None);
    }
}
