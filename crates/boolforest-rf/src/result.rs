//! Training result types for the random forest.

use crate::sampling::SamplingPlan;

/// What a training call did.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingSummary {
    /// Number of trees in the forest after training.
    pub n_trees: usize,
    /// Number of features in the training data.
    pub n_features: usize,
    /// Number of loaded training records.
    pub n_records: usize,
    /// Resolved per-tree sampling sizes.
    pub sampling: SamplingPlan,
    /// Held-out accuracy after the last tree this call added.
    ///
    /// `None` when no tree was added or the last held-out set was empty.
    pub last_accuracy: Option<f64>,
}
