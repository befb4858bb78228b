//! Running-accuracy reporting.

use std::fmt;

use tracing::{info, warn};

use crate::eval::Evaluation;

/// Which pass produced an accuracy measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Held-out evaluation after each tree is added during training.
    Validation,
    /// Evaluation of a finished forest on unseen records.
    Test,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Validation => "validation",
            Phase::Test => "test",
        })
    }
}

/// One `(tree_count, accuracy)` measurement.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccuracyPoint {
    /// Pass that produced the measurement.
    pub phase: Phase,
    /// Number of trees in the forest when measured.
    pub n_trees: usize,
    /// Forest accuracy, `None` when the evaluation set was empty.
    pub accuracy: Option<f64>,
    /// The underlying decision tally.
    pub evaluation: Evaluation,
}

impl AccuracyPoint {
    /// Build a point from a finished evaluation.
    #[must_use]
    pub fn new(phase: Phase, n_trees: usize, evaluation: Evaluation) -> Self {
        Self {
            phase,
            n_trees,
            accuracy: evaluation.accuracy(),
            evaluation,
        }
    }
}

/// Receiver for accuracy measurements emitted by the forest.
///
/// Where the points end up (console, table, file) is the implementor's choice.
pub trait AccuracySink {
    /// Accept one measurement.
    fn record(&mut self, point: AccuracyPoint);
}

impl AccuracySink for Vec<AccuracyPoint> {
    fn record(&mut self, point: AccuracyPoint) {
        self.push(point);
    }
}

impl<S: AccuracySink + ?Sized> AccuracySink for &mut S {
    fn record(&mut self, point: AccuracyPoint) {
        (**self).record(point);
    }
}

/// Sink that logs each measurement through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AccuracySink for TracingSink {
    fn record(&mut self, point: AccuracyPoint) {
        match point.accuracy {
            Some(accuracy) => info!(
                phase = %point.phase,
                n_trees = point.n_trees,
                accuracy,
                error_rate = 1.0 - accuracy,
                "forest accuracy"
            ),
            None => warn!(
                phase = %point.phase,
                n_trees = point.n_trees,
                "evaluation set empty; accuracy undefined"
            ),
        }
    }
}
