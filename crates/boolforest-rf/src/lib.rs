//! Binary classification over boolean records with a random forest of
//! mutual-information decision trees.
//!
//! Each tree splits greedily on the feature with the highest mutual
//! information with the label. The forest grows trees on random feature
//! subsets and record samples, reports held-out accuracy as it grows, and
//! decides by majority vote. Models serialize to bincode or JSON.

mod config;
mod error;
mod eval;
mod forest;
mod node;
mod predict;
mod record;
mod report;
mod result;
mod sampling;
mod serialize;
mod split;
mod tree;
mod vote;

pub use config::{DEFAULT_SAMPLE_FRACTION, ForestConfig, MaxFeatures};
pub use error::RfError;
pub use eval::Evaluation;
pub use forest::RandomForest;
pub use node::{ClassCounts, FeatureIndex, Node, NodeIndex};
pub use record::{Dataset, Record, RecordSource};
pub use report::{AccuracyPoint, AccuracySink, Phase, TracingSink};
pub use result::TrainingSummary;
pub use sampling::{SamplingPlan, TreeSample, bootstrap_sample, select_features};
pub use serialize::FORMAT_VERSION;
pub use split::{SplitCandidate, evaluate_candidate, find_best_split, partition};
pub use tree::DecisionTree;
pub use vote::{FOREST_VOTE, LEAF_VOTE, VotePolicy};
