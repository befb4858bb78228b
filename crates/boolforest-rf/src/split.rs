use std::collections::BTreeSet;

use crate::node::{ClassCounts, FeatureIndex};
use crate::record::Record;

/// Outcome of staging one feature as the split of a node.
///
/// Evaluating a candidate never touches the node; only the winning
/// candidate is committed by the tree builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// Feature the records were partitioned on.
    pub feature: FeatureIndex,
    /// Counts of records whose feature value is `true`.
    pub left: ClassCounts,
    /// Counts of records whose feature value is `false`.
    pub right: ClassCounts,
    /// Mutual information of the partition, in bits.
    pub gain: f64,
}

/// Partition `sample` on `feature` and measure the resulting information gain.
///
/// `sample` holds positions into `records`; positions may repeat. `parent`
/// must be the label distribution of `sample`.
#[must_use]
pub fn evaluate_candidate(
    records: &[Record],
    sample: &[usize],
    feature: FeatureIndex,
    parent: &ClassCounts,
) -> SplitCandidate {
    let mut left = ClassCounts::default();
    let mut right = ClassCounts::default();
    for &pos in sample {
        let record = &records[pos];
        if record.feature(feature) {
            left.add(record.label());
        } else {
            right.add(record.label());
        }
    }
    let gain = parent.mutual_information(&left, &right);
    SplitCandidate {
        feature,
        left,
        right,
        gain,
    }
}

/// Find the most informative feature among `usable`.
///
/// Features are tried in ascending index order and a later candidate only
/// replaces the current best when its gain is strictly greater, so on equal
/// gain the lowest feature index wins.
///
/// Returns `None` when no candidate has a gain strictly above zero.
#[must_use]
pub fn find_best_split(
    records: &[Record],
    sample: &[usize],
    usable: &BTreeSet<FeatureIndex>,
    parent: &ClassCounts,
) -> Option<SplitCandidate> {
    let mut best: Option<SplitCandidate> = None;
    for &feature in usable {
        let candidate = evaluate_candidate(records, sample, feature, parent);
        if best.is_none_or(|b| candidate.gain > b.gain) {
            best = Some(candidate);
        }
    }
    best.filter(|b| b.gain > 0.0)
}

/// Split `sample` into the positions whose `feature` is `true` (left) and
/// `false` (right), preserving order.
#[must_use]
pub fn partition(
    records: &[Record],
    sample: &[usize],
    feature: FeatureIndex,
) -> (Vec<usize>, Vec<usize>) {
    sample
        .iter()
        .copied()
        .partition(|&pos| records[pos].feature(feature))
}
