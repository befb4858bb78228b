use std::fmt;

use crate::vote::LEAF_VOTE;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for FeatureIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a `Vec<Node>` arena, identifying a specific node in a decision tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root of every tree.
    pub const ROOT: NodeIndex = NodeIndex(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive/negative label distribution of the records routed to a node.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct ClassCounts {
    /// Records labeled `true`.
    pub pos: usize,
    /// Records labeled `false`.
    pub neg: usize,
}

impl ClassCounts {
    /// Create counts from explicit positive and negative tallies.
    #[must_use]
    pub fn new(pos: usize, neg: usize) -> Self {
        Self { pos, neg }
    }

    /// Add one record with the given label.
    pub fn add(&mut self, label: bool) {
        if label {
            self.pos += 1;
        } else {
            self.neg += 1;
        }
    }

    /// Total number of records counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.pos + self.neg
    }

    /// `true` when at most one class is present.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.pos == 0 || self.neg == 0
    }

    /// Binary Shannon entropy of the distribution, in bits.
    ///
    /// Zero for a pure distribution (including the empty one), one for an
    /// even split.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        if self.is_pure() {
            return 0.0;
        }
        let total = self.total() as f64;
        let p = self.pos as f64 / total;
        let q = self.neg as f64 / total;
        -(p * p.log2()) - q * q.log2()
    }

    /// Information gain of splitting these counts into `left` and `right`.
    ///
    /// `H(self) - w_l·H(left) - w_r·H(right)`, each weight being the child's
    /// share of this node's records. Zero for an empty parent.
    #[must_use]
    pub fn mutual_information(&self, left: &ClassCounts, right: &ClassCounts) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        self.entropy()
            - left.total() as f64 / total * left.entropy()
            - right.total() as f64 / total * right.entropy()
    }

    /// Majority decision under the leaf tie convention (ties decide `false`).
    #[must_use]
    pub fn majority(&self) -> bool {
        LEAF_VOTE.decide(self.pos, self.neg)
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+/{}-", self.pos, self.neg)
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` where children are referenced by
/// [`NodeIndex`]. A split always owns both of its children; a leaf owns none.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Name of the feature the node splits on.
        feature: String,
        /// Label distribution of the records that reached this node.
        counts: ClassCounts,
        /// Child receiving records whose split feature is `true`.
        left: NodeIndex,
        /// Child receiving records whose split feature is `false`.
        right: NodeIndex,
    },
    /// A terminal leaf node.
    Leaf {
        /// Label distribution of the records that reached this leaf.
        counts: ClassCounts,
    },
}

impl Node {
    /// Return the label distribution at this node.
    #[must_use]
    pub fn counts(&self) -> ClassCounts {
        match self {
            Node::Split { counts, .. } | Node::Leaf { counts } => *counts,
        }
    }

    /// Return the split feature name, or `None` for a leaf.
    #[must_use]
    pub fn split_feature(&self) -> Option<&str> {
        match self {
            Node::Split { feature, .. } => Some(feature),
            Node::Leaf { .. } => None,
        }
    }

    /// Return the `(left, right)` children of a split.
    #[must_use]
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        match self {
            Node::Split { left, right, .. } => Some((*left, *right)),
            Node::Leaf { .. } => None,
        }
    }

    /// Entropy of this node's label distribution, in bits.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        self.counts().entropy()
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassCounts, FeatureIndex, Node, NodeIndex};

    // --- FeatureIndex ---

    #[test]
    fn feature_index_roundtrip() {
        let fi = FeatureIndex::new(7);
        assert_eq!(fi.index(), 7);
        assert_eq!(FeatureIndex::from(7), fi);
    }

    #[test]
    fn feature_index_display() {
        assert_eq!(format!("{}", FeatureIndex::new(3)), "3");
    }

    #[test]
    fn feature_index_ordering() {
        assert!(FeatureIndex::new(1) < FeatureIndex::new(5));
    }

    // --- NodeIndex ---

    #[test]
    fn node_index_root_is_zero() {
        assert_eq!(NodeIndex::ROOT.index(), 0);
        assert_eq!(format!("{}", NodeIndex::new(4)), "4");
    }

    // --- ClassCounts ---

    #[test]
    fn entropy_of_pure_counts_is_zero() {
        assert_eq!(ClassCounts::new(0, 0).entropy(), 0.0);
        assert_eq!(ClassCounts::new(5, 0).entropy(), 0.0);
        assert_eq!(ClassCounts::new(0, 9).entropy(), 0.0);
    }

    #[test]
    fn entropy_of_even_split_is_one() {
        for n in 1..20 {
            let h = ClassCounts::new(n, n).entropy();
            assert!((h - 1.0).abs() < 1e-12, "n = {n}, h = {h}");
        }
    }

    #[test]
    fn entropy_stays_in_unit_interval() {
        for pos in 0..25 {
            for neg in 0..25 {
                let h = ClassCounts::new(pos, neg).entropy();
                assert!((0.0..=1.0).contains(&h), "pos={pos} neg={neg} h={h}");
                if pos > 0 && neg > 0 && pos != neg {
                    assert!(h > 0.0 && h < 1.0, "pos={pos} neg={neg} h={h}");
                }
            }
        }
    }

    #[test]
    fn entropy_known_value() {
        // p = 1/4: -(0.25·log2 0.25) - 0.75·log2 0.75 ≈ 0.811278
        let h = ClassCounts::new(1, 3).entropy();
        assert!((h - 0.811_278_124_459_132_8).abs() < 1e-12);
    }

    #[test]
    fn perfect_split_gains_full_entropy() {
        let parent = ClassCounts::new(4, 4);
        let gain = parent.mutual_information(&ClassCounts::new(4, 0), &ClassCounts::new(0, 4));
        assert!((gain - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uninformative_split_gains_nothing() {
        let parent = ClassCounts::new(4, 4);
        let gain = parent.mutual_information(&ClassCounts::new(2, 2), &ClassCounts::new(2, 2));
        assert!(gain.abs() < 1e-12);
    }

    #[test]
    fn mutual_information_of_empty_parent_is_zero() {
        let zero = ClassCounts::default();
        assert_eq!(zero.mutual_information(&zero, &zero), 0.0);
    }

    #[test]
    fn majority_tie_decides_false() {
        assert!(!ClassCounts::new(3, 3).majority());
        assert!(!ClassCounts::new(0, 0).majority());
        assert!(ClassCounts::new(4, 3).majority());
        assert!(!ClassCounts::new(3, 4).majority());
    }

    #[test]
    fn add_tallies_labels() {
        let mut c = ClassCounts::default();
        c.add(true);
        c.add(false);
        c.add(true);
        assert_eq!(c, ClassCounts::new(2, 1));
        assert_eq!(c.total(), 3);
        assert_eq!(format!("{c}"), "2+/1-");
    }

    // --- Node ---

    fn make_leaf() -> Node {
        Node::Leaf {
            counts: ClassCounts::new(3, 1),
        }
    }

    fn make_split() -> Node {
        Node::Split {
            feature: "spread".to_string(),
            counts: ClassCounts::new(5, 5),
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
        }
    }

    #[test]
    fn leaf_has_no_split_feature_or_children() {
        let leaf = make_leaf();
        assert!(leaf.is_leaf());
        assert_eq!(leaf.split_feature(), None);
        assert_eq!(leaf.children(), None);
    }

    #[test]
    fn split_reports_feature_and_children() {
        let split = make_split();
        assert!(!split.is_leaf());
        assert_eq!(split.split_feature(), Some("spread"));
        assert_eq!(split.children(), Some((NodeIndex::new(1), NodeIndex::new(2))));
        assert!((split.entropy() - 1.0).abs() < 1e-12);
    }
}
