use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, instrument, warn};

use crate::{
    RfError,
    eval::Evaluation,
    node::{ClassCounts, FeatureIndex, Node, NodeIndex},
    record::{Record, validate_widths},
    split::{find_best_split, partition},
};

/// A greedy mutual-information decision tree over boolean features.
///
/// Stored as an arena-based `Vec<Node>` with the root at index 0. A tree is
/// created untrained (a single empty leaf) and grown exactly once.
/// Deserialization goes through [`DecisionTree::validate`], so a loaded tree
/// always walks to a leaf.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TreeArena")]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) feature_names: Vec<String>,
    pub(crate) trained: bool,
}

/// Unchecked wire form of a [`DecisionTree`].
#[derive(serde::Deserialize)]
struct TreeArena {
    nodes: Vec<Node>,
    feature_names: Vec<String>,
    trained: bool,
}

impl TryFrom<TreeArena> for DecisionTree {
    type Error = RfError;

    fn try_from(arena: TreeArena) -> Result<Self, Self::Error> {
        let tree = Self {
            nodes: arena.nodes,
            feature_names: arena.feature_names,
            trained: arena.trained,
        };
        tree.validate()?;
        Ok(tree)
    }
}

impl DecisionTree {
    /// Create an untrained tree over the given ordered feature names.
    #[must_use]
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            nodes: vec![Node::Leaf {
                counts: ClassCounts::default(),
            }],
            feature_names,
            trained: false,
        }
    }

    /// Grow the tree on every record, splitting only on `usable` features.
    ///
    /// The iteration order of `usable` does not matter.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::TreeAlreadyTrained`] | the tree was grown before |
    /// | [`RfError::RecordLengthMismatch`] | a record is not `n_features + 1` wide |
    /// | [`RfError::FeatureIndexOutOfRange`] | a usable index is `>= n_features` |
    pub fn train(
        &mut self,
        records: &[Record],
        usable: impl IntoIterator<Item = FeatureIndex>,
    ) -> Result<(), RfError> {
        let sample: Vec<usize> = (0..records.len()).collect();
        self.train_sample(records, &sample, usable)
    }

    /// Grow the tree on the records at `sample` positions (repeats allowed).
    ///
    /// This is the isolated unit of work behind forest training: a caller that
    /// distributes training draws the feature subset and record sample itself
    /// and ships the resulting tree back for assembly.
    ///
    /// # Errors
    ///
    /// As [`DecisionTree::train`], plus [`RfError::SamplePositionOutOfRange`]
    /// when a position does not address a record.
    #[instrument(skip_all, fields(n_records = records.len(), n_sample = sample.len()))]
    pub fn train_sample(
        &mut self,
        records: &[Record],
        sample: &[usize],
        usable: impl IntoIterator<Item = FeatureIndex>,
    ) -> Result<(), RfError> {
        if self.trained {
            return Err(RfError::TreeAlreadyTrained);
        }

        let n_features = self.feature_names.len();
        validate_widths(records, n_features)?;

        let usable: BTreeSet<FeatureIndex> = usable.into_iter().collect();
        if let Some(bad) = usable.iter().find(|f| f.index() >= n_features) {
            return Err(RfError::FeatureIndexOutOfRange {
                index: bad.index(),
                n_features,
            });
        }
        if let Some(&position) = sample.iter().find(|&&p| p >= records.len()) {
            return Err(RfError::SamplePositionOutOfRange {
                position,
                n_records: records.len(),
            });
        }

        if sample.is_empty() {
            warn!("training decision tree on an empty sample; root stays a 0/0 leaf");
        }

        let mut arena: Vec<Node> = Vec::new();
        let root = build_tree(records, sample, usable, &self.feature_names, &mut arena);
        debug_assert_eq!(root, NodeIndex::ROOT);

        debug!(
            n_nodes = arena.len(),
            depth = arena_depth(&arena),
            "decision tree built"
        );

        self.nodes = arena;
        self.trained = true;
        Ok(())
    }

    /// Decide the label of a record.
    ///
    /// Walks from the root, going left when the node's split feature is `true`
    /// in the record, and returns the leaf's strict majority (ties are `false`).
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::RecordLengthMismatch`] | the record is not `n_features + 1` wide |
    /// | [`RfError::UnknownSplitFeature`] | a split names a feature absent from the list |
    pub fn decide(&self, record: &Record) -> Result<bool, RfError> {
        let expected = self.feature_names.len() + 1;
        if record.len() != expected {
            return Err(RfError::RecordLengthMismatch {
                record_index: 0,
                expected,
                got: record.len(),
            });
        }
        let leaf = self.traverse(record)?;
        Ok(self.nodes[leaf.index()].counts().majority())
    }

    /// Decide every record and tally the outcome against the labels.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::RecordLengthMismatch`] for the first record of the
    /// wrong width, with `record_index` set to its position, before deciding
    /// anything.
    pub fn evaluate(&self, records: &[Record]) -> Result<Evaluation, RfError> {
        validate_widths(records, self.feature_names.len())?;
        let mut evaluation = Evaluation::default();
        for record in records {
            evaluation.add(self.decide(record)?, record.label());
        }
        Ok(evaluation)
    }

    /// Check the arena invariants a grown tree satisfies.
    ///
    /// Nodes are laid out in pre-order, so every child sits after its parent.
    /// That rules out cycles and dangling children.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`RfError::EmptyTree`] | the arena has no root |
    /// | [`RfError::InvalidChildIndex`] | a child is out of range or not after its parent |
    /// | [`RfError::UnknownSplitFeature`] | a split names a feature absent from the list |
    pub fn validate(&self) -> Result<(), RfError> {
        if self.nodes.is_empty() {
            return Err(RfError::EmptyTree);
        }
        let n_nodes = self.nodes.len();
        for (node, entry) in self.nodes.iter().enumerate() {
            let Node::Split {
                feature,
                left,
                right,
                ..
            } = entry
            else {
                continue;
            };
            if !self.feature_names.iter().any(|name| name == feature) {
                return Err(RfError::UnknownSplitFeature {
                    name: feature.clone(),
                });
            }
            for child in [left.index(), right.index()] {
                if child <= node || child >= n_nodes {
                    return Err(RfError::InvalidChildIndex {
                        node,
                        child,
                        n_nodes,
                    });
                }
            }
        }
        Ok(())
    }

    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[NodeIndex::ROOT.index()]
    }

    /// Return a node by arena index.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.index())
    }

    /// Return every node in arena order (root first).
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the ordered feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return `true` once the tree has been grown.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Mutual information of a committed split, recomputed from stored counts.
    ///
    /// Returns `None` for a leaf or an unknown index.
    #[must_use]
    pub fn split_gain(&self, index: NodeIndex) -> Option<f64> {
        let (left, right) = self.node(index)?.children()?;
        let left = self.node(left)?.counts();
        let right = self.node(right)?.counts();
        Some(self.nodes[index.index()].counts().mutual_information(&left, &right))
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        arena_depth(&self.nodes)
    }

    /// Return the arena index of the leaf a record lands in.
    fn traverse(&self, record: &Record) -> Result<NodeIndex, RfError> {
        let mut idx = NodeIndex::ROOT;
        loop {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => return Ok(idx),
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    let column = self
                        .feature_names
                        .iter()
                        .position(|name| name == feature)
                        .ok_or_else(|| RfError::UnknownSplitFeature {
                            name: feature.clone(),
                        })?;
                    idx = if record.features()[column] { *left } else { *right };
                }
            }
        }
    }
}

/// Recursively build the arena-based decision tree.
///
/// Returns the [`NodeIndex`] of the node just created in `arena`.
fn build_tree(
    records: &[Record],
    sample: &[usize],
    usable: BTreeSet<FeatureIndex>,
    feature_names: &[String],
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let mut counts = ClassCounts::default();
    for &pos in sample {
        counts.add(records[pos].label());
    }

    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let idx = arena.len();
        arena.push(Node::Leaf { counts });
        NodeIndex::new(idx)
    };

    if counts.is_pure() || usable.is_empty() {
        return make_leaf(arena);
    }

    let Some(best) = find_best_split(records, sample, &usable, &counts) else {
        return make_leaf(arena);
    };

    // Arena pattern: reserve index, recurse, then overwrite with the split.
    let node_idx = arena.len();
    arena.push(Node::Leaf { counts });

    let (left_sample, right_sample) = partition(records, sample, best.feature);
    debug_assert_eq!(left_sample.len(), best.left.total());
    debug_assert_eq!(right_sample.len(), best.right.total());

    let mut remaining = usable;
    remaining.remove(&best.feature);

    let left = build_tree(records, &left_sample, remaining.clone(), feature_names, arena);
    let right = build_tree(records, &right_sample, remaining, feature_names, arena);

    arena[node_idx] = Node::Split {
        feature: feature_names[best.feature.index()].clone(),
        counts,
        left,
        right,
    };

    NodeIndex::new(node_idx)
}

/// Maximum depth of an arena rooted at index 0, via BFS.
fn arena_depth(nodes: &[Node]) -> usize {
    if nodes.is_empty() {
        return 0;
    }

    let mut max_depth = 0usize;
    let mut queue = VecDeque::new();
    queue.push_back((NodeIndex::ROOT, 0usize));

    while let Some((idx, d)) = queue.pop_front() {
        match &nodes[idx.index()] {
            Node::Leaf { .. } => max_depth = max_depth.max(d),
            Node::Split { left, right, .. } => {
                queue.push_back((*left, d + 1));
                queue.push_back((*right, d + 1));
            }
        }
    }

    max_depth
}
