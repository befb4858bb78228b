use std::path::PathBuf;

/// Errors from decision tree and random forest operations.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when a fixed feature-subset size is zero.
    #[error("max_features must be at least 1, got {max_features}")]
    InvalidMaxFeatures {
        /// The invalid max_features value.
        max_features: usize,
    },

    /// Returned when sample_fraction is not in (0.0, 1.0].
    #[error("sample_fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidSampleFraction {
        /// The invalid sample_fraction value provided.
        fraction: f64,
    },

    /// Returned when a record holds no values at all (not even a label).
    #[error("record has no values; at least a label is required")]
    EmptyRecord,

    /// Returned when a record's width does not match the feature list.
    #[error("record {record_index} has {got} values, expected {expected} (features + label)")]
    RecordLengthMismatch {
        /// Zero-based position of the offending record.
        record_index: usize,
        /// Expected number of values (feature count + 1).
        expected: usize,
        /// Actual number of values in the record.
        got: usize,
    },

    /// Returned when a usable feature index does not address a known feature.
    #[error("feature index {index} is out of range for {n_features} features")]
    FeatureIndexOutOfRange {
        /// The offending feature index.
        index: usize,
        /// Number of known features.
        n_features: usize,
    },

    /// Returned when a training sample refers to a record that does not exist.
    #[error("sample position {position} is out of range for {n_records} records")]
    SamplePositionOutOfRange {
        /// The offending record position.
        position: usize,
        /// Number of records available.
        n_records: usize,
    },

    /// Returned when an internal node names a feature absent from the tree's list.
    ///
    /// Indicates the tree was trained against a different feature list than the
    /// one used for inference.
    #[error("split feature \"{name}\" is not in the tree's feature list")]
    UnknownSplitFeature {
        /// The split-feature name recorded on the node.
        name: String,
    },

    /// Returned when a deserialized tree has no nodes.
    #[error("decision tree has no nodes")]
    EmptyTree,

    /// Returned when a split's child does not address a later node in the arena.
    #[error("node {node} has child {child}, which is not a later node of {n_nodes}")]
    InvalidChildIndex {
        /// Arena index of the split.
        node: usize,
        /// The offending child index.
        child: usize,
        /// Number of nodes in the arena.
        n_nodes: usize,
    },

    /// Returned when `train` is called on a tree that has already been grown.
    #[error("decision tree has already been trained")]
    TreeAlreadyTrained,

    /// Returned when two feature lists that must agree differ.
    #[error("feature list mismatch: expected {expected:?}, got {got:?}")]
    FeatureListMismatch {
        /// The feature list already fixed on the model.
        expected: Vec<String>,
        /// The conflicting feature list.
        got: Vec<String>,
    },

    /// Returned when a record source collaborator fails.
    #[error("record source failed")]
    Source {
        /// The collaborator's own error, uninterpreted.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when JSON export or import fails.
    #[error("JSON model (de)serialization failed")]
    Json {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}

impl RfError {
    /// Wrap a collaborator error so it propagates through the core unchanged.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RfError::Source {
            source: Box::new(err),
        }
    }
}
