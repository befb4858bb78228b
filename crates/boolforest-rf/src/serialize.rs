//! Model serialization: bincode files with a versioned envelope, plus JSON.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::tree::DecisionTree;

/// Current binary format version.
pub const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of trees in the forest.
    n_trees: usize,
    /// Feature column names.
    feature_names: Vec<String>,
    /// The serialized forest.
    forest: RandomForest,
}

impl RandomForest {
    /// Save the model to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            feature_names: self.feature_names().to_vec(),
            forest: self.clone(),
        };

        let bytes =
            bincode::serialize(&envelope).map_err(|e| RfError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| RfError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = self.trees.len(),
            "model saved"
        );

        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed, or the forest fails [`RandomForest::validate`] |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| RfError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| RfError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(
            n_trees = envelope.n_trees,
            n_features = envelope.feature_names.len(),
            "model loaded"
        );

        Ok(envelope.forest)
    }

    /// Render the forest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, RfError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a forest from JSON produced by [`RandomForest::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`RfError::Json`] on malformed input, including a forest that
    /// fails [`RandomForest::validate`].
    pub fn from_json(json: &str) -> Result<Self, RfError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl DecisionTree {
    /// Render the tree as single-line JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, RfError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a tree from JSON produced by [`DecisionTree::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`RfError::Json`] on malformed input, including a tree that
    /// fails [`DecisionTree::validate`].
    pub fn from_json(json: &str) -> Result<Self, RfError> {
        Ok(serde_json::from_str(json)?)
    }
}
