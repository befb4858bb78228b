//! Tree bundles: one serialized decision tree per JSON line.
//!
//! Independent workers each grow one tree and append it to a bundle. A
//! combining step reads the bundle back and assembles the forest.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use boolforest_rf::DecisionTree;
use tracing::{debug, info, instrument};

use crate::IoError;

/// A JSON-lines file of decision trees.
#[derive(Debug, Clone)]
pub struct TreeBundle {
    path: PathBuf,
}

impl TreeBundle {
    /// Refer to the bundle at `path`. Nothing is opened yet.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Return the bundle file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one tree as a single line, creating the file if needed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::EncodeJson`] | the tree cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be opened or written |
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn append(&self, tree: &DecisionTree) -> Result<(), IoError> {
        let line = serde_json::to_string(tree).map_err(|e| IoError::EncodeJson {
            what: "decision tree",
            source: e,
        })?;
        let write_err = |e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        writeln!(file, "{line}").map_err(write_err)?;

        debug!(n_nodes = tree.n_nodes(), "tree appended to bundle");
        Ok(())
    }

    /// Read every tree in file order. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | the file cannot be read |
    /// | [`IoError::ParseTree`] | a line is not a well-formed serialized tree |
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<DecisionTree>, IoError> {
        let content = fs::read_to_string(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let mut trees = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let tree = serde_json::from_str(line).map_err(|e| IoError::ParseTree {
                path: self.path.clone(),
                line: i + 1,
                source: e,
            })?;
            trees.push(tree);
        }

        info!(n_trees = trees.len(), "tree bundle read");
        Ok(trees)
    }
}
