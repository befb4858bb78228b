//! Labeled boolean records and the record-source seam.

use crate::error::RfError;
use crate::node::FeatureIndex;

/// A fixed-width boolean vector whose last element is the class label.
///
/// All preceding values are feature values, ordered like the feature-name list
/// of the tree or forest they are presented to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<bool>")]
pub struct Record(Vec<bool>);

impl TryFrom<Vec<bool>> for Record {
    type Error = RfError;

    fn try_from(values: Vec<bool>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl Record {
    /// Create a record from its raw values (features followed by the label).
    ///
    /// # Errors
    ///
    /// Returns [`RfError::EmptyRecord`] when `values` is empty.
    pub fn new(values: Vec<bool>) -> Result<Self, RfError> {
        if values.is_empty() {
            return Err(RfError::EmptyRecord);
        }
        Ok(Self(values))
    }

    /// Build a record from feature values and a label.
    #[must_use]
    pub fn labeled(features: &[bool], label: bool) -> Self {
        let mut values = Vec::with_capacity(features.len() + 1);
        values.extend_from_slice(features);
        values.push(label);
        Self(values)
    }

    /// Return the class label (the trailing value).
    #[must_use]
    pub fn label(&self) -> bool {
        self.0[self.0.len() - 1]
    }

    /// Return the feature values (everything except the label).
    #[must_use]
    pub fn features(&self) -> &[bool] {
        &self.0[..self.0.len() - 1]
    }

    /// Return the value of one feature.
    ///
    /// # Panics
    ///
    /// Panics if `feature` is not below [`Record::n_features`].
    #[must_use]
    pub fn feature(&self, feature: FeatureIndex) -> bool {
        self.features()[feature.index()]
    }

    /// Return the number of feature values.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.0.len() - 1
    }

    /// Return the total number of values, label included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: a record holds at least its label.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Return all raw values, label last.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

/// Check that every record carries exactly `n_features + 1` values.
pub(crate) fn validate_widths(records: &[Record], n_features: usize) -> Result<(), RfError> {
    for (record_index, record) in records.iter().enumerate() {
        if record.len() != n_features + 1 {
            return Err(RfError::RecordLengthMismatch {
                record_index,
                expected: n_features + 1,
                got: record.len(),
            });
        }
    }
    Ok(())
}

/// An ordered feature-name list plus the records described by it.
///
/// Feature names exclude the trailing label field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    feature_names: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Create a dataset, rejecting any record of the wrong width.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::RecordLengthMismatch`] for the first record whose
    /// length is not `feature_names.len() + 1`.
    pub fn new(feature_names: Vec<String>, records: Vec<Record>) -> Result<Self, RfError> {
        validate_widths(&records, feature_names.len())?;
        Ok(Self {
            feature_names,
            records,
        })
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the records.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Return the record at a position, if any.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// Return the number of features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Return `true` if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Anything that can hand the core a labeled [`Dataset`].
///
/// Whether the data comes from a delimited file, a column store or memory is
/// the implementor's concern. Implementors wrap their own failures with
/// [`RfError::from_source`].
pub trait RecordSource {
    /// Load the feature names and records.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::Source`] wrapping the collaborator failure, or a
    /// record validation error.
    fn load(&self) -> Result<Dataset, RfError>;
}

impl RecordSource for Dataset {
    fn load(&self) -> Result<Dataset, RfError> {
        Ok(self.clone())
    }
}
