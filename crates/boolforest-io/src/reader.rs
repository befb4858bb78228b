//! CSV boolean record reader with full input validation.

use std::path::{Path, PathBuf};

use boolforest_rf::{Dataset, Record, RecordSource, RfError};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads labeled boolean records from a CSV file.
///
/// Expected CSV format:
/// - Header row required: feature names, then the label column name last
/// - `f0,f1,...,fn,label`
/// - Every cell is `true` or `false` (case-insensitive, surrounding whitespace ignored)
/// - All rows must have the same number of columns as the header
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingLabelColumn`] | Header row has no columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidBoolean`] | Cell is not `true` or `false` |
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Return the CSV file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets our own InconsistentRowLength check fire instead
        // of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        if expected_cols == 0 {
            return Err(IoError::MissingLabelColumn {
                path: self.path.clone(),
            });
        }
        let n_features = expected_cols - 1;
        let feature_names: Vec<String> =
            header.iter().take(n_features).map(str::to_string).collect();
        debug!(
            n_features,
            label_column = header.get(n_features).unwrap_or(""),
            "read CSV header"
        );

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| self.csv_error(e))?;

            if row.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: row.len(),
                });
            }

            let mut values: Vec<bool> = Vec::with_capacity(expected_cols);
            for (col_index, raw) in row.iter().enumerate() {
                let value = parse_bool(raw).ok_or_else(|| IoError::InvalidBoolean {
                    path: self.path.clone(),
                    row_index,
                    column: header.get(col_index).unwrap_or("").to_string(),
                    raw: raw.to_string(),
                })?;
                values.push(value);
            }
            let label = values.pop().unwrap_or(false);
            records.push(Record::labeled(&values, label));
        }

        if records.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let positives = records.iter().filter(|r| r.label()).count();
        info!(
            n_records = records.len(),
            n_features,
            positives,
            "dataset loaded"
        );

        Dataset::new(feature_names, records).map_err(|e| IoError::InvalidDataset {
            path: self.path.clone(),
            source: e,
        })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

impl RecordSource for CsvRecordSource {
    fn load(&self) -> Result<Dataset, RfError> {
        self.read().map_err(RfError::from_source)
    }
}

/// Parse `true` / `false`, ignoring ASCII case and surrounding whitespace.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
