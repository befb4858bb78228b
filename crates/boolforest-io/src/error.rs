//! I/O error types for boolforest-io.

use std::path::PathBuf;

/// Errors from CSV record loading, performance logs and tree bundles.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the header row has no columns, so there is no label column.
    #[error("no label column in header of {path}")]
    MissingLabelColumn {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error(
        "inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}"
    )]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell is not `true` or `false`.
    #[error("invalid boolean in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    InvalidBoolean {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Header name of the offending column.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when parsed rows do not form a valid dataset.
    #[error("invalid dataset in {path}")]
    InvalidDataset {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying model-layer error.
        source: boolforest_rf::RfError,
    },

    /// Returned when a tree bundle line is not a valid serialized tree.
    #[error("invalid tree on line {line} of bundle {path}")]
    ParseTree {
        /// Path to the bundle file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a value cannot be encoded as JSON.
    #[error("cannot encode {what} as JSON")]
    EncodeJson {
        /// What was being encoded.
        what: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a performance log cannot be written as CSV.
    #[error("cannot write CSV file {path}")]
    WriteCsv {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}
