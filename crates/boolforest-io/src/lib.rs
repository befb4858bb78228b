//! File I/O for boolforest: CSV record sources, accuracy logs, tree bundles
//! and experiment output layout.

mod bundle;
mod domain;
mod error;
mod perf;
mod reader;
mod writer;

pub use bundle::TreeBundle;
pub use domain::{ExperimentName, ModelFormat};
pub use error::IoError;
pub use perf::PerformanceLog;
pub use reader::CsvRecordSource;
pub use writer::ResultWriter;
