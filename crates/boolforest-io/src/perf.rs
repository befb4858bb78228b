//! Accuracy-curve logs written as `trees,accuracy` CSV.

use std::path::Path;

use boolforest_rf::{AccuracyPoint, AccuracySink, Phase, TracingSink};
use serde::Serialize;
use tracing::{info, instrument};

use crate::IoError;

/// An [`AccuracySink`] that keeps every point for later export.
///
/// Each point is also logged through [`TracingSink`] as it arrives.
#[derive(Debug, Clone, Default)]
pub struct PerformanceLog {
    points: Vec<AccuracyPoint>,
}

impl PerformanceLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every point in arrival order.
    #[must_use]
    pub fn points(&self) -> &[AccuracyPoint] {
        &self.points
    }

    /// Return the points of one phase in arrival order.
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &AccuracyPoint> {
        self.points.iter().filter(move |p| p.phase == phase)
    }

    /// Write the points of `phase` to `path` as `trees,accuracy` rows.
    ///
    /// An undefined accuracy (empty evaluation set) is written as an empty cell.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteCsv`] if the file cannot be created or written.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn write_csv(&self, phase: Phase, path: &Path) -> Result<usize, IoError> {
        let csv_err = |e: csv::Error| IoError::WriteCsv {
            path: path.to_path_buf(),
            source: e,
        };

        let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
        let mut rows = 0;
        for point in self.phase(phase) {
            wtr.serialize(PerfRow {
                trees: point.n_trees,
                accuracy: point.accuracy,
            })
            .map_err(csv_err)?;
            rows += 1;
        }
        // A header is only emitted with the first row.
        if rows == 0 {
            wtr.write_record(["trees", "accuracy"]).map_err(csv_err)?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(rows, %phase, "performance log written");
        Ok(rows)
    }
}

impl AccuracySink for PerformanceLog {
    fn record(&mut self, point: AccuracyPoint) {
        TracingSink.record(point);
        self.points.push(point);
    }
}

#[derive(Serialize)]
struct PerfRow {
    trees: usize,
    accuracy: Option<f64>,
}
