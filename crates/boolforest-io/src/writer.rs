//! Output-file layout and writers for one experiment.

use std::fs;
use std::path::{Path, PathBuf};

use boolforest_rf::Phase;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::{ExperimentName, ModelFormat};
use crate::perf::PerformanceLog;
use crate::IoError;

/// Writes experiment artifacts under one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Files are named `{experiment}_model.{bin,json}`,
/// `{experiment}_validation_perf.csv`, `{experiment}_test_perf.csv` and
/// `{experiment}_summary.json`.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return the experiment name.
    #[must_use]
    pub fn experiment(&self) -> &ExperimentName {
        &self.experiment
    }

    /// Return the path where the model should be saved in `format`.
    ///
    /// Does not write anything.
    #[must_use]
    pub fn model_path(&self, format: ModelFormat) -> PathBuf {
        self.file(&format!("model.{}", format.extension()))
    }

    /// Return the path of the performance log for `phase`.
    #[must_use]
    pub fn perf_path(&self, phase: Phase) -> PathBuf {
        self.file(&format!("{phase}_perf.csv"))
    }

    /// Return the path of the JSON run summary.
    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.file("summary.json")
    }

    /// Write every phase present in `log` to its performance CSV.
    ///
    /// Returns the paths written, validation before test.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteCsv`] if a file cannot be written.
    #[instrument(skip_all)]
    pub fn write_performance(&self, log: &PerformanceLog) -> Result<Vec<PathBuf>, IoError> {
        let mut written = Vec::new();
        for phase in [Phase::Validation, Phase::Test] {
            if log.phase(phase).next().is_none() {
                continue;
            }
            let path = self.perf_path(phase);
            log.write_csv(phase, &path)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write `summary` to `{experiment}_summary.json`, tagged with the experiment name.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::EncodeJson`] | the summary cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all)]
    pub fn write_summary<T: Serialize>(&self, summary: &T) -> Result<PathBuf, IoError> {
        let path = self.summary_path();
        let artifact = SummaryArtifact {
            experiment: self.experiment.as_str(),
            summary,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::EncodeJson {
            what: "run summary",
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "summary written");
        Ok(path)
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }
}

#[derive(Serialize)]
struct SummaryArtifact<'a, T> {
    experiment: &'a str,
    #[serde(flatten)]
    summary: &'a T,
}

#[cfg(test)]
mod tests {
    use boolforest_rf::{AccuracyPoint, AccuracySink, Evaluation};
    use tempfile::TempDir;

    use super::*;

    #[derive(Serialize)]
    struct Dummy {
        n_trees: usize,
        accuracy: Option<f64>,
    }

    fn writer(dir: &Path, name: &str) -> ResultWriter {
        ResultWriter::new(dir, ExperimentName::new(name.into()).unwrap()).unwrap()
    }

    #[test]
    fn paths_follow_experiment_name() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "exp1");
        assert_eq!(w.model_path(ModelFormat::Bin), dir.path().join("exp1_model.bin"));
        assert_eq!(w.model_path(ModelFormat::Json), dir.path().join("exp1_model.json"));
        assert_eq!(
            w.perf_path(Phase::Validation),
            dir.path().join("exp1_validation_perf.csv")
        );
        assert_eq!(w.perf_path(Phase::Test), dir.path().join("exp1_test_perf.csv"));
        assert_eq!(w.summary_path(), dir.path().join("exp1_summary.json"));
    }

    #[test]
    fn summary_json_structure() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "sum_test");
        let path = w
            .write_summary(&Dummy {
                n_trees: 3,
                accuracy: Some(0.75),
            })
            .unwrap();

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["experiment"], "sum_test");
        assert_eq!(content["n_trees"], 3);
        assert_eq!(content["accuracy"], 0.75);
    }

    #[test]
    fn performance_written_per_present_phase() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "perf");
        let mut log = PerformanceLog::new();
        log.record(AccuracyPoint::new(
            Phase::Validation,
            1,
            Evaluation::from_pairs([(true, true)]),
        ));

        let written = w.write_performance(&log).unwrap();
        assert_eq!(written, vec![dir.path().join("perf_validation_perf.csv")]);
        assert!(!w.perf_path(Phase::Test).exists());
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("deep");
        let w = writer(&nested, "nested_test");
        w.write_summary(&Dummy {
            n_trees: 1,
            accuracy: None,
        })
        .unwrap();
        assert!(nested.join("nested_test_summary.json").exists());
    }
}
