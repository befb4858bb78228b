use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use boolforest_io::{
    CsvRecordSource, ExperimentName, ModelFormat, PerformanceLog, ResultWriter, TreeBundle,
};
use boolforest_rf::{
    DEFAULT_SAMPLE_FRACTION, DecisionTree, Evaluation, FeatureIndex, ForestConfig, MaxFeatures,
    RandomForest, SamplingPlan, TrainingSummary, TreeSample,
};

#[derive(Parser)]
#[command(name = "boolforest")]
#[command(about = "Decision trees and random forests over boolean features")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel inference (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Per-tree sampling parameters.
#[derive(Args, Debug, Clone)]
struct SamplingArgs {
    /// Features per tree: "sqrt", "log2", "all" or a count
    #[arg(long, default_value = "sqrt", value_parser = parse_max_features)]
    max_features: MaxFeatures,

    /// Fraction of records drawn with replacement per tree, in (0, 1]
    #[arg(long, default_value_t = DEFAULT_SAMPLE_FRACTION)]
    sample_fraction: f64,
}

/// Where experiment artifacts go.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Bin,
    Json,
}

impl From<FormatArg> for ModelFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Bin => ModelFormat::Bin,
            FormatArg::Json => ModelFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train a random forest, logging held-out accuracy after every tree
    Train {
        /// Path to the training CSV (features..., label)
        #[arg(long)]
        data: PathBuf,

        /// Number of trees to grow
        #[arg(long, default_value_t = 30)]
        n_trees: usize,

        /// Model file format
        #[arg(long, value_enum, default_value_t = FormatArg::Bin)]
        format: FormatArg,

        #[command(flatten)]
        sampling: SamplingArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Evaluate a saved forest on unseen labeled records
    Test {
        /// Path to the saved model (.bin or .json)
        #[arg(long)]
        model: PathBuf,

        /// Path to the test CSV (features..., label)
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Train one decision tree on all features and report its test error
    Tree {
        /// Path to the training CSV
        #[arg(long)]
        train: PathBuf,

        /// Path to the test CSV
        #[arg(long)]
        test: PathBuf,
    },

    /// Grow one tree on a random feature subset and record sample, appending it to a bundle
    GrowTree {
        /// Path to the training CSV
        #[arg(long)]
        data: PathBuf,

        /// Bundle file the tree is appended to (one JSON tree per line)
        #[arg(long)]
        bundle: PathBuf,

        /// Worker number; selects an independent random stream under --seed
        #[arg(long, default_value_t = 0)]
        worker: u64,

        #[command(flatten)]
        sampling: SamplingArgs,
    },

    /// Assemble a bundle of trees into one forest model
    Merge {
        /// Bundle file written by grow-tree
        #[arg(long)]
        bundle: PathBuf,

        /// Model file format
        #[arg(long, value_enum, default_value_t = FormatArg::Bin)]
        format: FormatArg,

        #[command(flatten)]
        output: OutputArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    model: PathBuf,
    #[serde(flatten)]
    summary: TrainingSummary,
}

#[derive(Serialize)]
struct TestOutput {
    model: PathBuf,
    n_records: usize,
    n_trees: usize,
    accuracy: Option<f64>,
    error_rate: Option<f64>,
    evaluation: Evaluation,
}

#[derive(Serialize)]
struct TreeOutput {
    n_features: usize,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    root_feature: Option<String>,
    train_accuracy: Option<f64>,
    test_error_rate: Option<f64>,
}

#[derive(Serialize)]
struct GrowOutput {
    worker: u64,
    bundle: PathBuf,
    features: Vec<String>,
    n_in_bag: usize,
    n_held_out: usize,
    n_nodes: usize,
    held_out_accuracy: Option<f64>,
}

#[derive(Serialize)]
struct MergeOutput {
    experiment: String,
    model: PathBuf,
    n_trees: usize,
    n_features: usize,
}

fn parse_max_features(s: &str) -> Result<MaxFeatures, String> {
    match s.to_ascii_lowercase().as_str() {
        "sqrt" => Ok(MaxFeatures::Sqrt),
        "log2" => Ok(MaxFeatures::Log2),
        "all" => Ok(MaxFeatures::All),
        other => other
            .parse::<usize>()
            .map(MaxFeatures::Fixed)
            .map_err(|_| format!("expected sqrt, log2, all or a count, got \"{s}\"")),
    }
}

fn save_model(forest: &RandomForest, path: &Path, format: ModelFormat) -> Result<()> {
    match format {
        ModelFormat::Bin => forest.save(path)?,
        ModelFormat::Json => std::fs::write(path, forest.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?,
    }
    info!(path = %path.display(), %format, "model saved");
    Ok(())
}

fn load_model(path: &Path) -> Result<RandomForest> {
    let forest = match ModelFormat::from_path(path) {
        ModelFormat::Bin => RandomForest::load(path)?,
        ModelFormat::Json => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RandomForest::from_json(&json)?
        }
    };
    Ok(forest)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            n_trees,
            format,
            sampling,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;
            let format = ModelFormat::from(format);

            let config = ForestConfig::new(n_trees)?
                .with_max_features(sampling.max_features)
                .with_sample_fraction(sampling.sample_fraction)
                .with_seed(cli.seed);

            // 1. Train, collecting the held-out curve
            let source = CsvRecordSource::new(&data);
            let mut forest = RandomForest::new(config);
            let mut log = PerformanceLog::new();
            let summary = forest
                .train(&source, &mut log)
                .context("random forest training failed")?;

            // 2. Write artifacts
            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            writer.write_performance(&log)?;
            let model = writer.model_path(format);
            save_model(&forest, &model, format).context("failed to save model")?;
            let output = TrainOutput {
                model,
                summary,
            };
            writer.write_summary(&output)?;

            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Test {
            model,
            data,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;

            let forest = load_model(&model).context("failed to load model")?;
            info!(
                n_trees = forest.n_trees(),
                n_features = forest.feature_names().len(),
                "model loaded"
            );

            let source = CsvRecordSource::new(&data);
            let mut log = PerformanceLog::new();
            let evaluation = forest
                .test(&source, &mut log)
                .context("random forest test failed")?;

            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            writer.write_performance(&log)?;
            let output = TestOutput {
                model,
                n_records: evaluation.total(),
                n_trees: forest.n_trees(),
                accuracy: evaluation.accuracy(),
                error_rate: evaluation.error_rate(),
                evaluation,
            };
            writer.write_summary(&output)?;

            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Tree { train, test } => {
            let train_data = CsvRecordSource::new(&train)
                .read()
                .context("failed to read training CSV")?;
            let test_data = CsvRecordSource::new(&test)
                .read()
                .context("failed to read test CSV")?;
            if train_data.feature_names() != test_data.feature_names() {
                bail!(
                    "test features {:?} differ from training features {:?}",
                    test_data.feature_names(),
                    train_data.feature_names()
                );
            }

            let n_features = train_data.n_features();
            let mut tree = DecisionTree::new(train_data.feature_names().to_vec());
            tree.train(train_data.records(), (0..n_features).map(FeatureIndex::new))
                .context("decision tree training failed")?;

            let train_eval = tree.evaluate(train_data.records())?;
            let test_eval = tree.evaluate(test_data.records())?;
            info!(
                n_nodes = tree.n_nodes(),
                test_error_rate = ?test_eval.error_rate(),
                "decision tree evaluated"
            );

            let output = TreeOutput {
                n_features,
                n_nodes: tree.n_nodes(),
                n_leaves: tree.n_leaves(),
                depth: tree.depth(),
                root_feature: tree.root().split_feature().map(str::to_string),
                train_accuracy: train_eval.accuracy(),
                test_error_rate: test_eval.error_rate(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::GrowTree {
            data,
            bundle,
            worker,
            sampling,
        } => {
            let config = ForestConfig::new(1)?
                .with_max_features(sampling.max_features)
                .with_sample_fraction(sampling.sample_fraction);
            config.validate()?;

            let dataset = CsvRecordSource::new(&data)
                .read()
                .context("failed to read training CSV")?;
            let plan = SamplingPlan::resolve(&config, dataset.n_features(), dataset.len());

            let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
            rng.set_stream(worker);
            let round = TreeSample::draw(&plan, dataset.n_features(), dataset.len(), &mut rng);

            let mut tree = DecisionTree::new(dataset.feature_names().to_vec());
            tree.train_sample(dataset.records(), &round.in_bag, round.features.iter().copied())
                .context("decision tree training failed")?;

            let held_out: Vec<_> = round
                .held_out
                .iter()
                .map(|&i| dataset.records()[i].clone())
                .collect();
            let held_out_eval = tree.evaluate(&held_out)?;

            TreeBundle::new(&bundle).append(&tree)?;
            info!(worker, bundle = %bundle.display(), "tree appended");

            let output = GrowOutput {
                worker,
                bundle,
                features: round
                    .features
                    .iter()
                    .map(|f| dataset.feature_names()[f.index()].clone())
                    .collect(),
                n_in_bag: round.in_bag.len(),
                n_held_out: held_out.len(),
                n_nodes: tree.n_nodes(),
                held_out_accuracy: held_out_eval.accuracy(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Merge {
            bundle,
            format,
            output,
        } => {
            let experiment_name = ExperimentName::new(output.experiment.clone())?;
            let format = ModelFormat::from(format);

            let trees = TreeBundle::new(&bundle)
                .read()
                .context("failed to read tree bundle")?;
            let Some(first) = trees.first() else {
                bail!("tree bundle {} is empty", bundle.display());
            };
            let feature_names = first.feature_names().to_vec();

            let config = ForestConfig::new(trees.len())?.with_seed(cli.seed);
            let forest = RandomForest::from_trees(config, feature_names, trees)
                .context("bundle trees disagree on features")?;

            let writer = ResultWriter::new(&output.output_dir, experiment_name)?;
            let model = writer.model_path(format);
            save_model(&forest, &model, format).context("failed to save model")?;

            let output = MergeOutput {
                experiment: output.experiment,
                model,
                n_trees: forest.n_trees(),
                n_features: forest.feature_names().len(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
