//! Command line argument parsing for the rater CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Review text used by `rater check`.
pub const SAMPLE_REVIEW: &str = "The faculty explains concepts very clearly and is approachable";

/// Rater - predict faculty review ratings from review text
#[derive(Parser, Debug, Clone)]
#[command(name = "rater")]
#[command(about = "Train and query a faculty review rating classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RaterArgs {
    /// Increase log detail (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the trained artifacts
    #[arg(long, value_name = "DIR", env = "RATER_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RaterArgs {
    /// Get the effective verbosity level (0=quiet, 1=normal, 2=info, 3+=debug)
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train the vectorizer and classifier on a labeled CSV and save them
    Train(TrainArgs),

    /// Predict the rating of a review
    Predict(PredictArgs),

    /// Measure the saved model on a labeled CSV
    Evaluate(EvaluateArgs),

    /// Run a sample review through the saved model
    Check(CheckArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Training CSV (default: data/faculty_reviews.csv)
    #[arg(long, value_name = "CSV_FILE")]
    pub corpus: Option<PathBuf>,

    /// Iteration cap for the optimizer
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Minimum number of reviews a term must appear in
    #[arg(long)]
    pub min_df: Option<usize>,

    /// Header of the review text column
    #[arg(long)]
    pub text_column: Option<String>,

    /// Header of the rating column
    #[arg(long)]
    pub label_column: Option<String>,

    /// Hold out this fraction of the corpus and report accuracy on it
    #[arg(long, value_name = "RATIO")]
    pub holdout: Option<f64>,

    /// Seed for the holdout shuffle
    #[arg(long, default_value = "42", requires = "holdout")]
    pub seed: u64,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Review text
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Labeled CSV to evaluate on (default: the configured corpus)
    #[arg(long, value_name = "CSV_FILE")]
    pub corpus: Option<PathBuf>,
}

/// Arguments for the sample check
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Review text to try instead of the built-in sample
    #[arg(long, default_value = SAMPLE_REVIEW)]
    pub text: String,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
