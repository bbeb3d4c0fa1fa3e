//! Command line argument parsing for the verity CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_MODEL_DIR;

/// Environment variable naming the model directory.
pub const MODEL_DIR_ENV: &str = "VERITY_MODEL_DIR";

/// Verity - classify news articles as real or fake
#[derive(Parser, Debug, Clone)]
#[command(name = "verity")]
#[command(about = "Classify news articles as real or fake with a TF-IDF + logistic regression model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct VerityArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl VerityArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from fake and real CSV datasets
    Train(TrainArgs),

    /// Classify an article
    Predict(PredictArgs),

    /// Score a saved model on labeled datasets without writing anything
    Evaluate(EvaluateArgs),

    /// Print the evaluation report of a saved model
    Report(ModelDirArgs),

    /// Show the manifest of a saved model
    Info(ModelDirArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// CSV file of fake articles
    #[arg(long, value_name = "FAKE_CSV")]
    pub fake: Option<PathBuf>,

    /// CSV file of real articles
    #[arg(long, value_name = "REAL_CSV")]
    pub real: Option<PathBuf>,

    /// Directory to write the model to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Fraction of articles held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Random seed for shuffling and splitting
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum vocabulary size
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Inverse regularization strength
    #[arg(long = "c", value_name = "C")]
    pub c: Option<f64>,

    /// Maximum optimizer iterations
    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Worker threads (default: number of CPUs)
    #[arg(long)]
    pub threads: Option<usize>,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Model directory
    #[arg(short, long, value_name = "DIR", env = MODEL_DIR_ENV, default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Article text (reads --file or standard input when omitted)
    #[arg(value_name = "TEXT", conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the article from a file
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Show text statistics and the normalized preview
    #[arg(long)]
    pub details: bool,
}

/// Arguments for evaluating a saved model
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// CSV file of fake articles
    #[arg(long, value_name = "FAKE_CSV")]
    pub fake: PathBuf,

    /// CSV file of real articles
    #[arg(long, value_name = "REAL_CSV")]
    pub real: PathBuf,

    /// Model directory
    #[arg(short, long, value_name = "DIR", env = MODEL_DIR_ENV, default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,
}

/// Arguments for commands that only need a model directory
#[derive(Parser, Debug, Clone)]
pub struct ModelDirArgs {
    /// Model directory
    #[arg(short, long, value_name = "DIR", env = MODEL_DIR_ENV, default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
