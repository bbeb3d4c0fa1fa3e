//! Training configuration.
//!
//! Every field has a default, so a configuration file only needs the values
//! it changes:
//!
//! ```json
//! {
//!   "fake_path": "data/Fake.csv",
//!   "real_path": "data/True.csv",
//!   "vectorizer": { "max_features": 10000 },
//!   "classifier": { "c": 0.5 }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::csv::CsvColumns;
use crate::corpus::split::{DEFAULT_SEED, DEFAULT_TEST_SIZE};
use crate::error::{Result, VerityError};
use crate::ml::logistic::LogisticRegressionParams;
use crate::ml::tfidf::VectorizerParams;
use crate::storage::DEFAULT_MODEL_DIR;

/// Configuration of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// CSV dataset of fake articles.
    pub fake_path: PathBuf,
    /// CSV dataset of real articles.
    pub real_path: PathBuf,
    /// Directory the artifact set is written to.
    pub output_dir: PathBuf,
    pub columns: CsvColumns,
    /// Fraction of the corpus held out for evaluation.
    pub test_size: f64,
    /// Seed for shuffling and splitting.
    pub seed: u64,
    pub vectorizer: VectorizerParams,
    pub classifier: LogisticRegressionParams,
    /// Worker threads for tokenizing; defaults to the number of CPUs.
    pub threads: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            fake_path: PathBuf::from("data/Fake.csv"),
            real_path: PathBuf::from("data/True.csv"),
            output_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            columns: CsvColumns::default(),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            vectorizer: VectorizerParams::default(),
            classifier: LogisticRegressionParams::default(),
            threads: None,
        }
    }
}

impl TrainingConfig {
    /// Create a configuration for the given datasets with default settings.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(fake_path: P, real_path: Q) -> Self {
        Self {
            fake_path: fake_path.into(),
            real_path: real_path.into(),
            ..Default::default()
        }
    }

    /// Set the output directory.
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: TrainingConfig = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of worker threads to use.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Check every setting before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(VerityError::invalid_config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.threads == Some(0) {
            return Err(VerityError::invalid_config("threads must be positive"));
        }
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        Ok(())
    }
}
