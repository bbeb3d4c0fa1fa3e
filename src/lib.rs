//! # Verity
//!
//! A fake news classifier for Rust: text normalization, TF-IDF features and
//! L2-regularized logistic regression.
//!
//! ## Features
//!
//! - Deterministic training from labeled CSV datasets
//! - Held-out evaluation with a per-class classification report
//! - Versioned, checksummed model artifacts with atomic replacement
//! - Thread-safe inference service
//! - Command line interface with human and JSON output

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod inference;
pub mod ml;
pub mod storage;
pub mod training;

pub mod prelude {
    pub use crate::config::TrainingConfig;
    pub use crate::corpus::{Corpus, LabeledArticle, RawArticle};
    pub use crate::error::{Result, VerityError};
    pub use crate::inference::{InferenceService, LazyInferenceService};
    pub use crate::ml::{ClassificationReport, Label, PredictionResult};
    pub use crate::training::TrainingPipeline;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
