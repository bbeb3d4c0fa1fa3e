//! Error types for the Verity library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`VerityError`] enum. The variants separate the failure classes callers
//! need to tell apart: a model that cannot be loaded ([`VerityError::Load`])
//! is fatal for an inference session, while a malformed training corpus
//! ([`VerityError::Corpus`]) aborts a training run before anything is written.
//!
//! # Examples
//!
//! ```
//! use verity::error::{Result, VerityError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(VerityError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Verity operations.
#[derive(Error, Debug)]
pub enum VerityError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Analysis-related errors (invalid patterns, tokenization, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Malformed or unreadable training corpus
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Training could not produce a model (empty vocabulary, one class, etc.)
    #[error("Training error: {0}")]
    Training(String),

    /// Model misuse (dimension mismatch, inconsistent state)
    #[error("Model error: {0}")]
    Model(String),

    /// Persisted artifacts are missing or corrupt
    #[error("Load error: {0}")]
    Load(String),

    /// Artifact persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with VerityError.
pub type Result<T> = std::result::Result<T, VerityError>;

impl VerityError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        VerityError::Analysis(msg.into())
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        VerityError::Corpus(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        VerityError::Training(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        VerityError::Model(msg.into())
    }

    /// Create a new load error.
    pub fn load<S: Into<String>>(msg: S) -> Self {
        VerityError::Load(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        VerityError::Storage(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        VerityError::SerializationError(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        VerityError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        VerityError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Whether this error means the persisted model could not be loaded.
    pub fn is_load_error(&self) -> bool {
        matches!(self, VerityError::Load(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = VerityError::corpus("missing column `title`");
        assert_eq!(error.to_string(), "Corpus error: missing column `title`");

        let error = VerityError::load("vectorizer.bin not found");
        assert_eq!(error.to_string(), "Load error: vectorizer.bin not found");
        assert!(error.is_load_error());

        let error = VerityError::analysis("bad pattern");
        assert_eq!(error.to_string(), "Analysis error: bad pattern");
        assert!(!error.is_load_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let verity_error = VerityError::from(io_error);

        match verity_error {
            VerityError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
