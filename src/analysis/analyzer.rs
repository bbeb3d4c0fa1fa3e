//! Analyzer implementations that combine tokenizers and filters.
//!
//! An analyzer is the complete path from normalized text to the tokens the
//! vectorizer counts:
//!
//! ```text
//! Normalized Text → Analyzer → Token Stream → TfIdfVectorizer
//!                      ↓
//!                  Tokenizer
//!                      ↓
//!                  Filter 1..N
//! ```
//!
//! # Available Implementations
//!
//! - [`pipeline::PipelineAnalyzer`] - Custom tokenizer + filter chains
//! - [`english::EnglishAnalyzer`] - Regex word tokenizer + English stop words
//!
//! # Examples
//!
//! ```
//! use verity::analysis::analyzer::Analyzer;
//! use verity::analysis::analyzer::english::EnglishAnalyzer;
//!
//! let analyzer = EnglishAnalyzer::new().unwrap();
//! let tokens: Vec<_> = analyzer.analyze("the senate passed a bill").unwrap().collect();
//!
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[0].text, "senate");
//! assert_eq!(tokens[1].text, "passed");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// The trait requires `Send + Sync`: a fitted vectorizer shares its analyzer
/// with every concurrent prediction call.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Analyze `text` and collect just the token texts.
    fn analyze_terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}

pub mod english;
pub mod pipeline;

pub use english::EnglishAnalyzer;
pub use pipeline::PipelineAnalyzer;
