//! English analyzer used by the TF-IDF vectorizer.
//!
//! # Pipeline
//!
//! 1. RegexTokenizer (words of two or more word characters by default)
//! 2. StopFilter (318 English stop words), unless disabled
//!
//! Input is expected to be normalized already (see
//! [`normalize`](crate::analysis::normalizer::normalize)), so no casing or
//! punctuation handling happens here.

use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::regex::{DEFAULT_TOKEN_PATTERN, RegexTokenizer};
use crate::error::Result;

/// An analyzer for normalized English article text.
pub struct EnglishAnalyzer {
    inner: PipelineAnalyzer,
}

impl EnglishAnalyzer {
    /// Create an analyzer with the default token pattern and stop words.
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_TOKEN_PATTERN, true)
    }

    /// Create an analyzer with a custom token pattern, optionally keeping stop words.
    pub fn with_options(token_pattern: &str, remove_stop_words: bool) -> Result<Self> {
        let tokenizer = Arc::new(RegexTokenizer::with_pattern(token_pattern)?);
        let mut analyzer = PipelineAnalyzer::new(tokenizer);
        if remove_stop_words {
            analyzer = analyzer
                .add_filter(Arc::new(StopFilter::new()))
                .with_name("english");
        } else {
            analyzer = analyzer.with_name("english_no_stop");
        }

        Ok(EnglishAnalyzer { inner: analyzer })
    }

    /// Get the inner pipeline analyzer.
    pub fn inner(&self) -> &PipelineAnalyzer {
        &self.inner
    }
}

impl Analyzer for EnglishAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "english"
    }
}

impl std::fmt::Debug for EnglishAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnglishAnalyzer")
            .field("inner", &self.inner)
            .finish()
    }
}
