//! Text analysis module for Verity.
//!
//! Normalization of raw article text plus the tokenizer/filter pipeline the
//! vectorizer uses to turn normalized text into terms.

pub mod analyzer;
pub mod char_filter;
pub mod normalizer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
