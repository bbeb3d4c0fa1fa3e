//! TF-IDF vectorizer for text feature extraction.
//!
//! Fitting builds a capped vocabulary from a corpus of normalized documents
//! and learns one inverse document frequency per term:
//!
//! ```text
//! idf(t) = ln((1 + n_documents) / (1 + df(t))) + 1
//! ```
//!
//! Transforming a document counts its in-vocabulary tokens, multiplies the
//! counts by the IDF weights and scales the result to unit length.
//!
//! # Examples
//!
//! ```
//! use verity::ml::tfidf::{TfIdfVectorizer, VectorizerParams};
//!
//! let corpus = ["senate passes budget", "senate rejects budget", "aliens land"];
//! let vectorizer = TfIdfVectorizer::fit(&corpus, VectorizerParams::default()).unwrap();
//!
//! assert_eq!(vectorizer.vocabulary(), &["aliens", "budget", "land", "passes", "rejects", "senate"]);
//!
//! let features = vectorizer.transform("budget budget unknown");
//! assert_eq!(features.nnz(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::english::EnglishAnalyzer;
use crate::analysis::tokenizer::regex::DEFAULT_TOKEN_PATTERN;
use crate::error::{Result, VerityError};
use crate::ml::features::FeatureVector;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Which stop-word list the analyzer removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    English,
    None,
}

/// Normalization applied to transformed vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L2,
    None,
}

/// Hyperparameters of the vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerParams {
    /// Keep only this many terms, ranked by document frequency.
    pub max_features: Option<usize>,
    /// Ignore terms that appear in fewer documents.
    pub min_df: usize,
    /// Ignore terms that appear in more than this fraction of documents.
    pub max_df: f64,
    /// Regex whose matches are the tokens.
    pub token_pattern: String,
    pub stop_words: StopWords,
    pub norm: Norm,
    /// Replace raw counts with `1 + ln(count)`.
    pub sublinear_tf: bool,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            max_features: Some(DEFAULT_MAX_FEATURES),
            min_df: 1,
            max_df: 1.0,
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            stop_words: StopWords::English,
            norm: Norm::L2,
            sublinear_tf: false,
        }
    }
}

impl VectorizerParams {
    /// Check that the parameters describe a usable vectorizer.
    pub fn validate(&self) -> Result<()> {
        if self.max_features == Some(0) {
            return Err(VerityError::invalid_config("max_features must be positive"));
        }
        if self.min_df == 0 {
            return Err(VerityError::invalid_config("min_df must be at least 1"));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(VerityError::invalid_config(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        Ok(())
    }

    /// Build the analyzer these parameters describe.
    pub fn build_analyzer(&self) -> Result<Arc<dyn Analyzer>> {
        let analyzer = EnglishAnalyzer::with_options(
            &self.token_pattern,
            self.stop_words == StopWords::English,
        )?;
        Ok(Arc::new(analyzer))
    }
}

/// Serializable part of a fitted vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerState {
    pub params: VectorizerParams,
    /// Terms in feature-index order.
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    pub n_documents: usize,
}

/// A fitted TF-IDF vectorizer.
#[derive(Clone)]
pub struct TfIdfVectorizer {
    params: VectorizerParams,
    vocabulary: Vec<String>,
    /// term -> feature index
    index: AHashMap<String, usize>,
    idf: Vec<f64>,
    n_documents: usize,
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Fit the vectorizer on (already normalized) training documents.
    pub fn fit<S>(documents: &[S], params: VectorizerParams) -> Result<Self>
    where
        S: AsRef<str> + Sync,
    {
        params.validate()?;
        if documents.is_empty() {
            return Err(VerityError::training(
                "cannot fit vectorizer on an empty corpus",
            ));
        }

        let analyzer = params.build_analyzer()?;
        let n_documents = documents.len();

        let term_sets: Vec<AHashSet<String>> = documents
            .par_iter()
            .map(|doc| Self::unique_terms(analyzer.as_ref(), doc.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        for terms in term_sets {
            for term in terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }
        let distinct_terms = document_frequency.len();

        let max_doc_count = params.max_df * n_documents as f64;
        let mut candidates: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= params.min_df && (*df as f64) <= max_doc_count)
            .collect();

        // Rank by document frequency, ties broken by the term itself.
        candidates.sort_by(|(term_a, df_a), (term_b, df_b)| {
            df_b.cmp(df_a).then_with(|| term_a.cmp(term_b))
        });
        if let Some(max_features) = params.max_features {
            candidates.truncate(max_features);
        }

        if candidates.is_empty() {
            return Err(VerityError::training(
                "empty vocabulary: every document is empty or contains only stop words",
            ));
        }

        candidates.sort_by(|(term_a, _), (term_b, _)| term_a.cmp(term_b));

        let idf: Vec<f64> = candidates
            .iter()
            .map(|(_, df)| ((n_documents as f64 + 1.0) / (*df as f64 + 1.0)).ln() + 1.0)
            .collect();
        let vocabulary: Vec<String> = candidates.into_iter().map(|(term, _)| term).collect();

        info!(
            "Fitted vectorizer: {} documents, {} distinct terms, {} kept",
            n_documents,
            distinct_terms,
            vocabulary.len()
        );

        Ok(Self::assemble(params, vocabulary, idf, n_documents, analyzer))
    }

    /// Rebuild a fitted vectorizer from its persisted state.
    pub fn from_state(state: VectorizerState) -> Result<Self> {
        let VectorizerState {
            params,
            vocabulary,
            idf,
            n_documents,
        } = state;

        params.validate()?;
        if vocabulary.is_empty() {
            return Err(VerityError::model("vectorizer state has an empty vocabulary"));
        }
        if vocabulary.len() != idf.len() {
            return Err(VerityError::model(format!(
                "vectorizer state has {} terms but {} idf weights",
                vocabulary.len(),
                idf.len()
            )));
        }
        if idf.iter().any(|w| !w.is_finite()) {
            return Err(VerityError::model("vectorizer state has non-finite idf weights"));
        }

        let analyzer = params.build_analyzer()?;
        let vectorizer = Self::assemble(params, vocabulary, idf, n_documents, analyzer);
        if vectorizer.index.len() != vectorizer.vocabulary.len() {
            return Err(VerityError::model("vectorizer state has duplicate terms"));
        }

        debug!(
            "Restored vectorizer with {} terms",
            vectorizer.vocabulary.len()
        );
        Ok(vectorizer)
    }

    /// Snapshot of everything needed to rebuild this vectorizer.
    pub fn state(&self) -> VectorizerState {
        VectorizerState {
            params: self.params.clone(),
            vocabulary: self.vocabulary.clone(),
            idf: self.idf.clone(),
            n_documents: self.n_documents,
        }
    }

    /// Transform one normalized document into its TF-IDF vector.
    ///
    /// Out-of-vocabulary tokens are ignored; a document without known terms
    /// maps to the all-zero vector.
    pub fn try_transform(&self, document: &str) -> Result<FeatureVector> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in self.analyzer.analyze(document)? {
            if let Some(&index) = self.index.get(&token.text) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let sublinear = self.params.sublinear_tf;
        let entries = counts.into_iter().map(|(index, count)| {
            let tf = if sublinear { 1.0 + count.ln() } else { count };
            (index, tf * self.idf[index])
        });

        let mut features = FeatureVector::from_sorted_entries(self.vocabulary.len(), entries);
        if self.params.norm == Norm::L2 {
            features.normalize_l2();
        }
        Ok(features)
    }

    /// Transform one normalized document into its TF-IDF vector.
    ///
    /// Analysis failures are logged and yield the all-zero vector.
    pub fn transform(&self, document: &str) -> FeatureVector {
        match self.try_transform(document) {
            Ok(features) => features,
            Err(e) => {
                warn!("Failed to analyze document, using empty features: {e}");
                FeatureVector::zeros(self.vocabulary.len())
            }
        }
    }

    /// Transform many documents in parallel, preserving order.
    pub fn transform_batch<S>(&self, documents: &[S]) -> Vec<FeatureVector>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|doc| self.transform(doc.as_ref()))
            .collect()
    }

    /// Number of features produced by [`transform`](Self::transform).
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Terms in feature-index order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Feature index of `term`, if it is in the vocabulary.
    pub fn feature_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }

    fn assemble(
        params: VectorizerParams,
        vocabulary: Vec<String>,
        idf: Vec<f64>,
        n_documents: usize,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        Self {
            params,
            vocabulary,
            index,
            idf,
            n_documents,
            analyzer,
        }
    }

    fn unique_terms(analyzer: &dyn Analyzer, text: &str) -> Result<AHashSet<String>> {
        Ok(analyzer
            .analyze(text)?
            .map(|token| token.text)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec![
            "senate passes budget bill",
            "senate rejects budget",
            "aliens land in nevada",
        ]
    }

    #[test]
    fn test_vocabulary_is_alphabetical() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        // "bill" and "in" are stop words
        assert_eq!(
            vectorizer.vocabulary(),
            &["aliens", "budget", "land", "nevada", "passes", "rejects", "senate"]
        );
        assert_eq!(vectorizer.feature_index("budget"), Some(1));
        assert_eq!(vectorizer.feature_index("bill"), None);
        assert_eq!(vectorizer.n_documents(), 3);
    }

    #[test]
    fn test_idf_weights() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        let senate = vectorizer.feature_index("senate").unwrap();
        let aliens = vectorizer.feature_index("aliens").unwrap();

        let expected_senate = (4.0f64 / 3.0).ln() + 1.0;
        let expected_aliens = (4.0f64 / 2.0).ln() + 1.0;
        assert!((vectorizer.idf()[senate] - expected_senate).abs() < 1e-12);
        assert!((vectorizer.idf()[aliens] - expected_aliens).abs() < 1e-12);
    }

    #[test]
    fn test_max_features_ranking() {
        let params = VectorizerParams {
            max_features: Some(3),
            ..Default::default()
        };
        let documents = vec!["zebra apple mango", "zebra apple kiwi", "zebra pear"];
        let vectorizer = TfIdfVectorizer::fit(&documents, params).unwrap();

        // zebra (3), apple (2), then the alphabetically first of the df=1 terms
        assert_eq!(vectorizer.vocabulary(), &["apple", "kiwi", "zebra"]);
    }

    #[test]
    fn test_min_and_max_df() {
        let params = VectorizerParams {
            min_df: 2,
            max_df: 0.9,
            ..Default::default()
        };
        let documents = vec!["zebra apple mango", "zebra apple kiwi", "zebra pear"];
        let vectorizer = TfIdfVectorizer::fit(&documents, params).unwrap();
        assert_eq!(vectorizer.vocabulary(), &["apple"]);
    }

    #[test]
    fn test_transform_is_unit_length() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        let features = vectorizer.transform("senate budget budget");
        assert_eq!(features.dimension(), vectorizer.vocabulary_size());
        assert_eq!(features.nnz(), 2);
        assert!((features.l2_norm() - 1.0).abs() < 1e-12);

        let budget = vectorizer.feature_index("budget").unwrap();
        let senate = vectorizer.feature_index("senate").unwrap();
        assert!((features.get(budget) - 2.0 * features.get(senate)).abs() < 1e-12);
    }

    #[test]
    fn test_sublinear_tf() {
        let params = VectorizerParams {
            sublinear_tf: true,
            norm: Norm::None,
            ..Default::default()
        };
        let vectorizer = TfIdfVectorizer::fit(&corpus(), params).unwrap();
        let features = vectorizer.transform("budget budget");
        let budget = vectorizer.feature_index("budget").unwrap();
        let expected = (1.0 + 2.0f64.ln()) * vectorizer.idf()[budget];
        assert!((features.get(budget) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_and_empty_text() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        assert!(vectorizer.transform("completely unrelated words").is_zero());
        assert!(vectorizer.transform("").is_zero());
        assert!(vectorizer.transform("the and of").is_zero());
    }

    #[test]
    fn test_active_features_are_known_terms_of_the_text() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        let text = "senate aliens vote budget budget";
        let features = vectorizer.transform(text);

        let active: Vec<&str> = features
            .iter()
            .filter(|(_, value)| *value != 0.0)
            .map(|(index, _)| vectorizer.vocabulary()[index].as_str())
            .collect();
        assert_eq!(active, vec!["aliens", "budget", "senate"]);
        assert_eq!(features.dimension(), vectorizer.vocabulary_size());
    }

    #[test]
    fn test_empty_vocabulary_is_training_error() {
        let documents = vec!["the and of", "a an"];
        let err = TfIdfVectorizer::fit(&documents, VectorizerParams::default()).unwrap_err();
        assert!(matches!(err, VerityError::Training(_)));

        let empty: Vec<&str> = Vec::new();
        let err = TfIdfVectorizer::fit(&empty, VectorizerParams::default()).unwrap_err();
        assert!(matches!(err, VerityError::Training(_)));
    }

    #[test]
    fn test_invalid_params() {
        let params = VectorizerParams {
            max_df: 0.0,
            ..Default::default()
        };
        assert!(TfIdfVectorizer::fit(&corpus(), params).is_err());
    }

    #[test]
    fn test_state_round_trip() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        let restored = TfIdfVectorizer::from_state(vectorizer.state()).unwrap();

        assert_eq!(restored.vocabulary(), vectorizer.vocabulary());
        assert_eq!(
            restored.transform("senate passes budget"),
            vectorizer.transform("senate passes budget")
        );
    }

    #[test]
    fn test_from_state_rejects_inconsistent_state() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();

        let mut state = vectorizer.state();
        state.idf.pop();
        assert!(TfIdfVectorizer::from_state(state).is_err());

        let mut state = vectorizer.state();
        state.vocabulary[1] = state.vocabulary[0].clone();
        assert!(TfIdfVectorizer::from_state(state).is_err());
    }

    #[test]
    fn test_transform_batch_preserves_order() {
        let vectorizer = TfIdfVectorizer::fit(&corpus(), VectorizerParams::default()).unwrap();
        let documents = vec!["senate", "aliens", "budget"];
        let batch = vectorizer.transform_batch(&documents);
        for (doc, features) in documents.iter().zip(&batch) {
            assert_eq!(&vectorizer.transform(doc), features);
        }
    }
}
