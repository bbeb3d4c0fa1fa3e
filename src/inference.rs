//! Online inference service.
//!
//! An [`InferenceService`] owns a loaded vectorizer and classifier and
//! scores arbitrary article text. It is immutable after construction,
//! cheaply cloneable and safe to share between threads.
//!
//! # Example
//!
//! ```no_run
//! use verity::inference::InferenceService;
//!
//! # fn main() -> verity::error::Result<()> {
//! let service = InferenceService::load("model")?;
//! let result = service.predict_news("According to a study published in a peer-reviewed journal...");
//! println!("{} ({:.1}% confident)", result.label, result.confidence() * 100.0);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use log::{debug, info};
use rayon::prelude::*;

use crate::analysis::normalizer::normalize;
use crate::corpus::LabeledArticle;
use crate::error::{Result, VerityError};
use crate::ml::features::FeatureVector;
use crate::ml::logistic::LogisticRegression;
use crate::ml::metrics::ClassificationReport;
use crate::ml::tfidf::TfIdfVectorizer;
use crate::ml::types::{Label, PredictionResult};
use crate::storage::{ArtifactStore, Manifest};

struct Inner {
    vectorizer: TfIdfVectorizer,
    classifier: LogisticRegression,
    manifest: Option<Manifest>,
}

/// Scores article text with a trained model.
#[derive(Clone)]
pub struct InferenceService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceService")
            .field("vectorizer", &self.inner.vectorizer)
            .field("features", &self.inner.classifier.dimension())
            .finish()
    }
}

impl InferenceService {
    /// Build a service from fitted components.
    pub fn new(vectorizer: TfIdfVectorizer, classifier: LogisticRegression) -> Result<Self> {
        if classifier.dimension() != vectorizer.vocabulary_size() {
            return Err(VerityError::model(format!(
                "classifier expects {} features but the vectorizer produces {}",
                classifier.dimension(),
                vectorizer.vocabulary_size()
            )));
        }
        Ok(Self::from_inner(Inner {
            vectorizer,
            classifier,
            manifest: None,
        }))
    }

    /// Load the artifact set in `dir`.
    ///
    /// Fails with [`VerityError::Load`] when any artifact is missing or
    /// corrupt; a partially loaded model is never returned.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let artifacts = ArtifactStore::new(dir).load()?;
        info!(
            "Loaded model from {} ({} features, trained {})",
            dir.display(),
            artifacts.vectorizer.vocabulary_size(),
            artifacts.manifest.created_at
        );

        Ok(Self::from_inner(Inner {
            vectorizer: artifacts.vectorizer,
            classifier: artifacts.classifier,
            manifest: Some(artifacts.manifest),
        }))
    }

    fn from_inner(inner: Inner) -> Self {
        InferenceService {
            inner: Arc::new(inner),
        }
    }

    /// Classify raw article text.
    ///
    /// Never fails: empty or unrecognizable text maps to the all-zero
    /// feature vector and a prediction driven by the bias alone.
    pub fn predict_news(&self, text: &str) -> PredictionResult {
        let features = self.features(text);
        let result = self.inner.classifier.predict(&features);
        debug!(
            "Predicted {} from {} active features (p_real={:.4})",
            result.label,
            features.nnz(),
            result.probability_real
        );
        result
    }

    /// Classify many texts in parallel; results keep the input order.
    pub fn predict_batch<S>(&self, texts: &[S]) -> Vec<PredictionResult>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.predict_news(text.as_ref()))
            .collect()
    }

    /// The feature vector the classifier sees for `text`.
    pub fn features(&self, text: &str) -> FeatureVector {
        self.inner.vectorizer.transform(&normalize(text))
    }

    /// Score labeled articles and summarize the results.
    pub fn evaluate(&self, articles: &[LabeledArticle]) -> Result<ClassificationReport> {
        let texts: Vec<String> = articles.par_iter().map(|a| a.article.text()).collect();
        let predicted: Vec<Label> = self
            .predict_batch(&texts)
            .into_iter()
            .map(|result| result.label)
            .collect();
        let actual: Vec<Label> = articles.iter().map(|a| a.label).collect();
        ClassificationReport::from_predictions(&actual, &predicted)
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.inner.vectorizer
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.inner.classifier
    }

    /// Manifest of the loaded artifact set (absent for services built in memory).
    pub fn manifest(&self) -> Option<&Manifest> {
        self.inner.manifest.as_ref()
    }
}

/// An [`InferenceService`] loaded on first use.
///
/// The owner decides the lifetime: keep one in application state and every
/// caller shares the model loaded by the first successful
/// [`get`](Self::get). A failed load is reported and retried on the next
/// call; a successful one is never invalidated.
#[derive(Debug)]
pub struct LazyInferenceService {
    dir: PathBuf,
    service: OnceLock<InferenceService>,
}

impl LazyInferenceService {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        LazyInferenceService {
            dir: dir.into(),
            service: OnceLock::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The shared service, loading it if this is the first call.
    pub fn get(&self) -> Result<&InferenceService> {
        if let Some(service) = self.service.get() {
            return Ok(service);
        }

        // Concurrent first calls may both load; the first one stored wins.
        let loaded = InferenceService::load(&self.dir)?;
        Ok(self.service.get_or_init(move || loaded))
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.service.get().is_some()
    }

    /// Classify `text`, loading the model first if needed.
    pub fn predict_news(&self, text: &str) -> Result<PredictionResult> {
        Ok(self.get()?.predict_news(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ml::logistic::LogisticRegressionParams;
    use crate::ml::tfidf::VectorizerParams;

    fn service() -> InferenceService {
        let documents = [
            "shocking secret conspiracy revealed",
            "anonymous insider leaks shocking truth",
            "officials published report study",
            "according study researchers published",
        ];
        let labels = [Label::Fake, Label::Fake, Label::Real, Label::Real];
        let vectorizer = TfIdfVectorizer::fit(&documents, VectorizerParams::default()).unwrap();
        let features = vectorizer.transform_batch(&documents);
        let classifier =
            LogisticRegression::fit(&features, &labels, LogisticRegressionParams::default())
                .unwrap();
        InferenceService::new(vectorizer, classifier).unwrap()
    }

    #[test]
    fn test_predict_news() {
        let service = service();
        assert_eq!(
            service.predict_news("SHOCKING: secret conspiracy!!!").label,
            Label::Fake
        );
        assert_eq!(
            service.predict_news("According to a published study").label,
            Label::Real
        );
    }

    #[test]
    fn test_empty_text_uses_bias() {
        let service = service();
        let result = service.predict_news("");
        assert!((result.probability_fake + result.probability_real - 1.0).abs() < 1e-9);

        let unknown = service.predict_news("zzz qqq 12345 !!!");
        assert_eq!(unknown, result);
        assert_eq!(
            result.probability_real,
            crate::ml::logistic::sigmoid(service.classifier().bias())
        );
    }

    #[test]
    fn test_batch_matches_single() {
        let service = service();
        let texts = vec!["shocking secret", "published study", ""];
        let batch = service.predict_batch(&texts);
        for (text, result) in texts.iter().zip(&batch) {
            assert_eq!(&service.predict_news(text), result);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let service = service();
        let classifier = LogisticRegression::from_parts(
            vec![0.0; 3],
            0.0,
            LogisticRegressionParams::default(),
        );
        let err = InferenceService::new(service.vectorizer().clone(), classifier).unwrap_err();
        assert!(matches!(err, VerityError::Model(_)));
    }

    #[test]
    fn test_lazy_service_reports_load_errors() {
        let lazy = LazyInferenceService::new("/nonexistent/verity-model");
        assert!(lazy.get().unwrap_err().is_load_error());
        assert!(!lazy.is_loaded());
    }

    #[test]
    fn test_service_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InferenceService>();
        assert_send_sync::<LazyInferenceService>();
    }
}
