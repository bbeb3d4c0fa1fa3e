//! Offline training pipeline.
//!
//! ```text
//! LOAD (fake.csv, real.csv) → LABEL → CONCATENATE → SHUFFLE → SPLIT
//!   → NORMALIZE → vectorizer.fit(train) → transform(train, test)
//!   → classifier.fit(train) → predict(test) → report → PERSIST
//! ```
//!
//! Nothing is written until every earlier stage has succeeded, so a failed
//! run leaves the previous artifact set untouched.
//!
//! # Example
//!
//! ```no_run
//! use verity::config::TrainingConfig;
//! use verity::training::TrainingPipeline;
//!
//! # fn main() -> verity::error::Result<()> {
//! let config = TrainingConfig::new("data/Fake.csv", "data/True.csv");
//! let outcome = TrainingPipeline::new(config).run()?;
//! println!("accuracy: {:.4}", outcome.model.report.accuracy);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Instant;

use log::info;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::analysis::normalizer::normalize;
use crate::config::TrainingConfig;
use crate::corpus::csv::CsvArticleReader;
use crate::corpus::{Corpus, LabeledArticle};
use crate::error::{Result, VerityError};
use crate::ml::features::FeatureVector;
use crate::ml::logistic::LogisticRegression;
use crate::ml::metrics::ClassificationReport;
use crate::ml::tfidf::TfIdfVectorizer;
use crate::ml::types::Label;
use crate::storage::{ArtifactSet, ArtifactStore, Manifest};

/// A fitted vectorizer and classifier with their held-out evaluation.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub vectorizer: TfIdfVectorizer,
    pub classifier: LogisticRegression,
    pub report: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
}

/// Result of a complete training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: FittedModel,
    pub manifest: Manifest,
    pub output_dir: PathBuf,
}

/// Orchestrates a training run.
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        TrainingPipeline { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load the datasets, fit and evaluate, then persist the artifact set.
    pub fn run(&self) -> Result<TrainingOutcome> {
        self.config.validate()?;
        let start = Instant::now();

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.thread_count())
            .thread_name(|i| format!("verity-train-{i}"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {e}"))?;

        let model = pool.install(|| -> Result<FittedModel> {
            let reader = CsvArticleReader::new().with_columns(self.config.columns.clone());
            let corpus = Corpus::load(&reader, &self.config.fake_path, &self.config.real_path)?;
            self.fit(corpus)
        })?;

        let store = ArtifactStore::new(&self.config.output_dir);
        let manifest = store.save(&ArtifactSet {
            vectorizer: &model.vectorizer,
            classifier: &model.classifier,
            report: &model.report,
            training_documents: model.train_size,
        })?;

        info!(
            "Training finished in {:.1}s: accuracy {:.4}",
            start.elapsed().as_secs_f64(),
            model.report.accuracy
        );
        Ok(TrainingOutcome {
            model,
            manifest,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Shuffle, split, fit and evaluate on an in-memory corpus.
    ///
    /// Writes nothing.
    pub fn fit(&self, mut corpus: Corpus) -> Result<FittedModel> {
        let config = &self.config;
        config.validate()?;

        corpus.shuffle(config.seed);
        let split = corpus.split(config.test_size, config.seed)?;
        info!(
            "Split corpus: {} training and {} test articles",
            split.train.len(),
            split.test.len()
        );

        let train_labels: Vec<Label> = split.train.iter().map(|a| a.label).collect();
        let test_labels: Vec<Label> = split.test.iter().map(|a| a.label).collect();
        for label in Label::ALL {
            if !train_labels.contains(&label) {
                return Err(VerityError::training(format!(
                    "training split contains no {label} articles"
                )));
            }
        }

        let train_texts = normalize_articles(&split.train);
        let test_texts = normalize_articles(&split.test);
        info!("Normalized {} articles", train_texts.len() + test_texts.len());

        let vectorizer = TfIdfVectorizer::fit(&train_texts, config.vectorizer.clone())?;
        let train_features: Vec<FeatureVector> = vectorizer.transform_batch(&train_texts);
        let test_features: Vec<FeatureVector> = vectorizer.transform_batch(&test_texts);
        info!(
            "Vectorized articles into {} features",
            vectorizer.vocabulary_size()
        );

        let classifier =
            LogisticRegression::fit(&train_features, &train_labels, config.classifier.clone())?;

        let predictions: Vec<Label> = test_features
            .iter()
            .map(|features| classifier.predict(features).label)
            .collect();
        let report = ClassificationReport::from_predictions(&test_labels, &predictions)?;
        info!("Held-out accuracy: {:.4}", report.accuracy);

        Ok(FittedModel {
            vectorizer,
            classifier,
            report,
            train_size: train_labels.len(),
            test_size: test_labels.len(),
        })
    }
}

/// Normalize the title and body of each article, in parallel.
pub fn normalize_articles(articles: &[LabeledArticle]) -> Vec<String> {
    articles
        .par_iter()
        .map(|a| normalize(&a.article.text()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::RawArticle;

    fn corpus(n: usize) -> Corpus {
        Corpus::from_sources(
            (0..n)
                .map(|i| RawArticle::new(format!("Shocking secret {i}"), "Anonymous insider reveals conspiracy"))
                .collect(),
            (0..n)
                .map(|i| RawArticle::new(format!("Senate report {i}"), "According to officials the study was published"))
                .collect(),
        )
    }

    #[test]
    fn test_fit_in_memory() {
        let pipeline = TrainingPipeline::new(TrainingConfig::default());
        let model = pipeline.fit(corpus(10)).unwrap();

        assert_eq!(model.test_size, 8);
        assert_eq!(model.train_size, 12);
        assert_eq!(model.report.support(), 8);
        assert_eq!(model.report.accuracy, 1.0);
        assert_eq!(
            model.classifier.dimension(),
            model.vectorizer.vocabulary_size()
        );
    }

    #[test]
    fn test_fit_is_reproducible() {
        let pipeline = TrainingPipeline::new(TrainingConfig::default());
        let a = pipeline.fit(corpus(10)).unwrap();
        let b = pipeline.fit(corpus(10)).unwrap();
        assert_eq!(a.vectorizer.vocabulary(), b.vectorizer.vocabulary());
        assert_eq!(a.classifier.weights(), b.classifier.weights());
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_single_class_is_training_error() {
        let corpus = Corpus::from_sources(
            (0..5).map(|i| RawArticle::new(format!("story {i}"), "text")).collect(),
            Vec::new(),
        );
        let err = TrainingPipeline::new(TrainingConfig::default())
            .fit(corpus)
            .unwrap_err();
        assert!(matches!(err, VerityError::Training(_)));
    }

    #[test]
    fn test_too_small_corpus() {
        let corpus = Corpus::from_sources(vec![RawArticle::new("one", "article")], Vec::new());
        assert!(TrainingPipeline::new(TrainingConfig::default())
            .fit(corpus)
            .is_err());
    }
}
