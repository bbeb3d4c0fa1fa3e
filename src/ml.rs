//! Machine learning components of the classifier.
//!
//! The pipeline is a classic linear text classifier:
//!
//! ```text
//! normalized text → TfIdfVectorizer → FeatureVector → LogisticRegression → PredictionResult
//! ```
//!
//! - [`tfidf`]: vocabulary building and TF-IDF weighting
//! - [`features`]: the sparse feature vector shared by vectorizer and classifier
//! - [`logistic`]: L2-regularized binary logistic regression
//! - [`optimization`]: the L-BFGS solver used to fit it
//! - [`metrics`]: confusion matrix and classification report
//! - [`types`]: labels and prediction results

pub mod features;
pub mod logistic;
pub mod metrics;
pub mod optimization;
pub mod tfidf;
pub mod types;

pub use features::FeatureVector;
pub use logistic::{LogisticRegression, LogisticRegressionParams, TrainingStats};
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use tfidf::{TfIdfVectorizer, VectorizerParams, VectorizerState};
pub use types::{ConfidenceLevel, Label, PredictionResult};
