//! Binary logistic regression over TF-IDF features.
//!
//! The model scores a feature vector as `w·x + b`; `sigmoid(score)` is the
//! probability of REAL. Fitting minimizes
//!
//! ```text
//! 0.5·‖w‖² + C · Σᵢ log(1 + exp(-yᵢ·scoreᵢ))
//! ```
//!
//! with L-BFGS. The bias is not regularized.

use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::ml::features::FeatureVector;
use crate::ml::optimization::{self, LbfgsParams, Objective, Termination};
use crate::ml::types::{Label, PredictionResult};

/// Hyperparameters of the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionParams {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Gradient tolerance for convergence.
    pub tol: f64,
    /// L-BFGS memory.
    pub history: usize,
    pub fit_intercept: bool,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
            history: 10,
            fit_intercept: true,
        }
    }
}

impl LogisticRegressionParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(VerityError::invalid_config(format!(
                "C must be a positive number, got {}",
                self.c
            )));
        }
        if self.max_iter == 0 {
            return Err(VerityError::invalid_config("max_iter must be positive"));
        }
        if !(self.tol >= 0.0) {
            return Err(VerityError::invalid_config("tol must be non-negative"));
        }
        Ok(())
    }

    fn solver_params(&self) -> LbfgsParams {
        LbfgsParams {
            max_iter: self.max_iter,
            gradient_tolerance: self.tol,
            history: self.history,
            ..LbfgsParams::default()
        }
    }
}

/// Statistics of a fitting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Number of solver iterations completed.
    pub iterations: usize,
    pub converged: bool,
    /// Objective value after each iteration.
    pub training_losses: Vec<f64>,
    pub final_loss: f64,
    /// Training time in milliseconds.
    pub training_time_ms: u64,
    pub n_samples: usize,
}

/// A fitted logistic regression classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
    params: LogisticRegressionParams,
    stats: Option<TrainingStats>,
}

impl LogisticRegression {
    /// Fit a classifier on labeled feature vectors.
    pub fn fit(
        features: &[FeatureVector],
        labels: &[Label],
        params: LogisticRegressionParams,
    ) -> Result<Self> {
        params.validate()?;
        if features.is_empty() {
            return Err(VerityError::training("cannot fit classifier without samples"));
        }
        if features.len() != labels.len() {
            return Err(VerityError::training(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        let dimension = features[0].dimension();
        if let Some(bad) = features.iter().find(|f| f.dimension() != dimension) {
            return Err(VerityError::training(format!(
                "inconsistent feature dimensions: {} and {}",
                dimension,
                bad.dimension()
            )));
        }
        for label in Label::ALL {
            if !labels.contains(&label) {
                return Err(VerityError::training(format!(
                    "training data contains no {label} samples"
                )));
            }
        }

        let start = Instant::now();
        let objective = LogLoss {
            features,
            targets: labels.iter().map(|label| label.target()).collect(),
            c: params.c,
            fit_intercept: params.fit_intercept,
            dimension,
        };
        let result = optimization::minimize(
            &objective,
            vec![0.0; dimension + 1],
            &params.solver_params(),
        );

        match result.termination {
            Termination::MaxIterations => warn!(
                "Logistic regression did not converge within {} iterations; increase max_iter",
                params.max_iter
            ),
            Termination::LineSearchFailed => warn!(
                "Logistic regression line search failed after {} iterations",
                result.iterations
            ),
            _ => debug!(
                "Logistic regression converged after {} iterations ({:?})",
                result.iterations, result.termination
            ),
        }

        let stats = TrainingStats {
            iterations: result.iterations,
            converged: result.converged(),
            final_loss: result.value,
            training_losses: result.values,
            training_time_ms: start.elapsed().as_millis() as u64,
            n_samples: features.len(),
        };
        info!(
            "Fitted classifier on {} samples x {} features: loss {:.6}, {} iterations",
            stats.n_samples, dimension, stats.final_loss, stats.iterations
        );

        let mut weights = result.x;
        let bias = weights.pop().unwrap_or(0.0);

        Ok(Self {
            weights,
            bias,
            params,
            stats: Some(stats),
        })
    }

    /// Build a classifier directly from weights and bias.
    pub fn from_parts(weights: Vec<f64>, bias: f64, params: LogisticRegressionParams) -> Self {
        Self {
            weights,
            bias,
            params,
            stats: None,
        }
    }

    /// Check that stored weights are usable.
    pub fn validate(&self) -> Result<()> {
        if self.weights.is_empty() {
            return Err(VerityError::model("classifier has no weights"));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(VerityError::model("classifier has non-finite weights"));
        }
        Ok(())
    }

    /// Raw score `w·x + b`; positive scores lean REAL.
    ///
    /// The vector's dimension must equal [`dimension`](Self::dimension).
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        debug_assert_eq!(features.dimension(), self.weights.len());
        features
            .iter()
            .filter(|(index, _)| *index < self.weights.len())
            .map(|(index, value)| self.weights[index] * value)
            .sum::<f64>()
            + self.bias
    }

    /// Probability that the article is REAL.
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.decision_function(features))
    }

    /// Classify a feature vector.
    ///
    /// A score of exactly zero (probability 0.5) resolves to FAKE.
    pub fn predict(&self, features: &FeatureVector) -> PredictionResult {
        let score = self.decision_function(features);
        let probability_real = sigmoid(score);
        PredictionResult {
            label: if score > 0.0 { Label::Real } else { Label::Fake },
            probability_fake: 1.0 - probability_real,
            probability_real,
        }
    }

    pub fn dimension(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn params(&self) -> &LogisticRegressionParams {
        &self.params
    }

    /// Statistics of the run that produced this model, if it was fitted here.
    pub fn training_stats(&self) -> Option<&TrainingStats> {
        self.stats.as_ref()
    }
}

/// Logistic function, evaluated without overflow for any finite score.
pub fn sigmoid(score: f64) -> f64 {
    if score >= 0.0 {
        1.0 / (1.0 + (-score).exp())
    } else {
        let e = score.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(z))` without overflow.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Regularized log-loss; the last parameter is the bias.
struct LogLoss<'a> {
    features: &'a [FeatureVector],
    targets: Vec<f64>,
    c: f64,
    fit_intercept: bool,
    dimension: usize,
}

impl Objective for LogLoss<'_> {
    fn dimension(&self) -> usize {
        self.dimension + 1
    }

    fn evaluate(&self, x: &[f64], gradient: &mut [f64]) -> f64 {
        let (weights, bias) = x.split_at(self.dimension);
        let bias = if self.fit_intercept { bias[0] } else { 0.0 };

        let mut loss = 0.0;
        for (g, w) in gradient.iter_mut().zip(weights) {
            *g = *w;
            loss += 0.5 * w * w;
        }
        gradient[self.dimension] = 0.0;

        let mut data_loss = 0.0;
        let mut bias_gradient = 0.0;
        for (features, &target) in self.features.iter().zip(&self.targets) {
            let score = features.dot(weights) + bias;
            // -log p(y) = softplus(score) - y·score
            data_loss += softplus(score) - target * score;

            let residual = self.c * (sigmoid(score) - target);
            for (index, value) in features.iter() {
                gradient[index] += residual * value;
            }
            bias_gradient += residual;
        }

        if self.fit_intercept {
            gradient[self.dimension] = bias_gradient;
        }
        loss + self.c * data_loss
    }
}
