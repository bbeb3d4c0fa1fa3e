//! Labels and prediction results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VerityError;

/// Class label of an article. Class index 0 is FAKE, 1 is REAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Fake = 0,
    Real = 1,
}

impl Label {
    /// All labels in class-index order.
    pub const ALL: [Label; 2] = [Label::Fake, Label::Real];

    /// Class index used by the classifier (0 = FAKE, 1 = REAL).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Binary target for the log-loss (REAL is the positive class).
    pub fn target(self) -> f64 {
        match self {
            Label::Fake => 0.0,
            Label::Real => 1.0,
        }
    }

    pub fn from_index(index: usize) -> Option<Label> {
        match index {
            0 => Some(Label::Fake),
            1 => Some(Label::Real),
            _ => None,
        }
    }

    /// Lower-case name as used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Fake => "fake",
            Label::Real => "real",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Fake => write!(f, "FAKE"),
            Label::Real => write!(f, "REAL"),
        }
    }
}

impl FromStr for Label {
    type Err = VerityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fake" | "0" => Ok(Label::Fake),
            "real" | "true" | "1" => Ok(Label::Real),
            other => Err(VerityError::invalid_argument(format!(
                "unknown label: {other}"
            ))),
        }
    }
}

/// How sure the classifier is about its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Confidence above 80%.
    High,
    /// Confidence above 60%.
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            ConfidenceLevel::High
        } else if confidence > 0.6 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Moderate => write!(f, "Moderate"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// Outcome of classifying one article.
///
/// `probability_fake + probability_real` is 1 up to floating-point rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: Label,
    pub probability_fake: f64,
    pub probability_real: f64,
}

impl PredictionResult {
    /// Probability assigned to `label`.
    pub fn probability(&self, label: Label) -> f64 {
        match label {
            Label::Fake => self.probability_fake,
            Label::Real => self.probability_real,
        }
    }

    /// Probability of the predicted label.
    pub fn confidence(&self) -> f64 {
        self.probability(self.label)
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence())
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (fake: {:.2}%, real: {:.2}%)",
            self.label,
            self.probability_fake * 100.0,
            self.probability_real * 100.0
        )
    }
}
