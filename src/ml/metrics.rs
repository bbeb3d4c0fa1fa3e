//! Evaluation metrics for the binary classifier.
//!
//! - [`ConfusionMatrix`]: counts of (actual, predicted) label pairs
//! - [`ClassificationReport`]: accuracy plus per-class precision, recall,
//!   F1 and support, with macro and support-weighted averages

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::ml::types::Label;

/// 2x2 confusion matrix indexed by `[actual][predicted]` class index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Tally predictions against the true labels.
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(VerityError::invalid_argument(format!(
                "{} true labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }

        let mut matrix = Self::default();
        for (truth, prediction) in actual.iter().zip(predicted) {
            matrix.record(*truth, *prediction);
        }
        Ok(matrix)
    }

    pub fn record(&mut self, actual: Label, predicted: Label) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    pub fn count(&self, actual: Label, predicted: Label) -> usize {
        self.counts[actual.index()][predicted.index()]
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        self.counts[0][0] + self.counts[1][1]
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Number of samples whose true label is `label`.
    pub fn support(&self, label: Label) -> usize {
        self.counts[label.index()].iter().sum()
    }

    /// Number of samples predicted as `label`.
    pub fn predicted(&self, label: Label) -> usize {
        self.counts.iter().map(|row| row[label.index()]).sum()
    }

    /// Precision of `label`: correct predictions of it / all predictions of it.
    pub fn precision(&self, label: Label) -> f64 {
        ratio(self.count(label, label), self.predicted(label))
    }

    /// Recall of `label`: correct predictions of it / all samples of it.
    pub fn recall(&self, label: Label) -> f64 {
        ratio(self.count(label, label), self.support(label))
    }

    pub fn f1_score(&self, label: Label) -> f64 {
        let precision = self.precision(label);
        let recall = self.recall(label);
        let denom = precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / denom
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9}", "actual\\pred", "fake", "real")?;
        for label in Label::ALL {
            writeln!(
                f,
                "{:>12} {:>9} {:>9}",
                label.as_str(),
                self.count(label, Label::Fake),
                self.count(label, Label::Real)
            )?;
        }
        Ok(())
    }
}

/// Precision, recall and F1 for one class (or an average over classes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Summary of a classifier's performance on a labeled test set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// Per-class metrics in class-index order (fake, real).
    pub classes: Vec<(Label, ClassMetrics)>,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion_matrix: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Result<Self> {
        Ok(Self::from_confusion_matrix(
            ConfusionMatrix::from_predictions(actual, predicted)?,
        ))
    }

    pub fn from_confusion_matrix(matrix: ConfusionMatrix) -> Self {
        let classes: Vec<(Label, ClassMetrics)> = Label::ALL
            .iter()
            .map(|&label| {
                (
                    label,
                    ClassMetrics {
                        precision: matrix.precision(label),
                        recall: matrix.recall(label),
                        f1_score: matrix.f1_score(label),
                        support: matrix.support(label),
                    },
                )
            })
            .collect();

        let total = matrix.total();
        let n_classes = classes.len() as f64;
        let macro_avg = ClassMetrics {
            precision: classes.iter().map(|(_, m)| m.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|(_, m)| m.recall).sum::<f64>() / n_classes,
            f1_score: classes.iter().map(|(_, m)| m.f1_score).sum::<f64>() / n_classes,
            support: total,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|(_, m)| metric(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1_score: weighted(|m| m.f1_score),
            support: total,
        };

        Self {
            accuracy: matrix.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
            confusion_matrix: matrix,
        }
    }

    pub fn support(&self) -> usize {
        self.confusion_matrix.total()
    }

    /// Metrics of one class.
    pub fn class(&self, label: Label) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, metrics)| metrics)
    }

    /// Tabular report with two-decimal precision.
    pub fn table(&self) -> String {
        const WIDTH: usize = 12;
        const DIGITS: usize = 2;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>WIDTH$}  {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        );
        let row = |out: &mut String, name: &str, m: &ClassMetrics| {
            let _ = writeln!(
                out,
                "{:>WIDTH$}  {:>9.DIGITS$} {:>9.DIGITS$} {:>9.DIGITS$} {:>9}",
                name, m.precision, m.recall, m.f1_score, m.support
            );
        };
        for (label, metrics) in &self.classes {
            row(&mut out, label.as_str(), metrics);
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "{:>WIDTH$}  {:>9} {:>9} {:>9.DIGITS$} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        );
        row(&mut out, "macro avg", &self.macro_avg);
        row(&mut out, "weighted avg", &self.weighted_avg);
        out
    }

    /// The `evaluation.txt` content: an accuracy line followed by the table.
    pub fn to_evaluation_text(&self) -> String {
        format!("Accuracy: {}\n\n{}", self.accuracy, self.table())
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_evaluation_text())
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
