//! Output formatting for CLI commands.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::normalize;
use crate::cli::args::{OutputFormat, VerityArgs};
use crate::error::Result;
use crate::ml::metrics::ClassificationReport;
use crate::ml::types::{ConfidenceLevel, Label, PredictionResult};
use crate::storage::Manifest;

/// Number of normalized characters shown in the details preview.
pub const PREVIEW_CHARS: usize = 150;

/// Rendering of a result for humans.
pub trait HumanReadable {
    fn render_human(&self) -> String;
}

/// Result structure for training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub output_dir: PathBuf,
    pub train_size: usize,
    pub test_size: usize,
    pub vocabulary_size: usize,
    pub iterations: usize,
    pub converged: bool,
    pub duration_ms: u64,
    pub report: ClassificationReport,
}

/// Text statistics shown with `--details`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TextDetails {
    pub word_count: usize,
    pub char_count: usize,
    pub preview: String,
}

impl TextDetails {
    pub fn from_text(text: &str) -> Self {
        let normalized = normalize(text);
        let preview: String = normalized.chars().take(PREVIEW_CHARS).collect();
        TextDetails {
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
            preview: format!("{preview}..."),
        }
    }
}

/// Result structure for prediction.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub label: Label,
    pub probability_fake: f64,
    pub probability_real: f64,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<TextDetails>,
}

impl PredictionOutput {
    pub fn new(result: PredictionResult, details: Option<TextDetails>) -> Self {
        PredictionOutput {
            label: result.label,
            probability_fake: result.probability_fake,
            probability_real: result.probability_real,
            confidence: result.confidence(),
            confidence_level: result.confidence_level(),
            details,
        }
    }
}

/// Result structure for evaluating a saved model.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub model_dir: PathBuf,
    pub articles: usize,
    pub report: ClassificationReport,
}

/// Persisted evaluation report.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportOutput {
    pub model_dir: PathBuf,
    pub evaluation: String,
}

/// Model information.
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoOutput {
    pub model_dir: PathBuf,
    pub manifest: Manifest,
}

impl HumanReadable for TrainingSummary {
    fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Model saved to: {}", self.output_dir.display());
        let _ = writeln!(
            out,
            "Articles: {} training, {} test",
            self.train_size, self.test_size
        );
        let _ = writeln!(out, "Vocabulary: {} terms", self.vocabulary_size);
        let _ = writeln!(
            out,
            "Optimizer: {} iterations ({})",
            self.iterations,
            if self.converged {
                "converged"
            } else {
                "not converged"
            }
        );
        let _ = writeln!(out, "Duration: {} ms", self.duration_ms);
        out.push('\n');
        out.push_str(&self.report.to_evaluation_text());
        out
    }
}

impl HumanReadable for PredictionOutput {
    fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Prediction: {} NEWS", self.label);
        let _ = writeln!(
            out,
            "Confidence: {:.2}% ({} confidence)",
            self.confidence * 100.0,
            self.confidence_level
        );
        let _ = writeln!(out, "  Fake: {:.2}%", self.probability_fake * 100.0);
        let _ = writeln!(out, "  Real: {:.2}%", self.probability_real * 100.0);

        if let Some(details) = &self.details {
            out.push('\n');
            let _ = writeln!(out, "Word count: {}", details.word_count);
            let _ = writeln!(out, "Character count: {}", details.char_count);
            let _ = writeln!(out, "Processed text preview: {}", details.preview);
        }
        out
    }
}

impl HumanReadable for EvaluationOutput {
    fn render_human(&self) -> String {
        format!(
            "Model: {}\nArticles: {}\n\n{}\nConfusion matrix:\n{}",
            self.model_dir.display(),
            self.articles,
            self.report.to_evaluation_text(),
            self.report.confusion_matrix
        )
    }
}

impl HumanReadable for ReportOutput {
    fn render_human(&self) -> String {
        self.evaluation.clone()
    }
}

impl HumanReadable for InfoOutput {
    fn render_human(&self) -> String {
        let manifest = &self.manifest;
        let mut out = String::new();
        let _ = writeln!(out, "Model directory: {}", self.model_dir.display());
        let _ = writeln!(out, "Format version: {}", manifest.format_version);
        let _ = writeln!(out, "Created by: {}", manifest.created_by);
        let _ = writeln!(out, "Created at: {}", manifest.created_at.to_rfc3339());
        let _ = writeln!(out, "Vocabulary: {} terms", manifest.vocabulary_size);
        let _ = writeln!(
            out,
            "Articles: {} training, {} test",
            manifest.training_documents, manifest.test_documents
        );
        let _ = writeln!(out, "Accuracy: {:.4}", manifest.accuracy);
        for (name, digest) in &manifest.files {
            let _ = writeln!(
                out,
                "  {name}: {} bytes, crc32 {:08x}",
                digest.bytes, digest.crc32
            );
        }
        out
    }
}

/// Render a result in the requested format.
pub fn format_result<T: Serialize + HumanReadable>(result: &T, args: &VerityArgs) -> Result<String> {
    match args.output_format {
        OutputFormat::Human => Ok(result.render_human()),
        OutputFormat::Json => {
            if args.pretty {
                Ok(serde_json::to_string_pretty(result)?)
            } else {
                Ok(serde_json::to_string(result)?)
            }
        }
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanReadable>(result: &T, args: &VerityArgs) -> Result<()> {
    let rendered = format_result(result, args)?;
    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    fn args(format: &str) -> VerityArgs {
        VerityArgs::try_parse_from(["verity", "--format", format, "info"]).unwrap()
    }

    fn prediction() -> PredictionOutput {
        PredictionOutput::new(
            PredictionResult {
                label: Label::Fake,
                probability_fake: 0.9,
                probability_real: 0.1,
            },
            Some(TextDetails::from_text("BREAKING: 5 secret   facts!")),
        )
    }

    #[test]
    fn test_text_details() {
        let details = TextDetails::from_text("BREAKING: 5 secret   facts!");
        assert_eq!(details.word_count, 4);
        assert_eq!(details.char_count, 27);
        assert_eq!(details.preview, "breaking  secret   facts...");

        let long = "word ".repeat(100);
        let details = TextDetails::from_text(&long);
        assert_eq!(details.preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_human_prediction() {
        let rendered = format_result(&prediction(), &args("human")).unwrap();
        assert!(rendered.contains("Prediction: FAKE NEWS"));
        assert!(rendered.contains("Confidence: 90.00% (High confidence)"));
        assert!(rendered.contains("Word count: 4"));
    }

    #[test]
    fn test_json_prediction() {
        let rendered = format_result(&prediction(), &args("json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["label"], "FAKE");
        assert_eq!(value["confidence_level"], "high");
        assert_eq!(value["details"]["word_count"], 4);
    }
}
