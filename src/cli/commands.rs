//! Command implementations for the verity CLI.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::time::Instant;

use log::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::TrainingConfig;
use crate::corpus::Corpus;
use crate::corpus::csv::CsvArticleReader;
use crate::error::{Result, VerityError};
use crate::inference::InferenceService;
use crate::storage::ArtifactStore;
use crate::training::TrainingPipeline;

/// Execute a CLI command.
pub fn execute_command(args: VerityArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Predict(predict_args) => predict(predict_args, &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args, &args),
        Command::Report(report_args) => report(report_args, &args),
        Command::Info(info_args) => show_info(info_args, &args),
    }
}

/// Merge the configuration file (if any) with command line overrides.
pub fn training_config(args: &TrainArgs) -> Result<TrainingConfig> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };

    if let Some(fake) = &args.fake {
        config.fake_path = fake.clone();
    }
    if let Some(real) = &args.real {
        config.real_path = real.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(test_size) = args.test_size {
        config.test_size = test_size;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_features) = args.max_features {
        config.vectorizer.max_features = Some(max_features);
    }
    if let Some(c) = args.c {
        config.classifier.c = c;
    }
    if let Some(max_iter) = args.max_iter {
        config.classifier.max_iter = max_iter;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    config.validate()?;
    Ok(config)
}

/// Train and persist a model.
fn train(args: &TrainArgs, cli_args: &VerityArgs) -> Result<()> {
    let config = training_config(args)?;
    info!(
        "Training on {} and {}",
        config.fake_path.display(),
        config.real_path.display()
    );

    let start = Instant::now();
    let outcome = TrainingPipeline::new(config).run()?;
    let stats = outcome.model.classifier.training_stats();

    let summary = TrainingSummary {
        output_dir: outcome.output_dir,
        train_size: outcome.model.train_size,
        test_size: outcome.model.test_size,
        vocabulary_size: outcome.model.vectorizer.vocabulary_size(),
        iterations: stats.map_or(0, |s| s.iterations),
        converged: stats.is_some_and(|s| s.converged),
        duration_ms: start.elapsed().as_millis() as u64,
        report: outcome.model.report.clone(),
    };
    output_result(&summary, cli_args)
}

/// Classify one article.
fn predict(args: &PredictArgs, cli_args: &VerityArgs) -> Result<()> {
    let text = read_input(args)?;
    if text.trim().is_empty() {
        warn!("Input text is empty; the prediction reflects the model bias only");
    }

    let service = InferenceService::load(&args.model_dir)?;
    let result = service.predict_news(&text);
    let details = args.details.then(|| TextDetails::from_text(&text));

    output_result(&PredictionOutput::new(result, details), cli_args)
}

/// Article text from the argument, a file, or standard input.
fn read_input(args: &PredictArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path).map_err(|e| {
            VerityError::invalid_argument(format!("cannot read {}: {e}", path.display()))
        });
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(VerityError::invalid_argument(
            "no article given: pass TEXT, --file or pipe text to standard input",
        ));
    }
    let mut text = String::new();
    stdin.lock().read_to_string(&mut text)?;
    Ok(text)
}

/// Score a saved model on labeled data.
fn evaluate(args: &EvaluateArgs, cli_args: &VerityArgs) -> Result<()> {
    let service = InferenceService::load(&args.model_dir)?;
    let corpus = Corpus::load(&CsvArticleReader::new(), &args.fake, &args.real)?;
    let report = service.evaluate(corpus.articles())?;

    let output = EvaluationOutput {
        model_dir: args.model_dir.clone(),
        articles: corpus.len(),
        report,
    };
    output_result(&output, cli_args)
}

/// Print the persisted evaluation report.
fn report(args: &ModelDirArgs, cli_args: &VerityArgs) -> Result<()> {
    let evaluation = ArtifactStore::new(&args.model_dir).read_evaluation()?;
    let output = ReportOutput {
        model_dir: args.model_dir.clone(),
        evaluation,
    };
    output_result(&output, cli_args)
}

/// Print the model manifest.
fn show_info(args: &ModelDirArgs, cli_args: &VerityArgs) -> Result<()> {
    let manifest = ArtifactStore::new(&args.model_dir).read_manifest()?;
    let output = InfoOutput {
        model_dir: args.model_dir.clone(),
        manifest,
    };
    output_result(&output, cli_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use std::path::PathBuf;

    use clap::Parser;
    use tempfile::NamedTempFile;

    fn train_args(argv: &[&str]) -> TrainArgs {
        let mut full = vec!["verity", "train"];
        full.extend_from_slice(argv);
        match VerityArgs::try_parse_from(full).unwrap().command {
            Command::Train(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_training_config_overrides() {
        let args = train_args(&[
            "--fake", "f.csv", "--real", "r.csv", "--output", "out", "--seed", "9", "--c", "2.5",
        ]);
        let config = training_config(&args).unwrap();

        assert_eq!(config.fake_path, PathBuf::from("f.csv"));
        assert_eq!(config.real_path, PathBuf::from("r.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.seed, 9);
        assert_eq!(config.classifier.c, 2.5);
        assert_eq!(config.test_size, 0.4);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"seed": 7, "test_size": 0.25, "vectorizer": {{"max_features": 50}}}}"#)
            .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = train_args(&["--config", &path, "--max-features", "10"]);
        let config = training_config(&args).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.test_size, 0.25);
        assert_eq!(config.vectorizer.max_features, Some(10));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = train_args(&["--test-size", "1.5"]);
        assert!(training_config(&args).is_err());
    }
}
