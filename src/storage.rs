//! Persistence of the trained artifact set.
//!
//! A model directory holds four files:
//!
//! | File | Content |
//! |------|---------|
//! | `vectorizer.bin` | framed [`VectorizerState`](crate::ml::tfidf::VectorizerState) |
//! | `model.bin` | framed [`LogisticRegression`] |
//! | `evaluation.txt` | held-out accuracy and classification report |
//! | `manifest.json` | [`Manifest`] with digests of the binary files |
//!
//! The set is replaced as a whole: [`ArtifactStore::save`] writes into a
//! fresh staging directory next to the target and swaps it in by renaming,
//! so a reader never sees files from two different runs. Between the two
//! renames the directory is briefly absent and a load fails cleanly.
//!
//! # Example
//!
//! ```no_run
//! use verity::storage::ArtifactStore;
//!
//! # fn main() -> verity::error::Result<()> {
//! let store = ArtifactStore::new("model");
//! let artifacts = store.load()?;
//! println!("{} terms", artifacts.vectorizer.vocabulary_size());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod manifest;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, VerityError};
use crate::ml::logistic::LogisticRegression;
use crate::ml::metrics::ClassificationReport;
use crate::ml::tfidf::{TfIdfVectorizer, VectorizerState};

pub use manifest::Manifest;

/// Default model directory.
pub const DEFAULT_MODEL_DIR: &str = "model";

pub const VECTORIZER_FILE: &str = "vectorizer.bin";
pub const MODEL_FILE: &str = "model.bin";
pub const EVALUATION_FILE: &str = "evaluation.txt";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Everything a training run persists.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactSet<'a> {
    pub vectorizer: &'a TfIdfVectorizer,
    pub classifier: &'a LogisticRegression,
    pub report: &'a ClassificationReport,
    pub training_documents: usize,
}

/// A validated artifact set read back from disk.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub vectorizer: TfIdfVectorizer,
    pub classifier: LogisticRegression,
    pub manifest: Manifest,
}

/// A model directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the model directory exists.
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Persist a complete artifact set, replacing any previous one.
    pub fn save(&self, artifacts: &ArtifactSet<'_>) -> Result<Manifest> {
        let vectorizer_bytes = codec::encode(&artifacts.vectorizer.state())?;
        let model_bytes = codec::encode(artifacts.classifier)?;
        let evaluation = artifacts.report.to_evaluation_text();

        let mut manifest = Manifest::new(
            artifacts.vectorizer.vocabulary_size(),
            artifacts.training_documents,
            artifacts.report.support(),
            artifacts.report.accuracy,
        );
        manifest.record(VECTORIZER_FILE, &vectorizer_bytes);
        manifest.record(MODEL_FILE, &model_bytes);
        let manifest_json = manifest.to_json()?;

        let files: [(&str, &[u8]); 4] = [
            (VECTORIZER_FILE, &vectorizer_bytes[..]),
            (MODEL_FILE, &model_bytes[..]),
            (EVALUATION_FILE, evaluation.as_bytes()),
            (MANIFEST_FILE, manifest_json.as_bytes()),
        ];

        let staging = self.sibling_path("staging")?;
        if let Err(e) = write_staging(&staging, &files) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }
        self.swap_in(&staging)?;

        info!("Saved artifacts to {}", self.dir.display());
        Ok(manifest)
    }

    /// Read and validate the artifact set.
    ///
    /// Every failure (missing directory or file, corrupt frame, digest
    /// mismatch, inconsistent dimensions) is a [`VerityError::Load`].
    pub fn load(&self) -> Result<LoadedArtifacts> {
        if !self.exists() {
            return Err(VerityError::load(format!(
                "model directory {} not found",
                self.dir.display()
            )));
        }

        let manifest = self.read_manifest()?;

        let vectorizer_bytes = self.read_artifact(VECTORIZER_FILE)?;
        manifest.verify(VECTORIZER_FILE, &vectorizer_bytes)?;
        let state: VectorizerState = codec::decode(&vectorizer_bytes)?;
        let vectorizer = TfIdfVectorizer::from_state(state)
            .map_err(|e| VerityError::load(format!("invalid vectorizer: {e}")))?;

        let model_bytes = self.read_artifact(MODEL_FILE)?;
        manifest.verify(MODEL_FILE, &model_bytes)?;
        let classifier: LogisticRegression = codec::decode(&model_bytes)?;
        classifier
            .validate()
            .map_err(|e| VerityError::load(format!("invalid classifier: {e}")))?;

        if classifier.dimension() != vectorizer.vocabulary_size() {
            return Err(VerityError::load(format!(
                "classifier expects {} features but the vectorizer produces {}",
                classifier.dimension(),
                vectorizer.vocabulary_size()
            )));
        }

        debug!(
            "Loaded artifacts from {} ({} features)",
            self.dir.display(),
            vectorizer.vocabulary_size()
        );
        Ok(LoadedArtifacts {
            vectorizer,
            classifier,
            manifest,
        })
    }

    pub fn read_manifest(&self) -> Result<Manifest> {
        let bytes = self.read_artifact(MANIFEST_FILE)?;
        let json = String::from_utf8(bytes)
            .map_err(|_| VerityError::load(format!("{MANIFEST_FILE} is not valid UTF-8")))?;
        Manifest::from_json(&json)
    }

    /// The persisted evaluation report.
    pub fn read_evaluation(&self) -> Result<String> {
        let bytes = self.read_artifact(EVALUATION_FILE)?;
        String::from_utf8(bytes)
            .map_err(|_| VerityError::load(format!("{EVALUATION_FILE} is not valid UTF-8")))
    }

    fn read_artifact(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(name);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                VerityError::load(format!("missing artifact {}", path.display()))
            }
            _ => VerityError::load(format!("cannot read {}: {e}", path.display())),
        })
    }

    /// `<parent>/<dir name>.<tag>-<uuid>`
    fn sibling_path(&self, tag: &str) -> Result<PathBuf> {
        let name = self.dir.file_name().ok_or_else(|| {
            VerityError::storage(format!(
                "model directory {} has no name",
                self.dir.display()
            ))
        })?;
        let parent = match self.dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        Ok(parent.join(format!(
            "{}.{tag}-{}",
            name.to_string_lossy(),
            Uuid::new_v4()
        )))
    }

    fn swap_in(&self, staging: &Path) -> Result<()> {
        if !self.dir.exists() {
            return fs::rename(staging, &self.dir).map_err(|e| {
                let _ = fs::remove_dir_all(staging);
                VerityError::storage(format!("cannot move artifacts into place: {e}"))
            });
        }

        let retired = self.sibling_path("old")?;
        fs::rename(&self.dir, &retired).map_err(|e| {
            let _ = fs::remove_dir_all(staging);
            VerityError::storage(format!("cannot retire previous artifacts: {e}"))
        })?;

        if let Err(e) = fs::rename(staging, &self.dir) {
            // Put the previous set back.
            let _ = fs::rename(&retired, &self.dir);
            let _ = fs::remove_dir_all(staging);
            return Err(VerityError::storage(format!(
                "cannot move artifacts into place: {e}"
            )));
        }

        if let Err(e) = fs::remove_dir_all(&retired) {
            warn!(
                "Failed to remove previous artifacts at {}: {e}",
                retired.display()
            );
        }
        Ok(())
    }
}

fn write_staging(staging: &Path, files: &[(&str, &[u8])]) -> Result<()> {
    fs::create_dir(staging)?;
    for (name, data) in files {
        let mut file = File::create(staging.join(name))?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::ml::features::FeatureVector;
    use crate::ml::logistic::LogisticRegressionParams;
    use crate::ml::tfidf::VectorizerParams;
    use crate::ml::types::Label;

    fn fitted() -> (TfIdfVectorizer, LogisticRegression, ClassificationReport) {
        let documents = ["shocking secret revealed", "officials published report"];
        let vectorizer = TfIdfVectorizer::fit(&documents, VectorizerParams::default()).unwrap();
        let features: Vec<FeatureVector> = vectorizer.transform_batch(&documents);
        let labels = [Label::Fake, Label::Real];
        let classifier =
            LogisticRegression::fit(&features, &labels, LogisticRegressionParams::default())
                .unwrap();
        let report = ClassificationReport::from_predictions(&labels, &labels).unwrap();
        (vectorizer, classifier, report)
    }

    fn save(store: &ArtifactStore) -> Manifest {
        let (vectorizer, classifier, report) = fitted();
        store
            .save(&ArtifactSet {
                vectorizer: &vectorizer,
                classifier: &classifier,
                report: &report,
                training_documents: 2,
            })
            .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("model"));
        let manifest = save(&store);

        for file in [VECTORIZER_FILE, MODEL_FILE, EVALUATION_FILE, MANIFEST_FILE] {
            assert!(store.dir().join(file).is_file(), "{file} missing");
        }

        let loaded = store.load().unwrap();
        let (vectorizer, classifier, _) = fitted();
        assert_eq!(loaded.vectorizer.vocabulary(), vectorizer.vocabulary());
        assert_eq!(loaded.classifier.weights(), classifier.weights());
        assert_eq!(loaded.classifier.bias(), classifier.bias());
        assert_eq!(loaded.manifest.files, manifest.files);

        let evaluation = store.read_evaluation().unwrap();
        assert!(evaluation.starts_with("Accuracy: 1"));
    }

    #[test]
    fn test_save_replaces_previous_set_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("model"));
        save(&store);
        save(&store);

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["model".to_string()]);
        assert!(store.load().is_ok());
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("absent"));
        assert!(store.load().unwrap_err().is_load_error());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("model"));
        save(&store);
        fs::remove_file(store.dir().join(MODEL_FILE)).unwrap();
        assert!(store.load().unwrap_err().is_load_error());
    }

    #[test]
    fn test_tampered_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("model"));
        save(&store);

        let path = store.dir().join(VECTORIZER_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        fs::write(&path, bytes).unwrap();

        assert!(store.load().unwrap_err().is_load_error());
    }

    #[test]
    fn test_corrupt_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path().join("model"));
        save(&store);
        fs::write(store.dir().join(MANIFEST_FILE), "not json").unwrap();
        assert!(store.load().unwrap_err().is_load_error());
    }
}
