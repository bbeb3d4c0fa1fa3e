//! Artifact manifest (`manifest.json`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerityError};
use crate::storage::codec::FORMAT_VERSION;

/// Size and checksum of one artifact file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    pub bytes: u64,
    pub crc32: u32,
}

impl FileDigest {
    pub fn of(data: &[u8]) -> Self {
        FileDigest {
            bytes: data.len() as u64,
            crc32: crc32fast::hash(data),
        }
    }
}

/// Description of a persisted artifact set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    /// Version of the crate that wrote the artifacts.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub vocabulary_size: usize,
    pub training_documents: usize,
    pub test_documents: usize,
    /// Held-out accuracy.
    pub accuracy: f64,
    /// Digest of each binary artifact, by file name.
    pub files: BTreeMap<String, FileDigest>,
}

impl Manifest {
    pub fn new(
        vocabulary_size: usize,
        training_documents: usize,
        test_documents: usize,
        accuracy: f64,
    ) -> Self {
        Manifest {
            format_version: FORMAT_VERSION,
            created_by: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            created_at: Utc::now(),
            vocabulary_size,
            training_documents,
            test_documents,
            accuracy,
            files: BTreeMap::new(),
        }
    }

    /// Record the digest of `file_name`'s content.
    pub fn record(&mut self, file_name: &str, data: &[u8]) {
        self.files.insert(file_name.to_string(), FileDigest::of(data));
    }

    /// Check that `data` is the content recorded for `file_name`.
    pub fn verify(&self, file_name: &str, data: &[u8]) -> Result<()> {
        let expected = self.files.get(file_name).ok_or_else(|| {
            VerityError::load(format!("manifest has no entry for {file_name}"))
        })?;

        let actual = FileDigest::of(data);
        if actual != *expected {
            return Err(VerityError::load(format!(
                "{file_name} does not match the manifest (expected {} bytes crc {:08x}, found {} bytes crc {:08x})",
                expected.bytes, expected.crc32, actual.bytes, actual.crc32
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a manifest; malformed JSON or an unknown version is a load error.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)
            .map_err(|e| VerityError::load(format!("invalid manifest: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(VerityError::load(format!(
                "unsupported manifest format version {}",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify() {
        let mut manifest = Manifest::new(10, 6, 4, 0.75);
        manifest.record("model.bin", b"weights");

        assert!(manifest.verify("model.bin", b"weights").is_ok());
        assert!(manifest.verify("model.bin", b"weightz").unwrap_err().is_load_error());
        assert!(manifest.verify("vectorizer.bin", b"").unwrap_err().is_load_error());
    }

    #[test]
    fn test_json_round_trip() {
        let mut manifest = Manifest::new(10, 6, 4, 0.75);
        manifest.record("model.bin", b"weights");

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"vocabulary_size\": 10"));
        assert_eq!(Manifest::from_json(&json).unwrap(), manifest);
    }

    #[test]
    fn test_invalid_json() {
        assert!(Manifest::from_json("{").unwrap_err().is_load_error());

        let mut manifest = Manifest::new(1, 1, 1, 1.0);
        manifest.format_version = 99;
        let json = manifest.to_json().unwrap();
        assert!(Manifest::from_json(&json).unwrap_err().is_load_error());
    }
}
