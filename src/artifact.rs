//! Versioned artifact codec
//!
//! An artifact bundles the frozen encoder, the trained classifier and the
//! label set. On disk it is a fixed header followed by a bincode body:
//!
//! ```text
//! offset  size  field
//!      0     8  magic b"INTENTAF"
//!      8     4  format version (u32, big-endian)
//!     12    32  SHA-256 of the body
//!     44     8  body length (u64, big-endian)
//!     52     n  bincode body
//! ```
//!
//! Decoding either returns a fully validated artifact or an
//! [`IntentError::ArtifactFormat`]; there is no partially loaded state.

use crate::classifier::ClassifierState;
use crate::config::ClassifierKind;
use crate::encoder::TfIdfState;
use crate::error::{IntentError, Result};
use crate::types::{LabelSet, PredictionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// File magic
pub const ARTIFACT_MAGIC: &[u8; 8] = b"INTENTAF";

/// Current (and only readable) format version
pub const FORMAT_VERSION: u32 = 1;

const VERSION_OFFSET: usize = 8;
const CHECKSUM_OFFSET: usize = 12;
const LENGTH_OFFSET: usize = 44;
const HEADER_LEN: usize = 52;

/// Where the recorded accuracy was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    Holdout,
    TrainingSet,
    /// A labeled set supplied after training
    External,
}

impl std::fmt::Display for EvaluationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationSource::Holdout => write!(f, "holdout"),
            EvaluationSource::TrainingSet => write!(f, "training_set"),
            EvaluationSource::External => write!(f, "external"),
        }
    }
}

/// Provenance recorded at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Version of the crate that produced the artifact
    pub producer_version: String,
    pub example_count: usize,
    pub label_counts: BTreeMap<String, usize>,
    pub accuracy: f64,
    pub evaluation_source: EvaluationSource,
    pub evaluation_examples: usize,
    /// SHA-256 of the example store
    pub dataset_fingerprint: String,
}

/// Trained model plus everything needed to serve it
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub encoder: TfIdfState,
    pub classifier: ClassifierState,
    pub labels: LabelSet,
    pub metadata: ArtifactMetadata,
}

#[derive(Serialize)]
struct BodyRef<'a> {
    created_at: &'a DateTime<Utc>,
    encoder: &'a TfIdfState,
    classifier: &'a ClassifierState,
    labels: &'a LabelSet,
    metadata: &'a ArtifactMetadata,
}

#[derive(Deserialize)]
struct Body {
    created_at: DateTime<Utc>,
    encoder: TfIdfState,
    classifier: ClassifierState,
    labels: LabelSet,
    metadata: ArtifactMetadata,
}

/// Human-readable description of an artifact, without the weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub classifier: ClassifierKind,
    pub dimension: usize,
    pub metadata: ArtifactMetadata,
}

fn format_error(msg: impl Into<String>) -> IntentError {
    IntentError::ArtifactFormat(msg.into())
}

impl Artifact {
    /// Assemble an artifact stamped with the current format version and time
    pub fn new(
        encoder: TfIdfState,
        classifier: ClassifierState,
        metadata: ArtifactMetadata,
    ) -> Result<Self> {
        let artifact = Self {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            labels: classifier.labels().clone(),
            encoder,
            classifier,
            metadata,
        };
        artifact.validate().map_err(IntentError::Internal)?;
        Ok(artifact)
    }

    /// Encode then classify one text
    pub fn predict(&self, text: &str) -> Result<PredictionResult> {
        let vector = self.encoder.encode(text);
        let result = self.classifier.predict(&vector)?;
        if !self.labels.contains(&result.intent) {
            return Err(IntentError::Internal(format!(
                "classifier returned unknown label '{}'",
                result.intent
            )));
        }
        Ok(result)
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            format_version: self.format_version,
            created_at: self.created_at,
            labels: self.labels.as_slice().to_vec(),
            classifier: self.classifier.kind(),
            dimension: self.encoder.dimension(),
            metadata: self.metadata.clone(),
        }
    }

    /// Cross-component consistency checks
    fn validate(&self) -> std::result::Result<(), String> {
        if self.labels.is_empty() {
            return Err("label set is empty".to_string());
        }
        if !self.labels.is_canonical() {
            return Err("label set is not sorted and distinct".to_string());
        }
        self.encoder.validate()?;
        self.classifier.validate()?;
        if self.classifier.labels() != &self.labels {
            return Err("classifier labels differ from the artifact label set".to_string());
        }
        if self.classifier.dimension() != self.encoder.dimension() {
            return Err(format!(
                "classifier expects {} features but the encoder produces {}",
                self.classifier.dimension(),
                self.encoder.dimension()
            ));
        }
        Ok(())
    }

    /// Serialize to the versioned byte layout
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(&BodyRef {
            created_at: &self.created_at,
            encoder: &self.encoder,
            classifier: &self.classifier,
            labels: &self.labels,
            metadata: &self.metadata,
        })
        .map_err(|e| IntentError::Internal(format!("failed to encode artifact body: {}", e)))?;

        let checksum = Sha256::digest(&body);

        let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
        bytes.extend_from_slice(ARTIFACT_MAGIC);
        bytes.extend_from_slice(&self.format_version.to_be_bytes());
        bytes.extend_from_slice(&checksum);
        bytes.extend_from_slice(&(body.len() as u64).to_be_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Parse and validate the versioned byte layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(format_error(format!(
                "artifact is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if &bytes[..VERSION_OFFSET] != ARTIFACT_MAGIC {
            return Err(format_error("not an intent artifact (bad magic)"));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[VERSION_OFFSET..CHECKSUM_OFFSET]);
        let format_version = u32::from_be_bytes(version);
        if format_version != FORMAT_VERSION {
            return Err(format_error(format!(
                "unsupported format version {} (expected {})",
                format_version, FORMAT_VERSION
            )));
        }

        let mut length = [0u8; 8];
        length.copy_from_slice(&bytes[LENGTH_OFFSET..HEADER_LEN]);
        let declared = u64::from_be_bytes(length);
        let body = &bytes[HEADER_LEN..];
        if declared != body.len() as u64 {
            return Err(format_error(format!(
                "body length mismatch: header declares {} bytes, found {}",
                declared,
                body.len()
            )));
        }

        if Sha256::digest(body).as_slice() != &bytes[CHECKSUM_OFFSET..LENGTH_OFFSET] {
            return Err(format_error("checksum mismatch, artifact is corrupt"));
        }

        let decoded: Body = bincode::deserialize(body)
            .map_err(|e| format_error(format!("malformed artifact body: {}", e)))?;

        let artifact = Self {
            format_version,
            created_at: decoded.created_at,
            encoder: decoded.encoder,
            classifier: decoded.classifier,
            labels: decoded.labels,
            metadata: decoded.metadata,
        };
        artifact.validate().map_err(format_error)?;
        Ok(artifact)
    }

    /// Write atomically: a failed write leaves any previous file untouched
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file_name = path
            .file_name()
            .ok_or_else(|| IntentError::Other(format!("invalid artifact path {}", path.display())))?
            .to_string_lossy();
        let staging = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

        std::fs::write(&staging, &bytes)?;
        if let Err(e) = std::fs::rename(&staging, path) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }

        info!(
            "Wrote artifact {} ({} bytes, {} labels)",
            path.display(),
            bytes.len(),
            self.labels.len()
        );
        Ok(())
    }

    /// Read and validate an artifact file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading artifact from {}", path.display());
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier;
    use crate::config::{ClassifierConfig, EncoderConfig};
    use crate::encoder::{FeatureEncoder, TfIdfEncoder};

    fn sample_artifact(kind: ClassifierKind) -> Artifact {
        let texts = ["reset my password", "what is your refund policy"];
        let labels = ["password_reset", "refund_policy"];
        let encoder = TfIdfEncoder::new(EncoderConfig::default());
        let state = encoder.fit(&texts).unwrap();
        let vectors: Vec<_> = texts.iter().map(|t| encoder.transform(t, &state)).collect();
        let config = ClassifierConfig {
            kind,
            ..ClassifierConfig::default()
        };
        let classifier = classifier::fit(&config, &vectors, &labels).unwrap();
        let metadata = ArtifactMetadata {
            producer_version: "test".to_string(),
            example_count: 2,
            label_counts: labels.iter().map(|l| (l.to_string(), 1)).collect(),
            accuracy: 1.0,
            evaluation_source: EvaluationSource::TrainingSet,
            evaluation_examples: 2,
            dataset_fingerprint: "00".repeat(32),
        };
        Artifact::new(state, classifier, metadata).unwrap()
    }

    #[test]
    fn test_round_trip() {
        for kind in [ClassifierKind::NaiveBayes, ClassifierKind::Centroid] {
            let artifact = sample_artifact(kind);
            let bytes = artifact.to_bytes().unwrap();
            assert_eq!(&bytes[..8], ARTIFACT_MAGIC);
            let decoded = Artifact::from_bytes(&bytes).unwrap();
            assert_eq!(decoded, artifact);
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample_artifact(ClassifierKind::NaiveBayes).to_bytes().unwrap();
        bytes[0] = b'X';
        let err = Artifact::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, IntentError::ArtifactFormat(ref m) if m.contains("magic")));
    }

    #[test]
    fn test_unknown_version() {
        let mut bytes = sample_artifact(ClassifierKind::NaiveBayes).to_bytes().unwrap();
        bytes[VERSION_OFFSET..CHECKSUM_OFFSET].copy_from_slice(&2u32.to_be_bytes());
        let err = Artifact::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, IntentError::ArtifactFormat(ref m) if m.contains("version 2")));
    }

    #[test]
    fn test_truncated() {
        let bytes = sample_artifact(ClassifierKind::NaiveBayes).to_bytes().unwrap();
        for cut in [0, 10, HEADER_LEN, bytes.len() - 1] {
            assert!(matches!(
                Artifact::from_bytes(&bytes[..cut]),
                Err(IntentError::ArtifactFormat(_))
            ));
        }
    }

    #[test]
    fn test_flipped_body_byte_fails_checksum() {
        let mut bytes = sample_artifact(ClassifierKind::NaiveBayes).to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let err = Artifact::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, IntentError::ArtifactFormat(ref m) if m.contains("checksum")));
    }

    #[test]
    fn test_structurally_invalid_body_rejected() {
        let mut artifact = sample_artifact(ClassifierKind::NaiveBayes);
        artifact.encoder.terms.pop();
        artifact.encoder.idf.pop();
        // Checksum is valid, dimensions are not
        let bytes = artifact.to_bytes().unwrap();
        let err = Artifact::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, IntentError::ArtifactFormat(ref m) if m.contains("features")));
    }

    #[test]
    fn test_mismatched_label_set_rejected() {
        let mut artifact = sample_artifact(ClassifierKind::Centroid);
        artifact.labels = LabelSet::from_labels(["password_reset", "something_else"]);
        let bytes = artifact.to_bytes().unwrap();
        assert!(matches!(
            Artifact::from_bytes(&bytes),
            Err(IntentError::ArtifactFormat(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.artifact");
        let artifact = sample_artifact(ClassifierKind::NaiveBayes);

        artifact.save(&path).unwrap();
        let loaded = Artifact::load(&path).unwrap();
        assert_eq!(loaded, artifact);

        // No staging files left behind
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_predict_and_summary() {
        let artifact = sample_artifact(ClassifierKind::NaiveBayes);
        let result = artifact.predict("help me reset my password").unwrap();
        assert_eq!(result.intent, "password_reset");

        let summary = artifact.summary();
        assert_eq!(summary.labels, vec!["password_reset", "refund_policy"]);
        assert_eq!(summary.classifier, ClassifierKind::NaiveBayes);
        assert_eq!(summary.format_version, FORMAT_VERSION);
    }
}
