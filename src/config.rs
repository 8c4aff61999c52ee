//! Configuration for training and serving
//!
//! Values are layered with the `config` crate:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`, or `intent.toml` in the working directory)
//! 3. Environment variables `INTENT_<SECTION>__<KEY>` (e.g. `INTENT_SERVER__PORT`)
//!
//! CLI flags are applied on top by the binary.

use crate::error::{IntentError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File picked up automatically when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "intent.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "INTENT";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Where the trained artifact is written and loaded from
    pub artifact_path: PathBuf,
    pub server: ServerConfig,
    pub training: TrainingConfig,
    pub encoder: EncoderConfig,
    pub classifier: ClassifierConfig,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("model/intent.artifact"),
            server: ServerConfig::default(),
            training: TrainingConfig::default(),
            encoder: EncoderConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Longest accepted `text` value, in bytes
    pub max_text_bytes: usize,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_text_bytes: 10_000,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                IntentError::Config(config::ConfigError::Message(format!(
                    "Invalid server address '{}:{}': {}",
                    self.host, self.port, e
                )))
            })
    }
}

/// Training pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Quality gate: minimum accuracy on the evaluation split
    pub min_accuracy: f64,
    /// Share of each label's examples held out for evaluation
    pub holdout_fraction: f64,
    /// Seed for the hold-out shuffle
    pub seed: u64,
    /// Refit on the full store once the gate passes
    pub refit_full: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_accuracy: 0.5,
            holdout_fraction: 0.2,
            seed: 42,
            refit_full: true,
        }
    }
}

/// TF-IDF encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Largest word n-gram (1 = unigrams only)
    pub ngram_max: usize,
    /// Minimum number of documents a term must appear in
    pub min_df: usize,
    /// Keep only the most frequent terms
    pub max_features: Option<usize>,
    /// Use `1 + ln(tf)` instead of raw counts
    pub sublinear_tf: bool,
    /// Shorter tokens are ignored
    pub min_token_len: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ngram_max: 2,
            min_df: 1,
            max_features: None,
            sublinear_tf: true,
            min_token_len: 1,
        }
    }
}

/// Classifier family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    NaiveBayes,
    Centroid,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::NaiveBayes => write!(f, "naive_bayes"),
            ClassifierKind::Centroid => write!(f, "centroid"),
        }
    }
}

/// Classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    /// Additive smoothing for naive Bayes
    pub alpha: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::NaiveBayes,
            alpha: 1.0,
        }
    }
}

impl IntentConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// An explicitly given file must exist; the default `intent.toml` is
    /// optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: IntentConfig = settings.try_deserialize()?;
        cfg.validate()?;
        debug!("Loaded configuration: {:?}", cfg);
        Ok(cfg)
    }

    /// Reject values that would make training or serving meaningless
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(IntentError::Config(config::ConfigError::Message(msg)));

        if !(0.0..=1.0).contains(&self.training.min_accuracy) {
            return invalid(format!(
                "training.min_accuracy must be within [0, 1], got {}",
                self.training.min_accuracy
            ));
        }
        if !(0.0..1.0).contains(&self.training.holdout_fraction) {
            return invalid(format!(
                "training.holdout_fraction must be within [0, 1), got {}",
                self.training.holdout_fraction
            ));
        }
        if self.encoder.ngram_max == 0 {
            return invalid("encoder.ngram_max must be at least 1".to_string());
        }
        if self.encoder.min_df == 0 {
            return invalid("encoder.min_df must be at least 1".to_string());
        }
        if self.encoder.max_features == Some(0) {
            return invalid("encoder.max_features must be at least 1 when set".to_string());
        }
        if !(self.classifier.alpha > 0.0 && self.classifier.alpha.is_finite()) {
            return invalid(format!(
                "classifier.alpha must be a positive number, got {}",
                self.classifier.alpha
            ));
        }
        if self.server.max_text_bytes == 0 {
            return invalid("server.max_text_bytes must be at least 1".to_string());
        }
        Ok(())
    }
}
