//! Intent - train, package and serve free-text intent classifiers
//!
//! The crate covers the whole inference pipeline:
//! - **Example store**: labeled utterances loaded from JSON or JSON Lines
//! - **Encoder**: deterministic TF-IDF features, fit once and frozen
//! - **Classifier**: multinomial naive Bayes or nearest centroid
//! - **Training pipeline**: fit, evaluate against an accuracy gate, serialize
//! - **Artifact**: versioned, checksummed bundle of encoder, classifier and labels
//! - **Inference service**: loads one artifact and answers health/predict over HTTP
//!
//! # Example
//!
//! ```no_run
//! use intent_core::{ExampleStore, IntentConfig, TrainingExample, TrainingPipeline};
//!
//! # fn main() -> intent_core::Result<()> {
//! let store = ExampleStore::new(vec![
//!     TrainingExample::new("reset my password", "password_reset"),
//!     TrainingExample::new("what is your refund policy", "refund_policy"),
//! ])?;
//!
//! let pipeline = TrainingPipeline::new(IntentConfig::default());
//! let report = pipeline.run(&store, Some("model/intent.artifact".into()))?;
//!
//! let prediction = report.artifact.predict("help me reset my password")?;
//! assert_eq!(prediction.intent, "password_reset");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod artifact;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod health;
pub mod service;
pub mod training;
pub mod types;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactMetadata, ArtifactSummary, EvaluationSource};
pub use config::{ClassifierKind, IntentConfig};
pub use dataset::ExampleStore;
pub use error::{IntentError, Result};
pub use service::{InferenceService, ModelSlot, Readiness};
pub use training::{Evaluation, TrainingPipeline, TrainingReport};
pub use types::{LabelSet, PredictionRequest, PredictionResult, TrainingExample};
