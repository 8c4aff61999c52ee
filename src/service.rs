//! Inference service: one loaded artifact, read-only, shared by every request
//!
//! [`InferenceService`] is built once from an artifact and never mutated.
//! [`ModelSlot`] tracks readiness: it starts empty (`NotReady`) and is filled
//! exactly once after the artifact has been fully deserialized.

use crate::artifact::{Artifact, ArtifactSummary};
use crate::error::{IntentError, Result};
use crate::types::{LabelSet, PredictionRequest, PredictionResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Default limit on the size of a text to classify, in bytes
pub const DEFAULT_MAX_TEXT_BYTES: usize = 10_000;

/// Health of a service instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotReady,
}

/// Immutable prediction service over one artifact
#[derive(Debug)]
pub struct InferenceService {
    artifact: Artifact,
    max_text_bytes: usize,
}

impl InferenceService {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }

    pub fn with_max_text_bytes(mut self, max_text_bytes: usize) -> Self {
        self.max_text_bytes = max_text_bytes;
        self
    }

    /// Load and validate an artifact file
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = Artifact::load(path)?;
        info!(
            "Loaded artifact {} ({} labels, {} features, {})",
            path.display(),
            artifact.labels.len(),
            artifact.encoder.dimension(),
            artifact.classifier.kind()
        );
        Ok(Self::new(artifact))
    }

    pub fn labels(&self) -> &LabelSet {
        &self.artifact.labels
    }

    pub fn summary(&self) -> ArtifactSummary {
        self.artifact.summary()
    }

    /// Classify one request
    ///
    /// Empty text is accepted and resolved by the classifier's tie-break.
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        if request.text.len() > self.max_text_bytes {
            return Err(IntentError::InvalidInput(format!(
                "'text' is {} bytes, the limit is {}",
                request.text.len(),
                self.max_text_bytes
            )));
        }

        let result = self.artifact.predict(&request.text)?;
        debug!(
            "Predicted '{}' ({:.3}) for {} bytes of text",
            result.intent,
            result.confidence,
            request.text.len()
        );
        Ok(result)
    }
}

/// Holds the service once startup loading has finished
#[derive(Debug, Default)]
pub struct ModelSlot {
    service: OnceLock<Arc<InferenceService>>,
}

impl ModelSlot {
    /// An empty slot; reports `NotReady`
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that is ready from the start
    pub fn ready(service: InferenceService) -> Self {
        let slot = Self::new();
        let _ = slot.service.set(Arc::new(service));
        slot
    }

    /// Fill the slot; a slot can only be filled once
    pub fn install(&self, service: InferenceService) -> Result<()> {
        self.service
            .set(Arc::new(service))
            .map_err(|_| IntentError::Internal("model already loaded".to_string()))
    }

    pub fn get(&self) -> Option<Arc<InferenceService>> {
        self.service.get().cloned()
    }

    pub fn health(&self) -> Readiness {
        if self.service.get().is_some() {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }

    /// Predict through the loaded service, or fail with `NotReady`
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        self.service
            .get()
            .ok_or(IntentError::NotReady)?
            .predict(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntentConfig;
    use crate::dataset::ExampleStore;
    use crate::training::TrainingPipeline;
    use crate::types::TrainingExample;

    fn service() -> InferenceService {
        let store = ExampleStore::new(vec![
            TrainingExample::new("reset my password", "password_reset"),
            TrainingExample::new("what is your refund policy", "refund_policy"),
        ])
        .unwrap();
        let (artifact, _, _) = TrainingPipeline::new(IntentConfig::default())
            .build(&store)
            .unwrap();
        InferenceService::new(artifact)
    }

    fn request(text: &str) -> PredictionRequest {
        PredictionRequest {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_slot_starts_not_ready() {
        let slot = ModelSlot::new();
        assert_eq!(slot.health(), Readiness::NotReady);
        assert!(slot.get().is_none());
        assert!(matches!(
            slot.predict(&request("hello")),
            Err(IntentError::NotReady)
        ));
    }

    #[test]
    fn test_slot_becomes_ready_once() {
        let slot = ModelSlot::new();
        slot.install(service()).unwrap();
        assert_eq!(slot.health(), Readiness::Ready);
        assert!(slot.install(service()).is_err());
        assert_eq!(slot.health(), Readiness::Ready);
    }

    #[test]
    fn test_predict_scenario() {
        let slot = ModelSlot::ready(service());
        let result = slot.predict(&request("help me reset my password")).unwrap();
        assert_eq!(result.intent, "password_reset");

        let result = slot.predict(&request("unrelated gibberish xyz")).unwrap();
        assert!(slot.get().unwrap().labels().contains(&result.intent));
    }

    #[test]
    fn test_empty_text_is_classified() {
        let service = service();
        let result = service.predict(&request("")).unwrap();
        assert!(service.labels().contains(&result.intent));
    }

    #[test]
    fn test_oversized_text_rejected() {
        let service = service().with_max_text_bytes(8);
        assert!(matches!(
            service.predict(&request("this is far too long")),
            Err(IntentError::InvalidInput(_))
        ));
        assert!(service.predict(&request("password")).is_ok());
    }
}
