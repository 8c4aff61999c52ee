//! Common test utilities and helpers

#![allow(dead_code)]

use intent_core::{
    Artifact, ExampleStore, InferenceService, IntentConfig, ModelSlot, TrainingExample,
    TrainingPipeline,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// The two-example support store used throughout the service scenarios
pub fn scenario_store() -> ExampleStore {
    ExampleStore::new(vec![
        TrainingExample::new("reset my password", "password_reset"),
        TrainingExample::new("what is your refund policy", "refund_policy"),
    ])
    .expect("Failed to create scenario store")
}

/// A larger store with enough examples per intent for a real hold-out split
pub fn support_store() -> ExampleStore {
    let pairs = [
        ("reset my password", "password_reset"),
        ("i forgot my password", "password_reset"),
        ("how do i change my password", "password_reset"),
        ("send me a password reset link", "password_reset"),
        ("locked out, need a new password", "password_reset"),
        ("what is your refund policy", "refund_policy"),
        ("can i get a refund", "refund_policy"),
        ("how do refunds work", "refund_policy"),
        ("refund my order please", "refund_policy"),
        ("is my purchase refundable", "refund_policy"),
        ("where is my order", "order_status"),
        ("has my package shipped", "order_status"),
        ("track my delivery", "order_status"),
        ("when will my order arrive", "order_status"),
        ("order tracking number", "order_status"),
    ];
    ExampleStore::new(
        pairs
            .iter()
            .map(|(text, label)| TrainingExample::new(*text, *label))
            .collect(),
    )
    .expect("Failed to create support store")
}

/// Train an artifact in memory with the default configuration
pub fn train_artifact(store: &ExampleStore) -> Artifact {
    let (artifact, _, _) = TrainingPipeline::new(IntentConfig::default())
        .build(store)
        .expect("Failed to train artifact");
    artifact
}

/// Train the scenario store and write it into a fresh temporary directory
///
/// The returned `TempDir` must outlive the path.
pub fn write_scenario_artifact() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("intent.artifact");
    TrainingPipeline::new(IntentConfig::default())
        .run(&scenario_store(), Some(path.clone()))
        .expect("Failed to write artifact");
    (dir, path)
}

/// A readiness slot already holding the scenario model
pub fn ready_slot() -> ModelSlot {
    ModelSlot::ready(InferenceService::new(train_artifact(&scenario_store())))
}
