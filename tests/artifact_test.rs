//! Property-based tests for artifacts
//!
//! Verifies that serialization preserves predictions, that predictions stay
//! inside the label set, and that any single-byte corruption is detected.

mod common;

use intent_core::{Artifact, ClassifierKind, IntentConfig, IntentError, TrainingPipeline};
use once_cell::sync::Lazy;
use proptest::prelude::*;

// ============================================================================
// Fixtures
// ============================================================================

static NAIVE_BAYES: Lazy<Artifact> = Lazy::new(|| build(ClassifierKind::NaiveBayes));
static CENTROID: Lazy<Artifact> = Lazy::new(|| build(ClassifierKind::Centroid));
static NAIVE_BAYES_BYTES: Lazy<Vec<u8>> = Lazy::new(|| NAIVE_BAYES.to_bytes().unwrap());

fn build(kind: ClassifierKind) -> Artifact {
    let mut config = IntentConfig::default();
    config.classifier.kind = kind;
    config.training.min_accuracy = 0.0;
    let (artifact, _, _) = TrainingPipeline::new(config)
        .build(&common::support_store())
        .unwrap();
    artifact
}

fn utterance() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\PC{0,120}",
        prop::collection::vec(
            prop::sample::select(vec![
                "reset", "my", "password", "refund", "order", "where", "is", "the", "policy",
                "track", "xyz", "please",
            ]),
            0..12
        )
        .prop_map(|words| words.join(" ")),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_round_trip_preserves_predictions(text in utterance()) {
        for artifact in [&*NAIVE_BAYES, &*CENTROID] {
            let restored = Artifact::from_bytes(&artifact.to_bytes().unwrap()).unwrap();
            prop_assert_eq!(artifact.predict(&text).unwrap(), restored.predict(&text).unwrap());
        }
    }

    #[test]
    fn prop_prediction_is_a_known_label(text in utterance()) {
        for artifact in [&*NAIVE_BAYES, &*CENTROID] {
            let result = artifact.predict(&text).unwrap();
            prop_assert!(artifact.labels.contains(&result.intent));
            prop_assert!(result.confidence.is_finite());
            prop_assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn prop_any_flipped_byte_is_rejected(index in any::<prop::sample::Index>(), mask in 1u8..=255) {
        let mut bytes = NAIVE_BAYES_BYTES.clone();
        let position = index.index(bytes.len());
        bytes[position] ^= mask;
        let result = Artifact::from_bytes(&bytes);
        prop_assert!(matches!(result, Err(IntentError::ArtifactFormat(_))));
    }

    #[test]
    fn prop_truncation_is_rejected(keep in 0usize..1024) {
        let bytes = &*NAIVE_BAYES_BYTES;
        let keep = keep.min(bytes.len() - 1);
        let result = Artifact::from_bytes(&bytes[..keep]);
        prop_assert!(matches!(result, Err(IntentError::ArtifactFormat(_))));
    }
}

// ============================================================================
// Format details
// ============================================================================

#[test]
fn test_round_trip_is_lossless() {
    for artifact in [&*NAIVE_BAYES, &*CENTROID] {
        let restored = Artifact::from_bytes(&artifact.to_bytes().unwrap()).unwrap();
        assert_eq!(&restored, artifact);
    }
}

#[test]
fn test_header_layout() {
    let bytes = &*NAIVE_BAYES_BYTES;
    assert_eq!(&bytes[..8], b"INTENTAF");
    assert_eq!(&bytes[8..12], &1u32.to_be_bytes());
    let declared = u64::from_be_bytes(bytes[44..52].try_into().unwrap());
    assert_eq!(declared as usize, bytes.len() - 52);
}

#[test]
fn test_future_version_is_rejected() {
    let mut bytes = NAIVE_BAYES_BYTES.clone();
    bytes[8..12].copy_from_slice(&2u32.to_be_bytes());
    match Artifact::from_bytes(&bytes) {
        Err(IntentError::ArtifactFormat(reason)) => assert!(reason.contains("version")),
        other => panic!("expected format error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_appended_bytes_are_rejected() {
    let mut bytes = NAIVE_BAYES_BYTES.clone();
    bytes.push(0);
    assert!(matches!(
        Artifact::from_bytes(&bytes),
        Err(IntentError::ArtifactFormat(_))
    ));
}

#[test]
fn test_summary_matches_artifact() {
    let summary = NAIVE_BAYES.summary();
    assert_eq!(summary.format_version, 1);
    assert_eq!(
        summary.labels,
        vec!["order_status", "password_reset", "refund_policy"]
    );
    assert_eq!(summary.classifier, ClassifierKind::NaiveBayes);
    assert_eq!(summary.dimension, NAIVE_BAYES.encoder.dimension());
    assert_eq!(summary.metadata.label_counts.values().sum::<usize>(), 15);
}
