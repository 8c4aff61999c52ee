//! Offline training pipeline
//!
//! Stages run strictly in order:
//! `Collect -> FitEncoder -> Encode -> FitClassifier -> Evaluate -> Serialize`.
//! Any failure stops the run before an artifact is written; the artifact
//! write itself is atomic, so a previous artifact stays authoritative.

use crate::artifact::{Artifact, ArtifactMetadata, EvaluationSource};
use crate::classifier::{self, ClassifierState};
use crate::config::IntentConfig;
use crate::dataset::ExampleStore;
use crate::encoder::{FeatureEncoder, TfIdfEncoder, TfIdfState};
use crate::error::{IntentError, Result};
use crate::types::{PredictionResult, TrainingExample};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Collect,
    FitEncoder,
    Encode,
    FitClassifier,
    Evaluate,
    Serialize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Collect => "collect",
            Stage::FitEncoder => "fit_encoder",
            Stage::Encode => "encode",
            Stage::FitClassifier => "fit_classifier",
            Stage::Evaluate => "evaluate",
            Stage::Serialize => "serialize",
        };
        write!(f, "{}", name)
    }
}

/// Encoder and classifier fitted together
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub encoder: TfIdfState,
    pub classifier: ClassifierState,
}

impl FittedModel {
    /// The model frozen inside an artifact
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            encoder: artifact.encoder.clone(),
            classifier: artifact.classifier.clone(),
        }
    }

    pub fn predict(&self, text: &str) -> Result<PredictionResult> {
        self.classifier.predict(&self.encoder.encode(text))
    }
}

/// Per-label evaluation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub support: usize,
    pub correct: usize,
    pub recall: f64,
}

/// Accuracy of a model over a labeled set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub source: EvaluationSource,
    pub examples: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub per_label: BTreeMap<String, LabelScore>,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub artifact: Artifact,
    pub evaluation: Evaluation,
    pub train_examples: usize,
    /// Where the artifact was written; `None` on a dry run
    pub written_to: Option<PathBuf>,
    pub elapsed_ms: u128,
}

/// Deterministic stratified split into (train, holdout) example indices
///
/// Each label keeps at least one example on the training side.
pub fn stratified_split(
    store: &ExampleStore,
    holdout_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut holdout = Vec::new();

    for (_, mut indices) in store.indices_by_label() {
        indices.shuffle(&mut rng);
        let wanted = (indices.len() as f64 * holdout_fraction).round() as usize;
        let held = wanted.min(indices.len() - 1);
        holdout.extend_from_slice(&indices[..held]);
        train.extend_from_slice(&indices[held..]);
    }

    train.sort_unstable();
    holdout.sort_unstable();
    (train, holdout)
}

/// Score a model against labeled examples
pub fn evaluate<'a, I>(model: &FittedModel, examples: I, source: EvaluationSource) -> Result<Evaluation>
where
    I: IntoIterator<Item = &'a TrainingExample>,
{
    let mut per_label: BTreeMap<String, LabelScore> = BTreeMap::new();
    let mut total = 0usize;
    let mut correct = 0usize;

    for example in examples {
        let predicted = model.predict(&example.text)?;
        let hit = predicted.intent == example.label;
        total += 1;
        if hit {
            correct += 1;
        }
        let entry = per_label
            .entry(example.label.clone())
            .or_insert(LabelScore {
                support: 0,
                correct: 0,
                recall: 0.0,
            });
        entry.support += 1;
        if hit {
            entry.correct += 1;
        }
    }

    for score in per_label.values_mut() {
        score.recall = score.correct as f64 / score.support as f64;
    }

    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };

    Ok(Evaluation {
        source,
        examples: total,
        correct,
        accuracy,
        per_label,
    })
}

/// Runs the training stages with one configuration
pub struct TrainingPipeline {
    config: IntentConfig,
}

impl TrainingPipeline {
    pub fn new(config: IntentConfig) -> Self {
        Self { config }
    }

    /// Fit encoder and classifier on a subset of the store
    pub fn fit(&self, examples: &[&TrainingExample]) -> Result<FittedModel> {
        let encoder = TfIdfEncoder::new(self.config.encoder.clone());
        let texts: Vec<&str> = examples.iter().map(|e| e.text.as_str()).collect();
        let labels: Vec<&str> = examples.iter().map(|e| e.label.as_str()).collect();

        debug!("Stage {}: {} texts", Stage::FitEncoder, texts.len());
        let encoder_state = encoder.fit(&texts)?;

        debug!(
            "Stage {}: {} features",
            Stage::Encode,
            encoder_state.dimension()
        );
        let vectors: Vec<_> = texts
            .iter()
            .map(|text| encoder.transform(text, &encoder_state))
            .collect();

        debug!(
            "Stage {}: {} classifier",
            Stage::FitClassifier,
            self.config.classifier.kind
        );
        let classifier_state = classifier::fit(&self.config.classifier, &vectors, &labels)?;

        Ok(FittedModel {
            encoder: encoder_state,
            classifier: classifier_state,
        })
    }

    /// Train, evaluate and gate; does not touch the filesystem
    pub fn build(&self, store: &ExampleStore) -> Result<(Artifact, Evaluation, usize)> {
        let training = &self.config.training;
        info!(
            "Stage {}: {} examples across {} labels",
            Stage::Collect,
            store.len(),
            store.labels().len()
        );

        let (train_idx, holdout_idx) =
            stratified_split(store, training.holdout_fraction, training.seed);
        let examples = store.examples();
        let train_set: Vec<&TrainingExample> = train_idx.iter().map(|i| &examples[*i]).collect();

        let model = self.fit(&train_set)?;

        let evaluation = if holdout_idx.is_empty() {
            if training.holdout_fraction > 0.0 {
                warn!("Hold-out split is empty, evaluating on the training set");
            }
            evaluate(&model, train_set.iter().copied(), EvaluationSource::TrainingSet)?
        } else {
            evaluate(
                &model,
                holdout_idx.iter().map(|i| &examples[*i]),
                EvaluationSource::Holdout,
            )?
        };

        info!(
            "Stage {}: accuracy {:.4} on {} {} examples (minimum {:.4})",
            Stage::Evaluate,
            evaluation.accuracy,
            evaluation.examples,
            evaluation.source,
            training.min_accuracy
        );

        if evaluation.accuracy < training.min_accuracy {
            return Err(IntentError::Validation {
                accuracy: evaluation.accuracy,
                minimum: training.min_accuracy,
            });
        }

        let model = if training.refit_full && train_set.len() < store.len() {
            debug!("Refitting on all {} examples", store.len());
            let everything: Vec<&TrainingExample> = examples.iter().collect();
            self.fit(&everything)?
        } else {
            model
        };

        let metadata = ArtifactMetadata {
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
            example_count: store.len(),
            label_counts: store.label_counts(),
            accuracy: evaluation.accuracy,
            evaluation_source: evaluation.source,
            evaluation_examples: evaluation.examples,
            dataset_fingerprint: store.fingerprint(),
        };
        let artifact = Artifact::new(model.encoder, model.classifier, metadata)?;

        Ok((artifact, evaluation, train_set.len()))
    }

    /// Full run; writes the artifact to `output` unless it is `None`
    pub fn run(&self, store: &ExampleStore, output: Option<PathBuf>) -> Result<TrainingReport> {
        let started = Instant::now();
        let (artifact, evaluation, train_examples) = self.build(store)?;

        if let Some(path) = &output {
            info!("Stage {}: {}", Stage::Serialize, path.display());
            artifact.save(path)?;
        } else {
            info!("Stage {}: skipped (dry run)", Stage::Serialize);
        }

        Ok(TrainingReport {
            artifact,
            evaluation,
            train_examples,
            written_to: output,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(pairs: &[(&str, &str)]) -> ExampleStore {
        ExampleStore::new(
            pairs
                .iter()
                .map(|(text, label)| TrainingExample::new(*text, *label))
                .collect(),
        )
        .unwrap()
    }

    fn support_store() -> ExampleStore {
        store(&[
            ("reset my password", "password_reset"),
            ("i forgot my password", "password_reset"),
            ("how do i change my password", "password_reset"),
            ("password reset link please", "password_reset"),
            ("can't log in, need a new password", "password_reset"),
            ("what is your refund policy", "refund_policy"),
            ("can i get a refund", "refund_policy"),
            ("how do refunds work", "refund_policy"),
            ("refund my order please", "refund_policy"),
            ("is my purchase refundable", "refund_policy"),
        ])
    }

    #[test]
    fn test_split_is_stratified_and_deterministic() {
        let store = support_store();
        let (train, holdout) = stratified_split(&store, 0.2, 7);
        assert_eq!(holdout.len(), 2);
        assert_eq!(train.len(), 8);

        let held_labels: Vec<&str> = holdout
            .iter()
            .map(|i| store.examples()[*i].label.as_str())
            .collect();
        assert!(held_labels.contains(&"password_reset"));
        assert!(held_labels.contains(&"refund_policy"));

        assert_eq!(stratified_split(&store, 0.2, 7), (train, holdout));
    }

    #[test]
    fn test_split_keeps_one_training_example_per_label() {
        let store = store(&[("hi", "greeting"), ("bye", "goodbye"), ("see you", "goodbye")]);
        let (train, holdout) = stratified_split(&store, 0.9, 1);
        assert_eq!(train.len(), 2);
        assert_eq!(holdout.len(), 1);
    }

    #[test]
    fn test_build_on_support_store() {
        let pipeline = TrainingPipeline::new(IntentConfig::default());
        let (artifact, evaluation, train_examples) = pipeline.build(&support_store()).unwrap();

        assert_eq!(evaluation.source, EvaluationSource::Holdout);
        assert_eq!(evaluation.examples, 2);
        assert_eq!(train_examples, 8);
        assert_eq!(artifact.metadata.example_count, 10);
        assert_eq!(
            artifact.predict("i need to reset my password").unwrap().intent,
            "password_reset"
        );
        assert_eq!(
            artifact.predict("refund please").unwrap().intent,
            "refund_policy"
        );
    }

    #[test]
    fn test_accuracy_gate() {
        let mut config = IntentConfig::default();
        config.training.min_accuracy = 1.0;
        config.training.holdout_fraction = 0.5;
        config.training.refit_full = false;
        // Hold-out texts share no vocabulary with training texts
        let store = store(&[
            ("alpha beta", "a"),
            ("gamma delta", "a"),
            ("epsilon zeta", "b"),
            ("eta theta", "b"),
            ("iota kappa", "b"),
        ]);

        let err = TrainingPipeline::new(config).build(&store).unwrap_err();
        assert!(matches!(err, IntentError::Validation { minimum, .. } if minimum == 1.0));
    }

    #[test]
    fn test_evaluate_reports_per_label_recall() {
        let pipeline = TrainingPipeline::new(IntentConfig::default());
        let store = support_store();
        let everything: Vec<&TrainingExample> = store.examples().iter().collect();
        let model = pipeline.fit(&everything).unwrap();

        let evaluation =
            evaluate(&model, store.examples(), EvaluationSource::TrainingSet).unwrap();
        assert_eq!(evaluation.examples, 10);
        assert_eq!(evaluation.per_label["password_reset"].support, 5);
        assert!(evaluation.accuracy > 0.9);
    }

    #[test]
    fn test_evaluate_loaded_artifact_as_external() {
        let pipeline = TrainingPipeline::new(IntentConfig::default());
        let store = support_store();
        let (artifact, _, _) = pipeline.build(&store).unwrap();
        let model = FittedModel::from_artifact(&artifact);

        let evaluation = evaluate(&model, store.examples(), EvaluationSource::External).unwrap();
        assert_eq!(evaluation.source, EvaluationSource::External);
        assert_eq!(evaluation.examples, store.len());
        assert_ne!(evaluation.source, artifact.metadata.evaluation_source);

        let json = serde_json::to_value(&evaluation).unwrap();
        assert_eq!(json["source"], "external");
    }

    #[test]
    fn test_run_dry_run_writes_nothing() {
        let pipeline = TrainingPipeline::new(IntentConfig::default());
        let report = pipeline.run(&support_store(), None).unwrap();
        assert!(report.written_to.is_none());
        assert_eq!(report.artifact.labels.len(), 2);
    }

    #[test]
    fn test_failed_gate_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.artifact");

        let pipeline = TrainingPipeline::new(IntentConfig::default());
        pipeline.run(&support_store(), Some(path.clone())).unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut strict = IntentConfig::default();
        strict.training.min_accuracy = 1.0;
        strict.training.holdout_fraction = 0.5;
        let unlearnable = store(&[
            ("alpha beta", "a"),
            ("gamma delta", "a"),
            ("epsilon zeta", "b"),
            ("eta theta", "b"),
            ("iota kappa", "b"),
        ]);
        let result = TrainingPipeline::new(strict).run(&unlearnable, Some(path.clone()));
        assert!(matches!(result, Err(IntentError::Validation { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
