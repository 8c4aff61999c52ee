//! Classifiers: trained decision functions from feature vectors to labels
//!
//! Every classifier resolves ties the same way: highest score, then the
//! label with the most training examples, then the lowest label index. An
//! all-zero vector therefore always lands on the majority class.

pub mod centroid;
pub mod naive_bayes;

pub use centroid::{CentroidClassifier, CentroidState};
pub use naive_bayes::{NaiveBayesClassifier, NaiveBayesState};

use crate::config::{ClassifierConfig, ClassifierKind};
use crate::error::{IntentError, Result};
use crate::types::{FeatureVector, LabelSet, PredictionResult};
use serde::{Deserialize, Serialize};

/// Fit/predict contract shared by classifiers
pub trait Classifier {
    /// Trained state produced by `fit`
    type State;

    /// Train on parallel slices of vectors and labels
    fn fit(&self, vectors: &[FeatureVector], labels: &[&str]) -> Result<Self::State>;

    /// Label (from the trained label set) and confidence for one vector
    fn predict(&self, vector: &[f32], state: &Self::State) -> Result<PredictionResult>;
}

/// Trained classifier of any supported kind, as stored in an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierState {
    NaiveBayes(NaiveBayesState),
    Centroid(CentroidState),
}

impl ClassifierState {
    pub fn kind(&self) -> ClassifierKind {
        match self {
            ClassifierState::NaiveBayes(_) => ClassifierKind::NaiveBayes,
            ClassifierState::Centroid(_) => ClassifierKind::Centroid,
        }
    }

    pub fn labels(&self) -> &LabelSet {
        match self {
            ClassifierState::NaiveBayes(state) => &state.labels,
            ClassifierState::Centroid(state) => &state.labels,
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            ClassifierState::NaiveBayes(state) => state.dimension,
            ClassifierState::Centroid(state) => state.dimension,
        }
    }

    pub fn predict(&self, vector: &[f32]) -> Result<PredictionResult> {
        match self {
            ClassifierState::NaiveBayes(state) => state.predict(vector),
            ClassifierState::Centroid(state) => state.predict(vector),
        }
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        match self {
            ClassifierState::NaiveBayes(state) => state.validate(),
            ClassifierState::Centroid(state) => state.validate(),
        }
    }
}

/// Fit the classifier selected by configuration
pub fn fit(
    config: &ClassifierConfig,
    vectors: &[FeatureVector],
    labels: &[&str],
) -> Result<ClassifierState> {
    match config.kind {
        ClassifierKind::NaiveBayes => NaiveBayesClassifier::new(config.alpha)
            .fit(vectors, labels)
            .map(ClassifierState::NaiveBayes),
        ClassifierKind::Centroid => CentroidClassifier
            .fit(vectors, labels)
            .map(ClassifierState::Centroid),
    }
}

/// Checked training input: label set, per-example label index, class sizes
pub(crate) struct FitInput {
    pub labels: LabelSet,
    pub targets: Vec<usize>,
    pub class_counts: Vec<u32>,
    pub dimension: usize,
}

pub(crate) fn prepare_fit(vectors: &[FeatureVector], labels: &[&str]) -> Result<FitInput> {
    if vectors.is_empty() {
        return Err(IntentError::Training(
            "cannot fit classifier without examples".to_string(),
        ));
    }
    if vectors.len() != labels.len() {
        return Err(IntentError::Training(format!(
            "{} vectors but {} labels",
            vectors.len(),
            labels.len()
        )));
    }

    let dimension = vectors[0].len();
    if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
        return Err(IntentError::Training(format!(
            "vector {} has dimension {}, expected {}",
            position,
            vectors[position].len(),
            dimension
        )));
    }
    if vectors.iter().flatten().any(|v| !v.is_finite()) {
        return Err(IntentError::Training(
            "feature vectors contain non-finite values".to_string(),
        ));
    }

    let label_set = LabelSet::from_labels(labels.iter().copied());
    let mut class_counts = vec![0u32; label_set.len()];
    let mut targets = Vec::with_capacity(labels.len());
    for label in labels {
        let index = label_set
            .index_of(label)
            .ok_or_else(|| IntentError::Internal(format!("label '{}' not indexed", label)))?;
        class_counts[index] += 1;
        targets.push(index);
    }

    Ok(FitInput {
        labels: label_set,
        targets,
        class_counts,
        dimension,
    })
}

/// Pick the winning class index under the shared tie-break rule
pub(crate) fn select_best(scores: &[f64], class_counts: &[u32]) -> Result<usize> {
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(IntentError::Internal(
            "classifier produced a non-finite score".to_string(),
        ));
    }

    let mut best: Option<usize> = None;
    for index in 0..scores.len() {
        best = match best {
            None => Some(index),
            Some(current) => {
                let better = scores[index] > scores[current]
                    || (scores[index] == scores[current]
                        && class_counts[index] > class_counts[current]);
                if better {
                    Some(index)
                } else {
                    Some(current)
                }
            }
        };
    }

    best.ok_or_else(|| IntentError::Internal("classifier has no classes".to_string()))
}

pub(crate) fn check_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(IntentError::Internal(format!(
            "feature vector has dimension {}, classifier expects {}",
            vector.len(),
            expected
        )));
    }
    Ok(())
}

/// Checks shared by all classifier states
pub(crate) fn validate_common(
    labels: &LabelSet,
    class_counts: &[u32],
) -> std::result::Result<(), String> {
    if labels.is_empty() {
        return Err("classifier label set is empty".to_string());
    }
    if !labels.is_canonical() {
        return Err("classifier label set is not sorted and distinct".to_string());
    }
    if class_counts.len() != labels.len() {
        return Err(format!(
            "classifier has {} labels but {} class counts",
            labels.len(),
            class_counts.len()
        ));
    }
    if class_counts.iter().any(|count| *count == 0) {
        return Err("classifier has a class without training examples".to_string());
    }
    Ok(())
}
