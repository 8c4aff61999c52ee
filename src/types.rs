//! Core data types for the intent classification service
//!
//! These types are shared by the training pipeline, the artifact codec and
//! the inference service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A labeled utterance from the example store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub label: String,
}

impl TrainingExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// The fixed universe of intents known to one artifact
///
/// Labels are kept sorted and deduplicated. A label's index is its position
/// in that order, which is how classifier tables refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    /// Build a label set from any collection of labels
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self(set.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of a label, if it belongs to the set
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.0.binary_search_by(|candidate| candidate.as_str().cmp(label)).ok()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// True when the labels are strictly increasing (sorted, no duplicates)
    pub(crate) fn is_canonical(&self) -> bool {
        self.0.windows(2).all(|pair| pair[0] < pair[1])
    }
}

/// Dense numeric representation of one text
pub type FeatureVector = Vec<f32>;

/// Body of a predict request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
}

/// Outcome of a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub intent: String,
    /// Classifier confidence in [0, 1]
    pub confidence: f32,
}
