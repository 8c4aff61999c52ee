//! Nearest-centroid classifier using cosine similarity

use super::{check_dimension, prepare_fit, select_best, validate_common, Classifier};
use crate::error::{IntentError, Result};
use crate::types::{FeatureVector, LabelSet, PredictionResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cosine between an encoded text and a class centroid, accumulated in f64
///
/// Callers check dimensions first. A zero vector on either side scores 0.
fn cosine(vector: &[f32], centroid: &[f32]) -> f64 {
    let (dot, norm_v, norm_c) = vector.iter().zip(centroid).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, nv, nc), (&v, &c)| {
            let (v, c) = (f64::from(v), f64::from(c));
            (dot + v * c, nv + v * v, nc + c * c)
        },
    );

    if norm_v == 0.0 || norm_c == 0.0 {
        0.0
    } else {
        dot / (norm_v.sqrt() * norm_c.sqrt())
    }
}

/// Mean vector of every class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidState {
    pub labels: LabelSet,
    pub dimension: usize,
    pub class_counts: Vec<u32>,
    pub centroids: Vec<Vec<f32>>,
}

impl CentroidState {
    pub fn predict(&self, vector: &[f32]) -> Result<PredictionResult> {
        check_dimension(vector, self.dimension)?;
        let scores: Vec<f64> = self
            .centroids
            .iter()
            .map(|centroid| cosine(vector, centroid))
            .collect();
        let best = select_best(&scores, &self.class_counts)?;

        let intent = self
            .labels
            .get(best)
            .ok_or_else(|| IntentError::Internal(format!("class {} has no label", best)))?;

        Ok(PredictionResult {
            intent: intent.to_string(),
            confidence: (scores[best] as f32).clamp(0.0, 1.0),
        })
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        validate_common(&self.labels, &self.class_counts)?;
        if self.centroids.len() != self.labels.len() {
            return Err("centroid table does not match label count".to_string());
        }
        if self.centroids.iter().any(|c| c.len() != self.dimension) {
            return Err("centroid has the wrong dimension".to_string());
        }
        if self.centroids.iter().flatten().any(|v| !v.is_finite()) {
            return Err("centroids contain non-finite values".to_string());
        }
        Ok(())
    }
}

/// Fits [`CentroidState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidClassifier;

impl Classifier for CentroidClassifier {
    type State = CentroidState;

    fn fit(&self, vectors: &[FeatureVector], labels: &[&str]) -> Result<CentroidState> {
        let input = prepare_fit(vectors, labels)?;

        let mut centroids = vec![vec![0.0f32; input.dimension]; input.labels.len()];
        for (vector, target) in vectors.iter().zip(&input.targets) {
            for (slot, value) in centroids[*target].iter_mut().zip(vector) {
                *slot += value;
            }
        }
        for (centroid, count) in centroids.iter_mut().zip(&input.class_counts) {
            let count = *count as f32;
            for value in centroid.iter_mut() {
                *value /= count;
            }
        }

        debug!(
            "Fitted nearest-centroid classifier: {} classes, {} features",
            input.labels.len(),
            input.dimension
        );

        Ok(CentroidState {
            labels: input.labels,
            dimension: input.dimension,
            class_counts: input.class_counts,
            centroids,
        })
    }

    fn predict(&self, vector: &[f32], state: &CentroidState) -> Result<PredictionResult> {
        state.predict(vector)
    }
}
