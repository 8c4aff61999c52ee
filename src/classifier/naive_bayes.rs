//! Multinomial naive Bayes over TF-IDF weights

use super::{check_dimension, prepare_fit, select_best, validate_common, Classifier};
use crate::error::{IntentError, Result};
use crate::types::{FeatureVector, LabelSet, PredictionResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trained naive Bayes tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesState {
    pub labels: LabelSet,
    pub dimension: usize,
    pub class_counts: Vec<u32>,
    /// ln P(class)
    pub class_log_prior: Vec<f64>,
    /// ln P(feature | class), one row per class
    pub feature_log_prob: Vec<Vec<f64>>,
}

impl NaiveBayesState {
    /// Joint log-likelihood of every class
    fn scores(&self, vector: &[f32]) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, row)| {
                prior
                    + vector
                        .iter()
                        .zip(row)
                        .filter(|(x, _)| **x != 0.0)
                        .map(|(x, log_prob)| *x as f64 * log_prob)
                        .sum::<f64>()
            })
            .collect()
    }

    pub fn predict(&self, vector: &[f32]) -> Result<PredictionResult> {
        check_dimension(vector, self.dimension)?;
        let scores = self.scores(vector);
        let best = select_best(&scores, &self.class_counts)?;

        // Softmax probability of the winner
        let top = scores[best];
        let partition: f64 = scores.iter().map(|s| (s - top).exp()).sum();
        let confidence = (1.0 / partition).clamp(0.0, 1.0) as f32;

        let intent = self
            .labels
            .get(best)
            .ok_or_else(|| IntentError::Internal(format!("class {} has no label", best)))?;

        Ok(PredictionResult {
            intent: intent.to_string(),
            confidence,
        })
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        validate_common(&self.labels, &self.class_counts)?;
        if self.class_log_prior.len() != self.labels.len() {
            return Err("naive bayes prior table does not match label count".to_string());
        }
        if self.feature_log_prob.len() != self.labels.len() {
            return Err("naive bayes likelihood table does not match label count".to_string());
        }
        if self
            .feature_log_prob
            .iter()
            .any(|row| row.len() != self.dimension)
        {
            return Err("naive bayes likelihood row has the wrong dimension".to_string());
        }
        let finite = self
            .class_log_prior
            .iter()
            .chain(self.feature_log_prob.iter().flatten())
            .all(|v| v.is_finite());
        if !finite {
            return Err("naive bayes tables contain non-finite values".to_string());
        }
        Ok(())
    }
}

/// Fits [`NaiveBayesState`] with additive smoothing `alpha`
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    alpha: f64,
}

impl NaiveBayesClassifier {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha as f64,
        }
    }
}

impl Classifier for NaiveBayesClassifier {
    type State = NaiveBayesState;

    fn fit(&self, vectors: &[FeatureVector], labels: &[&str]) -> Result<NaiveBayesState> {
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(IntentError::Training(format!(
                "smoothing alpha must be positive, got {}",
                self.alpha
            )));
        }
        let input = prepare_fit(vectors, labels)?;
        let classes = input.labels.len();

        let mut feature_count = vec![vec![0.0f64; input.dimension]; classes];
        for (vector, target) in vectors.iter().zip(&input.targets) {
            for (slot, value) in feature_count[*target].iter_mut().zip(vector) {
                *slot += *value as f64;
            }
        }

        let smoothing_mass = self.alpha * input.dimension as f64;
        let feature_log_prob = feature_count
            .iter()
            .map(|row| {
                let total: f64 = row.iter().sum::<f64>() + smoothing_mass;
                row.iter()
                    .map(|count| (count + self.alpha).ln() - total.ln())
                    .collect()
            })
            .collect();

        let examples = vectors.len() as f64;
        let class_log_prior = input
            .class_counts
            .iter()
            .map(|count| (*count as f64 / examples).ln())
            .collect();

        debug!(
            "Fitted naive Bayes: {} classes, {} features, alpha {}",
            classes, input.dimension, self.alpha
        );

        Ok(NaiveBayesState {
            labels: input.labels,
            dimension: input.dimension,
            class_counts: input.class_counts,
            class_log_prior,
            feature_log_prob,
        })
    }

    fn predict(&self, vector: &[f32], state: &NaiveBayesState) -> Result<PredictionResult> {
        state.predict(vector)
    }
}
