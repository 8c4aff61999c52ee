//! TF-IDF feature encoder
//!
//! Vocabulary terms are stored in lexicographic order and a term's feature
//! index is its position in that order, so fitting the same corpus twice
//! produces identical state.

use super::tokenize::{self, TokenizerSettings};
use super::FeatureEncoder;
use crate::config::EncoderConfig;
use crate::error::{IntentError, Result};
use crate::types::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Frozen TF-IDF state: everything needed to encode text after training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfState {
    pub ngram_max: usize,
    pub min_token_len: usize,
    pub sublinear_tf: bool,
    /// Sorted, distinct vocabulary
    pub terms: Vec<String>,
    /// Inverse document frequency per term, parallel to `terms`
    pub idf: Vec<f32>,
}

impl TfIdfState {
    /// Dimension of every vector this state produces
    pub fn dimension(&self) -> usize {
        self.terms.len()
    }

    fn settings(&self) -> TokenizerSettings {
        TokenizerSettings {
            ngram_max: self.ngram_max,
            min_token_len: self.min_token_len,
        }
    }

    fn index_of(&self, term: &str) -> Option<usize> {
        self.terms
            .binary_search_by(|candidate| candidate.as_str().cmp(term))
            .ok()
    }

    /// Encode one text; unseen terms are ignored and empty text gives zeros
    pub fn encode(&self, text: &str) -> FeatureVector {
        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for term in tokenize::terms(text, self.settings()) {
            if let Some(index) = self.index_of(&term) {
                *counts.entry(index).or_insert(0) += 1;
            }
        }

        let mut vector = vec![0.0f32; self.dimension()];
        for (index, count) in counts {
            let tf = if self.sublinear_tf {
                1.0 + (count as f32).ln()
            } else {
                count as f32
            };
            vector[index] = tf * self.idf[index];
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    /// Structural checks used when loading an artifact
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.ngram_max == 0 {
            return Err("encoder ngram_max is zero".to_string());
        }
        if self.terms.len() != self.idf.len() {
            return Err(format!(
                "encoder has {} terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            ));
        }
        if !self.terms.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err("encoder vocabulary is not sorted and distinct".to_string());
        }
        if self.idf.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err("encoder idf weights must be positive and finite".to_string());
        }
        Ok(())
    }
}

/// Fits [`TfIdfState`] from a corpus
#[derive(Debug, Clone)]
pub struct TfIdfEncoder {
    config: EncoderConfig,
}

impl TfIdfEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }
}

impl FeatureEncoder for TfIdfEncoder {
    type State = TfIdfState;

    fn fit(&self, texts: &[&str]) -> Result<TfIdfState> {
        if texts.is_empty() {
            return Err(IntentError::Training(
                "cannot fit encoder on an empty corpus".to_string(),
            ));
        }

        let settings = TokenizerSettings {
            ngram_max: self.config.ngram_max,
            min_token_len: self.config.min_token_len,
        };

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            let distinct: BTreeSet<String> = tokenize::terms(text, settings).into_iter().collect();
            for term in distinct {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= self.config.min_df)
            .collect();

        if let Some(limit) = self.config.max_features {
            if kept.len() > limit {
                // Highest document frequency first, ties by term
                kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                kept.truncate(limit);
                kept.sort_by(|a, b| a.0.cmp(&b.0));
            }
        }

        // Every text still encodes (to a zero-length vector); classifiers fall
        // back to their priors
        if kept.is_empty() {
            warn!(
                "No vocabulary terms survived tokenization and filtering of {} texts",
                texts.len()
            );
        }

        let documents = texts.len() as f64;
        let (terms, idf): (Vec<String>, Vec<f32>) = kept
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + documents) / (1.0 + df as f64)).ln() + 1.0;
                (term, weight as f32)
            })
            .unzip();

        debug!(
            "Fitted TF-IDF encoder: {} documents, {} terms",
            texts.len(),
            terms.len()
        );

        Ok(TfIdfState {
            ngram_max: self.config.ngram_max,
            min_token_len: self.config.min_token_len,
            sublinear_tf: self.config.sublinear_tf,
            terms,
            idf,
        })
    }

    fn transform(&self, text: &str, state: &TfIdfState) -> FeatureVector {
        state.encode(text)
    }
}
