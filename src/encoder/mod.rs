//! Feature encoders: deterministic text to vector transforms
//!
//! An encoder is fit once over the training corpus and frozen into a state
//! value. Encoding with that state never fails: unseen terms contribute
//! nothing and empty text yields an all-zero vector.

pub mod tfidf;
pub mod tokenize;

pub use tfidf::{TfIdfEncoder, TfIdfState};

use crate::error::Result;
use crate::types::FeatureVector;

/// Fit/transform contract shared by feature encoders
pub trait FeatureEncoder {
    /// Frozen state produced by `fit`
    type State;

    /// Learn the encoder state from every training text
    fn fit(&self, texts: &[&str]) -> Result<Self::State>;

    /// Encode a text with a previously fitted state
    fn transform(&self, text: &str, state: &Self::State) -> FeatureVector;
}
