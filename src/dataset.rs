//! Example store: loading and validating labeled utterances
//!
//! Supported layouts:
//! - JSON array of `{"text": ..., "label": ...}` objects
//! - JSON object mapping each label to an array of texts
//! - JSON Lines (`.jsonl`), one `{"text": ..., "label": ...}` object per line
//!
//! Texts and labels are trimmed. Order is preserved, and duplicates are kept
//! because repeated examples carry weight during training.

use crate::error::{IntentError, Result};
use crate::types::{LabelSet, TrainingExample};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Ordered, validated collection of training examples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleStore {
    examples: Vec<TrainingExample>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoreDocument {
    Records(Vec<TrainingExample>),
    Grouped(GroupedExamples),
}

/// Label -> texts groups in document order
struct GroupedExamples(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for GroupedExamples {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = GroupedExamples;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from label to an array of texts")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, texts)) = map.next_entry::<String, Vec<String>>()? {
                    groups.push((label, texts));
                }
                Ok(GroupedExamples(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

impl ExampleStore {
    /// Validate and wrap a list of examples
    pub fn new(examples: Vec<TrainingExample>) -> Result<Self> {
        if examples.is_empty() {
            return Err(IntentError::Training(
                "example store contains no examples".to_string(),
            ));
        }

        let mut cleaned = Vec::with_capacity(examples.len());
        for (position, example) in examples.into_iter().enumerate() {
            let text = example.text.trim();
            let label = example.label.trim();
            if text.is_empty() {
                return Err(IntentError::Training(format!(
                    "example {} has empty text",
                    position
                )));
            }
            if label.is_empty() {
                return Err(IntentError::Training(format!(
                    "example {} ('{}') has an empty label",
                    position, text
                )));
            }
            cleaned.push(TrainingExample::new(text, label));
        }

        Ok(Self { examples: cleaned })
    }

    /// Load a store from a file, picking the layout from extension and shape
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_jsonl = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
            .unwrap_or(false);

        let store = if is_jsonl {
            Self::from_json_lines(&content)?
        } else {
            Self::from_json(&content)?
        };

        debug!(
            "Loaded {} examples ({} labels) from {}",
            store.len(),
            store.labels().len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse either the record or the grouped JSON layout
    pub fn from_json(content: &str) -> Result<Self> {
        let document: StoreDocument = serde_json::from_str(content).map_err(|e| {
            IntentError::Training(format!(
                "expected an array of {{text, label}} objects or a label -> texts map: {}",
                e
            ))
        })?;

        let examples = match document {
            StoreDocument::Records(records) => records,
            StoreDocument::Grouped(GroupedExamples(groups)) => groups
                .into_iter()
                .flat_map(|(label, texts)| {
                    texts
                        .into_iter()
                        .map(move |text| TrainingExample::new(text, label.clone()))
                })
                .collect(),
        };

        Self::new(examples)
    }

    /// Parse JSON Lines; blank lines are skipped
    pub fn from_json_lines(content: &str) -> Result<Self> {
        let mut examples = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let example: TrainingExample = serde_json::from_str(line).map_err(|e| {
                IntentError::Training(format!("line {}: {}", number + 1, e))
            })?;
            examples.push(example);
        }
        Self::new(examples)
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.text.as_str()).collect()
    }

    /// Every distinct label, sorted
    pub fn labels(&self) -> LabelSet {
        LabelSet::from_labels(self.examples.iter().map(|e| e.label.clone()))
    }

    /// Number of examples per label
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Example indices grouped by label, in store order
    pub fn indices_by_label(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, example) in self.examples.iter().enumerate() {
            groups.entry(example.label.as_str()).or_default().push(index);
        }
        groups
    }

    /// SHA-256 over the canonical example list, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for example in &self.examples {
            hasher.update((example.text.len() as u64).to_be_bytes());
            hasher.update(example.text.as_bytes());
            hasher.update((example.label.len() as u64).to_be_bytes());
            hasher.update(example.label.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}
