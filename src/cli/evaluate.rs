//! Evaluate an existing artifact against a labeled dataset

use intent_core::{
    error::Result,
    training::{evaluate, FittedModel},
    Artifact, EvaluationSource, ExampleStore, IntentConfig,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Handle evaluate command
pub async fn handle(config: IntentConfig, data: PathBuf, artifact: Option<PathBuf>) -> Result<()> {
    let path = super::artifact_path(&config, artifact);
    let artifact = Artifact::load(&path)?;
    let store = ExampleStore::load(&data)?;
    info!(
        "Evaluating {} against {} examples",
        path.display(),
        store.len()
    );

    let unknown: Vec<String> = store
        .labels()
        .iter()
        .filter(|label| !artifact.labels.contains(label))
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        warn!(
            "{} label(s) are not known to the artifact and can never be predicted: {}",
            unknown.len(),
            unknown.join(", ")
        );
    }

    let model = FittedModel::from_artifact(&artifact);
    let evaluation = evaluate(&model, store.examples(), EvaluationSource::External)?;

    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}
