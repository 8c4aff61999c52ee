//! Artifact metadata command

use intent_core::{error::Result, Artifact, IntentConfig};
use std::path::PathBuf;

/// Handle inspect command
pub async fn handle(config: IntentConfig, artifact: Option<PathBuf>) -> Result<()> {
    let path = super::artifact_path(&config, artifact);
    let summary = Artifact::load(&path)?.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
