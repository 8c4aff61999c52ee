//! One-shot prediction command

use intent_core::{error::Result, InferenceService, IntentConfig, PredictionRequest};
use std::path::PathBuf;

/// Handle predict command; prints one JSON object per text
pub async fn handle(
    config: IntentConfig,
    artifact: Option<PathBuf>,
    texts: Vec<String>,
) -> Result<()> {
    let path = super::artifact_path(&config, artifact);
    let service = InferenceService::load(&path)?.with_max_text_bytes(config.server.max_text_bytes);

    for text in texts {
        let result = service.predict(&PredictionRequest { text })?;
        println!("{}", serde_json::to_string(&result)?);
    }

    Ok(())
}
