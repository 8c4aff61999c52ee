//! Training command

use intent_core::{error::Result, ExampleStore, IntentConfig, TrainingPipeline};
use std::path::PathBuf;
use tracing::{debug, info};

/// Handle train command
pub async fn handle(
    mut config: IntentConfig,
    data: PathBuf,
    output: Option<PathBuf>,
    min_accuracy: Option<f64>,
    dry_run: bool,
) -> Result<()> {
    if let Some(min_accuracy) = min_accuracy {
        config.training.min_accuracy = min_accuracy;
        config.validate()?;
    }
    let output = super::artifact_path(&config, output);
    debug!("Training from {} into {}", data.display(), output.display());

    let pipeline = TrainingPipeline::new(config);
    let target = (!dry_run).then_some(output);

    // Fitting is CPU-bound; keep it off the runtime threads
    let report = tokio::task::spawn_blocking(move || {
        let store = ExampleStore::load(&data)?;
        info!(
            "Loaded {} examples across {} intents",
            store.len(),
            store.labels().len()
        );
        pipeline.run(&store, target)
    })
    .await
    .map_err(|e| anyhow::anyhow!("training task failed: {}", e))??;

    let evaluation = &report.evaluation;
    println!();
    println!("Training complete in {}ms", report.elapsed_ms);
    println!("   Intents: {}", report.artifact.labels.len());
    println!("   Training examples: {}", report.train_examples);
    println!(
        "   Accuracy: {:.2}% ({}/{}, {})",
        evaluation.accuracy * 100.0,
        evaluation.correct,
        evaluation.examples,
        evaluation.source
    );
    for (label, score) in &evaluation.per_label {
        println!(
            "     {:<24} recall {:.2} ({}/{})",
            label, score.recall, score.correct, score.support
        );
    }
    match &report.written_to {
        Some(path) => println!("   Artifact: {}", path.display()),
        None => println!("   Artifact: not written (dry run)"),
    }
    println!();

    Ok(())
}
