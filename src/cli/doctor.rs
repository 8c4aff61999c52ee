//! Artifact diagnostics command

use intent_core::{
    error::Result,
    health::{print_artifact_report, run_artifact_checks, CheckStatus},
    IntentConfig,
};
use std::path::PathBuf;
use tracing::debug;

/// Handle doctor command
pub async fn handle(
    config: IntentConfig,
    artifact: Option<PathBuf>,
    verbose: bool,
    json: bool,
) -> Result<()> {
    debug!("Running artifact checks...");

    let path = super::artifact_path(&config, artifact);
    let report = run_artifact_checks(&path);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_artifact_report(&report, verbose);
    }

    // Exit with appropriate code
    match report.status {
        CheckStatus::Pass => std::process::exit(0),
        CheckStatus::Warn => std::process::exit(1),
        CheckStatus::Fail => std::process::exit(2),
    }
}
