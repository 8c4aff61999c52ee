//! CLI command handlers
//!
//! Each subcommand is implemented in its own module. Flags given on the
//! command line override the loaded configuration.

pub mod doctor;
pub mod evaluate;
pub mod inspect;
pub mod predict;
pub mod serve;
pub mod train;

use intent_core::IntentConfig;
use std::path::PathBuf;

/// Artifact path from the CLI flag, falling back to configuration
pub fn artifact_path(config: &IntentConfig, flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| config.artifact_path.clone())
}
