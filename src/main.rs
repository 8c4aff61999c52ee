//! Intent - command line entry point
//!
//! Trains artifacts from labeled examples and serves them over HTTP.

use clap::{Parser, Subcommand};
use intent_core::{error::Result, IntentConfig};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "intent")]
#[command(about = "Train and serve free-text intent classifiers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./intent.toml when present)
    #[arg(long, global = true, env = "INTENT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier and write the artifact
    Train {
        /// Labeled examples (.json or .jsonl)
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact output path (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum evaluation accuracy (overrides config)
        #[arg(long)]
        min_accuracy: Option<f64>,

        /// Run every stage except writing the artifact
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Artifact to load (overrides config)
        #[arg(short, long)]
        artifact: Option<PathBuf>,

        /// Listen address, host:port (overrides config)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Classify texts with an artifact
    Predict {
        /// Artifact to load (overrides config)
        #[arg(short, long)]
        artifact: Option<PathBuf>,

        /// Texts to classify
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Measure an artifact's accuracy on labeled examples
    Evaluate {
        /// Labeled examples (.json or .jsonl)
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact to load (overrides config)
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },

    /// Show artifact metadata
    Inspect {
        /// Artifact to load (overrides config)
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },

    /// Run artifact diagnostics
    Doctor {
        /// Artifact to check (overrides config)
        #[arg(short, long)]
        artifact: Option<PathBuf>,

        /// Show details for passing checks
        #[arg(short, long, default_value = "false")]
        verbose: bool,

        /// Output results as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG wins when set; otherwise our level, with the HTTP stack kept quiet
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "intent={lvl},intent_core={lvl},tower_http={lvl},hyper=warn",
            lvl = level.as_str().to_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Intent v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = IntentConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Train {
            data,
            output,
            min_accuracy,
            dry_run,
        } => cli::train::handle(config, data, output, min_accuracy, dry_run).await,
        Commands::Serve { artifact, addr } => cli::serve::handle(config, artifact, addr).await,
        Commands::Predict { artifact, texts } => {
            cli::predict::handle(config, artifact, texts).await
        }
        Commands::Evaluate { data, artifact } => {
            cli::evaluate::handle(config, data, artifact).await
        }
        Commands::Inspect { artifact } => cli::inspect::handle(config, artifact).await,
        Commands::Doctor {
            artifact,
            verbose,
            json,
        } => cli::doctor::handle(config, artifact, verbose, json).await,
    }
}
