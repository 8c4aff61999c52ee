//! HTTP inference server command

use intent_core::{
    api::{ApiServer, ApiServerConfig},
    error::Result,
    IntentConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::debug;

/// Handle serve command
pub async fn handle(
    config: IntentConfig,
    artifact: Option<PathBuf>,
    addr: Option<String>,
) -> Result<()> {
    debug!("Starting inference server...");

    let socket_addr: SocketAddr = match addr {
        Some(addr) => addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid address '{}': {}", addr, e))?,
        None => config.server.socket_addr()?,
    };
    let artifact_path = super::artifact_path(&config, artifact);

    println!();
    println!("Intent Inference Server");
    println!();
    println!("   Address: http://{}", socket_addr);
    println!("   Artifact: {}", artifact_path.display());
    println!();
    println!("   Endpoints:");
    println!("   - GET  /health  - Readiness");
    println!("   - POST /predict - Classify {{\"text\": \"...\"}}");
    println!("   - GET  /info    - Artifact metadata");
    println!();

    let server = ApiServer::new(ApiServerConfig {
        addr: socket_addr,
        artifact_path,
        max_text_bytes: config.server.max_text_bytes,
        max_body_bytes: config.server.max_body_bytes,
    });
    server.serve().await?;

    Ok(())
}
