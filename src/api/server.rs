//! HTTP API server for health and prediction

use super::error::ApiError;
use crate::artifact::ArtifactSummary;
use crate::error::{IntentError, Result};
use crate::service::{InferenceService, ModelSlot, Readiness};
use crate::types::{PredictionRequest, PredictionResult};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// Artifact loaded at startup
    pub artifact_path: PathBuf,
    /// Longest accepted `text`, in bytes
    pub max_text_bytes: usize,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 8080).into(),
            artifact_path: PathBuf::from("model/intent.artifact"),
            max_text_bytes: crate::service::DEFAULT_MAX_TEXT_BYTES,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelSlot>,
}

impl AppState {
    pub fn new(models: Arc<ModelSlot>) -> Self {
        Self { models }
    }

    fn service(&self) -> std::result::Result<Arc<InferenceService>, ApiError> {
        self.models.get().ok_or(ApiError(IntentError::NotReady))
    }
}

/// Build the router; `max_body_bytes` bounds every request body
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .route("/info", get(info_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    models: Arc<ModelSlot>,
}

impl ApiServer {
    /// Create new API server; nothing is loaded until `serve`
    pub fn new(config: ApiServerConfig) -> Self {
        Self {
            config,
            models: Arc::new(ModelSlot::new()),
        }
    }

    /// Readiness slot shared with the handlers
    pub fn models(&self) -> &Arc<ModelSlot> {
        &self.models
    }

    /// Bind, load the artifact, then serve until shutdown
    ///
    /// The listener is bound before loading so health checks observe `NotReady`
    /// while the artifact is deserialized. A load failure stops the server
    /// and is returned to the caller.
    pub async fn serve(self) -> Result<()> {
        let router = build_router(
            AppState::new(self.models.clone()),
            self.config.max_body_bytes,
        );

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!("API server listening on http://{}", self.config.addr);

        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await
        });

        if let Err(e) = load_into(
            &self.models,
            self.config.artifact_path.clone(),
            self.config.max_text_bytes,
        )
        .await
        {
            error!(
                "Failed to load artifact {}: {}",
                self.config.artifact_path.display(),
                e
            );
            server.abort();
            return Err(e);
        }
        info!("Model loaded, service is ready");

        match server.await {
            Ok(result) => result.map_err(IntentError::from),
            Err(e) => Err(IntentError::Internal(format!("server task failed: {}", e))),
        }
    }
}

/// Deserialize the artifact on the blocking pool and fill the slot
pub async fn load_into(models: &ModelSlot, path: PathBuf, max_text_bytes: usize) -> Result<()> {
    let service = tokio::task::spawn_blocking(move || InferenceService::load(&path))
        .await
        .map_err(|e| IntentError::Internal(format!("artifact loading task failed: {}", e)))??;
    models.install(service.with_max_text_bytes(max_text_bytes))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.models.health() {
        Readiness::Ready => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Readiness::NotReady => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready",
            }),
        ),
    }
}

/// Extract `text` from a raw JSON body
fn parse_predict_body(body: &[u8]) -> Result<PredictionRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| IntentError::InvalidInput(format!("malformed JSON body: {}", e)))?;

    let object = value.as_object().ok_or_else(|| {
        IntentError::InvalidInput("request body must be a JSON object".to_string())
    })?;

    match object.get("text") {
        None | Some(Value::Null) => Err(IntentError::MissingField("text")),
        Some(Value::String(text)) => Ok(PredictionRequest { text: text.clone() }),
        Some(_) => Err(IntentError::InvalidInput(
            "'text' must be a string".to_string(),
        )),
    }
}

async fn predict_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<PredictionResult>, ApiError> {
    let request = parse_predict_body(&body)?;
    let models = state.models.clone();

    // CPU-bound; a panic here becomes a 500 instead of a dropped connection
    let result = tokio::task::spawn_blocking(move || models.predict(&request))
        .await
        .map_err(|e| IntentError::Internal(format!("prediction task failed: {}", e)))??;

    debug!("Predicted intent '{}'", result.intent);
    Ok(Json(result))
}

/// Artifact description plus the serving crate version
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub version: &'static str,
    #[serde(flatten)]
    pub artifact: ArtifactSummary,
}

async fn info_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<InfoResponse>, ApiError> {
    let service = state.service()?;
    Ok(Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION"),
        artifact: service.summary(),
    }))
}
