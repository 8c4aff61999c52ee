//! HTTP API for the inference service
//!
//! Provides:
//! - `GET /health` readiness check
//! - `POST /predict` intent classification
//! - `GET /info` loaded artifact metadata

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, ApiServer, ApiServerConfig, AppState};
