//! Mapping of service errors onto HTTP responses

use crate::error::IntentError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Error returned by request handlers
#[derive(Debug)]
pub struct ApiError(pub IntentError);

impl From<IntentError> for ApiError {
    fn from(err: IntentError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            IntentError::MissingField(_) | IntentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IntentError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            err if err.is_client_error() => {
                warn!("Rejected request: {}", err);
                err.to_string()
            }
            IntentError::NotReady => {
                warn!("Request received before the model was loaded");
                self.0.to_string()
            }
            err => {
                error!("Request failed: {}", err);
                "Internal error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(IntentError::MissingField("text")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(IntentError::InvalidInput("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(IntentError::NotReady).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(IntentError::Internal("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
