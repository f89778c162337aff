//! HTTP response DTOs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::application::ports::ChannelError;

/// `GET /` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    /// Always "online".
    pub status: String,
    /// Service name.
    pub service: String,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy".
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub detail: String,
}

/// Failure to obtain a reply from the engine.
#[derive(Debug)]
pub struct BridgeFailure(pub ChannelError);

impl IntoResponse for BridgeFailure {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ChannelError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ChannelError::Disconnected => StatusCode::SERVICE_UNAVAILABLE,
            ChannelError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<ChannelError> for BridgeFailure {
    fn from(error: ChannelError) -> Self {
        Self(error)
    }
}
