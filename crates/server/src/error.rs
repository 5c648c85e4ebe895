use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flashdeck::PipelineError;
use ingest::IngestError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: max {0}MB allowed")]
    PayloadTooLarge(usize),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<IngestError> for ServerError {
    fn from(err: IngestError) -> Self {
        ServerError::Pipeline(PipelineError::from(err))
    }
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(err) => StatusCode::from_u16(err.http_status_code())
                .unwrap_or(StatusCode::UNPROCESSABLE_ENTITY),
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::Pipeline(PipelineError::Ingest(err)) => ingest_code(err),
            ServerError::Pipeline(PipelineError::Config(_)) => "CONFIG_ERROR",
            ServerError::Pipeline(_) => "PIPELINE_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Preview and hints for payload errors, so callers can see what we saw.
    fn details(&self) -> Option<serde_json::Value> {
        let ServerError::Pipeline(PipelineError::Ingest(err)) = self else {
            return None;
        };
        let hints = err.hints();
        if err.preview().is_none() && hints.is_empty() {
            return None;
        }
        Some(json!({
            "preview": err.preview(),
            "hints": hints,
        }))
    }
}

fn ingest_code(err: &IngestError) -> &'static str {
    match err {
        IngestError::EmptyPayload => "EMPTY_PAYLOAD",
        IngestError::InvalidUtf8(_) => "INVALID_UTF8",
        IngestError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
        IngestError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
        IngestError::NoValidCards { .. } => "NO_VALID_CARDS",
        _ => "INGEST_ERROR",
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request_failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("conversion task failed: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
