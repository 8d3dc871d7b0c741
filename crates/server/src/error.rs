use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::services::{architecture::ArchitectureError, builder::BuildError};
use tracing::error;
use utils::response::ApiResponse;

/// Route-level error. The two pipeline endpoints have fixed wire shapes
/// that predate the standard envelope, so those variants render their own
/// bodies; everything else uses `ApiResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed, or unknown bearer token.
    Unauthorized,
    /// Request validation failure with an endpoint-specific message.
    BadRequest(&'static str),
    /// The generate pipeline's session check.
    SessionNotFound,
    /// Architecture generation failed past validation. The body carries the
    /// message and the error source chain.
    Generate(ArchitectureError),
    /// The build pipeline failed outside per-item recovery.
    Build(BuildError),
    /// Missing record on a management read.
    NotFound(&'static str),
    /// Storage failure on a management route.
    Database(sqlx::Error),
}

impl From<ArchitectureError> for ApiError {
    fn from(e: ArchitectureError) -> Self {
        match e {
            ArchitectureError::SessionNotFound => Self::SessionNotFound,
            other => Self::Generate(other),
        }
    }
}

impl From<BuildError> for ApiError {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

/// The error message followed by each source in the chain, one per line.
fn source_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str("\ncaused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Unauthorized"})),
            )
                .into_response(),
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
            }
            Self::SessionNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Session not found"})),
            )
                .into_response(),
            Self::Generate(e) => {
                error!(error = %e, "architecture generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": e.to_string(), "stack": source_chain(&e)})),
                )
                    .into_response()
            }
            Self::Build(e) => {
                error!(error = %e, "application build failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Failed to build application",
                        "details": e.to_string(),
                    })),
                )
                    .into_response()
            }
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(message)),
            )
                .into_response(),
            Self::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<()>::error("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}
