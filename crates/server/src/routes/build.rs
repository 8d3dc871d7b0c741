use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::app_build_version::{AppBuildVersion, BuildResults};
use serde::{Deserialize, Serialize};
use services::services::builder::{AppBuilder, BuildOptions};
use tracing::warn;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{app_state::AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildApplicationRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(flatten)]
    options: BuildOptions,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct BuildSummary {
    pub entities: usize,
    pub pages: usize,
    pub features: usize,
    pub integrations: usize,
    pub errors: usize,
}

/// Fixed response shape of the build endpoint; not the standard envelope.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BuildApplicationResponse {
    pub success: bool,
    pub message: String,
    pub build_number: String,
    pub results: BuildResults,
    pub summary: BuildSummary,
}

/// POST /api/buildApplication
/// Build artifacts for every schema record in the enabled categories. The
/// session is not checked for existence; an unknown id just finds no
/// records. Per-item failures land in `results.errors`, so a 200 can still
/// describe a failed build.
pub async fn build_application(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    axum::Json(payload): axum::Json<BuildApplicationRequest>,
) -> Result<ResponseJson<BuildApplicationResponse>, ApiError> {
    let session_id = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::BadRequest("sessionId is required"))?;

    let builder = AppBuilder::new(
        state.db.pool.clone(),
        state.llm.clone(),
        state.artifacts.clone(),
        state.config.build_concurrency,
    );

    let outcome = match builder.build(session_id, payload.options).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // The record for this run may still say `building`; mark it
            // failed so it is not mistaken for an in-flight build. A
            // secondary failure here leaves it stuck, logged only.
            if let Err(recovery) = AppBuildVersion::fail_running(&state.db.pool, session_id).await {
                warn!(session_id, error = %recovery, "could not mark stuck build records as failed");
            }
            return Err(ApiError::from(e));
        }
    };

    Ok(ResponseJson(BuildApplicationResponse {
        success: true,
        message: "Application build completed".to_string(),
        build_number: outcome.build.build_number.clone(),
        summary: BuildSummary {
            entities: outcome.results.entities.len(),
            pages: outcome.results.pages.len(),
            features: outcome.results.features.len(),
            integrations: outcome.results.integrations.len(),
            errors: outcome.results.errors.len(),
        },
        results: outcome.results,
    }))
}

/// GET /api/sessions/{session_id}/builds
/// List build versions for a session, newest first.
pub async fn list_builds(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<AppBuildVersion>>>, ApiError> {
    let builds = AppBuildVersion::find_by_session(&state.db.pool, &session_id).await?;
    Ok(ResponseJson(ApiResponse::success(builds)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/buildApplication", post(build_application))
        .route("/sessions/{session_id}/builds", get(list_builds))
}
