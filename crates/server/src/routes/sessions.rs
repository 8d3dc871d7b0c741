//! Session ingest and read routes. These populate the records the two
//! pipelines consume; they all use the standard envelope.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use db::models::{
    business_profile::{BusinessProfile, CreateBusinessProfile},
    onboarding_session::{CreateOnboardingSession, OnboardingSession},
    operational_process::{CreateOperationalProcess, OperationalProcess},
    requirement::{CreateRequirement, Requirement},
};
use utils::response::ApiResponse;

use crate::{app_state::AppState, auth::AuthUser, error::ApiError};

/// POST /api/sessions
/// Create an onboarding session. Platform-assigned ids are honored when
/// provided; otherwise a uuid is generated.
pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    axum::Json(payload): axum::Json<CreateOnboardingSession>,
) -> Result<ResponseJson<ApiResponse<OnboardingSession>>, ApiError> {
    let session = OnboardingSession::create(&state.db.pool, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(session)))
}

/// GET /api/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<OnboardingSession>>, ApiError> {
    let session = OnboardingSession::find_by_id(&state.db.pool, &session_id)
        .await?
        .ok_or(ApiError::NotFound("Session not found"))?;
    Ok(ResponseJson(ApiResponse::success(session)))
}

/// POST /api/sessions/{session_id}/business-profile
pub async fn create_business_profile(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(session_id): Path<String>,
    axum::Json(payload): axum::Json<CreateBusinessProfile>,
) -> Result<ResponseJson<ApiResponse<BusinessProfile>>, ApiError> {
    let profile = BusinessProfile::create(&state.db.pool, &session_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

/// POST /api/sessions/{session_id}/processes
pub async fn create_process(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(session_id): Path<String>,
    axum::Json(payload): axum::Json<CreateOperationalProcess>,
) -> Result<ResponseJson<ApiResponse<OperationalProcess>>, ApiError> {
    let process = OperationalProcess::create(&state.db.pool, &session_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(process)))
}

/// POST /api/sessions/{session_id}/requirements
pub async fn create_requirement(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(session_id): Path<String>,
    axum::Json(payload): axum::Json<CreateRequirement>,
) -> Result<ResponseJson<ApiResponse<Requirement>>, ApiError> {
    let requirement = Requirement::create(&state.db.pool, &session_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(requirement)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}", axum::routing::get(get_session))
        .route(
            "/sessions/{session_id}/business-profile",
            post(create_business_profile),
        )
        .route("/sessions/{session_id}/processes", post(create_process))
        .route(
            "/sessions/{session_id}/requirements",
            post(create_requirement),
        )
}
