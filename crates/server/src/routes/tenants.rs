use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use db::models::tenant_profile::{CreateTenantProfile, TenantProfile};
use utils::response::ApiResponse;

use crate::{app_state::AppState, auth::AuthUser, error::ApiError};

/// POST /api/tenants/{tenant_id}/profile
/// Create or replace the tenant's profile; one row per tenant.
pub async fn upsert_tenant_profile(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(tenant_id): Path<String>,
    axum::Json(payload): axum::Json<CreateTenantProfile>,
) -> Result<ResponseJson<ApiResponse<TenantProfile>>, ApiError> {
    let profile = TenantProfile::create_or_update(&state.db.pool, &tenant_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/tenants/{tenant_id}/profile", post(upsert_tenant_profile))
}
