use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use db::models::user::User;

use crate::{app_state::AppState, error::ApiError};

/// Caller identity resolved from `Authorization: Bearer <api_key>`.
///
/// Every `/api` handler takes this extractor, so the lookup runs before any
/// body parsing or pipeline work. Anything short of a known key is a 401,
/// lookup failures included.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        User::find_by_api_key(&state.db.pool, token)
            .await
            .map_err(|_| ApiError::Unauthorized)?
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}
