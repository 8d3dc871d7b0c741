use axum::response::Json as ResponseJson;
use utils::response::ApiResponse;

/// GET /health
/// Liveness probe; the only unauthenticated route.
pub async fn health() -> ResponseJson<ApiResponse<&'static str>> {
    ResponseJson(ApiResponse::success("ok"))
}
