use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod architecture;
pub mod build;
pub mod health;
pub mod sessions;
pub mod tenants;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(architecture::router())
        .merge(build::router())
        .merge(sessions::router())
        .merge(tenants::router());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
