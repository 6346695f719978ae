use axum::routing::any;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::gateway::casino_upgrade;
use crate::state::AppState;

/// Build the gateway router. Only `/casino/{category}` upgrades; everything
/// else is rejected before a session exists.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/casino/{category}", any(casino_upgrade))
        .route("/casino", any(missing_category))
        .route("/casino/", any(missing_category))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn missing_category() -> AppError {
    AppError::BadRequest("game category is required".to_string())
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}
