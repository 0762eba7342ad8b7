//! API Route Configuration

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware};

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/health", get(handlers::health_check))
        // Source scanning
        .route("/scan", post(handlers::scan_source))
        .route("/scan/quick", post(handlers::quick_scan))
        // Smart errors
        .route("/errors/classify", post(handlers::classify_error))
        .route("/errors/:id/resolve", post(handlers::resolve_error))
        .route("/errors/stats", get(handlers::error_stats))
        .route("/errors/top", get(handlers::top_errors))
        .route("/errors/export", get(handlers::export_errors))
        .route("/errors", delete(handlers::clear_errors));

    Router::new()
        .nest("/v1", api_v1)
        .route("/health", get(handlers::health_check))
        .with_state(state.clone())
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}
