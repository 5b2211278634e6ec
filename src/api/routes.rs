//! API Routes
//!
//! Configures the Axum router with all market data endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    chart_handler, entry_handler, health_handler, index_handler, invalidate_all_handler,
    invalidate_key_handler, sectors_handler, stats_handler, summary_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/index", get(index_handler))
        .route("/chart", get(chart_handler))
        .route("/summary", get(summary_handler))
        .route("/sectors", get(sectors_handler))
        .route("/cache/stats", get(stats_handler))
        .route(
            "/cache/entries/:key",
            get(entry_handler).delete(invalidate_key_handler),
        )
        .route("/cache", delete(invalidate_all_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
