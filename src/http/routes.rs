use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let recordings_dir = state.recordings_dir.clone();

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording upload
        .route("/api/save-recording", post(handlers::save_recording))
        // Stored recordings are public-servable by path
        .nest_service("/recordings", ServeDir::new(recordings_dir))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
