//! API route definitions

use std::path::PathBuf;

use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::services::ServeDir;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create the application router
pub fn app_routes(state: AppState, audio_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        // Static chat page
        .route("/", get(handlers::index))
        // Health check
        .route("/health", get(handlers::health))
        // Question answering
        .route("/ask", post(handlers::ask))
        .route("/ask/stream", post(handlers::ask_stream))
        .with_state(state);

    // Synthesized answer audio, when TTS is enabled
    match audio_dir {
        Some(dir) => router.nest_service("/audio", ServeDir::new(dir)),
        None => router,
    }
}
