//! HTTP server implementation

use std::sync::Arc;

use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::assistant::Assistant;
use crate::config::AppConfig;
use crate::tts::TtsService;
use crate::unanswered::UnansweredLogger;
use crate::Result;

/// Start the API server
pub async fn serve(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("🚀 Starting Celine API server...");

    // Initialize services; the knowledge base is loaded once and shared
    // read-only across requests
    let assistant = Arc::new(Assistant::new(config)?);
    if assistant.knowledge().is_empty() {
        warn!("Knowledge base is empty; every question will get the fallback answer");
    }

    let tts = if config.tts.enabled {
        Some(Arc::new(TtsService::new(&config.tts)?))
    } else {
        None
    };

    let unanswered = if config.sheet.enabled {
        Some(Arc::new(UnansweredLogger::new(&config.sheet)?))
    } else {
        None
    };

    let audio_dir = tts.as_ref().map(|t| t.audio_dir().to_path_buf());

    let state = AppState {
        assistant,
        tts,
        tts_mandatory: config.tts.mandatory,
        unanswered,
    };

    let mut app = routes::app_routes(state, audio_dir);

    // Add middleware layers
    app = app.layer(TraceLayer::new_for_http());

    // Add CORS if enabled
    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{addr}");
    info!("");
    info!("Available endpoints:");
    info!("  GET  /            - Chat page");
    info!("  GET  /health      - Health check");
    info!("  POST /ask         - Answer a question");
    info!("  POST /ask/stream  - Answer as a plain-text stream");
    if config.tts.enabled {
        info!("  GET  /audio/:file - Synthesized answer audio");
    }

    axum::serve(listener, app).await?;

    Ok(())
}
