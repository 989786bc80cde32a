//! API request handlers

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::api::types::ApiResponse;
use crate::api::types::AskRequest;
use crate::api::types::AskResponse;
use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::assistant::AnswerStream;
use crate::assistant::Assistant;
use crate::tts::TtsService;
use crate::unanswered::is_unanswered;
use crate::unanswered::UnansweredLogger;

/// Shared application state; everything here is read-only per request
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub tts: Option<Arc<TtsService>>,
    pub tts_mandatory: bool,
    pub unanswered: Option<Arc<UnansweredLogger>>,
}

/// Static chat page (GET /)
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Requisição inválida.".to_string(),
        }),
    )
        .into_response()
}

/// Answer a question (POST /ask)
pub async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let Some(question) = req
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    else {
        return bad_request();
    };
    info!("POST /ask: {question}");

    let history = req.history.unwrap_or_default();
    let reply = state
        .assistant
        .answer(question, req.context.as_deref(), &history)
        .await;

    let mut audio_url = None;
    if let Some(tts) = &state.tts {
        match tts.synthesize(&reply.answer).await {
            Ok(url) => audio_url = Some(url),
            Err(e) => {
                error!("Audio generation failed: {e}");
                if state.tts_mandatory {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            error: "Falha ao gerar o áudio da resposta.".to_string(),
                        }),
                    )
                        .into_response();
                }
                // Degraded response: text answer without audio
            }
        }
    }

    if is_unanswered(&reply.answer) {
        if let Some(logger) = &state.unanswered {
            // The question is forwarded as typed, not normalized
            let user = req.user_name.as_deref().unwrap_or("anônimo");
            if let Err(e) = logger.record(user, question).await {
                warn!("Failed to log unanswered question: {e}");
            }
        }
    }

    Json(AskResponse {
        answer: reply.answer,
        context: reply.context,
        follow_up: reply.follow_up,
        audio_url,
    })
    .into_response()
}

/// Answer a question as a plain-text fragment stream (POST /ask/stream)
pub async fn ask_stream(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let Some(question) = req
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    else {
        return bad_request();
    };
    info!("POST /ask/stream: {question}");

    let history = req.history.unwrap_or_default();
    let stream = state
        .assistant
        .answer_stream(question, req.context.as_deref(), &history)
        .await;

    let content_type = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
    match stream {
        AnswerStream::Immediate(text) => (StatusCode::OK, content_type, text).into_response(),
        AnswerStream::Streaming(response) => (
            StatusCode::OK,
            content_type,
            Body::from_stream(response.into_stream()),
        )
            .into_response(),
    }
}
