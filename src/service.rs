use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::error::TableTalkError;
use crate::handlers::{
    ChatHandlers, FeedbackHandler, QueryHandler, TranscriptHandler, UploadHandler, VoiceHandler,
    feedback::FeedbackParams,
    query::AskParams,
    voice::VoiceToggleParams,
};
use crate::synth::ChatSynth;
use crate::transport::HostedTransport;
use crate::voice::VoiceBridge;

/// Main service struct for the TableTalk chat backend. The browser front-end
/// drives it through the HTTP routes; every route resolves to one handler
/// operation and every failure becomes an inline notice, never a dead session.
#[derive(Clone)]
pub struct ChatService {
    handlers: Arc<ChatHandlers>,
    config: Arc<Config>,
}

impl ChatService {
    /// Create a new service instance
    pub fn new(config: Arc<Config>) -> Result<Self, TableTalkError> {
        tracing::info!("Service::new() - Starting initialization");

        let transport = Arc::new(HostedTransport::new(
            config.inference.base_url.clone(),
            config.inference.api_key.clone(),
        )?);

        let synth = Arc::new(ChatSynth::new(
            transport,
            config.inference.model.clone(),
            config.inference.max_tokens,
            config.inference.temperature,
            config.upload.preview_rows,
        ));

        let voice = VoiceBridge::new(config.voice.clone());

        let handlers = Arc::new(ChatHandlers::new(synth, voice, config.clone()));
        tracing::info!("Service::new() - Service initialization complete");

        Ok(Self { handlers, config })
    }

    /// Build the axum router consumed by the browser front-end
    pub fn router(&self) -> Router {
        // Leave headroom above the dataset cap for the request framing
        let body_limit = self.config.upload.max_file_bytes + 64 * 1024;

        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/api/upload",
                post(upload).layer(DefaultBodyLimit::max(body_limit)),
            )
            .route("/api/dataset", get(dataset_summary))
            .route("/api/suggestions", get(suggestions))
            .route("/api/ask", post(ask))
            .route("/api/history", get(history))
            .route("/api/clear", post(clear))
            .route("/api/export", get(export))
            .route("/api/feedback", post(feedback))
            .route("/api/voice", post(set_voice))
            .route("/api/voice/stop", post(stop_speaking))
            .route("/api/listen", post(listen))
            .with_state(self.clone())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Convert a classified failure into an inline HTTP notice
fn error_response(e: TableTalkError) -> (StatusCode, Json<ErrorBody>) {
    let status = if e.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    filename: String,
}

async fn upload(
    State(service): State<ChatService>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> impl IntoResponse {
    match service.handlers.upload(&query.filename, &body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::warn!("Upload failed: {}", e);
            error_response(e).into_response()
        }
    }
}

async fn dataset_summary(State(service): State<ChatService>) -> impl IntoResponse {
    match service.handlers.dataset_summary().await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn suggestions(State(service): State<ChatService>) -> impl IntoResponse {
    match service.handlers.suggestions().await {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn ask(
    State(service): State<ChatService>,
    Json(params): Json<AskParams>,
) -> impl IntoResponse {
    match service.handlers.ask(params).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::warn!("Question rejected: {}", e);
            error_response(e).into_response()
        }
    }
}

async fn history(State(service): State<ChatService>) -> impl IntoResponse {
    Json(service.handlers.history().await)
}

async fn clear(State(service): State<ChatService>) -> StatusCode {
    service.handlers.clear().await;
    StatusCode::NO_CONTENT
}

async fn export(State(service): State<ChatService>) -> impl IntoResponse {
    let transcript = service.handlers.export().await;
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"chat_history.txt\"",
            ),
        ],
        transcript,
    )
}

async fn feedback(
    State(service): State<ChatService>,
    Json(params): Json<FeedbackParams>,
) -> impl IntoResponse {
    match service.handlers.feedback(params).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to record feedback: {}", e);
            error_response(e).into_response()
        }
    }
}

async fn set_voice(
    State(service): State<ChatService>,
    Json(params): Json<VoiceToggleParams>,
) -> impl IntoResponse {
    match service.handlers.set_voice(params).await {
        Ok(enabled) => Json(serde_json::json!({ "enabled": enabled })).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn stop_speaking(State(service): State<ChatService>) -> StatusCode {
    service.handlers.stop_speaking().await;
    StatusCode::NO_CONTENT
}

async fn listen(State(service): State<ChatService>) -> impl IntoResponse {
    Json(service.handlers.listen().await)
}
