//! Chat endpoints
//!
//! `/brain/stream` answers with the framed `text/stream` protocol, one frame
//! per processed chunk. `/brain/chat` renders the whole answer at once.

use axum::{
    Json, Router,
    body::Body,
    extract::{Form, State},
    http::{HeaderName, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use futures_util::StreamExt;
use relay_common::{ACCEL_BUFFERING_HEADER, NO_CACHE, STREAM_CONTENT_TYPE, clock_time, truncate_string};
use relay_stream::{
    AgentRuntime, CompletionHook, FragmentRenderer, FrameReceiver, MessageView, StreamPipeline,
    StreamSummary, frame_channel,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info};

/// Shared state of the chat endpoints
pub struct BrainState {
    pub runtime: Arc<dyn AgentRuntime>,
    pub renderer: Arc<dyn FragmentRenderer>,
    pub completion: Arc<dyn CompletionHook>,
    /// Default target id used when the request does not name one
    pub default_target_id: String,
    pub channel_capacity: usize,
}

/// Form fields (POST) or query parameters (GET) of a chat request
#[derive(Debug, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub message: String,
    /// Id of the element receiving header-less frames on the client
    pub target: Option<String>,
}

impl MessageForm {
    fn trimmed_message(&self) -> Option<&str> {
        let message = self.message.trim();
        (!message.is_empty()).then_some(message)
    }
}

/// Handler for the streaming chat endpoint
pub async fn stream(State(state): State<Arc<BrainState>>, Form(form): Form<MessageForm>) -> Response {
    let Some(message) = form.trimmed_message() else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    info!("Stream request: {}", truncate_string(message, 60));

    let chunks = match state.runtime.stream(message).await {
        Ok(chunks) => chunks,
        Err(e) => {
            error!("Agent runtime failed to start: {:#}", e);
            return (StatusCode::BAD_GATEWAY, "Agent runtime unavailable").into_response();
        }
    };

    let target = form
        .target
        .clone()
        .unwrap_or_else(|| state.default_target_id.clone());
    let (writer, frames) = frame_channel(state.channel_capacity);
    StreamPipeline::new(target, state.renderer.clone()).spawn(chunks, writer, state.completion.clone());

    stream_response(frames)
}

/// Wrap the frame receiver into an unbuffered `text/stream` response
fn stream_response(frames: FrameReceiver) -> Response {
    let body = Body::from_stream(frames.map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, NO_CACHE),
            (HeaderName::from_static(ACCEL_BUFFERING_HEADER), "no"),
        ],
        body,
    )
        .into_response()
}

/// Handler for the non-streaming chat endpoint
pub async fn chat(State(state): State<Arc<BrainState>>, Form(form): Form<MessageForm>) -> Response {
    let Some(message) = form.trimmed_message() else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    info!("Chat request: {}", truncate_string(message, 60));

    let answer = match state.runtime.chat(message).await {
        Ok(answer) => answer,
        Err(e) => {
            error!("Agent runtime failed: {:#}", e);
            return (StatusCode::BAD_GATEWAY, "Agent runtime unavailable").into_response();
        }
    };

    let time = clock_time();
    let html = match state.renderer.render_message(&MessageView {
        message: &answer,
        time: &time,
        ..MessageView::default()
    }) {
        Ok(html) => html,
        Err(e) => {
            error!("Failed to render message: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Rendering failed").into_response();
        }
    };

    let summary = StreamSummary {
        answer_text: answer,
        ..StreamSummary::default()
    };
    if let Err(e) = state.completion.on_complete(&summary).await {
        error!("Completion hook failed: {:#}", e);
    }

    Html(html).into_response()
}

/// Handler for the health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn brain_routes(state: Arc<BrainState>) -> Router {
    Router::new()
        .route("/brain/chat", get(chat).post(chat))
        .route("/brain/stream", get(stream).post(stream))
        .route("/health", get(health_check))
        .with_state(state)
}
