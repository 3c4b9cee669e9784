use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::podcast::Segment;
use crate::AppContext;

const DEFAULT_PREVIEW_VOICE: &str = "Samantha";

pub fn speak_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/speak", post(speak))
        .route("/speak/stop", post(stop))
        .with_state(ctx)
}

#[derive(Debug, Deserialize)]
struct SpeakRequest {
    #[serde(default)]
    segments: Vec<Segment>,
    #[serde(default)]
    text: String,
    voice: Option<String>,
    rate: Option<u32>,
}

/// Start a live speech preview: either a script's segments or one ad-hoc
/// text. Returns immediately; playback runs in the background.
async fn speak(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<SpeakRequest>,
) -> impl IntoResponse {
    let segments = if req.segments.is_empty() {
        if req.text.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "No text or segments provided" })),
            )
                .into_response();
        }
        vec![Segment {
            role: String::new(),
            text: req.text,
            voice: req.voice.unwrap_or_else(|| DEFAULT_PREVIEW_VOICE.to_string()),
        }]
    } else {
        req.segments
    };

    let count = segments.len();
    ctx.speaker.start(segments, req.rate);

    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "speaking", "segment_count": count })),
    )
        .into_response()
}

async fn stop(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    ctx.speaker.stop().await;
    Json(serde_json::json!({ "status": "stopped" }))
}
