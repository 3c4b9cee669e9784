use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::jobs::types::{AUDIO_FORMATS, TEXT_FORMATS, VIDEO_FORMATS};
use crate::jobs::{ConvertOptions, Job, JobInput, MediaKind};
use crate::{AppContext, UPLOAD_PATH};

pub fn convert_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/info", get(info_handler))
        .route("/convert", post(convert))
        .route("/upload", post(upload))
        .with_state(ctx)
}

async fn info_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Media Studio",
        "version": env!("CARGO_PKG_VERSION"),
        "formats": {
            "audio": AUDIO_FORMATS,
            "video": VIDEO_FORMATS,
            "text": TEXT_FORMATS,
        },
    }))
}

#[derive(Debug, Deserialize)]
struct ConvertRequest {
    source_type: MediaKind,
    target_type: MediaKind,
    #[serde(default)]
    content: String,
    #[serde(default)]
    options: ConvertOptions,
}

#[derive(Debug, Serialize)]
struct JobCreated {
    job_id: String,
}

/// Text-based conversion: the artifact arrives inline in the request body.
async fn convert(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<ConvertRequest>,
) -> impl IntoResponse {
    let job = Job::new(req.source_type, req.target_type, None);
    let id = ctx.jobs.create(job);

    ctx.dispatcher.spawn(
        id.clone(),
        JobInput { staged_file: None, text: Some(req.content), options: req.options },
    );

    (StatusCode::OK, Json(JobCreated { job_id: id })).into_response()
}

/// File upload conversion: the artifact is staged to disk before the worker
/// starts. Unsupported extensions are rejected here, before any job exists.
async fn upload(
    State(ctx): State<Arc<AppContext>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file_data: Option<Vec<u8>> = None;
    let mut filename = String::from("upload");
    let mut target = MediaKind::Text;
    let mut options = ConvertOptions::default();

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("file") => {
                if let Some(name) = field.file_name() {
                    filename = name.to_string();
                }
                match field.bytes().await {
                    Ok(bytes) => file_data = Some(bytes.to_vec()),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("failed to read upload: {}", e),
                        );
                    }
                }
            }
            Some("target") => {
                let raw = field.text().await.unwrap_or_default();
                match serde_json::from_value(serde_json::Value::String(raw.trim().to_string())) {
                    Ok(kind) => target = kind,
                    Err(_) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("invalid target type: {}", raw),
                        );
                    }
                }
            }
            Some("options") => {
                let raw = field.text().await.unwrap_or_default();
                if let Ok(parsed) = serde_json::from_str(&raw) {
                    options = parsed;
                }
            }
            _ => {}
        }
    }

    let Some(file_data) = file_data else {
        return error_response(StatusCode::BAD_REQUEST, "no file provided".to_string());
    };

    let ext = Path::new(&filename)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    let Some(source) = MediaKind::from_extension(&ext) else {
        return unsupported_format_response(&ext);
    };

    let job = Job::new(source, target, Some(filename));
    let id = job.id.clone();
    let staged = PathBuf::from(&*UPLOAD_PATH).join(format!("{}{}", id, ext));

    // text sources are handed to the pipeline inline, like /convert
    let text = if source == MediaKind::Text {
        Some(String::from_utf8_lossy(&file_data).into_owned())
    } else {
        None
    };

    if let Err(e) = tokio::fs::write(&staged, &file_data).await {
        error!("Failed to stage upload: {}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to stage upload: {}", e),
        );
    }

    ctx.jobs.create(job);
    info!("Staged upload for job {} at {}", id, staged.display());

    ctx.dispatcher.spawn(
        id.clone(),
        JobInput { staged_file: Some(staged), text, options },
    );

    (StatusCode::OK, Json(JobCreated { job_id: id })).into_response()
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn unsupported_format_response(ext: &str) -> axum::response::Response {
    let supported = [AUDIO_FORMATS, VIDEO_FORMATS, TEXT_FORMATS].concat();
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": format!("unsupported format: {}", ext),
            "supported": supported,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_rejection_lists_every_format() {
        let response = unsupported_format_response(".docx");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let supported = [AUDIO_FORMATS, VIDEO_FORMATS, TEXT_FORMATS].concat();
        assert_eq!(
            supported.len(),
            AUDIO_FORMATS.len() + VIDEO_FORMATS.len() + TEXT_FORMATS.len()
        );
        assert!(supported.contains(&".mp3"));
        assert!(supported.contains(&".mkv"));
        assert!(supported.contains(&".srt"));
    }
}
