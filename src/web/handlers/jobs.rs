use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::AppContext;

pub fn jobs_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/status/:id", get(get_status))
        .route("/jobs", get(list_jobs))
        .with_state(ctx)
}

/// Polling endpoint: the full job record, including `result` and `error`.
async fn get_status(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match ctx.jobs.get(&id) {
        Some(job) => (StatusCode::OK, Json(serde_json::json!(job))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Job not found" })),
        )
            .into_response(),
    }
}

async fn list_jobs(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(serde_json::json!({ "jobs": ctx.jobs.list() }))
}
