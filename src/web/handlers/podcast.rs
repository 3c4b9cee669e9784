use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use crate::jobs::types::short_id;
use crate::podcast::{Persona, Project, ProjectStatus};
use crate::{AppContext, PROJECT_PATH};

/// Default voice palette exposed to the frontend.
const VOICES: &[(&str, &str)] = &[
    ("female_en", "Samantha"),
    ("male_en", "Daniel"),
    ("female_zh", "Ting-Ting"),
    ("male_zh", "Mei-Jia"),
    ("narrator", "Alex"),
];

pub fn podcast_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/voices", get(list_voices))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/outline", post(generate_outline))
        .route("/projects/:id/episodes/:num", post(generate_episode))
        .route("/projects/:id/generate-all", post(generate_all))
        .with_state(ctx)
}

async fn list_voices() -> impl IntoResponse {
    let voices: BTreeMap<&str, &str> = VOICES.iter().copied().collect();
    Json(serde_json::json!({ "voices": voices }))
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    book_content: String,
    #[serde(default)]
    book_filename: String,
    #[serde(default = "default_num_episodes")]
    num_episodes: u32,
    #[serde(default = "default_style")]
    style: String,
    personas: Option<Vec<Persona>>,
}

fn default_name() -> String {
    "Untitled".to_string()
}

fn default_num_episodes() -> u32 {
    10
}

fn default_style() -> String {
    "conversational".to_string()
}

async fn create_project(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    let id = short_id();
    let dir = PathBuf::from(&*PROJECT_PATH).join(&id);
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        error!("Failed to create project dir: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    let project = Project {
        id: id.clone(),
        name: req.name,
        book_content: req.book_content,
        book_filename: req.book_filename,
        num_episodes: req.num_episodes,
        style: req.style,
        personas: req.personas.unwrap_or_else(Persona::default_hosts),
        outline: None,
        episodes: BTreeMap::new(),
        status: ProjectStatus::Created,
        current_episode: None,
        progress: None,
        dir,
    };
    ctx.projects.insert(project);

    (
        StatusCode::OK,
        Json(serde_json::json!({ "project_id": id })),
    )
        .into_response()
}

async fn list_projects(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(serde_json::json!({ "projects": ctx.projects.list() }))
}

async fn get_project(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match ctx.projects.get(&id) {
        Some(project) => (StatusCode::OK, Json(serde_json::json!(project))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Project not found" })),
        )
            .into_response(),
    }
}

async fn generate_outline(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match ctx.orchestrator.generate_outline(&id).await {
        Ok(outline) => (
            StatusCode::OK,
            Json(serde_json::json!({ "outline": { "episodes": outline } })),
        )
            .into_response(),
        Err(e) => {
            error!("Outline generation failed for {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct GenerateEpisodeRequest {
    #[serde(default = "default_generate_audio")]
    generate_audio: bool,
    rate: Option<u32>,
}

fn default_generate_audio() -> bool {
    true
}

async fn generate_episode(
    State(ctx): State<Arc<AppContext>>,
    Path((id, num)): Path<(String, u32)>,
    body: Option<Json<GenerateEpisodeRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    match ctx
        .orchestrator
        .generate_episode(&id, num, req.generate_audio, req.rate)
        .await
    {
        Ok(episode) => {
            (StatusCode::OK, Json(serde_json::json!({ "episode": episode }))).into_response()
        }
        Err(e) => {
            error!("Episode {} generation failed for {}: {}", num, id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct GenerateAllRequest {
    rate: Option<u32>,
}

async fn generate_all(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    body: Option<Json<GenerateAllRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let Some(project) = ctx.projects.get(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Project not found" })),
        )
            .into_response();
    };
    if project.outline.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Generate outline first" })),
        )
            .into_response();
    }

    let total = ctx.orchestrator.spawn_generate_all(id, req.rate);
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "started", "total_episodes": total })),
    )
        .into_response()
}
