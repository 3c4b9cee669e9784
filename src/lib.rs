pub mod audio;
pub mod engines;
pub mod jobs;
pub mod podcast;
pub mod speech;
pub mod utils;
pub mod web;

use std::{env, sync::Arc};

use jobs::{Dispatcher, JobRegistry};
use once_cell::sync::Lazy;
use podcast::{Orchestrator, ProjectStore};
use speech::Speaker;

pub struct AppContext {
    pub jobs: Arc<JobRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub projects: Arc<ProjectStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub speaker: Arc<Speaker>,
}

const STUDIO_UPLOAD_PATH: &str = "./studio_data/uploads/";
const STUDIO_OUTPUT_PATH: &str = "./studio_data/outputs/";
const STUDIO_PROJECT_PATH: &str = "./studio_data/projects/";

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(path) => path,
        Err(_) => dotenv::var(key).unwrap_or_else(|_| default.to_string()),
    }
}

pub static UPLOAD_PATH: Lazy<String> =
    Lazy::new(|| env_or("STUDIO_UPLOAD_PATH", STUDIO_UPLOAD_PATH));

pub static OUTPUT_PATH: Lazy<String> =
    Lazy::new(|| env_or("STUDIO_OUTPUT_PATH", STUDIO_OUTPUT_PATH));

pub static PROJECT_PATH: Lazy<String> =
    Lazy::new(|| env_or("STUDIO_PROJECT_PATH", STUDIO_PROJECT_PATH));

pub fn init_env() {
    dotenv::dotenv().ok();

    for dir in [&*UPLOAD_PATH, &*OUTPUT_PATH, &*PROJECT_PATH] {
        std::fs::create_dir_all(dir).unwrap_or_else(|e| {
            eprintln!("Failed to create data directory {}: {}", dir, e);
        });
    }
}
