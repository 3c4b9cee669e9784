use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use mediastudio_rs::engines::{openai::OpenAiGenerator, tts::CommandTts, whisper::WhisperCli, Engines};
use mediastudio_rs::jobs::{Dispatcher, JobRegistry};
use mediastudio_rs::podcast::{Orchestrator, ProjectStore};
use mediastudio_rs::speech::Speaker;
use mediastudio_rs::utils::logger;
use mediastudio_rs::{init_env, AppContext, OUTPUT_PATH, UPLOAD_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = logger::init("./logs".to_string())?;
    init_env();

    info!("Starting media studio service...");

    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    let base_url = std::env::var("OPENAI_BASE_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    let model_dir =
        std::env::var("WHISPER_MODEL_DIR").unwrap_or_else(|_| "./models/whisper".to_string());

    info!("Initializing engines...");
    let engines = Arc::new(Engines {
        stt: Arc::new(WhisperCli::new("whisper-cli", model_dir)),
        generator: Arc::new(OpenAiGenerator::new(base_url, api_key)),
        tts: Arc::new(CommandTts::new()),
    });

    info!("Initializing registries...");
    let jobs = Arc::new(JobRegistry::new());
    let projects = Arc::new(ProjectStore::new());

    let dispatcher = Arc::new(Dispatcher::new(
        jobs.clone(),
        engines.clone(),
        PathBuf::from(&*UPLOAD_PATH),
        PathBuf::from(&*OUTPUT_PATH),
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        projects.clone(),
        engines.generator.clone(),
        engines.tts.clone(),
    ));
    let speaker = Arc::new(Speaker::new(engines.tts.clone()));

    let ctx = Arc::new(AppContext {
        jobs,
        dispatcher,
        projects,
        orchestrator,
        speaker,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], 7300));
    info!("Starting HTTP server at http://{}", addr);

    match mediastudio_rs::web::start_server(ctx, addr).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            tracing::error!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
