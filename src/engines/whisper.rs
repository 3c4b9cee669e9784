use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use super::{SpeechToText, Transcription, TranscriptSegment};

const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(300);

/// Speech-to-text backed by an external whisper.cpp CLI process.
///
/// The engine writes its result as JSON next to the input file; we parse
/// that instead of scraping stdout.
pub struct WhisperCli {
    binary: String,
    model_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct WhisperJson {
    result: WhisperResult,
    transcription: Vec<WhisperLine>,
}

#[derive(Debug, Deserialize)]
struct WhisperResult {
    language: String,
}

#[derive(Debug, Deserialize)]
struct WhisperLine {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

impl WhisperCli {
    pub fn new(binary: impl Into<String>, model_dir: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into(), model_dir: model_dir.into() }
    }

    fn model_path(&self, model_size: &str) -> PathBuf {
        self.model_dir.join(format!("ggml-{}.bin", model_size))
    }

    async fn is_installed(&self) -> bool {
        Command::new(&self.binary)
            .arg("--help")
            .output()
            .await
            .is_ok()
    }
}

#[async_trait::async_trait]
impl SpeechToText for WhisperCli {
    async fn transcribe(&self, audio: &Path, model_size: &str) -> Result<Transcription> {
        if !self.is_installed().await {
            return Err(anyhow::anyhow!(
                "whisper engine not installed: binary '{}' not found in PATH",
                self.binary
            ));
        }

        let model = self.model_path(model_size);
        if !model.exists() {
            return Err(anyhow::anyhow!(
                "whisper model '{}' not found at {}",
                model_size,
                model.display()
            ));
        }

        let out_base = audio.with_extension("transcript");
        info!("Transcribing {} with model {}", audio.display(), model_size);

        let run = Command::new(&self.binary)
            .arg("-m")
            .arg(&model)
            .arg("-f")
            .arg(audio)
            .arg("-oj")
            .arg("-of")
            .arg(&out_base)
            .output();

        let output = tokio::time::timeout(TRANSCRIBE_TIMEOUT, run)
            .await
            .map_err(|_| anyhow::anyhow!("transcription timed out"))??;

        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "whisper exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let json_path = out_base.with_extension("transcript.json");
        let raw = tokio::fs::read_to_string(&json_path).await?;
        if let Err(e) = tokio::fs::remove_file(&json_path).await {
            warn!("Failed to remove transcript json: {}", e);
        }

        let parsed: WhisperJson = serde_json::from_str(&raw)?;

        let segments: Vec<TranscriptSegment> = parsed
            .transcription
            .iter()
            .map(|line| TranscriptSegment {
                start: line.offsets.from as f64 / 1000.0,
                end: line.offsets.to as f64 / 1000.0,
                text: line.text.trim().to_string(),
            })
            .collect();

        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let duration = segments.last().map(|s| s.end).unwrap_or(0.0);

        Ok(Transcription {
            language: parsed.result.language,
            // the CLI does not report a confidence, treat detection as certain
            language_probability: 1.0,
            duration,
            text,
            segments,
        })
    }
}
