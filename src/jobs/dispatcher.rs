use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::audio;
use crate::engines::{ChatMessage, Engines};
use crate::utils::text::clip;

use super::registry::{JobRegistry, JobUpdate};
use super::types::{JobInput, JobResult, JobStatus, MediaKind};

const SUMMARY_INPUT_CHARS: usize = 8000;
const SUMMARY_TOKEN_BUDGET: u32 = 1000;
const RENDER_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_VOICE: &str = "zh-CN-XiaoxiaoNeural";
const DEFAULT_SLIDESHOW_SECS: u32 = 10;
const DEFAULT_MODEL_SIZE: &str = "base";

/// The transformation sequences the service knows how to run, keyed by the
/// (source, target) kind pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Audio or video in, transcript out.
    Transcription,
    /// Text in, summary out.
    Summary,
    /// Text in, speech audio out.
    Synthesis,
    /// Text in, slideshow video out.
    Slideshow,
    /// Audio in, video with a static canvas out.
    Soundtrack,
}

/// Observable description of one stage: the label shown to pollers and the
/// coarse progress checkpoint set before the stage runs. Checkpoints only
/// need to be monotone within a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct StageDesc {
    pub label: &'static str,
    pub progress: u8,
}

impl Pipeline {
    pub fn select(source: MediaKind, target: MediaKind) -> Option<Self> {
        use MediaKind::*;
        match (source, target) {
            (Audio, Text) | (Video, Text) => Some(Self::Transcription),
            (Text, Text) => Some(Self::Summary),
            (Text, Audio) => Some(Self::Synthesis),
            (Text, Video) => Some(Self::Slideshow),
            (Audio, Video) => Some(Self::Soundtrack),
            _ => None,
        }
    }

    pub fn stages(&self) -> &'static [StageDesc] {
        match self {
            Self::Transcription => &[
                StageDesc { label: "Extracting audio...", progress: 20 },
                StageDesc { label: "Transcribing audio...", progress: 40 },
                StageDesc { label: "Composing transcript...", progress: 80 },
            ],
            Self::Summary => &[StageDesc { label: "Generating summary...", progress: 30 }],
            Self::Synthesis => &[StageDesc { label: "Synthesizing speech...", progress: 30 }],
            Self::Slideshow => &[StageDesc { label: "Rendering video...", progress: 30 }],
            Self::Soundtrack => {
                &[StageDesc { label: "Rendering soundtrack video...", progress: 30 }]
            }
        }
    }
}

/// Drives a job through the stage sequence for its type pair, mutating the
/// registry record after every transition. One dispatcher instance is shared
/// by every worker.
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    engines: Arc<Engines>,
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<JobRegistry>,
        engines: Arc<Engines>,
        upload_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self { registry, engines, upload_dir, output_dir }
    }

    /// Start a background worker for the job and return immediately.
    pub fn spawn(self: &Arc<Self>, job_id: String, input: JobInput) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run(&job_id, input).await;
        });
    }

    /// Execute the job's pipeline to completion or failure. The staged input
    /// file, if any, is deleted afterwards regardless of outcome.
    pub async fn run(&self, job_id: &str, input: JobInput) {
        let Some(job) = self.registry.get(job_id) else {
            warn!("Job {} vanished before processing started", job_id);
            return;
        };

        let pipeline = match Pipeline::select(job.source, job.target) {
            Some(p) => p,
            None => {
                self.registry.update(
                    job_id,
                    JobUpdate::failed(format!(
                        "unsupported conversion: {} -> {}",
                        job.source, job.target
                    )),
                );
                cleanup_staged(&input).await;
                return;
            }
        };

        self.registry.update(
            job_id,
            JobUpdate::default()
                .status(JobStatus::Processing)
                .progress(10)
                .stage("Preparing..."),
        );

        let outcome = match pipeline {
            Pipeline::Transcription => self.run_transcription(job_id, &input, job.source).await,
            Pipeline::Summary => self.run_summary(job_id, &input).await,
            Pipeline::Synthesis => self.run_synthesis(job_id, &input).await,
            Pipeline::Slideshow => self.run_slideshow(job_id, &input).await,
            Pipeline::Soundtrack => self.run_soundtrack(job_id, &input).await,
        };

        match outcome {
            Ok(result) => {
                info!("Job {} completed", job_id);
                self.registry.update(
                    job_id,
                    JobUpdate::default()
                        .status(JobStatus::Completed)
                        .progress(100)
                        .stage("Done")
                        .result(result),
                );
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                self.registry.update(job_id, JobUpdate::failed(e.to_string()));
            }
        }

        cleanup_staged(&input).await;
    }

    fn advance(&self, job_id: &str, stage: StageDesc) {
        self.registry
            .update(job_id, JobUpdate::default().progress(stage.progress).stage(stage.label));
    }

    async fn run_transcription(
        &self,
        job_id: &str,
        input: &JobInput,
        source: MediaKind,
    ) -> Result<JobResult> {
        let stages = Pipeline::Transcription.stages();
        let staged = input
            .staged_file
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no input file staged for transcription"))?;

        self.advance(job_id, stages[0]);
        let audio_path = if source == MediaKind::Video {
            let extracted = self.upload_dir.join(format!("{}_audio.wav", job_id));
            audio::extract_audio(staged, &extracted)
                .await
                .map_err(|e| anyhow::anyhow!("audio extraction failed: {}", e))?;
            extracted
        } else {
            staged.to_path_buf()
        };

        self.advance(job_id, stages[1]);
        let model_size = input.options.model_size.as_deref().unwrap_or(DEFAULT_MODEL_SIZE);
        let transcription = self.engines.stt.transcribe(&audio_path, model_size).await;

        // the extracted intermediate is ours to clean up either way
        if audio_path != staged {
            if let Err(e) = tokio::fs::remove_file(&audio_path).await {
                warn!("Failed to remove extracted audio: {}", e);
            }
        }
        let transcription = transcription?;

        self.advance(job_id, stages[2]);
        Ok(JobResult::Transcript {
            content: transcription.text,
            segments: transcription.segments,
            language: transcription.language,
            duration: transcription.duration,
        })
    }

    async fn run_summary(&self, job_id: &str, input: &JobInput) -> Result<JobResult> {
        self.advance(job_id, Pipeline::Summary.stages()[0]);

        let text = input.text.as_deref().unwrap_or_default();
        let messages = [
            ChatMessage::system(
                "You are a helpful assistant that summarizes content. Provide a clear, \
                 structured summary with key points in the same language as the input.",
            ),
            ChatMessage::user(format!(
                "Please summarize the following:\n\n{}",
                clip(text, SUMMARY_INPUT_CHARS)
            )),
        ];

        let summary = self
            .engines
            .generator
            .complete(&messages, SUMMARY_TOKEN_BUDGET, input.options.api_key.as_deref())
            .await?;

        Ok(JobResult::Summary {
            word_count: summary.chars().count(),
            original_length: text.chars().count(),
            content: summary,
        })
    }

    async fn run_synthesis(&self, job_id: &str, input: &JobInput) -> Result<JobResult> {
        self.advance(job_id, Pipeline::Synthesis.stages()[0]);

        let text = input.text.as_deref().unwrap_or_default();
        let voice = input.options.voice.as_deref().unwrap_or(DEFAULT_VOICE);
        let output = self.output_dir.join(format!("{}_output.mp3", job_id));

        self.engines
            .tts
            .synthesize(text, voice, input.options.rate, &output)
            .await
            .map_err(|e| anyhow::anyhow!("speech synthesis failed: {}", e))?;

        Ok(JobResult::Audio { path: output, text_length: text.chars().count() })
    }

    async fn run_slideshow(&self, job_id: &str, input: &JobInput) -> Result<JobResult> {
        self.advance(job_id, Pipeline::Slideshow.stages()[0]);

        let text = input.text.as_deref().unwrap_or_default();
        let duration = input.options.duration.unwrap_or(DEFAULT_SLIDESHOW_SECS);
        let output = self.output_dir.join(format!("{}_output.mp4", job_id));

        render_slideshow(text, duration, &output)
            .await
            .map_err(|e| anyhow::anyhow!("video generation failed: {}", e))?;

        Ok(JobResult::Video { path: output, duration })
    }

    async fn run_soundtrack(&self, job_id: &str, input: &JobInput) -> Result<JobResult> {
        self.advance(job_id, Pipeline::Soundtrack.stages()[0]);

        let staged = input
            .staged_file
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no input file staged for soundtrack rendering"))?;
        let output = self.output_dir.join(format!("{}_output.mp4", job_id));

        render_soundtrack(staged, &output)
            .await
            .map_err(|e| anyhow::anyhow!("video generation failed: {}", e))?;

        Ok(JobResult::Video { path: output, duration: 0 })
    }
}

async fn cleanup_staged(input: &JobInput) {
    if let Some(path) = &input.staged_file {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove staged input {}: {}", path.display(), e);
        }
    }
}

async fn run_ffmpeg(cmd: &mut Command, what: &str) -> Result<()> {
    let output = tokio::time::timeout(RENDER_TIMEOUT, cmd.output())
        .await
        .map_err(|_| anyhow::anyhow!("{} timed out", what))??;
    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} exited with {}: {}",
            what,
            output.status,
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

/// Render a static slideshow video carrying the first few hundred characters
/// of the text. The text goes through a file to avoid drawtext escaping.
async fn render_slideshow(text: &str, duration: u32, output: &Path) -> Result<()> {
    let text_file = tempfile::NamedTempFile::new()?;
    std::fs::write(text_file.path(), clip(text, 500))?;

    let filter = format!(
        "drawtext=textfile={}:fontcolor=white:fontsize=48:x=(w-text_w)/2:y=(h-text_h)/2",
        text_file.path().display()
    );

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg(format!("color=c=0x1e1e1e:s=1920x1080:d={}", duration))
        .arg("-vf")
        .arg(filter)
        .arg("-c:v")
        .arg("libx264")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg(output);
    run_ffmpeg(&mut cmd, "slideshow render").await
}

/// Mux an audio file onto a black canvas.
async fn render_soundtrack(audio: &Path, output: &Path) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg("color=c=black:s=1920x1080:d=10")
        .arg("-i")
        .arg(audio)
        .arg("-shortest")
        .arg("-c:v")
        .arg("libx264")
        .arg("-c:a")
        .arg("aac")
        .arg(output);
    run_ffmpeg(&mut cmd, "soundtrack render").await
}
