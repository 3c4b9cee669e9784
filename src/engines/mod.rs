use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub mod openai;
pub mod tts;
pub mod whisper;

/// One timed span of transcribed speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Full output of a transcription run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub language: String,
    pub language_probability: f64,
    pub duration: f64,
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
}

/// One role-tagged prompt message for the generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file. Engine unavailability must surface as a
    /// descriptive error, never a panic.
    async fn transcribe(&self, audio: &Path, model_size: &str) -> Result<Transcription>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run a chat-style completion. A non-empty `api_key` overrides the
    /// engine's configured credential for this request only. Network and
    /// auth failures come back as textual errors for the caller to embed in
    /// a job result.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        api_key: Option<&str>,
    ) -> Result<String>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech into an audio file at `output`.
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: Option<u32>,
        output: &Path,
    ) -> Result<()>;

    /// Speak text aloud without producing a file (live preview path).
    async fn speak(&self, text: &str, voice: &str, rate: Option<u32>) -> Result<()>;

    /// Best-effort termination of any in-flight speech process.
    async fn halt(&self) -> Result<()>;
}

/// The set of external engines a pipeline can invoke.
pub struct Engines {
    pub stt: Arc<dyn SpeechToText>,
    pub generator: Arc<dyn TextGenerator>,
    pub tts: Arc<dyn SpeechSynthesizer>,
}
