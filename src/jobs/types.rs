use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

use crate::engines::TranscriptSegment;

/// Broad kind of a content artifact, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Text,
}

pub const AUDIO_FORMATS: &[&str] = &[".mp3", ".wav", ".m4a", ".flac", ".ogg", ".aac", ".wma"];
pub const VIDEO_FORMATS: &[&str] = &[".mp4", ".mkv", ".avi", ".mov", ".webm", ".flv", ".wmv"];
pub const TEXT_FORMATS: &[&str] = &[".txt", ".md", ".json", ".srt"];

impl MediaKind {
    /// Classify a lowercase file extension (with leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        if AUDIO_FORMATS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else if VIDEO_FORMATS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if TEXT_FORMATS.contains(&ext.as_str()) {
            Some(Self::Text)
        } else {
            None
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Success payload of a finished job; shape depends on the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobResult {
    Transcript {
        content: String,
        segments: Vec<TranscriptSegment>,
        language: String,
        duration: f64,
    },
    Summary {
        content: String,
        word_count: usize,
        original_length: usize,
    },
    Audio {
        path: PathBuf,
        text_length: usize,
    },
    Video {
        path: PathBuf,
        duration: u32,
    },
}

/// The mutable record of one asynchronous transformation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub filename: Option<String>,
    pub source: MediaKind,
    pub target: MediaKind,
    pub status: JobStatus,
    pub progress: u8,
    pub stage: String,
    pub result: Option<JobResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(source: MediaKind, target: MediaKind, filename: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: short_id(),
            filename,
            source,
            target,
            status: JobStatus::Queued,
            progress: 0,
            stage: "Queued".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Options carried alongside a conversion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertOptions {
    pub api_key: Option<String>,
    pub model_size: Option<String>,
    pub voice: Option<String>,
    pub duration: Option<u32>,
    pub rate: Option<u32>,
}

/// Input handed to the background worker: a staged upload, inline text,
/// or both absent for nothing-to-do error paths.
#[derive(Debug, Clone)]
pub struct JobInput {
    pub staged_file: Option<PathBuf>,
    pub text: Option<String>,
    pub options: ConvertOptions,
}

pub fn short_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_classification() {
        assert_eq!(MediaKind::from_extension(".mp3"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_extension(".MKV"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension(".srt"), Some(MediaKind::Text));
        assert_eq!(MediaKind::from_extension(".docx"), None);
    }

    #[test]
    fn new_job_starts_queued() {
        let job = Job::new(MediaKind::Text, MediaKind::Audio, None);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert_eq!(job.id.len(), 8);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }
}
