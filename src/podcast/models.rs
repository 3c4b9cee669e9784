use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A named speaking identity with an associated synthesis voice. Supplied at
/// project creation and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub personality: String,
    pub voice: String,
}

impl Persona {
    pub fn default_hosts() -> Vec<Persona> {
        vec![
            Persona {
                name: "Host A".into(),
                personality: "Curious and engaging host".into(),
                voice: "Samantha".into(),
            },
            Persona {
                name: "Host B".into(),
                personality: "Knowledgeable expert".into(),
                voice: "Daniel".into(),
            },
        ]
    }
}

/// One resolved line of dialogue: who speaks, what they say, which voice
/// renders it. Script order is preserved end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub role: String,
    pub text: String,
    pub voice: String,
}

/// One planned episode from the generated outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeBrief {
    pub episode: u32,
    pub title: String,
    pub theme: String,
    pub key_points: Vec<String>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
}

fn default_duration_minutes() -> u32 {
    15
}

/// A generated episode: script text, its segments, and the assembled audio
/// artifact when synthesis succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub episode: u32,
    pub title: String,
    pub script: String,
    pub segments: Vec<Segment>,
    pub audio_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Created,
    GeneratingOutline,
    OutlineReady,
    GeneratingEpisodes,
    Completed,
    Error,
}

/// A manuscript plus everything derived from it. Mutated by one worker at a
/// time and read concurrently by polling clients through the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub book_content: String,
    pub book_filename: String,
    pub num_episodes: u32,
    pub style: String,
    pub personas: Vec<Persona>,
    pub outline: Option<Vec<EpisodeBrief>>,
    pub episodes: BTreeMap<u32, Episode>,
    pub status: ProjectStatus,
    pub current_episode: Option<u32>,
    pub progress: Option<String>,
    pub dir: PathBuf,
}
