use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::engines::{ChatMessage, SpeechSynthesizer, TextGenerator};

use super::assembler::assemble_episode;
use super::models::{Episode, EpisodeBrief, ProjectStatus};
use super::resolver::resolve_segments;
use super::store::ProjectStore;

const OUTLINE_INPUT_CHARS: usize = 15000;
const OUTLINE_TOKEN_BUDGET: u32 = 3000;
const SCRIPT_INPUT_CHARS: usize = 8000;
const SCRIPT_TOKEN_BUDGET: u32 = 4000;

use crate::utils::text::clip;

/// Drives outline and episode generation for a project. Multi-episode runs
/// are strictly sequential: episodes share one progress cursor read by
/// polling clients.
pub struct Orchestrator {
    store: Arc<ProjectStore>,
    generator: Arc<dyn TextGenerator>,
    tts: Arc<dyn SpeechSynthesizer>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ProjectStore>,
        generator: Arc<dyn TextGenerator>,
        tts: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self { store, generator, tts }
    }

    pub fn store(&self) -> &Arc<ProjectStore> {
        &self.store
    }

    /// Generate the episode outline for a project and store it.
    pub async fn generate_outline(&self, project_id: &str) -> Result<Vec<EpisodeBrief>> {
        let project = self
            .store
            .get(project_id)
            .ok_or_else(|| anyhow::anyhow!("project not found: {}", project_id))?;

        self.store
            .with_mut(project_id, |p| p.status = ProjectStatus::GeneratingOutline);

        let system = format!(
            "You are a podcast series planner. Your task is to convert book content into a \
             {num}-episode podcast series.\n\nStyle: {style}\n\nFor each episode, provide:\n\
             1. Episode number and title\n2. Main topic/theme\n\
             3. Key points to cover (3-5 points)\n4. Suggested duration in minutes\n\n\
             Output as JSON array:\n[\n  {{\n    \"episode\": 1,\n    \"title\": \"Episode Title\",\n    \
             \"theme\": \"Main theme\",\n    \"key_points\": [\"point1\", \"point2\", \"point3\"],\n    \
             \"duration_minutes\": 15\n  }}\n]",
            num = project.num_episodes,
            style = project.style,
        );
        let user = format!(
            "Create a {}-episode podcast outline from this content:\n\n{}",
            project.num_episodes,
            clip(&project.book_content, OUTLINE_INPUT_CHARS)
        );

        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let raw = match self.generator.complete(&messages, OUTLINE_TOKEN_BUDGET, None).await {
            Ok(raw) => raw,
            Err(e) => {
                self.store
                    .with_mut(project_id, |p| p.status = ProjectStatus::Error);
                return Err(e);
            }
        };

        match parse_outline(&raw) {
            Ok(outline) => {
                self.store.with_mut(project_id, |p| {
                    p.outline = Some(outline.clone());
                    p.status = ProjectStatus::OutlineReady;
                });
                Ok(outline)
            }
            Err(e) => {
                self.store
                    .with_mut(project_id, |p| p.status = ProjectStatus::Error);
                Err(e)
            }
        }
    }

    /// Generate one episode: script, segments, optional audio. The episode
    /// is recorded in the project and its script persisted to disk.
    pub async fn generate_episode(
        &self,
        project_id: &str,
        episode_num: u32,
        generate_audio: bool,
        rate: Option<u32>,
    ) -> Result<Episode> {
        let project = self
            .store
            .get(project_id)
            .ok_or_else(|| anyhow::anyhow!("project not found: {}", project_id))?;

        let outline = project
            .outline
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("generate outline first"))?;
        let brief = outline
            .iter()
            .find(|b| b.episode == episode_num)
            .ok_or_else(|| anyhow::anyhow!("episode {} not found in outline", episode_num))?;

        let script = self.generate_script(&project, brief).await?;

        let lines: Vec<&str> = script.lines().collect();
        let segments = resolve_segments(&project.personas, &lines);

        let mut episode = Episode {
            episode: episode_num,
            title: brief.title.clone(),
            script: script.clone(),
            segments: segments.clone(),
            audio_path: None,
        };

        if generate_audio && !segments.is_empty() {
            match assemble_episode(&self.tts, episode_num, &segments, &project.dir, rate).await {
                Ok(path) => episode.audio_path = Some(path),
                Err(e) => warn!("Episode {} audio assembly failed: {}", episode_num, e),
            }
        }

        persist_script(&project.dir, episode_num, &script).await;

        self.store.with_mut(project_id, |p| {
            p.episodes.insert(episode_num, episode.clone());
        });

        Ok(episode)
    }

    /// Kick off a full sequential run over every episode in the outline.
    /// Returns the number of episodes scheduled.
    pub fn spawn_generate_all(self: &Arc<Self>, project_id: String, rate: Option<u32>) -> u32 {
        let total = self
            .store
            .get(&project_id)
            .and_then(|p| p.outline.map(|o| o.len() as u32))
            .unwrap_or(0);

        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.generate_all(&project_id, rate).await;
        });

        total
    }

    /// Generate every episode in ascending order, one at a time. A single
    /// episode's failure leaves its entry absent and the run continues;
    /// partial completion is a valid terminal outcome.
    pub async fn generate_all(&self, project_id: &str, rate: Option<u32>) {
        let Some(project) = self.store.get(project_id) else {
            warn!("Project {} vanished before generation started", project_id);
            return;
        };
        let Some(outline) = project.outline else {
            warn!("Project {} has no outline, nothing to generate", project_id);
            return;
        };

        self.store
            .with_mut(project_id, |p| p.status = ProjectStatus::GeneratingEpisodes);

        let total = outline.len();
        for (i, brief) in outline.iter().enumerate() {
            self.store.with_mut(project_id, |p| {
                p.current_episode = Some(brief.episode);
                p.progress = Some(format!("Episode {}/{}", i + 1, total));
            });

            match self
                .generate_episode(project_id, brief.episode, true, rate)
                .await
            {
                Ok(_) => info!("Episode {} generated", brief.episode),
                Err(e) => error!("Episode {} failed, continuing: {}", brief.episode, e),
            }
        }

        self.store.with_mut(project_id, |p| {
            p.status = ProjectStatus::Completed;
            p.progress = Some("All episodes generated".to_string());
        });
    }

    async fn generate_script(
        &self,
        project: &super::models::Project,
        brief: &EpisodeBrief,
    ) -> Result<String> {
        let persona_desc = project
            .personas
            .iter()
            .map(|p| format!("- {}: {} (Voice: {})", p.name, p.personality, p.voice))
            .collect::<Vec<_>>()
            .join("\n");

        let system = format!(
            "You are a podcast script writer. Write an engaging dialogue script for a podcast \
             episode.\n\nEpisode: {title}\nTheme: {theme}\nKey Points: {points}\n\
             Target Duration: {duration} minutes\n\nHosts/Characters:\n{personas}\n\n\
             Style: {style}\n\nRules:\n\
             1. Format each line as: \"CharacterName: dialogue text\"\n\
             2. Make conversations natural and engaging\n\
             3. Include reactions, questions, and smooth transitions\n\
             4. Cover all key points naturally\n\
             5. Start with intro, end with conclusion/teaser for next episode\n\n\
             Output the script directly, no markdown code blocks.",
            title = brief.title,
            theme = brief.theme,
            points = brief.key_points.join(", "),
            duration = brief.duration_minutes,
            personas = persona_desc,
            style = project.style,
        );
        let user = format!(
            "Write the script for Episode {}: {}\n\nRelevant content:\n{}",
            brief.episode,
            brief.title,
            clip(&project.book_content, SCRIPT_INPUT_CHARS)
        );

        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        self.generator.complete(&messages, SCRIPT_TOKEN_BUDGET, None).await
    }
}

/// Extract the JSON array between the first `[` and the last `]` of a model
/// response; generation services like to wrap their output in prose.
fn parse_outline(raw: &str) -> Result<Vec<EpisodeBrief>> {
    let start = raw
        .find('[')
        .ok_or_else(|| anyhow::anyhow!("no JSON array in outline response"))?;
    let end = raw
        .rfind(']')
        .ok_or_else(|| anyhow::anyhow!("no JSON array in outline response"))?;
    if end < start {
        return Err(anyhow::anyhow!("malformed outline response"));
    }
    let outline: Vec<EpisodeBrief> = serde_json::from_str(&raw[start..=end])?;
    Ok(outline)
}

async fn persist_script(project_dir: &std::path::Path, episode_num: u32, script: &str) {
    let dir = project_dir.join(format!("episode_{:02}", episode_num));
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        warn!("Failed to create episode dir: {}", e);
        return;
    }
    if let Err(e) = tokio::fs::write(dir.join("script.md"), script).await {
        warn!("Failed to persist script: {}", e);
    }
}
