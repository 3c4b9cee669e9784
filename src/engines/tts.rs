use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use super::SpeechSynthesizer;

const SYNTH_TIMEOUT: Duration = Duration::from_secs(300);
const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);
const SPEAK_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RATE: u32 = 180;

/// Speech synthesis backed by external commands.
///
/// Primary path is `edge-tts`; when it is missing we fall back to the
/// system `say` command, converting its AIFF output with `afconvert`.
pub struct CommandTts;

impl CommandTts {
    pub fn new() -> Self {
        Self
    }

    async fn has_command(name: &str) -> bool {
        Command::new(name).arg("--help").output().await.is_ok()
    }

    async fn run_with_timeout(cmd: &mut Command, timeout: Duration, what: &str) -> Result<()> {
        let output = tokio::time::timeout(timeout, cmd.output())
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

    async fn synthesize_edge(&self, text: &str, voice: &str, output: &Path) -> Result<()> {
        let mut cmd = Command::new("edge-tts");
        cmd.arg("--voice")
            .arg(voice)
            .arg("--text")
            .arg(text)
            .arg("--write-media")
            .arg(output);
        Self::run_with_timeout(&mut cmd, SYNTH_TIMEOUT, "edge-tts").await
    }

    async fn synthesize_say(
        &self,
        text: &str,
        voice: &str,
        rate: u32,
        output: &Path,
    ) -> Result<()> {
        // `say` can only write AIFF; convert to 16-bit WAV afterwards
        let aiff = output.with_extension("aiff");

        let mut cmd = Command::new("say");
        cmd.arg("-v")
            .arg(voice)
            .arg("-r")
            .arg(rate.to_string())
            .arg("-o")
            .arg(&aiff)
            .arg(text);
        Self::run_with_timeout(&mut cmd, SYNTH_TIMEOUT, "say").await?;

        let mut convert = Command::new("afconvert");
        convert
            .arg("-f")
            .arg("WAVE")
            .arg("-d")
            .arg("LEI16")
            .arg(&aiff)
            .arg(output);
        let converted = Self::run_with_timeout(&mut convert, CONVERT_TIMEOUT, "afconvert").await;

        if let Err(e) = tokio::fs::remove_file(&aiff).await {
            warn!("Failed to remove intermediate aiff: {}", e);
        }
        converted?;

        if !output.exists() {
            return Err(anyhow::anyhow!("synthesis produced no output file"));
        }
        Ok(())
    }
}

impl Default for CommandTts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for CommandTts {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        rate: Option<u32>,
        output: &Path,
    ) -> Result<()> {
        if Self::has_command("edge-tts").await {
            info!("Synthesizing {} chars with edge-tts voice {}", text.len(), voice);
            return self.synthesize_edge(text, voice, output).await;
        }
        if Self::has_command("say").await {
            info!("Synthesizing {} chars with say voice {}", text.len(), voice);
            return self
                .synthesize_say(text, voice, rate.unwrap_or(DEFAULT_RATE), output)
                .await;
        }
        Err(anyhow::anyhow!(
            "speech engine not installed: neither edge-tts nor say found in PATH"
        ))
    }

    async fn speak(&self, text: &str, voice: &str, rate: Option<u32>) -> Result<()> {
        let mut cmd = Command::new("say");
        cmd.arg("-v")
            .arg(voice)
            .arg("-r")
            .arg(rate.unwrap_or(DEFAULT_RATE).to_string())
            .arg(text);
        Self::run_with_timeout(&mut cmd, SPEAK_TIMEOUT, "say").await
    }

    async fn halt(&self) -> Result<()> {
        // best effort: terminate any in-flight speech process
        let _ = Command::new("pkill").arg("-9").arg("say").output().await;
        Ok(())
    }
}
