use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::audio;
use crate::engines::SpeechSynthesizer;

use super::models::Segment;

/// Synthesize every segment of an episode and concatenate the survivors, in
/// script order, into one audio artifact.
///
/// A failed segment is dropped rather than aborting the episode: one engine
/// hiccup should not void minutes of otherwise good audio. Assembly fails
/// only when no segment synthesizes at all.
pub async fn assemble_episode(
    tts: &Arc<dyn SpeechSynthesizer>,
    episode_num: u32,
    segments: &[Segment],
    project_dir: &Path,
    rate: Option<u32>,
) -> Result<PathBuf> {
    let episode_dir = project_dir.join(format!("episode_{:02}", episode_num));
    tokio::fs::create_dir_all(&episode_dir).await?;

    let total = segments.len();
    let mut segment_files = Vec::new();

    for (i, seg) in segments.iter().enumerate() {
        info!("Synthesizing segment {}/{} ({})", i + 1, total, seg.role);

        // zero-padded so lexical order equals script order
        let seg_path = episode_dir.join(format!("seg_{:04}.wav", i));
        match tts.synthesize(&seg.text, &seg.voice, rate, &seg_path).await {
            Ok(()) => segment_files.push(seg_path),
            Err(e) => {
                warn!("Segment {} failed synthesis, dropping it: {}", i, e);
            }
        }
    }

    if segment_files.is_empty() {
        return Err(anyhow::anyhow!("no segments synthesized successfully"));
    }

    let output = episode_dir.join(format!("episode_{:02}.wav", episode_num));
    audio::concatenate(&segment_files, &output).await?;

    for f in &segment_files {
        if let Err(e) = tokio::fs::remove_file(f).await {
            warn!("Failed to remove segment file {}: {}", f.display(), e);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes a one-sample WAV whose value encodes the synthesis order, so
    /// tests can read survivor order back out of the concatenated file.
    struct OrderedTts {
        calls: AtomicUsize,
        fail_indices: Vec<usize>,
    }

    impl OrderedTts {
        fn new(fail_indices: Vec<usize>) -> Self {
            Self { calls: AtomicUsize::new(0), fail_indices }
        }
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for OrderedTts {
        async fn synthesize(
            &self,
            _text: &str,
            _voice: &str,
            _rate: Option<u32>,
            output: &Path,
        ) -> Result<()> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_indices.contains(&index) {
                return Err(anyhow::anyhow!("synthetic engine failure"));
            }
            let spec = WavSpec {
                channels: 1,
                sample_rate: 16000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            let mut writer = WavWriter::create(output, spec)?;
            writer.write_sample(index as i16)?;
            writer.finalize()?;
            Ok(())
        }

        async fn speak(&self, _text: &str, _voice: &str, _rate: Option<u32>) -> Result<()> {
            Ok(())
        }

        async fn halt(&self) -> Result<()> {
            Ok(())
        }
    }

    fn segments(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| Segment {
                role: format!("Host {}", i),
                text: format!("line {}", i),
                voice: "V1".into(),
            })
            .collect()
    }

    fn read_samples(path: &Path) -> Vec<i16> {
        hound::WavReader::open(path)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[tokio::test]
    async fn survivors_keep_script_order_when_a_segment_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tts: Arc<dyn SpeechSynthesizer> = Arc::new(OrderedTts::new(vec![1]));

        let output = assemble_episode(&tts, 1, &segments(3), dir.path(), None)
            .await
            .unwrap();

        // segment 1 was dropped; 0 and 2 remain in order
        assert_eq!(read_samples(&output), vec![0, 2]);
    }

    #[tokio::test]
    async fn intermediate_files_are_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let tts: Arc<dyn SpeechSynthesizer> = Arc::new(OrderedTts::new(vec![]));

        let output = assemble_episode(&tts, 2, &segments(2), dir.path(), None)
            .await
            .unwrap();

        assert!(output.exists());
        let episode_dir = dir.path().join("episode_02");
        assert!(!episode_dir.join("seg_0000.wav").exists());
        assert!(!episode_dir.join("seg_0001.wav").exists());
    }

    #[tokio::test]
    async fn all_segments_failing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tts: Arc<dyn SpeechSynthesizer> = Arc::new(OrderedTts::new(vec![0, 1]));

        let err = assemble_episode(&tts, 3, &segments(2), dir.path(), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no segments"));
    }
}
