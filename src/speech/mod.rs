use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::engines::SpeechSynthesizer;
use crate::podcast::Segment;

/// Cooperative cancellation token shared between the playback worker and
/// the stop endpoint. Checked between segments only; an in-flight segment
/// is interrupted by killing the external speech process.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Live speech preview: plays segments aloud sequentially on a background
/// task. Only one preview runs at a time; starting a new one replaces the
/// previous token.
pub struct Speaker {
    tts: Arc<dyn SpeechSynthesizer>,
    current: std::sync::Mutex<CancelToken>,
    speaking: Arc<AtomicBool>,
}

impl Speaker {
    pub fn new(tts: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            tts,
            current: std::sync::Mutex::new(CancelToken::new()),
            speaking: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Speak segments in order on a spawned task and return immediately.
    /// Any preview already running is cancelled first.
    pub fn start(&self, segments: Vec<Segment>, rate: Option<u32>) {
        let token = CancelToken::new();
        {
            let mut current = self.current.lock().unwrap();
            std::mem::replace(&mut *current, token.clone()).cancel();
        }
        self.speaking.store(true, Ordering::SeqCst);

        let tts = self.tts.clone();
        let speaking = self.speaking.clone();
        tokio::spawn(async move {
            for segment in &segments {
                if token.is_cancelled() {
                    info!("Speech preview cancelled between segments");
                    break;
                }
                if segment.text.is_empty() {
                    continue;
                }
                if let Err(e) = tts.speak(&segment.text, &segment.voice, rate).await {
                    warn!("Preview segment failed: {}", e);
                }
            }
            speaking.store(false, Ordering::SeqCst);
        });
    }

    /// Request cancellation and terminate any in-flight speech process.
    pub async fn stop(&self) {
        self.current.lock().unwrap().cancel();
        if let Err(e) = self.tts.halt().await {
            warn!("Failed to halt speech process: {}", e);
        }
        self.speaking.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{sleep, Duration};

    struct SlowTts {
        spoken: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for SlowTts {
        async fn synthesize(
            &self,
            _text: &str,
            _voice: &str,
            _rate: Option<u32>,
            _output: &Path,
        ) -> Result<()> {
            Ok(())
        }

        async fn speak(&self, _text: &str, _voice: &str, _rate: Option<u32>) -> Result<()> {
            sleep(Duration::from_millis(20)).await;
            self.spoken.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn halt(&self) -> Result<()> {
            Ok(())
        }
    }

    fn segments(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| Segment {
                role: "Host".into(),
                text: format!("line {}", i),
                voice: "V1".into(),
            })
            .collect()
    }

    #[tokio::test]
    async fn speaks_all_segments_to_completion() {
        let spoken = Arc::new(AtomicUsize::new(0));
        let speaker = Speaker::new(Arc::new(SlowTts { spoken: spoken.clone() }));

        speaker.start(segments(3), None);
        for _ in 0..100 {
            if !speaker.is_speaking() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(spoken.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stop_cancels_between_segments() {
        let spoken = Arc::new(AtomicUsize::new(0));
        let speaker = Speaker::new(Arc::new(SlowTts { spoken: spoken.clone() }));

        speaker.start(segments(50), None);
        sleep(Duration::from_millis(30)).await;
        speaker.stop().await;
        sleep(Duration::from_millis(100)).await;

        assert!(spoken.load(Ordering::SeqCst) < 50);
        assert!(!speaker.is_speaking());
    }

    #[tokio::test]
    async fn restarting_cancels_the_previous_preview() {
        let spoken = Arc::new(AtomicUsize::new(0));
        let speaker = Speaker::new(Arc::new(SlowTts { spoken: spoken.clone() }));

        speaker.start(segments(50), None);
        sleep(Duration::from_millis(30)).await;
        speaker.start(segments(2), None);
        sleep(Duration::from_millis(300)).await;

        // the first run stops at its next segment boundary; only the
        // replacement plays to the end
        assert!(spoken.load(Ordering::SeqCst) < 10);
        assert!(!speaker.is_speaking());
    }

    #[test]
    fn token_starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
