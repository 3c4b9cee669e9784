use anyhow::Result;
use hound::{WavReader, WavWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

const EXTRACT_TIMEOUT: Duration = Duration::from_secs(300);
const CONCAT_TIMEOUT: Duration = Duration::from_secs(300);

/// Extract the audio track of a video file as mono 16 kHz 16-bit PCM WAV.
pub async fn extract_audio(video: &Path, output: &Path) -> Result<()> {
    info!("Extracting audio from {}", video.display());

    let run = Command::new("ffmpeg")
        .arg("-i")
        .arg(video)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg("-y")
        .arg(output)
        .output();

    let result = tokio::time::timeout(EXTRACT_TIMEOUT, run)
        .await
        .map_err(|_| anyhow::anyhow!("audio extraction timed out"))??;

    if !result.status.success() {
        return Err(anyhow::anyhow!(
            "ffmpeg exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr)
        ));
    }
    Ok(())
}

/// Concatenate WAV files into one, preserving input order exactly.
///
/// A single input is copied byte-for-byte. Multiple inputs go through `sox`
/// when available; otherwise frames are appended directly, which requires
/// every input to share the same audio parameters.
pub async fn concatenate(inputs: &[PathBuf], output: &Path) -> Result<()> {
    if inputs.is_empty() {
        return Err(anyhow::anyhow!("no audio files to concatenate"));
    }

    if inputs.len() == 1 {
        tokio::fs::copy(&inputs[0], output).await?;
        return Ok(());
    }

    match concatenate_sox(inputs, output).await {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!("sox concatenation unavailable ({}), falling back to frame copy", e);
            concatenate_frames(inputs, output)
        }
    }
}

async fn concatenate_sox(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let mut cmd = Command::new("sox");
    for input in inputs {
        cmd.arg(input);
    }
    cmd.arg(output);

    let result = tokio::time::timeout(CONCAT_TIMEOUT, cmd.output())
        .await
        .map_err(|_| anyhow::anyhow!("sox timed out"))??;

    if !result.status.success() {
        return Err(anyhow::anyhow!(
            "sox exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr)
        ));
    }
    Ok(())
}

/// Frame-level fallback. Inputs with mismatched specs are rejected rather
/// than silently producing corrupt output.
fn concatenate_frames(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let first = WavReader::open(&inputs[0])?;
    let spec = first.spec();
    drop(first);

    let mut writer = WavWriter::create(output, spec)?;

    for input in inputs {
        let mut reader = WavReader::open(input)?;
        if reader.spec() != spec {
            return Err(anyhow::anyhow!(
                "audio parameter mismatch in {}: expected {:?}, got {:?}",
                input.display(),
                spec,
                reader.spec()
            ));
        }
        for sample in reader.samples::<i16>() {
            writer.write_sample(sample?)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec};

    fn write_wav(path: &Path, spec: WavSpec, samples: &[i16]) {
        let mut writer = WavWriter::create(path, spec).unwrap();
        for s in samples {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn mono_spec(sample_rate: u32) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    #[tokio::test]
    async fn single_input_is_a_byte_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("only.wav");
        let output = dir.path().join("out.wav");
        write_wav(&input, mono_spec(16000), &[1, 2, 3, 4]);

        concatenate(&[input.clone()], &output).await.unwrap();

        let a = std::fs::read(&input).unwrap();
        let b = std::fs::read(&output).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_input_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.wav");
        assert!(concatenate(&[], &output).await.is_err());
    }

    #[test]
    fn frame_concat_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        let out = dir.path().join("out.wav");
        write_wav(&a, mono_spec(16000), &[10, 20]);
        write_wav(&b, mono_spec(16000), &[30, 40]);

        concatenate_frames(&[a, b], &out).unwrap();

        let samples: Vec<i16> = WavReader::open(&out)
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples, vec![10, 20, 30, 40]);
    }

    #[test]
    fn frame_concat_rejects_mismatched_specs() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        let out = dir.path().join("out.wav");
        write_wav(&a, mono_spec(16000), &[1]);
        write_wav(&b, mono_spec(22050), &[2]);

        let err = concatenate_frames(&[a, b], &out).unwrap_err();
        assert!(err.to_string().contains("mismatch"));
    }
}
