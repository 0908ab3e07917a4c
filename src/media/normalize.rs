use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::config::MediaConfig;
use crate::media::classify::{classify, MediaKind};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("ffmpeg not found on PATH")]
    FfmpegMissing,
    #[error("ffmpeg failed on {}: {detail}", .path.display())]
    ConversionFailed { path: PathBuf, detail: String },
    #[error("unrecognized media format: {}", .0.display())]
    UnrecognizedFormat(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One ffmpeg invocation in a normalization chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStep {
    /// Extract the best audio stream from a video container.
    ExtractVideoAudio { input: PathBuf, output: PathBuf },
    /// Decode a legacy voice message with an explicit opus codec hint.
    DecodeLegacyVoice { input: PathBuf, output: PathBuf },
    /// Re-encode generic audio to the canonical MP3, even if already MP3.
    ReencodeAudio { input: PathBuf, output: PathBuf },
}

/// Canonical output path: same base name, `.mp3` extension, sibling of input.
pub fn canonical_target(input: &Path) -> PathBuf {
    input.with_extension("mp3")
}

/// Compute the conversion chain for a file. Classification is re-evaluated
/// after each step against the path the step produces, so a video first yields
/// an extracted `.mp3` which then takes the generic-audio re-encode, and a
/// legacy voice message chains decode → re-encode the same way. An empty plan
/// means the input is unrecognized.
pub fn conversion_plan(input: &Path, media: &MediaConfig) -> Vec<ConversionStep> {
    let target = canonical_target(input);
    let mut steps = Vec::new();
    let mut current = input.to_path_buf();

    if classify(&current, media) == MediaKind::Video {
        steps.push(ConversionStep::ExtractVideoAudio {
            input: current.clone(),
            output: target.clone(),
        });
        current = target.clone();
    }
    if classify(&current, media) == MediaKind::LegacyVoiceAudio {
        steps.push(ConversionStep::DecodeLegacyVoice {
            input: current.clone(),
            output: target.clone(),
        });
        current = target.clone();
    }
    if classify(&current, media) == MediaKind::GenericAudio {
        steps.push(ConversionStep::ReencodeAudio {
            input: current.clone(),
            output: target.clone(),
        });
    }

    steps
}

/// Normalize a media file to the canonical MP3 sibling of the input.
/// Every step checks the ffmpeg exit status and stops the chain on failure;
/// the pipeline never continues on a stale intermediate file.
pub fn normalize(input: &Path, media: &MediaConfig) -> Result<PathBuf, NormalizeError> {
    check_ffmpeg()?;

    let steps = conversion_plan(input, media);
    if steps.is_empty() {
        return Err(NormalizeError::UnrecognizedFormat(input.to_path_buf()));
    }

    for step in &steps {
        execute_step(step)?;
    }

    Ok(canonical_target(input))
}

/// Verify the ffmpeg binary is reachable before starting a conversion chain.
pub fn check_ffmpeg() -> Result<(), NormalizeError> {
    match Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(NormalizeError::FfmpegMissing),
        Err(e) => Err(NormalizeError::Io(e)),
    }
}

fn execute_step(step: &ConversionStep) -> Result<(), NormalizeError> {
    match step {
        ConversionStep::ExtractVideoAudio { input, output } => {
            tracing::info!("Extracting audio from video file: {}", input.display());
            let mut cmd = Command::new("ffmpeg");
            cmd.arg("-i")
                .arg(input)
                .args(["-q:a", "0", "-map", "a"])
                .arg(output)
                .arg("-y");
            run_ffmpeg(cmd, input)?;
            tracing::info!("Audio extracted to: {}", output.display());
        }
        ConversionStep::DecodeLegacyVoice { input, output } => {
            tracing::info!("Converting voice message to MP3: {}", input.display());
            let mut cmd = Command::new("ffmpeg");
            cmd.args(["-c:a", "libopus"])
                .arg("-i")
                .arg(input)
                .arg(output)
                .arg("-y");
            run_ffmpeg(cmd, input)?;
            tracing::info!("Converted file saved as: {}", output.display());
        }
        ConversionStep::ReencodeAudio { input, output } => {
            tracing::info!("Converting audio file to MP3: {}", input.display());
            if input == output {
                // ffmpeg cannot write its own input; go through a sibling temp file.
                let tmp = output.with_extension("tmp.mp3");
                let mut cmd = Command::new("ffmpeg");
                cmd.arg("-i").arg(input).arg(&tmp).arg("-y");
                run_ffmpeg(cmd, input)?;
                std::fs::rename(&tmp, output)?;
            } else {
                let mut cmd = Command::new("ffmpeg");
                cmd.arg("-i").arg(input).arg(output).arg("-y");
                run_ffmpeg(cmd, input)?;
            }
            tracing::info!("Audio file converted to MP3: {}", output.display());
        }
    }
    Ok(())
}

fn run_ffmpeg(mut cmd: Command, input: &Path) -> Result<(), NormalizeError> {
    let output = cmd.stdin(Stdio::null()).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            NormalizeError::FfmpegMissing
        } else {
            NormalizeError::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no error output")
            .to_string();
        return Err(NormalizeError::ConversionFailed {
            path: input.to_path_buf(),
            detail,
        });
    }
    Ok(())
}

/// Decode an audio file to 16 kHz mono f32 samples, the format the
/// transcription engine expects.
pub fn decode_pcm(audio: &Path) -> Result<Vec<f32>, NormalizeError> {
    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(audio)
        .args(["-f", "f32le", "-acodec", "pcm_f32le", "-ar", "16000", "-ac", "1", "-"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NormalizeError::FfmpegMissing
            } else {
                NormalizeError::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no error output")
            .to_string();
        return Err(NormalizeError::ConversionFailed {
            path: audio.to_path_buf(),
            detail,
        });
    }

    if output.stdout.len() % 4 != 0 {
        return Err(NormalizeError::ConversionFailed {
            path: audio.to_path_buf(),
            detail: format!("invalid PCM byte count: {}", output.stdout.len()),
        });
    }

    let samples: Vec<f32> = output
        .stdout
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    tracing::debug!(
        "Decoded {} samples ({:.2}s) from {}",
        samples.len(),
        samples.len() as f32 / 16000.0,
        audio.display()
    );

    Ok(samples)
}
