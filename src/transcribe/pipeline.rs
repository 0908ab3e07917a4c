use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::media::normalize::{decode_pcm, normalize};
use crate::transcribe::engine::{load_model, InferenceRequest};
use crate::workspace::Workspace;

/// Fixed user-facing strings. Callers inspect the outcome text and paths to
/// tell success from failure; no error type crosses this boundary.
pub const NO_FILE_TEXT: &str = "Please upload a file";
pub const MODEL_LOAD_FAILED_TEXT: &str = "Error loading model";
pub const TRANSCRIPTION_FAILED_TEXT: &str = "Error during transcription";

/// Result of one transcription run: the transcript text, where it was saved,
/// and the workspace owning the artifacts. On failure `text` carries one of
/// the fixed failure strings and both handles are `None`.
#[derive(Debug)]
pub struct TranscribeOutcome {
    pub text: String,
    pub transcript_path: Option<PathBuf>,
    pub workspace: Option<Workspace>,
}

impl TranscribeOutcome {
    fn failure(text: &str) -> Self {
        Self {
            text: text.to_string(),
            transcript_path: None,
            workspace: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.transcript_path.is_some()
    }
}

/// Replace spaces in the upload's base name with underscores. No other
/// characters are sanitized.
pub fn sanitize_base_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Transcribe a staged upload: normalize to the canonical audio format, run
/// the speech model, and persist the transcript next to the workspace root
/// (the grandparent of the staged file). Each step hard-fails; the pipeline
/// never continues on a stale intermediate file.
pub fn transcribe_file(input: Option<&Path>, config: &Config) -> TranscribeOutcome {
    let Some(input) = input.filter(|p| p.exists()) else {
        tracing::warn!("No file uploaded for transcription.");
        return TranscribeOutcome::failure(NO_FILE_TEXT);
    };

    let Some(file_name) = input.file_name().map(|n| n.to_string_lossy().to_string()) else {
        tracing::error!("Upload path has no filename: {}", input.display());
        return TranscribeOutcome::failure(TRANSCRIPTION_FAILED_TEXT);
    };
    let Some(folder) = input.parent().and_then(|p| p.parent()) else {
        tracing::error!("Cannot determine workspace root for {}", input.display());
        return TranscribeOutcome::failure(TRANSCRIPTION_FAILED_TEXT);
    };

    tracing::info!("File name: {}", file_name);
    tracing::info!("Workspace root: {}", folder.display());

    let engine = match load_model(&config.transcription) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Error loading model: {:#}", e);
            return TranscribeOutcome::failure(MODEL_LOAD_FAILED_TEXT);
        }
    };

    let audio = match normalize(input, &config.media) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("Error preparing audio: {:#}", e);
            return TranscribeOutcome::failure(TRANSCRIPTION_FAILED_TEXT);
        }
    };

    let samples = match decode_pcm(&audio) {
        Ok(samples) => samples,
        Err(e) => {
            tracing::error!("Error decoding audio: {:#}", e);
            return TranscribeOutcome::failure(TRANSCRIPTION_FAILED_TEXT);
        }
    };

    let request = InferenceRequest::from_config(&config.transcription);
    let transcript = match engine.transcribe(&samples, &request) {
        Ok(transcript) => transcript,
        Err(e) => {
            tracing::error!("Error transcribing file: {:#}", e);
            return TranscribeOutcome::failure(TRANSCRIPTION_FAILED_TEXT);
        }
    };

    tracing::info!("File transcribed successfully, generating transcript...");
    let text = transcript.render();

    let stem = Path::new(&file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(file_name.clone());
    let output_path = folder.join(format!("{}_transcript.txt", sanitize_base_name(&stem)));
    if let Err(e) = std::fs::write(&output_path, &text) {
        tracing::error!("Error saving transcript to {}: {}", output_path.display(), e);
        return TranscribeOutcome::failure(TRANSCRIPTION_FAILED_TEXT);
    }
    tracing::info!("Transcription saved to: {}", output_path.display());

    TranscribeOutcome {
        text,
        transcript_path: Some(output_path),
        workspace: Some(Workspace::from_root(folder.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_input_yields_placeholder() {
        let config = Config::default();
        let outcome = transcribe_file(None, &config);
        assert_eq!(outcome.text, NO_FILE_TEXT);
        assert!(outcome.transcript_path.is_none());
        assert!(outcome.workspace.is_none());
        assert!(!outcome.succeeded());
    }

    #[test]
    fn test_nonexistent_input_yields_placeholder() {
        let config = Config::default();
        let outcome = transcribe_file(Some(Path::new("/nonexistent/upload.mp3")), &config);
        assert_eq!(outcome.text, NO_FILE_TEXT);
        assert!(!outcome.succeeded());
    }

    #[test]
    fn test_model_load_failure_yields_fixed_text() {
        let tmp = TempDir::new().unwrap();
        // Session layout: <root>/upload/<file>
        let upload_dir = tmp.path().join("session").join("upload");
        std::fs::create_dir_all(&upload_dir).unwrap();
        let staged = upload_dir.join("talk.wav");
        std::fs::write(&staged, b"fake audio").unwrap();

        let mut config = Config::default();
        // No weights in an empty model dir: load must fail before conversion.
        config.transcription.model_dir = tmp.path().join("models");

        let outcome = transcribe_file(Some(&staged), &config);
        assert_eq!(outcome.text, MODEL_LOAD_FAILED_TEXT);
        assert!(outcome.transcript_path.is_none());
        assert!(outcome.workspace.is_none());
    }

    #[test]
    fn test_sanitize_base_name_replaces_spaces_only() {
        assert_eq!(sanitize_base_name("my long talk"), "my_long_talk");
        assert_eq!(sanitize_base_name("già_fatto"), "già_fatto");
        // Only spaces are sanitized; other characters pass through.
        assert_eq!(sanitize_base_name("a/b:c"), "a/b:c");
    }
}
