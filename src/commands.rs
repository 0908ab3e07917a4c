use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::query::dispatcher;
use crate::query::ollama::OllamaClient;
use crate::transcribe::pipeline;
use crate::workspace::{self, Workspace};

/// CLI overrides applied on top of the configured transcription parameters.
#[derive(Debug, Default)]
pub struct TranscribeOptions {
    pub word_timestamps: bool,
    pub language: Option<String>,
    pub model: Option<String>,
    pub device: Option<String>,
    pub clean: bool,
}

/// Stage the upload into a fresh session workspace, run the pipeline over the
/// staged copy, and print the transcript.
pub fn run_transcribe(mut config: Config, file: &Path, options: &TranscribeOptions) -> Result<()> {
    if options.word_timestamps {
        config.transcription.word_timestamps = true;
    }
    if let Some(language) = &options.language {
        config.transcription.language = language.clone();
    }
    if let Some(model) = &options.model {
        config.transcription.model = model.clone();
    }
    if let Some(device) = &options.device {
        config.transcription.device = device.clone();
    }

    if !file.exists() {
        let outcome = pipeline::transcribe_file(None, &config);
        println!("{}", outcome.text);
        return Ok(());
    }

    let (session, staged) = Workspace::stage(file, &config.workspace)?;

    // An interrupt tears the session down after best-effort cleanup.
    let interrupt_root = session.root().to_path_buf();
    ctrlc::set_handler(move || {
        workspace::clear_and_terminate(&interrupt_root);
    })?;

    let outcome = pipeline::transcribe_file(Some(&staged), &config);
    println!("{}", outcome.text);

    if let (Some(path), Some(ws)) = (&outcome.transcript_path, &outcome.workspace) {
        println!();
        println!("Transcript saved to: {}", path.display());
        println!("Workspace root:      {}", ws.root().display());
        if options.clean {
            workspace::clear(ws.root());
        }
    } else {
        // A failed run leaves no useful artifacts; drop the staged session.
        workspace::clear(session.root());
    }

    Ok(())
}

/// Route a question about a saved transcript to the selected provider.
pub fn run_ask(
    config: &Config,
    question: &str,
    transcript: &Path,
    provider: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    let transcript_text = std::fs::read_to_string(transcript)
        .with_context(|| format!("Failed to read transcript {}", transcript.display()))?;

    let selector = provider.unwrap_or(config.providers.default_provider.as_str());
    let answer = dispatcher::answer(question, &transcript_text, selector, model, &config.providers);
    println!("{}", answer);
    Ok(())
}

/// List model identifiers reported by the local LLM daemon.
pub fn run_models(config: &Config) -> Result<()> {
    let client = OllamaClient::from_config(&config.providers.ollama)?;
    let models = client.list_models();
    if models.is_empty() {
        println!(
            "No local models found at {}",
            config.providers.ollama.endpoint
        );
    } else {
        for model in models {
            println!("{}", model);
        }
    }
    Ok(())
}

/// Delete a session workspace, optionally terminating afterwards.
pub fn run_clean(root: &Path, terminate: bool) -> Result<()> {
    if terminate {
        workspace::clear_and_terminate(root);
    }
    workspace::clear(root);
    Ok(())
}

/// Print or install the commented default configuration.
pub fn run_config(write: bool) -> Result<()> {
    let content = Config::generate_default_commented();
    if write {
        let dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("mediascribe");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("config.toml");
        if path.exists() {
            anyhow::bail!("{} already exists, not overwriting", path.display());
        }
        std::fs::write(&path, content)?;
        println!("Wrote {}", path.display());
    } else {
        print!("{}", content);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_transcribe_missing_file_prints_placeholder() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.workspace.sessions_dir = tmp.path().join("sessions");

        let missing = tmp.path().join("nope.mp3");
        let result = run_transcribe(config, &missing, &TranscribeOptions::default());
        assert!(result.is_ok());
        // Nothing was staged for a missing upload.
        assert!(!tmp.path().join("sessions").exists());
    }

    #[test]
    fn test_run_ask_missing_transcript_errors() {
        let config = Config::default();
        let result = run_ask(
            &config,
            "what was said?",
            Path::new("/nonexistent/talk_transcript.txt"),
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_run_clean_missing_root_is_ok() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("gone");
        assert!(run_clean(&gone, false).is_ok());
    }

    #[test]
    fn test_run_models_without_daemon_is_ok() {
        let mut config = Config::default();
        config.providers.ollama.endpoint = "http://127.0.0.1:1".to_string();
        config.providers.ollama.discovery_timeout_secs = 1;
        assert!(run_models(&config).is_ok());
    }
}
