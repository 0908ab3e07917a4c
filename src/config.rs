use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub media: MediaConfig,
    pub transcription: TranscriptionConfig,
    pub workspace: WorkspaceConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Extensions classified as video containers (audio is extracted first).
    pub video_extensions: Vec<String>,
    /// Legacy voice-message audio needing an explicit codec hint to decode.
    pub legacy_voice_extensions: Vec<String>,
    /// Generic audio extensions (re-encoded to the canonical format).
    pub audio_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Whisper model name (resolved to ggml-{model}.bin under model_dir)
    /// or an absolute path to a .bin weights file.
    pub model: String,
    pub model_dir: PathBuf,
    /// "auto", "cpu" or "cuda". Auto probes for a compiled GPU backend.
    pub device: String,
    pub compute_type: String,
    pub cpu_threads: u32,
    pub num_workers: u32,
    /// Spoken language hint, "auto" to detect.
    pub language: String,
    pub temperature: f32,
    pub beam_size: u32,
    pub batch_size: u32,
    pub condition_on_previous_text: bool,
    pub word_timestamps: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory under which per-upload session workspaces are created.
    pub sessions_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Default provider selector for `ask` ("gemini" or "ollama").
    pub default_provider: String,
    pub gemini: GeminiConfig,
    pub ollama: OllamaConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub endpoint: String,
    /// API key (or set MEDIASCRIBE_GEMINI_KEY environment variable).
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
    pub safety: SafetyConfig,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("response_mime_type", &self.response_mime_type)
            .field("safety", &self.safety)
            .finish()
    }
}

/// Blocking thresholds for the four safety categories the cloud API accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub harassment: String,
    pub hate_speech: String,
    pub sexually_explicit: String,
    pub dangerous_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
    /// Bound on the streamed generate call.
    pub request_timeout_secs: u64,
    /// Bound on each model-listing probe.
    pub discovery_timeout_secs: u64,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            media: MediaConfig::default(),
            transcription: TranscriptionConfig::default(),
            workspace: WorkspaceConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            video_extensions: [".mp4", ".avi", ".mov", ".mkv", ".webm"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            legacy_voice_extensions: vec![".opus".to_string()],
            audio_extensions: [".mp3", ".wav", ".m4a", ".flac", ".aac", ".ogg", ".wma"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        let model_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediascribe")
            .join("models");
        Self {
            model: "base".to_string(),
            model_dir,
            device: "auto".to_string(),
            compute_type: "int8".to_string(),
            cpu_threads: 4,
            num_workers: 1,
            language: "auto".to_string(),
            temperature: 0.0,
            beam_size: 5,
            batch_size: 16,
            condition_on_previous_text: true,
            word_timestamps: false,
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        let sessions_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediascribe")
            .join("sessions");
        Self { sessions_dir }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default_provider: "gemini".to_string(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
            safety: SafetyConfig::default(),
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            harassment: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
            hate_speech: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
            sexually_explicit: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
            dangerous_content: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434".to_string(),
            model: "llama2".to_string(),
            request_timeout_secs: 30,
            discovery_timeout_secs: 5,
        }
    }
}

// --- Config loading ---

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Check explicit path
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            let config: Config = toml::from_str(&content)?;
            return Ok((config, Some(p.to_path_buf())));
        }

        // 2. Check beside the executable
        if let Ok(exe_path) = std::env::current_exe() {
            let beside_exe = exe_path.parent().map(|p| p.join("mediascribe.toml"));
            if let Some(p) = beside_exe {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    let config: Config = toml::from_str(&content)?;
                    return Ok((config, Some(p)));
                }
            }
        }

        // 3. Check platform config directory (e.g. ~/.config/mediascribe/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_config = config_dir.join("mediascribe").join("config.toml");
            if platform_config.exists() {
                let content = std::fs::read_to_string(&platform_config)?;
                let config: Config = toml::from_str(&content)?;
                return Ok((config, Some(platform_config)));
            }
        }

        // 4. Fall back to defaults
        tracing::info!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    /// Load config (without tracking the resolved path).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        let default_model_dir = TranscriptionConfig::default().model_dir;
        let default_sessions_dir = WorkspaceConfig::default().sessions_dir;
        let model_dir_str = default_model_dir.to_string_lossy().replace('\\', "\\\\");
        let sessions_dir_str = default_sessions_dir.to_string_lossy().replace('\\', "\\\\");

        format!(
            r#"# mediascribe configuration
# Edit this file to customize media handling, transcription, and providers.

[media]
# File extensions classified as video. Audio is extracted from these with ffmpeg
# before transcription.
video_extensions = [".mp4", ".avi", ".mov", ".mkv", ".webm"]
# Legacy voice-message audio (decoded with an explicit opus codec hint).
legacy_voice_extensions = [".opus"]
# Generic audio extensions. These are re-encoded to MP3 unconditionally so the
# transcription engine always sees one canonical input format.
audio_extensions = [".mp3", ".wav", ".m4a", ".flac", ".aac", ".ogg", ".wma"]

[transcription]
# Whisper model name. Resolved to ggml-{{model}}.bin under model_dir, or give an
# absolute path to a .bin weights file.
model = "base"
model_dir = "{model_dir}"
# "auto" probes for a compiled GPU backend, or force "cpu" / "cuda".
device = "auto"
# Compute precision requested for inference.
compute_type = "int8"
# Threads used by the inference call.
cpu_threads = 4
# Decode workers requested for the engine.
num_workers = 1
# Spoken language hint, or "auto" to detect.
language = "auto"
# Decoding temperature (0.0 = deterministic).
temperature = 0.0
# Beam width. 1 selects greedy decoding.
beam_size = 5
# Batch size handed to the inference request.
batch_size = 16
# Feed previously decoded text back as context for the next window.
condition_on_previous_text = true
# Emit one timestamped line per word instead of one line per sentence.
word_timestamps = false

[workspace]
# Per-upload session workspaces (staged upload + derived artifacts) live here.
# `mediascribe clean <root>` deletes one of them.
sessions_dir = "{sessions_dir}"

[providers]
# Default backend for `mediascribe ask`: "gemini" (cloud) or "ollama" (local daemon).
default_provider = "gemini"

[providers.gemini]
endpoint = "https://generativelanguage.googleapis.com"
# API key (or set MEDIASCRIBE_GEMINI_KEY environment variable).
# Leaving both empty disables the cloud provider.
# api_key = ""
model = "gemini-1.5-flash"
temperature = 1.0
top_p = 0.95
top_k = 64
max_output_tokens = 8192
response_mime_type = "text/plain"

[providers.gemini.safety]
# Blocking threshold per safety category.
harassment = "BLOCK_MEDIUM_AND_ABOVE"
hate_speech = "BLOCK_MEDIUM_AND_ABOVE"
sexually_explicit = "BLOCK_MEDIUM_AND_ABOVE"
dangerous_content = "BLOCK_MEDIUM_AND_ABOVE"

[providers.ollama]
# Local LLM daemon address.
endpoint = "http://127.0.0.1:11434"
# Model used when `ask --model` is not given.
model = "llama2"
# Bound on the streamed generate call, in seconds.
request_timeout_secs = 30
# Bound on each model-listing probe, in seconds.
discovery_timeout_secs = 5
"#,
            model_dir = model_dir_str,
            sessions_dir = sessions_dir_str,
        )
    }
}
