use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;

pub const KEY_ENV_VAR: &str = "MEDIASCRIBE_GEMINI_KEY";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: String,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

/// Resolve the cloud API key: config value first, environment variable second.
pub fn resolve_api_key(config: &GeminiConfig) -> Option<String> {
    if !config.api_key.is_empty() {
        return Some(config.api_key.clone());
    }
    std::env::var(KEY_ENV_VAR).ok().filter(|k| !k.is_empty())
}

pub struct GeminiClient {
    config: GeminiConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.config.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiClient {
    /// Build a client from config. Returns `Ok(None)` when no API key is
    /// configured anywhere; the caller degrades to a fixed answer without any
    /// network I/O.
    pub fn from_config(config: &GeminiConfig) -> Result<Option<Self>> {
        let Some(api_key) = resolve_api_key(config) else {
            return Ok(None);
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Some(Self {
            config: config.clone(),
            api_key,
            client,
        }))
    }

    /// Send one generateContent request and return the answer text.
    pub fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        );

        let request = build_request(&self.config, prompt);

        tracing::info!("Sending generateContent request for model {}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .context("Failed to send generateContent request")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read response body".to_string());
            anyhow::bail!("Provider returned HTTP {}: {}", status.as_u16(), error_body);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .context("Failed to parse generateContent response")?;

        if let Some(usage) = &parsed.usage_metadata {
            tracing::info!(
                "Token usage: prompt={:?}, candidates={:?}, total={:?}",
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }

        extract_text(parsed)
    }
}

fn build_request(config: &GeminiConfig, prompt: &str) -> GenerateContentRequest {
    let safety = &config.safety;
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            response_mime_type: config.response_mime_type.clone(),
        },
        safety_settings: vec![
            SafetySetting {
                category: "HARM_CATEGORY_HARASSMENT".to_string(),
                threshold: safety.harassment.clone(),
            },
            SafetySetting {
                category: "HARM_CATEGORY_HATE_SPEECH".to_string(),
                threshold: safety.hate_speech.clone(),
            },
            SafetySetting {
                category: "HARM_CATEGORY_SEXUALLY_EXPLICIT".to_string(),
                threshold: safety.sexually_explicit.clone(),
            },
            SafetySetting {
                category: "HARM_CATEGORY_DANGEROUS_CONTENT".to_string(),
                threshold: safety.dangerous_content.clone(),
            },
        ],
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .context("No candidates in generateContent response")?;

    if let Some(reason) = &candidate.finish_reason {
        if reason != "STOP" {
            tracing::warn!("generateContent finish_reason: {}", reason);
        }
    }

    let parts = candidate
        .content
        .as_ref()
        .and_then(|c| c.parts.as_ref())
        .context("Candidate carries no content parts")?;

    Ok(parts.iter().map(|p| p.text.as_str()).collect())
}
