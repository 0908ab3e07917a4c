use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::OllamaConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Known shapes of one streamed NDJSON fragment. Daemon versions have shipped
/// the incremental text under several key names; accept any one per line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateChunk {
    Response { response: String },
    Text { text: String },
    Output { output: String },
    Results { results: Vec<serde_json::Value> },
}

impl GenerateChunk {
    fn into_text(self) -> String {
        match self {
            GenerateChunk::Response { response } => response,
            GenerateChunk::Text { text } => text,
            GenerateChunk::Output { output } => output,
            GenerateChunk::Results { results } => results
                .iter()
                .filter_map(|r| r.get("text").and_then(|t| t.as_str()))
                .collect(),
        }
    }
}

/// Text contributed by one stream line. Known JSON shapes yield their payload;
/// a line that is not JSON at all is surfaced verbatim so diagnostics reach
/// the caller; well-formed JSON of an unknown shape contributes nothing.
fn fragment_text(line: &str) -> Option<String> {
    match serde_json::from_str::<serde_json::Value>(line) {
        Err(_) => Some(line.to_string()),
        Ok(value) => serde_json::from_value::<GenerateChunk>(value)
            .ok()
            .map(GenerateChunk::into_text),
    }
}

/// Concatenate streamed fragments in arrival order with no separator.
pub fn aggregate_stream<R: BufRead>(reader: R) -> std::io::Result<String> {
    let mut out = String::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if let Some(text) = fragment_text(&line) {
            out.push_str(&text);
        }
    }
    Ok(out)
}

/// Accept `{"models": [...]}` or a bare list; each item may be a plain string
/// or an object carrying a name/model/model_name key. De-duplicates while
/// preserving first-seen order.
pub fn parse_model_list(data: &serde_json::Value) -> Vec<String> {
    let items: &[serde_json::Value] = if let Some(models) =
        data.get("models").and_then(|m| m.as_array())
    {
        models
    } else if let Some(list) = data.as_array() {
        list
    } else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let name = if let Some(s) = item.as_str() {
            Some(s.to_string())
        } else if item.is_object() {
            ["name", "model", "model_name"]
                .iter()
                .find_map(|k| item.get(k).and_then(|v| v.as_str()).map(|s| s.to_string()))
        } else {
            None
        };
        if let Some(name) = name {
            if seen.insert(name.clone()) {
                out.push(name);
            }
        }
    }
    out
}

/// Client for a locally reachable LLM daemon speaking the Ollama HTTP API.
pub struct OllamaClient {
    endpoint: String,
    request_timeout: Duration,
    discovery_timeout: Duration,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn from_config(config: &OllamaConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            discovery_timeout: Duration::from_secs(config.discovery_timeout_secs),
            client,
        })
    }

    /// POST the prompt to /api/generate and read the streamed NDJSON reply as
    /// a blocking buffered read, bounded by the request timeout.
    pub fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&GenerateRequest { model, prompt })
            .send()
            .with_context(|| format!("Failed to reach {}", url))?
            .error_for_status()?;

        let reader = BufReader::new(response);
        aggregate_stream(reader).context("Failed reading streamed response")
    }

    /// List locally available model identifiers. Probes /models then /api/tags
    /// until one responds. Every failure mode yields an empty list.
    pub fn list_models(&self) -> Vec<String> {
        for path in ["/models", "/api/tags"] {
            let url = format!("{}{}", self.endpoint, path);
            let response = match self
                .client
                .get(&url)
                .timeout(self.discovery_timeout)
                .send()
                .and_then(|r| r.error_for_status())
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("Model listing probe {} failed: {}", url, e);
                    continue;
                }
            };

            match response.json::<serde_json::Value>() {
                Ok(data) => return parse_model_list(&data),
                Err(e) => {
                    tracing::debug!("Could not parse model listing from {}: {}", url, e);
                    return Vec::new();
                }
            }
        }
        Vec::new()
    }
}
