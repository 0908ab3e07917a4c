use crate::config::ProvidersConfig;
use crate::query::gemini::GeminiClient;
use crate::query::ollama::OllamaClient;

/// Fixed user-facing strings, mirrored by the transcription pipeline's
/// text-only failure contract.
pub const NO_QUERY_TEXT: &str = "Please enter a query";
pub const KEY_NOT_FOUND_TEXT: &str = "Error: Gemini API key not found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Ollama,
}

impl Provider {
    /// Case-insensitive prefix match: any selector starting with "olla"
    /// routes to the local daemon, everything else to the cloud provider.
    pub fn from_selector(selector: &str) -> Provider {
        if selector.trim().to_lowercase().starts_with("olla") {
            Provider::Ollama
        } else {
            Provider::Gemini
        }
    }
}

/// The combined prompt both providers receive.
pub fn build_prompt(question: &str, transcript: &str) -> String {
    format!("Transcription: {}\n\nUser Input: {}", transcript, question)
}

/// Answer a free-text question about a transcript through the selected
/// provider. Every provider failure is caught here and converted to a
/// descriptive string; this function never returns an error.
pub fn answer(
    question: &str,
    transcript: &str,
    selector: &str,
    model: Option<&str>,
    providers: &ProvidersConfig,
) -> String {
    if question.trim().is_empty() {
        return NO_QUERY_TEXT.to_string();
    }

    let prompt = build_prompt(question, transcript);

    match Provider::from_selector(selector) {
        Provider::Ollama => {
            let model = model.unwrap_or(providers.ollama.model.as_str());
            let result = OllamaClient::from_config(&providers.ollama)
                .and_then(|client| client.generate(model, &prompt));
            match result {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(
                        "Error querying Ollama at {}: {:#}",
                        providers.ollama.endpoint,
                        e
                    );
                    format!("Error querying Ollama: {:#}", e)
                }
            }
        }
        Provider::Gemini => {
            let model = model.unwrap_or(providers.gemini.model.as_str());
            match GeminiClient::from_config(&providers.gemini) {
                Ok(None) => KEY_NOT_FOUND_TEXT.to_string(),
                Ok(Some(client)) => match client.generate(model, &prompt) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Error querying AI provider: {:#}", e);
                        format!("Error querying AI provider: {:#}", e)
                    }
                },
                Err(e) => {
                    tracing::error!("Error querying AI provider: {:#}", e);
                    format!("Error querying AI provider: {:#}", e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::gemini::KEY_ENV_VAR;

    #[test]
    fn test_ollama_prefixed_selectors_route_to_local_daemon() {
        for selector in ["Ollama", "OLLAMA-local", "olla", "ollama"] {
            assert_eq!(
                Provider::from_selector(selector),
                Provider::Ollama,
                "{} should route to the local daemon",
                selector
            );
        }
    }

    #[test]
    fn test_other_selectors_route_to_cloud() {
        for selector in ["Gemini", "gemini-1.5-pro", "cloud", ""] {
            assert_eq!(
                Provider::from_selector(selector),
                Provider::Gemini,
                "{} should route to the cloud provider",
                selector
            );
        }
    }

    #[test]
    fn test_selector_whitespace_is_ignored() {
        assert_eq!(Provider::from_selector("  Ollama "), Provider::Ollama);
    }

    #[test]
    fn test_build_prompt_format() {
        assert_eq!(
            build_prompt("what was said?", "hello there"),
            "Transcription: hello there\n\nUser Input: what was said?"
        );
    }

    #[test]
    fn test_empty_question_yields_placeholder() {
        let providers = ProvidersConfig::default();
        assert_eq!(answer("", "transcript", "Gemini", None, &providers), NO_QUERY_TEXT);
        assert_eq!(
            answer("   ", "transcript", "Ollama", None, &providers),
            NO_QUERY_TEXT
        );
    }

    #[test]
    fn test_missing_credential_yields_fixed_text_without_network() {
        std::env::remove_var(KEY_ENV_VAR);
        let providers = ProvidersConfig::default();
        // No key configured anywhere: the dispatcher answers immediately with
        // the fixed text instead of attempting a request.
        let started = std::time::Instant::now();
        let result = answer("what was said?", "hello", "Gemini", None, &providers);
        assert_eq!(result, KEY_NOT_FOUND_TEXT);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_unreachable_daemon_yields_error_string() {
        let mut providers = ProvidersConfig::default();
        providers.ollama.endpoint = "http://127.0.0.1:1".to_string();
        providers.ollama.request_timeout_secs = 1;
        let result = answer("what was said?", "hello", "Ollama", None, &providers);
        assert!(
            result.starts_with("Error querying Ollama:"),
            "unexpected answer: {}",
            result
        );
    }
}
