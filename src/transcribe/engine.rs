use std::path::{Path, PathBuf};

use anyhow::Result;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::config::TranscriptionConfig;
use crate::transcribe::render::{Segment, Transcript, Word};

/// A loaded speech model. One handle per transcription call; handles are not
/// shared across concurrent invocations.
pub struct Engine {
    ctx: WhisperContext,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

/// Everything one inference call needs, passed as a single unit.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub language: String,
    pub temperature: f32,
    pub beam_size: u32,
    pub batch_size: u32,
    pub condition_on_previous_text: bool,
    pub word_timestamps: bool,
    pub cpu_threads: u32,
}

impl InferenceRequest {
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            language: config.language.clone(),
            temperature: config.temperature,
            beam_size: config.beam_size,
            batch_size: config.batch_size,
            condition_on_previous_text: config.condition_on_previous_text,
            word_timestamps: config.word_timestamps,
            cpu_threads: config.cpu_threads,
        }
    }
}

/// Resolve the weights file for a model name: an explicit .bin path is taken
/// verbatim, anything else maps to ggml-{model}.bin under the model directory.
pub fn resolve_model_path(config: &TranscriptionConfig) -> PathBuf {
    let model = Path::new(&config.model);
    let is_bin = model.extension().map(|e| e == "bin").unwrap_or(false);
    if is_bin || model.is_absolute() {
        model.to_path_buf()
    } else {
        config.model_dir.join(format!("ggml-{}.bin", config.model))
    }
}

fn gpu_backend_compiled() -> bool {
    cfg!(any(feature = "cuda", feature = "vulkan", feature = "metal"))
}

/// Resolve the requested device. "auto" probes whether a GPU backend was
/// compiled in; anything other than an explicit "cpu" or "cuda" falls back to
/// the probe.
pub fn resolve_device(requested: &str) -> &'static str {
    match requested {
        "cpu" => "cpu",
        "cuda" => "cuda",
        _ => {
            if gpu_backend_compiled() {
                "cuda"
            } else {
                "cpu"
            }
        }
    }
}

/// Load the speech model with the configured parameters.
pub fn load_model(config: &TranscriptionConfig) -> Result<Engine> {
    let model_path = resolve_model_path(config);
    let device = resolve_device(&config.device);
    tracing::info!(
        "Loading model: {} | Compute type: {} | Device: {} | CPU Threads: {} | Workers: {}",
        config.model,
        config.compute_type,
        device,
        config.cpu_threads,
        config.num_workers
    );

    if !model_path.exists() {
        anyhow::bail!("Model weights not found: {}", model_path.display());
    }

    let mut ctx_params = WhisperContextParameters::default();
    ctx_params.use_gpu(device == "cuda");
    let ctx = WhisperContext::new_with_params(&model_path.to_string_lossy(), ctx_params)
        .map_err(|e| anyhow::anyhow!("Failed to load Whisper model: {:?}", e))?;

    tracing::info!("Model loaded successfully.");
    Ok(Engine { ctx })
}

impl Engine {
    /// Run inference over 16 kHz mono samples. No automatic retry on failure.
    pub fn transcribe(&self, samples: &[f32], request: &InferenceRequest) -> Result<Transcript> {
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| anyhow::anyhow!("Failed to create inference state: {:?}", e))?;

        let strategy = if request.beam_size > 1 {
            SamplingStrategy::BeamSearch {
                beam_size: request.beam_size as i32,
                patience: -1.0,
            }
        } else {
            SamplingStrategy::Greedy { best_of: 1 }
        };

        let mut params = FullParams::new(strategy);
        params.set_n_threads(request.cpu_threads.max(1) as i32);
        params.set_language(Some(request.language.as_str()));
        params.set_temperature(request.temperature);
        params.set_no_context(!request.condition_on_previous_text);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        if request.word_timestamps {
            // One token per emitted segment so each carries its own timing.
            params.set_token_timestamps(true);
            params.set_split_on_word(true);
            params.set_max_len(1);
        }

        tracing::info!(
            "Transcribing: batch_size={} | beam_size={} | language={} | word_timestamps={}",
            request.batch_size,
            request.beam_size,
            request.language,
            request.word_timestamps
        );

        state
            .full(params, samples)
            .map_err(|e| anyhow::anyhow!("Transcription failed: {:?}", e))?;

        let n_segments = state.full_n_segments();

        if request.word_timestamps {
            let mut words = Vec::new();
            for i in 0..n_segments {
                if let Some(segment) = state.get_segment(i) {
                    let text = segment.to_str_lossy().map_err(|e| {
                        anyhow::anyhow!("Failed to read segment text: {:?}", e)
                    })?;
                    let token = text.trim().to_string();
                    if token.is_empty() {
                        continue;
                    }
                    words.push(Word {
                        // Timestamps arrive in centiseconds.
                        start: segment.start_timestamp() as f64 / 100.0,
                        end: segment.end_timestamp() as f64 / 100.0,
                        token,
                    });
                }
            }
            Ok(Transcript::Words(words))
        } else {
            let mut segments = Vec::new();
            for i in 0..n_segments {
                if let Some(segment) = read_segment(&state, i)? {
                    segments.push(segment);
                }
            }
            Ok(Transcript::Segments(segments))
        }
    }
}

fn read_segment(
    state: &whisper_rs::WhisperState,
    index: i32,
) -> Result<Option<Segment>> {
    let Some(segment) = state.get_segment(index) else {
        return Ok(None);
    };
    let text = segment
        .to_str_lossy()
        .map_err(|e| anyhow::anyhow!("Failed to read segment text: {:?}", e))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(Segment {
        start: segment.start_timestamp() as f64 / 100.0,
        end: segment.end_timestamp() as f64 / 100.0,
        text,
    }))
}
