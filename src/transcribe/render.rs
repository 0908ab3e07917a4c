/// A contiguous span of transcribed speech.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A single spoken token with its own timing.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    pub token: String,
}

/// Transcription output at exactly one granularity, ordered by start time.
#[derive(Debug, Clone, PartialEq)]
pub enum Transcript {
    Segments(Vec<Segment>),
    Words(Vec<Word>),
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        match self {
            Transcript::Segments(s) => s.is_empty(),
            Transcript::Words(w) => w.is_empty(),
        }
    }

    /// Render to the transcript file format: one line per unit, no trailing
    /// newline. Word mode uses `"{start:.2} -> {end:.2} {token}"`; the
    /// two-decimal formatting is a fixed contract for downstream consumers.
    pub fn render(&self) -> String {
        match self {
            Transcript::Segments(segments) => segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Transcript::Words(words) => words
                .iter()
                .map(|w| format!("{:.2} -> {:.2} {}", w.start, w.end, w.token))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
