use std::path::Path;

use crate::config::MediaConfig;

/// What kind of media an uploaded file is, judged purely by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    LegacyVoiceAudio,
    GenericAudio,
    Unrecognized,
}

/// Lowercased dot-prefixed extension of a path (".mp4"), or None.
fn dot_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Classify a file by its extension against the configured extension sets.
/// Checked in order: video, legacy voice message, generic audio. The sets are
/// disjoint, so first match wins. Total and side-effect-free.
pub fn classify(path: &Path, media: &MediaConfig) -> MediaKind {
    let ext = match dot_extension(path) {
        Some(ext) => ext,
        None => return MediaKind::Unrecognized,
    };

    if media.video_extensions.iter().any(|e| e == &ext) {
        MediaKind::Video
    } else if media.legacy_voice_extensions.iter().any(|e| e == &ext) {
        MediaKind::LegacyVoiceAudio
    } else if media.audio_extensions.iter().any(|e| e == &ext) {
        MediaKind::GenericAudio
    } else {
        MediaKind::Unrecognized
    }
}
