use std::path::PathBuf;

use tempfile::TempDir;

use mediascribe::config::Config;
use mediascribe::media::classify::{classify, MediaKind};
use mediascribe::media::normalize::{canonical_target, conversion_plan, ConversionStep};
use mediascribe::query::dispatcher::{answer, KEY_NOT_FOUND_TEXT};
use mediascribe::transcribe::pipeline::{transcribe_file, MODEL_LOAD_FAILED_TEXT, NO_FILE_TEXT};
use mediascribe::workspace::{self, Workspace};

#[test]
fn test_staged_upload_reaches_engine_and_fails_cleanly_without_weights() {
    let tmp = TempDir::new().unwrap();
    let upload = tmp.path().join("board meeting.wav");
    std::fs::write(&upload, b"fake audio").unwrap();

    let mut config = Config::default();
    config.workspace.sessions_dir = tmp.path().join("sessions");
    config.transcription.model_dir = tmp.path().join("models"); // empty: no weights

    let (session, staged) = Workspace::stage(&upload, &config.workspace).unwrap();

    // Staged layout: the session root is the grandparent of the staged file.
    assert_eq!(
        staged.parent().and_then(|p| p.parent()),
        Some(session.root())
    );
    assert!(staged.exists());

    // Without model weights the pipeline returns the fixed failure text and
    // no handles, instead of crashing.
    let outcome = transcribe_file(Some(&staged), &config);
    assert_eq!(outcome.text, MODEL_LOAD_FAILED_TEXT);
    assert!(outcome.transcript_path.is_none());
    assert!(outcome.workspace.is_none());
    assert!(!outcome.succeeded());

    // The caller owns cleanup of the staged session.
    workspace::clear(session.root());
    assert!(!session.root().exists());
    // Idempotent: a second clear only logs a warning.
    workspace::clear(session.root());
}

#[test]
fn test_missing_upload_yields_placeholder_not_error() {
    let config = Config::default();

    let outcome = transcribe_file(None, &config);
    assert_eq!(outcome.text, NO_FILE_TEXT);
    assert!(outcome.workspace.is_none());

    let outcome = transcribe_file(Some(std::path::Path::new("/nonexistent/u.mp3")), &config);
    assert_eq!(outcome.text, NO_FILE_TEXT);
}

#[test]
fn test_every_media_kind_normalizes_toward_canonical_mp3() {
    let config = Config::default();
    let cases = [
        ("clip.mp4", MediaKind::Video),
        ("note.opus", MediaKind::LegacyVoiceAudio),
        ("talk.wav", MediaKind::GenericAudio),
        ("talk.mp3", MediaKind::GenericAudio),
    ];

    for (name, expected_kind) in cases {
        let path = PathBuf::from("/work/upload").join(name);
        assert_eq!(classify(&path, &config.media), expected_kind, "{}", name);

        let plan = conversion_plan(&path, &config.media);
        assert!(!plan.is_empty(), "{} must have a conversion chain", name);

        // Every chain ends writing the canonical MP3 sibling.
        let last_output = match plan.last().unwrap() {
            ConversionStep::ExtractVideoAudio { output, .. }
            | ConversionStep::DecodeLegacyVoice { output, .. }
            | ConversionStep::ReencodeAudio { output, .. } => output.clone(),
        };
        assert_eq!(last_output, canonical_target(&path));
        assert_eq!(last_output.extension().unwrap(), "mp3");
        assert_eq!(last_output.parent(), path.parent());
    }

    assert_eq!(
        classify(std::path::Path::new("/work/upload/readme.txt"), &config.media),
        MediaKind::Unrecognized
    );
}

#[test]
fn test_ask_over_saved_transcript_without_credential() {
    std::env::remove_var("MEDIASCRIBE_GEMINI_KEY");

    let tmp = TempDir::new().unwrap();
    let transcript_path = tmp.path().join("board_meeting_transcript.txt");
    std::fs::write(&transcript_path, "hello there\ngeneral kenobi").unwrap();

    let transcript = std::fs::read_to_string(&transcript_path).unwrap();
    let config = Config::default();

    let result = answer(
        "who spoke first?",
        &transcript,
        "Gemini",
        None,
        &config.providers,
    );
    assert_eq!(result, KEY_NOT_FOUND_TEXT);
}
