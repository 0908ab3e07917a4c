use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::WorkspaceConfig;

/// Handle to one session's transient directory tree. Staging returns the
/// handle to the caller, which threads it explicitly into cleanup; there is no
/// process-wide workspace slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn from_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy an upload into a fresh session directory. The staged file lands at
    /// `<session>/upload/<name>`, so the session root is the grandparent of
    /// the staged file and owns every derived artifact.
    pub fn stage(input: &Path, config: &WorkspaceConfig) -> Result<(Workspace, PathBuf)> {
        let file_name = input
            .file_name()
            .with_context(|| format!("upload path has no filename: {}", input.display()))?;

        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let mut root = config.sessions_dir.join(&stamp);
        let mut counter = 1;
        while root.exists() {
            root = config.sessions_dir.join(format!("{}-{}", stamp, counter));
            counter += 1;
        }

        let upload_dir = root.join("upload");
        std::fs::create_dir_all(&upload_dir)
            .with_context(|| format!("Failed to create {}", upload_dir.display()))?;

        let staged = upload_dir.join(file_name);
        std::fs::copy(input, &staged)
            .with_context(|| format!("Failed to stage {}", input.display()))?;

        tracing::info!(
            "Staged {} into session {}",
            input.display(),
            root.display()
        );
        Ok((Workspace { root }, staged))
    }
}

/// Recursively delete a workspace root. Idempotent: a missing root logs a
/// warning, and deletion failures are logged rather than escalated.
pub fn clear(root: &Path) {
    if root.exists() {
        tracing::info!("Clearing folder: {}...", root.display());
        match std::fs::remove_dir_all(root) {
            Ok(()) => tracing::info!("Deleted folder: {}", root.display()),
            Err(e) => tracing::error!("Error clearing folder {}: {}", root.display(), e),
        }
    } else {
        tracing::warn!("Folder does not exist: {}", root.display());
    }
}

/// Best-effort cleanup, then tear the process down with the conventional
/// interrupted-exit status.
pub fn clear_and_terminate(root: &Path) -> ! {
    clear(root);
    tracing::info!("Terminating the session...");
    std::process::exit(130);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_config(tmp: &TempDir) -> WorkspaceConfig {
        WorkspaceConfig {
            sessions_dir: tmp.path().join("sessions"),
        }
    }

    #[test]
    fn test_stage_creates_grandparent_layout() {
        let tmp = TempDir::new().unwrap();
        let upload = tmp.path().join("my recording.wav");
        std::fs::write(&upload, b"fake audio").unwrap();

        let config = make_config(&tmp);
        let (workspace, staged) = Workspace::stage(&upload, &config).unwrap();

        assert!(staged.exists());
        assert_eq!(staged.file_name().unwrap(), "my recording.wav");
        // Session root is the grandparent of the staged file.
        assert_eq!(
            staged.parent().and_then(|p| p.parent()),
            Some(workspace.root())
        );
        assert_eq!(std::fs::read(&staged).unwrap(), b"fake audio");
    }

    #[test]
    fn test_stage_twice_yields_distinct_sessions() {
        let tmp = TempDir::new().unwrap();
        let upload = tmp.path().join("clip.mp4");
        std::fs::write(&upload, b"video").unwrap();

        let config = make_config(&tmp);
        let (ws1, _) = Workspace::stage(&upload, &config).unwrap();
        let (ws2, _) = Workspace::stage(&upload, &config).unwrap();
        assert_ne!(ws1.root(), ws2.root());
        assert!(ws1.root().exists());
        assert!(ws2.root().exists());
    }

    #[test]
    fn test_stage_missing_filename_errors() {
        let tmp = TempDir::new().unwrap();
        let config = make_config(&tmp);
        let result = Workspace::stage(Path::new("/"), &config);
        assert!(result.is_err());
    }

    #[test]
    fn test_clear_deletes_workspace() {
        let tmp = TempDir::new().unwrap();
        let upload = tmp.path().join("talk.mp3");
        std::fs::write(&upload, b"audio").unwrap();

        let config = make_config(&tmp);
        let (workspace, staged) = Workspace::stage(&upload, &config).unwrap();
        assert!(staged.exists());

        clear(workspace.root());
        assert!(!workspace.root().exists());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("gone");
        std::fs::create_dir_all(&root).unwrap();

        clear(&root);
        assert!(!root.exists());
        // Second call logs a warning and must not panic or error.
        clear(&root);
    }
}
