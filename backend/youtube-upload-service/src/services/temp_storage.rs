//! Temporary files for uploads in flight.

use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TempStorage {
    dir: PathBuf,
}

impl TempStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Unique path for an incoming file; the client filename is reduced to a
    /// safe basename first.
    pub fn allocate(&self, original_filename: &str) -> PathBuf {
        let name = format!(
            "temp_{}_{}_{}",
            Utc::now().timestamp(),
            Uuid::new_v4().simple(),
            sanitize_filename(original_filename)
        );
        self.dir.join(name)
    }
}

/// Owns a temporary upload on disk. The file is deleted when the guard is
/// dropped, which also covers requests abandoned mid-stream.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete now instead of waiting for drop.
    pub async fn remove(self) {
        remove_best_effort(&self.path).await;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // Blocking unlink; drop cannot await
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "temporary file dropped"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to remove temporary file")
            }
        }
    }
}

/// Keep only the basename and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Delete `path`, ignoring files that are already gone. Other failures are
/// logged and swallowed.
pub async fn remove_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "temporary file removed"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove temporary file")
        }
    }
}
