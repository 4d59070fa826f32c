//! Intermediate file lifecycle for the two-stage encode.
//!
//! The trim stage writes into a staging file next to the final output; the
//! speed stage reads it back. A [`StagingFile`] removes that file when it is
//! dropped, so every exit path (success, failure, cancellation, panic) leaves
//! no intermediate behind.

use std::path::{Path, PathBuf};

/// Staging path for `output`: `<dir>/<stem>_temp<ext>`.
pub fn staging_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let file_name = match output.extension() {
        Some(ext) => format!("{stem}_temp.{}", ext.to_string_lossy()),
        None => format!("{stem}_temp"),
    };
    output.with_file_name(file_name)
}

/// Drop guard owning an intermediate file path.
///
/// # Example
///
/// ```no_run
/// use clipforge_av::StagingFile;
///
/// let staging = StagingFile::for_output(std::path::Path::new("/out/clip_square.mp4"));
/// assert!(staging.path().ends_with("clip_square_temp.mp4"));
/// // ... write the intermediate, consume it ...
/// drop(staging); // file removed
/// ```
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    /// Guard the staging path derived from `output`.
    ///
    /// A leftover file from an interrupted earlier run is removed first.
    pub fn for_output(output: &Path) -> Self {
        let path = staging_path(output);
        if path.exists() {
            tracing::debug!("Removing stale staging file {}", path.display());
            let _ = std::fs::remove_file(&path);
        }
        Self { path }
    }

    /// The intermediate file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!("Removed staging file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove staging file {}: {e}",
                self.path.display()
            ),
        }
    }
}
