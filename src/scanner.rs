//! Source discovery.
//!
//! Walks the input root and yields supported video files lazily, so the
//! batch scheduler only ever holds one batch of paths at a time.

use std::path::{Path, PathBuf};

use clipforge_core::media::is_supported_video;
use clipforge_core::{Error, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Finds source videos under an input root.
#[derive(Debug, Clone)]
pub struct VideoScanner {
    root: PathBuf,
    excluded: Option<PathBuf>,
}

impl VideoScanner {
    /// Scanner over `root`.
    ///
    /// # Errors
    ///
    /// [`Error::InputRootMissing`] if `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::InputRootMissing(root));
        }
        Ok(Self {
            root,
            excluded: None,
        })
    }

    /// Skip the subtree at `dir` while walking.
    ///
    /// Used for the output root when it sits under the input root, so
    /// finished clips and staging files are never picked up as sources.
    /// `dir` does not need to exist yet.
    pub fn excluding(mut self, dir: impl AsRef<Path>) -> Self {
        self.excluded = Some(resolve(dir.as_ref()));
        self
    }

    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        let Some(excluded) = &self.excluded else {
            return false;
        };
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        if resolve(entry.path()) == *excluded {
            debug!("Skipping output directory {}", entry.path().display());
            return true;
        }
        false
    }

    /// Supported video files under the root, in file-name order.
    ///
    /// Unreadable entries are logged and skipped.
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let path = entry.into_path();
                if is_supported_video(&path) {
                    Some(path)
                } else {
                    debug!("Skipping non-video file {}", path.display());
                    None
                }
            })
    }
}

/// Absolute form of `path` with symlinks resolved as far as it exists.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let mut missing = Vec::new();
    let mut current = path;
    while let Some(name) = current.file_name() {
        missing.push(name.to_os_string());
        let parent = match current.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if let Ok(base) = parent.canonicalize() {
            return missing.iter().rev().fold(base, |acc, name| acc.join(name));
        }
        current = parent;
    }
    path.to_path_buf()
}
