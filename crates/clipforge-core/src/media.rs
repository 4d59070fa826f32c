//! Source video identity and container format detection.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Container formats accepted as clip sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Avi,
    Mov,
    Mkv,
    Flv,
    Wmv,
    M4v,
    #[serde(rename = "3gp")]
    ThreeGp,
    Webm,
}

impl VideoFormat {
    /// Every supported format, in display order.
    pub const ALL: [VideoFormat; 9] = [
        VideoFormat::Mp4,
        VideoFormat::Avi,
        VideoFormat::Mov,
        VideoFormat::Mkv,
        VideoFormat::Flv,
        VideoFormat::Wmv,
        VideoFormat::M4v,
        VideoFormat::ThreeGp,
        VideoFormat::Webm,
    ];

    /// Parse a bare extension (no dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Detect the format of a path from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical lowercase extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Avi => "avi",
            VideoFormat::Mov => "mov",
            VideoFormat::Mkv => "mkv",
            VideoFormat::Flv => "flv",
            VideoFormat::Wmv => "wmv",
            VideoFormat::M4v => "m4v",
            VideoFormat::ThreeGp => "3gp",
            VideoFormat::Webm => "webm",
        }
    }

    /// Whether the container supports `-movflags +faststart`.
    pub fn is_mp4_family(self) -> bool {
        matches!(
            self,
            VideoFormat::Mp4 | VideoFormat::Mov | VideoFormat::M4v | VideoFormat::ThreeGp
        )
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Check if a path has a supported video extension.
pub fn is_supported_video(path: &Path) -> bool {
    VideoFormat::from_path(path).is_some()
}

/// A source video queued for clipping.
///
/// The duration is unknown until the source has been probed; a probed
/// video is produced with [`SourceVideo::with_duration`] and never changes
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceVideo {
    path: PathBuf,
    format: VideoFormat,
    duration: Option<f64>,
}

impl SourceVideo {
    /// Create a source video, validating its container format.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::validation("video path must not be empty"));
        }

        let format = VideoFormat::from_path(&path).ok_or_else(|| {
            Error::validation(format!(
                "unsupported video format: {}",
                path.extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_else(|| "<none>".into())
            ))
        })?;

        Ok(Self {
            path,
            format,
            duration: None,
        })
    }

    /// Return a copy carrying the probed duration.
    pub fn with_duration(self, seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::probe(
                &self.path,
                format!("duration must be positive, got {seconds}"),
            ));
        }
        Ok(Self {
            duration: Some(seconds),
            ..self
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    /// Probed duration in seconds, if known.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }
}
