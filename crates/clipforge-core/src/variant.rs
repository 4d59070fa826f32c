//! Declarative description of one clip variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which portion of the source a variant is cut from.
///
/// Parsed once when configuration is loaded; unknown tags are rejected
/// there instead of surfacing mid-batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TrimStrategy {
    /// Cut right after the head guard band.
    Start,
    /// Cut right before the tail guard band (`end_segments` / `last_segments`).
    End,
    /// Cut from the centre of the usable range.
    Middle,
}

impl TrimStrategy {
    /// Canonical configuration tag.
    pub fn as_str(self) -> &'static str {
        match self {
            TrimStrategy::Start => "start_segments",
            TrimStrategy::End => "end_segments",
            TrimStrategy::Middle => "middle_segments",
        }
    }
}

impl FromStr for TrimStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "start_segments" => Ok(TrimStrategy::Start),
            "end_segments" | "last_segments" => Ok(TrimStrategy::End),
            "middle_segments" => Ok(TrimStrategy::Middle),
            other => Err(Error::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl TryFrom<String> for TrimStrategy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TrimStrategy> for String {
    fn from(value: TrimStrategy) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TrimStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured output shape, applied to every source video.
///
/// Loaded once and shared read-only by every task that renders it.
/// Written with camelCase keys; PascalCase keys (`"Width"`,
/// `"ClipStrategy"`, ...) from older config files are accepted on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSpec {
    #[serde(alias = "Width")]
    pub width: u32,
    #[serde(alias = "Height")]
    pub height: u32,
    /// Length of the trim window in seconds, before the speed change.
    #[serde(alias = "ClipDuration")]
    pub clip_duration: f64,
    /// Playback speed multiplier applied in the final stage.
    #[serde(alias = "Speed")]
    pub speed: f64,
    /// Target video bitrate in kbps.
    #[serde(alias = "VideoBitrate")]
    pub video_bitrate: u32,
    #[serde(alias = "ClipStrategy")]
    pub clip_strategy: TrimStrategy,
    /// Appended to the source file stem.
    #[serde(alias = "OutputSuffix")]
    pub output_suffix: String,
    /// Subfolder of the output root collecting this variant.
    #[serde(alias = "OutputFolder")]
    pub output_folder: String,
}

impl VariantSpec {
    /// Reject non-positive dimensions, speed, clip length, or bitrate.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::validation(format!(
                "{}: invalid resolution {}x{}",
                self.label(),
                self.width,
                self.height
            )));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(Error::validation(format!(
                "{}: invalid speed {}",
                self.label(),
                self.speed
            )));
        }
        if !self.clip_duration.is_finite() || self.clip_duration <= 0.0 {
            return Err(Error::validation(format!(
                "{}: invalid clip duration {}",
                self.label(),
                self.clip_duration
            )));
        }
        if self.video_bitrate == 0 {
            return Err(Error::validation(format!(
                "{}: video bitrate must be positive",
                self.label()
            )));
        }
        Ok(())
    }

    /// Square targets are cropped to fill; other shapes are padded.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Output duration after the speed change for a window of `window_secs`.
    pub fn expected_output_seconds(&self, window_secs: f64) -> f64 {
        window_secs / self.speed
    }

    /// Name used in logs and reports.
    pub fn label(&self) -> &str {
        if self.output_folder.is_empty() {
            &self.output_suffix
        } else {
            &self.output_folder
        }
    }
}
