//! Application configuration types.
//!
//! The top-level [`Config`] is deserialized from JSON using the camelCase
//! keys of the original clipper configuration files. Every field defaults
//! sensibly, so an empty `{}` file yields the stock four-variant setup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quality::QualityPreset;
use crate::variant::{TrimStrategy, VariantSpec};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// AAC bitrate passed verbatim to the encoder (e.g. `112k`).
    pub audio_bitrate: String,
    /// Videos processed concurrently within one batch.
    pub max_concurrent_videos: usize,
    /// Variants rendered concurrently for one video.
    #[serde(alias = "maxConcurrentVariants")]
    pub max_concurrent_configs: usize,
    /// Videos held in flight per batch.
    pub batch_size: usize,
    pub quality_preset: QualityPreset,
    /// Hard bound on a single encoder invocation.
    pub encode_timeout_secs: u64,
    /// Hard bound on a single duration probe.
    pub probe_timeout_secs: u64,
    /// Re-probe finished clips and warn on duration drift.
    pub verify_output_duration: bool,
    pub tools: ToolsConfig,
    pub video_configs: Vec<VariantSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            audio_bitrate: "112k".into(),
            max_concurrent_videos: 10,
            max_concurrent_configs: 50,
            batch_size: 20,
            quality_preset: QualityPreset::Balanced,
            encode_timeout_secs: 1800,
            probe_timeout_secs: 60,
            verify_output_duration: true,
            tools: ToolsConfig::default(),
            video_configs: default_variants(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    ///
    /// A file that exists but fails to parse is an error: silently running a
    /// batch with the wrong variants would be worse than stopping.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("config serialization failed: {e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check every value the orchestrator relies on.
    ///
    /// Output folder/suffix pairs must be pairwise distinct: two variants
    /// mapping to the same output would also share a temp path.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_videos == 0 {
            return Err(Error::validation("maxConcurrentVideos must be at least 1"));
        }
        if self.max_concurrent_configs == 0 {
            return Err(Error::validation("maxConcurrentConfigs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(Error::validation("batchSize must be at least 1"));
        }
        if self.audio_bitrate.trim().is_empty() {
            return Err(Error::validation("audioBitrate must not be empty"));
        }
        if self.encode_timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(Error::validation("tool timeouts must be positive"));
        }
        if self.video_configs.is_empty() {
            return Err(Error::validation("videoConfigs must not be empty"));
        }

        let mut seen = HashSet::new();
        for (i, variant) in self.video_configs.iter().enumerate() {
            variant.validate().map_err(|e| match e {
                Error::ConfigValidationFailed(msg) => {
                    Error::validation(format!("videoConfigs[{i}]: {msg}"))
                }
                other => other,
            })?;

            let key = (variant.output_folder.as_str(), variant.output_suffix.as_str());
            if !seen.insert(key) {
                return Err(Error::validation(format!(
                    "videoConfigs[{i}]: output folder '{}' with suffix '{}' is used twice",
                    variant.output_folder, variant.output_suffix
                )));
            }
        }

        Ok(())
    }

    pub fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Paths to external CLI tools; `None` means search `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// The stock variant set: square and 4:3-ish clips from the start and end.
pub fn default_variants() -> Vec<VariantSpec> {
    let shapes = [(1008, 1008, "square"), (1008, 762, "rect")];
    let strategies = [(TrimStrategy::Start, "start"), (TrimStrategy::End, "end")];

    strategies
        .iter()
        .flat_map(|&(strategy, pos)| {
            shapes.iter().map(move |&(w, h, shape)| VariantSpec {
                width: w,
                height: h,
                clip_duration: 20.0,
                speed: 2.0,
                video_bitrate: 4000,
                clip_strategy: strategy,
                output_suffix: format!("_{shape}_{pos}"),
                output_folder: format!("{w}x{h}_{pos}"),
            })
        })
        .collect()
}
