//! Two-stage transcode of one (source, variant) pair.
//!
//! Stage one trims the clip window and frames it into a staging file beside
//! the final output; stage two retimes that file and writes the output. The
//! staging file is removed on every exit path.

use std::path::Path;
use std::sync::Arc;

use clipforge_av::{speed_encode_args, trim_scale_args, DurationProbe, MediaEncoder, StagingFile};
use clipforge_core::quality;
use clipforge_core::{
    trim, ClipWindow, Config, Error, QualityPreset, Result, SourceVideo, VariantSpec,
};
use tokio_util::sync::CancellationToken;

use crate::layout::OutputLayout;
use crate::outcome::TaskOutcome;

/// Allowed drift between expected and measured output duration.
pub const DURATION_TOLERANCE_SECS: f64 = 0.5;

/// Encoding knobs shared by every variant.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub audio_bitrate: String,
    pub preset: QualityPreset,
    /// Re-probe each output and warn on duration drift.
    pub verify_output_duration: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            audio_bitrate: config.audio_bitrate.clone(),
            preset: config.quality_preset,
            verify_output_duration: config.verify_output_duration,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Renders variants through the external encoder.
#[derive(Clone)]
pub struct TranscodePipeline {
    encoder: Arc<dyn MediaEncoder>,
    probe: Arc<dyn DurationProbe>,
    layout: OutputLayout,
    settings: PipelineSettings,
}

impl TranscodePipeline {
    pub fn new(
        encoder: Arc<dyn MediaEncoder>,
        probe: Arc<dyn DurationProbe>,
        layout: OutputLayout,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            encoder,
            probe,
            layout,
            settings,
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub(crate) fn probe(&self) -> &dyn DurationProbe {
        self.probe.as_ref()
    }

    /// Render `spec` from a probed `source`.
    ///
    /// Never returns an error: failures are carried in the outcome.
    pub async fn run(
        &self,
        source: &SourceVideo,
        spec: &VariantSpec,
        cancel: &CancellationToken,
    ) -> TaskOutcome {
        let label = spec.label();
        let output = self.layout.output_path(source.path(), spec);

        let window = match self.window_for(source, spec) {
            Ok(window) => window,
            Err(e) => {
                tracing::warn!("{} [{label}]: {e}", source.path().display());
                return TaskOutcome::failed(source.path(), label, output, None, &e);
            }
        };

        tracing::debug!(
            "{} [{label}]: window {:.2}-{:.2}s -> {}",
            source.path().display(),
            window.start,
            window.end,
            output.display()
        );

        match self.encode(source, spec, window, &output, cancel).await {
            Ok(drift) => {
                tracing::info!("{} [{label}]: done", source.path().display());
                TaskOutcome::succeeded(source.path(), label, output, window)
                    .with_duration_drift(drift)
            }
            Err(e) => {
                if matches!(e, Error::Cancelled) {
                    tracing::debug!("{} [{label}]: cancelled", source.path().display());
                } else {
                    tracing::error!("{} [{label}]: {e}", source.path().display());
                }
                TaskOutcome::failed(source.path(), label, output, Some(window), &e)
            }
        }
    }

    fn window_for(&self, source: &SourceVideo, spec: &VariantSpec) -> Result<ClipWindow> {
        let total = source
            .duration()
            .ok_or_else(|| Error::probe(source.path(), "duration has not been probed"))?;
        trim::compute(total, spec.clip_strategy, spec.clip_duration)
    }

    async fn encode(
        &self,
        source: &SourceVideo,
        spec: &VariantSpec,
        window: ClipWindow,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<f64>> {
        if let Some(dir) = output.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let staging = StagingFile::for_output(output);

        let intermediate = quality::resolve_intermediate(spec.video_bitrate);
        let trim = trim_scale_args(
            source.path(),
            staging.path(),
            window,
            spec,
            &intermediate,
            &self.settings.audio_bitrate,
        );
        self.encoder.encode(&trim, cancel).await?;

        let final_bundle = quality::resolve(self.settings.preset, spec.video_bitrate);
        let speed = speed_encode_args(
            staging.path(),
            output,
            spec,
            &final_bundle,
            &self.settings.audio_bitrate,
            source.format(),
        );
        self.encoder.encode(&speed, cancel).await?;
        drop(staging);

        if !self.settings.verify_output_duration {
            return Ok(None);
        }
        let expected = spec.expected_output_seconds(window.duration());
        Ok(self.verify_duration(output, expected, cancel).await)
    }

    /// Re-probe `output` and return its drift when past the tolerance.
    ///
    /// Drift is only logged; the clip still counts as rendered.
    async fn verify_duration(
        &self,
        output: &Path,
        expected: f64,
        cancel: &CancellationToken,
    ) -> Option<f64> {
        match self.probe.duration(output, cancel).await {
            Ok(actual) if (actual - expected).abs() > DURATION_TOLERANCE_SECS => {
                tracing::warn!(
                    "{}: duration {actual:.2}s differs from expected {expected:.2}s",
                    output.display()
                );
                Some(actual - expected)
            }
            Ok(_) | Err(Error::Cancelled) => None,
            Err(e) => {
                tracing::warn!("Could not verify {}: {e}", output.display());
                None
            }
        }
    }
}

impl std::fmt::Debug for TranscodePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodePipeline")
            .field("layout", &self.layout)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
