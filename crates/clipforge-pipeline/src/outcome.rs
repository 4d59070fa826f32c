//! Per-variant outcomes and batch statistics.

use std::path::{Path, PathBuf};

use clipforge_core::{ClipWindow, Error};
use serde::Serialize;

/// Result of rendering one variant of one source video.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutcome {
    pub video: PathBuf,
    /// Variant label (output folder, or suffix if no folder is set).
    pub variant: String,
    pub success: bool,
    pub output_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<ClipWindow>,
    /// Error kind (see [`Error::kind`]) when the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds the rendered clip is off from its expected length, set only
    /// when the output was re-probed and missed the tolerance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_drift: Option<f64>,
}

impl TaskOutcome {
    pub fn succeeded(
        video: &Path,
        variant: &str,
        output_path: PathBuf,
        window: ClipWindow,
    ) -> Self {
        Self {
            video: video.to_path_buf(),
            variant: variant.to_string(),
            success: true,
            output_path,
            window: Some(window),
            error_kind: None,
            error: None,
            duration_drift: None,
        }
    }

    pub fn with_duration_drift(mut self, drift: Option<f64>) -> Self {
        self.duration_drift = drift;
        self
    }

    pub fn failed(
        video: &Path,
        variant: &str,
        output_path: PathBuf,
        window: Option<ClipWindow>,
        error: &Error,
    ) -> Self {
        Self {
            video: video.to_path_buf(),
            variant: variant.to_string(),
            success: false,
            output_path,
            window,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            duration_drift: None,
        }
    }
}

/// Outcome of every variant of one source video.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOutcome {
    pub video: PathBuf,
    pub variants: Vec<TaskOutcome>,
}

impl VideoOutcome {
    /// A video succeeds only when every variant did.
    pub fn success(&self) -> bool {
        !self.variants.is_empty() && self.variants.iter().all(|v| v.success)
    }

    pub fn failed_variants(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.variants.iter().filter(|v| !v.success)
    }
}

/// Video counters for one batch, or the fold of several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStatistics {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchStatistics {
    pub fn record(&mut self, video: &VideoOutcome) {
        self.attempted += 1;
        if video.success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn merge(&mut self, other: &BatchStatistics) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// One processed batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// 1-based batch number.
    pub index: usize,
    pub stats: BatchStatistics,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batches: Vec<BatchSummary>,
    pub totals: BatchStatistics,
    /// Videos with at least one failed variant, with their outcomes.
    pub failed_videos: Vec<VideoOutcome>,
    /// Total variants rendered successfully.
    pub variants_succeeded: usize,
    pub variants_failed: usize,
    /// Set when the run was interrupted before every batch finished.
    pub interrupted: bool,
}

impl BatchReport {
    /// Fold one finished batch into the report.
    pub fn push_batch(&mut self, videos: Vec<VideoOutcome>) -> BatchStatistics {
        let mut stats = BatchStatistics::default();
        for video in videos {
            stats.record(&video);
            let failed = video.failed_variants().count();
            self.variants_failed += failed;
            self.variants_succeeded += video.variants.len() - failed;
            if !video.success() {
                self.failed_videos.push(video);
            }
        }

        self.totals.merge(&stats);
        self.batches.push(BatchSummary {
            index: self.batches.len() + 1,
            stats,
        });
        stats
    }

    pub fn failed_variants(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.failed_videos.iter().flat_map(VideoOutcome::failed_variants)
    }

    pub fn all_succeeded(&self) -> bool {
        self.totals.failed == 0 && !self.interrupted
    }
}
