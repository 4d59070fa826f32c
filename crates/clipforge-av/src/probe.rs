//! Duration probing via ffprobe.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use clipforge_core::{Error, Result};
use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::{ToolRegistry, FFPROBE};

/// Looks up the duration of a media file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of `path` in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProbeFailed`] if the tool fails or its report
    /// cannot be parsed, or [`Error::Cancelled`] if `cancel` fires.
    async fn duration(&self, path: &Path, cancel: &CancellationToken) -> Result<f64>;
}

/// A [`DurationProbe`] backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeDurationProbe {
    pub fn new(ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffprobe_path,
            timeout,
        }
    }

    /// Create a probe using the registry's ffprobe.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> Result<Self> {
        let ffprobe = tools.require(FFPROBE)?;
        Ok(Self::new(ffprobe.path.clone(), timeout))
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration(&self, path: &Path, cancel: &CancellationToken) -> Result<f64> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(self.timeout);
        cmd.args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute_cancellable(cancel).await.map_err(|e| match e {
            Error::Cancelled => Error::Cancelled,
            other => Error::probe(path, other.to_string()),
        })?;

        parse_duration_report(path, &output.stdout)
    }
}

/// Parse the `format=duration` report printed by ffprobe.
pub fn parse_duration_report(path: &Path, report: &str) -> Result<f64> {
    let text = report.trim();
    let first = text.lines().next().unwrap_or_default().trim();

    let seconds: f64 = first
        .parse()
        .map_err(|_| Error::probe(path, format!("unparsable duration report: {text:?}")))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(Error::probe(path, format!("non-positive duration: {seconds}")));
    }

    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        let p = Path::new("a.mp4");
        assert_eq!(parse_duration_report(p, "42.360000\n").unwrap(), 42.36);
        assert_eq!(parse_duration_report(p, "  7\n").unwrap(), 7.0);
    }

    #[test]
    fn rejects_missing_duration() {
        let p = Path::new("a.mp4");
        for report in ["", "N/A", "duration=12"] {
            let err = parse_duration_report(p, report).unwrap_err();
            assert!(matches!(err, Error::ProbeFailed { .. }), "{report:?}");
        }
    }

    #[test]
    fn rejects_non_positive_duration() {
        assert!(parse_duration_report(Path::new("a.mp4"), "0.000000").is_err());
        assert!(parse_duration_report(Path::new("a.mp4"), "-3").is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_a_probe_failure() {
        let probe = FfprobeDurationProbe::new(
            PathBuf::from("nonexistent_ffprobe_xyz"),
            Duration::from_secs(5),
        );
        let err = probe
            .duration(Path::new("a.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProbeFailed { .. }), "{err}");
    }
}
