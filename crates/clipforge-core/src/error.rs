//! Unified error type for clipforge.
//!
//! Every crate funnels its failures into [`Error`]. Per-clip failures are
//! carried inside task outcomes and never abort sibling work. A missing
//! input root or unavailable tool is detected before any work starts.

use std::path::PathBuf;

/// Unified error type covering all failure modes in clipforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A trim strategy identifier did not name a known strategy.
    #[error("Unsupported trim strategy: {0}")]
    UnsupportedStrategy(String),

    /// The computed clip window is empty or lies outside the source.
    #[error("Invalid clip window [{start:.2}, {end:.2}] for duration {total:.2}s")]
    InvalidWindow {
        /// Window start in seconds.
        start: f64,
        /// Window end in seconds.
        end: f64,
        /// Total source duration in seconds.
        total: f64,
    },

    /// An encoder stage exited unsuccessfully or produced no output.
    #[error("Encode failed [{stage}]: {message}")]
    EncodeFailed {
        /// The pipeline stage that failed (e.g. "trim-scale").
        stage: String,
        /// Human-readable error description.
        message: String,
    },

    /// Duration lookup failed or produced an unparsable report.
    #[error("Probe failed for {}: {message}", path.display())]
    ProbeFailed {
        /// File that was probed.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// Configuration or a variant description failed validation.
    #[error("Config validation failed: {0}")]
    ConfigValidationFailed(String),

    /// The input root directory does not exist.
    #[error("Input directory does not exist: {}", .0.display())]
    InputRootMissing(PathBuf),

    /// A required external tool is not installed or not on `PATH`.
    #[error("Tool unavailable: {0}; is it installed and in PATH?")]
    ToolUnavailable(String),

    /// An external tool could not be spawned, failed, or timed out.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Work was abandoned because its group was cancelled.
    #[error("Cancelled")]
    Cancelled,

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-friendly name of the variant, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedStrategy(_) => "unsupported_strategy",
            Error::InvalidWindow { .. } => "invalid_window",
            Error::EncodeFailed { .. } => "encode_failed",
            Error::ProbeFailed { .. } => "probe_failed",
            Error::ConfigValidationFailed(_) => "config_validation_failed",
            Error::InputRootMissing(_) => "input_root_missing",
            Error::ToolUnavailable(_) => "tool_unavailable",
            Error::Tool { .. } => "tool",
            Error::Io { .. } => "io",
            Error::Cancelled => "cancelled",
            Error::Internal(_) => "internal",
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::EncodeFailed`].
    pub fn encode(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Error::EncodeFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::ProbeFailed`].
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::ProbeFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::ConfigValidationFailed`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::ConfigValidationFailed(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
