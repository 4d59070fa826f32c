//! # clipforge-av
//!
//! External tool plumbing for clipforge.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and verify ffmpeg and
//!   ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   and cancellation for running external processes.
//! - **Duration probing** ([`DurationProbe`], [`FfprobeDurationProbe`]).
//! - **Encoding** ([`MediaEncoder`], [`FfmpegEncoder`]) plus the argument
//!   builders for the trim-scale and speed stages.
//! - **Staging files** ([`StagingFile`]) -- intermediate files removed on drop.

pub mod command;
pub mod encoder;
pub mod filters;
pub mod probe;
pub mod staging;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use encoder::{
    speed_encode_args, trim_scale_args, EncodeRequest, EncodeStage, FfmpegEncoder, MediaEncoder,
};
pub use probe::{DurationProbe, FfprobeDurationProbe};
pub use staging::{staging_path, StagingFile};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
