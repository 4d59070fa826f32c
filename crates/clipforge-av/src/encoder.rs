//! ffmpeg invocations for the two encode stages.
//!
//! Stage one (trim-scale) cuts the clip window out of the source and frames
//! it to the target resolution. Stage two (speed) retimes the intermediate
//! and re-encodes it with the final quality bundle.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use clipforge_core::{ClipWindow, Error, QualityParameterBundle, Result, VariantSpec, VideoFormat};
use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::filters;
use crate::tools::{ToolRegistry, FFMPEG};

/// Audio sample rate for every output.
const AUDIO_SAMPLE_RATE: &str = "48000";

/// One of the two encoder passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStage {
    TrimScale,
    Speed,
}

impl EncodeStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrimScale => "trim-scale",
            Self::Speed => "speed",
        }
    }
}

impl fmt::Display for EncodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-built encoder invocation.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub stage: EncodeStage,
    /// Encoder arguments, excluding the program itself.
    pub args: Vec<String>,
    /// File the invocation is expected to produce.
    pub output: PathBuf,
}

/// Runs encoder invocations.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Run `request` to completion.
    ///
    /// Succeeds only if the encoder exits cleanly and `request.output`
    /// exists with a non-zero size.
    ///
    /// # Errors
    ///
    /// [`Error::EncodeFailed`] tagged with the stage, or [`Error::Cancelled`]
    /// if `cancel` fired (the encoder process is killed).
    async fn encode(&self, request: &EncodeRequest, cancel: &CancellationToken) -> Result<()>;
}

/// A [`MediaEncoder`] backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            timeout,
        }
    }

    /// Create an encoder using the registry's ffmpeg.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> Result<Self> {
        let ffmpeg = tools.require(FFMPEG)?;
        Ok(Self::new(ffmpeg.path.clone(), timeout))
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn encode(&self, request: &EncodeRequest, cancel: &CancellationToken) -> Result<()> {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.timeout(self.timeout);
        cmd.args(request.args.iter().cloned());

        cmd.execute_cancellable(cancel).await.map_err(|e| match e {
            Error::Cancelled => Error::Cancelled,
            other => Error::encode(request.stage.as_str(), other.to_string()),
        })?;

        verify_output(request)
    }
}

/// Check that the stage left a non-empty file behind.
pub fn verify_output(request: &EncodeRequest) -> Result<()> {
    match std::fs::metadata(&request.output) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        Ok(_) => Err(Error::encode(
            request.stage.as_str(),
            format!("output is empty: {}", request.output.display()),
        )),
        Err(e) => Err(Error::encode(
            request.stage.as_str(),
            format!("output missing: {}: {e}", request.output.display()),
        )),
    }
}

/// Stage one: cut `window` out of `input`, frame it, write `staging`.
pub fn trim_scale_args(
    input: &Path,
    staging: &Path,
    window: ClipWindow,
    spec: &VariantSpec,
    bundle: &QualityParameterBundle,
    audio_bitrate: &str,
) -> EncodeRequest {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-ss".into(),
        format!("{:.3}", window.start),
        "-t".into(),
        format!("{:.3}", window.duration()),
        "-vf".into(),
        filters::frame_filter(spec.width, spec.height),
        "-c:v".into(),
        "libx264".into(),
    ];
    args.extend(bundle.to_args());
    push_audio_args(&mut args, audio_bitrate);
    args.push(staging.to_string_lossy().into_owned());

    EncodeRequest {
        stage: EncodeStage::TrimScale,
        args,
        output: staging.to_path_buf(),
    }
}

/// Stage two: retime `staging` by the variant's speed and write `output`.
pub fn speed_encode_args(
    staging: &Path,
    output: &Path,
    spec: &VariantSpec,
    bundle: &QualityParameterBundle,
    audio_bitrate: &str,
    format: VideoFormat,
) -> EncodeRequest {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        staging.to_string_lossy().into_owned(),
        "-filter:v".into(),
        filters::video_speed_filter(spec.speed),
        "-filter:a".into(),
        filters::audio_speed_filter(spec.speed),
        "-c:v".into(),
        "libx264".into(),
    ];
    args.extend(bundle.to_args());
    push_audio_args(&mut args, audio_bitrate);
    if format.is_mp4_family() {
        args.extend(["-movflags".into(), "+faststart".into()]);
    }
    args.push(output.to_string_lossy().into_owned());

    EncodeRequest {
        stage: EncodeStage::Speed,
        args,
        output: output.to_path_buf(),
    }
}

fn push_audio_args(args: &mut Vec<String>, audio_bitrate: &str) {
    args.extend([
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        audio_bitrate.into(),
        "-ar".into(),
        AUDIO_SAMPLE_RATE.into(),
    ]);
}
