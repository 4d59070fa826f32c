//! Shared fakes for pipeline integration tests.
//!
//! [`FakeEncoder`] and [`FakeProbe`] stand in for ffmpeg and ffprobe so the
//! schedulers can be exercised without any media tools installed.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clipforge_av::{DurationProbe, EncodeRequest, EncodeStage, MediaEncoder};
use clipforge_core::{Config, Error, Result, TrimStrategy, VariantSpec};
use clipforge_pipeline::{
    BatchScheduler, OutputLayout, PipelineSettings, TranscodePipeline, VariantScheduler,
};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const INPUT_ROOT: &str = "/in";

/// One encoder call starting or finishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin(String),
    End(String),
}

/// Encoder that writes a small file instead of running ffmpeg.
#[derive(Default)]
pub struct FakeEncoder {
    delay: Duration,
    fail: Vec<(EncodeStage, String)>,
    calls: Mutex<Vec<EncodeRequest>>,
    events: Mutex<Vec<Event>>,
    /// Active encodes per video name.
    active: Mutex<HashMap<String, usize>>,
    peak_videos: AtomicUsize,
    running: AtomicUsize,
    peak_encodes: AtomicUsize,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail `stage` for outputs whose path contains `pattern`.
    pub fn failing(mut self, stage: EncodeStage, pattern: &str) -> Self {
        self.fail.push((stage, pattern.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<EncodeRequest> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, pattern: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|r| r.output.to_string_lossy().contains(pattern))
            .count()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Most distinct videos seen encoding at once.
    pub fn peak_videos(&self) -> usize {
        self.peak_videos.load(Ordering::SeqCst)
    }

    /// Most encoder calls seen running at once.
    pub fn peak_encodes(&self) -> usize {
        self.peak_encodes.load(Ordering::SeqCst)
    }

    fn begin(&self, video: &str) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_encodes.fetch_max(now, Ordering::SeqCst);

        let mut active = self.active.lock();
        *active.entry(video.to_string()).or_default() += 1;
        self.peak_videos.fetch_max(active.len(), Ordering::SeqCst);
        self.events.lock().push(Event::Begin(video.to_string()));
    }

    fn end(&self, video: &str) {
        self.running.fetch_sub(1, Ordering::SeqCst);

        let mut active = self.active.lock();
        if let Some(count) = active.get_mut(video) {
            *count -= 1;
            if *count == 0 {
                active.remove(video);
            }
        }
        self.events.lock().push(Event::End(video.to_string()));
    }

    fn should_fail(&self, request: &EncodeRequest) -> bool {
        let output = request.output.to_string_lossy();
        self.fail
            .iter()
            .any(|(stage, pattern)| *stage == request.stage && output.contains(pattern.as_str()))
    }
}

#[async_trait]
impl MediaEncoder for FakeEncoder {
    async fn encode(&self, request: &EncodeRequest, cancel: &CancellationToken) -> Result<()> {
        self.calls.lock().push(request.clone());
        let video = video_name(&request.output);
        self.begin(&video);

        let cancelled = tokio::select! {
            _ = cancel.cancelled() => true,
            _ = tokio::time::sleep(self.delay) => false,
        };

        // Leave a partial file behind, as a failing encoder would.
        let written = std::fs::write(&request.output, b"encoded clip");
        self.end(&video);

        if cancelled {
            return Err(Error::Cancelled);
        }
        written?;
        if self.should_fail(request) {
            return Err(Error::encode(request.stage.as_str(), "simulated failure"));
        }
        Ok(())
    }
}

/// Probe answering from a table instead of running ffprobe.
pub struct FakeProbe {
    default_secs: f64,
    overrides: Vec<(String, f64)>,
    fail: Vec<String>,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(default_secs: f64) -> Self {
        Self {
            default_secs,
            overrides: Vec::new(),
            fail: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_duration(mut self, pattern: &str, secs: f64) -> Self {
        self.overrides.push((pattern.to_string(), secs));
        self
    }

    pub fn failing(mut self, pattern: &str) -> Self {
        self.fail.push(pattern.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurationProbe for FakeProbe {
    async fn duration(&self, path: &Path, _cancel: &CancellationToken) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = path.to_string_lossy();
        if self.fail.iter().any(|p| text.contains(p.as_str())) {
            return Err(Error::probe(path, "simulated probe failure"));
        }
        Ok(self
            .overrides
            .iter()
            .find(|(p, _)| text.contains(p.as_str()))
            .map(|(_, secs)| *secs)
            .unwrap_or(self.default_secs))
    }
}

/// Output directory plus fakes wired into the schedulers.
pub struct Harness {
    pub encoder: Arc<FakeEncoder>,
    pub probe: Arc<FakeProbe>,
    pub config: Config,
    pub output: TempDir,
}

impl Harness {
    pub fn new(config: Config, encoder: FakeEncoder, probe: FakeProbe) -> Self {
        Self {
            encoder: Arc::new(encoder),
            probe: Arc::new(probe),
            config,
            output: tempfile::tempdir().unwrap(),
        }
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(INPUT_ROOT, self.output.path())
    }

    pub fn pipeline(&self) -> TranscodePipeline {
        TranscodePipeline::new(
            self.encoder.clone(),
            self.probe.clone(),
            self.layout(),
            PipelineSettings::from_config(&self.config),
        )
    }

    pub fn variant_scheduler(&self) -> VariantScheduler {
        VariantScheduler::new(
            self.pipeline(),
            self.config.video_configs.clone(),
            self.config.max_concurrent_configs,
        )
    }

    pub fn batch_scheduler(&self) -> BatchScheduler {
        BatchScheduler::new(
            self.variant_scheduler(),
            self.config.batch_size,
            self.config.max_concurrent_videos,
        )
    }

    /// Every file under the output root whose name marks it as staging.
    pub fn leftover_temp_files(&self) -> Vec<PathBuf> {
        files_under(self.output.path())
            .into_iter()
            .filter(|p| {
                p.file_stem()
                    .map(|s| s.to_string_lossy().ends_with("_temp"))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Config with verification off and the given variants.
pub fn config_with(variants: Vec<VariantSpec>) -> Config {
    Config {
        verify_output_duration: false,
        video_configs: variants,
        ..Config::default()
    }
}

pub fn variant(folder: &str, suffix: &str, strategy: TrimStrategy) -> VariantSpec {
    VariantSpec {
        width: 640,
        height: 640,
        clip_duration: 20.0,
        speed: 2.0,
        video_bitrate: 2000,
        clip_strategy: strategy,
        output_suffix: suffix.to_string(),
        output_folder: folder.to_string(),
    }
}

/// `/in/video0.mp4`, `/in/video1.mp4`, ...
pub fn source_paths(count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| Path::new(INPUT_ROOT).join(format!("video{i}.mp4")))
        .collect()
}

/// Video name encoded in an output path (`video3_sq_temp.mp4` -> `video3`).
pub fn video_name(output: &Path) -> String {
    output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
        .split(['_', '.'])
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}
