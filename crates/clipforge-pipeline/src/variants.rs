//! Fan-out of every configured variant for one source video.

use std::path::Path;
use std::sync::Arc;

use clipforge_core::{Error, Result, SourceVideo, VariantSpec};
use tokio_util::sync::CancellationToken;

use crate::outcome::{TaskOutcome, VideoOutcome};
use crate::task_group::{BoundedTaskGroup, GroupMode, UnitOutcome};
use crate::transcode::TranscodePipeline;

/// Renders all variants of a video, at most `ceiling` at a time.
///
/// Variants run in collect-all mode: one failed variant never stops its
/// siblings.
#[derive(Debug, Clone)]
pub struct VariantScheduler {
    pipeline: Arc<TranscodePipeline>,
    variants: Arc<[VariantSpec]>,
    ceiling: usize,
}

impl VariantScheduler {
    pub fn new(pipeline: TranscodePipeline, variants: Vec<VariantSpec>, ceiling: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            variants: variants.into(),
            ceiling,
        }
    }

    /// Probe `path` once, then render every variant from it.
    ///
    /// Returns one outcome per configured variant, in configuration order.
    pub async fn run(&self, path: &Path, cancel: &CancellationToken) -> VideoOutcome {
        let source = match self.prepare(path, cancel).await {
            Ok(source) => source,
            Err(e) => {
                if !matches!(e, Error::Cancelled) {
                    tracing::error!("{}: {e}", path.display());
                }
                return self.all_failed(path, &e);
            }
        };

        let source = Arc::new(source);
        let mut group = BoundedTaskGroup::with_parent(self.ceiling, GroupMode::CollectAll, cancel);

        for index in 0..self.variants.len() {
            let pipeline = self.pipeline.clone();
            let variants = self.variants.clone();
            let source = source.clone();
            group.spawn(move |token| async move {
                Ok(pipeline.run(&source, &variants[index], &token).await)
            });
        }

        let outcomes = match group.join().await {
            Ok(outcomes) => outcomes,
            Err(e) => return self.all_failed(path, &e),
        };

        let variants = outcomes
            .into_iter()
            .zip(self.variants.iter())
            .map(|(outcome, spec)| match outcome {
                UnitOutcome::Succeeded(task) => task,
                UnitOutcome::Failed(e) => self.failed_outcome(path, spec, &e),
                UnitOutcome::Skipped => self.failed_outcome(path, spec, &Error::Cancelled),
            })
            .collect();

        VideoOutcome {
            video: path.to_path_buf(),
            variants,
        }
    }

    async fn prepare(&self, path: &Path, cancel: &CancellationToken) -> Result<SourceVideo> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let source = SourceVideo::new(path)?;
        let seconds = self.pipeline.probe().duration(path, cancel).await?;
        tracing::debug!("{}: {seconds:.2}s", path.display());
        source.with_duration(seconds)
    }

    /// Every variant of `path` failed with `error`.
    pub fn all_failed(&self, path: &Path, error: &Error) -> VideoOutcome {
        VideoOutcome {
            video: path.to_path_buf(),
            variants: self
                .variants
                .iter()
                .map(|spec| self.failed_outcome(path, spec, error))
                .collect(),
        }
    }

    fn failed_outcome(&self, path: &Path, spec: &VariantSpec, error: &Error) -> TaskOutcome {
        TaskOutcome::failed(
            path,
            spec.label(),
            self.pipeline.layout().output_path(path, spec),
            None,
            error,
        )
    }
}
