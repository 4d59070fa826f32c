//! Sequential batches of concurrently processed videos.

use std::path::PathBuf;
use std::sync::Arc;

use clipforge_core::Error;
use tokio_util::sync::CancellationToken;

use crate::outcome::{BatchReport, VideoOutcome};
use crate::task_group::{BoundedTaskGroup, GroupMode, UnitOutcome};
use crate::variants::VariantScheduler;

/// Splits a stream of source paths into fixed-size batches.
///
/// Videos inside a batch run concurrently up to the video ceiling; the next
/// batch starts only after every video of the current one has finished. Peak
/// concurrency is therefore `video ceiling x variant ceiling` however many
/// sources the stream yields.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    videos: Arc<VariantScheduler>,
    batch_size: usize,
    video_ceiling: usize,
}

impl BatchScheduler {
    pub fn new(videos: VariantScheduler, batch_size: usize, video_ceiling: usize) -> Self {
        Self {
            videos: Arc::new(videos),
            batch_size: batch_size.max(1),
            video_ceiling,
        }
    }

    /// Process every path yielded by `paths`.
    ///
    /// The iterator is pulled one batch at a time. Cancelling `cancel` stops
    /// before the next batch and skips unstarted work in the current one.
    pub async fn run<I>(&self, paths: I, cancel: &CancellationToken) -> BatchReport
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut report = BatchReport::default();
        let mut paths = paths.into_iter();

        loop {
            let batch: Vec<PathBuf> = paths.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            if cancel.is_cancelled() {
                tracing::warn!("Interrupted; remaining videos were not started");
                report.interrupted = true;
                break;
            }

            let number = report.batches.len() + 1;
            tracing::info!("Batch {number}: processing {} videos", batch.len());

            let videos = self.run_batch(batch, cancel).await;
            let stats = report.push_batch(videos);

            tracing::info!(
                "Batch {number} complete: {} succeeded, {} failed (running total {}/{})",
                stats.succeeded,
                stats.failed,
                report.totals.succeeded,
                report.totals.attempted
            );
        }

        if cancel.is_cancelled() {
            report.interrupted = true;
        }
        report
    }

    async fn run_batch(&self, batch: Vec<PathBuf>, cancel: &CancellationToken) -> Vec<VideoOutcome> {
        let mut group =
            BoundedTaskGroup::with_parent(self.video_ceiling, GroupMode::CollectAll, cancel);

        for path in &batch {
            let videos = self.videos.clone();
            let path = path.clone();
            group.spawn(move |token| async move { Ok(videos.run(&path, &token).await) });
        }

        let outcomes = match group.join().await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                return batch
                    .iter()
                    .map(|path| self.videos.all_failed(path, &e))
                    .collect()
            }
        };

        outcomes
            .into_iter()
            .zip(batch.iter())
            .map(|(outcome, path)| match outcome {
                UnitOutcome::Succeeded(video) => video,
                UnitOutcome::Failed(e) => self.videos.all_failed(path, &e),
                UnitOutcome::Skipped => self.videos.all_failed(path, &Error::Cancelled),
            })
            .collect()
    }
}
