//! # clipforge-pipeline
//!
//! Orchestration for clipforge: the two-stage [`TranscodePipeline`], the
//! [`BoundedTaskGroup`] concurrency primitive, and the [`VariantScheduler`]
//! and [`BatchScheduler`] built on top of it.
//!
//! The encoder and probe are injected as trait objects
//! ([`clipforge_av::MediaEncoder`], [`clipforge_av::DurationProbe`]), so the
//! schedulers can be driven without ffmpeg installed.

pub mod batch;
pub mod layout;
pub mod outcome;
pub mod task_group;
pub mod transcode;
pub mod variants;

pub use batch::BatchScheduler;
pub use layout::OutputLayout;
pub use outcome::{BatchReport, BatchStatistics, BatchSummary, TaskOutcome, VideoOutcome};
pub use task_group::{BoundedTaskGroup, GroupMode, UnitOutcome};
pub use transcode::{PipelineSettings, TranscodePipeline, DURATION_TOLERANCE_SECS};
pub use variants::VariantScheduler;
