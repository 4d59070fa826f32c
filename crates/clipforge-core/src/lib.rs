//! clipforge-core: shared types, errors, configuration, and the pure
//! trim/quality policies.
//!
//! This crate is the foundational dependency for the other clipforge crates.
//! It has no knowledge of external processes or concurrency.

pub mod config;
pub mod error;
pub mod media;
pub mod quality;
pub mod trim;
pub mod variant;

// Re-export the most commonly used items at the crate root.
pub use config::Config;
pub use error::{Error, Result};
pub use media::{SourceVideo, VideoFormat};
pub use quality::{QualityParameterBundle, QualityPreset};
pub use trim::ClipWindow;
pub use variant::{TrimStrategy, VariantSpec};
