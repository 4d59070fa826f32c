//! clipforge - batch clip generator.
//!
//! This library crate exposes the CLI's building blocks for integration
//! testing. The heavy lifting lives in the `clipforge-*` workspace crates.

pub mod report;
pub mod scanner;
