use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(author, version, about = "Batch clip generator for source video libraries")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate clips for every video under the input directory
    Run {
        /// Input directory (overrides inputDir)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (overrides outputDir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Videos processed concurrently (overrides maxConcurrentVideos)
        #[arg(long)]
        max_videos: Option<usize>,

        /// Variants rendered concurrently per video (overrides maxConcurrentConfigs)
        #[arg(long)]
        max_variants: Option<usize>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate clips for a single video file
    Clip {
        /// Source video
        #[arg(required = true)]
        file: PathBuf,

        /// Output directory (overrides outputDir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(default_value = "config.json")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display version information
    Version,
}
