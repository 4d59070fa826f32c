mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use clipforge::{report, scanner::VideoScanner};
use clipforge_av::{FfmpegEncoder, FfprobeDurationProbe, ToolRegistry};
use clipforge_core::Config;
use clipforge_pipeline::{
    BatchReport, BatchScheduler, OutputLayout, PipelineSettings, TranscodePipeline,
    VariantScheduler,
};
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipforge=debug,clipforge_core=debug,clipforge_av=debug,clipforge_pipeline=debug"
                .to_string()
        } else {
            "clipforge=info,clipforge_core=info,clipforge_av=warn,clipforge_pipeline=info"
                .to_string()
        }
    });

    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            input,
            output,
            max_videos,
            max_variants,
            json,
        } => {
            let mut config = Config::load_or_default(cli.config.as_deref())?;
            if let Some(input) = input {
                config.input_dir = input;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(n) = max_videos {
                config.max_concurrent_videos = n;
            }
            if let Some(n) = max_variants {
                config.max_concurrent_configs = n;
            }
            run_batch(config, json)
        }
        Commands::Clip { file, output, json } => {
            let mut config = Config::load_or_default(cli.config.as_deref())?;
            if let Some(output) = output {
                config.output_dir = output;
            }
            clip_file(&file, config, json)
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::InitConfig { path, force } => init_config(&path, force),
        Commands::Version => {
            println!("clipforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Wire the ffmpeg-backed pipeline into a variant scheduler.
fn build_scheduler(
    config: &Config,
    tools: &ToolRegistry,
    layout: OutputLayout,
) -> Result<VariantScheduler> {
    let encoder = FfmpegEncoder::from_registry(tools, config.encode_timeout())?;
    let probe = FfprobeDurationProbe::from_registry(tools, config.probe_timeout())?;
    let pipeline = TranscodePipeline::new(
        Arc::new(encoder),
        Arc::new(probe),
        layout,
        PipelineSettings::from_config(config),
    );
    Ok(VariantScheduler::new(
        pipeline,
        config.video_configs.clone(),
        config.max_concurrent_configs,
    ))
}

/// Tools must answer before any work starts.
fn require_tools(config: &Config) -> Result<ToolRegistry> {
    let tools = ToolRegistry::discover(&config.tools);
    tools.ensure_available()?;
    Ok(tools)
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; cancelling outstanding work");
            token.cancel();
        }
    });
}

fn run_batch(config: Config, json: bool) -> Result<()> {
    config.validate()?;
    let scanner = VideoScanner::new(&config.input_dir)?.excluding(&config.output_dir);
    let tools = require_tools(&config)?;

    tracing::info!(
        "Clipping {} -> {} ({} variants, {} videos x {} variants concurrently, batches of {})",
        config.input_dir.display(),
        config.output_dir.display(),
        config.video_configs.len(),
        config.max_concurrent_videos,
        config.max_concurrent_configs,
        config.batch_size
    );

    let layout = OutputLayout::new(&config.input_dir, &config.output_dir);
    let scheduler = BatchScheduler::new(
        build_scheduler(&config, &tools, layout)?,
        config.batch_size,
        config.max_concurrent_videos,
    );

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_interrupt(cancel.clone());
        scheduler.run(scanner.iter(), &cancel).await
    });

    finish(&report, json)
}

fn clip_file(file: &Path, config: Config, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }
    config.validate()?;
    let tools = require_tools(&config)?;

    tracing::info!("Clipping {}", file.display());

    let scheduler = build_scheduler(&config, &tools, OutputLayout::flat(&config.output_dir))?;

    let rt = tokio::runtime::Runtime::new()?;
    let (video, interrupted) = rt.block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_interrupt(cancel.clone());
        let video = scheduler.run(file, &cancel).await;
        (video, cancel.is_cancelled())
    });

    let mut report = BatchReport::default();
    report.push_batch(vec![video]);
    report.interrupted = interrupted;

    finish(&report, json)
}

/// Print the summary and turn failures into a non-zero exit.
fn finish(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report::summary_json(report)?);
    } else {
        report::print_summary(report)?;
    }

    if report.interrupted {
        anyhow::bail!("Interrupted");
    }
    if report.totals.failed > 0 {
        anyhow::bail!(
            "{} of {} videos had failed clips",
            report.totals.failed,
            report.totals.attempted
        );
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg (which ships ffprobe) to generate clips.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file does not exist: {:?}", p);
            }
            println!("Validating config: {:?}", p);
            Config::load_or_default(Some(p))?
        }
        None => {
            println!("No config file specified, validating defaults");
            Config::default()
        }
    };
    config.validate()?;

    println!("✓ Configuration is valid");
    println!("  Input:   {}", config.input_dir.display());
    println!("  Output:  {}", config.output_dir.display());
    println!(
        "  Concurrency: {} videos x {} variants, batches of {}",
        config.max_concurrent_videos, config.max_concurrent_configs, config.batch_size
    );
    println!("  Quality preset: {}", config.quality_preset);
    println!("  Variants: {}", config.video_configs.len());
    for spec in &config.video_configs {
        println!(
            "    {} {}x{} {}s @ {}x {} kbps ({})",
            spec.label(),
            spec.width,
            spec.height,
            spec.clip_duration,
            spec.speed,
            spec.video_bitrate,
            spec.clip_strategy
        );
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists; pass --force to overwrite", path);
    }
    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
