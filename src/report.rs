//! End-of-run summary.

use std::io::{self, Write};

use clipforge_pipeline::{BatchReport, BatchStatistics, TaskOutcome};
use serde::Serialize;

/// JSON shape of the run summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    batches: usize,
    totals: BatchStatistics,
    variants_succeeded: usize,
    variants_failed: usize,
    interrupted: bool,
    failed_videos: Vec<String>,
    failed_variants: Vec<&'a TaskOutcome>,
}

impl<'a> From<&'a BatchReport> for Summary<'a> {
    fn from(report: &'a BatchReport) -> Self {
        Self {
            batches: report.batches.len(),
            totals: report.totals,
            variants_succeeded: report.variants_succeeded,
            variants_failed: report.variants_failed,
            interrupted: report.interrupted,
            failed_videos: report
                .failed_videos
                .iter()
                .map(|v| v.video.display().to_string())
                .collect(),
            failed_variants: report.failed_variants().collect(),
        }
    }
}

/// Render the summary as pretty JSON.
pub fn summary_json(report: &BatchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Summary::from(report))
}

/// Print the human-readable summary to stdout.
pub fn print_summary(report: &BatchReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, report)
}

/// Write the human-readable summary.
pub fn write_summary(out: &mut impl Write, report: &BatchReport) -> io::Result<()> {
    let totals = &report.totals;
    writeln!(out)?;
    writeln!(out, "Processing summary")?;
    writeln!(out, "  Batches:  {}", report.batches.len())?;
    writeln!(out, "  Videos:   {}", totals.attempted)?;
    writeln!(out, "  Succeeded: {}", totals.succeeded)?;
    writeln!(out, "  Failed:   {}", totals.failed)?;
    writeln!(
        out,
        "  Clips:    {} ok, {} failed",
        report.variants_succeeded, report.variants_failed
    )?;

    if report.interrupted {
        writeln!(out, "\nRun was interrupted; remaining videos were not processed.")?;
    }

    if !report.failed_videos.is_empty() {
        writeln!(out, "\nFailed videos:")?;
        for video in &report.failed_videos {
            writeln!(out, "  ✗ {}", video.video.display())?;
            for variant in video.failed_variants() {
                writeln!(
                    out,
                    "      [{}] {}",
                    variant.variant,
                    variant.error.as_deref().unwrap_or("unknown error")
                )?;
            }
        }
    } else if totals.attempted > 0 {
        writeln!(out, "\n✓ All videos processed successfully")?;
    }

    Ok(())
}
