mod common;

use std::path::Path;
use std::time::Duration;

use clipforge_av::EncodeStage;
use clipforge_core::config::default_variants;
use clipforge_core::TrimStrategy;
use common::{config_with, source_paths, variant, Event, FakeEncoder, FakeProbe, Harness};
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn seven_videos_run_as_three_sequential_batches() {
    let mut config = config_with(vec![variant("sq", "_sq", TrimStrategy::Start)]);
    config.batch_size = 3;
    config.max_concurrent_videos = 2;
    config.max_concurrent_configs = 1;
    let encoder = FakeEncoder::new().with_delay(Duration::from_millis(25));
    let h = Harness::new(config, encoder, FakeProbe::new(40.0));

    let report = h
        .batch_scheduler()
        .run(source_paths(7), &CancellationToken::new())
        .await;

    let sizes: Vec<usize> = report.batches.iter().map(|b| b.stats.attempted).collect();
    assert_eq!(sizes, [3, 3, 1]);
    assert_eq!(report.totals.attempted, 7);
    assert_eq!(report.totals.succeeded, 7);
    assert_eq!(report.totals.failed, 0);
    assert!(report.all_succeeded());

    assert!(h.encoder.peak_videos() <= 2, "peak {}", h.encoder.peak_videos());
    assert_eq!(h.encoder.peak_videos(), 2);

    // Every encode of one batch ends before any encode of the next begins.
    let events = h.encoder.events();
    let batch_of = |video: &str| -> usize {
        let n: usize = video.trim_start_matches("video").parse().unwrap();
        n / 3
    };
    for b in 0..2 {
        let last_end = events
            .iter()
            .rposition(|e| matches!(e, Event::End(v) if batch_of(v) == b))
            .unwrap();
        let next_begin = events
            .iter()
            .position(|e| matches!(e, Event::Begin(v) if batch_of(v) == b + 1))
            .unwrap();
        assert!(last_end < next_begin, "batch {b} overlapped batch {}", b + 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn peak_concurrency_is_video_times_variant_ceiling() {
    let mut config = config_with(default_variants());
    config.batch_size = 10;
    config.max_concurrent_videos = 2;
    config.max_concurrent_configs = 3;
    let encoder = FakeEncoder::new().with_delay(Duration::from_millis(10));
    let h = Harness::new(config, encoder, FakeProbe::new(40.0));

    let report = h
        .batch_scheduler()
        .run(source_paths(6), &CancellationToken::new())
        .await;

    assert_eq!(report.totals.succeeded, 6);
    assert_eq!(report.variants_succeeded, 24);
    assert!(h.encoder.peak_encodes() <= 6, "peak {}", h.encoder.peak_encodes());
    assert!(h.encoder.peak_videos() <= 2);
}

#[tokio::test]
async fn failed_variant_does_not_stop_siblings() {
    let encoder = FakeEncoder::new().failing(EncodeStage::Speed, "_rect_end");
    let h = Harness::new(config_with(default_variants()), encoder, FakeProbe::new(40.0));

    let video = h
        .variant_scheduler()
        .run(Path::new("/in/video0.mp4"), &CancellationToken::new())
        .await;

    assert_eq!(video.variants.len(), 4);
    let failed: Vec<&str> = video.failed_variants().map(|v| v.variant.as_str()).collect();
    assert_eq!(failed, ["1008x762_end"]);
    assert!(!video.success());
    assert_eq!(h.encoder.calls().len(), 8);
    assert_eq!(h.probe.calls(), 1);
    assert!(h.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn outcomes_follow_variant_order() {
    let h = Harness::new(config_with(default_variants()), FakeEncoder::new(), FakeProbe::new(40.0));

    let video = h
        .variant_scheduler()
        .run(Path::new("/in/video0.mp4"), &CancellationToken::new())
        .await;

    let labels: Vec<&str> = video.variants.iter().map(|v| v.variant.as_str()).collect();
    assert_eq!(
        labels,
        ["1008x1008_start", "1008x762_start", "1008x1008_end", "1008x762_end"]
    );
    assert!(video.success());
}

#[tokio::test]
async fn probe_failure_fails_every_variant_of_that_video() {
    let probe = FakeProbe::new(40.0).failing("video1");
    let h = Harness::new(config_with(default_variants()), FakeEncoder::new(), probe);

    let report = h
        .batch_scheduler()
        .run(source_paths(3), &CancellationToken::new())
        .await;

    assert_eq!(report.totals.succeeded, 2);
    assert_eq!(report.totals.failed, 1);
    assert_eq!(report.failed_videos.len(), 1);
    let failed = &report.failed_videos[0];
    assert!(failed.video.ends_with("video1.mp4"));
    assert!(failed
        .variants
        .iter()
        .all(|v| v.error_kind == Some("probe_failed")));
    assert_eq!(h.encoder.calls_for("video1"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn collect_all_counts_exact_failures() {
    let variants = vec![
        variant("a", "_a", TrimStrategy::Start),
        variant("b", "_b", TrimStrategy::End),
        variant("c", "_c", TrimStrategy::Middle),
    ];
    let encoder = FakeEncoder::new()
        .failing(EncodeStage::TrimScale, "video2_b")
        .failing(EncodeStage::Speed, "video4_c")
        .failing(EncodeStage::Speed, "video4_a");
    let mut config = config_with(variants);
    config.batch_size = 2;
    config.max_concurrent_videos = 3;
    let h = Harness::new(config, encoder, FakeProbe::new(60.0));

    let report = h
        .batch_scheduler()
        .run(source_paths(6), &CancellationToken::new())
        .await;

    assert_eq!(report.batches.len(), 3);
    assert_eq!(report.variants_failed, 3);
    assert_eq!(report.variants_succeeded, 15);
    assert_eq!(report.totals.failed, 2);
    assert_eq!(report.totals.succeeded, 4);
    assert_eq!(report.failed_variants().count(), 3);
    assert!(h.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn unsupported_extension_fails_without_probing() {
    let h = Harness::new(config_with(default_variants()), FakeEncoder::new(), FakeProbe::new(40.0));

    let video = h
        .variant_scheduler()
        .run(Path::new("/in/notes.txt"), &CancellationToken::new())
        .await;

    assert!(video
        .variants
        .iter()
        .all(|v| v.error_kind == Some("config_validation_failed")));
    assert_eq!(h.probe.calls(), 0);
}

#[tokio::test]
async fn cancelled_before_start_processes_nothing() {
    let h = Harness::new(config_with(default_variants()), FakeEncoder::new(), FakeProbe::new(40.0));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = h.batch_scheduler().run(source_paths(5), &cancel).await;

    assert!(report.interrupted);
    assert!(report.batches.is_empty());
    assert!(h.encoder.calls().is_empty());
    assert!(!report.all_succeeded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interruption_stops_after_current_batch() {
    let mut config = config_with(default_variants());
    config.batch_size = 3;
    config.max_concurrent_videos = 2;
    let encoder = FakeEncoder::new().with_delay(Duration::from_secs(30));
    let h = Harness::new(config, encoder, FakeProbe::new(40.0));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let report = h.batch_scheduler().run(source_paths(6), &cancel).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.interrupted);
    assert_eq!(report.batches.len(), 1);
    assert_eq!(report.totals.attempted, 3);
    assert_eq!(report.totals.failed, 3);
    assert!(report
        .failed_variants()
        .all(|v| v.error_kind == Some("cancelled")));
    assert_eq!(h.encoder.calls_for("video3"), 0);
    assert!(h.leftover_temp_files().is_empty());
}
