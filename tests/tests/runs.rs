mod utils;
#[allow(unused)]
use utils::*;

use inferbench::prelude::*;
use inferbench::scheduler;
use mock_service::MockBehavior;
use std::time::Duration;

#[tokio::test]
async fn sequential_run_with_no_failures() {
    init();
    let addr = mock_service::spawn(MockBehavior::default()).await;

    let mut config = mock_config("seq", &addr.to_string());
    config.iterations = 50;

    let result = scheduler::run(&config, shutdown_flag()).await.unwrap();

    assert_eq!(result.deployment_id, "seq");
    assert_eq!(result.protocol, Protocol::Http);
    assert_eq!(result.mode, Mode::Sequential);
    assert_eq!(result.concurrency, 1);
    assert_eq!(result.iterations, 50);
    assert_eq!(result.errors, 0);
    assert!(result.avg_latency_fps.is_none());

    // Sequential throughput is the theoretical single-stream rate, and
    // total time is the sum of observed latencies.
    assert_eq!(result.throughput_fps, 1_000. / result.latency_ms.mean);
    assert!(result.total_time_sec > 0.);

    let lat = &result.latency_ms;
    assert!(lat.min <= lat.p50);
    assert!(lat.p50 <= lat.p90);
    assert!(lat.p90 <= lat.p95);
    assert!(lat.p95 <= lat.p99);
    assert!(lat.p99 <= lat.max);
    assert_eq!(lat.median, lat.p50);
}

#[tokio::test]
async fn concurrent_run_reports_observed_throughput() {
    init();
    let addr = mock_service::spawn(MockBehavior {
        delay: Duration::from_millis(5),
        ..Default::default()
    })
    .await;

    let mut config = mock_config("conc", &addr.to_string());
    config.iterations = 24;
    config.concurrency = 4;

    let result = scheduler::run(&config, shutdown_flag()).await.unwrap();

    assert_eq!(result.mode, Mode::Concurrent);
    assert_eq!(result.concurrency, 4);
    assert_eq!(result.iterations, 24);
    assert_eq!(result.errors, 0);
    assert_eq!(
        result.throughput_fps,
        result.iterations as f64 / result.total_time_sec
    );
    assert_eq!(
        result.avg_latency_fps,
        Some(1_000. / result.latency_ms.mean)
    );

    // With 4 workers over 5ms requests the wall clock must sit well below
    // the serialized latency sum.
    let serialized_sec = result.latency_ms.mean * result.iterations as f64 / 1_000.;
    assert!(result.total_time_sec < serialized_sec);
}

#[tokio::test]
async fn failed_warmup_aborts_with_no_result() {
    init();
    let addr = mock_service::spawn(MockBehavior {
        fail_after: Some(0),
        ..Default::default()
    })
    .await;

    let mut config = mock_config("warmup-fail", &addr.to_string());
    config.iterations = 10;

    match scheduler::run(&config, shutdown_flag()).await {
        Err(HarnessError::WarmupFailed(n)) => assert_eq!(n, 5),
        other => panic!("expected WarmupFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn all_failed_main_phase_yields_empty_result_set() {
    init();
    // Warmup (5 requests for this run size) succeeds, everything after
    // fails.
    let addr = mock_service::spawn(MockBehavior {
        fail_after: Some(5),
        ..Default::default()
    })
    .await;

    let mut config = mock_config("empty", &addr.to_string());
    config.iterations = 10;

    match scheduler::run(&config, shutdown_flag()).await {
        Err(HarnessError::EmptyResultSet) => {}
        other => panic!("expected EmptyResultSet, got {other:?}"),
    }
}

#[tokio::test]
async fn partial_failures_tally_but_do_not_abort() {
    init();
    // 5 warmup + 7 successful main requests, then errors.
    let addr = mock_service::spawn(MockBehavior {
        fail_after: Some(12),
        ..Default::default()
    })
    .await;

    let mut config = mock_config("lossy", &addr.to_string());
    config.iterations = 10;

    let result = scheduler::run(&config, shutdown_flag()).await.unwrap();
    assert_eq!(result.iterations, 7);
    assert_eq!(result.errors, 3);
    assert!((result.error_rate() - 0.3).abs() < 1e-9);
}

#[tokio::test]
async fn unreachable_endpoint_fails_connectivity() {
    init();
    let mut config = mock_config("down", &dead_endpoint());
    config.iterations = 5;

    match scheduler::run(&config, shutdown_flag()).await {
        Err(HarnessError::Connectivity(_)) => {}
        other => panic!("expected Connectivity, got {other:?}"),
    }
}
