mod utils;
#[allow(unused)]
use utils::*;

use inferbench::prelude::*;
use inferbench::scheduler;
use mock_service::MockBehavior;
use std::collections::BTreeMap;
use std::time::Duration;
use time::macros::datetime;

async fn bench(deployment: &str, delay: Duration) -> RunResult {
    let addr = mock_service::spawn(MockBehavior {
        delay,
        ..Default::default()
    })
    .await;
    let mut config = mock_config(deployment, &addr.to_string());
    config.iterations = 10;
    scheduler::run(&config, shutdown_flag()).await.unwrap()
}

#[tokio::test]
async fn end_to_end_store_and_compare() {
    init();

    let fast = bench("fast", Duration::from_millis(1)).await;
    let slow = bench("slow-baseline", Duration::from_millis(20)).await;

    // Persist through the store and reload, as the collector would.
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(dir.path());
    let fast_path = dir.path().join("fast.json");
    let slow_path = dir.path().join("slow.json");
    std::fs::rename(store.save(&fast).unwrap(), &fast_path).unwrap();
    std::fs::rename(store.save(&slow).unwrap(), &slow_path).unwrap();

    let loaded = vec![
        ResultStore::load(&slow_path).unwrap(),
        ResultStore::load(&fast_path).unwrap(),
    ];
    assert_eq!(loaded[1], fast);

    let report = ComparisonReport::new(loaded, Some("slow-baseline".to_string()));
    let order: Vec<&str> = report
        .entries()
        .iter()
        .map(|r| r.deployment_id.as_str())
        .collect();
    assert_eq!(order, ["fast", "slow-baseline"]);

    let fast_entry = &report.entries()[0];
    let speedup = report.speedup(fast_entry).unwrap();
    assert!(speedup > 1., "baseline is 20x slower per request");

    let at = datetime!(2024-06-01 12:00:00 UTC);
    let body = report.render(at);
    assert!(body.contains("fast"));
    assert!(body.contains("slow-baseline"));
    assert!(body.contains("baseline"));

    let aggregate: BTreeMap<String, RunResult> = report
        .entries()
        .iter()
        .map(|r| (r.deployment_id.clone(), r.clone()))
        .collect();
    let aggregate_path = store.save_aggregate(&aggregate, at).unwrap();
    assert_eq!(ResultStore::load_aggregate(&aggregate_path).unwrap(), aggregate);

    let report_path = store.save_report(&body, at).unwrap();
    assert_eq!(std::fs::read_to_string(report_path).unwrap(), body);
}

#[tokio::test]
async fn report_bodies_are_reproducible_across_object_identities() {
    init();

    let result = bench("repro", Duration::from_millis(1)).await;
    let json = serde_json::to_string(&result).unwrap();
    let copy: RunResult = serde_json::from_str(&json).unwrap();

    let at = datetime!(2024-06-01 12:00:00 UTC);
    let a = ComparisonReport::new(vec![result], None).render(at);
    let b = ComparisonReport::new(vec![copy], None).render(at);
    assert_eq!(a, b);
}
