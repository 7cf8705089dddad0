mod utils;
#[allow(unused)]
use utils::*;

use inferbench::adapter;
use inferbench::prelude::*;
use mock_service::MockBehavior;

#[tokio::test]
async fn detection_falls_through_to_http() {
    init();
    let addr = mock_service::spawn(MockBehavior::default()).await;

    // gRPC is probed first but refuses connections, so detection settles
    // on HTTP.
    let mut config = mock_config("detect", &addr.to_string());
    config.protocol = None;

    let detected = adapter::detect_protocol(&config).await.unwrap();
    assert_eq!(detected, Protocol::Http);
}

#[tokio::test]
async fn detection_exhausts_both_protocols() {
    init();
    let mut config = mock_config("detect-none", &dead_endpoint());
    config.protocol = None;

    match adapter::detect_protocol(&config).await {
        Err(HarnessError::NoProtocolAvailable) => {}
        other => panic!("expected NoProtocolAvailable, got {other:?}"),
    }
}

#[tokio::test]
async fn http_probe_respects_failing_health() {
    init();
    let addr = mock_service::spawn(MockBehavior {
        fail_health: true,
        ..Default::default()
    })
    .await;

    let config = mock_config("unhealthy", &addr.to_string());
    let mut adapter = Adapter::connect(&config, Protocol::Http).await.unwrap();
    assert!(!adapter.probe_ready().await);

    // An unhealthy endpoint still exhausts detection.
    let mut auto = config.clone();
    auto.protocol = None;
    match adapter::detect_protocol(&auto).await {
        Err(HarnessError::NoProtocolAvailable) => {}
        other => panic!("expected NoProtocolAvailable, got {other:?}"),
    }
}
