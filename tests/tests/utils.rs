use inferbench::prelude::*;
use std::net::TcpListener;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, OnceLock};
use tracing_subscriber::EnvFilter;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();
    ONCE_LOCK.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("inferbench=debug,mock_service=debug"))
            .with_test_writer()
            .init();
    });
}

#[allow(unused)]
pub fn shutdown_flag() -> ShutdownFlag {
    Arc::new(AtomicBool::new(false))
}

/// A local port nothing listens on; connections are refused immediately.
#[allow(unused)]
pub fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

/// Config pointed at a spawned mock, with a small tensor so request
/// bodies stay cheap.
#[allow(unused)]
pub fn mock_config(deployment: &str, http_addr: &str) -> BenchConfig {
    let mut config = BenchConfig::new(deployment);
    config.http_url = http_addr.to_string();
    config.grpc_url = dead_endpoint();
    config.input_shape = vec![1, 3, 4, 4];
    config.protocol = Some(Protocol::Http);
    config
}
