use mock_service::MockBehavior;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let addr: SocketAddr = "127.0.0.1:8000".parse().unwrap();
    println!("mock inference endpoint on {addr}");
    mock_service::run(addr, MockBehavior::default()).await;
}
