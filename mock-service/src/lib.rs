//! KServe-v2-shaped mock inference endpoint for integration tests:
//! `GET /v2/health/ready` and `POST /v2/models/:model/infer` with
//! configurable delay and failure injection.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Simulated inference time per request.
    pub delay: Duration,
    /// Readiness endpoint reports unavailable.
    pub fail_health: bool,
    /// Infer requests beyond this count return 500.
    pub fail_after: Option<u64>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1),
            fail_health: false,
            fail_after: None,
        }
    }
}

#[derive(Clone)]
struct MockState {
    behavior: MockBehavior,
    hits: Arc<AtomicU64>,
}

pub fn app(behavior: MockBehavior) -> Router {
    Router::new()
        .route("/v2/health/ready", get(ready))
        .route("/v2/models/:model/infer", post(infer))
        .with_state(MockState {
            behavior,
            hits: Arc::new(AtomicU64::new(0)),
        })
}

pub async fn run(addr: SocketAddr, behavior: MockBehavior) {
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app(behavior)).await.unwrap();
}

/// Binds an ephemeral port and serves in the background; returns the
/// bound address.
pub async fn spawn(behavior: MockBehavior) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(behavior)).await.unwrap();
    });
    addr
}

async fn ready(State(state): State<MockState>) -> StatusCode {
    if state.behavior.fail_health {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

async fn infer(
    State(state): State<MockState>,
    Path(model): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let n = state.hits.fetch_add(1, Ordering::Relaxed);
    if let Some(limit) = state.behavior.fail_after {
        if n >= limit {
            debug!(n, "mock infer failing by configuration");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    tokio::time::sleep(state.behavior.delay).await;
    Ok(Json(json!({
        "model_name": model,
        "model_version": "1",
        "outputs": [{
            "name": "output0",
            "datatype": "FP32",
            "shape": [1, 84, 8400],
            "data": []
        }]
    })))
}
