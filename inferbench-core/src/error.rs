use thiserror::Error;

/// Fatal run-level failures. Per-request errors are recovered locally by
/// the scheduler and never surface through this type.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("endpoint unreachable or readiness probe failed: {0}")]
    Connectivity(String),

    #[error("all {0} warmup requests failed")]
    WarmupFailed(usize),

    #[error("no successful samples were recorded; statistics are undefined")]
    EmptyResultSet,

    #[error("neither gRPC nor HTTP endpoint probed ready")]
    NoProtocolAvailable,

    #[error("run interrupted before completion")]
    Interrupted,

    #[error("artifact i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
