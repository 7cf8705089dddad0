use std::time::Duration;

pub const DEFAULT_HTTP_URL: &str = "127.0.0.1:8000";
pub const DEFAULT_GRPC_URL: &str = "127.0.0.1:8001";

pub const DEFAULT_MODEL_NAME: &str = "yolov8s";
pub const DEFAULT_MODEL_VERSION: &str = "1";

/// FP32 NCHW tensor fed to the model under test.
pub const DEFAULT_INPUT_SHAPE: [i64; 4] = [1, 3, 640, 640];

pub const DEFAULT_ITERATIONS: usize = 50;
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Warmup never exceeds this many requests, even for very large runs.
pub const MAX_WARMUP_ITERATIONS: usize = 10;
pub const MIN_WARMUP_ITERATIONS: usize = 5;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-request timeout in sequential mode.
pub const SEQUENTIAL_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request timeout in concurrent mode. Longer than the sequential one
/// since queuing delay under contention is expected and must not be
/// mistaken for a hung request.
pub const CONCURRENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Well-known name of the per-run artifact, overwritten on each run.
pub const RUN_ARTIFACT_FILE: &str = "benchmark_results.json";
