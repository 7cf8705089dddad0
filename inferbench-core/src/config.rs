use crate::{
    Mode, Protocol, CONCURRENT_REQUEST_TIMEOUT, DEFAULT_CONCURRENCY, DEFAULT_GRPC_URL,
    DEFAULT_HTTP_URL, DEFAULT_INPUT_SHAPE, DEFAULT_ITERATIONS, DEFAULT_MODEL_NAME,
    DEFAULT_MODEL_VERSION, MAX_WARMUP_ITERATIONS, MIN_WARMUP_ITERATIONS,
    SEQUENTIAL_REQUEST_TIMEOUT,
};
use std::time::Duration;

/// Configuration for a single benchmark run, constructed by the caller and
/// handed to the scheduler. There is no process-wide registry; every run is
/// self-contained.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub deployment_id: String,
    pub http_url: String,
    pub grpc_url: String,
    pub model_name: String,
    pub model_version: String,
    pub input_shape: Vec<i64>,
    /// `None` selects protocol auto-detection (gRPC probed first).
    pub protocol: Option<Protocol>,
    pub iterations: usize,
    pub concurrency: usize,
}

impl BenchConfig {
    pub fn new(deployment_id: &str) -> Self {
        Self {
            deployment_id: deployment_id.to_string(),
            http_url: DEFAULT_HTTP_URL.to_string(),
            grpc_url: DEFAULT_GRPC_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            input_shape: DEFAULT_INPUT_SHAPE.to_vec(),
            protocol: None,
            iterations: DEFAULT_ITERATIONS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.concurrency > 1 {
            Mode::Concurrent
        } else {
            Mode::Sequential
        }
    }

    /// Warmup scales with the run size but is bounded both ways so large
    /// runs don't pay an outsized startup cost.
    pub fn warmup_iterations(&self) -> usize {
        (self.iterations / 20).clamp(MIN_WARMUP_ITERATIONS, MAX_WARMUP_ITERATIONS)
    }

    pub fn request_timeout(&self) -> Duration {
        match self.mode() {
            Mode::Sequential => SEQUENTIAL_REQUEST_TIMEOUT,
            Mode::Concurrent => CONCURRENT_REQUEST_TIMEOUT,
        }
    }

    pub fn tensor_elements(&self) -> usize {
        self.input_shape.iter().product::<i64>() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_scales_with_iterations() {
        let mut config = BenchConfig::new("test");

        config.iterations = 50;
        assert_eq!(config.warmup_iterations(), 5);

        config.iterations = 100;
        assert_eq!(config.warmup_iterations(), 5);

        config.iterations = 160;
        assert_eq!(config.warmup_iterations(), 8);

        config.iterations = 1_000;
        assert_eq!(config.warmup_iterations(), 10);

        config.iterations = 1;
        assert_eq!(config.warmup_iterations(), 5);
    }

    #[test]
    fn mode_follows_concurrency() {
        let mut config = BenchConfig::new("test");
        assert_eq!(config.mode(), Mode::Sequential);
        assert_eq!(config.request_timeout(), SEQUENTIAL_REQUEST_TIMEOUT);

        config.concurrency = 8;
        assert_eq!(config.mode(), Mode::Concurrent);
        assert_eq!(config.request_timeout(), CONCURRENT_REQUEST_TIMEOUT);
    }
}
