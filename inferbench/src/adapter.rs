//! Uniform request/health/warmup operations over either an HTTP+JSON or a
//! gRPC transport against a KServe v2 inference endpoint. Callers never
//! branch on protocol beyond adapter selection.

pub(crate) mod grpc;
pub(crate) mod http;
pub(crate) mod proto;

use bytes::Bytes;
use grpc::GrpcAdapter;
use http::HttpAdapter;
use inferbench_core::{BenchConfig, HarnessError, Protocol};
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, info, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("http status: {0}")]
    Status(reqwest::StatusCode),

    #[error("grpc transport: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("grpc status: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// The fixed test input, generated once before warmup and shared read-only
/// across workers. Both wire encodings are prebuilt so that `send_one`
/// timing never includes payload construction.
#[derive(Debug, Clone)]
pub struct Payload {
    pub model_name: String,
    pub model_version: String,
    pub shape: Vec<i64>,
    /// Serialized KServe v2 JSON infer request.
    pub http_body: Bytes,
    /// The same tensor as little-endian f32 raw bytes.
    pub raw_tensor: Bytes,
}

#[derive(Serialize)]
struct HttpInferRequest<'a> {
    inputs: [HttpInputTensor<'a>; 1],
}

#[derive(Serialize)]
struct HttpInputTensor<'a> {
    name: &'a str,
    shape: &'a [i64],
    datatype: &'a str,
    data: &'a [f32],
}

impl Payload {
    /// Random FP32 tensor data in `[0, 1)`, shaped per the run config.
    pub fn generate(config: &BenchConfig) -> Self {
        let mut rng = rand::thread_rng();
        let data: Vec<f32> = (0..config.tensor_elements()).map(|_| rng.gen()).collect();
        Self::from_tensor(config, &data)
    }

    fn from_tensor(config: &BenchConfig, data: &[f32]) -> Self {
        let request = HttpInferRequest {
            inputs: [HttpInputTensor {
                name: "images",
                shape: &config.input_shape,
                datatype: "FP32",
                data,
            }],
        };
        // Serialization of a plain float slice cannot fail.
        let http_body = serde_json::to_vec(&request).unwrap_or_default();

        let mut raw = Vec::with_capacity(data.len() * 4);
        for value in data {
            raw.extend_from_slice(&value.to_le_bytes());
        }

        Self {
            model_name: config.model_name.clone(),
            model_version: config.model_version.clone(),
            shape: config.input_shape.clone(),
            http_body: Bytes::from(http_body),
            raw_tensor: Bytes::from(raw),
        }
    }
}

/// A connected transport against one endpoint. Never shared across
/// workers; every worker connects its own instance.
pub enum Adapter {
    Http(HttpAdapter),
    Grpc(GrpcAdapter),
}

impl Adapter {
    pub async fn connect(config: &BenchConfig, protocol: Protocol) -> Result<Self, RequestError> {
        match protocol {
            Protocol::Http => Ok(Adapter::Http(HttpAdapter::new(config)?)),
            Protocol::Grpc => Ok(Adapter::Grpc(GrpcAdapter::connect(config).await?)),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Adapter::Http(_) => Protocol::Http,
            Adapter::Grpc(_) => Protocol::Grpc,
        }
    }

    /// Health probe. Never errors; any failure (connection refused,
    /// timeout, non-success status) reads as not-ready.
    pub async fn probe_ready(&mut self) -> bool {
        match self {
            Adapter::Http(adapter) => adapter.probe_ready().await,
            Adapter::Grpc(adapter) => adapter.probe_ready().await,
        }
    }

    /// One measured request. The returned latency covers the wire exchange
    /// only; payload construction happened up front.
    pub async fn send_one(&mut self, payload: &Payload) -> Result<f64, RequestError> {
        match self {
            Adapter::Http(adapter) => adapter.send_one(payload).await,
            Adapter::Grpc(adapter) => adapter.send_one(payload).await,
        }
    }

    /// Issues `n` discarded requests to exclude cold-start effects from
    /// the measured phase. Returns the number of successes.
    pub async fn warmup(&mut self, payload: &Payload, n: usize) -> usize {
        let mut successes = 0;
        for i in 0..n {
            match self.send_one(payload).await {
                Ok(_) => successes += 1,
                Err(err) if i == 0 => warn!(%err, "warmup request failed"),
                Err(err) => debug!(%err, "warmup request failed"),
            }
        }
        successes
    }
}

/// Probes gRPC first, then HTTP, in that fixed order. The selection is
/// made once per run and logged; it is never retried per request.
pub async fn detect_protocol(config: &BenchConfig) -> Result<Protocol, HarnessError> {
    for protocol in [Protocol::Grpc, Protocol::Http] {
        match Adapter::connect(config, protocol).await {
            Ok(mut adapter) => {
                if adapter.probe_ready().await {
                    info!(%protocol, "auto-detected protocol");
                    return Ok(protocol);
                }
                debug!(%protocol, "endpoint connected but not ready");
            }
            Err(err) => debug!(%protocol, %err, "endpoint not reachable"),
        }
    }
    Err(HarnessError::NoProtocolAvailable)
}
