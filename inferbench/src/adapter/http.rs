use super::{Payload, RequestError};
use inferbench_core::{BenchConfig, PROBE_TIMEOUT};
use serde::Deserialize;
use std::time::{Duration, Instant};
#[allow(unused)]
use tracing::{debug, trace};

/// KServe v2 REST client (`/v2/health/ready`, `/v2/models/{name}/infer`).
pub struct HttpAdapter {
    client: reqwest::Client,
    health_url: String,
    infer_url: String,
    timeout: Duration,
}

/// Minimal decode target; proves the response is a well-formed infer
/// reply without touching detection contents.
#[derive(Deserialize)]
struct InferResponse {
    #[allow(dead_code)]
    outputs: Vec<OutputTensor>,
}

#[derive(Deserialize)]
struct OutputTensor {
    #[allow(dead_code)]
    name: String,
}

impl HttpAdapter {
    pub fn new(config: &BenchConfig) -> Result<Self, RequestError> {
        let timeout = config.request_timeout();
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            health_url: format!("http://{}/v2/health/ready", config.http_url),
            infer_url: format!(
                "http://{}/v2/models/{}/infer",
                config.http_url, config.model_name
            ),
            timeout,
        })
    }

    pub async fn probe_ready(&self) -> bool {
        match self
            .client
            .get(&self.health_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(%err, "http readiness probe failed");
                false
            }
        }
    }

    pub async fn send_one(&self, payload: &Payload) -> Result<f64, RequestError> {
        let request = self
            .client
            .post(&self.infer_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.http_body.clone());

        let start = Instant::now();
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                RequestError::Timeout(self.timeout)
            } else {
                RequestError::Http(err)
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }
        let body = response.bytes().await?;
        let latency_ms = start.elapsed().as_secs_f64() * 1_000.;

        // Decode validation happens outside the measured window.
        serde_json::from_slice::<InferResponse>(&body)
            .map_err(|err| RequestError::Decode(err.to_string()))?;

        Ok(latency_ms)
    }
}
