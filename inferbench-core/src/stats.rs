use crate::{HarnessError, Mode, Protocol, Sample};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency summary over the successful samples of one run, in
/// milliseconds. Computed once; immutable afterwards.
///
/// Percentiles use the nearest-rank rule (`floor(k * p)` into the
/// ascending-sorted sample set, clamped to the last index), which makes
/// them deterministic and reproducible. The median is p50 under the same
/// rule, not an averaged midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatencyStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencyStatistics {
    /// Fails with [`HarnessError::EmptyResultSet`] on an empty input;
    /// statistics over zero samples are undefined, never defaulted.
    pub fn from_latencies(latencies: &[f64]) -> Result<Self, HarnessError> {
        if latencies.is_empty() {
            return Err(HarnessError::EmptyResultSet);
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_by(f64::total_cmp);

        let sum: f64 = sorted.iter().sum();
        let p50 = nearest_rank(&sorted, 0.50);

        Ok(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: sum / sorted.len() as f64,
            median: p50,
            p50,
            p90: nearest_rank(&sorted, 0.90),
            p95: nearest_rank(&sorted, 0.95),
            p99: nearest_rank(&sorted, 0.99),
        })
    }
}

fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let index = (sorted.len() as f64 * p) as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// One benchmark execution, written once to the result store and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunResult {
    pub deployment_id: String,
    pub protocol: Protocol,
    pub mode: Mode,
    pub concurrency: usize,
    /// Successful sample count.
    pub iterations: usize,
    pub errors: usize,
    pub total_time_sec: f64,
    #[serde(rename = "latency")]
    pub latency_ms: LatencyStatistics,
    pub throughput_fps: f64,
    /// Theoretical single-stream rate (`1000 / mean`), reported alongside
    /// the observed throughput in concurrent mode for comparability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_latency_fps: Option<f64>,
}

impl RunResult {
    /// Aggregates the raw outcomes of one scheduler pass.
    ///
    /// Sequential runs report `1000 / mean` as throughput with the total
    /// time being the sum of observed latencies (there is no inter-request
    /// overlap to measure). Concurrent runs report observed throughput
    /// over the wall-clock span handed in by the scheduler.
    pub fn from_samples(
        deployment_id: &str,
        protocol: Protocol,
        concurrency: usize,
        samples: &[Sample],
        wall_time: Option<Duration>,
    ) -> Result<Self, HarnessError> {
        let latencies: Vec<f64> = samples
            .iter()
            .filter(|s| s.ok)
            .map(|s| s.latency_ms)
            .collect();
        let errors = samples.len() - latencies.len();

        let latency_ms = LatencyStatistics::from_latencies(&latencies)?;
        let mode = if concurrency > 1 {
            Mode::Concurrent
        } else {
            Mode::Sequential
        };

        let (total_time_sec, throughput_fps, avg_latency_fps) = match (mode, wall_time) {
            (Mode::Sequential, _) => {
                let total = latencies.iter().sum::<f64>() / 1_000.;
                (total, 1_000. / latency_ms.mean, None)
            }
            (Mode::Concurrent, Some(elapsed)) => {
                let total = elapsed.as_secs_f64();
                (
                    total,
                    latencies.len() as f64 / total,
                    Some(1_000. / latency_ms.mean),
                )
            }
            // The scheduler always measures a wall clock in concurrent
            // mode; a missing one means the sample set is unusable.
            (Mode::Concurrent, None) => return Err(HarnessError::EmptyResultSet),
        };

        Ok(Self {
            deployment_id: deployment_id.to_string(),
            protocol,
            mode,
            concurrency,
            iterations: latencies.len(),
            errors,
            total_time_sec,
            latency_ms,
            throughput_fps,
            avg_latency_fps,
        })
    }

    pub fn error_rate(&self) -> f64 {
        let total = self.iterations + self.errors;
        if total == 0 {
            0.
        } else {
            self.errors as f64 / total as f64
        }
    }
}
