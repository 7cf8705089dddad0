//! Drives N requests through a protocol adapter, either one at a time or
//! via a fixed-size worker set, and hands the raw samples to the
//! statistics aggregator.

use crate::adapter::{self, Adapter, Payload};
use inferbench_core::{BenchConfig, HarnessError, Mode, Protocol, RunResult, Sample};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Set by the binary's ctrl-c handler. Workers stop dispatching new
/// requests once raised; in-flight requests drain to completion or
/// timeout before the run ends.
pub type ShutdownFlag = Arc<AtomicBool>;

/// Executes one full benchmark pass: protocol selection, readiness gate,
/// warmup, measured phase, aggregation. Per-request failures are tallied
/// and never abort the run; everything else fails the run with no
/// artifact.
pub async fn run(config: &BenchConfig, shutdown: ShutdownFlag) -> Result<RunResult, HarnessError> {
    let protocol = match config.protocol {
        Some(protocol) => protocol,
        None => adapter::detect_protocol(config).await?,
    };
    info!(
        deployment = %config.deployment_id,
        %protocol,
        mode = %config.mode(),
        iterations = config.iterations,
        concurrency = config.concurrency,
        "starting benchmark run"
    );

    let payload = Arc::new(Payload::generate(config));

    let mut adapter = Adapter::connect(config, protocol)
        .await
        .map_err(|err| HarnessError::Connectivity(err.to_string()))?;
    if !adapter.probe_ready().await {
        return Err(HarnessError::Connectivity(format!(
            "{protocol} endpoint did not report ready"
        )));
    }

    let warmup_n = config.warmup_iterations();
    debug!(warmup_n, "warming up");
    let warmup_ok = adapter.warmup(&payload, warmup_n).await;
    if warmup_ok == 0 {
        return Err(HarnessError::WarmupFailed(warmup_n));
    }
    debug!(warmup_ok, warmup_n, "warmup complete");

    let (samples, wall_time) = match config.mode() {
        Mode::Sequential => (
            run_sequential(config, adapter, &payload, &shutdown).await,
            None,
        ),
        Mode::Concurrent => {
            let (samples, elapsed) =
                run_concurrent(config, protocol, payload.clone(), &shutdown).await?;
            (samples, Some(elapsed))
        }
    };

    if shutdown.load(Ordering::Relaxed) {
        return Err(HarnessError::Interrupted);
    }

    RunResult::from_samples(
        &config.deployment_id,
        protocol,
        config.concurrency,
        &samples,
        wall_time,
    )
}

async fn run_sequential(
    config: &BenchConfig,
    mut adapter: Adapter,
    payload: &Payload,
    shutdown: &ShutdownFlag,
) -> Vec<Sample> {
    let mut progress = Progress::new(config.iterations);
    let mut samples = Vec::with_capacity(config.iterations);

    for _ in 0..config.iterations {
        if shutdown.load(Ordering::Relaxed) {
            warn!(completed = samples.len(), "interrupt requested; stopping");
            break;
        }

        match adapter.send_one(payload).await {
            Ok(latency_ms) => samples.push(Sample::success(latency_ms)),
            Err(err) => {
                let sample = Sample::failure();
                if progress.first_error() {
                    warn!(%err, "request failed");
                } else {
                    debug!(%err, "request failed");
                }
                samples.push(sample);
            }
        }
        progress.record(samples.last().copied());
    }

    samples
}

async fn run_concurrent(
    config: &BenchConfig,
    protocol: Protocol,
    payload: Arc<Payload>,
    shutdown: &ShutdownFlag,
) -> Result<(Vec<Sample>, std::time::Duration), HarnessError> {
    // Every worker owns a private transport; connecting happens before the
    // wall clock starts so setup cost is not measured.
    let mut adapters = Vec::with_capacity(config.concurrency);
    for _ in 0..config.concurrency {
        let adapter = Adapter::connect(config, protocol)
            .await
            .map_err(|err| HarnessError::Connectivity(err.to_string()))?;
        adapters.push(adapter);
    }

    let (tx, mut rx) = mpsc::channel::<Sample>(config.concurrency.max(16));
    let remaining = Arc::new(AtomicUsize::new(config.iterations));

    let started = Instant::now();
    let mut workers = Vec::with_capacity(config.concurrency);
    for mut adapter in adapters {
        let tx = tx.clone();
        let payload = payload.clone();
        let remaining = remaining.clone();
        let shutdown = shutdown.clone();

        workers.push(tokio::spawn(async move {
            loop {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                // Claim one iteration; workers exit once the budget is
                // exhausted.
                let claimed = remaining
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
                if claimed.is_err() {
                    break;
                }

                let sample = match adapter.send_one(&payload).await {
                    Ok(latency_ms) => Sample::success(latency_ms),
                    Err(err) => {
                        debug!(%err, "request failed");
                        Sample::failure()
                    }
                };
                if tx.send(sample).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx);

    // Single consumer: completion order is unspecified and samples are an
    // unordered multiset, so appends all happen here.
    let mut progress = Progress::new(config.iterations);
    let mut samples = Vec::with_capacity(config.iterations);
    while let Some(sample) = rx.recv().await {
        if !sample.ok && progress.first_error() {
            warn!("request failed (first of possibly many; rest logged at debug)");
        }
        samples.push(sample);
        progress.record(Some(sample));
    }
    let elapsed = started.elapsed();

    for worker in workers {
        let _ = worker.await;
    }

    Ok((samples, elapsed))
}

/// Observational progress reporting at ~10% checkpoints; not part of the
/// data model.
struct Progress {
    total: usize,
    checkpoint: usize,
    completed: usize,
    errors: usize,
    latency_sum_ms: f64,
    ok_count: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            checkpoint: (total / 10).max(1),
            completed: 0,
            errors: 0,
            latency_sum_ms: 0.,
            ok_count: 0,
        }
    }

    /// True only for the first failure observed.
    fn first_error(&mut self) -> bool {
        self.errors += 1;
        self.errors == 1
    }

    fn record(&mut self, sample: Option<Sample>) {
        let Some(sample) = sample else { return };
        self.completed += 1;
        if sample.ok {
            self.ok_count += 1;
            self.latency_sum_ms += sample.latency_ms;
        }

        if self.completed % self.checkpoint == 0 || self.completed == self.total {
            let mean = if self.ok_count > 0 {
                self.latency_sum_ms / self.ok_count as f64
            } else {
                0.
            };
            info!(
                completed = self.completed,
                total = self.total,
                mean_ms = format!("{mean:.2}"),
                errors = self.errors,
                "progress"
            );
        }
    }
}
