//! Ranked comparison of run results plus text rendering. Report
//! generation is a pure function of the input results, the baseline id,
//! and the explicit generation timestamp; identical inputs render
//! byte-identical bodies.

use inferbench_core::{Mode, RunResult};
use std::fmt::Write;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const RULE_HEAVY: &str =
    "================================================================================";
const RULE_LIGHT: &str =
    "--------------------------------------------------------------------------------";

const TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Run results for the same logical test, ranked ascending by mean
/// latency with the designated baseline placed last as the reference
/// point. Regenerated fresh on each report build; never persisted.
pub struct ComparisonReport {
    entries: Vec<RunResult>,
    baseline_id: Option<String>,
}

impl ComparisonReport {
    pub fn new(mut results: Vec<RunResult>, baseline_id: Option<String>) -> Self {
        results.sort_by(|a, b| {
            let a_is_baseline = Some(a.deployment_id.as_str()) == baseline_id.as_deref();
            let b_is_baseline = Some(b.deployment_id.as_str()) == baseline_id.as_deref();
            a_is_baseline
                .cmp(&b_is_baseline)
                .then(a.latency_ms.mean.total_cmp(&b.latency_ms.mean))
        });
        Self {
            entries: results,
            baseline_id,
        }
    }

    pub fn entries(&self) -> &[RunResult] {
        &self.entries
    }

    pub fn baseline(&self) -> Option<&RunResult> {
        let id = self.baseline_id.as_deref()?;
        self.entries.iter().find(|r| r.deployment_id == id)
    }

    /// `baseline mean / candidate mean`; `None` for the baseline itself or
    /// when no baseline is designated.
    pub fn speedup(&self, candidate: &RunResult) -> Option<f64> {
        let baseline = self.baseline()?;
        if baseline.deployment_id == candidate.deployment_id {
            return None;
        }
        Some(baseline.latency_ms.mean / candidate.latency_ms.mean)
    }

    /// Fastest (lowest mean latency) non-baseline entry, falling back to
    /// the baseline when it is the only entry.
    pub fn lowest_latency(&self) -> Option<&RunResult> {
        self.candidates().next().or_else(|| self.entries.first())
    }

    pub fn highest_throughput(&self) -> Option<&RunResult> {
        self.candidates()
            .max_by(|a, b| a.throughput_fps.total_cmp(&b.throughput_fps))
            .or_else(|| self.entries.first())
    }

    fn candidates(&self) -> impl Iterator<Item = &RunResult> + '_ {
        let baseline_id = self.baseline_id.clone();
        self.entries
            .iter()
            .filter(move |r| Some(r.deployment_id.as_str()) != baseline_id.as_deref())
    }

    pub fn render(&self, generated_at: OffsetDateTime) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out, "INFERENCE DEPLOYMENT BENCHMARK REPORT");
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(
            out,
            "Generated: {}",
            generated_at.format(&TIMESTAMP).unwrap_or_default()
        );

        if self.entries.is_empty() {
            let _ = writeln!(out, "\nNo benchmark results available.");
            return out;
        }

        let first = &self.entries[0];
        let _ = writeln!(out, "Runs compared: {}", self.entries.len());
        let _ = writeln!(out, "Successful iterations per run: {}", first.iterations);
        match first.mode {
            Mode::Sequential => {
                let _ = writeln!(out, "Mode: sequential (1 request at a time)");
            }
            Mode::Concurrent => {
                let _ = writeln!(
                    out,
                    "Mode: concurrent ({} workers)",
                    first.concurrency
                );
            }
        }
        let _ = writeln!(out);

        self.render_summary(&mut out);
        self.render_details(&mut out);
        self.render_analysis(&mut out);

        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out, "END OF REPORT");
        let _ = writeln!(out, "{RULE_HEAVY}");
        out
    }

    fn render_summary(&self, out: &mut String) {
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out, "PERFORMANCE SUMMARY");
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out);

        let with_speedup = self.baseline().is_some();
        if with_speedup {
            let _ = writeln!(
                out,
                "{:<16} | {:<8} | {:>10} | {:>10} | {:>9} | Speedup",
                "Deployment", "Protocol", "Mean (ms)", "P95 (ms)", "FPS"
            );
        } else {
            let _ = writeln!(
                out,
                "{:<16} | {:<8} | {:>10} | {:>10} | {:>9}",
                "Deployment", "Protocol", "Mean (ms)", "P95 (ms)", "FPS"
            );
        }
        let _ = writeln!(out, "{RULE_LIGHT}");

        for result in &self.entries {
            let base = format!(
                "{:<16} | {:<8} | {:>10.2} | {:>10.2} | {:>9.1}",
                result.deployment_id,
                result.protocol.to_string().to_uppercase(),
                result.latency_ms.mean,
                result.latency_ms.p95,
                result.throughput_fps,
            );
            if with_speedup {
                match self.speedup(result) {
                    Some(speedup) => {
                        let _ = writeln!(out, "{base} | {speedup:.2}x");
                    }
                    None => {
                        let _ = writeln!(out, "{base} | baseline");
                    }
                }
            } else {
                let _ = writeln!(out, "{base}");
            }
        }
        let _ = writeln!(out);
    }

    fn render_details(&self, out: &mut String) {
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out, "DETAILED RESULTS");
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out);

        for result in &self.entries {
            let _ = writeln!(out, "{RULE_LIGHT}");
            let _ = writeln!(
                out,
                "{} ({}, {})",
                result.deployment_id,
                result.protocol.to_string().to_uppercase(),
                result.mode
            );
            let _ = writeln!(out, "{RULE_LIGHT}");
            out.push_str(&render_detail_block(result));
            let _ = writeln!(out);
        }
    }

    fn render_analysis(&self, out: &mut String) {
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out, "ANALYSIS & RECOMMENDATIONS");
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out);

        let Some(fastest) = self.lowest_latency() else {
            return;
        };
        // entries() is non-empty here, so both rank holders exist.
        let Some(throughput) = self.highest_throughput() else {
            return;
        };

        let _ = writeln!(
            out,
            "Lowest latency:     {} ({:.2} ms mean)",
            fastest.deployment_id, fastest.latency_ms.mean
        );
        let _ = writeln!(
            out,
            "Highest throughput: {} ({:.1} FPS)",
            throughput.deployment_id, throughput.throughput_fps
        );
        if let Some(baseline) = self.baseline() {
            let _ = writeln!(
                out,
                "Baseline:           {} ({:.2} ms mean)",
                baseline.deployment_id, baseline.latency_ms.mean
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Recommendations:");
        let _ = writeln!(
            out,
            "  1. For latency-sensitive workloads, deploy {} ({:.2} ms mean).",
            fastest.deployment_id, fastest.latency_ms.mean
        );
        let _ = writeln!(
            out,
            "  2. For throughput-oriented workloads, deploy {} ({:.1} FPS).",
            throughput.deployment_id, throughput.throughput_fps
        );
        if let Some(baseline) = self.baseline() {
            if let Some(speedup) = self.speedup(fastest) {
                let _ = writeln!(
                    out,
                    "  3. {} is the reference baseline; {} runs {:.2}x faster.",
                    baseline.deployment_id, fastest.deployment_id, speedup
                );
            }
        }
        let _ = writeln!(out);
    }
}

/// The per-run block echoed after each successful run and reused in the
/// report detail section.
pub fn render_run(result: &RunResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "Results: {}", result.deployment_id);
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Protocol: {}", result.protocol.to_string().to_uppercase());
    let _ = writeln!(out, "Mode: {}", result.mode);
    let _ = writeln!(out, "Iterations: {}", result.iterations);
    let _ = writeln!(out);
    out.push_str(&render_detail_block(result));
    out
}

fn render_detail_block(result: &RunResult) -> String {
    let mut out = String::new();
    let lat = &result.latency_ms;
    let _ = writeln!(out, "  Latency (ms):");
    let _ = writeln!(out, "    Min:     {:>8.2}", lat.min);
    let _ = writeln!(out, "    Mean:    {:>8.2}", lat.mean);
    let _ = writeln!(out, "    Median:  {:>8.2}", lat.median);
    let _ = writeln!(out, "    P90:     {:>8.2}", lat.p90);
    let _ = writeln!(out, "    P95:     {:>8.2}", lat.p95);
    let _ = writeln!(out, "    P99:     {:>8.2}", lat.p99);
    let _ = writeln!(out, "    Max:     {:>8.2}", lat.max);
    let _ = writeln!(out, "  Throughput: {:>8.1} FPS", result.throughput_fps);
    if let Some(avg_fps) = result.avg_latency_fps {
        let _ = writeln!(out, "  Avg FPS (from latency): {avg_fps:.1}");
    }
    if result.mode == Mode::Concurrent {
        let _ = writeln!(out, "  Concurrency: {} workers", result.concurrency);
    }
    let _ = writeln!(out, "  Total time: {:>8.2} sec", result.total_time_sec);
    if result.errors > 0 {
        let _ = writeln!(
            out,
            "  Errors: {} ({:.1}% of requests)",
            result.errors,
            result.error_rate() * 100.
        );
    }
    out
}
