use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use inferbench::adapter;
use inferbench::report::{self, ComparisonReport};
use inferbench::scheduler;
use inferbench::store::ResultStore;
use inferbench_core::{BenchConfig, Protocol};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inferbench", version, about = "Benchmark harness for HTTP/gRPC inference endpoints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a benchmark against a single deployment
    Run {
        /// Number of measured requests
        #[arg(default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
        iterations: u32,

        /// Wire protocol, or auto-detect (gRPC probed first)
        #[arg(default_value_t = ProtocolArg::Auto, value_enum)]
        protocol: ProtocolArg,

        /// Concurrent worker count (1 = sequential)
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        concurrency: u32,

        /// Deployment identifier recorded in the run artifact
        #[arg(long, default_value = "default")]
        deployment: String,

        #[arg(long, default_value = inferbench_core::DEFAULT_HTTP_URL)]
        http_url: String,

        #[arg(long, default_value = inferbench_core::DEFAULT_GRPC_URL)]
        grpc_url: String,

        #[arg(long, default_value = inferbench_core::DEFAULT_MODEL_NAME)]
        model: String,

        #[arg(long, default_value = inferbench_core::DEFAULT_MODEL_VERSION)]
        model_version: String,

        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },

    /// Build a ranked comparison report from stored run artifacts
    Report {
        /// Run artifact paths, one per deployment
        #[arg(required = true)]
        artifacts: Vec<PathBuf>,

        /// Deployment id used as the speedup reference point
        #[arg(long)]
        baseline: Option<String>,

        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ProtocolArg {
    Auto,
    Http,
    Grpc,
}

impl std::fmt::Display for ProtocolArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolArg::Auto => write!(f, "auto"),
            ProtocolArg::Http => write!(f, "http"),
            ProtocolArg::Grpc => write!(f, "grpc"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run {
            iterations,
            protocol,
            concurrency,
            deployment,
            http_url,
            grpc_url,
            model,
            model_version,
            output_dir,
        } => {
            let mut config = BenchConfig::new(&deployment);
            config.iterations = iterations as usize;
            config.concurrency = concurrency as usize;
            config.http_url = http_url;
            config.grpc_url = grpc_url;
            config.model_name = model;
            config.model_version = model_version;
            config.protocol = match protocol {
                ProtocolArg::Auto => None,
                ProtocolArg::Http => Some(Protocol::Http),
                ProtocolArg::Grpc => Some(Protocol::Grpc),
            };

            if config.protocol.is_none() {
                // Decided once up front so the choice is visible even if
                // the run later fails.
                let detected = adapter::detect_protocol(&config).await?;
                config.protocol = Some(detected);
            }

            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("interrupt received; draining in-flight requests");
                        shutdown.store(true, Ordering::Relaxed);
                    }
                });
            }

            let result = scheduler::run(&config, shutdown).await?;
            println!("{}", report::render_run(&result));

            let store = ResultStore::new(&output_dir);
            let path = store.save(&result)?;
            info!(path = %path.display(), "run artifact written");
            Ok(())
        }

        Command::Report {
            artifacts,
            baseline,
            output_dir,
        } => {
            let mut results = Vec::with_capacity(artifacts.len());
            for path in &artifacts {
                let result = ResultStore::load(path)
                    .with_context(|| format!("loading {}", path.display()))?;
                results.push(result);
            }
            if let Some(id) = &baseline {
                if !results.iter().any(|r| &r.deployment_id == id) {
                    bail!("baseline deployment '{id}' not found among the loaded artifacts");
                }
            }

            let aggregate: BTreeMap<String, _> = results
                .iter()
                .map(|r| (r.deployment_id.clone(), r.clone()))
                .collect();

            let generated_at = OffsetDateTime::now_utc();
            let comparison = ComparisonReport::new(results, baseline);
            let body = comparison.render(generated_at);
            println!("{body}");

            let store = ResultStore::new(&output_dir);
            let aggregate_path = store.save_aggregate(&aggregate, generated_at)?;
            let report_path = store.save_report(&body, generated_at)?;
            info!(path = %aggregate_path.display(), "aggregate artifact written");
            info!(path = %report_path.display(), "report written");
            Ok(())
        }
    }
}
