use anyhow::{bail, Context};
use clap::Parser;
use pingbench_client::{ClientConfig, HttpChannel};
use pingbench_common::{PingChannel, RpcShape};
use pingbench_load::config::{
    BenchmarkConfig, ShapeSelection, DEFAULT_CONCURRENCY, DEFAULT_TOTAL_REQUESTS,
};
use pingbench_load::report::{print_report, print_server_stats, BenchmarkReport};
use pingbench_load::scenario::LoadScenario;
use pingbench_load::worker;
use pingbench_server::config::DEFAULT_FAILURE_RATE;
use pingbench_server::{LocalChannel, ServerConfig, SimulatorConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pingbench", about = "Latency benchmark for the ping service")]
struct Args {
    /// Total requests per shape, split evenly across workers
    #[arg(long, default_value_t = DEFAULT_TOTAL_REQUESTS)]
    requests: usize,

    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Inter-request pacing of every worker
    #[arg(long, value_enum, default_value_t = LoadScenario::Constant)]
    scenario: LoadScenario,

    /// Interaction shape to drive; `all` runs each in turn
    #[arg(long, value_enum, default_value_t = ShapeSelection::Unary)]
    shape: ShapeSelection,

    /// Per-call timeout; 0s disables it
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5s")]
    timeout: Duration,

    /// Seed for pacing (and the in-process endpoint); random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Base URL of a running endpoint; an in-process endpoint is used when omitted
    #[arg(long)]
    target: Option<String>,

    /// Failure rate of the in-process endpoint
    #[arg(long, default_value_t = DEFAULT_FAILURE_RATE)]
    failure_rate: f64,

    /// Print reports as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log per-worker failures
    #[arg(long)]
    debug: bool,

    /// Log every call and reply
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(debug: bool, verbose: bool) {
    let level = if verbose {
        "trace"
    } else if debug {
        "debug"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,pingbench={level},pingbench_load={level},pingbench_client={level},pingbench_server={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug, args.verbose);

    let shapes = args.shape.shapes();

    let template = BenchmarkConfig {
        total_requests: args.requests,
        concurrency: args.concurrency,
        scenario: args.scenario,
        shape: shapes[0],
        call_timeout: Some(args.timeout).filter(|t| !t.is_zero()),
        seed: args.seed,
    };
    template.validate()?;

    match &args.target {
        Some(base_url) => {
            info!(%base_url, "benchmarking remote endpoint");
            let channel = HttpChannel::new(ClientConfig { base_url: base_url.clone() });
            drive(Arc::new(channel), &shapes, template, args.json).await
        }
        None => {
            if !(0.0..=1.0).contains(&args.failure_rate) {
                bail!("--failure-rate must be within [0, 1], got {}", args.failure_rate);
            }
            info!("benchmarking in-process endpoint");
            let mut server = ServerConfig::new(([127, 0, 0, 1], 0).into());
            server.simulator = SimulatorConfig { failure_rate: args.failure_rate, ..SimulatorConfig::default() };
            server.seed = args.seed;
            let channel = LocalChannel::new(server.build_service());
            drive(Arc::new(channel), &shapes, template, args.json).await
        }
    }
}

/// Run every requested shape in turn, then report the endpoint's own statistics.
async fn drive<C: PingChannel>(
    channel: Arc<C>,
    shapes: &[RpcShape],
    template: BenchmarkConfig,
    json: bool,
) -> anyhow::Result<()> {
    let mut reports: Vec<BenchmarkReport> = Vec::new();
    for &shape in shapes {
        if !channel.supports(shape) {
            if shapes.len() == 1 {
                bail!("shape {shape} is not supported by this endpoint");
            }
            warn!(%shape, "skipping shape not supported by this endpoint");
            continue;
        }
        let config = BenchmarkConfig { shape, ..template };
        let report = worker::run(Arc::clone(&channel), config)
            .await
            .with_context(|| format!("{shape} benchmark failed"))?;
        if !json {
            print_report(&report);
        }
        reports.push(report);
    }

    let stats = channel.stats().await.context("failed to query endpoint stats")?;
    if json {
        let output = serde_json::json!({ "runs": reports, "endpoint": stats });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_server_stats(&stats);
    }
    Ok(())
}
