use anyhow::Context;
use clap::Parser;
use pingbench_server::config::{DEFAULT_FAILURE_RATE, DEFAULT_FIXED_UNARY_DELAY, DEFAULT_LISTEN_ADDR};
use pingbench_server::{Server, ServerConfig, SimulatorConfig, UnaryMode};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pingbench-server", about = "Simulated ping endpoint with delay and failure injection")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: SocketAddr,

    /// Fraction of requests that fail with a simulated error.
    #[arg(long, default_value_t = DEFAULT_FAILURE_RATE)]
    failure_rate: f64,

    /// Seed for the delay/failure generator; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Serve unary pings with a fixed 5 ms delay instead of simulated processing.
    #[arg(long)]
    fixed_unary: bool,

    /// Log every handled stream message.
    #[arg(long)]
    debug: bool,

    /// Log every received request.
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
        EnvFilter::new(format!("warn,pingbench_server={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug, args.verbose);

    if !(0.0..=1.0).contains(&args.failure_rate) {
        anyhow::bail!("--failure-rate must be within [0, 1], got {}", args.failure_rate);
    }

    let mut config = ServerConfig::new(args.listen);
    config.simulator = SimulatorConfig { failure_rate: args.failure_rate, ..SimulatorConfig::default() };
    config.seed = args.seed;
    if args.fixed_unary {
        config.unary_mode = UnaryMode::Fixed(DEFAULT_FIXED_UNARY_DELAY);
    }

    let (ready_tx, _ready_rx) = tokio::sync::oneshot::channel();
    Server::new(config)
        .run(ready_tx)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("ping endpoint stopped")?;
    Ok(())
}
