use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use loadgen_common::config::LoadgenConfig;
use loadgen_core::{rng_from_seed, BatchRequest, DeliveryRecord};
use loadgen_driver::LoadDriver;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "loadgen", version, about = "Synthetic traffic for the delivery-ETA prediction API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate load against the API (the default)
    Run(RunArgs),
    /// Serve a stub prediction API for local runs
    ServeStub(StubArgs),
    /// Print generated payloads as JSON
    Sample(SampleArgs),
    Version,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// API base address, e.g. http://localhost:8000
    #[arg(long)]
    api_base: Option<String>,
    #[arg(short, long)]
    workers: Option<usize>,
    /// Run duration in seconds
    #[arg(short, long)]
    duration: Option<u64>,
    #[arg(long)]
    min_delay_ms: Option<u64>,
    #[arg(long)]
    max_delay_ms: Option<u64>,
    /// Seed for reproducible traffic
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StubArgs {
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,
    /// Answer /health with 503
    #[arg(long)]
    unhealthy: bool,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,
    /// Print batch request bodies instead of single records
    #[arg(long)]
    batch: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(args).await,
        Commands::ServeStub(args) => serve_stub(args).await,
        Commands::Sample(args) => sample(args),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn resolve_config(args: &RunArgs) -> anyhow::Result<LoadgenConfig> {
    let mut cfg = LoadgenConfig::load().context("loading configuration")?;
    apply_overrides(&mut cfg, args);
    Ok(cfg)
}

fn apply_overrides(cfg: &mut LoadgenConfig, args: &RunArgs) {
    if let Some(v) = &args.api_base { cfg.api_base = v.clone(); }
    if let Some(v) = args.workers { cfg.workers = v; }
    if let Some(v) = args.duration { cfg.duration_secs = v; }
    if let Some(v) = args.min_delay_ms { cfg.min_delay_ms = v; }
    if let Some(v) = args.max_delay_ms { cfg.max_delay_ms = v; }
    if let Some(v) = args.seed { cfg.seed = Some(v); }
    if let Some(v) = &args.log_file { cfg.log_file = v.clone(); }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let driver = LoadDriver::new(resolve_config(&args)?)?;
    let cfg = driver.config();
    loadgen_obs::init_logging(&cfg.log_file).context("initializing logging")?;
    tracing::info!(
        api_base = %cfg.api_base,
        workers = cfg.workers,
        duration_secs = cfg.duration_secs,
        "delivery API test data generator"
    );

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("test stopped by user");
            let _ = tx.send(true);
        }
    });

    let summary = match driver.run(rx).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %e, "aborting: the API must be running and healthy");
            return Err(e.into());
        }
    };

    if let Some(path) = args.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "summary written");
    }
    Ok(())
}

async fn serve_stub(args: StubArgs) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let (app, _metrics) = loadgen_stub::app(!args.unhealthy)?;
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!("stub API listening on http://{}", args.bind);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

fn sample(args: SampleArgs) -> anyhow::Result<()> {
    let mut rng = rng_from_seed(args.seed);
    for _ in 0..args.count {
        let text = if args.batch {
            serde_json::to_string_pretty(&BatchRequest::random(&mut rng))?
        } else {
            serde_json::to_string_pretty(&DeliveryRecord::random(&mut rng))?
        };
        println!("{}", text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_default_run() {
        let cli = Cli::try_parse_from(["loadgen"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "loadgen", "run", "--api-base", "http://eta:9000", "-w", "5", "-d", "30", "--seed", "3",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else { panic!("expected run") };
        let mut cfg = LoadgenConfig::default();
        apply_overrides(&mut cfg, &args);
        assert_eq!(cfg.api_base, "http://eta:9000");
        assert_eq!(cfg.workers, 5);
        assert_eq!(cfg.duration_secs, 30);
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.max_delay_ms, 2000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn stub_defaults_to_port_8000() {
        let cli = Cli::try_parse_from(["loadgen", "serve-stub"]).unwrap();
        let Some(Commands::ServeStub(args)) = cli.command else { panic!("expected serve-stub") };
        assert_eq!(args.bind, "0.0.0.0:8000");
        assert!(!args.unhealthy);
    }
}
