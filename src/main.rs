use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use lbcluster::balancer::InMemoryBalancerManager;
use lbcluster::config::{Config, LoggingConfig};
use lbcluster::host::{ConfigPhase, HookRegistry, HostCapabilities, ServerContext};
use lbcluster::{DebounceState, LifecycleGate, ShutdownManager, TokioWatchdog};

#[derive(Parser)]
#[command(name = "lbcluster")]
#[command(about = "Keeps a load balancer cluster and its worker declared")]
struct Args {
    /// Configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig::init_early(args.verbose)?;

    let config = match &args.config {
        Some(path) => Config::from_file_with_env(path).await?,
        None => Config::from_toml_str("")?,
    };
    logging.apply(&config.logging, args.verbose)?;

    info!("Starting lbcluster watchdog");

    let servers: Vec<Arc<ServerContext>> = config
        .servers
        .iter()
        .map(|s| Arc::new(ServerContext::from(s)))
        .collect();

    let balancer = Arc::new(InMemoryBalancerManager::new());
    let watchdog = Arc::new(TokioWatchdog::new(config.watchdog.get_contexts()));
    let capabilities = HostCapabilities::new()
        .with_watchdog_provider(watchdog.clone())
        .with_watchdog_registrar(watchdog.clone())
        .with_balancer_manager(balancer.clone());

    let debounce = Arc::new(DebounceState::new(config.watchdog.get_debounce()));
    let gate = Arc::new(LifecycleGate::new(&config, debounce));

    let mut hooks = HookRegistry::new();
    gate.register_hooks(&mut hooks);

    for phase in [ConfigPhase::PreConfig, ConfigPhase::Running] {
        if let Err(e) = hooks.run_post_config(phase, &servers, &capabilities) {
            error!(phase = %phase, error = %e, severity = %e.severity(), "post_config failed");
            return Err(e.into());
        }
    }

    let shutdown = Arc::new(ShutdownManager::with_default_timeout());
    let tasks = watchdog.start(&shutdown)?;

    if let Err(e) = Arc::clone(&shutdown).wait_for_signal().await {
        error!(error = %e, "Shutdown did not complete cleanly");
    }

    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "Watchdog task panicked");
        }
    }

    for cluster in balancer.snapshot().await {
        info!(
            cluster = %cluster.name,
            load_method = %cluster.load_method,
            workers = cluster.workers.len(),
            "Final balancer state"
        );
    }
    if let Some(watchdog) = gate.watchdog() {
        info!(
            passes = watchdog.debounce().fire_count(),
            declarations = balancer.applied(),
            "lbcluster shutdown complete"
        );
    }

    Ok(())
}
