//! Gluster Exporter
//!
//! Prometheus exporter for GlusterFS.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        gluster-exporter                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │  Scheduler   │───▶│  Collectors  │───▶│   /metrics   │       │
//! │  │   (tasks)    │    │  (backend)   │    │   /healthz   │       │
//! │  └──────────────┘    └──────────────┘    └──────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gluster_exporter::config::ExporterConfig;
use gluster_exporter::error::Result;
use gluster_exporter::metrics::{MetricRegistry, DEFAULT_METRIC_TTL};
use gluster_exporter::{default_collectors, make_backend, server, Scheduler};

/// Fallback source of the instance label.
const KERNEL_HOSTNAME: &str = "/proc/sys/kernel/hostname";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Gluster Exporter - Prometheus metrics for GlusterFS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, env = "GLUSTER_EXPORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to serve metrics on (overrides the config file)
    #[arg(long, env = "GLUSTER_EXPORTER_PORT")]
    port: Option<u16>,

    /// Path metrics are served under (overrides the config file)
    #[arg(long, env = "GLUSTER_EXPORTER_METRICS_PATH")]
    metrics_path: Option<String>,

    /// Value of the instance label (defaults to the hostname)
    #[arg(long, env = "GLUSTER_EXPORTER_INSTANCE")]
    instance: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let mut config = match &args.config {
        Some(path) => ExporterConfig::from_file(path)?,
        None => ExporterConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = &args.metrics_path {
        config.metrics_path = path.clone();
    }
    config.validate()?;

    let instance = resolve_instance(&args).await;

    info!("Starting gluster-exporter");
    info!("  Management plane: {}", config.gluster_mgmt);
    info!("  Instance: {}", instance);
    info!("  Listening on port {}{}", config.port, config.metrics_path);

    let registry = Arc::new(MetricRegistry::with_options(
        config.cluster_id.clone(),
        DEFAULT_METRIC_TTL,
    ));
    let backend = make_backend(&config)?;
    let collectors = default_collectors(&registry, &instance)?;

    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new(backend, &collectors, &config, shutdown.clone());
    let handles = scheduler.start().map_err(|e| {
        error!("Failed to start collectors: {}", e);
        e
    })?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        signal_token.cancel();
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let served = server::run(addr, registry, config.metrics_path.clone(), shutdown.clone()).await;

    scheduler.shutdown();
    for handle in handles {
        if let Err(e) = handle.await {
            error!("Collector task failed: {}", e);
        }
    }

    served?;
    info!("Exporter shutdown complete");
    Ok(())
}

// =============================================================================
// Instance Label
// =============================================================================

async fn resolve_instance(args: &Args) -> String {
    if let Some(instance) = args.instance.as_deref().filter(|s| !s.is_empty()) {
        return instance.to_string();
    }
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        if !hostname.trim().is_empty() {
            return hostname.trim().to_string();
        }
    }
    match tokio::fs::read_to_string(KERNEL_HOSTNAME).await {
        Ok(hostname) if !hostname.trim().is_empty() => hostname.trim().to_string(),
        _ => "localhost".to_string(),
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
