#![forbid(unsafe_code)]

use airlock::{config, telemetry, AirlockRunner};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Security airlock: fail-closed Ethernet frame guard")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "config/basic.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match config::load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            // Tracing isn't initialized yet; a config load failure means
            // we don't even know the requested log level.
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = telemetry::init_tracing_with_otel(
        cfg.logging.level.clone(),
        cfg.logging.show_target,
        cfg.telemetry.otel_log_level.clone(),
    ) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    info!(
        ingress = ?cfg.ingress_listen,
        egress = ?cfg.egress_connect,
        egress_mode = cfg.egress_mode,
        "configuration loaded"
    );

    let locked_flag = Arc::new(AtomicBool::new(false));
    let cfg = Arc::new(cfg);

    if let Some(port) = cfg.telemetry.metrics_port {
        let (metrics, registry) = match telemetry::init_metrics() {
            Ok(pair) => pair,
            Err(err) => {
                error!(%err, "failed to initialize metrics");
                std::process::exit(1);
            }
        };
        let locked_flag = locked_flag.clone();
        tokio::spawn(async move {
            if let Err(err) = telemetry::start_observability_server(port, registry, locked_flag).await
            {
                error!(%err, "observability server exited with error");
            }
        });
        run_and_exit(cfg, metrics, locked_flag).await;
    } else {
        let (metrics, _registry) = match telemetry::init_metrics() {
            Ok(pair) => pair,
            Err(err) => {
                error!(%err, "failed to initialize metrics");
                std::process::exit(1);
            }
        };
        run_and_exit(cfg, metrics, locked_flag).await;
    }
}

async fn run_and_exit(
    cfg: Arc<config::RunnerConfig>,
    metrics: Arc<telemetry::Metrics>,
    locked_flag: Arc<AtomicBool>,
) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = signal::ctrl_c() => info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    let runner = AirlockRunner::new(cfg, metrics, locked_flag);
    if let Err(err) = runner.run(shutdown_rx).await {
        error!(%err, "airlock runner exited with error");
        std::process::exit(1);
    }
}
