// src/main.rs
use anyhow::Result;
use stackwatch::aggregator::{StatusAggregator, StatusBoard};
use stackwatch::config::{self, Config};
use stackwatch::metrics::MetricsRegistry;
use stackwatch::server::{StatusHandler, StatusServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stackwatch=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "check".to_string());
    let config_path = args.next();

    let config = match &config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            config::load_config(path).await?
        }
        None => Config::from_env()?,
    };

    match mode.as_str() {
        "check" => check(config).await,
        "watch" => watch(config).await,
        other => {
            anyhow::bail!("unknown mode {other}; usage: stackwatch [check|watch] [config-file]")
        }
    }
}

/// One aggregation cycle; the exit code is the liveness signal.
async fn check(config: Config) -> Result<()> {
    let aggregator = StatusAggregator::new();
    for target in config.build_targets()? {
        aggregator.register(target).await?;
    }

    let snapshot = aggregator.run_once().await;
    print!("{}", snapshot.render_plain());
    std::process::exit(snapshot.exit_code());
}

/// Periodic cycles plus the status/metrics server, until a shutdown signal.
async fn watch(config: Config) -> Result<()> {
    let listen: SocketAddr = config.watch.listen.parse()?;
    let interval = Duration::from_secs(config.watch.interval_secs);

    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let aggregator =
        Arc::new(StatusAggregator::new().with_metrics(metrics_registry.collector()));
    for target in config.build_targets()? {
        aggregator.register(target).await?;
    }

    let board = Arc::new(StatusBoard::new());

    let handler = StatusHandler::new(board.clone(), metrics_registry.clone());
    tokio::spawn(async move {
        if let Err(e) = StatusServer::new(listen, handler).serve().await {
            error!("status server error: {}", e);
        }
    });

    let watcher = {
        let aggregator = aggregator.clone();
        let board = board.clone();
        tokio::spawn(async move {
            aggregator
                .run_periodically(interval, move |snapshot| board.publish(snapshot))
                .await;
        })
    };

    shutdown_signal().await;
    aggregator.shutdown();
    watcher.await?;

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
