// src/aggregator/registry.rs
use crate::aggregator::StatusSnapshot;
use crate::metrics::MetricsCollector;
use crate::probe::{ProbeRunner, Prober, Target};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::interval;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("target name already registered: {0}")]
    DuplicateName(String),
}

/// Owns the target registry and produces status snapshots, either on demand or
/// on a schedule.
pub struct StatusAggregator {
    targets: RwLock<Vec<Arc<Target>>>,
    prober: Arc<dyn Prober>,
    metrics: Option<Arc<MetricsCollector>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::with_prober(Arc::new(ProbeRunner::new()))
    }

    pub fn with_prober(prober: Arc<dyn Prober>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            targets: RwLock::new(Vec::new()),
            prober,
            metrics: None,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Add a target. Fails without touching the registry when the name is
    /// already taken.
    pub async fn register(&self, target: Target) -> Result<(), RegistryError> {
        let mut targets = self.targets.write().await;

        if targets.iter().any(|t| t.name == target.name) {
            return Err(RegistryError::DuplicateName(target.name));
        }

        info!(
            name = %target.name,
            authority = %target.authority(),
            "registered target"
        );
        targets.push(Arc::new(target));
        Ok(())
    }

    pub async fn target_count(&self) -> usize {
        self.targets.read().await.len()
    }

    /// Probe every registered target once, concurrently, and assemble the
    /// results into one snapshot in registration order. Individual probe
    /// failures are recorded as failing results, never propagated.
    pub async fn run_once(&self) -> StatusSnapshot {
        // Consistent view for the whole cycle; registrations wait for the lock.
        let targets: Vec<Arc<Target>> = self.targets.read().await.clone();

        let probes = targets.iter().map(|target| {
            let prober = self.prober.clone();
            let target = target.clone();
            async move { prober.probe(&target).await }
        });
        let results = join_all(probes).await;

        for result in &results {
            match &result.error {
                None => debug!(
                    name = %result.target.name,
                    latency_ms = result.latency_ms,
                    "target healthy"
                ),
                Some(err) => warn!(
                    name = %result.target.name,
                    error = %err,
                    "target unhealthy"
                ),
            }
        }

        let snapshot = StatusSnapshot::new(results);

        if let Some(metrics) = &self.metrics {
            for result in &snapshot.results {
                metrics.record_probe(result);
            }
            metrics.record_cycle(&snapshot);
        }

        info!(
            healthy = snapshot.healthy_count(),
            total = snapshot.results.len(),
            overall_ok = snapshot.overall_ok,
            "status cycle complete"
        );

        snapshot
    }

    /// Run a cycle every `every`, handing each snapshot to `on_snapshot`, until
    /// `shutdown` is called. A cancellation landing mid-cycle lets that cycle
    /// finish and still delivers its snapshot; no further cycles start.
    pub async fn run_periodically<F>(&self, every: Duration, mut on_snapshot: F)
    where
        F: FnMut(StatusSnapshot),
    {
        let mut ticker = interval(every);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!(
            interval = ?every,
            prober = self.prober.name(),
            "status watcher started"
        );

        loop {
            // Checked before selecting so a cancellation observed while a
            // cycle was running wins over any ticks queued up behind it.
            if *shutdown_rx.borrow() {
                info!("status watcher shutting down");
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.run_once().await;
                    on_snapshot(snapshot);
                }
                _ = shutdown_rx.changed() => {}
            }
        }
    }

    /// Request cancellation of `run_periodically`.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
