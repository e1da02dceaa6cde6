// src/metrics/collector.rs
use crate::aggregator::StatusSnapshot;
use crate::probe::ProbeResult;
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        buffer
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_latency_seconds: HistogramVec,
    pub target_up: IntGaugeVec,

    // Cycle metrics
    pub healthy_targets: IntGauge,
    pub registered_targets: IntGauge,
    pub cycles_total: IntCounter,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("sw_probes_total", "Total probes by outcome class"),
            &["target", "outcome"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_latency_seconds = HistogramVec::new(
            HistogramOpts::new("sw_probe_latency_seconds", "Probe latency in seconds"),
            &["target"],
        )?;
        registry.register(Box::new(probe_latency_seconds.clone()))?;

        let target_up = IntGaugeVec::new(
            Opts::new("sw_target_up", "Target health (1=ok, 0=not ok)"),
            &["target"],
        )?;
        registry.register(Box::new(target_up.clone()))?;

        let healthy_targets =
            IntGauge::new("sw_healthy_targets", "Number of healthy targets")?;
        registry.register(Box::new(healthy_targets.clone()))?;

        let registered_targets =
            IntGauge::new("sw_registered_targets", "Number of registered targets")?;
        registry.register(Box::new(registered_targets.clone()))?;

        let cycles_total =
            IntCounter::new("sw_probe_cycles_total", "Completed aggregation cycles")?;
        registry.register(Box::new(cycles_total.clone()))?;

        Ok(Self {
            probes_total,
            probe_latency_seconds,
            target_up,
            healthy_targets,
            registered_targets,
            cycles_total,
        })
    }

    pub fn record_probe(&self, result: &ProbeResult) {
        let outcome = match &result.error {
            None => "ok",
            Some(err) => err.class(),
        };

        self.probes_total
            .with_label_values(&[result.target.name.as_str(), outcome])
            .inc();

        self.probe_latency_seconds
            .with_label_values(&[result.target.name.as_str()])
            .observe(result.latency_ms as f64 / 1000.0);

        self.target_up
            .with_label_values(&[result.target.name.as_str()])
            .set(i64::from(result.ok));
    }

    pub fn record_cycle(&self, snapshot: &StatusSnapshot) {
        self.cycles_total.inc();
        self.healthy_targets.set(snapshot.healthy_count() as i64);
        self.registered_targets.set(snapshot.results.len() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeFailure, Target};

    #[test]
    fn test_record_and_gather() {
        let registry = MetricsRegistry::new().unwrap();
        let collector = registry.collector();

        let target = Target::new("etcd", "127.0.0.1", 2379).unwrap();
        collector.record_probe(&ProbeResult::pass(target.clone(), None, 4));
        collector.record_probe(&ProbeResult::fail(
            target.clone(),
            ProbeFailure::ConnectionRefused,
            2,
        ));
        collector.record_cycle(&StatusSnapshot::new(vec![ProbeResult::pass(
            target, None, 4,
        )]));

        let text = String::from_utf8(registry.gather()).unwrap();
        assert!(text.contains("sw_probes_total"));
        assert!(text.contains("connection-refused"));
        assert!(text.contains("sw_probe_cycles_total 1"));
    }
}
