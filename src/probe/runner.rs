// src/probe/runner.rs
use crate::probe::Target;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, Serializer};
use std::io;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::time::Instant;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

/// Why a probe did not pass. Carried inside a `ProbeResult`, never raised.
///
/// The `Display` strings are the canonical diagnostic form and appear verbatim
/// in logs, snapshots, and serialized output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeFailure {
    #[error("timeout")]
    Timeout,

    #[error("connection-refused")]
    ConnectionRefused,

    #[error("dns-failure")]
    DnsFailure,

    #[error("unexpected-status({0})")]
    UnexpectedStatus(u16),
}

impl ProbeFailure {
    /// Class label without the status-code detail, suitable as a metric label.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection-refused",
            Self::DnsFailure => "dns-failure",
            Self::UnexpectedStatus(_) => "unexpected-status",
        }
    }
}

impl Serialize for ProbeFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of one probe invocation. Created fresh every time, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub target: Target,
    pub ok: bool,
    pub status_code: Option<u16>,
    pub latency_ms: u64,
    pub error: Option<ProbeFailure>,
}

impl ProbeResult {
    pub fn pass(target: Target, status_code: Option<u16>, latency_ms: u64) -> Self {
        Self {
            target,
            ok: true,
            status_code,
            latency_ms,
            error: None,
        }
    }

    pub fn fail(target: Target, error: ProbeFailure, latency_ms: u64) -> Self {
        let status_code = match error {
            ProbeFailure::UnexpectedStatus(code) => Some(code),
            _ => None,
        };

        Self {
            target,
            ok: false,
            status_code,
            latency_ms,
            error: Some(error),
        }
    }
}

/// Seam between the aggregator and the network, so cycles can be exercised
/// against scripted probers in tests.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> ProbeResult;

    fn name(&self) -> &'static str;
}

/// Default prober: DNS resolution, then a bare TCP connect or an HTTP GET
/// depending on whether the target carries a path. The whole attempt is bounded
/// by the target's timeout; every outcome, success or failure, comes back as a
/// `ProbeResult`.
pub struct ProbeRunner {
    client: Client,
    success: RangeInclusive<u16>,
}

impl ProbeRunner {
    pub fn new() -> Self {
        Self::with_success_range(200..=200)
    }

    /// Accept any status code in `success` instead of exactly 200.
    pub fn with_success_range(success: RangeInclusive<u16>) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self { client, success }
    }

    async fn attempt(&self, target: &Target) -> Result<Option<u16>, ProbeFailure> {
        let addr = resolve(target).await?;

        match &target.path {
            None => {
                TcpStream::connect(addr)
                    .await
                    .map_err(|e| classify_io(&e))?;
                Ok(None)
            }
            Some(_) => {
                let url = target.url().map_err(|_| ProbeFailure::DnsFailure)?;
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| classify_reqwest(&e))?;

                let code = response.status().as_u16();
                if self.success.contains(&code) {
                    Ok(Some(code))
                } else {
                    Err(ProbeFailure::UnexpectedStatus(code))
                }
            }
        }
    }
}

#[async_trait]
impl Prober for ProbeRunner {
    async fn probe(&self, target: &Target) -> ProbeResult {
        let started = Instant::now();
        let outcome = timeout(target.timeout(), self.attempt(target)).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        debug!(
            name = %target.name,
            authority = %target.authority(),
            latency_ms,
            "probe finished"
        );

        match outcome {
            Ok(Ok(status_code)) => ProbeResult::pass(target.clone(), status_code, latency_ms),
            Ok(Err(failure)) => ProbeResult::fail(target.clone(), failure, latency_ms),
            // The attempt itself outran the deadline.
            Err(_) => ProbeResult::fail(target.clone(), ProbeFailure::Timeout, latency_ms),
        }
    }

    fn name(&self) -> &'static str {
        "tcp-http"
    }
}

async fn resolve(target: &Target) -> Result<SocketAddr, ProbeFailure> {
    let mut addrs = lookup_host((target.host.as_str(), target.port))
        .await
        .map_err(|_| ProbeFailure::DnsFailure)?;

    addrs.next().ok_or(ProbeFailure::DnsFailure)
}

fn classify_io(err: &io::Error) -> ProbeFailure {
    match err.kind() {
        io::ErrorKind::TimedOut => ProbeFailure::Timeout,
        // Resets, unreachable hosts and the rest of the I/O tail count as the
        // endpoint not accepting us.
        _ => ProbeFailure::ConnectionRefused,
    }
}

fn classify_reqwest(err: &reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        ProbeFailure::Timeout
    } else {
        ProbeFailure::ConnectionRefused
    }
}
