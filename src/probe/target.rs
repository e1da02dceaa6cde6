// src/probe/target.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Per-probe timeout applied when a target does not specify one.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("target host must not be empty")]
    EmptyHost,

    #[error("target port must be in 1..=65535")]
    InvalidPort,

    #[error("probe timeout must be greater than zero")]
    ZeroTimeout,
}

/// One named service endpoint subject to health probing.
///
/// Immutable once registered with an aggregator. When `path` is set the probe
/// issues an HTTP GET; otherwise a bare TCP connect establishes reachability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub path: Option<String>,
    pub timeout_ms: u64,
}

impl Target {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Result<Self, TargetError> {
        let host = host.into();
        if host.is_empty() {
            return Err(TargetError::EmptyHost);
        }
        if port == 0 {
            return Err(TargetError::InvalidPort);
        }

        Ok(Self {
            name: name.into(),
            host,
            port,
            path: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, TargetError> {
        if timeout_ms == 0 {
            return Err(TargetError::ZeroTimeout);
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Address the probe connects to.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Probe URL for HTTP targets.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        let base = Url::parse(&format!("http://{}:{}/", self.host, self.port))?;
        match &self.path {
            Some(path) => base.join(path),
            None => Ok(base),
        }
    }
}
