// src/config/models.rs
use crate::probe::{Target, TargetError, DEFAULT_TIMEOUT_MS};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_interval_secs() -> u64 {
    5
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            listen: default_listen(),
        }
    }
}

impl TargetConfig {
    /// Unnamed targets fall back to `host:port`.
    pub fn into_target(self) -> Result<Target, TargetError> {
        let name = self
            .name
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port));

        let mut target =
            Target::new(name, self.host, self.port)?.with_timeout_ms(self.timeout_ms)?;
        if let Some(path) = self.path {
            target = target.with_path(path);
        }
        Ok(target)
    }
}

impl Config {
    /// Explicit single-target configuration built from the environment:
    /// `HOST` (default "0.0.0.0"), `PORT` (default 3000), `TIMEOUT_MS`
    /// (default 2000).
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .context("PORT must be an integer in 1..=65535")?,
            Err(_) => DEFAULT_PORT,
        };

        let timeout_ms = match std::env::var("TIMEOUT_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("TIMEOUT_MS must be a positive integer")?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            targets: vec![TargetConfig {
                name: None,
                host,
                port,
                path: None,
                timeout_ms,
            }],
            watch: WatchConfig::default(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();

        for target in &self.targets {
            let target = target.clone().into_target().context("invalid target")?;
            if !names.insert(target.name.clone()) {
                anyhow::bail!("duplicate target name in config: {}", target.name);
            }
        }

        if self.watch.interval_secs == 0 {
            anyhow::bail!("watch interval must be greater than zero");
        }
        self.watch
            .listen
            .parse::<SocketAddr>()
            .context("watch listen address is invalid")?;

        Ok(())
    }

    /// Materialize validated targets in declaration order.
    pub fn build_targets(&self) -> Result<Vec<Target>> {
        self.targets
            .iter()
            .cloned()
            .map(|t| t.into_target().map_err(Into::into))
            .collect()
    }
}
