use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::beat::{parse_targets, Target};

/// Top-level configuration for the exporter.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Logging verbosity (trace, debug, info, warn, error). Default: "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format. Default: text.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Scrape server configuration.
    #[serde(default)]
    pub web: WebConfig,

    /// Upstream beat configuration.
    #[serde(default)]
    pub beat: BeatConfig,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Scrape server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Address to listen on. `:port` binds on all interfaces. Default: ":9479".
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Path under which metrics are exposed. Default: "/metrics".
    #[serde(default = "default_telemetry_path")]
    pub telemetry_path: String,

    /// TLS termination. Disabled unless both files are set.
    #[serde(default)]
    pub tls: TlsConfig,
}

/// TLS certificate and key in PEM format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub cert_file: String,

    #[serde(default)]
    pub key_file: String,
}

/// Upstream beat configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BeatConfig {
    /// Comma-separated `<url>[;<collector_label>]` list. Default:
    /// "http://localhost:5066".
    #[serde(default = "default_beat_uri")]
    pub uri: String,

    /// Per-request timeout for handshakes and scrapes. Default: 10s.
    #[serde(default = "default_beat_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Delay between handshake attempts. Default: 1s.
    #[serde(default = "default_retry_interval", with = "humantime_serde")]
    pub retry_interval: Duration,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen_address() -> String {
    ":9479".to_string()
}

fn default_telemetry_path() -> String {
    "/metrics".to_string()
}

fn default_beat_uri() -> String {
    "http://localhost:5066".to_string()
}

fn default_beat_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_retry_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            web: WebConfig::default(),
            beat: BeatConfig::default(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
            tls: TlsConfig::default(),
        }
    }
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            uri: default_beat_uri(),
            timeout: default_beat_timeout(),
            retry_interval: default_retry_interval(),
        }
    }
}

// --- Validation and loading ---

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        cfg.validate()?;

        Ok(cfg)
    }

    /// Validate the configuration for required fields and consistency.
    pub fn validate(&self) -> Result<()> {
        if self.web.listen_address.trim().is_empty() {
            bail!("web.listen_address is required");
        }

        let path = &self.web.telemetry_path;
        if !path.starts_with('/') {
            bail!("web.telemetry_path must start with '/': {path:?}");
        }
        if path == "/" {
            bail!("web.telemetry_path must not be '/', which serves the index page");
        }

        if path.contains(['{', '}'])
            || path.split('/').any(|seg| seg.starts_with(':') || seg.starts_with('*'))
        {
            bail!("web.telemetry_path must be a literal path without captures or wildcards: {path:?}");
        }

        let tls = &self.web.tls;
        if !tls.enabled() && (!tls.cert_file.is_empty() || !tls.key_file.is_empty()) {
            warn!(
                cert_file = %tls.cert_file,
                key_file = %tls.key_file,
                "TLS needs both web.tls.cert_file and web.tls.key_file, serving plain HTTP",
            );
        }

        if self.beat.timeout.is_zero() {
            bail!("beat.timeout must be positive");
        }

        if self.beat.retry_interval.is_zero() {
            bail!("beat.retry_interval must be positive");
        }

        let targets = self.targets()?;
        if targets.is_empty() {
            bail!("beat.uri must name at least one beat");
        }

        Ok(())
    }

    /// Parse the configured beat URIs.
    pub fn targets(&self) -> Result<Vec<Target>> {
        parse_targets(&self.beat.uri).context("parsing beat.uri")
    }
}

impl WebConfig {
    /// Socket address to bind, expanding `:port` to all interfaces.
    pub fn bind_address(&self) -> String {
        let addr = self.listen_address.trim();
        if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.to_string()
        }
    }
}

impl TlsConfig {
    /// Whether the server terminates TLS.
    pub fn enabled(&self) -> bool {
        !self.cert_file.is_empty() && !self.key_file.is_empty()
    }
}
