use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use beat_exporter::config::{BeatConfig, LogFormat, TlsConfig, WebConfig};
use beat_exporter::{version, Config};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

/// Prometheus exporter for Elastic beats.
#[derive(Parser)]
#[command(name = "beat_exporter", about, disable_version_flag = true)]
struct Cli {
    /// Address to listen on for web interface and telemetry.
    #[arg(long = "web.listen-address", default_value = ":9479")]
    listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// Comma-separated beat URIs, each `<url>[;<collector_label>]`.
    #[arg(long = "beat.uri", default_value = "http://localhost:5066")]
    beat_uri: String,

    /// Timeout for requests to the beats.
    #[arg(long = "beat.timeout", default_value = "10s", value_parser = humantime::parse_duration)]
    beat_timeout: Duration,

    /// TLS certificate file (PEM). TLS is enabled when both files are set.
    #[arg(long = "tls.certfile", default_value = "")]
    tls_cert_file: String,

    /// TLS private key file (PEM).
    #[arg(long = "tls.keyfile", default_value = "")]
    tls_key_file: String,

    /// Path to a YAML configuration file. Replaces the flags above.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Logging verbosity level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print version information and exit.
    #[arg(long)]
    version: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        if let Some(path) = &self.config {
            return Config::load(path)
                .with_context(|| format!("loading config from {}", path.display()));
        }

        let cfg = Config {
            log_level: self.log_level,
            log_format: self.log_format,
            web: WebConfig {
                listen_address: self.listen_address,
                telemetry_path: self.telemetry_path,
                tls: TlsConfig {
                    cert_file: self.tls_cert_file,
                    key_file: self.tls_key_file,
                },
            },
            beat: BeatConfig {
                uri: self.beat_uri,
                timeout: self.beat_timeout,
                ..Default::default()
            },
        };

        cfg.validate()?;

        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", version::full());
        return Ok(());
    }

    let cfg = cli.into_config()?;

    let filter = EnvFilter::try_new(&cfg.log_level)
        .with_context(|| format!("invalid log level: {}", cfg.log_level))?;

    match cfg.log_format {
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).init(),
        LogFormat::Json => fmt().json().with_env_filter(filter).with_target(true).init(),
    }

    tracing::info!(
        version = version::RELEASE,
        commit = version::git_commit(),
        "starting beat_exporter",
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    rt.block_on(async {
        let shutdown = CancellationToken::new();
        tokio::spawn(wait_for_signal(shutdown.clone()));

        beat_exporter::run(cfg, shutdown).await?;

        tracing::info!("beat_exporter stopped");

        Ok(())
    })
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => {
                    tracing::info!("received SIGINT, shutting down");
                }
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM, shutting down");
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "registering SIGTERM handler, listening for SIGINT only");
            if let Err(e) = ctrl_c.await {
                tracing::error!(error = %e, "waiting for SIGINT");
                return;
            }
            tracing::info!("received SIGINT, shutting down");
        }
    }

    shutdown.cancel();
}
