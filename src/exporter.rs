use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::beat::BeatClient;
use crate::bootstrap;
use crate::collector::TargetCollector;
use crate::config::Config;
use crate::export::{MetricsServer, ScrapeRegistry};

/// Wires configured beats into the registry and the scrape server.
pub struct Exporter {
    cfg: Config,
    registry: Arc<ScrapeRegistry>,
}

impl Exporter {
    pub fn new(cfg: Config) -> Result<Self> {
        let registry = Arc::new(ScrapeRegistry::new().context("creating metrics registry")?);
        Ok(Self { cfg, registry })
    }

    pub fn registry(&self) -> Arc<ScrapeRegistry> {
        Arc::clone(&self.registry)
    }

    /// Validate and register every configured beat in order, then bind the
    /// scrape server. Returns `None` if `shutdown` fires during a handshake.
    pub async fn start(&self, shutdown: &CancellationToken) -> Result<Option<MetricsServer>> {
        let targets = self.cfg.targets()?;

        for target in targets {
            let client = BeatClient::new(target, self.cfg.beat.timeout)?;

            let Some(info) =
                bootstrap::await_beat(&client, self.cfg.beat.retry_interval, shutdown).await
            else {
                info!("shutdown requested before all beats were validated");
                return Ok(None);
            };

            let collector = TargetCollector::new(client, info)?;
            self.registry.register(collector.clone())?;

            let info = collector.info();
            info!(
                beat = %info.beat,
                version = %info.version,
                name = %info.name,
                hostname = %info.hostname,
                uuid = %info.uuid,
                collector = %collector.label(),
                subsystems = ?collector.subsystems(),
                "target registered"
            );
        }

        let server = MetricsServer::bind(&self.cfg.web, self.registry())
            .await
            .context("starting metrics server")?;

        Ok(Some(server))
    }
}

/// Run the exporter until `shutdown` fires.
pub async fn run(cfg: Config, shutdown: CancellationToken) -> Result<()> {
    let exporter = Exporter::new(cfg)?;

    let Some(server) = exporter.start(&shutdown).await? else {
        return Ok(());
    };

    server.serve(shutdown).await
}
