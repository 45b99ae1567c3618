pub mod server;
pub mod text;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::collector::TargetCollector;
use crate::version;

pub use server::MetricsServer;

/// Metrics registry for all validated beats.
///
/// Rendering refreshes every registered target concurrently, then gathers
/// and encodes the registry. Concurrent renders are serialized so each
/// target has a single writer per scrape.
pub struct ScrapeRegistry {
    registry: Registry,
    targets: Mutex<Vec<TargetCollector>>,
    scrape_lock: tokio::sync::Mutex<()>,
}

impl ScrapeRegistry {
    /// Creates a registry carrying the exporter build info metric.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let build_info = Gauge::with_opts(
            Opts::new(
                "build_info",
                "A metric with a constant '1' value labeled by version, commit, os and arch.",
            )
            .namespace(version::NAME)
            .const_label("version", version::RELEASE)
            .const_label("commit", version::git_commit())
            .const_label("os", version::target_os())
            .const_label("arch", version::target_arch()),
        )?;
        build_info.set(1.0);

        registry
            .register(Box::new(build_info))
            .context("registering build info")?;

        Ok(Self {
            registry,
            targets: Mutex::new(Vec::new()),
            scrape_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Register a validated target. Fails if a target with the same beat kind
    /// and collector label is already registered.
    pub fn register(&self, collector: TargetCollector) -> Result<()> {
        self.registry
            .register(Box::new(collector.clone()))
            .with_context(|| {
                format!(
                    "registering {} collector {:?}",
                    collector.info().beat,
                    collector.label()
                )
            })?;

        self.targets.lock().push(collector);

        Ok(())
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refresh every target from its beat.
    pub async fn scrape(&self) {
        let targets = self.targets.lock().clone();

        let mut tasks = JoinSet::new();
        for target in targets {
            tasks.spawn(async move { target.scrape().await });
        }

        let mut up = 0usize;
        let mut total = 0usize;
        while let Some(result) = tasks.join_next().await {
            total += 1;
            match result {
                Ok(true) => up += 1,
                Ok(false) => {}
                Err(e) => error!(error = %e, "scrape task failed"),
            }
        }

        debug!(up, total, "scraped targets");
    }

    /// Gather the registry without refreshing targets.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Refresh all targets and encode the result in the text exposition
    /// format. A family that fails to encode is logged and left out.
    pub async fn render(&self) -> String {
        let _guard = self.scrape_lock.lock().await;

        self.scrape().await;

        text::encode(&self.gather())
    }

    /// Content type of [`ScrapeRegistry::render`] output.
    pub fn content_type() -> String {
        TextEncoder::new().format_type().to_string()
    }
}
