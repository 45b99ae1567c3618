use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::ScrapeRegistry;
use crate::config::WebConfig;
use crate::version;

/// Scrape endpoint bound to its listener but not yet serving.
pub struct MetricsServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
    tls: Option<RustlsConfig>,
}

/// Shared state for axum handlers.
struct AppState {
    registry: Arc<ScrapeRegistry>,
    index: String,
}

impl MetricsServer {
    /// Bind the listener and load TLS material. Failures here are fatal.
    pub async fn bind(cfg: &WebConfig, registry: Arc<ScrapeRegistry>) -> Result<Self> {
        let bind_addr = cfg.bind_address();

        let tls = if cfg.tls.enabled() {
            let config = RustlsConfig::from_pem_file(&cfg.tls.cert_file, &cfg.tls.key_file)
                .await
                .with_context(|| {
                    format!(
                        "loading TLS certificate {} and key {}",
                        cfg.tls.cert_file, cfg.tls.key_file
                    )
                })?;
            Some(config)
        } else {
            None
        };

        let state = Arc::new(AppState {
            registry,
            index: index_page(&cfg.telemetry_path),
        });

        let app = Router::new()
            .route(&cfg.telemetry_path, get(metrics_handler))
            .route("/", get(index_handler))
            .with_state(state);

        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("listening on {bind_addr}"))?;

        let local_addr = listener.local_addr().context("getting local address")?;

        Ok(Self {
            listener,
            local_addr,
            app,
            tls,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `cancel` fires.
    pub async fn serve(self, cancel: CancellationToken) -> Result<()> {
        let Self {
            listener,
            local_addr,
            app,
            tls,
        } = self;

        match tls {
            None => {
                info!(addr = %local_addr, tls = false, "metrics server started");

                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        cancel.cancelled().await;
                    })
                    .await
                    .context("serving metrics")?;
            }
            Some(config) => {
                info!(addr = %local_addr, tls = true, "metrics server started");

                let handle = axum_server::Handle::new();
                let shutdown = handle.clone();
                tokio::spawn(async move {
                    cancel.cancelled().await;
                    shutdown.shutdown();
                });

                let listener = listener
                    .into_std()
                    .context("converting listener for TLS")?;

                axum_server::from_tcp_rustls(listener, config)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .context("serving metrics over TLS")?;
            }
        }

        info!("metrics server stopped");

        Ok(())
    }
}

/// GET <telemetry path> - Prometheus text format.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.registry.render().await;
    ([(header::CONTENT_TYPE, ScrapeRegistry::content_type())], body)
}

/// GET / - landing page.
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.index.clone())
}

fn index_page(telemetry_path: &str) -> String {
    let name = version::NAME;
    format!(
        "<html>\n\
         <head><title>{name}</title></head>\n\
         <body>\n\
         <h1>{name}</h1>\n\
         <p>{}</p>\n\
         <p><a href=\"{telemetry_path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        version::full(),
    )
}
