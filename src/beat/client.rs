use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header;
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::debug;

use super::stats::{self, BeatInfo, Stats};
use super::target::Target;

/// Path of the identity document.
pub const INFO_PATH: &str = "/";

/// Path of the stats document.
pub const STATS_PATH: &str = "/stats";

/// Errors produced while fetching a document from a beat.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("requesting {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("connecting to unix socket {socket}: {source}")]
    Connect {
        socket: String,
        #[source]
        source: std::io::Error,
    },

    #[error("requesting {url} over unix socket: {source}")]
    Unix {
        url: String,
        #[source]
        source: hyper::Error,
    },

    #[error("building request for {url}: {source}")]
    Build {
        url: String,
        #[source]
        source: hyper::http::Error,
    },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("beat at {url} did not report its kind")]
    MissingBeatKind { url: String },
}

/// How requests reach the beat.
enum Transport {
    Tcp(reqwest::Client),
    Unix(PathBuf),
}

/// HTTP client bound to a single beat endpoint.
pub struct BeatClient {
    target: Target,
    transport: Transport,
    timeout: Duration,
}

impl BeatClient {
    /// Create a client for the target. UNIX-domain targets dial their socket
    /// path for every request; everything else goes through reqwest.
    pub fn new(target: Target, timeout: Duration) -> Result<Self> {
        let transport = match &target.socket {
            Some(socket) => Transport::Unix(socket.clone()),
            None => Transport::Tcp(
                reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .context("building HTTP client")?,
            ),
        };

        Ok(Self {
            target,
            transport,
            timeout,
        })
    }

    /// The target this client talks to.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Fetch the identity document. A document without a beat kind is
    /// rejected with [`FetchError::MissingBeatKind`].
    pub async fn fetch_info(&self) -> Result<BeatInfo, FetchError> {
        debug!(collector = %self.target.label, "fetching beat info");

        let info: BeatInfo = self.get_json(INFO_PATH).await?;
        if info.beat.trim().is_empty() {
            return Err(FetchError::MissingBeatKind {
                url: self.target.endpoint(INFO_PATH),
            });
        }

        Ok(info)
    }

    /// Fetch the stats document.
    pub async fn fetch_stats(&self) -> Result<Stats, FetchError> {
        debug!(collector = %self.target.label, "fetching beat stats");

        self.get_json(STATS_PATH).await
    }

    /// GET `path`, require a 2xx status, and decode the body as JSON.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.target.endpoint(path);
        let (status, body) = self.get(path).await?;

        if !(200..300).contains(&status) {
            return Err(FetchError::Status { url, status });
        }

        stats::decode(&body).map_err(|source| FetchError::Decode { url, source })
    }

    /// GET `path` and read the whole body regardless of status.
    async fn get(&self, path: &str) -> Result<(u16, Bytes), FetchError> {
        match &self.transport {
            Transport::Tcp(http) => self.get_tcp(http, path).await,
            Transport::Unix(socket) => {
                tokio::time::timeout(self.timeout, self.get_unix(socket, path))
                    .await
                    .map_err(|_| FetchError::Timeout {
                        url: self.target.endpoint(path),
                        timeout: self.timeout,
                    })?
            }
        }
    }

    async fn get_tcp(&self, http: &reqwest::Client, path: &str) -> Result<(u16, Bytes), FetchError> {
        let url = self.target.endpoint(path);

        let response = http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| self.request_error(&url, source))?;

        let status = response.status().as_u16();

        let body = response.bytes().await.map_err(|source| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: url.clone(),
                    timeout: self.timeout,
                }
            } else {
                FetchError::Body {
                    url: url.clone(),
                    source,
                }
            }
        })?;

        Ok((status, body))
    }

    async fn get_unix(&self, socket: &Path, path: &str) -> Result<(u16, Bytes), FetchError> {
        let url = self.target.endpoint(path);

        let stream = UnixStream::connect(socket)
            .await
            .map_err(|source| FetchError::Connect {
                socket: socket.display().to_string(),
                source,
            })?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|source| FetchError::Unix {
                url: url.clone(),
                source,
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "unix socket connection closed with error");
            }
        });

        let request = hyper::Request::get(self.target.request_path(path))
            .header(header::HOST, "localhost")
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|source| FetchError::Build {
                url: url.clone(),
                source,
            })?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|source| FetchError::Unix {
                url: url.clone(),
                source,
            })?;

        let status = response.status().as_u16();

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| FetchError::Unix { url, source })?
            .to_bytes();

        Ok((status, body))
    }

    fn request_error(&self, url: &str, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source,
            }
        }
    }
}
