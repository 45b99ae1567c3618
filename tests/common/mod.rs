#![allow(dead_code)]

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use beat_exporter::config::{BeatConfig, WebConfig};
use beat_exporter::{Config, Exporter};
use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::net::{TcpListener, UnixListener};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// --- Mock beat ---

/// Canned response for one endpoint.
#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
}

/// Shared behaviour of a fake beat monitoring endpoint.
pub struct MockState {
    info: Mutex<Reply>,
    stats: Mutex<Reply>,
    info_failures_left: AtomicUsize,
    info_hits: AtomicUsize,
    stats_hits: AtomicUsize,
}

impl MockState {
    fn new(kind: &str) -> Arc<Self> {
        let info = serde_json::json!({
            "beat": kind,
            "hostname": "test-host",
            "name": format!("{kind}-1"),
            "uuid": "0f1e2d3c",
            "version": "7.17.0",
        });

        Arc::new(Self {
            info: Mutex::new(Reply {
                status: 200,
                body: info.to_string(),
            }),
            stats: Mutex::new(Reply {
                status: 200,
                body: "{}".to_string(),
            }),
            info_failures_left: AtomicUsize::new(0),
            info_hits: AtomicUsize::new(0),
            stats_hits: AtomicUsize::new(0),
        })
    }

    fn respond(&self, path: &str) -> Reply {
        match path {
            "/" => {
                self.info_hits.fetch_add(1, Ordering::SeqCst);
                let failing = self
                    .info_failures_left
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if failing {
                    Reply {
                        status: 503,
                        body: "starting".to_string(),
                    }
                } else {
                    self.info.lock().clone()
                }
            }
            "/stats" => {
                self.stats_hits.fetch_add(1, Ordering::SeqCst);
                self.stats.lock().clone()
            }
            _ => Reply {
                status: 404,
                body: "not found".to_string(),
            },
        }
    }
}

/// Handle to a running fake beat.
pub struct MockBeat {
    state: Arc<MockState>,
    uri: String,
    cancel: CancellationToken,
    _dir: Option<tempfile::TempDir>,
}

impl MockBeat {
    /// Serve a beat of `kind` over TCP on an ephemeral port.
    pub async fn tcp(kind: &str) -> Self {
        let state = MockState::new(kind);
        let cancel = CancellationToken::new();

        let app = Router::new()
            .route("/", get(root_handler))
            .route("/stats", get(stats_handler))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock beat");
        let addr: SocketAddr = listener.local_addr().expect("mock beat address");

        let shutdown = cancel.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .expect("mock beat server");
        });

        Self {
            state,
            uri: format!("http://{addr}"),
            cancel,
            _dir: None,
        }
    }

    /// Serve a beat of `kind` over a UNIX-domain socket in a temp directory.
    pub async fn unix(kind: &str) -> Self {
        let state = MockState::new(kind);
        let cancel = CancellationToken::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("beat.sock");

        let listener = UnixListener::bind(&socket).expect("bind mock beat socket");
        tokio::spawn(serve_unix(listener, Arc::clone(&state), cancel.clone()));

        Self {
            state,
            uri: format!("unix://{}", socket.display()),
            cancel,
            _dir: Some(dir),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn socket_path(&self) -> Option<&Path> {
        self.uri.strip_prefix("unix://").map(Path::new)
    }

    pub fn set_stats(&self, status: u16, body: &str) {
        *self.state.stats.lock() = Reply {
            status,
            body: body.to_string(),
        };
    }

    pub fn set_info(&self, status: u16, body: &str) {
        *self.state.info.lock() = Reply {
            status,
            body: body.to_string(),
        };
    }

    /// Make the next `n` identity requests fail with 503.
    pub fn fail_info(&self, n: usize) {
        self.state.info_failures_left.store(n, Ordering::SeqCst);
    }

    pub fn info_hits(&self) -> usize {
        self.state.info_hits.load(Ordering::SeqCst)
    }

    pub fn stats_hits(&self) -> usize {
        self.state.stats_hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockBeat {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn into_response(reply: Reply) -> (StatusCode, String) {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, reply.body)
}

async fn root_handler(State(state): State<Arc<MockState>>) -> (StatusCode, String) {
    into_response(state.respond("/"))
}

async fn stats_handler(State(state): State<Arc<MockState>>) -> (StatusCode, String) {
    into_response(state.respond("/stats"))
}

async fn serve_unix(listener: UnixListener, state: Arc<MockState>, cancel: CancellationToken) {
    loop {
        let (stream, _) = tokio::select! {
            _ = cancel.cancelled() => return,
            accepted = listener.accept() => accepted.expect("accept on mock socket"),
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                let reply = state.respond(req.uri().path());
                async move {
                    let response = hyper::Response::builder()
                        .status(reply.status)
                        .header("content-type", "application/json")
                        .body(Full::new(Bytes::from(reply.body)))
                        .expect("mock response");
                    Ok::<_, Infallible>(response)
                }
            });

            let _ = hyper::server::conn::http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await;
        });
    }
}

// --- Exporter harness ---

/// Exporter config listening on an ephemeral local port.
pub fn test_config(uri: &str) -> Config {
    Config {
        web: WebConfig {
            listen_address: "127.0.0.1:0".to_string(),
            ..Default::default()
        },
        beat: BeatConfig {
            uri: uri.to_string(),
            timeout: Duration::from_secs(2),
            retry_interval: Duration::from_millis(20),
        },
        ..Default::default()
    }
}

/// A running exporter serving scrapes.
pub struct RunningExporter {
    pub addr: SocketAddr,
    pub cancel: CancellationToken,
    task: JoinHandle<anyhow::Result<()>>,
}

impl RunningExporter {
    pub async fn start(cfg: Config) -> Self {
        let exporter = Exporter::new(cfg).expect("exporter");
        let cancel = CancellationToken::new();

        let server = tokio::time::timeout(Duration::from_secs(10), exporter.start(&cancel))
            .await
            .expect("handshake timed out")
            .expect("exporter start")
            .expect("not cancelled");

        let addr = server.local_addr();
        let task = tokio::spawn(server.serve(cancel.clone()));

        Self { addr, cancel, task }
    }

    /// GET the metrics page and parse it.
    pub async fn scrape(&self) -> Scrape {
        let text = reqwest::get(format!("http://{}/metrics", self.addr))
            .await
            .expect("scrape request")
            .text()
            .await
            .expect("scrape body");
        Scrape::parse(&text)
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        self.task.await.expect("join server").expect("server result");
    }
}

// --- Exposition parsing ---

/// One parsed sample line.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// Parsed text exposition.
#[derive(Debug, Default)]
pub struct Scrape {
    pub text: String,
    pub samples: Vec<Sample>,
    pub types: BTreeMap<String, String>,
}

impl Scrape {
    pub fn parse(text: &str) -> Self {
        let mut scrape = Scrape {
            text: text.to_string(),
            ..Default::default()
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix("# TYPE ") {
                let mut parts = rest.split_whitespace();
                if let (Some(name), Some(kind)) = (parts.next(), parts.next()) {
                    scrape.types.insert(name.to_string(), kind.to_string());
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            scrape.samples.push(parse_sample(line));
        }

        scrape
    }

    /// Value of the sample named `name` whose labels include `labels`.
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.find(name, labels).map(|s| s.value)
    }

    pub fn find(&self, name: &str, labels: &[(&str, &str)]) -> Option<&Sample> {
        self.samples.iter().find(|s| {
            s.name == name
                && labels
                    .iter()
                    .all(|(k, v)| s.labels.get(*k).map(String::as_str) == Some(*v))
        })
    }

    /// All samples carrying `collector=<label>`.
    pub fn for_collector(&self, label: &str) -> Vec<&Sample> {
        self.samples
            .iter()
            .filter(|s| s.labels.get("collector").map(String::as_str) == Some(label))
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.samples.iter().filter(|s| s.name == name).count()
    }
}

fn parse_sample(line: &str) -> Sample {
    let (series, value) = line.rsplit_once(' ').expect("sample line has a value");
    let value: f64 = value.parse().expect("numeric sample value");

    let Some((name, rest)) = series.split_once('{') else {
        return Sample {
            name: series.to_string(),
            labels: BTreeMap::new(),
            value,
        };
    };

    let body = rest.strip_suffix('}').expect("closing brace");
    let mut labels = BTreeMap::new();
    let mut chars = body.chars().peekable();

    loop {
        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        if key.is_empty() {
            break;
        }
        assert_eq!(chars.next(), Some('"'), "label value is quoted");

        let mut value = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        value.push(match escaped {
                            'n' => '\n',
                            other => other,
                        });
                    }
                }
                '"' => break,
                other => value.push(other),
            }
        }

        labels.insert(key.trim_start_matches(',').to_string(), value);
        if chars.peek() == Some(&',') {
            chars.next();
        }
    }

    Sample {
        name: name.to_string(),
        labels,
        value,
    }
}
