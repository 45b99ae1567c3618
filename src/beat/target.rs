use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// Base URL used for requests tunnelled over a UNIX-domain socket.
const UNIX_BASE_URL: &str = "http://localhost/";

/// Errors produced while parsing the beat URI list.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("empty beat URI")]
    Empty,

    #[error("parsing beat URI {uri:?}: {source}")]
    InvalidUrl {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {scheme:?} in beat URI {uri:?} (expected http, https or unix)")]
    UnsupportedScheme { uri: String, scheme: String },

    #[error("beat URI {uri:?} has no host")]
    MissingHost { uri: String },

    #[error("unix beat URI {uri:?} has no socket path")]
    MissingSocketPath { uri: String },
}

/// One configured upstream beat.
///
/// Syntax: `<url>[;<collector_label>]`. The label defaults to `<host>:<port>`
/// for TCP targets and to the socket path for `unix://` targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// URI as configured, without the collector label.
    pub uri: String,
    /// Base URL requests are issued against. For `unix://` targets this is
    /// rewritten to `http://localhost/`.
    pub url: Url,
    /// UNIX-domain socket to dial instead of TCP, if any.
    pub socket: Option<PathBuf>,
    /// Value of the `collector` label on every series from this target.
    pub label: String,
}

impl Target {
    /// Absolute URL for `path` (which must start with `/`) below the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url.as_str().trim_end_matches('/'), path)
    }

    /// Origin-form request target for `path` below the base URL path.
    pub fn request_path(&self, path: &str) -> String {
        format!("{}{}", self.url.path().trim_end_matches('/'), path)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.uri, self.label)
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (uri, label) = match input.trim().split_once(';') {
            Some((uri, label)) => (uri.trim(), label.trim()),
            None => (input.trim(), ""),
        };

        if uri.is_empty() {
            return Err(TargetError::Empty);
        }

        let parsed = Url::parse(uri).map_err(|source| TargetError::InvalidUrl {
            uri: uri.to_string(),
            source,
        })?;

        match parsed.scheme() {
            "http" | "https" => {
                let host = parsed
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| TargetError::MissingHost {
                        uri: uri.to_string(),
                    })?;

                let label = if label.is_empty() {
                    default_label(host, parsed.port_or_known_default())
                } else {
                    label.to_string()
                };

                Ok(Self {
                    uri: uri.to_string(),
                    url: parsed,
                    socket: None,
                    label,
                })
            }
            "unix" => {
                let socket = parsed.path();
                if socket.is_empty() || socket == "/" {
                    return Err(TargetError::MissingSocketPath {
                        uri: uri.to_string(),
                    });
                }

                let url = Url::parse(UNIX_BASE_URL).map_err(|source| TargetError::InvalidUrl {
                    uri: uri.to_string(),
                    source,
                })?;

                let label = if label.is_empty() {
                    socket.to_string()
                } else {
                    label.to_string()
                };

                Ok(Self {
                    uri: uri.to_string(),
                    url,
                    socket: Some(PathBuf::from(socket)),
                    label,
                })
            }
            other => Err(TargetError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme: other.to_string(),
            }),
        }
    }
}

/// Parse a comma-separated URI list. Empty entries are skipped.
pub fn parse_targets(list: &str) -> Result<Vec<Target>, TargetError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Target::from_str)
        .collect()
}

fn default_label(host: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
