//! Endpoint resolution: `tcp://host:port` or a local domain-socket path.

use std::fmt;
use std::path::PathBuf;

const TCP_SCHEME: &str = "tcp://";

/// Where the relay listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local domain socket at the given filesystem path.
    Unix(PathBuf),
    /// TCP target.  `host` is either a literal address or a name to resolve.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Resolve a configured endpoint string.
    ///
    /// `tcp://<host>:<port>` yields [`Endpoint::Tcp`], splitting at the
    /// *last* colon so bracketed IPv6 literals work (`tcp://[::1]:8899`).
    /// Anything else, including malformed `tcp://` strings with no colon,
    /// an empty host or a non-numeric port, is taken verbatim as a socket
    /// path and will simply fail at connect time.
    pub fn parse(raw: &str) -> Self {
        match parse_tcp_target(raw) {
            Some((host, port)) => Endpoint::Tcp { host, port },
            None => Endpoint::Unix(PathBuf::from(raw)),
        }
    }

    pub fn is_tcp(&self) -> bool {
        matches!(self, Endpoint::Tcp { .. })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp { host, port } if host.contains(':') => {
                write!(f, "{TCP_SCHEME}[{host}]:{port}")
            }
            Endpoint::Tcp { host, port } => write!(f, "{TCP_SCHEME}{host}:{port}"),
        }
    }
}

fn parse_tcp_target(raw: &str) -> Option<(String, u16)> {
    let rest = raw.strip_prefix(TCP_SCHEME)?;
    let (host, port) = rest.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }

    let port: u16 = port.parse().ok()?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return None;
    }

    Some((host.to_string(), port))
}
