use std::time::Duration;

use relay_protocol::{Endpoint, DEFAULT_MAX_FRAME_BYTES};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Immutable settings for one client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Domain-socket path, or `tcp://<host>:<port>`.
    #[serde(default = "d_endpoint")]
    pub endpoint: String,
    /// Identifier sent in every register and telemetry envelope.
    #[serde(default)]
    pub client_id: String,
    /// Fixed delay between reconnect checks.
    #[serde(default = "d_5000")]
    pub reconnect_interval_ms: u64,
    /// Upper bound on a single connection attempt.
    #[serde(default = "d_5000")]
    pub connect_timeout_ms: u64,
    /// Upper bound on one outbound line reaching the socket.  A relay that
    /// stops reading costs the connection after this long.
    #[serde(default = "d_5000")]
    pub write_timeout_ms: u64,
    /// Largest unterminated inbound message before the connection is dropped.
    #[serde(default = "d_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// How long `stop` waits for background tasks before aborting them.
    #[serde(default = "d_2000")]
    pub stop_grace_ms: u64,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.endpoint.is_empty() {
            return Err(RelayError::InvalidParam("endpoint is required".into()));
        }
        if self.client_id.is_empty() {
            return Err(RelayError::InvalidParam("client_id is required".into()));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(RelayError::InvalidParam(
                "reconnect_interval_ms must be positive".into(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(RelayError::InvalidParam(
                "connect_timeout_ms must be positive".into(),
            ));
        }
        if self.write_timeout_ms == 0 {
            return Err(RelayError::InvalidParam(
                "write_timeout_ms must be positive".into(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(RelayError::InvalidParam(
                "max_frame_bytes must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::parse(&self.endpoint)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: d_endpoint(),
            client_id: String::new(),
            reconnect_interval_ms: d_5000(),
            connect_timeout_ms: d_5000(),
            write_timeout_ms: d_5000(),
            max_frame_bytes: d_max_frame_bytes(),
            stop_grace_ms: d_2000(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_endpoint() -> String {
    "/tmp/iotconnect-relay.sock".into()
}

fn d_5000() -> u64 {
    5000
}

fn d_2000() -> u64 {
    2000
}

fn d_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}
