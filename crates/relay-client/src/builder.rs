//! Builder pattern for constructing a [`RelayClient`].

use std::sync::Arc;
use std::time::Duration;

use crate::client::RelayClient;
use crate::config::ClientConfig;
use crate::dispatcher::{CommandDispatcher, CommandHandler};
use crate::error::RelayError;

/// Fluent builder for [`RelayClient`].
///
/// # Example
///
/// ```rust,no_run
/// # use relay_client::{Command, RelayClientBuilder};
/// # use std::time::Duration;
/// let client = RelayClientBuilder::new()
///     .endpoint("tcp://192.168.1.20:8899")
///     .client_id("random_data_generator_2")
///     .reconnect_interval(Duration::from_secs(5))
///     .command_handler(|cmd: Command| println!("command: {}", cmd.name))
///     .build()
///     .unwrap();
/// ```
pub struct RelayClientBuilder {
    config: ClientConfig,
    handler: Option<Arc<dyn CommandHandler>>,
}

impl RelayClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            handler: None,
        }
    }

    /// Start from a loaded [`ClientConfig`]; later setters override it.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    // ── Required ─────────────────────────────────────────────────────

    /// Domain-socket path or `tcp://<host>:<port>`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Identifier sent with register and telemetry envelopes.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = id.into();
        self
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn command_handler<H: CommandHandler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Register a pre-wrapped handler, e.g. one shared with other code.
    pub fn command_handler_arc(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Fixed delay between reconnect checks (default 5s).
    pub fn reconnect_interval(mut self, d: Duration) -> Self {
        self.config.reconnect_interval_ms = millis(d);
        self
    }

    /// Upper bound on one connection attempt (default 5s).
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.config.connect_timeout_ms = millis(d);
        self
    }

    /// Upper bound on one outbound write before the connection is dropped
    /// (default 5s).
    pub fn write_timeout(mut self, d: Duration) -> Self {
        self.config.write_timeout_ms = millis(d);
        self
    }

    /// How long `stop` waits for background tasks (default 2s).
    pub fn stop_grace(mut self, d: Duration) -> Self {
        self.config.stop_grace_ms = millis(d);
        self
    }

    // ── Wire limits ──────────────────────────────────────────────────

    /// Largest unterminated inbound message (default 8 KB).
    pub fn max_frame_bytes(mut self, n: usize) -> Self {
        self.config.max_frame_bytes = n;
        self
    }

    /// Build the [`RelayClient`].
    pub fn build(self) -> Result<RelayClient, RelayError> {
        RelayClient::with_dispatcher(self.config, CommandDispatcher::new(self.handler))
    }
}

impl Default for RelayClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
