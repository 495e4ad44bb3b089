//! Client facade: the public create/start/stop/send/is-connected surface.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use relay_protocol::Endpoint;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::connection::{self, Shared};
use crate::dispatcher::{CommandDispatcher, CommandHandler};
use crate::error::RelayError;
use crate::reconnect;

/// A persistent connection to the relay.
///
/// Create via [`RelayClientBuilder`](crate::builder::RelayClientBuilder) or
/// [`RelayClient::new`].  All methods take `&self`; wrap the client in an
/// `Arc` to share it between tasks.
pub struct RelayClient {
    shared: Arc<Shared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl RelayClient {
    /// Start a new builder.
    pub fn builder() -> crate::builder::RelayClientBuilder {
        crate::builder::RelayClientBuilder::new()
    }

    /// Validate `config` and create an idle client.  Nothing is connected
    /// until [`start`](Self::start).
    pub fn new(config: ClientConfig, handler: impl CommandHandler) -> Result<Self, RelayError> {
        let handler: Arc<dyn CommandHandler> = Arc::new(handler);
        Self::with_dispatcher(config, CommandDispatcher::new(Some(handler)))
    }

    pub(crate) fn with_dispatcher(
        config: ClientConfig,
        dispatcher: CommandDispatcher,
    ) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared::new(config, dispatcher)),
            supervisor: Mutex::new(None),
        })
    }

    /// Make the initial connection attempt and launch the reconnect
    /// supervisor.
    ///
    /// An unreachable relay is not an error: the supervisor keeps retrying.
    /// Fails with [`RelayError::Socket`] when called outside a Tokio runtime
    /// and with [`RelayError::Stopped`] after [`stop`](Self::stop).  Calling
    /// it again while running is a no-op.
    pub async fn start(&self) -> Result<(), RelayError> {
        if self.shared.shutdown.is_cancelled() {
            return Err(RelayError::Stopped);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RelayError::Socket(format!("cannot spawn supervisor: {e}")))?;

        {
            let mut state = self.shared.state.lock().await;
            if state.running {
                return Ok(());
            }
            state.running = true;
        }
        if !self.shared.dispatcher.has_handler() {
            tracing::warn!(
                client_id = %self.shared.config.client_id,
                "no command handler registered, relay commands will be dropped"
            );
        }

        match connection::connect(&self.shared).await {
            Ok(()) => tracing::info!(
                client_id = %self.shared.config.client_id,
                "initial connection established"
            ),
            Err(RelayError::Stopped) => return Err(RelayError::Stopped),
            Err(e) => tracing::info!(
                client_id = %self.shared.config.client_id,
                error = %e,
                "initial connection failed, retrying in background"
            ),
        }

        let handle = runtime.spawn(reconnect::supervise(self.shared.clone()));
        *self.supervisor.lock() = Some(handle);
        Ok(())
    }

    /// Stop the client: close the transport, cancel the receive task and
    /// the supervisor, and wait up to the configured grace period for them
    /// to finish.  Idempotent; safe before `start`.
    pub async fn stop(&self) {
        let first = !self.shared.shutdown.is_cancelled();
        self.shared.shutdown.cancel();

        let receiver = self.shared.close().await;
        let supervisor = self.supervisor.lock().take();

        let grace = self.shared.config.stop_grace();
        if let Some(handle) = supervisor {
            join_within(handle, grace, "reconnect supervisor").await;
        }
        if let Some(handle) = receiver {
            join_within(handle, grace, "receive loop").await;
        }

        if first {
            tracing::info!(client_id = %self.shared.config.client_id, "client stopped");
        }
    }

    /// Point-in-time connectivity snapshot.  Never waits on an in-flight
    /// send.
    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    /// Send one telemetry envelope wrapping `data`, which must be a JSON
    /// object.  It is inserted verbatim and not validated.
    ///
    /// Returns [`RelayError::Disconnected`] without touching the transport
    /// when there is no connection, and [`RelayError::Send`] when the write
    /// fails (the connection is then dropped and later re-established).
    pub async fn send_telemetry(&self, data: &str) -> Result<(), RelayError> {
        if data.trim().is_empty() {
            return Err(RelayError::InvalidParam("telemetry data is empty".into()));
        }
        self.shared.send_telemetry(data).await
    }

    /// Serialize `data` and send it as telemetry.  Only JSON objects are
    /// accepted.
    pub async fn send_telemetry_value(&self, data: &serde_json::Value) -> Result<(), RelayError> {
        if !data.is_object() {
            return Err(RelayError::InvalidParam(
                "telemetry data must be a JSON object".into(),
            ));
        }
        self.shared.send_telemetry(&data.to_string()).await
    }

    pub fn client_id(&self) -> &str {
        &self.shared.config.client_id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        // Without an explicit `stop`, make sure nothing outlives the client.
        self.shared.shutdown.cancel();
        if let Some(handle) = self.supervisor.get_mut().take() {
            handle.abort();
        }
    }
}

async fn join_within(mut handle: JoinHandle<()>, grace: Duration, task: &'static str) {
    if tokio::time::timeout(grace, &mut handle).await.is_err() {
        tracing::warn!(task, grace_ms = grace.as_millis() as u64, "task did not stop in time, aborting");
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Command;

    fn noop(_: Command) {}

    #[test]
    fn new_rejects_empty_identity() {
        let res = RelayClient::new(ClientConfig::new("/tmp/relay.sock", ""), noop);
        assert!(matches!(res, Err(RelayError::InvalidParam(_))));
        let res = RelayClient::new(ClientConfig::new("", "dev"), noop);
        assert!(matches!(res, Err(RelayError::InvalidParam(_))));
    }

    #[test]
    fn start_outside_runtime_is_a_socket_error() {
        let client = RelayClient::new(ClientConfig::new("/tmp/relay.sock", "dev"), noop).unwrap();
        let res = futures_util::FutureExt::now_or_never(client.start());
        assert!(matches!(res, Some(Err(RelayError::Socket(_)))));
    }

    #[tokio::test]
    async fn stop_before_start_is_harmless_and_terminal() {
        let client = RelayClient::new(ClientConfig::new("/tmp/relay.sock", "dev"), noop).unwrap();
        client.stop().await;
        client.stop().await;
        assert!(!client.is_connected());
        assert!(matches!(client.start().await, Err(RelayError::Stopped)));
    }

    #[tokio::test]
    async fn send_validates_payload_before_connectivity() {
        let client = RelayClient::new(ClientConfig::new("/tmp/relay.sock", "dev"), noop).unwrap();
        assert!(matches!(
            client.send_telemetry("  ").await,
            Err(RelayError::InvalidParam(_))
        ));
        assert!(matches!(
            client.send_telemetry_value(&serde_json::json!([1, 2])).await,
            Err(RelayError::InvalidParam(_))
        ));
        assert!(matches!(
            client.send_telemetry(r#"{"t":1}"#).await,
            Err(RelayError::Disconnected)
        ));
    }
}
