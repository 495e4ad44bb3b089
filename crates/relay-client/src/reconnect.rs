//! Reconnect supervisor: a fixed-interval, unlimited retry loop.
//!
//! Runs for the client's whole running lifetime.  Every interval it checks
//! the connection and, if it is down, makes one attempt.  There is no
//! back-off growth and no attempt cap; a dropped telemetry feed simply
//! comes back once the relay does.

use std::sync::Arc;

use crate::connection::{self, Shared};
use crate::error::RelayError;

pub(crate) async fn supervise(shared: Arc<Shared>) {
    let interval = shared.config.reconnect_interval();
    let mut attempt: u32 = 0;

    tracing::debug!(
        client_id = %shared.config.client_id,
        interval_ms = interval.as_millis() as u64,
        "reconnect supervisor started"
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shared.shutdown.cancelled() => break,
        }

        if shared.is_connected() {
            attempt = 0;
            continue;
        }

        attempt = attempt.saturating_add(1);
        let result = tokio::select! {
            r = connection::connect(&shared) => r,
            _ = shared.shutdown.cancelled() => break,
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    client_id = %shared.config.client_id,
                    attempt,
                    "reconnected"
                );
                attempt = 0;
            }
            Err(RelayError::Stopped) => break,
            Err(e) if attempt == 1 => {
                tracing::info!(
                    client_id = %shared.config.client_id,
                    error = %e,
                    retry_ms = interval.as_millis() as u64,
                    "relay unreachable, will keep retrying"
                );
            }
            Err(e) => {
                tracing::debug!(
                    client_id = %shared.config.client_id,
                    attempt,
                    error = %e,
                    "reconnect attempt failed"
                );
            }
        }
    }

    tracing::debug!(client_id = %shared.config.client_id, "reconnect supervisor exited");
}
