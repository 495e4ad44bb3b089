//! Connection manager: one connect → register → serve → disconnect cycle.
//!
//! All mutable connection state lives in a single [`ConnectionState`] behind
//! one async mutex, so `connected` and the transport handle always change
//! together.  A lock-free mirror of `connected` lets callers read the
//! connectivity flag while a write holds the lock.  The inbound [`LineFramer`] is owned by the receive task alone.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use relay_protocol::{
    decode, encode_register, encode_telemetry, Endpoint, Envelope, LineFramer, READ_CHUNK_BYTES,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::dispatcher::{Command, CommandDispatcher};
use crate::error::RelayError;
use crate::transport::{self, BoxedReader, BoxedWriter};

/// State shared by the facade, the supervisor and the receive task.
pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) endpoint: Endpoint,
    pub(crate) dispatcher: CommandDispatcher,
    pub(crate) state: Mutex<ConnectionState>,
    /// Mirrors `ConnectionState::connected`; only written under the lock.
    link_up: AtomicBool,
    /// Cancelled exactly once, by `stop`.  Every background task watches it.
    pub(crate) shutdown: CancellationToken,
}

#[derive(Default)]
pub(crate) struct ConnectionState {
    writer: Option<BoxedWriter>,
    pub(crate) connected: bool,
    pub(crate) running: bool,
    /// Bumped on every successful connect; a receive task only tears down
    /// the connection it was spawned for.
    generation: u64,
    /// Cancels the current connection's receive task.
    conn_cancel: Option<CancellationToken>,
    receiver: Option<JoinHandle<()>>,
}

impl ConnectionState {
    /// Drop the transport and clear `connected`.  Safe to call repeatedly.
    async fn close(&mut self) {
        self.connected = false;
        if let Some(cancel) = self.conn_cancel.take() {
            cancel.cancel();
        }
        if let Some(mut writer) = self.writer.take() {
            // Best effort: the peer may already be gone.
            let _ = writer.shutdown().await;
        }
    }

    pub(crate) fn take_receiver(&mut self) -> Option<JoinHandle<()>> {
        self.receiver.take()
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl Shared {
    pub(crate) fn new(config: ClientConfig, dispatcher: CommandDispatcher) -> Self {
        let endpoint = config.endpoint();
        Self {
            config,
            endpoint,
            dispatcher,
            state: Mutex::new(ConnectionState::default()),
            link_up: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.link_up.load(Ordering::Acquire)
    }

    /// Force the current connection closed (used by `stop`).
    ///
    /// Callers cancel `shutdown` first so an in-flight write gives up the
    /// lock promptly.
    pub(crate) async fn close(&self) -> Option<JoinHandle<()>> {
        let mut state = self.state.lock().await;
        state.running = false;
        self.drop_link(&mut state).await;
        state.take_receiver()
    }

    async fn drop_link(&self, state: &mut ConnectionState) {
        self.link_up.store(false, Ordering::Release);
        state.close().await;
    }

    /// Encode and write one telemetry envelope on the active transport.
    ///
    /// The whole write happens under the state lock, so concurrent callers
    /// never interleave partial lines.  The write is abandoned when the
    /// connection is cancelled or the write timeout passes.  A failed or
    /// abandoned write tears the connection down; the supervisor reconnects
    /// later.
    pub(crate) async fn send_telemetry(&self, data: &str) -> Result<(), RelayError> {
        let mut state = self.state.lock().await;
        if !state.connected {
            return Err(RelayError::Disconnected);
        }
        let generation = state.generation;
        let cancel = match &state.conn_cancel {
            Some(token) => token.clone(),
            None => return Err(RelayError::Disconnected),
        };
        let Some(writer) = state.writer.as_mut() else {
            return Err(RelayError::Disconnected);
        };

        let line = encode_telemetry(&self.config.client_id, data);
        let written = write_bounded(writer, &line, &cancel, self.config.write_timeout()).await;
        if let Err(e) = written {
            tracing::warn!(
                client_id = %self.config.client_id,
                generation,
                error = %e,
                "telemetry send failed, dropping connection"
            );
            self.drop_link(&mut state).await;
            return Err(RelayError::Send(e));
        }

        tracing::trace!(bytes = line.len(), "telemetry sent");
        Ok(())
    }

    /// Clear the connection if it is still the one identified by `generation`.
    async fn connection_lost(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.generation == generation && state.connected {
            self.drop_link(&mut state).await;
            tracing::info!(
                client_id = %self.config.client_id,
                generation,
                "disconnected from relay"
            );
        }
    }
}

/// Open the transport, send the register envelope and spawn the receive
/// task.  On success the client is `connected`.
pub(crate) async fn connect(shared: &Arc<Shared>) -> Result<(), RelayError> {
    if shared.shutdown.is_cancelled() {
        return Err(RelayError::Stopped);
    }

    let (reader, mut writer) =
        transport::open(&shared.endpoint, shared.config.connect_timeout()).await?;

    let mut state = shared.state.lock().await;
    if shared.shutdown.is_cancelled() || !state.running {
        return Err(RelayError::Stopped);
    }
    if state.connected {
        // Someone else won the race; keep their connection.
        return Ok(());
    }

    write_bounded(
        &mut writer,
        &encode_register(&shared.config.client_id),
        &shared.shutdown,
        shared.config.write_timeout(),
    )
    .await
    .map_err(RelayError::Send)?;

    state.generation += 1;
    let generation = state.generation;
    let cancel = shared.shutdown.child_token();

    state.receiver = Some(tokio::spawn(receive_loop(
        shared.clone(),
        reader,
        generation,
        cancel.clone(),
    )));
    state.conn_cancel = Some(cancel);
    state.writer = Some(writer);
    state.connected = true;
    shared.link_up.store(true, Ordering::Release);

    tracing::info!(
        client_id = %shared.config.client_id,
        endpoint = %shared.endpoint,
        generation,
        "connected to relay"
    );
    Ok(())
}

async fn write_line(writer: &mut BoxedWriter, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// `write_line` that gives up on cancellation or after `limit`.  A relay
/// that stops reading must not pin the state lock.
async fn write_bounded(
    writer: &mut BoxedWriter,
    line: &str,
    cancel: &CancellationToken,
    limit: Duration,
) -> io::Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(io::Error::new(
            io::ErrorKind::Interrupted,
            "connection closed during write",
        )),
        r = tokio::time::timeout(limit, write_line(writer, line)) => match r {
            Ok(written) => written,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("write not accepted within {} ms", limit.as_millis()),
            )),
        },
    }
}

/// Read until EOF, error, framing overflow or cancellation, dispatching
/// every complete inbound message in arrival order.
async fn receive_loop(
    shared: Arc<Shared>,
    mut reader: BoxedReader,
    generation: u64,
    cancel: CancellationToken,
) {
    let outcome = read_messages(&shared, &mut reader, &cancel).await;

    match &outcome {
        Ok(()) if cancel.is_cancelled() => {
            tracing::debug!(generation, "receive loop cancelled");
        }
        Ok(()) => tracing::info!(generation, "relay closed connection"),
        Err(e) => tracing::warn!(generation, error = %e, "receive loop failed"),
    }

    // Unblocks a write on this connection that is holding the lock.
    cancel.cancel();
    shared.connection_lost(generation).await;
}

async fn read_messages(
    shared: &Shared,
    reader: &mut BoxedReader,
    cancel: &CancellationToken,
) -> Result<(), RelayError> {
    let mut framer = LineFramer::new(shared.config.max_frame_bytes);
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    let mut lines = Vec::new();

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            r = reader.read(&mut buf) => r.map_err(RelayError::Receive)?,
        };
        if n == 0 {
            return Ok(());
        }

        // Messages completed before an overflow are still delivered.
        let framed = framer.push(&buf[..n], &mut lines);
        for line in lines.drain(..) {
            handle_line(shared, &line).await;
            if cancel.is_cancelled() {
                return Ok(());
            }
        }
        framed?;
    }
}

async fn handle_line(shared: &Shared, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    tracing::trace!(line, "inbound message");

    match decode(line) {
        Ok(Envelope::Command { name, parameters }) => {
            tracing::debug!(command = %name, "received command");
            shared
                .dispatcher
                .dispatch(Command { name, parameters })
                .await;
        }
        Ok(Envelope::Ack { status, message }) if status == "ok" => {
            tracing::debug!(message = %message, "relay acknowledged");
        }
        Ok(Envelope::Ack { status, message }) => {
            tracing::warn!(status = %status, message = %message, "relay reported an error");
        }
        Ok(other) => {
            tracing::debug!(kind = other.kind(), "ignoring unexpected envelope");
        }
        Err(e) => {
            let err = RelayError::from(e);
            tracing::debug!(error = %err, "dropping inbound message");
        }
    }
}
