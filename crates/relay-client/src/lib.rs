//! `relay-client`: persistent connection to an edge telemetry relay.
//!
//! The relay listens on a local domain socket or TCP port and speaks
//! newline-delimited JSON (see `relay-protocol`).  This crate keeps one
//! connection alive, registers the client, forwards relay commands to a
//! [`CommandHandler`] and pushes telemetry on request.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  Your application                                         │
//! │                                                           │
//! │   let client = RelayClientBuilder::new()                  │
//! │       .endpoint("tcp://192.168.1.20:8899")                │
//! │       .client_id("edge-1")                                │
//! │       .command_handler(|cmd: Command| { ... })            │
//! │       .build()?;                                          │
//! │   client.start().await?;                                  │
//! │   if client.is_connected() {                              │
//! │       client.send_telemetry(r#"{"t":21.5}"#).await?;      │
//! │   }                                                       │
//! │   client.stop().await;                                    │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Connection lifecycle
//!
//! 1. `start` makes one connection attempt, then spawns the reconnect
//!    supervisor.  An unreachable relay is not an error.
//! 2. On connect: send `register`, spawn the receive task, set `connected`.
//! 3. The receive task frames inbound bytes into lines, decodes them and
//!    runs the command handler inline, in arrival order.
//! 4. EOF, a read error, an oversized message or a failed telemetry write
//!    drops the connection.  Unterminated inbound bytes are discarded.
//! 5. Every reconnect interval the supervisor retries if disconnected,
//!    forever.
//! 6. `stop` is terminal: it closes the transport and cancels both tasks.
//!
//! Telemetry is fire-and-forget.  Nothing is queued while disconnected.

pub mod builder;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;

mod connection;
mod reconnect;
mod transport;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::RelayClientBuilder;
pub use client::RelayClient;
pub use config::ClientConfig;
pub use dispatcher::{Command, CommandDispatcher, CommandHandler};
pub use error::{error_string, error_string_raw, ErrorCode, RelayError};

// Re-export protocol types so callers never need relay-protocol directly.
pub use relay_protocol::{Endpoint, Envelope};
