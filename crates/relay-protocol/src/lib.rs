//! Relay protocol: endpoint addressing, envelope codec and line framing.
//!
//! The relay speaks newline-delimited JSON over a stream socket.  Every
//! envelope is a single JSON object on a single line:
//!
//! ```text
//! client → relay   {"type":"register","client_id":"<id>"}
//! client → relay   {"type":"telemetry","client_id":"<id>","data":<object>}
//! relay  → client  {"type":"command","command_name":"<name>","parameters":"<string>"}
//! relay  → client  {"status":"ok","message":"..."}
//! ```
//!
//! The codec is deliberately not a general JSON parser.  Outbound envelopes
//! are built from fixed templates and inbound ones are read with a
//! first-match key scanner, which keeps byte-for-byte compatibility with the
//! existing relay server and its C client.

pub mod address;
pub mod codec;
pub mod framer;

pub use address::Endpoint;
pub use codec::{decode, encode_register, encode_telemetry, DecodeError, Envelope};
pub use framer::{FrameError, LineFramer, DEFAULT_MAX_FRAME_BYTES, READ_CHUNK_BYTES};
