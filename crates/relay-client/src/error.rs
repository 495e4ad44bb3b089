//! Error taxonomy and the numeric codes shared with the relay's C client.

use std::fmt;

use relay_protocol::{DecodeError, FrameError};

/// Top-level client error.
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
    #[error("socket: {0}")]
    Socket(String),
    #[error("connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("send: {0}")]
    Send(#[source] std::io::Error),
    #[error("receive: {0}")]
    Receive(#[source] std::io::Error),
    #[error("not connected")]
    Disconnected,
    #[error("protocol: {0}")]
    ProtocolDecode(#[from] DecodeError),
    #[error("framing: {0}")]
    Framing(#[from] FrameError),
    #[error("client stopped")]
    Stopped,
}

impl RelayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RelayError::InvalidParam(_) => ErrorCode::InvalidParam,
            RelayError::Socket(_) => ErrorCode::Socket,
            RelayError::Connect { .. } => ErrorCode::Connect,
            RelayError::Send(_) => ErrorCode::Send,
            RelayError::Receive(_) => ErrorCode::Receive,
            RelayError::Disconnected | RelayError::Stopped => ErrorCode::Disconnected,
            RelayError::ProtocolDecode(_) | RelayError::Framing(_) => ErrorCode::Json,
        }
    }
}

/// Stable numeric result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    Socket = -1,
    Connect = -2,
    Send = -3,
    Receive = -4,
    Json = -5,
    Disconnected = -6,
    InvalidParam = -7,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => ErrorCode::Success,
            -1 => ErrorCode::Socket,
            -2 => ErrorCode::Connect,
            -3 => ErrorCode::Send,
            -4 => ErrorCode::Receive,
            -5 => ErrorCode::Json,
            -6 => ErrorCode::Disconnected,
            -7 => ErrorCode::InvalidParam,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Socket => "Socket error",
            ErrorCode::Connect => "Connection error",
            ErrorCode::Send => "Send error",
            ErrorCode::Receive => "Receive error",
            ErrorCode::Json => "JSON error",
            ErrorCode::Disconnected => "Not connected",
            ErrorCode::InvalidParam => "Invalid parameter",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T> From<&Result<T, RelayError>> for ErrorCode {
    fn from(result: &Result<T, RelayError>) -> Self {
        match result {
            Ok(_) => ErrorCode::Success,
            Err(e) => e.code(),
        }
    }
}

/// Human-readable text for a result code.
pub fn error_string(code: ErrorCode) -> &'static str {
    code.as_str()
}

/// Like [`error_string`], for codes received as raw integers.
pub fn error_string_raw(code: i32) -> &'static str {
    ErrorCode::from_i32(code).map_or("Unknown error", ErrorCode::as_str)
}
