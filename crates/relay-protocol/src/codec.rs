//! Envelope codec.
//!
//! Outbound envelopes are template strings; the caller-supplied telemetry
//! object is inserted verbatim.  Inbound envelopes are read with
//! [`find_value`], a first-match scanner for `"key":` followed by a scalar.
//! It does not handle escape sequences, nested objects or repeated keys.

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Client → relay, first message on every connection.
    Register { client_id: String },
    /// Client → relay data push.  `data` is raw JSON text.
    Telemetry { client_id: String, data: String },
    /// Relay → client instruction.  `parameters` is empty when absent.
    Command { name: String, parameters: String },
    /// Relay → client acknowledgement (`{"status":"ok","message":...}`).
    Ack { status: String, message: String },
}

impl Envelope {
    /// Render as one wire line, including the trailing newline.
    pub fn to_line(&self) -> String {
        match self {
            Envelope::Register { client_id } => encode_register(client_id),
            Envelope::Telemetry { client_id, data } => encode_telemetry(client_id, data),
            Envelope::Command { name, parameters } => format!(
                "{{\"type\":\"command\",\"command_name\":\"{name}\",\"parameters\":\"{parameters}\"}}\n"
            ),
            Envelope::Ack { status, message } => {
                format!("{{\"status\":\"{status}\",\"message\":\"{message}\"}}\n")
            }
        }
    }

    /// Wire name of the `type` field, if the envelope carries one.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Register { .. } => "register",
            Envelope::Telemetry { .. } => "telemetry",
            Envelope::Command { .. } => "command",
            Envelope::Ack { .. } => "ack",
        }
    }
}

/// Why an inbound line produced no envelope.  Never fatal to a connection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no \"type\" key")]
    MissingType,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("{kind} message without \"{field}\"")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

/// `{"type":"register","client_id":"<id>"}\n`
pub fn encode_register(client_id: &str) -> String {
    format!("{{\"type\":\"register\",\"client_id\":\"{client_id}\"}}\n")
}

/// `{"type":"telemetry","client_id":"<id>","data":<data>}\n`
///
/// `data` must already be a JSON object; it is neither parsed nor escaped.
pub fn encode_telemetry(client_id: &str, data: &str) -> String {
    format!("{{\"type\":\"telemetry\",\"client_id\":\"{client_id}\",\"data\":{data}}}\n")
}

/// Decode one line (without its newline) into an [`Envelope`].
pub fn decode(line: &str) -> Result<Envelope, DecodeError> {
    let Some(kind) = find_value(line, "type") else {
        // Acks from the relay carry no type.
        return match find_value(line, "status") {
            Some(status) => Ok(Envelope::Ack {
                status: status.to_string(),
                message: find_value(line, "message").unwrap_or_default().to_string(),
            }),
            None => Err(DecodeError::MissingType),
        };
    };

    match kind {
        "command" => {
            let name = require(line, "command", "command_name")?;
            let parameters = find_value(line, "parameters").unwrap_or_default();
            Ok(Envelope::Command {
                name: name.to_string(),
                parameters: parameters.to_string(),
            })
        }
        "register" => Ok(Envelope::Register {
            client_id: require(line, "register", "client_id")?.to_string(),
        }),
        "telemetry" => {
            let client_id = require(line, "telemetry", "client_id")?;
            let data = raw_object_after(line, "data").ok_or(DecodeError::MissingField {
                kind: "telemetry",
                field: "data",
            })?;
            Ok(Envelope::Telemetry {
                client_id: client_id.to_string(),
                data: data.to_string(),
            })
        }
        other => Err(DecodeError::UnknownType(other.to_string())),
    }
}

fn require<'a>(
    line: &'a str,
    kind: &'static str,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    find_value(line, field).ok_or(DecodeError::MissingField { kind, field })
}

/// Find the scalar value of the first `"key":` in `text`.
///
/// Spaces and tabs after the colon are skipped.  A quoted value ends at the
/// next `"` (an unterminated quote yields `None`).  An unquoted value runs to
/// the next `,`, `}` or newline with trailing spaces and tabs trimmed.
pub fn find_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let rest = after_key(text, key)?;

    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        return Some(&quoted[..end]);
    }

    let end = rest.find([',', '}', '\n']).unwrap_or(rest.len());
    Some(rest[..end].trim_end_matches([' ', '\t']))
}

/// Text following `"key":` with leading spaces and tabs skipped.
fn after_key<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{key}\":");
    let start = text.find(&needle)? + needle.len();
    Some(text[start..].trim_start_matches([' ', '\t']))
}

/// Raw text of the object value of `key`, up to the envelope's final `}`.
/// Only meaningful when `key` is the last member, as in telemetry.
fn raw_object_after<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let rest = after_key(text, key)?;
    let close = rest.rfind('}')?;
    let raw = rest[..close].trim_end();
    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}
