//! Newline framing for the inbound byte stream.

/// Bytes requested from the transport per read.
pub const READ_CHUNK_BYTES: usize = 4096;

/// Default ceiling on buffered, not yet terminated bytes.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 2 * READ_CHUNK_BYTES;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("unterminated message exceeds {max} bytes ({buffered} buffered)")]
    Overflow { buffered: usize, max: usize },
}

/// Accumulates raw reads and yields complete `\n`-terminated messages.
///
/// One framer belongs to one connection.  Trailing bytes that never see a
/// newline are discarded together with the framer when the connection drops.
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    max_frame_bytes: usize,
}

impl LineFramer {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(READ_CHUNK_BYTES),
            max_frame_bytes,
        }
    }

    /// Append one read's worth of bytes and add every message it completed
    /// to `out`, in order, without their newlines.
    ///
    /// Fails when the unterminated remainder grows past the configured
    /// ceiling; the connection should then be dropped.  Messages completed
    /// by the same read are still appended to `out` before the error is
    /// returned.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<String>) -> Result<(), FrameError> {
        // Only the new bytes can contain a newline; everything already
        // buffered is a partial message.
        let scan_from = self.buf.len();
        self.buf.extend_from_slice(chunk);

        let mut consumed = 0;
        let mut cursor = scan_from;
        while let Some(offset) = self.buf[cursor..].iter().position(|&b| b == b'\n') {
            let end = cursor + offset;
            out.push(String::from_utf8_lossy(&self.buf[consumed..end]).into_owned());
            consumed = end + 1;
            cursor = consumed;
        }
        self.buf.drain(..consumed);

        if self.buf.len() > self.max_frame_bytes {
            let buffered = self.buf.len();
            self.buf.clear();
            return Err(FrameError::Overflow {
                buffered,
                max: self.max_frame_bytes,
            });
        }
        Ok(())
    }

    /// Bytes held for a message whose newline has not arrived yet.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}
