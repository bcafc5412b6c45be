/*!
 * Message Framing
 *
 * Pipes carry a byte stream without boundaries, so every message travels as
 * one frame: a 4-byte big-endian length followed by the payload. A sender
 * writes exactly one frame and closes its end; the receiver reads to
 * end-of-stream (bounded) and checks that the stream holds exactly that frame.
 *
 * The combined message of the duplex exchange is additionally split into two
 * fields by a single `|` delimiter.
 */

use crate::core::limits::{FIELD_DELIMITER, FRAME_HEADER_LEN};
use miette::Diagnostic;
use std::io::{self, Read, Write};
use thiserror::Error;
use tracing::debug;

/// Framing operation result
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Malformed or oversized messages
#[derive(Debug, Error, Diagnostic)]
pub enum ProtocolError {
    #[error("combined message has no '{}' delimiter", FIELD_DELIMITER)]
    #[diagnostic(
        code(protocol::missing_delimiter),
        help("The peer must send exactly one delimiter between the two fields.")
    )]
    MissingDelimiter,

    #[error("combined message has {count} '{}' delimiters, expected exactly one", FIELD_DELIMITER)]
    #[diagnostic(code(protocol::extra_delimiter))]
    ExtraDelimiter { count: usize },

    #[error("{field} field contains the reserved '{}' delimiter", FIELD_DELIMITER)]
    #[diagnostic(
        code(protocol::delimiter_in_field),
        help("Inputs must not contain the delimiter character.")
    )]
    DelimiterInField { field: &'static str },

    #[error("message of {len} bytes exceeds the {max} byte limit")]
    #[diagnostic(
        code(protocol::too_large),
        help("Raise PIPEWORKS_MAX_MESSAGE_BYTES or send a shorter message.")
    )]
    TooLarge { len: usize, max: usize },

    #[error("stream ended after {actual} of {expected} expected bytes")]
    #[diagnostic(
        code(protocol::truncated),
        help("The peer closed its end before sending a complete message; check whether it failed.")
    )]
    Truncated { expected: usize, actual: usize },

    #[error("{extra} unexpected bytes after the frame")]
    #[diagnostic(code(protocol::trailing_bytes))]
    TrailingBytes { extra: usize },

    #[error("message is not valid UTF-8")]
    #[diagnostic(code(protocol::not_utf8))]
    NotUtf8,

    #[error("I/O error while exchanging a frame: {0}")]
    #[diagnostic(code(protocol::io))]
    Io(#[from] io::Error),
}

/// Encode `payload` as one frame
pub fn encode_frame(payload: &[u8], max: usize) -> ProtocolResult<Vec<u8>> {
    let len = payload.len();
    if len > max || len > u32::MAX as usize {
        return Err(ProtocolError::TooLarge { len, max });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + len);
    frame.extend_from_slice(&(len as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Check that `bytes` holds exactly one frame and return its payload
pub fn decode_frame(bytes: &[u8], max: usize) -> ProtocolResult<&[u8]> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            expected: FRAME_HEADER_LEN,
            actual: bytes.len(),
        });
    }

    let (header, body) = bytes.split_at(FRAME_HEADER_LEN);
    let mut len_bytes = [0u8; FRAME_HEADER_LEN];
    len_bytes.copy_from_slice(header);
    let len = u32::from_be_bytes(len_bytes) as usize;

    if len > max {
        return Err(ProtocolError::TooLarge { len, max });
    }
    if body.len() < len {
        return Err(ProtocolError::Truncated {
            expected: len,
            actual: body.len(),
        });
    }
    if body.len() > len {
        return Err(ProtocolError::TrailingBytes {
            extra: body.len() - len,
        });
    }

    Ok(body)
}

/// Write one frame to `writer`
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8], max: usize) -> ProtocolResult<()> {
    let frame = encode_frame(payload, max)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    debug!(payload_len = payload.len(), "Frame written");
    Ok(())
}

/// Read to end-of-stream and return the single frame's payload
///
/// Reads at most one byte more than the largest legal frame, so an
/// oversized stream is rejected without being buffered whole.
pub fn read_frame<R: Read>(reader: &mut R, max: usize) -> ProtocolResult<Vec<u8>> {
    let limit = (FRAME_HEADER_LEN + max + 1) as u64;
    let mut buf = Vec::new();
    reader.take(limit).read_to_end(&mut buf)?;

    let payload = decode_frame(&buf, max)?.to_vec();
    debug!(payload_len = payload.len(), "Frame read");
    Ok(payload)
}

/// Two text fields joined by the single field delimiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage {
    head: String,
    tail: String,
}

impl FramedMessage {
    /// Build a message; neither field may contain the delimiter
    pub fn new(head: impl Into<String>, tail: impl Into<String>) -> ProtocolResult<Self> {
        let head = head.into();
        let tail = tail.into();

        if head.contains(FIELD_DELIMITER) {
            return Err(ProtocolError::DelimiterInField { field: "head" });
        }
        if tail.contains(FIELD_DELIMITER) {
            return Err(ProtocolError::DelimiterInField { field: "tail" });
        }

        Ok(Self { head, tail })
    }

    /// Parse `head|tail`, requiring exactly one delimiter
    pub fn parse(payload: &str) -> ProtocolResult<Self> {
        let count = payload.matches(FIELD_DELIMITER).count();
        match payload.split_once(FIELD_DELIMITER) {
            None => Err(ProtocolError::MissingDelimiter),
            Some(_) if count > 1 => Err(ProtocolError::ExtraDelimiter { count }),
            Some((head, tail)) => Ok(Self {
                head: head.to_string(),
                tail: tail.to_string(),
            }),
        }
    }

    /// Parse from raw frame payload bytes
    pub fn from_bytes(payload: &[u8]) -> ProtocolResult<Self> {
        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
        Self::parse(text)
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn into_parts(self) -> (String, String) {
        (self.head, self.tail)
    }

    /// Wire form `head|tail`
    pub fn to_payload(&self) -> String {
        format!("{}{}{}", self.head, FIELD_DELIMITER, self.tail)
    }
}
