//! Event stream decoding errors

use std::fmt;

/// Failure while decoding event stream bytes into frames
#[derive(Debug)]
pub enum ParseError {
    /// A header or value ran past the end of its slice
    Truncated { needed: usize, available: usize },
    /// Prelude checksum does not match
    PreludeCrcMismatch { expected: u32, actual: u32 },
    /// Whole-message checksum does not match
    MessageCrcMismatch { expected: u32, actual: u32 },
    /// Unknown header value type tag
    InvalidHeaderType(u8),
    /// Structurally invalid header block
    HeaderParseFailed(String),
    MessageTooLarge { length: u32, max: u32 },
    MessageTooSmall { length: u32, min: u32 },
    /// `:message-type` header other than event/error/exception
    InvalidMessageType(String),
    /// Frame payload is not the expected JSON
    PayloadDeserialize(serde_json::Error),
    /// Upstream ended in the middle of a frame
    UnexpectedEof { pending: usize },
    /// Decoder already failed; no further frames are produced
    Stopped,
    BufferOverflow { size: usize, max: usize },
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PayloadDeserialize(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "Truncated data: need {} bytes, have {} bytes", needed, available)
            }
            Self::PreludeCrcMismatch { expected, actual } => write!(
                f,
                "Prelude CRC verification failed: expected 0x{:08x}, actual 0x{:08x}",
                expected, actual
            ),
            Self::MessageCrcMismatch { expected, actual } => write!(
                f,
                "Message CRC verification failed: expected 0x{:08x}, actual 0x{:08x}",
                expected, actual
            ),
            Self::InvalidHeaderType(t) => write!(f, "Invalid header value type: {}", t),
            Self::HeaderParseFailed(msg) => write!(f, "Header parsing failed: {}", msg),
            Self::MessageTooLarge { length, max } => {
                write!(f, "Message length exceeds limit: {} bytes (max {})", length, max)
            }
            Self::MessageTooSmall { length, min } => {
                write!(f, "Message length too small: {} bytes (min {})", length, min)
            }
            Self::InvalidMessageType(t) => write!(f, "Invalid message type: {}", t),
            Self::PayloadDeserialize(e) => write!(f, "Payload deserialization failed: {}", e),
            Self::UnexpectedEof { pending } => {
                write!(f, "Stream ended inside a frame ({} bytes pending)", pending)
            }
            Self::Stopped => write!(f, "Decoder stopped after a previous error"),
            Self::BufferOverflow { size, max } => {
                write!(f, "Buffer overflow: {} bytes (max {})", size, max)
            }
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::PayloadDeserialize(e)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
