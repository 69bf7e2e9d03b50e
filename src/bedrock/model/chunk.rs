//! Response stream chunk envelope
//!
//! The payload of every `chunk` event frame is `{"bytes": "<base64>"}`; the
//! base64 text decodes to the UTF-8 JSON of one [`ModelEvent`].

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::events::ModelEvent;

/// Failure decoding a chunk into an event
#[derive(Debug)]
pub enum ChunkError {
    Base64(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
    Json(serde_json::Error),
    /// `content_block_delta` without `delta.text`
    MissingText,
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(e) => write!(f, "Chunk is not valid base64: {}", e),
            Self::Utf8(e) => write!(f, "Chunk is not valid UTF-8: {}", e),
            Self::Json(e) => write!(f, "Chunk is not valid JSON: {}", e),
            Self::MissingText => write!(f, "content_block_delta chunk has no delta.text"),
        }
    }
}

impl std::error::Error for ChunkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(e) => Some(e),
            Self::Utf8(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::MissingText => None,
        }
    }
}

impl From<base64::DecodeError> for ChunkError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

impl From<std::string::FromUtf8Error> for ChunkError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}

impl From<serde_json::Error> for ChunkError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// One upstream chunk, still encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub bytes: String,
}

impl StreamChunk {
    /// Wrap an event JSON string the way Bedrock does
    #[cfg(test)]
    pub fn from_event_json(json: &str) -> Self {
        Self {
            bytes: STANDARD.encode(json),
        }
    }

    /// Decoded JSON text of the event
    pub fn payload(&self) -> Result<String, ChunkError> {
        let raw = STANDARD.decode(&self.bytes)?;
        Ok(String::from_utf8(raw)?)
    }

    pub fn decode(&self) -> Result<ModelEvent, ChunkError> {
        ModelEvent::from_json(&self.payload()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedrock::model::events::EventKind;

    #[test]
    fn test_decode_text_delta() {
        let chunk = StreamChunk::from_event_json(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#,
        );
        assert_eq!(chunk.decode().unwrap(), ModelEvent::TextDelta("Hello".to_string()));
    }

    #[test]
    fn test_decode_known_wire_value() {
        // {"type":"ping"}
        let chunk = StreamChunk {
            bytes: "eyJ0eXBlIjoicGluZyJ9".to_string(),
        };
        assert_eq!(chunk.decode().unwrap(), ModelEvent::Other(EventKind::Ping));
    }

    #[test]
    fn test_decode_bad_base64() {
        let chunk = StreamChunk {
            bytes: "not base64!".to_string(),
        };
        assert!(matches!(chunk.decode(), Err(ChunkError::Base64(_))));
    }

    #[test]
    fn test_decode_bad_utf8() {
        let chunk = StreamChunk {
            bytes: STANDARD.encode([0xff, 0xfe, 0xfd]),
        };
        assert!(matches!(chunk.decode(), Err(ChunkError::Utf8(_))));
    }

    #[test]
    fn test_envelope_deserialize() {
        let chunk: StreamChunk = serde_json::from_str(r#"{"bytes":"eyJ0eXBlIjoicGluZyJ9","p":"abcd"}"#).unwrap();
        assert_eq!(chunk.payload().unwrap(), r#"{"type":"ping"}"#);
    }
}
