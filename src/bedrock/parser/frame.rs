//! AWS Event Stream message frame parsing
//!
//! ## Message Format
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬──────────┬──────────┬───────────┐
//! │ Total Length │ Header Length│ Prelude CRC  │ Headers  │ Payload  │ Msg CRC   │
//! │   (4 bytes)  │   (4 bytes)  │   (4 bytes)  │ (var)    │ (var)    │ (4 bytes) │
//! └──────────────┴──────────────┴──────────────┴──────────┴──────────┴───────────┘
//! ```
//!
//! - Total Length counts the whole message, itself included
//! - Prelude CRC covers the first 8 bytes
//! - Message CRC covers everything before it
//!
//! For Bedrock response streams the payload of an `event` frame is a JSON
//! object `{"bytes": "<base64>"}`.

use bytes::Buf;

use super::crc::crc32;
use super::error::{ParseError, ParseResult};
use super::header::{Headers, parse_headers};

/// Prelude fixed size (12 bytes)
pub const PRELUDE_SIZE: usize = 12;

/// Prelude plus trailing message CRC
pub const MIN_MESSAGE_SIZE: usize = PRELUDE_SIZE + 4;

/// Maximum message size limit (16 MB)
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// One decoded message frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub headers: Headers,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn message_type(&self) -> Option<&str> {
        self.headers.message_type()
    }

    pub fn event_type(&self) -> Option<&str> {
        self.headers.event_type()
    }

    pub fn payload_as_json<T: serde::de::DeserializeOwned>(&self) -> ParseResult<T> {
        serde_json::from_slice(&self.payload).map_err(ParseError::PayloadDeserialize)
    }

    pub fn payload_as_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Try to parse one complete frame from the front of `buffer`
///
/// Stateless; buffering lives in [`super::EventStreamDecoder`].
///
/// # Returns
/// - `Ok(Some((frame, consumed)))` - a frame and the number of bytes it occupied
/// - `Ok(None)` - not enough bytes yet
/// - `Err(e)` - the bytes cannot be a valid frame
pub fn parse_frame(buffer: &[u8]) -> ParseResult<Option<(Frame, usize)>> {
    if buffer.len() < PRELUDE_SIZE {
        return Ok(None);
    }

    let mut prelude = &buffer[..PRELUDE_SIZE];
    let total_length = prelude.get_u32();
    let header_length = prelude.get_u32() as usize;
    let prelude_crc = prelude.get_u32();

    if total_length < MIN_MESSAGE_SIZE as u32 {
        return Err(ParseError::MessageTooSmall {
            length: total_length,
            min: MIN_MESSAGE_SIZE as u32,
        });
    }
    if total_length > MAX_MESSAGE_SIZE {
        return Err(ParseError::MessageTooLarge {
            length: total_length,
            max: MAX_MESSAGE_SIZE,
        });
    }

    // Check the prelude before trusting the length to wait for more data
    let actual_prelude_crc = crc32(&buffer[..8]);
    if actual_prelude_crc != prelude_crc {
        return Err(ParseError::PreludeCrcMismatch {
            expected: prelude_crc,
            actual: actual_prelude_crc,
        });
    }

    let total_length = total_length as usize;
    if buffer.len() < total_length {
        return Ok(None);
    }

    let body_end = total_length - 4;
    let message_crc = (&buffer[body_end..total_length]).get_u32();
    let actual_message_crc = crc32(&buffer[..body_end]);
    if actual_message_crc != message_crc {
        return Err(ParseError::MessageCrcMismatch {
            expected: message_crc,
            actual: actual_message_crc,
        });
    }

    let headers_end = PRELUDE_SIZE + header_length;
    if headers_end > body_end {
        return Err(ParseError::HeaderParseFailed(
            "Header length exceeds message boundary".to_string(),
        ));
    }

    let headers = parse_headers(&buffer[PRELUDE_SIZE..headers_end])?;
    let payload = buffer[headers_end..body_end].to_vec();

    Ok(Some((Frame { headers, payload }, total_length)))
}

/// Encode a frame with string headers (test fixtures only)
#[cfg(test)]
pub(crate) fn encode_frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let header_bytes = super::header::encode_string_headers(headers);
    let total = MIN_MESSAGE_SIZE + header_bytes.len() + payload.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(header_bytes.len() as u32).to_be_bytes());
    let prelude_crc = crc32(&out);
    out.extend_from_slice(&prelude_crc.to_be_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(payload);
    let message_crc = crc32(&out);
    out.extend_from_slice(&message_crc.to_be_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_frame() -> Vec<u8> {
        encode_frame(
            &[(":message-type", "event"), (":event-type", "chunk")],
            br#"{"bytes":"e30="}"#,
        )
    }

    #[test]
    fn test_frame_insufficient_prelude() {
        let buffer = [0u8; 10];
        assert!(matches!(parse_frame(&buffer), Ok(None)));
    }

    #[test]
    fn test_frame_roundtrip_fields() {
        let bytes = chunk_frame();
        let (frame, consumed) = parse_frame(&bytes).unwrap().unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(frame.message_type(), Some("event"));
        assert_eq!(frame.event_type(), Some("chunk"));
        assert_eq!(frame.payload_as_str(), r#"{"bytes":"e30="}"#);
    }

    #[test]
    fn test_frame_waits_for_body() {
        let bytes = chunk_frame();
        assert!(matches!(parse_frame(&bytes[..bytes.len() - 1]), Ok(None)));
    }

    #[test]
    fn test_frame_only_consumes_first_message() {
        let mut bytes = chunk_frame();
        let first_len = bytes.len();
        bytes.extend(chunk_frame());
        let (_, consumed) = parse_frame(&bytes).unwrap().unwrap();
        assert_eq!(consumed, first_len);
    }

    #[test]
    fn test_frame_message_too_small() {
        let mut buffer = vec![0u8; 16];
        buffer[0..4].copy_from_slice(&10u32.to_be_bytes());
        let prelude_crc = crc32(&buffer[0..8]);
        buffer[8..12].copy_from_slice(&prelude_crc.to_be_bytes());

        let result = parse_frame(&buffer);
        assert!(matches!(result, Err(ParseError::MessageTooSmall { .. })));
    }

    #[test]
    fn test_frame_prelude_crc_mismatch() {
        let mut bytes = chunk_frame();
        bytes[8] ^= 0xff;
        assert!(matches!(parse_frame(&bytes), Err(ParseError::PreludeCrcMismatch { .. })));
    }

    #[test]
    fn test_frame_message_crc_mismatch() {
        let mut bytes = chunk_frame();
        let last = bytes.len() - 5;
        bytes[last] ^= 0x01;
        assert!(matches!(parse_frame(&bytes), Err(ParseError::MessageCrcMismatch { .. })));
    }
}
