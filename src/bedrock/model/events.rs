//! Model stream events
//!
//! Each chunk payload decodes to one Anthropic Messages streaming event. Only
//! `content_block_delta` carries text; the rest are recognised so they can be
//! logged and skipped.

use serde::Deserialize;

use super::chunk::ChunkError;

/// Event discriminant (`type` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta,
    ContentBlockStop,
    MessageDelta,
    MessageStop,
    Ping,
    Unknown,
}

impl EventKind {
    pub fn from_str(s: &str) -> Self {
        match s {
            "message_start" => Self::MessageStart,
            "content_block_start" => Self::ContentBlockStart,
            "content_block_delta" => Self::ContentBlockDelta,
            "content_block_stop" => Self::ContentBlockStop,
            "message_delta" => Self::MessageDelta,
            "message_stop" => Self::MessageStop,
            "ping" => Self::Ping,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageStart => "message_start",
            Self::ContentBlockStart => "content_block_start",
            Self::ContentBlockDelta => "content_block_delta",
            Self::ContentBlockStop => "content_block_stop",
            Self::MessageDelta => "message_delta",
            Self::MessageStop => "message_stop",
            Self::Ping => "ping",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Usage figures Bedrock attaches to the final `message_stop` event
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationMetrics {
    #[serde(default)]
    pub input_token_count: Option<u64>,
    #[serde(default)]
    pub output_token_count: Option<u64>,
    #[serde(default)]
    pub invocation_latency: Option<u64>,
    #[serde(default)]
    pub first_byte_latency: Option<u64>,
}

/// Decoded stream event
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// Text fragment from a `content_block_delta`
    TextDelta(String),
    /// End of message, with metrics when Bedrock supplies them
    MessageStop(Option<InvocationMetrics>),
    /// Any other event; never forwarded
    Other(EventKind),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
    #[serde(default)]
    delta: Option<RawDelta>,
    #[serde(rename = "amazon-bedrock-invocationMetrics", default)]
    metrics: Option<InvocationMetrics>,
}

#[derive(Debug, Deserialize)]
struct RawDelta {
    #[serde(default)]
    text: Option<String>,
}

impl ModelEvent {
    /// Parse the JSON text carried inside a chunk
    pub fn from_json(json: &str) -> Result<Self, ChunkError> {
        let raw: RawEvent = serde_json::from_str(json)?;
        let kind = raw
            .event_type
            .as_deref()
            .map(EventKind::from_str)
            .unwrap_or(EventKind::Unknown);

        match kind {
            EventKind::ContentBlockDelta => raw
                .delta
                .and_then(|d| d.text)
                .map(Self::TextDelta)
                .ok_or(ChunkError::MissingText),
            EventKind::MessageStop => Ok(Self::MessageStop(raw.metrics)),
            other => Ok(Self::Other(other)),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::TextDelta(_) => EventKind::ContentBlockDelta,
            Self::MessageStop(_) => EventKind::MessageStop,
            Self::Other(kind) => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_str() {
        assert_eq!(
            EventKind::from_str("content_block_delta"),
            EventKind::ContentBlockDelta
        );
        assert_eq!(EventKind::from_str("message_start"), EventKind::MessageStart);
        assert_eq!(EventKind::from_str("something_new"), EventKind::Unknown);
        assert_eq!(EventKind::MessageStop.as_str(), "message_stop");
    }

    #[test]
    fn test_text_delta() {
        let json = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"[{"}}"#;
        assert_eq!(
            ModelEvent::from_json(json).unwrap(),
            ModelEvent::TextDelta("[{".to_string())
        );
    }

    #[test]
    fn test_delta_without_text_is_an_error() {
        let json = r#"{"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{"}}"#;
        assert!(matches!(
            ModelEvent::from_json(json),
            Err(ChunkError::MissingText)
        ));
    }

    #[test]
    fn test_message_delta_is_not_text() {
        // message_delta also has a `delta` object, but it must never be forwarded
        let json = r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":12}}"#;
        assert_eq!(
            ModelEvent::from_json(json).unwrap(),
            ModelEvent::Other(EventKind::MessageDelta)
        );
    }

    #[test]
    fn test_message_stop_metrics() {
        let json = r#"{"type":"message_stop","amazon-bedrock-invocationMetrics":{"inputTokenCount":310,"outputTokenCount":42,"invocationLatency":2100,"firstByteLatency":380}}"#;
        let event = ModelEvent::from_json(json).unwrap();
        let ModelEvent::MessageStop(Some(metrics)) = event else {
            panic!("expected metrics, got {:?}", event);
        };
        assert_eq!(metrics.input_token_count, Some(310));
        assert_eq!(metrics.output_token_count, Some(42));
    }

    #[test]
    fn test_missing_type_is_unknown() {
        let event = ModelEvent::from_json(r#"{"hello":"world"}"#).unwrap();
        assert_eq!(event.kind(), EventKind::Unknown);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ModelEvent::from_json("{not json"),
            Err(ChunkError::Json(_))
        ));
    }
}
