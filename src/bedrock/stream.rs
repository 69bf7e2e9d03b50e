//! Upstream chunk source
//!
//! Turns the raw event-stream response body into a pull-based sequence of
//! [`StreamChunk`]s: each call awaits the next chunk or end of stream.

use std::future::Future;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::errors::enhance_bedrock_error;
use super::model::chunk::StreamChunk;
use super::parser::EventStreamDecoder;
use super::parser::error::ParseError;
use super::parser::frame::Frame;

/// Pull side of the upstream model stream
pub trait ChunkSource {
    /// Await the next chunk; `Ok(None)` once the upstream is exhausted
    fn next_chunk(&mut self) -> impl Future<Output = anyhow::Result<Option<StreamChunk>>> + Send;
}

/// [`ChunkSource`] over an `application/vnd.amazon.eventstream` byte stream
pub struct EventStreamSource<S> {
    body: S,
    decoder: EventStreamDecoder,
    bytes_received: usize,
    exhausted: bool,
}

impl<S> EventStreamSource<S> {
    pub fn new(body: S) -> Self {
        Self {
            body,
            decoder: EventStreamDecoder::new(),
            bytes_received: 0,
            exhausted: false,
        }
    }

    #[cfg(test)]
    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    #[cfg(test)]
    pub fn frames_decoded(&self) -> usize {
        self.decoder.frames_decoded()
    }
}

impl<S, E> ChunkSource for EventStreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    async fn next_chunk(&mut self) -> anyhow::Result<Option<StreamChunk>> {
        loop {
            while let Some(frame) = self.decoder.decode()? {
                if let Some(chunk) = frame_to_chunk(frame)? {
                    return Ok(Some(chunk));
                }
            }

            if self.exhausted {
                self.decoder.finish()?;
                return Ok(None);
            }

            match self.body.next().await {
                Some(Ok(bytes)) => {
                    self.bytes_received += bytes.len();
                    self.decoder.feed(&bytes)?;
                }
                Some(Err(e)) => {
                    return Err(anyhow::Error::new(e).context("Failed to read Bedrock response stream"));
                }
                None => {
                    tracing::debug!(
                        bytes = self.bytes_received,
                        frames = self.decoder.frames_decoded(),
                        "Bedrock response body ended"
                    );
                    self.exhausted = true;
                }
            }
        }
    }
}

/// Classify a frame: chunk events yield a chunk, other events are skipped,
/// exception and error frames fail the stream
fn frame_to_chunk(frame: Frame) -> anyhow::Result<Option<StreamChunk>> {
    match frame.message_type().unwrap_or("event") {
        "event" => match frame.event_type() {
            Some("chunk") => Ok(Some(frame.payload_as_json()?)),
            other => {
                tracing::debug!("Skipping non-chunk event: {:?}", other);
                Ok(None)
            }
        },
        "exception" | "error" => {
            let error_type = frame
                .headers
                .exception_type()
                .or_else(|| frame.headers.error_code());
            let body = if frame.payload.is_empty() {
                frame.headers.error_message().unwrap_or_default().to_string()
            } else {
                frame.payload_as_str()
            };
            let info = enhance_bedrock_error(error_type, &body);
            tracing::warn!(
                error_type = %info.error_type,
                original_message = %info.original_message,
                "Bedrock stream returned an exception"
            );
            anyhow::bail!("Bedrock stream {}: {}", info.error_type, info.user_message)
        }
        other => Err(ParseError::InvalidMessageType(other.to_string()).into()),
    }
}
