//! Streaming event stream decoder
//!
//! Buffers network reads and yields complete frames in order.
//!
//! ```text
//! ┌─────────┐  feed()/decode()   ┌─────────┐
//! │  Ready  │ ─────────────────> │ Parsing │
//! └─────────┘ <───── frame ───── └────┬────┘
//!                                     │ any error
//!                                     ↓
//!                               ┌───────────┐
//!                               │  Stopped  │ (terminal)
//!                               └───────────┘
//! ```
//!
//! A corrupted frame stops the decoder for good: the relay treats a bad chunk
//! as fatal, so there is no resynchronisation.

use bytes::{Buf, BytesMut};

use super::error::{ParseError, ParseResult};
use super::frame::{Frame, parse_frame};

/// Default maximum buffer size (16 MB)
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Default initial buffer capacity
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Ready,
    Parsing,
    Stopped,
}

/// Incremental decoder for `application/vnd.amazon.eventstream` bodies
///
/// # Example
///
/// ```rust,ignore
/// let mut decoder = EventStreamDecoder::new();
/// decoder.feed(&bytes)?;
/// while let Some(frame) = decoder.decode()? {
///     println!("{:?}", frame.event_type());
/// }
/// decoder.finish()?;
/// ```
pub struct EventStreamDecoder {
    buffer: BytesMut,
    state: DecoderState,
    frames_decoded: usize,
    max_buffer_size: usize,
}

impl Default for EventStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_config(capacity: usize, max_buffer_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: DecoderState::Ready,
            frames_decoded: 0,
            max_buffer_size,
        }
    }

    /// Append bytes read from the network
    pub fn feed(&mut self, data: &[u8]) -> ParseResult<()> {
        if self.state == DecoderState::Stopped {
            return Err(ParseError::Stopped);
        }

        let new_size = self.buffer.len() + data.len();
        if new_size > self.max_buffer_size {
            self.state = DecoderState::Stopped;
            return Err(ParseError::BufferOverflow {
                size: new_size,
                max: self.max_buffer_size,
            });
        }

        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Decode the next complete frame, if the buffer holds one
    pub fn decode(&mut self) -> ParseResult<Option<Frame>> {
        if self.state == DecoderState::Stopped {
            return Err(ParseError::Stopped);
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }

        self.state = DecoderState::Parsing;
        match parse_frame(&self.buffer) {
            Ok(Some((frame, consumed))) => {
                self.buffer.advance(consumed);
                self.frames_decoded += 1;
                self.state = DecoderState::Ready;
                Ok(Some(frame))
            }
            Ok(None) => {
                self.state = DecoderState::Ready;
                Ok(None)
            }
            Err(e) => {
                tracing::error!(
                    frames_decoded = self.frames_decoded,
                    pending = self.buffer.len(),
                    "Event stream decoder stopped: {}",
                    e
                );
                self.state = DecoderState::Stopped;
                Err(e)
            }
        }
    }

    /// Signal end of input; leftover bytes mean the last frame was cut off
    pub fn finish(&mut self) -> ParseResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.state = DecoderState::Stopped;
        Err(ParseError::UnexpectedEof {
            pending: self.buffer.len(),
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn frames_decoded(&self) -> usize {
        self.frames_decoded
    }
}
