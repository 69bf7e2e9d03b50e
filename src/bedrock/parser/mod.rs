//! AWS Event Stream parser
//!
//! Decodes the `application/vnd.amazon.eventstream` framing that Bedrock
//! uses for `InvokeModelWithResponseStream` responses

pub mod crc;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod header;

pub use decoder::EventStreamDecoder;
