//! Bedrock request and response payload types

pub mod chunk;
pub mod events;
pub mod requests;
