//! Amazon Bedrock runtime client module

pub mod errors;
pub mod model;
pub mod parser;
pub mod provider;
pub mod stream;
