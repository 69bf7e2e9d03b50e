//! Trivia question service
//!
//! # Endpoints
//! - `POST /questions` - stream generated questions as plain text
//! - `POST /` - same handler, for function-URL style callers
//!
//! The response body is the model output relayed fragment by fragment; once
//! complete it is expected to be a JSON array of
//! `{question, answers, correctAnswer}` objects, but it is not validated here.

mod handlers;
mod middleware;
pub mod prompt;
pub mod relay;
mod router;
pub mod sink;
pub mod types;

pub use middleware::AppState;
pub use router::create_router;
