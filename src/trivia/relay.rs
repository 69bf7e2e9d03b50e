//! Question-stream relay
//!
//! Builds the prompt, opens the model stream and forwards every text delta
//! to a [`FragmentSink`] in arrival order.
//!
//! ```text
//! Idle ──> PromptBuilt ──> Invoking ──> Streaming ──> Closed
//!                              │            │
//!                              └────────────┴──────> Failed
//! ```
//!
//! Errors are never recovered here: a failed invocation, a broken upstream or a
//! single undecodable chunk ends the relay in `Failed` and is returned to the
//! caller. Fragments already written stay written.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::bedrock::model::events::ModelEvent;
use crate::bedrock::provider::ModelInvoker;
use crate::bedrock::stream::ChunkSource;

use super::prompt::render_prompt;
use super::types::GenerationRequest;

/// Push side of the relay: where text fragments go
pub trait FragmentSink {
    /// Deliver one fragment; resolves once the caller has room for it
    fn write(&mut self, fragment: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Mark the output complete
    fn close(&mut self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    PromptBuilt,
    Invoking,
    Streaming,
    Closed,
    Failed,
}

impl RelayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PromptBuilt => "prompt_built",
            Self::Invoking => "invoking",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a completed relay forwarded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelaySummary {
    /// Chunks pulled from upstream
    pub chunks: usize,
    /// Text fragments written to the sink
    pub fragments: usize,
    /// Concatenation of every forwarded fragment
    pub text: String,
}

/// One question-generation relay; not reusable after reaching a terminal state
pub struct QuestionRelay<I> {
    invoker: Arc<I>,
    state: RelayState,
}

impl<I: ModelInvoker> QuestionRelay<I> {
    pub fn new(invoker: Arc<I>) -> Self {
        Self {
            invoker,
            state: RelayState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> RelayState {
        self.state
    }

    fn transition(&mut self, next: RelayState) {
        tracing::debug!(from = %self.state, to = %next, "Relay state change");
        self.state = next;
    }

    /// Render the prompt and open the upstream model stream
    pub async fn open(&mut self, request: &GenerationRequest) -> anyhow::Result<I::Source> {
        anyhow::ensure!(
            self.state == RelayState::Idle,
            "Relay cannot open from state {}",
            self.state
        );

        let prompt = render_prompt(request);
        self.transition(RelayState::PromptBuilt);

        let body = self.invoker.settings().body_for(prompt);
        self.transition(RelayState::Invoking);

        match self.invoker.invoke_stream(&body).await {
            Ok(source) => Ok(source),
            Err(e) => {
                tracing::error!("Model invocation failed: {:#}", e);
                self.transition(RelayState::Failed);
                Err(e)
            }
        }
    }

    /// Drain `source` into `sink`, closing the sink when upstream ends
    pub async fn forward<S, W>(&mut self, source: &mut S, sink: &mut W) -> anyhow::Result<RelaySummary>
    where
        S: ChunkSource + Send,
        W: FragmentSink + Send,
    {
        anyhow::ensure!(
            self.state == RelayState::Invoking,
            "Relay cannot stream from state {}",
            self.state
        );

        match self.pump(source, sink).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::error!("Relay aborted: {:#}", e);
                self.transition(RelayState::Failed);
                Err(e)
            }
        }
    }

    async fn pump<S, W>(&mut self, source: &mut S, sink: &mut W) -> anyhow::Result<RelaySummary>
    where
        S: ChunkSource + Send,
        W: FragmentSink + Send,
    {
        let mut summary = RelaySummary::default();

        while let Some(chunk) = source.next_chunk().await? {
            if self.state == RelayState::Invoking {
                self.transition(RelayState::Streaming);
            }
            summary.chunks += 1;
            tracing::debug!(index = summary.chunks, bytes = %chunk.bytes, "CHUNK");

            let event = chunk.decode()?;
            tracing::debug!(?event, "PARSED");

            match event {
                ModelEvent::TextDelta(text) => {
                    sink.write(&text).await?;
                    summary.fragments += 1;
                    summary.text.push_str(&text);
                }
                ModelEvent::MessageStop(Some(metrics)) => {
                    tracing::info!(
                        input_tokens = ?metrics.input_token_count,
                        output_tokens = ?metrics.output_token_count,
                        latency_ms = ?metrics.invocation_latency,
                        "Model invocation metrics"
                    );
                }
                other => {
                    tracing::debug!(kind = %other.kind(), "Skipping non-text event");
                }
            }
        }

        sink.close().await?;
        self.transition(RelayState::Closed);

        tracing::info!(
            chunks = summary.chunks,
            fragments = summary.fragments,
            "Stream retrieval is complete"
        );
        tracing::info!("Final full response: {}", summary.text);

        Ok(summary)
    }
}
