//! Bedrock runtime provider
//!
//! Sends `InvokeModelWithResponseStream` requests and hands back the
//! response body as a [`ChunkSource`]

use std::fmt;
use std::future::Future;

use anyhow::Context;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use uuid::Uuid;

use crate::http_client::{ProxyConfig, build_client};
use crate::model::config::{BEDROCK_API_KEY_ENV, Config};

use super::errors::{BedrockErrorInfo, enhance_bedrock_error};
use super::model::requests::InvokeBody;
use super::stream::{ChunkSource, EventStreamSource};

/// Content type of Bedrock streaming responses
const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

/// Invocation constants for one model, supplied at construction
#[derive(Debug, Clone, PartialEq)]
pub struct BedrockSettings {
    pub region: String,
    pub endpoint: String,
    pub model_id: String,
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl BedrockSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            region: config.region.clone(),
            endpoint: config.endpoint(),
            model_id: config.model_id.clone(),
            anthropic_version: config.anthropic_version.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// `POST` target for the streaming invocation
    pub fn invoke_stream_url(&self) -> String {
        format!(
            "{}/model/{}/invoke-with-response-stream",
            self.endpoint,
            urlencoding::encode(&self.model_id)
        )
    }

    /// Single-turn body for `prompt` using these settings
    pub fn body_for(&self, prompt: impl Into<String>) -> InvokeBody {
        InvokeBody::single_turn(
            self.anthropic_version.clone(),
            self.max_tokens,
            self.temperature,
            prompt,
        )
    }
}

impl Default for BedrockSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Non-success HTTP response from the invoke call
#[derive(Debug)]
pub struct UpstreamError {
    pub status: u16,
    pub info: BedrockErrorInfo,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bedrock request failed: {} {} - {}",
            self.status, self.info.error_type, self.info.user_message
        )
    }
}

impl std::error::Error for UpstreamError {}

/// Something that can open a streamed model invocation
pub trait ModelInvoker: Send + Sync + 'static {
    type Source: ChunkSource + Send + 'static;

    fn settings(&self) -> &BedrockSettings;

    /// Issue the request and return once response headers arrive
    fn invoke_stream(
        &self,
        body: &InvokeBody,
    ) -> impl Future<Output = anyhow::Result<Self::Source>> + Send;
}

/// HTTP client for the Bedrock runtime
pub struct BedrockProvider {
    settings: BedrockSettings,
    api_key: Option<String>,
    client: Client,
}

impl BedrockProvider {
    pub fn new(
        settings: BedrockSettings,
        api_key: Option<String>,
        client: Client,
    ) -> Self {
        Self {
            settings,
            api_key,
            client,
        }
    }

    /// Build the provider and its HTTP client from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let proxy = ProxyConfig::from_config(config);
        let client = build_client(proxy.as_ref(), config.request_timeout_secs, config.tls_backend)
            .context("Failed to create HTTP client")?;

        let api_key = config.effective_api_key();
        if api_key.is_none() {
            tracing::warn!(
                "No Bedrock API key configured (apiKey or {}); requests are sent unsigned and Bedrock will answer 403",
                BEDROCK_API_KEY_ENV
            );
        }

        Ok(Self::new(BedrockSettings::from_config(config), api_key, client))
    }

    fn build_headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE));
        headers.insert(
            "amz-sdk-invocation-id",
            HeaderValue::from_str(&Uuid::new_v4().to_string())?,
        );
        if let Some(key) = &self.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                .context("API key contains invalid header characters")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Point at the missing key when Bedrock refuses an unauthenticated call
    fn annotate_auth_failure(&self, status: u16, info: &mut BedrockErrorInfo) {
        if self.api_key.is_none() && matches!(status, 401 | 403) {
            info.user_message = format!(
                "{} No Bedrock API key is configured; set apiKey or {}.",
                info.user_message, BEDROCK_API_KEY_ENV
            );
        }
    }
}

impl ModelInvoker for BedrockProvider {
    type Source = EventStreamSource<BoxStream<'static, reqwest::Result<Bytes>>>;

    fn settings(&self) -> &BedrockSettings {
        &self.settings
    }

    async fn invoke_stream(&self, body: &InvokeBody) -> anyhow::Result<Self::Source> {
        let url = self.settings.invoke_stream_url();
        let request_body = serde_json::to_string(body)?;

        tracing::debug!(
            url = %url,
            model_id = %self.settings.model_id,
            content_type = "application/json",
            body = %request_body,
            "Invoking Bedrock model"
        );

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .body(request_body)
            .send()
            .await
            .context("Failed to send Bedrock request")?;

        let status = response.status();
        if !status.is_success() {
            let error_type = response
                .headers()
                .get("x-amzn-ErrorType")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            let mut info = enhance_bedrock_error(error_type.as_deref(), &body);
            self.annotate_auth_failure(status.as_u16(), &mut info);
            tracing::warn!(
                status = status.as_u16(),
                error_type = %info.error_type,
                original_message = %info.original_message,
                "Bedrock request rejected"
            );
            return Err(UpstreamError {
                status: status.as_u16(),
                info,
            }
            .into());
        }

        tracing::info!(
            status = status.as_u16(),
            request_id = response
                .headers()
                .get("x-amzn-requestid")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown"),
            "Bedrock stream opened"
        );

        Ok(EventStreamSource::new(response.bytes_stream().boxed()))
    }
}
