use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable holding a Bedrock API key
pub const BEDROCK_API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TlsBackend {
    #[default]
    Rustls,
    NativeTls,
}

/// Trivia relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bedrock runtime region
    #[serde(default = "default_region")]
    pub region: String,

    /// Full endpoint override (VPC endpoint, local stub), replaces the regional URL
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Bedrock API key, falls back to `AWS_BEARER_TOKEN_BEDROCK`
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Upstream request timeout in seconds, covers the whole streamed response
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub tls_backend: TlsBackend,

    /// HTTP proxy URL (optional)
    /// Supported formats: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    pub proxy_url: Option<String>,

    #[serde(default)]
    pub proxy_username: Option<String>,

    #[serde(default)]
    pub proxy_password: Option<String>,

    /// Maximum request body size in bytes (0 = unlimited)
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_model_id() -> String {
    "anthropic.claude-3-sonnet-20240229-v1:0".to_string()
}

fn default_anthropic_version() -> String {
    "bedrock-2023-05-31".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f64 {
    0.9
}

fn default_request_timeout_secs() -> u64 {
    900
}

fn default_max_request_body_bytes() -> usize {
    400_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            region: default_region(),
            endpoint_url: None,
            model_id: default_model_id(),
            anthropic_version: default_anthropic_version(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            tls_backend: TlsBackend::default(),
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
            max_request_body_bytes: default_max_request_body_bytes(),
        }
    }
}

impl Config {
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// Bedrock runtime base URL
    pub fn endpoint(&self) -> String {
        match &self.endpoint_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }

    /// API key from the config file, else from the environment
    pub fn effective_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(BEDROCK_API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Load configuration; a missing file yields defaults
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
