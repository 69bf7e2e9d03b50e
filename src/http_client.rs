//! Upstream HTTP client construction

use reqwest::{Client, Proxy};
use std::time::Duration;

use crate::model::config::{Config, TlsBackend};

/// Outbound proxy settings
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// http, https or socks5 URL
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Proxy from configuration, if `proxyUrl` is set
    pub fn from_config(config: &Config) -> Option<Self> {
        let url = config.proxy_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }

        let proxy = Self::new(url);
        Some(match (&config.proxy_username, &config.proxy_password) {
            (Some(username), Some(password)) => proxy.with_auth(username, password),
            _ => proxy,
        })
    }
}

/// Build the client used for Bedrock calls
///
/// `timeout_secs` bounds the whole exchange, streamed body included.
pub fn build_client(
    proxy: Option<&ProxyConfig>,
    timeout_secs: u64,
    tls_backend: TlsBackend,
) -> anyhow::Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));

    if tls_backend == TlsBackend::Rustls {
        builder = builder.use_rustls_tls();
    }

    if let Some(proxy_config) = proxy {
        let mut proxy = Proxy::all(&proxy_config.url)?;
        if let (Some(username), Some(password)) = (&proxy_config.username, &proxy_config.password) {
            proxy = proxy.basic_auth(username, password);
        }
        builder = builder.proxy(proxy);
        tracing::debug!("HTTP client using proxy: {}", proxy_config.url);
    }

    Ok(builder.build()?)
}
