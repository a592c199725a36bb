use async_trait::async_trait;
use reqwest::Proxy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{RawResponse, Transport, TransportError};
use crate::request::{BoundRequest, Headers};
use crate::{Error, Result};

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_pool_max_idle() -> usize {
    32
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            proxy_url: None,
            user_agent: None,
        }
    }
}

impl HttpTransportConfig {
    /// Defaults overridden by `CLOUD_HTTP_*` / `CLOUD_PROXY_URL`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Environment variables take precedence over the values already set.
    pub fn with_env_overrides(self) -> Self {
        let mut config = self;
        if let Some(secs) = env_parse::<u64>("CLOUD_HTTP_TIMEOUT_SECS") {
            config.timeout_secs = secs;
        }
        if let Some(n) = env_parse::<usize>("CLOUD_HTTP_POOL_MAX_IDLE_PER_HOST") {
            config.pool_max_idle_per_host = n;
        }
        if let Some(secs) = env_parse::<u64>("CLOUD_HTTP_POOL_IDLE_TIMEOUT_SECS") {
            config.pool_idle_timeout_secs = secs;
        }
        if let Ok(proxy) = env::var("CLOUD_PROXY_URL") {
            config.proxy_url = Some(proxy);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpTransportConfig::from_env())
    }

    pub fn with_config(config: &HttpTransportConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(config.pool_idle_timeout_secs)));

        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self { client, timeout })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn classify(&self, request: &BoundRequest, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(format!(
                "{} {} exceeded {:?}",
                request.method,
                request.endpoint,
                self.timeout
            ))
        } else {
            Error::Transport(TransportError::Http(e))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: BoundRequest) -> Result<RawResponse> {
        let uri = request.uri();
        let started = Instant::now();

        let mut builder = self.client.request(request.method.clone(), &uri);
        for (name, value) in request.headers.iter() {
            // reqwest derives the length from the body
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name, value);
        }
        if let Some(payload) = &request.payload {
            builder = builder.body(payload.data.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.classify(&request, e))?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.append(name.as_str(), v);
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(&request, e))?;

        debug!(
            operation = %request.operation,
            method = %request.method,
            uri = %uri,
            status,
            duration_ms = started.elapsed().as_millis() as u64,
            "http exchange complete"
        );

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.pool_max_idle_per_host, 32);
        assert!(config.proxy_url.is_none());
    }

    #[test]
    fn test_config_deserializes_partial() {
        let config: HttpTransportConfig = serde_yaml::from_str("timeout_secs: 5\n").unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.pool_idle_timeout_secs, 90);
    }
}
