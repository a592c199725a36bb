use serde::{Deserialize, Serialize};

use crate::transport::HttpTransportConfig;
use crate::{Error, ErrorContext, Result};

/// Client settings that can live in a YAML file next to a manifest.
///
/// ```yaml
/// endpoint: https://api.cloudsigma.com
/// http:
///   timeout_secs: 10
/// retry_max_attempts: 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub http: HttpTransportConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_max_attempts: Option<u32>,
}

impl ClientConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            Error::configuration(
                format!("invalid client config: {}", e),
                ErrorContext::new().with_source("client_config"),
            )
        })
    }

    /// Apply `CLOUD_*` environment overrides on top of the loaded values.
    pub fn with_env_overrides(mut self) -> Self {
        self.http = self.http.with_env_overrides();
        if let Some(n) = std::env::var("CLOUD_RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            self.retry_max_attempts = Some(n);
        }
        self
    }
}
