//! Runtime settings: service endpoints and the batch ceiling.

use serde::{Deserialize, Serialize};

use crate::batch::MAX_BATCH_BYTES;
use crate::error::ConfigError;
use crate::github::DEFAULT_GITHUB_API;
use crate::sentiment::DEFAULT_SENTIMENT_ENDPOINT;

pub const GITHUB_API_ENV: &str = "SAD_REPOS_GITHUB_API";
pub const SENTIMENT_ENDPOINT_ENV: &str = "SAD_REPOS_SENTIMENT_ENDPOINT";
pub const MAX_BATCH_BYTES_ENV: &str = "SAD_REPOS_MAX_BATCH_BYTES";

/// Settings shared by the remote collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// GitHub REST API root
    pub github_api_url: String,
    /// Batch endpoint of the sentiment service
    pub sentiment_endpoint: String,
    /// Payload ceiling for one sentiment request
    pub max_batch_bytes: usize,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            github_api_url: DEFAULT_GITHUB_API.to_string(),
            sentiment_endpoint: DEFAULT_SENTIMENT_ENDPOINT.to_string(),
            max_batch_bytes: MAX_BATCH_BYTES,
            user_agent: format!("sad-repos/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Settings {
    /// Defaults overridden by `SAD_REPOS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(url) = lookup(GITHUB_API_ENV) {
            settings.github_api_url = url;
        }
        if let Some(endpoint) = lookup(SENTIMENT_ENDPOINT_ENV) {
            settings.sentiment_endpoint = endpoint;
        }
        if let Some(raw) = lookup(MAX_BATCH_BYTES_ENV) {
            settings.max_batch_bytes = parse_batch_bytes(MAX_BATCH_BYTES_ENV, &raw)?;
        }

        Ok(settings)
    }

    pub fn with_github_api(mut self, url: &str) -> Self {
        self.github_api_url = url.to_string();
        self
    }

    pub fn with_sentiment_endpoint(mut self, endpoint: &str) -> Self {
        self.sentiment_endpoint = endpoint.to_string();
        self
    }

    pub fn with_max_batch_bytes(mut self, bytes: usize) -> Result<Self, ConfigError> {
        if bytes == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_batch_bytes".to_string(),
                value: bytes.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        self.max_batch_bytes = bytes;
        Ok(self)
    }

    /// Build the HTTP client used for the whole run.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(ConfigError::HttpClient)
    }
}

fn parse_batch_bytes(key: &str, raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidSetting {
        key: key.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    match raw.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be greater than zero")),
        Ok(bytes) => Ok(bytes),
        Err(_) => Err(invalid("expected a byte count")),
    }
}
