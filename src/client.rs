//! SonarQube HTTP API Client
//!
//! Thin reqwest wrapper used by the batch side to reach the server. Also hosts
//! the crate-wide error type.

use reqwest::Client as HttpClient;
use std::time::Duration;
use thiserror::Error;

/// Errors from the SonarQube client and the batch loaders built on it
#[derive(Debug, Error)]
pub enum SonarQubeError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("deserialization failed: {0}")]
    Deserialize(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Response was well formed but cannot be used for an analysis.
    /// The message is shown to the user as-is.
    #[error("{0}")]
    Validation(String),
}

impl SonarQubeError {
    /// Whether the error came from the transport (connection, timeout, non-2xx)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Configuration for the SonarQube client
#[derive(Debug, Clone)]
pub struct SonarQubeConfig {
    /// Base URL of the SonarQube server
    pub url: String,
    /// Authentication token
    pub token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SonarQubeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9000".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SonarQubeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Build a config from `SONAR_HOST_URL` and `SONAR_TOKEN`, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = match std::env::var("SONAR_HOST_URL") {
            Ok(url) if !url.is_empty() => Self::new(url),
            _ => Self::default(),
        };
        if let Ok(token) = std::env::var("SONAR_TOKEN") {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }
        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// SonarQube API client
pub struct SonarQubeClient {
    config: SonarQubeConfig,
    http: HttpClient,
}

impl SonarQubeClient {
    /// Create a new SonarQube client
    pub fn new(config: SonarQubeConfig) -> Result<Self, SonarQubeError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SonarQubeError::Http(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Execute an authenticated GET request and return the response
    async fn get(&self, url: &str) -> Result<reqwest::Response, SonarQubeError> {
        let mut request = self.http.get(url);
        if let Some(ref token) = self.config.token {
            request = request.basic_auth(token, Some(""));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SonarQubeError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SonarQubeError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response)
    }

    /// GET a server-relative path (e.g. `/batch/project?key=foo`) and return the body
    pub async fn get_text(&self, path: &str) -> Result<String, SonarQubeError> {
        let url = format!("{}{}", self.config.url.trim_end_matches('/'), path);
        tracing::debug!(url = %url, "GET");
        self.get(&url)
            .await?
            .text()
            .await
            .map_err(|e| SonarQubeError::Http(e.to_string()))
    }
}
