//! HTTP client for the external optimizer/analyzer backend.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::models::{AnalysisResult, ApiEnvelope, OptimizationResult, PromptRequest};
use crate::platform::Platform;

pub const OPTIMIZE_PATH: &str = "/api/optimize";
pub const ANALYZE_PATH: &str = "/api/analyze";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Backend answered `{success: false}`.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl<T> ApiEnvelope<T> {
    fn into_result(self) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ApiError::Decode("success without data".to_string())),
            (false, _) => Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "Request failed".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    user_id: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, user_id: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.user_id.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn optimize(&self, prompt: &str, platform: Platform) -> Result<OptimizationResult> {
        info!(platform = platform.wire_name(), chars = prompt.len(), "optimize_requested");
        self.post(OPTIMIZE_PATH, prompt, platform).await
    }

    pub async fn analyze(&self, prompt: &str, platform: Platform) -> Result<AnalysisResult> {
        info!(platform = platform.wire_name(), chars = prompt.len(), "analyze_requested");
        self.post(ANALYZE_PATH, prompt, platform).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        prompt: &str,
        platform: Platform,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let body = PromptRequest {
            prompt,
            platform,
            user_id: self.user_id.as_deref(),
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "api_request_failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        debug!(url = %url, status = status.as_u16(), bytes = text.len(), "api_response");

        let envelope = serde_json::from_str::<ApiEnvelope<T>>(&text);

        if status.is_success() {
            let envelope = envelope.map_err(|e| {
                warn!(url = %url, error = %e, "api_response_decode_failed");
                ApiError::Decode(e.to_string())
            })?;
            return envelope.into_result();
        }

        let message = envelope
            .ok()
            .and_then(|env| env.error)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "Request failed".to_string());
        warn!(url = %url, status = status.as_u16(), message = %message, "api_status_error");

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
