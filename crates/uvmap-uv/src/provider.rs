//! UV index provider client (OpenUV-compatible HTTP API).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uvmap_core::config::ProviderConfig;
use uvmap_core::error::{AppError, NetworkError, ReqwestErrorExt};

/// Message shown when the provider rejects a request with 429.
pub const RATE_LIMIT_MESSAGE: &str = "Límite de solicitudes alcanzado. Intenta más tarde.";

/// Provider failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP 429. Never cached.
    #[error("Rate limited by UV provider")]
    RateLimited,

    /// Anything else: connection failure, non-2xx status, unreadable body.
    #[error("UV provider error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited => RATE_LIMIT_MESSAGE,
            Self::Transport(_) => "UV service error. Please try again.",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited => NetworkError::RateLimited.into(),
            ProviderError::Transport(msg) => NetworkError::ConnectionFailed(msg).into(),
        }
    }
}

/// Source of live UV readings.
#[async_trait]
pub trait UvProvider: Send + Sync {
    /// Current UV index at the given point.
    async fn fetch_uv(&self, lat: f64, lng: f64) -> Result<f64, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct UvResponse {
    result: UvResult,
}

#[derive(Debug, Deserialize)]
struct UvResult {
    uv: f64,
}

/// HTTP client for `GET {base_url}/v1/uv?lat=..&lng=..`.
#[derive(Debug, Clone)]
pub struct OpenUvClient {
    client: Arc<Client>,
    base_url: String,
    access_token: String,
}

impl OpenUvClient {
    /// No request timeout is set; the transport default applies.
    pub fn new(base_url: &str, access_token: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("uvmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Build a client from configuration. A missing token is sent as empty
    /// and rejected by the provider.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let token = config.resolved_token().unwrap_or_else(|| {
            tracing::warn!("No UV provider access token configured");
            String::new()
        });
        Self::new(&config.base_url, token)
    }
}

#[async_trait]
impl UvProvider for OpenUvClient {
    async fn fetch_uv(&self, lat: f64, lng: f64) -> Result<f64, ProviderError> {
        let url = format!("{}/v1/uv?lat={}&lng={}", self.base_url, lat, lng);

        let response = self
            .client
            .get(&url)
            .header("x-access-token", &self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.into_network_error().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown status");
            return Err(ProviderError::Transport(format!("{} {}", status.as_u16(), reason)));
        }

        let body: UvResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.into_network_error().to_string()))?;

        tracing::debug!("UV provider returned {} for ({}, {})", body.result.uv, lat, lng);
        Ok(body.result.uv)
    }
}
