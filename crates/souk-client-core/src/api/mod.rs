//! HTTP client for the marketplace backend.
//!
//! Thin wrapper over [`reqwest::Client`]: bearer-authenticated profile
//! fetch plus the two connectivity probes. Non-success responses are
//! normalized into [`ApiErrorBody`] so the error classifier can produce
//! the user-facing string.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::ClientConfig;
use crate::connectivity::ProbeTransport;
use crate::errors::{ApiError, ApiErrorBody};
use crate::session::{Profile, ProfileFetcher};

/// Fixed write-path probe payload; the backend answers it with either a
/// success or a validation error, both of which prove the endpoint is up.
pub const OTP_PROBE_PHONE: &str = "09123456789";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClient {
    base_url: String,
    health_path: String,
    otp_probe_path: String,
    profile_path: String,
    probe_timeout: Duration,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Build a client from loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::builder()
            .base_url(&config.base_url)
            .health_path(&config.health_path)
            .otp_probe_path(&config.otp_probe_path)
            .profile_path(&config.profile_path)
            .probe_timeout(config.probe_timeout())
            .build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a classified error.
    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body: ApiErrorBody = response.json().await.unwrap_or_default();
        body.status = Some(status.as_u16());
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ProfileFetcher for ApiClient {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        let response = self
            .http
            .get(self.url(&self.profile_path))
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::expect_success(response).await?;
        let profile = response.json::<Profile>().await?;
        debug!(user = profile.display_label(), "fetched profile");
        Ok(profile)
    }
}

#[async_trait]
impl ProbeTransport for ApiClient {
    async fn liveness(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .get(self.url(&self.health_path))
            .timeout(self.probe_timeout)
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn write_path(&self) -> Result<u16, ApiError> {
        let response = self
            .http
            .post(self.url(&self.otp_probe_path))
            .timeout(self.probe_timeout)
            .json(&json!({ "phone": OTP_PROBE_PHONE }))
            .send()
            .await?;
        // Any completed exchange is a result; the monitor decides which
        // statuses prove reachability.
        Ok(response.status().as_u16())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
                body: ApiErrorBody {
                    status: Some(status.as_u16()),
                    ..ApiErrorBody::default()
                },
            };
        }
        Self::Transport(err.to_string())
    }
}

pub struct ApiClientBuilder {
    base_url: Option<String>,
    health_path: String,
    otp_probe_path: String,
    profile_path: String,
    probe_timeout: Duration,
    timeout: Duration,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        let defaults = ClientConfig::default();
        let probe_timeout = defaults.probe_timeout();
        Self {
            base_url: None,
            health_path: defaults.health_path,
            otp_probe_path: defaults.otp_probe_path,
            profile_path: defaults.profile_path,
            probe_timeout,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    pub fn otp_probe_path(mut self, path: impl Into<String>) -> Self {
        self.otp_probe_path = path.into();
        self
    }

    pub fn profile_path(mut self, path: impl Into<String>) -> Self {
        self.profile_path = path.into();
        self
    }

    /// Bound applied to each individual probe request.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Overall request timeout for non-probe calls.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| ClientConfig::default().base_url);
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        Ok(ApiClient {
            base_url,
            health_path: self.health_path,
            otp_probe_path: self.otp_probe_path,
            profile_path: self.profile_path,
            probe_timeout: self.probe_timeout,
            http,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_config_paths() {
        let config = ClientConfig {
            base_url: "http://localhost:9000".to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
        assert_eq!(client.url("/me"), "http://localhost:9000/me");
    }
}
