//! # Client Configuration
//!
//! Configuration for the Blossom payment API client.
//! Values are loaded from environment variables.

use blossom_core::PaymentError;
use std::env;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Payment API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub api_base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `BLOSSOM_API_BASE_URL` (default `http://localhost:8080`)
    /// - `BLOSSOM_REQUEST_TIMEOUT_SECS` (default 10)
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url =
            env::var("BLOSSOM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let request_timeout_secs = match env::var("BLOSSOM_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                PaymentError::Configuration(format!(
                    "BLOSSOM_REQUEST_TIMEOUT_SECS must be a positive integer, got {:?}",
                    raw
                ))
            })?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let config = Self::new(api_base_url).with_timeout_secs(request_timeout_secs);
        config.validate()?;
        Ok(config)
    }

    /// Create config with an explicit base URL
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject unusable values
    pub fn validate(&self) -> Result<(), PaymentError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(PaymentError::Configuration(
                "BLOSSOM_API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(PaymentError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Full URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::new("https://pay.example.com/");
        assert_eq!(config.api_base_url, "https://pay.example.com");
        assert_eq!(
            config.url("/api/blossom/payment/inv_1"),
            "https://pay.example.com/api/blossom/payment/inv_1"
        );
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::new("ftp://pay.example.com").validate().is_err());
        assert!(ClientConfig::default()
            .with_timeout_secs(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }
}
