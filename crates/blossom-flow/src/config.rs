//! # Flow Configuration
//!
//! Polling cadence and failure policy for the payment flow.
//! Loaded from environment variables or a TOML snippet.

use blossom_core::PaymentError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default poll cadence
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 5_000;

/// Longest accepted poll cadence (one day)
pub const MAX_POLLING_INTERVAL_MS: u64 = 86_400_000;

/// Default number of consecutive failed checks before the flow gives up
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 12;

/// Payment flow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Poll cadence in milliseconds
    pub polling_interval_ms: u64,

    /// Consecutive failed checks after which status becomes `Error` and
    /// polling stops. 0 disables the bound.
    pub max_consecutive_failures: u32,

    /// Ask the server to cancel a still-pending invoice when the flow closes
    pub cancel_on_close: bool,
}

impl FlowConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `BLOSSOM_POLLING_INTERVAL_MS`
    /// - `BLOSSOM_MAX_CONSECUTIVE_FAILURES`
    /// - `BLOSSOM_CANCEL_ON_CLOSE` (`true`/`false`)
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            polling_interval_ms: env_or("BLOSSOM_POLLING_INTERVAL_MS", defaults.polling_interval_ms)?,
            max_consecutive_failures: env_or(
                "BLOSSOM_MAX_CONSECUTIVE_FAILURES",
                defaults.max_consecutive_failures,
            )?,
            cancel_on_close: env_or("BLOSSOM_CANCEL_ON_CLOSE", defaults.cancel_on_close)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, PaymentError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| PaymentError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder: set poll cadence
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder: set failure bound
    pub fn with_max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    /// Builder: request server-side cancellation on close
    pub fn with_cancel_on_close(mut self, cancel: bool) -> Self {
        self.cancel_on_close = cancel;
        self
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    /// Whether `failures` consecutive failed checks exhaust the retry budget
    pub fn failures_exhausted(&self, failures: u32) -> bool {
        self.max_consecutive_failures > 0 && failures >= self.max_consecutive_failures
    }

    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.polling_interval_ms == 0 {
            return Err(PaymentError::Configuration(
                "polling_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling_interval_ms > MAX_POLLING_INTERVAL_MS {
            return Err(PaymentError::Configuration(format!(
                "polling_interval_ms must be at most {}",
                MAX_POLLING_INTERVAL_MS
            )));
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            cancel_on_close: false,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, PaymentError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PaymentError::Configuration(format!("{} has invalid value {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
