//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the server configuration and the in-memory invoice store.

use crate::store::InvoiceStore;
use std::net::SocketAddr;
use std::sync::Arc;

/// Default lifetime of a dev invoice
pub const DEFAULT_INVOICE_TTL_SECS: i64 = 600;

/// Longest accepted invoice lifetime (30 days)
pub const MAX_INVOICE_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Seconds until a new invoice expires
    pub invoice_ttl_secs: i64,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            invoice_ttl_secs: parse_ttl(std::env::var("INVOICE_TTL_SECS").ok().as_deref()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Positive TTLs are capped at [`MAX_INVOICE_TTL_SECS`]; anything else takes the default
fn parse_ttl(raw: Option<&str>) -> i64 {
    raw.and_then(|t| t.trim().parse::<i64>().ok())
        .filter(|t| *t > 0)
        .map(|t| t.min(MAX_INVOICE_TTL_SECS))
        .unwrap_or(DEFAULT_INVOICE_TTL_SECS)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            invoice_ttl_secs: DEFAULT_INVOICE_TTL_SECS,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Invoices issued by this server
    pub invoices: Arc<InvoiceStore>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create state from environment configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::from_env())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            invoices: Arc::new(InvoiceStore::new()),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(AppConfig::default())
    }
}
