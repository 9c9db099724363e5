//! # Payment Error Types
//!
//! Typed error handling for the blossom-pay payment flow.
//! All fallible operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for payment and identity operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Configuration errors (invalid interval, bad env values)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure talking to the payment API
    #[error("Network error: {0}")]
    Network(String),

    /// Payment API answered with a non-success status
    #[error("Status endpoint returned HTTP {status}: {message}")]
    StatusEndpoint { status: u16, message: String },

    /// Response body could not be parsed
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Endpoint reported a status outside the known enumeration
    #[error("Unknown payment status: {value:?}")]
    UnknownStatus { value: String },

    /// Invoice id not known to the payment API
    #[error("Invoice not found: {invoice_id}")]
    InvoiceNotFound { invoice_id: String },

    /// Signing extension missing or refused access
    #[error("Identity unavailable: {0}")]
    AuthUnavailable(String),

    /// Public key is not 32 bytes of hex
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Returns true if a status check failing with this error should be
    /// retried on the next poll tick
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Network(_)
                | PaymentError::StatusEndpoint { .. }
                | PaymentError::MalformedResponse(_)
                | PaymentError::UnknownStatus { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::Network(_) => 503,
            PaymentError::StatusEndpoint { .. } => 502,
            PaymentError::MalformedResponse(_) => 502,
            PaymentError::UnknownStatus { .. } => 400,
            PaymentError::InvoiceNotFound { .. } => 404,
            PaymentError::AuthUnavailable(_) => 401,
            PaymentError::InvalidPublicKey(_) => 400,
            PaymentError::Serialization(_) => 500,
            PaymentError::Internal(_) => 500,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
