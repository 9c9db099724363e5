//! # Invoice Types
//!
//! Payment details for a Blossom server provisioning invoice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of the invoice a flow is paying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Server-issued invoice identifier
    pub invoice_id: String,

    /// Amount in satoshis
    pub amount_sats: u64,

    /// Encoded payment request (bolt11 invoice or address) shown to the user
    pub payment_request: String,

    /// When the invoice stops being payable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PaymentDetails {
    pub fn new(
        invoice_id: impl Into<String>,
        amount_sats: u64,
        payment_request: impl Into<String>,
    ) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            amount_sats,
            payment_request: payment_request.into(),
            expires_at: None,
        }
    }

    /// Builder: set expiry
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the invoice is past its expiry at `now`.
    /// Invoices without an expiry never expire locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Seconds until expiry, clamped at zero
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at
            .map(|exp| (exp - now).num_seconds().max(0))
    }
}

/// Request body for `POST /api/blossom/invoice`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    /// Hex public key of the user the server is provisioned for
    pub pubkey: String,

    /// Amount in satoshis
    pub amount_sats: u64,

    /// Optional memo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl InvoiceRequest {
    pub fn new(pubkey: impl Into<String>, amount_sats: u64) -> Self {
        Self {
            pubkey: pubkey.into(),
            amount_sats,
            description: None,
        }
    }

    /// Builder: set memo
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let details = PaymentDetails::new("inv_1", 21_000, "lnbc210u1...")
            .with_expiry(now + Duration::minutes(10));

        assert!(!details.is_expired_at(now));
        assert!(details.is_expired_at(now + Duration::minutes(11)));
        assert_eq!(details.seconds_remaining(now), Some(600));
        assert_eq!(
            details.seconds_remaining(now + Duration::hours(1)),
            Some(0)
        );
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let details = PaymentDetails::new("inv_2", 1_000, "lnbc10u1...");
        assert!(!details.is_expired_at(Utc::now() + Duration::days(365)));
        assert_eq!(details.seconds_remaining(Utc::now()), None);
    }

    #[test]
    fn test_details_json_omits_missing_expiry() {
        let details = PaymentDetails::new("inv_3", 500, "lnbc5u1...");
        let json = serde_json::to_value(&details).unwrap();
        assert!(json.get("expires_at").is_none());
        assert_eq!(json["invoice_id"], "inv_3");
    }
}
