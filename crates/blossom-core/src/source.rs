//! # Status Source Trait
//!
//! The seam between the payment flow and whatever answers
//! "what state is this invoice in?".
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StatusSource (trait)                     │
//! │  ├── fetch_status()                                         │
//! │  ├── cancel_invoice()                                       │
//! │  └── source_name()                                          │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┴─────────────────┐
//!          │                                   │
//!  ┌───────┴────────────┐          ┌───────────┴──────────┐
//!  │ BlossomPayment     │          │ scripted sources     │
//!  │ Client (HTTP)      │          │ (tests)              │
//!  └────────────────────┘          └──────────────────────┘
//! ```

use crate::error::PaymentResult;
use crate::status::PaymentStatus;
use async_trait::async_trait;
use std::sync::Arc;

/// Path prefix of the payment status endpoint
pub const PAYMENT_STATUS_PATH: &str = "/api/blossom/payment";

/// Path of the invoice creation endpoint
pub const INVOICE_PATH: &str = "/api/blossom/invoice";

/// Source of invoice payment status.
///
/// Every error returned from `fetch_status` is treated by the flow as a
/// recoverable failed check.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Query the current status of an invoice.
    async fn fetch_status(&self, invoice_id: &str) -> PaymentResult<PaymentStatus>;

    /// Ask the server to cancel an unpaid invoice.
    ///
    /// Default: no-op. Sources that support cancellation override this.
    async fn cancel_invoice(&self, _invoice_id: &str) -> PaymentResult<()> {
        Ok(())
    }

    /// Name used in logs
    fn source_name(&self) -> &'static str;
}

/// Type alias for a shared status source (dynamic dispatch)
pub type BoxedStatusSource = Arc<dyn StatusSource>;

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(PaymentStatus);

    #[async_trait]
    impl StatusSource for FixedSource {
        async fn fetch_status(&self, _invoice_id: &str) -> PaymentResult<PaymentStatus> {
            Ok(self.0)
        }

        fn source_name(&self) -> &'static str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_default_cancel_is_noop() {
        let source: BoxedStatusSource = Arc::new(FixedSource(PaymentStatus::Pending));

        assert!(source.cancel_invoice("inv_1").await.is_ok());
        assert_eq!(
            source.fetch_status("inv_1").await,
            Ok(PaymentStatus::Pending)
        );
        assert_eq!(source.source_name(), "fixed");
    }
}
