//! # blossom-core
//!
//! Core types and traits for the blossom-pay payment flow.
//!
//! This crate provides:
//! - `PaymentStatus` and the `StatusResponse` wire body
//! - `PaymentDetails` and `InvoiceRequest` for Blossom server invoices
//! - `StatusSource` trait for anything that can report invoice status
//! - `IdentityBinder` and npub encoding for the signing-extension boundary
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use blossom_core::{PaymentDetails, StatusSource};
//!
//! let details = PaymentDetails::new("inv_123", 21_000, "lnbc210u1...");
//! let status = source.fetch_status(&details.invoice_id).await?;
//! ```

pub mod error;
pub mod identity;
pub mod invoice;
pub mod source;
pub mod status;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use identity::{
    decode_npub, encode_npub, short_npub, IdentityBinder, IdentityProvider, IdentitySession,
};
pub use invoice::{InvoiceRequest, PaymentDetails};
pub use source::{BoxedStatusSource, StatusSource, INVOICE_PATH, PAYMENT_STATUS_PATH};
pub use status::{PaymentStatus, StatusResponse};
