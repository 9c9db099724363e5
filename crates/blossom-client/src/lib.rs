//! # blossom-client
//!
//! HTTP client for the Blossom payment API.
//!
//! [`BlossomPaymentClient`] implements [`blossom_core::StatusSource`], so it
//! can be handed straight to the payment flow controller:
//!
//! ```rust,ignore
//! use blossom_client::BlossomPaymentClient;
//! use blossom_core::InvoiceRequest;
//!
//! let client = BlossomPaymentClient::from_env()?;
//!
//! // Get an invoice for a server plan
//! let details = client
//!     .request_invoice(&InvoiceRequest::new(pubkey_hex, 21_000))
//!     .await?;
//!
//! // Poll it through the flow controller
//! controller.open_payment_modal(details);
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::BlossomPaymentClient;
pub use config::ClientConfig;
