//! # blossom-flow
//!
//! Payment lifecycle for Blossom server invoices.
//!
//! ```text
//! PaymentFlowController ──open/close──▶ PaymentStateMachine ──start/stop──▶ StatusPoller
//!          ▲                                  │      ▲                           │
//!          │                                  │      └───── status checks ◀──────┘
//!          └────────── FlowCallbacks ◀────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use blossom_client::BlossomPaymentClient;
//! use blossom_flow::{FlowCallbacks, FlowConfig, PaymentFlowController};
//! use std::sync::Arc;
//!
//! let client = Arc::new(BlossomPaymentClient::from_env()?);
//! let callbacks = FlowCallbacks::new()
//!     .on_status_change(|status| println!("status: {}", status))
//!     .on_payment_success(|| println!("server provisioned"));
//!
//! let controller = PaymentFlowController::new(client, FlowConfig::from_env()?, callbacks)?;
//! controller.open_payment_modal(details);
//! ```

pub mod callbacks;
pub mod config;
pub mod controller;
pub mod machine;
pub mod poller;

pub use callbacks::{FlowCallbacks, FlowEvent, PaymentSuccessCallback, StatusChangeCallback};
pub use config::{
    FlowConfig, DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_POLLING_INTERVAL_MS, MAX_POLLING_INTERVAL_MS,
};
pub use controller::PaymentFlowController;
pub use machine::{FlowSnapshot, PaymentStateMachine};
pub use poller::{PollHandle, StatusPoller};
