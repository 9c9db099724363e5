//! # Payment Flow Controller
//!
//! Public face of the payment flow for the UI shell. Opening the modal
//! starts a flow, closing it hides the flow, and dropping the controller
//! stops all background polling.

use crate::callbacks::FlowCallbacks;
use crate::config::FlowConfig;
use crate::machine::{FlowSnapshot, PaymentStateMachine};
use blossom_core::{BoxedStatusSource, PaymentDetails, PaymentResult, PaymentStatus};
use std::sync::Arc;
use tracing::debug;

/// Controls the Blossom server payment modal
pub struct PaymentFlowController {
    machine: Arc<PaymentStateMachine>,
}

impl PaymentFlowController {
    /// Create a controller. Must be called from inside a tokio runtime.
    pub fn new(
        source: BoxedStatusSource,
        config: FlowConfig,
        callbacks: FlowCallbacks,
    ) -> PaymentResult<Self> {
        debug!(
            "Creating payment flow controller: source={}, interval={}ms",
            source.source_name(),
            config.polling_interval_ms
        );
        let machine = PaymentStateMachine::new(source, config, callbacks)?;
        Ok(Self { machine })
    }

    /// Show the modal for `details` and start polling its invoice.
    /// Any open flow is replaced.
    pub fn open_payment_modal(&self, details: PaymentDetails) {
        self.machine.open(details);
    }

    /// Hide the modal and stop polling.
    pub fn close_payment_modal(&self) {
        self.machine.close();
    }

    /// Check the invoice now instead of waiting for the next tick.
    pub async fn check_payment_status(&self) {
        self.machine.check_status().await;
    }

    /// Payment was confirmed elsewhere (e.g. a redirect back from a wallet).
    pub fn handle_payment_success(&self) {
        self.machine.mark_paid();
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.machine.snapshot()
    }

    pub fn status(&self) -> PaymentStatus {
        self.machine.status()
    }

    pub fn is_modal_open(&self) -> bool {
        self.machine.snapshot().is_modal_open
    }

    /// Invoice currently being polled
    pub fn polling_invoice(&self) -> Option<String> {
        self.machine.polling_invoice()
    }

    pub fn config(&self) -> &FlowConfig {
        self.machine.config()
    }

    /// Stop polling and ignore any checks still in flight.
    pub fn shutdown(&self) {
        self.machine.shutdown();
    }
}

impl Drop for PaymentFlowController {
    fn drop(&mut self) {
        self.machine.shutdown();
    }
}
