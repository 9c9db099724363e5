//! # Flow Callbacks
//!
//! The fixed set of notification slots a caller supplies when building a
//! flow controller. Slots are invoked synchronously on the task that
//! completed the status check, in the order transitions were applied.

use blossom_core::PaymentStatus;
use std::fmt;
use std::sync::Arc;

/// Called with the new status whenever it changes
pub type StatusChangeCallback = Arc<dyn Fn(PaymentStatus) + Send + Sync>;

/// Called once when the invoice is paid
pub type PaymentSuccessCallback = Arc<dyn Fn() + Send + Sync>;

/// Notification produced by a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    StatusChanged(PaymentStatus),
    PaymentSucceeded,
}

/// Callback slots for a payment flow
#[derive(Clone, Default)]
pub struct FlowCallbacks {
    on_status_change: Option<StatusChangeCallback>,
    on_payment_success: Option<PaymentSuccessCallback>,
}

impl FlowCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the status-change slot
    pub fn on_status_change<F>(mut self, f: F) -> Self
    where
        F: Fn(PaymentStatus) + Send + Sync + 'static,
    {
        self.on_status_change = Some(Arc::new(f));
        self
    }

    /// Builder: set the payment-success slot
    pub fn on_payment_success<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_payment_success = Some(Arc::new(f));
        self
    }

    pub(crate) fn dispatch(&self, event: FlowEvent) {
        match event {
            FlowEvent::StatusChanged(status) => {
                if let Some(cb) = &self.on_status_change {
                    cb(status);
                }
            }
            FlowEvent::PaymentSucceeded => {
                if let Some(cb) = &self.on_payment_success {
                    cb();
                }
            }
        }
    }
}

impl fmt::Debug for FlowCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowCallbacks")
            .field("on_status_change", &self.on_status_change.is_some())
            .field("on_payment_success", &self.on_payment_success.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_dispatch_routes_to_slots() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let status_seen = Arc::clone(&seen);
        let success_seen = Arc::clone(&seen);
        let callbacks = FlowCallbacks::new()
            .on_status_change(move |s| status_seen.lock().unwrap().push(s.to_string()))
            .on_payment_success(move || success_seen.lock().unwrap().push("success".into()));

        callbacks.dispatch(FlowEvent::StatusChanged(PaymentStatus::Paid));
        callbacks.dispatch(FlowEvent::PaymentSucceeded);

        assert_eq!(*seen.lock().unwrap(), vec!["paid", "success"]);
    }

    #[test]
    fn test_empty_slots_are_noops() {
        let callbacks = FlowCallbacks::new();
        callbacks.dispatch(FlowEvent::StatusChanged(PaymentStatus::Expired));
        callbacks.dispatch(FlowEvent::PaymentSucceeded);

        assert_eq!(
            format!("{:?}", callbacks),
            "FlowCallbacks { on_status_change: false, on_payment_success: false }"
        );
    }
}
