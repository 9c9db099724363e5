//! # Payment State Machine
//!
//! Owns the current [`PaymentStatus`] of the active flow and decides every
//! transition.
//!
//! ```text
//!            open()
//!   Idle ───────────▶ Pending ──┬──▶ Paid       (stops polling, success callback)
//!                        ▲      ├──▶ Expired    (stops polling)
//!                        │      ├──▶ Cancelled  (stops polling)
//!                        └─────▶└──▶ Error      (endpoint-reported, or failure bound)
//! ```
//!
//! All state sits behind one mutex that is never held across an `.await`.
//! Each status check captures the flow generation when it is issued; a
//! result whose generation no longer matches is dropped.
//!
//! Callbacks are queued while the lock is held and drained after it is
//! released by whichever caller finds the queue idle. A callback may
//! therefore call back into the machine; anything it triggers is appended
//! to the queue and delivered after the current callback returns.

use crate::callbacks::{FlowCallbacks, FlowEvent};
use crate::config::FlowConfig;
use crate::poller::{PollHandle, StatusPoller};
use blossom_core::{BoxedStatusSource, PaymentDetails, PaymentError, PaymentResult, PaymentStatus};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Read-only view of the flow for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSnapshot {
    pub status: PaymentStatus,
    pub payment_details: Option<PaymentDetails>,
    pub is_modal_open: bool,
    pub error: Option<String>,
    pub is_polling: bool,
}

#[derive(Debug, Default)]
struct MachineState {
    status: PaymentStatus,
    details: Option<PaymentDetails>,
    last_error: Option<String>,
    modal_open: bool,
    /// Bumped on every open, close and shutdown
    generation: u64,
    poll: Option<PollHandle>,
    consecutive_failures: u32,
    /// Set once the failure bound stops polling; only a terminal status ends it
    gave_up: bool,
    success_notified: bool,
    events: VecDeque<FlowEvent>,
    dispatching: bool,
}

impl MachineState {
    fn active_invoice(&self, generation: u64) -> Option<&str> {
        if self.generation != generation {
            return None;
        }
        self.details.as_ref().map(|d| d.invoice_id.as_str())
    }

    fn transition(&mut self, next: PaymentStatus) {
        let previous = self.status;
        self.status = next;
        info!("Payment status {} -> {}", previous, next);

        self.events.push_back(FlowEvent::StatusChanged(next));

        if next.is_terminal() {
            StatusPoller::stop(self.poll.take());
        }

        if next == PaymentStatus::Paid && !self.success_notified {
            self.success_notified = true;
            self.events.push_back(FlowEvent::PaymentSucceeded);
        }
    }
}

/// The payment lifecycle state machine
pub struct PaymentStateMachine {
    state: Mutex<MachineState>,
    source: BoxedStatusSource,
    callbacks: FlowCallbacks,
    config: FlowConfig,
    poller: StatusPoller,
    runtime: Handle,
}

impl PaymentStateMachine {
    /// Create a machine bound to the current tokio runtime.
    pub fn new(
        source: BoxedStatusSource,
        config: FlowConfig,
        callbacks: FlowCallbacks,
    ) -> PaymentResult<Arc<Self>> {
        config.validate()?;

        let runtime = Handle::try_current().map_err(|_| {
            PaymentError::Configuration(
                "payment flow must be created inside a tokio runtime".to_string(),
            )
        })?;

        Ok(Arc::new(Self {
            state: Mutex::new(MachineState::default()),
            source,
            callbacks,
            config,
            poller: StatusPoller::new(runtime.clone()),
            runtime,
        }))
    }

    fn lock(&self) -> MutexGuard<'_, MachineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Start a new flow for `details`, replacing any previous one.
    pub fn open(self: &Arc<Self>, details: PaymentDetails) {
        let mut state = self.lock();

        state.generation += 1;
        let generation = state.generation;

        state.status = PaymentStatus::Pending;
        state.last_error = None;
        state.consecutive_failures = 0;
        state.gave_up = false;
        state.success_notified = false;
        state.modal_open = true;

        let machine = Arc::downgrade(self);
        let prior = state.poll.take();
        state.poll = Some(self.poller.start(
            prior,
            details.invoice_id.clone(),
            self.config.polling_interval(),
            move |_invoice_id| Self::on_tick(&machine, generation),
        ));

        info!(
            "Opened payment flow: invoice={}, amount_sats={}",
            details.invoice_id, details.amount_sats
        );
        state.details = Some(details);
    }

    /// Hide the flow and stop polling. Status is left as is.
    pub fn close(&self) {
        let mut state = self.lock();

        state.generation += 1;
        state.modal_open = false;
        StatusPoller::stop(state.poll.take());

        let cancel = match state.details.take() {
            Some(details) if self.config.cancel_on_close && state.status == PaymentStatus::Pending => {
                Some(details.invoice_id)
            }
            _ => None,
        };
        let status = state.status;
        drop(state);

        info!("Closed payment flow: status={}", status);

        if let Some(invoice_id) = cancel {
            let source = Arc::clone(&self.source);
            self.runtime.spawn(async move {
                if let Err(e) = source.cancel_invoice(&invoice_id).await {
                    warn!("Failed to cancel invoice {}: {}", invoice_id, e);
                }
            });
        }
    }

    /// Stop polling unconditionally and discard any in-flight results.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.modal_open = false;
        StatusPoller::stop(state.poll.take());
    }

    /// Record a payment confirmed through another channel.
    pub fn mark_paid(&self) {
        {
            let mut state = self.lock();
            if state.status == PaymentStatus::Paid {
                debug!("mark_paid ignored: already paid");
                return;
            }
            state.transition(PaymentStatus::Paid);
        }
        self.drain_events();
    }

    /// Run one status check for the active invoice and apply the result.
    ///
    /// Does nothing when no flow is open or the status is already terminal.
    pub async fn check_status(&self) {
        let target = {
            let state = self.lock();
            match &state.details {
                Some(details) if !state.status.is_terminal() => {
                    Some((state.generation, details.invoice_id.clone()))
                }
                _ => None,
            }
        };

        match target {
            Some((generation, invoice_id)) => self.run_check(generation, invoice_id).await,
            None => debug!("check_status skipped: no active flow"),
        }
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        let state = self.lock();
        FlowSnapshot {
            status: state.status,
            payment_details: state.details.clone(),
            is_modal_open: state.modal_open,
            error: state.last_error.clone(),
            is_polling: state.poll.is_some(),
        }
    }

    pub fn status(&self) -> PaymentStatus {
        self.lock().status
    }

    /// Invoice the active poller is bound to, if polling
    pub fn polling_invoice(&self) -> Option<String> {
        self.lock().poll.as_ref().map(|p| p.invoice_id().to_string())
    }

    fn on_tick(machine: &Weak<Self>, generation: u64) {
        let Some(machine) = machine.upgrade() else {
            return;
        };

        let invoice_id = {
            let state = machine.lock();
            if state.status.is_terminal() {
                return;
            }
            match state.active_invoice(generation) {
                Some(id) => id.to_string(),
                None => return,
            }
        };

        // Checks may overlap; each one is applied under the lock on completion.
        let runtime = machine.runtime.clone();
        runtime.spawn(async move {
            machine.run_check(generation, invoice_id).await;
        });
    }

    async fn run_check(&self, generation: u64, invoice_id: String) {
        let result = self.source.fetch_status(&invoice_id).await;
        self.apply(generation, &invoice_id, result);
        self.drain_events();
    }

    fn apply(&self, generation: u64, invoice_id: &str, result: PaymentResult<PaymentStatus>) {
        let mut state = self.lock();

        if state.active_invoice(generation) != Some(invoice_id) {
            debug!("Discarding stale status result for invoice {}", invoice_id);
            return;
        }

        match result {
            Ok(reported) => {
                state.consecutive_failures = 0;
                state.last_error = None;

                let current = state.status;
                if current.is_terminal() || reported == current {
                    return;
                }
                if state.gave_up && !reported.is_terminal() {
                    debug!(
                        "Ignoring non-terminal status {} for invoice {} after polling gave up",
                        reported, invoice_id
                    );
                    return;
                }
                if reported.progress_rank() < current.progress_rank() {
                    debug!(
                        "Ignoring out-of-order status {} for invoice {} (current {})",
                        reported, invoice_id, current
                    );
                    return;
                }

                state.transition(reported);
            }
            Err(err) => {
                state.last_error = Some(err.to_string());
                if state.status.is_terminal() {
                    return;
                }

                state.consecutive_failures += 1;
                warn!(
                    "Status check failed for invoice {} ({} in a row): {}",
                    invoice_id, state.consecutive_failures, err
                );

                if state.poll.is_some() && self.config.failures_exhausted(state.consecutive_failures) {
                    error!(
                        "Giving up on invoice {} after {} consecutive failed checks",
                        invoice_id, state.consecutive_failures
                    );
                    StatusPoller::stop(state.poll.take());
                    state.gave_up = true;
                    if state.status != PaymentStatus::Error {
                        state.transition(PaymentStatus::Error);
                    }
                }
            }
        }
    }

    fn drain_events(&self) {
        {
            let mut state = self.lock();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }

        let mut guard = DispatchGuard {
            machine: self,
            armed: true,
        };

        loop {
            let event = {
                let mut state = self.lock();
                match state.events.pop_front() {
                    Some(event) => event,
                    None => {
                        state.dispatching = false;
                        guard.armed = false;
                        break;
                    }
                }
            };
            self.callbacks.dispatch(event);
        }
    }
}

/// Releases the dispatch slot if a callback panics mid-drain
struct DispatchGuard<'a> {
    machine: &'a PaymentStateMachine,
    armed: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.machine.lock().dispatching = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blossom_core::StatusSource;

    struct ScriptedSource {
        script: Mutex<VecDeque<PaymentResult<PaymentStatus>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<PaymentResult<PaymentStatus>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, _invoice_id: &str) -> PaymentResult<PaymentStatus> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(PaymentStatus::Pending))
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<FlowEvent>>>, FlowCallbacks) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let on_status = Arc::clone(&events);
        let on_success = Arc::clone(&events);
        let callbacks = FlowCallbacks::new()
            .on_status_change(move |s| on_status.lock().unwrap().push(FlowEvent::StatusChanged(s)))
            .on_payment_success(move || on_success.lock().unwrap().push(FlowEvent::PaymentSucceeded));
        (events, callbacks)
    }

    fn slow_config() -> FlowConfig {
        FlowConfig::default().with_polling_interval(std::time::Duration::from_secs(3600))
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let source = ScriptedSource::new(vec![]);
        let result = PaymentStateMachine::new(source, FlowConfig::default(), FlowCallbacks::new());
        assert!(matches!(result, Err(PaymentError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_repeated_status_fires_once() {
        let source = ScriptedSource::new(vec![
            Ok(PaymentStatus::Error),
            Ok(PaymentStatus::Error),
            Ok(PaymentStatus::Pending),
            Ok(PaymentStatus::Pending),
        ]);
        let (events, callbacks) = recorder();
        let machine = PaymentStateMachine::new(source, slow_config(), callbacks).unwrap();

        machine.open(PaymentDetails::new("inv_1", 100, "lnbc1..."));
        for _ in 0..4 {
            machine.check_status().await;
        }

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                FlowEvent::StatusChanged(PaymentStatus::Error),
                FlowEvent::StatusChanged(PaymentStatus::Pending),
            ]
        );
    }

    #[tokio::test]
    async fn test_regression_after_terminal_ignored() {
        let source = ScriptedSource::new(vec![Ok(PaymentStatus::Expired), Ok(PaymentStatus::Pending)]);
        let (events, callbacks) = recorder();
        let machine = PaymentStateMachine::new(source, slow_config(), callbacks).unwrap();

        machine.open(PaymentDetails::new("inv_1", 100, "lnbc1..."));
        machine.check_status().await;
        machine.check_status().await;

        assert_eq!(machine.status(), PaymentStatus::Expired);
        assert_eq!(events.lock().unwrap().len(), 1);
        assert!(!machine.snapshot().is_polling);
    }

    #[tokio::test]
    async fn test_idle_report_is_out_of_order() {
        let source = ScriptedSource::new(vec![Ok(PaymentStatus::Idle)]);
        let (events, callbacks) = recorder();
        let machine = PaymentStateMachine::new(source, slow_config(), callbacks).unwrap();

        machine.open(PaymentDetails::new("inv_1", 100, "lnbc1..."));
        machine.check_status().await;

        assert_eq!(machine.status(), PaymentStatus::Pending);
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_sets_error_without_transition() {
        let source = ScriptedSource::new(vec![
            Err(PaymentError::UnknownStatus {
                value: "refunded".into(),
            }),
            Ok(PaymentStatus::Pending),
        ]);
        let (events, callbacks) = recorder();
        let machine = PaymentStateMachine::new(source, slow_config(), callbacks).unwrap();

        machine.open(PaymentDetails::new("inv_1", 100, "lnbc1..."));
        machine.check_status().await;

        let snapshot = machine.snapshot();
        assert_eq!(snapshot.status, PaymentStatus::Pending);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("Unknown payment status: \"refunded\"")
        );
        assert!(events.lock().unwrap().is_empty());

        // A good check clears the transient message
        machine.check_status().await;
        assert!(machine.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let source = ScriptedSource::new(vec![]);
        let (events, callbacks) = recorder();
        let machine = PaymentStateMachine::new(source, slow_config(), callbacks).unwrap();

        machine.open(PaymentDetails::new("inv_1", 100, "lnbc1..."));
        machine.mark_paid();
        machine.mark_paid();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                FlowEvent::StatusChanged(PaymentStatus::Paid),
                FlowEvent::PaymentSucceeded,
            ]
        );
        assert!(machine.polling_invoice().is_none());
    }

    #[tokio::test]
    async fn test_reopen_resets_flow() {
        let source = ScriptedSource::new(vec![Err(PaymentError::Network("reset".into()))]);
        let (_events, callbacks) = recorder();
        let machine = PaymentStateMachine::new(source, slow_config(), callbacks).unwrap();

        machine.open(PaymentDetails::new("inv_1", 100, "lnbc1..."));
        machine.check_status().await;
        assert!(machine.snapshot().error.is_some());

        machine.open(PaymentDetails::new("inv_2", 200, "lnbc2..."));
        let snapshot = machine.snapshot();
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.status, PaymentStatus::Pending);
        assert_eq!(machine.polling_invoice().as_deref(), Some("inv_2"));
    }

    #[tokio::test]
    async fn test_check_without_flow_is_noop() {
        let source = ScriptedSource::new(vec![Ok(PaymentStatus::Paid)]);
        let (events, callbacks) = recorder();
        let machine = PaymentStateMachine::new(source, slow_config(), callbacks).unwrap();

        machine.check_status().await;

        assert_eq!(machine.status(), PaymentStatus::Idle);
        assert!(events.lock().unwrap().is_empty());
    }
}
