//! # Status Poller
//!
//! Fires a tick for one invoice on a fixed interval. The timer lives in a
//! spawned task owned by a [`PollHandle`]; dropping or stopping the handle
//! aborts the task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Owned handle to an active poll task
#[derive(Debug)]
pub struct PollHandle {
    invoice_id: String,
    ticks: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Invoice this poller is bound to
    pub fn invoice_id(&self) -> &str {
        &self.invoice_id
    }

    /// Number of ticks fired so far
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Stop polling. Equivalent to dropping the handle.
    pub fn stop(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!("Stopped polling invoice {}", self.invoice_id);
    }
}

/// Starts interval tasks on a tokio runtime
#[derive(Debug, Clone)]
pub struct StatusPoller {
    runtime: Handle,
}

impl StatusPoller {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Start ticking for `invoice_id` every `interval`.
    ///
    /// `prior` is stopped before the new task is spawned, so two pollers
    /// never tick side by side. The first tick fires one full interval
    /// after start. Ticks missed while the host was suspended are not
    /// replayed; the next one fires once and the cadence restarts from there.
    pub fn start<F>(
        &self,
        prior: Option<PollHandle>,
        invoice_id: impl Into<String>,
        interval: Duration,
        on_tick: F,
    ) -> PollHandle
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self::stop(prior);

        let invoice_id = invoice_id.into();
        let ticks = Arc::new(AtomicU64::new(0));

        let task_invoice = invoice_id.clone();
        let task_ticks = Arc::clone(&ticks);
        let task = self.runtime.spawn(async move {
            let mut timer = interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                task_ticks.fetch_add(1, Ordering::SeqCst);
                debug!("Poll tick for invoice {}", task_invoice);
                on_tick(&task_invoice);
            }
        });

        debug!(
            "Started polling invoice {} every {}ms",
            invoice_id,
            interval.as_millis()
        );

        PollHandle {
            invoice_id,
            ticks,
            task,
        }
    }

    /// Stop a poller if there is one. Never fails.
    pub fn stop(handle: Option<PollHandle>) {
        drop(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const SECOND: Duration = Duration::from_secs(1);

    fn recording_tick() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |id: &str| sink.lock().unwrap().push(id.to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_interval_boundaries() {
        let poller = StatusPoller::new(Handle::current());
        let (seen, on_tick) = recording_tick();

        let handle = poller.start(None, "inv_1", SECOND, on_tick);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(handle.tick_count(), 0);

        tokio::time::sleep(Duration::from_millis(2_600)).await;
        assert_eq!(handle.tick_count(), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["inv_1", "inv_1", "inv_1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let poller = StatusPoller::new(Handle::current());
        let (seen, on_tick) = recording_tick();

        let handle = poller.start(None, "inv_1", SECOND, on_tick);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        handle.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_replaces_prior_handle() {
        let poller = StatusPoller::new(Handle::current());
        let (seen, on_tick) = recording_tick();
        let (_, other_tick) = recording_tick();

        let first = poller.start(None, "inv_old", SECOND, on_tick);
        let second = poller.start(Some(first), "inv_new", SECOND, other_tick);

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(second.invoice_id(), "inv_new");
        assert_eq!(second.tick_count(), 3);
    }

    #[tokio::test]
    async fn test_stop_absent_handle_is_noop() {
        StatusPoller::stop(None);
        StatusPoller::stop(None);
    }
}
