//! Loading watchdog.
//!
//! Fires once if the pipeline has not published `end` within a timeout.
//! It only reports; loading keeps going. The timer task stops as soon as
//! `end` is published or its handle is dropped.

use assetflow_core::{EventBus, EventBusError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::events::PipelineEvent;
use crate::items::ItemsView;

/// Default time allowed for a whole pipeline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    timeout: Duration,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Watchdog {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start the timer.
    ///
    /// Listens for `end` in the `watchdog` namespace of `events`. If it has
    /// not fired when the timeout expires, the loaded names are logged and
    /// `on_timeout` gets the items view. Must be called inside a tokio
    /// runtime.
    pub fn arm<F>(
        &self,
        events: &EventBus<PipelineEvent>,
        items: ItemsView,
        on_timeout: F,
    ) -> Result<WatchdogHandle, EventBusError>
    where
        F: FnOnce(ItemsView) + Send + 'static,
    {
        self.arm_with_state(events, items, false, on_timeout)
    }

    pub(crate) fn arm_with_state<F>(
        &self,
        events: &EventBus<PipelineEvent>,
        items: ItemsView,
        already_finished: bool,
        on_timeout: F,
    ) -> Result<WatchdogHandle, EventBusError>
    where
        F: FnOnce(ItemsView) + Send + 'static,
    {
        let finished = Arc::new(AtomicBool::new(already_finished));
        let ended = Arc::new(Notify::new());
        let (flag, signal) = (finished.clone(), ended.clone());
        events.subscribe("end.watchdog", move |_| {
            flag.store(true, Ordering::SeqCst);
            signal.notify_one();
        })?;

        let timeout = self.timeout;
        let task = tokio::spawn(async move {
            if !finished.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = ended.notified() => {}
                    _ = tokio::time::sleep(timeout) => {}
                }
            }
            if finished.load(Ordering::SeqCst) {
                tracing::debug!("Watchdog disarmed, pipeline finished in time");
                return false;
            }
            tracing::warn!(
                "Loading not finished after {:?}; loaded so far: [{}]",
                timeout,
                items.names().join(", ")
            );
            on_timeout(items);
            true
        });

        Ok(WatchdogHandle { task: Some(task) })
    }
}

/// Running watchdog timer. Dropping the handle stops the timer.
#[derive(Debug)]
#[must_use = "dropping the handle stops the watchdog"]
pub struct WatchdogHandle {
    task: Option<JoinHandle<bool>>,
}

impl WatchdogHandle {
    /// Wait for the timer; `true` if the watchdog fired.
    pub async fn fired(mut self) -> bool {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(false),
            None => false,
        }
    }

    /// Stop the timer without firing.
    pub fn disarm(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for WatchdogHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_without_end() {
        let events: EventBus<PipelineEvent> = EventBus::new();
        let (items, inner) = ItemsView::new();
        inner.write().insert("wall".to_string(), None);

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = Watchdog::new(Duration::from_secs(1))
            .arm(&events, items, move |items| *sink.lock() = items.names())
            .unwrap();

        assert!(handle.fired().await);
        assert_eq!(*seen.lock(), vec!["wall"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_disarms() {
        let events: EventBus<PipelineEvent> = EventBus::new();
        let (items, _) = ItemsView::new();
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();

        let handle = Watchdog::default()
            .arm(&events, items, move |_| flag.store(true, Ordering::SeqCst))
            .unwrap();
        events.emit(PipelineEvent::End);

        assert!(!handle.fired().await);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_stops_timer_early() {
        let events: EventBus<PipelineEvent> = EventBus::new();
        let (items, _) = ItemsView::new();
        let started = tokio::time::Instant::now();

        let handle = Watchdog::default().arm(&events, items, |_| {}).unwrap();
        tokio::task::yield_now().await;
        events.emit(PipelineEvent::End);

        assert!(!handle.fired().await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_never_fires() {
        let events: EventBus<PipelineEvent> = EventBus::new();
        let (items, _) = ItemsView::new();
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();

        let handle = Watchdog::new(Duration::from_millis(100))
            .arm(&events, items, move |_| flag.store(true, Ordering::SeqCst))
            .unwrap();
        drop(handle);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scoped_end_of_other_namespace_is_ignored() {
        let events: EventBus<PipelineEvent> = EventBus::new();
        let (items, _) = ItemsView::new();

        let handle = Watchdog::new(Duration::from_millis(10))
            .arm(&events, items, |_| {})
            .unwrap();
        events.publish("end.hud", PipelineEvent::End).unwrap();

        assert!(handle.fired().await);
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(Watchdog::default().timeout(), Duration::from_secs(15));
    }
}
