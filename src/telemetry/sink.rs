//! Asynchronous log shipping
//!
//! `submit` never waits on the network: events go onto a bounded queue that a
//! small fixed pool of tokio workers drains. A full or closed queue drops the
//! event and counts it. Shipping failures are recorded in `SinkDiagnostics`
//! and logged on the `telemetry` target, which the telemetry layer ignores.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Level;

use super::event::LogEvent;
use super::shipper::{Shipper, TelemetryError};
use crate::infrastructure::config::TelemetryConfig;

/// Worker pool sizing
#[derive(Debug, Clone, Copy)]
pub struct SinkOptions {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 10_000,
        }
    }
}

impl From<&TelemetryConfig> for SinkOptions {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            queue_capacity: config.queue_capacity.max(1),
        }
    }
}

/// Internal diagnostic channel for shipping outcomes
#[derive(Debug, Default)]
pub struct SinkDiagnostics {
    submitted: AtomicU64,
    shipped: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    last_error: Mutex<Option<String>>,
}

/// Point-in-time copy of the diagnostics counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub submitted: u64,
    pub shipped: u64,
    pub failed: u64,
    pub dropped: u64,
    pub last_error: Option<String>,
}

impl SinkDiagnostics {
    fn record_failure(&self, error: &TelemetryError) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock() = Some(error.to_string());
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            shipped: self.shipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            last_error: self.last_error.lock().clone(),
        }
    }
}

struct SinkInner {
    sender: RwLock<Option<mpsc::Sender<LogEvent>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    diagnostics: SinkDiagnostics,
}

/// Process-wide handle to the shipping pool. Cheap to clone.
#[derive(Clone)]
pub struct TelemetrySink {
    inner: Arc<SinkInner>,
}

impl TelemetrySink {
    /// Start the worker pool. Must be called inside a tokio runtime.
    pub fn start<S>(shipper: S, options: SinkOptions) -> Self
    where
        S: Shipper + 'static,
    {
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let inner = Arc::new(SinkInner {
            sender: RwLock::new(Some(tx)),
            workers: Mutex::new(Vec::new()),
            diagnostics: SinkDiagnostics::default(),
        });

        let shipper = Arc::new(shipper);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let handles = (0..options.workers.max(1))
            .map(|id| {
                let shipper = Arc::clone(&shipper);
                let rx = Arc::clone(&rx);
                let inner = Arc::clone(&inner);
                tokio::spawn(async move { run_worker(id, shipper, rx, inner).await })
            })
            .collect();
        *inner.workers.lock() = handles;

        Self { inner }
    }

    /// Enqueue an event without waiting. Returns false if it was dropped.
    pub fn submit(&self, event: LogEvent) -> bool {
        let diagnostics = &self.inner.diagnostics;
        let sender = self.inner.sender.read();
        let Some(tx) = sender.as_ref() else {
            diagnostics.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        match tx.try_send(event) {
            Ok(()) => {
                diagnostics.submitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                diagnostics.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.inner.diagnostics.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.inner.sender.read().is_some()
    }

    /// Close the queue and wait up to `grace` for workers to drain it.
    ///
    /// Workers still busy when the grace period ends are aborted; their
    /// pending events are lost. Calling it twice is harmless.
    pub async fn shutdown(&self, grace: Duration) {
        drop(self.inner.sender.write().take());

        let handles = std::mem::take(&mut *self.inner.workers.lock());
        if handles.is_empty() {
            return;
        }

        let deadline = Instant::now() + grace;
        let mut aborted = 0usize;
        for mut handle in handles {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                handle.abort();
                aborted += 1;
            }
        }

        let snapshot = self.diagnostics();
        if aborted > 0 {
            crate::log_telemetry!(
                Level::WARN,
                "Telemetry sink shutdown aborted {} workers after {:?}",
                aborted,
                grace
            );
        }
        crate::log_telemetry!(
            Level::INFO,
            "Telemetry sink stopped: submitted={} shipped={} failed={} dropped={}",
            snapshot.submitted,
            snapshot.shipped,
            snapshot.failed,
            snapshot.dropped
        );
    }
}

async fn run_worker<S: Shipper>(
    id: usize,
    shipper: Arc<S>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<LogEvent>>>,
    inner: Arc<SinkInner>,
) {
    loop {
        // Lock only while waiting for the next event so the other workers
        // can ship concurrently.
        let next = { rx.lock().await.recv().await };
        let Some(event) = next else {
            break;
        };

        let result = match event.to_json() {
            Ok(document) => shipper.ship(document).await,
            Err(e) => Err(TelemetryError::from(e)),
        };

        match result {
            Ok(()) => {
                inner.diagnostics.shipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                inner.diagnostics.record_failure(&e);
                crate::log_telemetry!(Level::WARN, worker = id, "Failed to ship log event: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::event::LogLevel;
    use crate::test_utils::{FailingShipper, RecordingShipper, SlowShipper};

    fn event(message: &str) -> LogEvent {
        LogEvent::now(LogLevel::Info, "test", message)
    }

    #[tokio::test]
    async fn test_ships_every_submitted_event() {
        let shipper = RecordingShipper::new();
        let sink = TelemetrySink::start(shipper.clone(), SinkOptions::default());

        for i in 0..20 {
            assert!(sink.submit(event(&format!("event {}", i))));
        }
        sink.shutdown(Duration::from_secs(5)).await;

        let documents = shipper.documents();
        assert_eq!(documents.len(), 20);
        for i in 0..20 {
            let expected = format!("event {}", i);
            assert!(documents.iter().any(|d| d["message"] == expected.as_str()));
        }

        let snapshot = sink.diagnostics();
        assert_eq!(snapshot.submitted, 20);
        assert_eq!(snapshot.shipped, 20);
        assert_eq!(snapshot.failed, 0);
    }

    #[tokio::test]
    async fn test_submit_does_not_wait_for_backend() {
        let sink = TelemetrySink::start(
            SlowShipper::new(Duration::from_millis(500)),
            SinkOptions::default(),
        );

        let started = std::time::Instant::now();
        for i in 0..10 {
            sink.submit(event(&format!("slow {}", i)));
        }
        assert!(started.elapsed() < Duration::from_millis(50));

        sink.shutdown(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let sink = TelemetrySink::start(FailingShipper, SinkOptions::default());

        assert!(sink.submit(event("doomed")));
        sink.shutdown(Duration::from_secs(5)).await;

        let snapshot = sink.diagnostics();
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.shipped, 0);
        assert!(snapshot.last_error.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let sink = TelemetrySink::start(
            SlowShipper::new(Duration::from_secs(10)),
            SinkOptions {
                workers: 1,
                queue_capacity: 2,
            },
        );

        let accepted = (0..10).filter(|i| sink.submit(event(&i.to_string()))).count();
        // One event in flight at most, two queued
        assert!(accepted <= 3);
        assert!(sink.diagnostics().dropped >= 7);

        sink.shutdown(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_dropped() {
        let sink = TelemetrySink::start(RecordingShipper::new(), SinkOptions::default());
        sink.shutdown(Duration::from_secs(1)).await;

        assert!(!sink.is_running());
        assert!(!sink.submit(event("late")));
        assert_eq!(sink.diagnostics().dropped, 1);

        // second shutdown is a no-op
        sink.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_shutdown_lines_are_not_mirrored() {
        use crate::telemetry::TelemetryLayer;
        use tracing::instrument::WithSubscriber;
        use tracing_subscriber::layer::SubscriberExt;

        let shipper = RecordingShipper::new();
        let sink = TelemetrySink::start(shipper.clone(), SinkOptions::default());
        let subscriber = tracing_subscriber::registry().with(TelemetryLayer::new(sink.clone()));

        sink.submit(event("before shutdown"));
        sink.shutdown(Duration::from_secs(5))
            .with_subscriber(subscriber)
            .await;

        let stats = sink.diagnostics();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.shipped, 1);
        assert_eq!(stats.dropped, 0);
        assert_eq!(shipper.documents().len(), 1);
    }

    #[test]
    fn test_options_from_config() {
        let options = SinkOptions::from(&TelemetryConfig::default());
        assert_eq!(options.workers, 2);
        assert_eq!(options.queue_capacity, 10_000);
    }
}
