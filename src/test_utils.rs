//! Test utilities: stub shippers and a capturing tracing layer

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::telemetry::shipper::{Shipper, TelemetryError};

/// Keeps every shipped document
#[derive(Clone, Default)]
pub struct RecordingShipper {
    documents: Arc<Mutex<Vec<String>>>,
}

impl RecordingShipper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<serde_json::Value> {
        self.documents
            .lock()
            .iter()
            .map(|d| serde_json::from_str(d).expect("shipped document is JSON"))
            .collect()
    }
}

#[async_trait]
impl Shipper for RecordingShipper {
    async fn ship(&self, document: String) -> Result<(), TelemetryError> {
        self.documents.lock().push(document);
        Ok(())
    }
}

/// Backend that takes `delay` per document
pub struct SlowShipper {
    delay: Duration,
}

impl SlowShipper {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Shipper for SlowShipper {
    async fn ship(&self, _document: String) -> Result<(), TelemetryError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Backend that rejects everything with 503
pub struct FailingShipper;

#[async_trait]
impl Shipper for FailingShipper {
    async fn ship(&self, _document: String) -> Result<(), TelemetryError> {
        Err(TelemetryError::Rejected(503))
    }
}

/// One tracing event as seen by `CapturingLayer`
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: tracing::Level,
    pub target: String,
    pub message: String,
}

struct CapturingLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for CapturingLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.0,
        });
    }
}

/// Run `f` with a subscriber recording every event
pub fn capture_events<F, R>(f: F) -> (R, Vec<CapturedEvent>)
where
    F: FnOnce() -> R,
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(CapturingLayer {
        events: events.clone(),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().clone();
    (result, captured)
}

/// Async variant of [`capture_events`]; events from spawned tasks are not seen
pub async fn capture_events_async<F>(future: F) -> (F::Output, Vec<CapturedEvent>)
where
    F: Future,
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(CapturingLayer {
        events: events.clone(),
    });
    let result = future.with_subscriber(subscriber).await;
    let captured = events.lock().clone();
    (result, captured)
}
