//! Bridge from the `tracing` facade into the telemetry sink

use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::event::{current_thread_name, LogEvent, LogLevel};
use super::sink::TelemetrySink;

/// Targets never mirrored: the sink's own diagnostics and the HTTP client
/// stack it ships through.
const EXCLUDED_TARGETS: &[&str] = &["telemetry", "reqwest", "hyper", "hyper_util", "h2", "rustls"];

/// Field carrying the failure classification
pub const EXCEPTION_FIELD: &str = "exception";
/// Field carrying the failure message
pub const EXCEPTION_MESSAGE_FIELD: &str = "exception_message";

/// Mirrors every accepted tracing event into a `TelemetrySink`
pub struct TelemetryLayer {
    sink: TelemetrySink,
}

impl TelemetryLayer {
    pub fn new(sink: TelemetrySink) -> Self {
        Self { sink }
    }
}

fn is_excluded(target: &str) -> bool {
    EXCLUDED_TARGETS.iter().any(|excluded| {
        target == *excluded
            || target
                .strip_prefix(excluded)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

impl<S: Subscriber> Layer<S> for TelemetryLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_excluded(metadata.target()) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let exception_class = visitor.exception.take();
        let exception_message = visitor.exception_message.take();

        let log_event = LogEvent {
            timestamp: time::OffsetDateTime::now_utc(),
            level: LogLevel::from(metadata.level()),
            logger: metadata.target().to_string(),
            thread: current_thread_name(),
            message: visitor.message(),
            exception_class,
            exception_message,
        };
        self.sink.submit(log_event);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    extra: String,
    exception: Option<String>,
    exception_message: Option<String>,
}

impl EventVisitor {
    fn message(self) -> String {
        if self.extra.is_empty() {
            return self.message;
        }
        if self.message.is_empty() {
            return self.extra;
        }
        format!("{} {}", self.message, self.extra)
    }

    fn record_text(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = value,
            EXCEPTION_FIELD => self.exception = Some(value),
            EXCEPTION_MESSAGE_FIELD => self.exception_message = Some(value),
            name => {
                if !self.extra.is_empty() {
                    self.extra.push(' ');
                }
                let _ = write!(self.extra, "{}={}", name, value);
            }
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{:?}", value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::sink::SinkOptions;
    use crate::test_utils::RecordingShipper;
    use std::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_excluded_targets() {
        assert!(is_excluded("telemetry"));
        assert!(is_excluded("hyper::client"));
        assert!(is_excluded("reqwest::connect"));
        assert!(!is_excluded("http"));
        assert!(!is_excluded("hyperion"));
    }

    #[tokio::test]
    async fn test_events_are_mirrored() {
        let shipper = RecordingShipper::new();
        let sink = TelemetrySink::start(shipper.clone(), SinkOptions::default());
        let subscriber = tracing_subscriber::registry().with(TelemetryLayer::new(sink.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "directory", "getCompany - id: {}", 7);
            tracing::error!(
                target: "http",
                exception = "NotFound",
                exception_message = "Company not found with id: 7",
                request_id = 42,
                "CallerFault - Method: GET"
            );
            tracing::warn!(target: "telemetry", "never mirrored");
        });

        sink.shutdown(Duration::from_secs(5)).await;
        let documents = shipper.documents();
        assert_eq!(documents.len(), 2);

        let info = documents.iter().find(|d| d["level"] == "INFO").unwrap();
        assert_eq!(info["logger"], "directory");
        assert_eq!(info["message"], "getCompany - id: 7");
        assert!(info.get("exception").is_none());

        let error = documents.iter().find(|d| d["level"] == "ERROR").unwrap();
        assert_eq!(error["logger"], "http");
        assert_eq!(error["message"], "CallerFault - Method: GET request_id=42");
        assert_eq!(error["exception"], "NotFound");
        assert_eq!(error["stacktrace"], "Company not found with id: 7");
    }
}
