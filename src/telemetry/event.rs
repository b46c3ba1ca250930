//! Structured log events and their index document form

use serde::Serialize;
use time::OffsetDateTime;

use crate::infrastructure::clock::serialize_rfc3339;

/// Severity of a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// One log statement, captured where it was produced.
///
/// Immutable once built; the sink consumes it exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: OffsetDateTime,
    pub level: LogLevel,
    pub logger: String,
    pub thread: String,
    pub message: String,
    pub exception_class: Option<String>,
    pub exception_message: Option<String>,
}

/// Wire document posted to `{backend}/{index}/_doc`
#[derive(Debug, Serialize)]
pub struct IndexDocument<'a> {
    #[serde(rename = "@timestamp", serialize_with = "serialize_rfc3339")]
    pub timestamp: &'a OffsetDateTime,
    pub level: LogLevel,
    pub logger: &'a str,
    pub thread: &'a str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<&'a str>,
}

impl LogEvent {
    /// Event stamped with the current time and thread
    pub fn now(level: LogLevel, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            level,
            logger: logger.into(),
            thread: current_thread_name(),
            message: message.into(),
            exception_class: None,
            exception_message: None,
        }
    }

    pub fn with_exception(mut self, class: impl Into<String>, message: Option<String>) -> Self {
        self.exception_class = Some(class.into());
        self.exception_message = message;
        self
    }

    pub fn document(&self) -> IndexDocument<'_> {
        IndexDocument {
            timestamp: &self.timestamp,
            level: self.level,
            logger: &self.logger,
            thread: &self.thread,
            message: &self.message,
            exception: self.exception_class.as_deref(),
            stacktrace: self
                .exception_class
                .as_ref()
                .and(self.exception_message.as_deref()),
        }
    }

    /// Serialize to the JSON body shipped to the index
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.document())
    }
}

/// Name of the calling thread, or its id when unnamed
pub fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> LogEvent {
        LogEvent {
            timestamp: datetime!(2024-05-01 08:00:00 UTC),
            level: LogLevel::Info,
            logger: "directory".into(),
            thread: "tokio-runtime-worker".into(),
            message: "createCompany - name: Acme".into(),
            exception_class: None,
            exception_message: None,
        }
    }

    #[test]
    fn test_document_without_exception() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();

        assert_eq!(json["@timestamp"], "2024-05-01T08:00:00Z");
        assert_eq!(json["level"], "INFO");
        assert_eq!(json["logger"], "directory");
        assert_eq!(json["thread"], "tokio-runtime-worker");
        assert_eq!(json["message"], "createCompany - name: Acme");
        assert!(json.get("exception").is_none());
        assert!(json.get("stacktrace").is_none());
    }

    #[test]
    fn test_document_with_exception() {
        let event = sample().with_exception("NotFound", Some("Company not found with id: 7".into()));
        let json: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(json["exception"], "NotFound");
        assert_eq!(json["stacktrace"], "Company not found with id: 7");
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(LogLevel::from(&tracing::Level::WARN), LogLevel::Warn);
        assert_eq!(LogLevel::from(&tracing::Level::ERROR).as_str(), "ERROR");
        assert!(LogLevel::Error > LogLevel::Info);
    }

    #[test]
    fn test_now_uses_current_thread() {
        let handle = std::thread::Builder::new()
            .name("capture-thread".into())
            .spawn(|| LogEvent::now(LogLevel::Warn, "http", "slow request"))
            .unwrap();
        let event = handle.join().unwrap();
        assert_eq!(event.thread, "capture-thread");
    }
}
