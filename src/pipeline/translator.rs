//! Central failure translation
//!
//! Every fault that reaches the pipeline ends here: its request context is
//! resolved, exactly one ERROR line is logged, and a stable JSON envelope is
//! returned. Nothing in this path can fail in a way that hides the original
//! fault.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::Level;

use super::buffer::BufferedMessage;
use super::context::{RequestContext, BODY_KEY};
use super::fault::{Fault, FaultKind};
use crate::infrastructure::clock::{serialize_rfc3339, MonotonicClock};
use crate::infrastructure::config::CaptureConfig;

/// Placeholder logged when a piece of request context is missing
pub const UNAVAILABLE: &str = "unavailable";

/// The only shape clients see on failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Turns faults into logged, client-safe responses
#[derive(Debug)]
pub struct ErrorTranslator {
    clock: MonotonicClock,
    expose_internal_messages: bool,
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ErrorTranslator {
    pub fn new(expose_internal_messages: bool) -> Self {
        Self {
            clock: MonotonicClock::new(),
            expose_internal_messages,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.expose_internal_messages)
    }

    /// Log `fault` with its request context, then build the envelope
    pub fn translate(
        &self,
        fault: &Fault,
        ctx: &RequestContext,
        buffer: Option<&BufferedMessage>,
    ) -> ErrorEnvelope {
        let body = resolve_body(ctx, buffer);
        let query = ctx.query().unwrap_or(UNAVAILABLE);

        crate::log_http!(
            Level::ERROR,
            exception = fault.origin(),
            exception_message = fault.message(),
            request_id = %ctx.request_id(),
            "{} - Method: {}, URL: {}, QueryString: {}, Body: {}, Message: {}",
            fault.kind().label(),
            ctx.method(),
            ctx.url(),
            query,
            body,
            fault.message()
        );

        self.envelope(fault, ctx.path())
    }

    /// Envelope for `fault` without logging
    pub fn envelope(&self, fault: &Fault, path: &str) -> ErrorEnvelope {
        let status = fault.kind().status();
        let reason = status.canonical_reason().unwrap_or("Unknown Status");
        let message = if fault.kind() == FaultKind::InternalFault && !self.expose_internal_messages {
            reason.to_string()
        } else {
            fault.message().to_string()
        };

        ErrorEnvelope {
            status: status.as_u16(),
            error: reason.to_string(),
            message,
            path: path.to_string(),
            timestamp: self.clock.now(),
        }
    }
}

/// Cached body first, then the buffer itself, then the placeholder
fn resolve_body(ctx: &RequestContext, buffer: Option<&BufferedMessage>) -> String {
    if let Some(body) = ctx.lookup(BODY_KEY) {
        return body.to_string();
    }
    buffer
        .and_then(BufferedMessage::text)
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{capture_events, CapturedEvent};
    use axum::http::Method;
    use bytes::Bytes;

    fn ctx(query: Option<&str>) -> RequestContext {
        RequestContext::new(
            Method::POST,
            "http://localhost:8080/api/test/exception/runtime",
            "/api/test/exception/runtime",
            query.map(str::to_string),
        )
    }

    fn error_events(events: &[CapturedEvent]) -> Vec<&CapturedEvent> {
        events.iter().filter(|e| e.level == tracing::Level::ERROR).collect()
    }

    #[test]
    fn test_caller_fault_envelope() {
        let translator = ErrorTranslator::default();
        let envelope = translator.translate(&Fault::not_found("Company", 3), &ctx(None), None);

        assert_eq!(envelope.status, 400);
        assert_eq!(envelope.error, "Bad Request");
        assert_eq!(envelope.message, "Company not found with id: 3");
        assert_eq!(envelope.path, "/api/test/exception/runtime");
    }

    #[test]
    fn test_internal_fault_envelope() {
        let translator = ErrorTranslator::default();
        let envelope = translator.translate(&Fault::internal("disk on fire"), &ctx(None), None);

        assert_eq!(envelope.status, 500);
        assert_eq!(envelope.error, "Internal Server Error");
        assert_eq!(envelope.message, "disk on fire");
    }

    #[test]
    fn test_hidden_internal_message() {
        let translator = ErrorTranslator::new(false);

        let internal = translator.envelope(&Fault::internal("db password wrong"), "/x");
        assert_eq!(internal.message, "Internal Server Error");

        let caller = translator.envelope(&Fault::invalid_input("name is required"), "/x");
        assert_eq!(caller.message, "name is required");
    }

    #[test]
    fn test_exactly_one_error_line_with_context() {
        let translator = ErrorTranslator::default();
        let mut context = ctx(Some("userId=123"));
        context.publish(BODY_KEY, r#"{"message":"error test"}"#);

        let (_, events) = capture_events(|| {
            translator.translate(&Fault::internal("This is a test"), &context, None)
        });

        let errors = error_events(&events);
        assert_eq!(errors.len(), 1);
        let line = &errors[0].message;
        assert!(line.starts_with("InternalFault - Method: POST"));
        assert!(line.contains("URL: http://localhost:8080/api/test/exception/runtime"));
        assert!(line.contains("QueryString: userId=123"));
        assert!(line.contains(r#"Body: {"message":"error test"}"#));
        assert!(line.contains("Message: This is a test"));
        assert_eq!(errors[0].target, "http");
    }

    #[test]
    fn test_body_falls_back_to_buffer() {
        let translator = ErrorTranslator::default();
        let buffer = BufferedMessage::from_bytes(Bytes::from_static(b"raw-body"), 10_000);

        let (_, events) = capture_events(|| {
            translator.translate(&Fault::internal("x"), &ctx(None), Some(&buffer))
        });
        let errors = error_events(&events);
        assert!(errors[0].message.contains("Body: raw-body"));
        assert!(errors[0].message.contains("QueryString: unavailable"));
    }

    #[test]
    fn test_body_unavailable() {
        let translator = ErrorTranslator::default();
        let (_, events) = capture_events(|| translator.translate(&Fault::internal("x"), &ctx(None), None));
        assert!(error_events(&events)[0].message.contains("Body: unavailable"));
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let translator = ErrorTranslator::default();
        let fault = Fault::invalid_input("bad");
        let mut last = translator.envelope(&fault, "/").timestamp;
        for _ in 0..100 {
            let next = translator.envelope(&fault, "/").timestamp;
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn test_envelope_json_shape() {
        let translator = ErrorTranslator::default();
        let envelope = translator.envelope(&Fault::invalid_input("bad"), "/api/employees");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], 400);
        assert_eq!(json["error"], "Bad Request");
        assert_eq!(json["message"], "bad");
        assert_eq!(json["path"], "/api/employees");
        let ts = json["timestamp"].as_str().unwrap();
        assert!(OffsetDateTime::parse(ts, &time::format_description::well_known::Rfc3339).is_ok());
    }
}
