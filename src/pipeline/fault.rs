//! Failure taxonomy for request processing
//!
//! Handlers return `Fault`; its `IntoResponse` only attaches the fault to the
//! response so the instrumentation stage can translate it with the request
//! context in hand.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use thiserror::Error;

/// Classification driving the status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Malformed input or a referenced entity that does not exist
    CallerFault,
    /// Request body above the server read limit
    PayloadTooLarge,
    /// Anything unclassified
    InternalFault,
}

impl FaultKind {
    pub fn status(&self) -> StatusCode {
        match self {
            FaultKind::CallerFault => StatusCode::BAD_REQUEST,
            FaultKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FaultKind::InternalFault => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FaultKind::CallerFault => "CallerFault",
            FaultKind::PayloadTooLarge => "PayloadTooLarge",
            FaultKind::InternalFault => "InternalFault",
        }
    }

    pub fn is_caller_fault(&self) -> bool {
        self.status().is_client_error()
    }
}

/// A failure raised while processing a request
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Fault {
    kind: FaultKind,
    /// Short name of what raised it, logged as the exception class
    origin: &'static str,
    message: String,
}

impl Fault {
    pub fn new(kind: FaultKind, origin: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Invalid argument supplied by the caller
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FaultKind::CallerFault, "InvalidInput", message)
    }

    /// Referenced entity does not exist
    pub fn not_found(entity: &str, id: u64) -> Self {
        Self::new(
            FaultKind::CallerFault,
            "NotFound",
            format!("{} not found with id: {}", entity, id),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InternalFault, "Internal", message)
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            FaultKind::PayloadTooLarge,
            "PayloadTooLarge",
            format!("Request body exceeds {} bytes", limit),
        )
    }

    /// Fault for a handler panic caught by the panic layer
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "handler panicked".to_string()
        };
        Self::new(FaultKind::InternalFault, "Panic", message)
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn origin(&self) -> &'static str {
        self.origin
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<JsonRejection> for Fault {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(FaultKind::CallerFault, "JsonRejection", rejection.body_text())
    }
}

impl From<PathRejection> for Fault {
    fn from(rejection: PathRejection) -> Self {
        Self::new(FaultKind::CallerFault, "PathRejection", rejection.body_text())
    }
}

impl From<QueryRejection> for Fault {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(FaultKind::CallerFault, "QueryRejection", rejection.body_text())
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let mut response = self.kind.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// `CatchPanicLayer` handler turning a panic into an internal fault
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    Fault::from_panic(payload).into_response()
}
