//! Replayable request bodies
//!
//! A request body is a single-use stream. `BufferedMessage` reads it once and
//! keeps the bytes so the handler and the error path can both read them.
//! The handler always gets the complete payload; only the capture view used
//! for logging is bounded.

use axum::body::Body;
use bytes::Bytes;
use http_body_util::LengthLimitError;

use super::fault::Fault;
use crate::infrastructure::config::{CaptureConfig, ServerConfig};

/// Size limits applied when buffering a body
#[derive(Debug, Clone, Copy)]
pub struct CaptureLimits {
    /// Hard cap on bytes read from the stream
    pub max_body_size: usize,
    /// Bytes kept for logging and error reports
    pub max_payload_length: usize,
}

impl CaptureLimits {
    pub fn from_config(server: &ServerConfig, capture: &CaptureConfig) -> Self {
        Self {
            max_body_size: server.max_body_size,
            max_payload_length: capture.max_payload_length,
        }
    }
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default(), &CaptureConfig::default())
    }
}

/// Body bytes captured from a single-use stream, readable any number of times
#[derive(Debug, Clone)]
pub struct BufferedMessage {
    full: Bytes,
    capture_len: usize,
}

impl BufferedMessage {
    /// Drain `body` once, up to `limits.max_body_size`
    pub async fn capture(body: Body, limits: &CaptureLimits) -> Result<Self, Fault> {
        match axum::body::to_bytes(body, limits.max_body_size).await {
            Ok(bytes) => Ok(Self::from_bytes(bytes, limits.max_payload_length)),
            Err(e) => {
                let inner = e.into_inner();
                if inner.is::<LengthLimitError>() {
                    Err(Fault::payload_too_large(limits.max_body_size))
                } else {
                    Err(Fault::invalid_input(format!("Failed to read request body: {}", inner)))
                }
            }
        }
    }

    pub fn from_bytes(full: Bytes, max_payload_length: usize) -> Self {
        let capture_len = full.len().min(max_payload_length);
        Self { full, capture_len }
    }

    /// Fresh body carrying the complete payload. Cloning `Bytes` is O(1).
    pub fn replay_body(&self) -> Body {
        Body::from(self.full.clone())
    }

    /// Complete payload
    pub fn full(&self) -> &[u8] {
        &self.full
    }

    /// Bounded view used for observability
    pub fn captured(&self) -> &[u8] {
        &self.full[..self.capture_len]
    }

    /// Captured bytes as text, `None` for an empty body
    pub fn text(&self) -> Option<String> {
        if self.capture_len == 0 {
            return None;
        }
        Some(String::from_utf8_lossy(self.captured()).into_owned())
    }

    pub fn total_len(&self) -> usize {
        self.full.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.capture_len < self.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}
