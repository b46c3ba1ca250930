//! Request instrumentation stage
//!
//! `instrument` is a plain `(request, next) -> response` function mounted with
//! `axum::middleware::from_fn_with_state`. Order within one request:
//! wrap body -> run handler -> translate fault (if any) -> log -> respond.

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::Level;

use super::buffer::{BufferedMessage, CaptureLimits};
use super::context::{RequestContext, BODY_KEY};
use super::fault::{panic_response, Fault};
use super::translator::ErrorTranslator;
use crate::infrastructure::config::Config;

/// Shared state of the instrumentation stage
#[derive(Clone)]
pub struct PipelineState {
    pub limits: CaptureLimits,
    pub translator: Arc<ErrorTranslator>,
}

impl PipelineState {
    pub fn new(limits: CaptureLimits, translator: ErrorTranslator) -> Self {
        Self {
            limits,
            translator: Arc::new(translator),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CaptureLimits::from_config(&config.server, &config.capture),
            ErrorTranslator::from_config(&config.capture),
        )
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(CaptureLimits::default(), ErrorTranslator::default())
    }
}

/// Wrap `router` with panic capture and the instrumentation stage
pub fn instrumented<S>(router: Router<S>, state: PipelineState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state, instrument))
}

pub async fn instrument(State(state): State<PipelineState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let mut ctx = RequestContext::from_parts(&parts);

    crate::log_http!(
        Level::INFO,
        request_id = %ctx.request_id(),
        "Method: {}, URL: {}, query string: {}",
        ctx.method(),
        ctx.url(),
        ctx.query().unwrap_or("none")
    );

    let buffered = match BufferedMessage::capture(body, &state.limits).await {
        Ok(buffered) => buffered,
        Err(fault) => {
            let envelope = state.translator.translate(&fault, &ctx, None);
            log_status(&ctx, envelope.status, started);
            return envelope.into_response();
        }
    };
    if let Some(text) = buffered.text() {
        ctx.publish(BODY_KEY, text);
    }

    let request = Request::from_parts(parts, buffered.replay_body());
    let mut response = next.run(request).await;

    if let Some(fault) = response.extensions_mut().remove::<Fault>() {
        response = state
            .translator
            .translate(&fault, &ctx, Some(&buffered))
            .into_response();
    }

    if let Some(body) = ctx.lookup(BODY_KEY) {
        if buffered.is_truncated() {
            crate::log_http!(
                Level::INFO,
                "Request Body ({} of {} bytes): {}",
                buffered.captured().len(),
                buffered.total_len(),
                body
            );
        } else {
            crate::log_http!(Level::INFO, "Request Body: {}", body);
        }
    }
    log_status(&ctx, response.status().as_u16(), started);

    response
}

fn log_status(ctx: &RequestContext, status: u16, started: Instant) {
    crate::log_http!(
        Level::INFO,
        request_id = %ctx.request_id(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Status: {}",
        status
    );
}
