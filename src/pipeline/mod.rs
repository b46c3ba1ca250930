//! Request instrumentation and error reporting
//!
//! - `buffer`: replayable request bodies
//! - `context`: per-request key/value context
//! - `fault`: failure taxonomy raised by handlers
//! - `translator`: fault -> logged JSON envelope
//! - `middleware`: the stage tying them together

pub mod buffer;
pub mod context;
pub mod fault;
pub mod middleware;
pub mod translator;

pub use buffer::{BufferedMessage, CaptureLimits};
pub use context::{RequestContext, BODY_KEY};
pub use fault::{Fault, FaultKind};
pub use middleware::{instrument, instrumented, PipelineState};
pub use translator::{ErrorEnvelope, ErrorTranslator};
