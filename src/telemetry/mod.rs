//! Log shipping to an external index backend
//!
//! - `event`: LogEvent and its JSON index document
//! - `shipper`: transport trait and the HTTP implementation
//! - `sink`: bounded queue drained by a fixed worker pool
//! - `layer`: tracing layer feeding the sink

pub mod event;
pub mod layer;
pub mod shipper;
pub mod sink;

pub use event::{LogEvent, LogLevel};
pub use layer::TelemetryLayer;
pub use shipper::{HttpShipper, Shipper, TelemetryError};
pub use sink::{DiagnosticsSnapshot, SinkOptions, TelemetrySink};
