//! Infrastructure - everything around the request pipeline
//!
//! This module contains:
//! - Configuration management
//! - Logging
//! - Timestamp source
//! - API server wiring and graceful shutdown

pub mod api;
pub mod clock;
pub mod config;
pub mod logging;

pub use api::{build_router, start_server};
pub use clock::MonotonicClock;
