//! Company directory service
//!
//! # Architecture
//! - **directory**: In-memory company/employee store
//! - **rest**: HTTP handlers
//! - **pipeline**: Body replay, request context, fault translation
//! - **telemetry**: Asynchronous log shipping to the search index
//! - **infrastructure**: Config, logging, clock, api

use company_directory::directory::DirectoryService;
use company_directory::infrastructure::{build_router, start_server};
use company_directory::log_main;
use company_directory::pipeline::PipelineState;
use company_directory::rest::AppState;
use company_directory::telemetry::{HttpShipper, SinkOptions, TelemetryLayer, TelemetrySink};
use company_directory::{infrastructure::logging::init_logging, Config, Result};
use tracing::Level;

/// Main application state
pub struct DirectoryApp {
    config: Config,
}

impl DirectoryApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until Ctrl-C, then drain telemetry within the grace period
    pub async fn run(self) -> Result<()> {
        // 1. Telemetry sink (must exist before the subscriber that feeds it)
        let sink = if self.config.telemetry.enabled {
            let shipper = HttpShipper::from_config(&self.config.telemetry)?;
            Some(TelemetrySink::start(
                shipper,
                SinkOptions::from(&self.config.telemetry),
            ))
        } else {
            None
        };

        // 2. Logging; guards flush the file appenders on drop
        let _guards = init_logging(
            &self.config.logging,
            sink.clone().map(TelemetryLayer::new),
        )?;
        match &sink {
            Some(_) => log_main!(
                Level::INFO,
                "Shipping logs to {}/{} with {} workers (queue capacity {})",
                self.config.telemetry.backend_url,
                self.config.telemetry.index_name,
                self.config.telemetry.workers,
                self.config.telemetry.queue_capacity
            ),
            None => log_main!(Level::INFO, "Telemetry shipping disabled"),
        }

        // 3. API server
        let app = build_router(
            AppState::new(DirectoryService::new()),
            PipelineState::from_config(&self.config),
        );
        let served = start_server(app, self.config.server.port, shutdown_signal()).await;
        if let Err(e) = &served {
            log_main!(Level::ERROR, "API Server failed: {}", e);
        }

        // 4. Drain telemetry; the sink logs its own final stats
        if let Some(sink) = sink {
            sink.shutdown(self.config.telemetry.shutdown_grace()).await;
        }

        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log_main!(Level::WARN, "Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log_main!(Level::INFO, "Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    DirectoryApp::new(config).run().await?;

    Ok(())
}
