//! API Server
//!
//! Routes the directory endpoints through the instrumentation pipeline and
//! serves them until the shutdown signal fires.

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tracing::Level;

use crate::pipeline::{instrumented, PipelineState};
use crate::rest::{companies, employees, exceptions, AppState};
use crate::AppError;

/// Build the full application router
pub fn build_router(state: AppState, pipeline: PipelineState) -> Router {
    let routes = Router::new()
        .route(
            "/api/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route(
            "/api/companies/:id",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        .route(
            "/api/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/employees/:id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/api/test/exception/illegal-argument",
            post(exceptions::caller_fault),
        )
        .route("/api/test/exception/runtime", post(exceptions::internal_fault))
        .route("/api/test/exception/success", post(exceptions::success))
        .with_state(state);

    instrumented(routes, pipeline).layer(CorsLayer::permissive())
}

/// Serve `app` on `port` until `shutdown` resolves
pub async fn start_server<F>(app: Router, port: u16, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    crate::log_main!(Level::INFO, "API Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    crate::log_main!(Level::INFO, "API Server stopped");
    Ok(())
}
