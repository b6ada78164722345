//! HTTP API application wiring (Axum router + shared services).
//!
//! - `services.rs`: loaded model, readiness flag, inference failure tracking
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::StatusCode, Extension, Router};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServiceConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// The router serves immediately; prediction endpoints answer 503 until a
/// model is installed into `services`.
pub fn build_app(config: &ServiceConfig, services: Arc<AppServices>) -> Router {
    routes::router()
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(axum::middleware::map_response(errors::timeout_to_json))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                ))
                .layer(DefaultBodyLimit::max(config.max_body_bytes)),
        )
}

pub use services::AppServices;
