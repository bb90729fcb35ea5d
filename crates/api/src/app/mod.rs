//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, identity provider client and the authenticator
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and input parsing
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::Config;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router around already-wired services.
pub fn build_router(services: services::AppServices) -> Router {
    let auth_state = middleware::AuthState {
        authenticator: services.authenticator.clone(),
    };
    let services = Arc::new(services);

    // Single-tenant routes: the middleware runs the whole pipeline.
    // `route_layer` keeps unknown paths a plain 404.
    let authenticated = routes::authenticated_router()
        .layer(Extension(services.clone()))
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    // Workspace routes: header checked here, pipeline runs in the handler.
    let workspace_scoped = routes::workspace_router()
        .layer(Extension(services))
        .route_layer(axum::middleware::from_fn(middleware::bearer_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(authenticated)
        .merge(workspace_scoped)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_log)))
}

/// Build the production router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: &Config) -> Result<Router, services::ServiceError> {
    let services = services::build_services(config).await?;
    Ok(build_router(services))
}
