use axum::{routing::get, Router};

pub mod admin;
pub mod me;
pub mod super_admin;
pub mod system;
pub mod workspaces;

/// Endpoints behind the single-tenant pipeline (`AuthorizationContext` extension).
pub fn authenticated_router() -> Router {
    Router::new()
        .route("/me", get(me::me))
        .nest("/admin", admin::router())
}

/// Endpoints that run the multi-tenant pipeline in the handler
/// (`BearerToken` extension; the workspace id comes from the path).
pub fn workspace_router() -> Router {
    Router::new()
        .nest("/workspaces", workspaces::router())
        .nest("/super-admin", super_admin::router())
}
