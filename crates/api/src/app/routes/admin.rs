//! Team member administration.
//!
//! Mounted behind the authentication and admin guards, so every handler here
//! runs for an active admin only.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use gatehouse_auth::AuthorizationContext;
use gatehouse_core::TeamMember;

use crate::app::dto::parse_email;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::admin_middleware;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/members/:email", get(get_member))
        .route("/members/:email/deactivate", post(deactivate_member))
        .route("/members/:email/activate", post(activate_member))
        .route_layer(middleware::from_fn(admin_middleware))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

pub async fn get_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> Result<Json<TeamMember>, ApiError> {
    let email = parse_email(&email)?;
    services
        .members
        .find_by_email(&email)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("team member not found"))
}

pub async fn deactivate_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizationContext>,
    Path(email): Path<String>,
) -> Result<Json<TeamMember>, ApiError> {
    set_active(&services, &ctx, &email, false).await
}

pub async fn activate_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizationContext>,
    Path(email): Path<String>,
) -> Result<Json<TeamMember>, ApiError> {
    set_active(&services, &ctx, &email, true).await
}

async fn set_active(
    services: &AppServices,
    ctx: &AuthorizationContext,
    email: &str,
    active: bool,
) -> Result<Json<TeamMember>, ApiError> {
    let email = parse_email(email)?;
    let updated = services
        .members
        .set_active(&email, active, Utc::now())
        .await?
        .ok_or(ApiError::NotFound("team member not found"))?;

    tracing::info!(
        admin = %ctx.user().email,
        member = %updated.email,
        active,
        "team member status changed"
    );
    Ok(Json(updated))
}
