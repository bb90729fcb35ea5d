use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use gatehouse_auth::gate;
use gatehouse_core::Workspace;

use crate::app::dto::parse_workspace_id;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::BearerToken;

pub fn router() -> Router {
    Router::new().route("/workspaces/:id", get(get_any_workspace))
}

/// Any workspace by id. Super-admins only, so a 404 leaks nothing.
pub async fn get_any_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> Result<Json<Workspace>, ApiError> {
    let ctx = services
        .authenticator
        .authenticate_workspace(token.as_str(), None, Utc::now())
        .await?;
    gate::require_super_admin(&ctx)?;

    let Some(id) = parse_workspace_id(&id) else {
        return Err(ApiError::NotFound("workspace not found"));
    };
    services
        .workspaces
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("workspace not found"))
}
