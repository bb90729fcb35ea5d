use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use gatehouse_auth::{gate, AuthError, ForbiddenKind, WorkspaceAuthorizationContext};
use gatehouse_core::WorkspaceMember;

use crate::app::dto::{
    parse_email, parse_workspace_id, parse_workspace_role, AddWorkspaceMemberRequest,
    WorkspaceContextResponse,
};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::BearerToken;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_workspaces))
        .route("/:id", get(get_workspace))
        .route("/:id/members", post(add_workspace_member))
}

/// Caller's workspaces, provisioning one on first sight for allow-listed domains.
pub async fn list_workspaces(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> Result<Json<WorkspaceContextResponse>, ApiError> {
    let ctx = services
        .authenticator
        .authenticate_workspace(token.as_str(), None, Utc::now())
        .await?;
    Ok(Json(WorkspaceContextResponse::from(&ctx)))
}

pub async fn get_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> Result<Json<WorkspaceContextResponse>, ApiError> {
    let ctx = scoped_context(&services, &token, &id).await?;
    Ok(Json(WorkspaceContextResponse::from(&ctx)))
}

/// Manager-only: grant an email access to the workspace (upsert).
pub async fn add_workspace_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
    Json(req): Json<AddWorkspaceMemberRequest>,
) -> Result<(StatusCode, Json<WorkspaceMember>), ApiError> {
    let ctx = scoped_context(&services, &token, &id).await?;
    gate::require_workspace_manager(&ctx)?;

    let email = parse_email(&req.email)?;
    let role = parse_workspace_role(req.role.as_deref())?;
    let workspace_id = ctx
        .current_workspace()
        .map(|ws| ws.id)
        .ok_or_else(|| AuthError::internal("scoped context without workspace"))?;

    let member = services
        .workspaces
        .add_member(workspace_id, &email, role, Utc::now())
        .await?;

    tracing::info!(
        %workspace_id,
        manager = %ctx.email(),
        member = %member.email,
        "workspace member added"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

/// Multi-tenant context scoped to the workspace named in the path.
/// Ids that do not parse are denied like unknown ones.
async fn scoped_context(
    services: &AppServices,
    token: &BearerToken,
    raw_id: &str,
) -> Result<WorkspaceAuthorizationContext, ApiError> {
    let Some(id) = parse_workspace_id(raw_id) else {
        // Still authenticate first: a bad token must be a 401, not a 403.
        services
            .authenticator
            .authenticate_workspace(token.as_str(), None, Utc::now())
            .await?;
        return Err(AuthError::from(ForbiddenKind::WorkspaceAccessDenied).into());
    };
    Ok(services
        .authenticator
        .authenticate_workspace(token.as_str(), Some(id), Utc::now())
        .await?)
}
