use serde::{Deserialize, Serialize};

use gatehouse_auth::{AccessTier, AuthenticatedUser, WorkspaceAuthorizationContext};
use gatehouse_core::{Email, TeamMember, Workspace, WorkspaceId, WorkspaceMember, WorkspaceRole};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddWorkspaceMemberRequest {
    pub email: String,
    pub role: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct WorkspaceContextResponse {
    pub user: AuthenticatedUser,
    pub team_member: TeamMember,
    pub is_super_admin: bool,
    pub tier: AccessTier,
    pub workspaces: Vec<Workspace>,
    pub current_workspace: Option<Workspace>,
    pub current_member: Option<WorkspaceMember>,
}

impl From<&WorkspaceAuthorizationContext> for WorkspaceContextResponse {
    fn from(ctx: &WorkspaceAuthorizationContext) -> Self {
        Self {
            user: ctx.user().clone(),
            team_member: ctx.team_member().clone(),
            is_super_admin: ctx.is_super_admin(),
            tier: ctx.tier(),
            workspaces: ctx.workspaces().to_vec(),
            current_workspace: ctx.current_workspace().cloned(),
            current_member: ctx.current_member().cloned(),
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_email(raw: &str) -> Result<Email, ApiError> {
    Email::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Unparseable ids are treated like unknown ones by callers (no existence leak).
pub fn parse_workspace_id(raw: &str) -> Option<WorkspaceId> {
    raw.parse().ok()
}

pub fn parse_workspace_role(raw: Option<&str>) -> Result<Option<WorkspaceRole>, ApiError> {
    raw.map(|r| {
        r.parse::<WorkspaceRole>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_role_parsing() {
        assert_eq!(parse_workspace_role(None).unwrap(), None);
        assert_eq!(
            parse_workspace_role(Some("editor")).unwrap(),
            Some(WorkspaceRole::Editor)
        );
        assert!(matches!(
            parse_workspace_role(Some("owner")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn bad_workspace_ids_parse_to_none() {
        assert!(parse_workspace_id("not-a-uuid").is_none());
        assert!(parse_workspace_id("00000000-0000-0000-0000-000000000001").is_some());
    }
}
