use serde::Serialize;

use gatehouse_core::{Email, TeamMember, Workspace, WorkspaceId, WorkspaceMember};

use crate::VerifiedIdentity;

/// The authenticated caller as described by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub email: Email,
    pub name: String,
    pub picture: Option<String>,
    pub given_name: Option<String>,
}

impl From<&VerifiedIdentity> for AuthenticatedUser {
    fn from(identity: &VerifiedIdentity) -> Self {
        Self {
            email: identity.email.clone(),
            name: identity.display_name(),
            picture: identity.picture.clone(),
            given_name: identity.given_name.clone(),
        }
    }
}

/// Single-tenant authorization context for a request.
///
/// Request-scoped and immutable once built: fields are private and there are
/// no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationContext {
    user: AuthenticatedUser,
    team_member: TeamMember,
    is_admin: bool,
}

impl AuthorizationContext {
    pub fn new(user: AuthenticatedUser, team_member: TeamMember, is_admin: bool) -> Self {
        Self {
            user,
            team_member,
            is_admin,
        }
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn team_member(&self) -> &TeamMember {
        &self.team_member
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

/// Privilege tier of a caller relative to the current workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    SuperAdmin,
    WorkspaceManager,
    WorkspaceMember,
    Member,
}

/// Multi-tenant authorization context for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceAuthorizationContext {
    user: AuthenticatedUser,
    team_member: TeamMember,
    is_super_admin: bool,
    workspaces: Vec<Workspace>,
    current_workspace: Option<Workspace>,
    current_member: Option<WorkspaceMember>,
}

impl WorkspaceAuthorizationContext {
    /// Context with no workspace selected.
    pub fn new(
        user: AuthenticatedUser,
        team_member: TeamMember,
        is_super_admin: bool,
        workspaces: Vec<Workspace>,
    ) -> Self {
        Self {
            user,
            team_member,
            is_super_admin,
            workspaces,
            current_workspace: None,
            current_member: None,
        }
    }

    /// Same context scoped to a workspace the caller was already granted access to.
    ///
    /// Consumes `self`: the unscoped context is never observable next to the scoped one.
    pub fn with_current_workspace(
        self,
        workspace: Workspace,
        member: Option<WorkspaceMember>,
    ) -> Self {
        Self {
            current_workspace: Some(workspace),
            current_member: member,
            ..self
        }
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn email(&self) -> &Email {
        &self.user.email
    }

    pub fn team_member(&self) -> &TeamMember {
        &self.team_member
    }

    pub fn is_super_admin(&self) -> bool {
        self.is_super_admin
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn find_workspace(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.current_workspace.as_ref()
    }

    pub fn current_member(&self) -> Option<&WorkspaceMember> {
        self.current_member.as_ref()
    }

    /// Highest tier that applies to the current workspace (if any).
    pub fn tier(&self) -> AccessTier {
        if self.is_super_admin {
            return AccessTier::SuperAdmin;
        }
        match &self.current_workspace {
            Some(ws) if ws.is_managed_by(self.email()) => AccessTier::WorkspaceManager,
            Some(ws) if self.current_member.is_some() || self.find_workspace(ws.id).is_some() => {
                AccessTier::WorkspaceMember
            }
            _ => AccessTier::Member,
        }
    }
}
