use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use gatehouse_core::{
    Email, MemberId, TeamMember, Workspace, WorkspaceId, WorkspaceMember, WorkspaceRole,
};

/// Store-layer failure.
///
/// `Conflict` is the only variant callers are expected to recover from: it is
/// raised when a uniqueness constraint rejects a write that raced another one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Persistence boundary for team members.
///
/// ## Invariants
///
/// - At most one record per canonical email. `insert` reports
///   [`StoreError::Conflict`] instead of creating a duplicate.
/// - Records are never deleted; deactivation goes through `set_active`.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<TeamMember>, StoreError>;

    async fn find_by_id(&self, id: MemberId) -> Result<Option<TeamMember>, StoreError>;

    async fn insert(&self, member: &TeamMember) -> Result<(), StoreError>;

    /// Overwrite display fields. `NotFound` when `id` is unknown.
    async fn update_profile(
        &self,
        id: MemberId,
        name: &str,
        first_name: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Returns the updated record, or `None` when no member has this email.
    async fn set_active(
        &self,
        email: &Email,
        active: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<TeamMember>, StoreError>;
}

/// Persistence boundary for workspaces and explicit workspace membership.
///
/// ## Invariants
///
/// - At most one workspace per manager email (self-service provisioning
///   relies on it to stay idempotent under races).
/// - `list_for_email` returns workspaces the email manages or is an explicit
///   member of, ordered by creation time.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    async fn list_for_email(&self, email: &Email) -> Result<Vec<Workspace>, StoreError>;

    async fn insert(&self, workspace: &Workspace) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: WorkspaceId) -> Result<Option<Workspace>, StoreError>;

    async fn find_member(
        &self,
        workspace_id: WorkspaceId,
        email: &Email,
    ) -> Result<Option<WorkspaceMember>, StoreError>;

    /// Insert or update the role of an explicit member.
    ///
    /// Idempotent: re-adding an existing member only replaces its role and
    /// keeps the original `created_at`.
    async fn add_member(
        &self,
        workspace_id: WorkspaceId,
        email: &Email,
        role: Option<WorkspaceRole>,
        now: DateTime<Utc>,
    ) -> Result<WorkspaceMember, StoreError>;
}
