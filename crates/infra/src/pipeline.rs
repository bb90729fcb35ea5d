//! Per-request resolution pipeline.
//!
//! ```text
//! TOKEN_PENDING → {TOKEN_VALID | TOKEN_INVALID} → IDENTITY_RESOLVED
//!   → [WORKSPACE_RESOLVED] → {ACCESS_GRANTED | ACCESS_DENIED}
//! ```
//!
//! Every step is a single forward transition; there are no retries. The stage
//! reached is recorded on the request span as `stage`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{field, instrument, Span};

use gatehouse_auth::authorize::{resolve_context, resolve_workspace_context};
use gatehouse_auth::gate::{require_active_team_member, require_workspace_access};
use gatehouse_auth::{
    AuthError, AuthPolicy, AuthorizationContext, ForbiddenKind, VerifiedIdentity,
    WorkspaceAuthorizationContext,
};
use gatehouse_core::{IdGenerator, TeamMember, WorkspaceId};

use crate::identity::{internal, IdentityResolver};
use crate::provider::TokenVerifier;
use crate::provisioning::WorkspaceProvisioner;
use crate::store::{MemberStore, WorkspaceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    TokenPending,
    TokenValid,
    TokenInvalid,
    IdentityResolved,
    WorkspaceResolved,
    AccessGranted,
    AccessDenied,
}

impl ResolutionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TokenPending => "token_pending",
            Self::TokenValid => "token_valid",
            Self::TokenInvalid => "token_invalid",
            Self::IdentityResolved => "identity_resolved",
            Self::WorkspaceResolved => "workspace_resolved",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
        }
    }

    fn record(self) {
        Span::current().record("stage", self.as_str());
    }
}

/// Orchestrates token verification, identity resolution, provisioning and
/// access checks for one request.
///
/// Holds only shared, immutable collaborators; cloning is cheap.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<dyn TokenVerifier>,
    identities: Arc<IdentityResolver>,
    provisioner: Arc<WorkspaceProvisioner>,
    workspaces: Arc<dyn WorkspaceStore>,
    policy: Arc<AuthPolicy>,
}

impl Authenticator {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        members: Arc<dyn MemberStore>,
        workspaces: Arc<dyn WorkspaceStore>,
        ids: Arc<dyn IdGenerator>,
        policy: AuthPolicy,
    ) -> Self {
        Self {
            verifier,
            identities: Arc::new(IdentityResolver::new(members, ids.clone())),
            provisioner: Arc::new(WorkspaceProvisioner::new(workspaces.clone(), ids)),
            workspaces,
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Single-tenant resolution: verify, find-or-create, active guard, `is_admin`.
    #[instrument(skip_all, fields(stage = field::Empty, email = field::Empty))]
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthorizationContext, AuthError> {
        let (identity, member) = self.resolve_member(token, now).await?;
        let ctx = resolve_context(&identity, member, &self.policy);
        ResolutionStage::AccessGranted.record();
        Ok(ctx)
    }

    /// Multi-tenant resolution.
    ///
    /// After the active guard, lists (or provisions) the caller's workspaces and
    /// computes `is_super_admin`. When `workspace_id` is given, the workspace is
    /// selected as current after the access rule passes; an unknown id is
    /// reported as `WORKSPACE_ACCESS_DENIED` so existence is not leaked.
    #[instrument(
        skip_all,
        fields(
            stage = field::Empty,
            email = field::Empty,
            workspace_id = ?workspace_id
        )
    )]
    pub async fn authenticate_workspace(
        &self,
        token: &str,
        workspace_id: Option<WorkspaceId>,
        now: DateTime<Utc>,
    ) -> Result<WorkspaceAuthorizationContext, AuthError> {
        let (identity, member) = self.resolve_member(token, now).await?;

        let workspaces = self
            .provisioner
            .ensure_workspace(
                &identity.email,
                &identity.display_name(),
                &self.policy.allowed_domains,
                now,
            )
            .await?;
        let ctx = resolve_workspace_context(&identity, member, workspaces, &self.policy);
        ResolutionStage::WorkspaceResolved.record();

        let Some(id) = workspace_id else {
            ResolutionStage::AccessGranted.record();
            return Ok(ctx);
        };

        let workspace = match ctx.find_workspace(id) {
            Some(ws) => ws.clone(),
            None => self
                .workspaces
                .find_by_id(id)
                .await
                .map_err(internal)?
                .ok_or_else(|| denied(ForbiddenKind::WorkspaceAccessDenied.into()))?,
        };
        require_workspace_access(&ctx, &workspace).map_err(denied)?;

        let current_member = self
            .workspaces
            .find_member(id, ctx.email())
            .await
            .map_err(internal)?;

        ResolutionStage::AccessGranted.record();
        Ok(ctx.with_current_workspace(workspace, current_member))
    }

    async fn resolve_member(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(VerifiedIdentity, TeamMember), AuthError> {
        ResolutionStage::TokenPending.record();
        let identity = self
            .verifier
            .verify(token, self.policy.expected_audience.as_deref(), now)
            .await
            .map_err(|err| {
                ResolutionStage::TokenInvalid.record();
                err
            })?;
        ResolutionStage::TokenValid.record();
        Span::current().record("email", identity.email.as_str());

        let member = self
            .identities
            .find_or_create_team_member(&identity, now)
            .await?;
        ResolutionStage::IdentityResolved.record();

        require_active_team_member(&member).map_err(denied)?;
        Ok((identity, member))
    }
}

fn denied(err: AuthError) -> AuthError {
    ResolutionStage::AccessDenied.record();
    err
}
