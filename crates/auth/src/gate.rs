//! Access gate: pure guards evaluated against an already-resolved context.
//!
//! Guards either return `Ok(())` or a tagged [`AuthError`]; there is no
//! partial success. The boundary layer composes them and maps failures to a
//! transport response. `require_active_team_member` must run before any
//! privilege guard: deactivation overrides admin and manager status.

use gatehouse_core::{TeamMember, Workspace};

use crate::{
    authorize, AuthError, AuthorizationContext, ForbiddenKind, WorkspaceAuthorizationContext,
};

pub fn require_active_team_member(member: &TeamMember) -> Result<(), AuthError> {
    if member.active {
        Ok(())
    } else {
        Err(ForbiddenKind::AccountDeactivated.into())
    }
}

pub fn require_admin(ctx: &AuthorizationContext) -> Result<(), AuthError> {
    require_active_team_member(ctx.team_member())?;
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(ForbiddenKind::AdminRequired.into())
    }
}

pub fn require_super_admin(ctx: &WorkspaceAuthorizationContext) -> Result<(), AuthError> {
    require_active_team_member(ctx.team_member())?;
    if ctx.is_super_admin() {
        Ok(())
    } else {
        Err(ForbiddenKind::SuperAdminRequired.into())
    }
}

/// Caller may act on `workspace` (super admin, its manager, or a resolved member).
pub fn require_workspace_access(
    ctx: &WorkspaceAuthorizationContext,
    workspace: &Workspace,
) -> Result<(), AuthError> {
    require_active_team_member(ctx.team_member())?;
    authorize::check_workspace_access(
        ctx.email(),
        ctx.is_super_admin(),
        workspace,
        ctx.workspaces(),
    )
}

/// Caller manages the context's current workspace (or is a super admin).
pub fn require_workspace_manager(ctx: &WorkspaceAuthorizationContext) -> Result<(), AuthError> {
    require_active_team_member(ctx.team_member())?;
    authorize::check_workspace_manager(ctx.email(), ctx.is_super_admin(), ctx.current_workspace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gatehouse_core::{Email, MemberId, MemberRole, WorkspaceId};
    use uuid::Uuid;

    use crate::{AccessTier, AuthPolicy, AuthenticatedUser};

    fn user(addr: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            email: Email::parse(addr).unwrap(),
            name: "Test".to_string(),
            picture: None,
            given_name: None,
        }
    }

    fn member(addr: &str, active: bool) -> TeamMember {
        TeamMember {
            active,
            ..TeamMember::first_seen(
                MemberId::from_uuid(Uuid::from_u128(1)),
                Email::parse(addr).unwrap(),
                "Test",
                None,
                Utc::now(),
            )
        }
    }

    fn workspace(manager: &str) -> Workspace {
        Workspace::new(
            WorkspaceId::from_uuid(Uuid::from_u128(5)),
            Email::parse(manager).unwrap(),
            &[],
            Utc::now(),
        )
    }

    #[test]
    fn deactivated_admin_from_list_is_blocked() {
        let policy = AuthPolicy::from_raw(None, Some("admin@x.com"), None, None);
        let m = member("admin@x.com", false);
        let ctx = AuthorizationContext::new(
            user("admin@x.com"),
            m.clone(),
            authorize::is_admin(&m, &policy),
        );
        assert!(ctx.is_admin());

        let err = require_admin(&ctx).unwrap_err();
        assert_eq!(err, AuthError::Forbidden(ForbiddenKind::AccountDeactivated));
    }

    #[test]
    fn deactivation_overrides_admin_role() {
        let m = TeamMember {
            role: MemberRole::Admin,
            ..member("boss@x.com", false)
        };
        let err = require_active_team_member(&m).unwrap_err();
        assert_eq!(err.code(), "ACCOUNT_DEACTIVATED");
    }

    #[test]
    fn require_admin_rejects_plain_member() {
        let ctx = AuthorizationContext::new(user("a@x.com"), member("a@x.com", true), false);
        assert_eq!(
            require_admin(&ctx).unwrap_err(),
            AuthError::Forbidden(ForbiddenKind::AdminRequired)
        );
    }

    #[test]
    fn require_super_admin_flags() {
        let ctx = WorkspaceAuthorizationContext::new(
            user("a@x.com"),
            member("a@x.com", true),
            false,
            vec![],
        );
        assert_eq!(
            require_super_admin(&ctx).unwrap_err(),
            AuthError::Forbidden(ForbiddenKind::SuperAdminRequired)
        );

        let ctx = WorkspaceAuthorizationContext::new(
            user("a@x.com"),
            member("a@x.com", true),
            true,
            vec![],
        );
        assert!(require_super_admin(&ctx).is_ok());
        assert_eq!(ctx.tier(), AccessTier::SuperAdmin);
    }

    #[test]
    fn deactivated_manager_cannot_manage() {
        let ws = workspace("owner@x.com");
        let ctx = WorkspaceAuthorizationContext::new(
            user("owner@x.com"),
            member("owner@x.com", false),
            false,
            vec![ws.clone()],
        )
        .with_current_workspace(ws, None);

        assert_eq!(
            require_workspace_manager(&ctx).unwrap_err(),
            AuthError::Forbidden(ForbiddenKind::AccountDeactivated)
        );
    }

    #[test]
    fn manager_guard_and_tier() {
        let ws = workspace("owner@x.com");
        let ctx = WorkspaceAuthorizationContext::new(
            user("owner@x.com"),
            member("owner@x.com", true),
            false,
            vec![ws.clone()],
        );
        assert!(matches!(require_workspace_manager(&ctx), Err(AuthError::Internal(_))));

        let ctx = ctx.with_current_workspace(ws, None);
        assert!(require_workspace_manager(&ctx).is_ok());
        assert_eq!(ctx.tier(), AccessTier::WorkspaceManager);
    }

    #[test]
    fn member_tier_and_access() {
        let ws = workspace("owner@x.com");
        let ctx = WorkspaceAuthorizationContext::new(
            user("dev@x.com"),
            member("dev@x.com", true),
            false,
            vec![ws.clone()],
        );
        assert!(require_workspace_access(&ctx, &ws).is_ok());

        let ctx = ctx.with_current_workspace(ws, None);
        assert_eq!(ctx.tier(), AccessTier::WorkspaceMember);
        assert_eq!(
            require_workspace_manager(&ctx).unwrap_err(),
            AuthError::Forbidden(ForbiddenKind::WorkspaceManagerRequired)
        );
    }
}
