//! Privilege computation (no IO, no panics).
//!
//! Two independent flags are derived here and must stay separate:
//! - `is_admin`: legacy single-tenant flag (member role or `ADMIN_EMAILS`).
//! - `is_super_admin`: multi-tenant flag (`SUPER_ADMIN_EMAILS`, falling back
//!   to `ADMIN_EMAILS` when unset).

use gatehouse_core::{Email, TeamMember, Workspace};

use crate::{
    AuthError, AuthPolicy, AuthenticatedUser, AuthorizationContext, ForbiddenKind,
    VerifiedIdentity, WorkspaceAuthorizationContext,
};

/// `role == admin` OR email listed in `ADMIN_EMAILS`.
pub fn is_admin(member: &TeamMember, policy: &AuthPolicy) -> bool {
    member.is_admin_role() || policy.is_admin_email(member.email.as_str())
}

/// Email listed in the super-admin list (see [`AuthPolicy::super_admin_list`]).
pub fn is_super_admin(email: &Email, policy: &AuthPolicy) -> bool {
    policy.is_super_admin_email(email.as_str())
}

/// Build the single-tenant context for a resolved member.
pub fn resolve_context(
    identity: &VerifiedIdentity,
    member: TeamMember,
    policy: &AuthPolicy,
) -> AuthorizationContext {
    let admin = is_admin(&member, policy);
    AuthorizationContext::new(AuthenticatedUser::from(identity), member, admin)
}

/// Build the multi-tenant context (no workspace selected yet).
pub fn resolve_workspace_context(
    identity: &VerifiedIdentity,
    member: TeamMember,
    workspaces: Vec<Workspace>,
    policy: &AuthPolicy,
) -> WorkspaceAuthorizationContext {
    let super_admin = is_super_admin(&identity.email, policy);
    WorkspaceAuthorizationContext::new(
        AuthenticatedUser::from(identity),
        member,
        super_admin,
        workspaces,
    )
}

/// Workspace access rule.
///
/// Granted iff the caller is a super admin, manages `workspace`, or `workspace`
/// is part of the caller's resolved workspace set.
pub fn check_workspace_access(
    email: &Email,
    is_super_admin: bool,
    workspace: &Workspace,
    resolved: &[Workspace],
) -> Result<(), AuthError> {
    if is_super_admin
        || workspace.is_managed_by(email)
        || resolved.iter().any(|w| w.id == workspace.id)
    {
        Ok(())
    } else {
        Err(ForbiddenKind::WorkspaceAccessDenied.into())
    }
}

/// Workspace manager rule.
///
/// `current` must already be resolved; its absence means the pipeline ran out
/// of order and is reported as an internal fault, not a caller error.
pub fn check_workspace_manager(
    email: &Email,
    is_super_admin: bool,
    current: Option<&Workspace>,
) -> Result<(), AuthError> {
    let workspace = current.ok_or_else(|| {
        AuthError::internal("workspace manager check requested without a current workspace")
    })?;

    if is_super_admin || workspace.is_managed_by(email) {
        Ok(())
    } else {
        Err(ForbiddenKind::WorkspaceManagerRequired.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gatehouse_core::{MemberId, MemberRole, WorkspaceId};
    use uuid::Uuid;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn workspace(n: u128, manager: &str) -> Workspace {
        Workspace::new(
            WorkspaceId::from_uuid(Uuid::from_u128(n)),
            email(manager),
            &["acme.io".to_string()],
            Utc::now(),
        )
    }

    fn member(addr: &str, role: MemberRole) -> TeamMember {
        TeamMember {
            role,
            ..TeamMember::first_seen(
                MemberId::from_uuid(Uuid::from_u128(1)),
                email(addr),
                "Someone",
                None,
                Utc::now(),
            )
        }
    }

    #[test]
    fn admin_by_role_or_list() {
        let policy = AuthPolicy::from_raw(None, Some("listed@x.com"), None, None);
        assert!(is_admin(&member("boss@x.com", MemberRole::Admin), &policy));
        assert!(is_admin(&member("LISTED@x.com", MemberRole::Member), &policy));
        assert!(!is_admin(&member("pleb@x.com", MemberRole::Member), &policy));
    }

    #[test]
    fn admin_role_does_not_imply_super_admin() {
        let policy = AuthPolicy::from_raw(None, None, Some("root@x.com"), None);
        let m = member("boss@x.com", MemberRole::Admin);
        assert!(is_admin(&m, &policy));
        assert!(!is_super_admin(&m.email, &policy));
    }

    #[test]
    fn super_admin_reaches_unrelated_workspace() {
        let ws = workspace(9, "owner@acme.io");
        assert!(check_workspace_access(&email("root@x.com"), true, &ws, &[]).is_ok());
    }

    #[test]
    fn manager_and_members_have_access() {
        let ws = workspace(9, "owner@acme.io");
        assert!(check_workspace_access(&email("OWNER@acme.io"), false, &ws, &[]).is_ok());
        assert!(
            check_workspace_access(&email("dev@acme.io"), false, &ws, &[ws.clone()]).is_ok()
        );
    }

    #[test]
    fn outsider_is_denied() {
        let ws = workspace(9, "owner@acme.io");
        let other = workspace(10, "dev@acme.io");
        let err = check_workspace_access(&email("dev@acme.io"), false, &ws, &[other]).unwrap_err();
        assert_eq!(err, AuthError::Forbidden(ForbiddenKind::WorkspaceAccessDenied));
    }

    #[test]
    fn manager_rule() {
        let ws = workspace(9, "owner@acme.io");
        assert!(check_workspace_manager(&email("owner@acme.io"), false, Some(&ws)).is_ok());
        assert!(check_workspace_manager(&email("root@x.com"), true, Some(&ws)).is_ok());

        let err = check_workspace_manager(&email("dev@acme.io"), false, Some(&ws)).unwrap_err();
        assert_eq!(err, AuthError::Forbidden(ForbiddenKind::WorkspaceManagerRequired));
    }

    #[test]
    fn manager_rule_without_workspace_is_internal() {
        let err = check_workspace_manager(&email("owner@acme.io"), true, None).unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
