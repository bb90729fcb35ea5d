//! `gatehouse-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it validates
//! identity provider payloads, computes privilege flags from configuration,
//! and evaluates access guards. IO lives in `gatehouse-infra`.

pub mod authorize;
pub mod context;
pub mod error;
pub mod gate;
pub mod identity;
pub mod policy;

pub use authorize::{check_workspace_access, check_workspace_manager, is_admin, is_super_admin};
pub use context::{
    AccessTier, AuthenticatedUser, AuthorizationContext, WorkspaceAuthorizationContext,
};
pub use error::{AuthError, ErrorCategory, ForbiddenKind, UnauthorizedKind};
pub use identity::{validate_payload, TokenPayload, VerifiedIdentity};
pub use policy::{AuthPolicy, DomainAllowList, EmailList, DEFAULT_ALLOWED_DOMAINS};
