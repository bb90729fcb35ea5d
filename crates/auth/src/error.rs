//! Authentication/authorization error taxonomy.
//!
//! Every failure of the resolution pipeline is one of three categories:
//! identity not established (`Unauthorized`), identity established but
//! privilege insufficient (`Forbidden`), or the pipeline/store itself is
//! inconsistent (`Internal`). Each carries a stable machine-readable code.

use serde::Serialize;
use thiserror::Error;

/// Coarse category, mapped 1:1 to a transport status by the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Unauthorized => "UNAUTHORIZED",
            ErrorCategory::Forbidden => "FORBIDDEN",
            ErrorCategory::Internal => "INTERNAL",
        }
    }
}

/// Why an identity could not be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnauthorizedKind {
    MissingAuthHeader,
    InvalidAuthFormat,
    MissingToken,
    InvalidToken,
    InvalidAudience,
    MissingEmail,
    EmailNotVerified,
    TokenExpired,
    TokenVerificationFailed,
}

impl UnauthorizedKind {
    pub fn code(self) -> &'static str {
        match self {
            UnauthorizedKind::MissingAuthHeader => "MISSING_AUTH_HEADER",
            UnauthorizedKind::InvalidAuthFormat => "INVALID_AUTH_FORMAT",
            UnauthorizedKind::MissingToken => "MISSING_TOKEN",
            UnauthorizedKind::InvalidToken => "INVALID_TOKEN",
            UnauthorizedKind::InvalidAudience => "INVALID_AUDIENCE",
            UnauthorizedKind::MissingEmail => "MISSING_EMAIL",
            UnauthorizedKind::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            UnauthorizedKind::TokenExpired => "TOKEN_EXPIRED",
            UnauthorizedKind::TokenVerificationFailed => "TOKEN_VERIFICATION_FAILED",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            UnauthorizedKind::MissingAuthHeader => "missing Authorization header",
            UnauthorizedKind::InvalidAuthFormat => {
                "Authorization header must use the Bearer scheme"
            }
            UnauthorizedKind::MissingToken => "missing bearer token",
            UnauthorizedKind::InvalidToken => "invalid token",
            UnauthorizedKind::InvalidAudience => "token audience does not match",
            UnauthorizedKind::MissingEmail => "token does not carry an email",
            UnauthorizedKind::EmailNotVerified => "email address is not verified",
            UnauthorizedKind::TokenExpired => "token has expired",
            UnauthorizedKind::TokenVerificationFailed => "token verification failed",
        }
    }
}

/// Why an established identity was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForbiddenKind {
    AccountDeactivated,
    AdminRequired,
    SuperAdminRequired,
    WorkspaceManagerRequired,
    WorkspaceAccessDenied,
}

impl ForbiddenKind {
    pub fn code(self) -> &'static str {
        match self {
            ForbiddenKind::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            ForbiddenKind::AdminRequired => "ADMIN_REQUIRED",
            ForbiddenKind::SuperAdminRequired => "SUPER_ADMIN_REQUIRED",
            ForbiddenKind::WorkspaceManagerRequired => "WORKSPACE_MANAGER_REQUIRED",
            ForbiddenKind::WorkspaceAccessDenied => "WORKSPACE_ACCESS_DENIED",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ForbiddenKind::AccountDeactivated => "account has been deactivated",
            ForbiddenKind::AdminRequired => "admin privileges required",
            ForbiddenKind::SuperAdminRequired => "super admin privileges required",
            ForbiddenKind::WorkspaceManagerRequired => "workspace manager privileges required",
            ForbiddenKind::WorkspaceAccessDenied => "access to this workspace is denied",
        }
    }
}

/// Error produced by any stage of identity resolution or access control.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthorized: {}", .0.message())]
    Unauthorized(UnauthorizedKind),

    #[error("forbidden: {}", .0.message())]
    Forbidden(ForbiddenKind),

    /// Pipeline invoked out of order, or a store invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::Unauthorized(_) => ErrorCategory::Unauthorized,
            AuthError::Forbidden(_) => ErrorCategory::Forbidden,
            AuthError::Internal(_) => ErrorCategory::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthorized(kind) => kind.code(),
            AuthError::Forbidden(kind) => kind.code(),
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to hand to a caller (internal details are withheld).
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::Unauthorized(kind) => kind.message(),
            AuthError::Forbidden(kind) => kind.message(),
            AuthError::Internal(_) => "internal server error",
        }
    }
}

impl From<UnauthorizedKind> for AuthError {
    fn from(kind: UnauthorizedKind) -> Self {
        Self::Unauthorized(kind)
    }
}

impl From<ForbiddenKind> for AuthError {
    fn from(kind: ForbiddenKind) -> Self {
        Self::Forbidden(kind)
    }
}
