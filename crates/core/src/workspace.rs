//! Workspaces (tenant boundary) and explicit workspace membership.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Email, WorkspaceId};

/// A tenant boundary with one manager fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub manager_email: Email,
    /// Email domains eligible for self-service membership (lower-cased).
    pub allowed_domains: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(
        id: WorkspaceId,
        manager_email: Email,
        allowed_domains: &[String],
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            manager_email,
            allowed_domains: allowed_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            created_at,
        }
    }

    pub fn is_managed_by(&self, email: &Email) -> bool {
        &self.manager_email == email
    }
}

/// Role of an explicit (non-manager) workspace member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Member,
    Editor,
    Viewer,
}

impl WorkspaceRole {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceRole::Member => "member",
            WorkspaceRole::Editor => "editor",
            WorkspaceRole::Viewer => "viewer",
        }
    }
}

impl FromStr for WorkspaceRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(WorkspaceRole::Member),
            "editor" => Ok(WorkspaceRole::Editor),
            "viewer" => Ok(WorkspaceRole::Viewer),
            other => Err(DomainError::validation(format!("unknown workspace role '{other}'"))),
        }
    }
}

/// Explicit membership of an email in a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub workspace_id: WorkspaceId,
    pub email: Email,
    pub role: Option<WorkspaceRole>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn allowed_domains_are_normalized() {
        let ws = Workspace::new(
            WorkspaceId::from_uuid(Uuid::from_u128(1)),
            Email::parse("boss@acme.io").unwrap(),
            &[" ACME.io ".to_string(), String::new()],
            Utc::now(),
        );
        assert_eq!(ws.allowed_domains, vec!["acme.io".to_string()]);
        assert!(ws.is_managed_by(&Email::parse("BOSS@acme.io").unwrap()));
    }

    #[test]
    fn workspace_role_parsing() {
        assert_eq!("Editor".parse::<WorkspaceRole>().unwrap(), WorkspaceRole::Editor);
        assert!("owner".parse::<WorkspaceRole>().is_err());
    }
}
