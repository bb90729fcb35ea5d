use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use gatehouse_auth::{AuthError, DomainAllowList};
use gatehouse_core::{Email, IdGenerator, Workspace};

use crate::identity::internal;
use crate::store::{StoreError, WorkspaceStore};

/// Self-service workspace provisioning for allow-listed email domains.
pub struct WorkspaceProvisioner {
    workspaces: Arc<dyn WorkspaceStore>,
    ids: Arc<dyn IdGenerator>,
}

impl WorkspaceProvisioner {
    pub fn new(workspaces: Arc<dyn WorkspaceStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { workspaces, ids }
    }

    /// Workspaces reachable by `email`, creating one on first sight when the
    /// email's domain is allow-listed.
    ///
    /// The caller becomes manager of the created workspace, which inherits the
    /// allow-list. A non-empty set, or a domain outside the allow-list, is
    /// returned unchanged (possibly empty). `name` only feeds the log line.
    pub async fn ensure_workspace(
        &self,
        email: &Email,
        name: &str,
        allowed_domains: &DomainAllowList,
        now: DateTime<Utc>,
    ) -> Result<Vec<Workspace>, AuthError> {
        let existing = self.workspaces.list_for_email(email).await.map_err(internal)?;
        if !existing.is_empty() || !allowed_domains.allows(email.domain()) {
            return Ok(existing);
        }

        let workspace = Workspace::new(
            self.ids.next_workspace_id(),
            email.clone(),
            allowed_domains.as_slice(),
            now,
        );

        match self.workspaces.insert(&workspace).await {
            Ok(()) => {
                info!(
                    workspace_id = %workspace.id,
                    manager = %email,
                    display_name = name,
                    "workspace provisioned"
                );
                Ok(vec![workspace])
            }
            Err(StoreError::Conflict(reason)) => {
                warn!(manager = %email, %reason, "concurrent workspace provisioning, re-listing");
                let relisted = self.workspaces.list_for_email(email).await.map_err(internal)?;
                if relisted.is_empty() {
                    return Err(AuthError::internal(
                        "workspace insert conflicted but no workspace is readable",
                    ));
                }
                Ok(relisted)
            }
            Err(other) => Err(internal(other)),
        }
    }
}
