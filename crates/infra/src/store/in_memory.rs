use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatehouse_core::{
    Email, MemberId, TeamMember, Workspace, WorkspaceId, WorkspaceMember, WorkspaceRole,
};

use super::r#trait::{MemberStore, StoreError, WorkspaceStore};

#[derive(Debug, Default)]
struct State {
    members: HashMap<Email, TeamMember>,
    workspaces: HashMap<WorkspaceId, Workspace>,
    workspace_members: HashMap<(WorkspaceId, Email), WorkspaceMember>,
}

/// In-memory member + workspace store for tests/dev.
///
/// A single write lock covers each uniqueness check and the insert that
/// follows it, so duplicates surface as [`StoreError::Conflict`] exactly like
/// the Postgres unique indexes do.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    writes: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutating calls since construction.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MemberStore for InMemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<TeamMember>, StoreError> {
        Ok(self.read()?.members.get(email).cloned())
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<TeamMember>, StoreError> {
        Ok(self.read()?.members.values().find(|m| m.id == id).cloned())
    }

    async fn insert(&self, member: &TeamMember) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.members.contains_key(&member.email) {
            return Err(StoreError::Conflict(format!(
                "team member {} already exists",
                member.email
            )));
        }
        state.members.insert(member.email.clone(), member.clone());
        drop(state);
        self.record_write();
        Ok(())
    }

    async fn update_profile(
        &self,
        id: MemberId,
        name: &str,
        first_name: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let member = state
            .members
            .values_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("team member {id}")))?;
        member.name = name.to_string();
        member.first_name = first_name.map(str::to_string);
        member.updated_at = updated_at;
        drop(state);
        self.record_write();
        Ok(())
    }

    async fn set_active(
        &self,
        email: &Email,
        active: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<TeamMember>, StoreError> {
        let mut state = self.write()?;
        let Some(member) = state.members.get_mut(email) else {
            return Ok(None);
        };
        member.active = active;
        member.updated_at = updated_at;
        let updated = member.clone();
        drop(state);
        self.record_write();
        Ok(Some(updated))
    }
}

#[async_trait]
impl WorkspaceStore for InMemoryStore {
    async fn list_for_email(&self, email: &Email) -> Result<Vec<Workspace>, StoreError> {
        let state = self.read()?;
        let mut found: Vec<Workspace> = state
            .workspaces
            .values()
            .filter(|ws| {
                ws.is_managed_by(email)
                    || state
                        .workspace_members
                        .contains_key(&(ws.id, email.clone()))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(found)
    }

    async fn insert(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state
            .workspaces
            .values()
            .any(|ws| ws.id == workspace.id || ws.manager_email == workspace.manager_email)
        {
            return Err(StoreError::Conflict(format!(
                "workspace managed by {} already exists",
                workspace.manager_email
            )));
        }
        state.workspaces.insert(workspace.id, workspace.clone());
        drop(state);
        self.record_write();
        Ok(())
    }

    async fn find_by_id(&self, id: WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        Ok(self.read()?.workspaces.get(&id).cloned())
    }

    async fn find_member(
        &self,
        workspace_id: WorkspaceId,
        email: &Email,
    ) -> Result<Option<WorkspaceMember>, StoreError> {
        Ok(self
            .read()?
            .workspace_members
            .get(&(workspace_id, email.clone()))
            .cloned())
    }

    async fn add_member(
        &self,
        workspace_id: WorkspaceId,
        email: &Email,
        role: Option<WorkspaceRole>,
        now: DateTime<Utc>,
    ) -> Result<WorkspaceMember, StoreError> {
        let mut state = self.write()?;
        if !state.workspaces.contains_key(&workspace_id) {
            return Err(StoreError::NotFound(format!("workspace {workspace_id}")));
        }
        let member = state
            .workspace_members
            .entry((workspace_id, email.clone()))
            .and_modify(|m| m.role = role)
            .or_insert_with(|| WorkspaceMember {
                workspace_id,
                email: email.clone(),
                role,
                created_at: now,
            })
            .clone();
        drop(state);
        self.record_write();
        Ok(member)
    }
}
