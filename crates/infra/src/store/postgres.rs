//! Postgres-backed member + workspace store.
//!
//! Uniqueness lives in the schema: `team_members(email)` and
//! `workspaces(manager_email)` carry unique indexes, and a violation
//! (`23505`) is reported as [`StoreError::Conflict`]. Emails are stored in
//! canonical (lower-cased) form, so plain equality is case-insensitive.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / RowNotFound / Other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use gatehouse_core::{
    Email, MemberId, MemberRole, TeamMember, Workspace, WorkspaceId, WorkspaceMember,
    WorkspaceRole,
};

use super::r#trait::{MemberStore, StoreError, WorkspaceStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS team_members (
        id          UUID PRIMARY KEY,
        email       TEXT NOT NULL,
        name        TEXT NOT NULL,
        first_name  TEXT NULL,
        role        TEXT NOT NULL DEFAULT 'member',
        active      BOOLEAN NOT NULL DEFAULT TRUE,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS team_members_email_key ON team_members (email)",
    r#"
    CREATE TABLE IF NOT EXISTS workspaces (
        id               UUID PRIMARY KEY,
        manager_email    TEXT NOT NULL,
        allowed_domains  TEXT[] NOT NULL DEFAULT '{}',
        created_at       TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS workspaces_manager_email_key ON workspaces (manager_email)",
    r#"
    CREATE TABLE IF NOT EXISTS workspace_members (
        workspace_id  UUID NOT NULL REFERENCES workspaces (id),
        email         TEXT NOT NULL,
        role          TEXT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (workspace_id, email)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS workspace_members_email_idx ON workspace_members (email)",
];

/// Postgres-backed store for team members and workspaces.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and bootstrap the schema.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create tables and unique indexes if they are missing. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl MemberStore for PgStore {
    #[instrument(skip_all, fields(email = %email), err)]
    async fn find_by_email(&self, email: &Email) -> Result<Option<TeamMember>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, first_name, role, active, created_at, updated_at
            FROM team_members
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.as_ref().map(member_from_row).transpose()
    }

    #[instrument(skip_all, fields(member_id = %id), err)]
    async fn find_by_id(&self, id: MemberId) -> Result<Option<TeamMember>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, first_name, role, active, created_at, updated_at
            FROM team_members
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(member_from_row).transpose()
    }

    #[instrument(skip_all, fields(email = %member.email), err)]
    async fn insert(&self, member: &TeamMember) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO team_members (id, email, name, first_name, role, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(member.id.as_uuid())
        .bind(member.email.as_str())
        .bind(&member.name)
        .bind(member.first_name.as_deref())
        .bind(member.role.as_str())
        .bind(member.active)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_member", e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(member_id = %id), err)]
    async fn update_profile(
        &self,
        id: MemberId,
        name: &str,
        first_name: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE team_members
            SET name = $2, first_name = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(name)
        .bind(first_name)
        .bind(updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_profile", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("team member {id}")));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(email = %email), err)]
    async fn set_active(
        &self,
        email: &Email,
        active: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<TeamMember>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE team_members
            SET active = $2, updated_at = $3
            WHERE email = $1
            RETURNING id, email, name, first_name, role, active, created_at, updated_at
            "#,
        )
        .bind(email.as_str())
        .bind(active)
        .bind(updated_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_active", e))?;

        row.as_ref().map(member_from_row).transpose()
    }
}

#[async_trait]
impl WorkspaceStore for PgStore {
    #[instrument(skip_all, fields(email = %email), err)]
    async fn list_for_email(&self, email: &Email) -> Result<Vec<Workspace>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT w.id, w.manager_email, w.allowed_domains, w.created_at
            FROM workspaces w
            WHERE w.manager_email = $1
               OR EXISTS (
                   SELECT 1 FROM workspace_members m
                   WHERE m.workspace_id = w.id AND m.email = $1
               )
            ORDER BY w.created_at ASC, w.id ASC
            "#,
        )
        .bind(email.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_for_email", e))?;

        rows.iter().map(workspace_from_row).collect()
    }

    #[instrument(skip_all, fields(workspace_id = %workspace.id), err)]
    async fn insert(&self, workspace: &Workspace) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO workspaces (id, manager_email, allowed_domains, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(workspace.id.as_uuid())
        .bind(workspace.manager_email.as_str())
        .bind(&workspace.allowed_domains)
        .bind(workspace.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_workspace", e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(workspace_id = %id), err)]
    async fn find_by_id(&self, id: WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, manager_email, allowed_domains, created_at
            FROM workspaces
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_workspace", e))?;

        row.as_ref().map(workspace_from_row).transpose()
    }

    #[instrument(skip_all, fields(workspace_id = %workspace_id, email = %email), err)]
    async fn find_member(
        &self,
        workspace_id: WorkspaceId,
        email: &Email,
    ) -> Result<Option<WorkspaceMember>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT workspace_id, email, role, created_at
            FROM workspace_members
            WHERE workspace_id = $1 AND email = $2
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(email.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_member", e))?;

        row.as_ref().map(workspace_member_from_row).transpose()
    }

    #[instrument(skip_all, fields(workspace_id = %workspace_id, email = %email), err)]
    async fn add_member(
        &self,
        workspace_id: WorkspaceId,
        email: &Email,
        role: Option<WorkspaceRole>,
        now: DateTime<Utc>,
    ) -> Result<WorkspaceMember, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO workspace_members (workspace_id, email, role, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (workspace_id, email) DO UPDATE SET role = EXCLUDED.role
            RETURNING workspace_id, email, role, created_at
            "#,
        )
        .bind(workspace_id.as_uuid())
        .bind(email.as_str())
        .bind(role.map(WorkspaceRole::as_str))
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_member", e))?;

        workspace_member_from_row(&row)
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn decode<'r, T>(row: &'r PgRow) -> Result<T, StoreError>
where
    T: FromRow<'r, PgRow>,
{
    T::from_row(row).map_err(|e| StoreError::Backend(format!("failed to decode row: {}", e)))
}

fn member_from_row(row: &PgRow) -> Result<TeamMember, StoreError> {
    decode::<TeamMemberRow>(row)?.try_into()
}

fn workspace_from_row(row: &PgRow) -> Result<Workspace, StoreError> {
    decode::<WorkspaceRow>(row)?.try_into()
}

fn workspace_member_from_row(row: &PgRow) -> Result<WorkspaceMember, StoreError> {
    decode::<WorkspaceMemberRow>(row)?.try_into()
}

fn parse_email(raw: &str) -> Result<Email, StoreError> {
    Email::parse(raw).map_err(|e| StoreError::Backend(format!("stored email {raw:?}: {e}")))
}

// SQLx row types

#[derive(Debug)]
struct TeamMemberRow {
    id: uuid::Uuid,
    email: String,
    name: String,
    first_name: Option<String>,
    role: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TeamMemberRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TeamMemberRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            first_name: row.try_get("first_name")?,
            role: row.try_get("role")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<TeamMemberRow> for TeamMember {
    type Error = StoreError;

    fn try_from(row: TeamMemberRow) -> Result<Self, Self::Error> {
        let role: MemberRole = row
            .role
            .parse()
            .map_err(|e| StoreError::Backend(format!("stored member role: {e}")))?;
        Ok(TeamMember {
            id: MemberId::from_uuid(row.id),
            email: parse_email(&row.email)?,
            name: row.name,
            first_name: row.first_name,
            role,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct WorkspaceRow {
    id: uuid::Uuid,
    manager_email: String,
    allowed_domains: Vec<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for WorkspaceRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(WorkspaceRow {
            id: row.try_get("id")?,
            manager_email: row.try_get("manager_email")?,
            allowed_domains: row.try_get("allowed_domains")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<WorkspaceRow> for Workspace {
    type Error = StoreError;

    fn try_from(row: WorkspaceRow) -> Result<Self, Self::Error> {
        Ok(Workspace::new(
            WorkspaceId::from_uuid(row.id),
            parse_email(&row.manager_email)?,
            &row.allowed_domains,
            row.created_at,
        ))
    }
}

#[derive(Debug)]
struct WorkspaceMemberRow {
    workspace_id: uuid::Uuid,
    email: String,
    role: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for WorkspaceMemberRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(WorkspaceMemberRow {
            workspace_id: row.try_get("workspace_id")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<WorkspaceMemberRow> for WorkspaceMember {
    type Error = StoreError;

    fn try_from(row: WorkspaceMemberRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .as_deref()
            .map(str::parse::<WorkspaceRole>)
            .transpose()
            .map_err(|e| StoreError::Backend(format!("stored workspace role: {e}")))?;
        Ok(WorkspaceMember {
            workspace_id: WorkspaceId::from_uuid(row.workspace_id),
            email: parse_email(&row.email)?,
            role,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_is_a_backend_error() {
        let err = map_sqlx_error("find_by_email", sqlx::Error::PoolClosed);
        assert_eq!(
            err,
            StoreError::Backend("connection pool closed in find_by_email".to_string())
        );
    }

    #[test]
    fn member_row_with_unknown_role_is_rejected() {
        let row = TeamMemberRow {
            id: uuid::Uuid::from_u128(1),
            email: "a@acme.io".to_string(),
            name: "A".to_string(),
            first_name: None,
            role: "owner".to_string(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(TeamMember::try_from(row), Err(StoreError::Backend(_))));
    }

    #[test]
    fn workspace_row_normalizes_domains() {
        let row = WorkspaceRow {
            id: uuid::Uuid::from_u128(1),
            manager_email: "Owner@Acme.io".to_string(),
            allowed_domains: vec![" Acme.IO ".to_string()],
            created_at: Utc::now(),
        };
        let ws = Workspace::try_from(row).unwrap();
        assert_eq!(ws.manager_email.as_str(), "owner@acme.io");
        assert_eq!(ws.allowed_domains, vec!["acme.io".to_string()]);
    }

    #[test]
    fn member_row_without_role_decodes() {
        let row = WorkspaceMemberRow {
            workspace_id: uuid::Uuid::from_u128(1),
            email: "dev@acme.io".to_string(),
            role: None,
            created_at: Utc::now(),
        };
        let member = WorkspaceMember::try_from(row).unwrap();
        assert_eq!(member.role, None);
    }
}
