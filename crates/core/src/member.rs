//! Team member: the single-tenant internal identity record.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Email, MemberId};

/// Legacy single-tenant privilege flag.
///
/// Independent of any workspace role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
        }
    }
}

impl core::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(MemberRole::Member),
            "admin" => Ok(MemberRole::Admin),
            other => Err(DomainError::validation(format!("unknown member role '{other}'"))),
        }
    }
}

/// Internal identity record keyed by canonical email.
///
/// # Invariants
/// - `email` is canonical and unique across all members.
/// - Records are never hard-deleted; `active = false` blocks all access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub email: Email,
    pub name: String,
    pub first_name: Option<String>,
    pub role: MemberRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamMember {
    /// A freshly seen identity: plain member, active.
    pub fn first_seen(
        id: MemberId,
        email: Email,
        name: impl Into<String>,
        first_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name: name.into(),
            first_name,
            role: MemberRole::Member,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin_role(&self) -> bool {
        self.role == MemberRole::Admin
    }

    /// Copy of this record with the provider's current display name applied.
    pub fn renamed(
        &self,
        name: impl Into<String>,
        first_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            first_name,
            updated_at: now,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn member() -> TeamMember {
        TeamMember::first_seen(
            MemberId::from_uuid(Uuid::from_u128(7)),
            Email::parse("carol@example.com").unwrap(),
            "Carol",
            Some("Carol".to_string()),
            Utc::now(),
        )
    }

    #[test]
    fn first_seen_defaults() {
        let m = member();
        assert_eq!(m.role, MemberRole::Member);
        assert!(m.active);
        assert_eq!(m.created_at, m.updated_at);
    }

    #[test]
    fn renamed_keeps_identity() {
        let m = member();
        let later = m.updated_at + chrono::Duration::minutes(5);
        let renamed = m.renamed("Carol Danvers", Some("Carol".to_string()), later);

        assert_eq!(renamed.id, m.id);
        assert_eq!(renamed.name, "Carol Danvers");
        assert_eq!(renamed.created_at, m.created_at);
        assert_eq!(renamed.updated_at, later);
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("ADMIN".parse::<MemberRole>().unwrap(), MemberRole::Admin);
        assert_eq!(MemberRole::Member.to_string(), "member");
        assert!("owner".parse::<MemberRole>().is_err());
    }
}
