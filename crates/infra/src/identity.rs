//! Find-or-create of team members keyed by canonical email.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use gatehouse_auth::{AuthError, VerifiedIdentity};
use gatehouse_core::{IdGenerator, TeamMember};

use crate::store::{MemberStore, StoreError};

pub struct IdentityResolver {
    members: Arc<dyn MemberStore>,
    ids: Arc<dyn IdGenerator>,
}

impl IdentityResolver {
    pub fn new(members: Arc<dyn MemberStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { members, ids }
    }

    /// Map a verified identity to its team member, creating it on first sight.
    ///
    /// - existing + renamed at the provider: one profile write, prior record
    ///   returned with the new name applied (no re-read)
    /// - existing + unchanged, or the token carries no name: no write
    /// - missing: insert a plain active member; a concurrent insert of the
    ///   same email surfaces as `Conflict` and is resolved by re-reading
    pub async fn find_or_create_team_member(
        &self,
        identity: &VerifiedIdentity,
        now: DateTime<Utc>,
    ) -> Result<TeamMember, AuthError> {
        // `Email` is canonical by construction; every lookup below uses it as-is.
        let email = &identity.email;

        if let Some(existing) = self.members.find_by_email(email).await.map_err(internal)? {
            let current = match identity.name.as_deref() {
                Some(name) if name != existing.name => name,
                _ => return Ok(existing),
            };

            let updated = existing.renamed(current, identity.given_name.clone(), now);
            self.members
                .update_profile(
                    updated.id,
                    &updated.name,
                    updated.first_name.as_deref(),
                    updated.updated_at,
                )
                .await
                .map_err(internal)?;
            debug!(member_id = %updated.id, "team member profile refreshed");
            return Ok(updated);
        }

        let member = TeamMember::first_seen(
            self.ids.next_member_id(),
            email.clone(),
            identity.display_name(),
            identity.given_name.clone(),
            now,
        );

        match self.members.insert(&member).await {
            Ok(()) => {
                info!(member_id = %member.id, email = %member.email, "team member created");
                Ok(member)
            }
            Err(StoreError::Conflict(reason)) => {
                warn!(email = %email, %reason, "concurrent team member insert, re-reading");
                self.members
                    .find_by_email(email)
                    .await
                    .map_err(internal)?
                    .ok_or_else(|| AuthError::internal("insert did not yield a readable row"))
            }
            Err(other) => Err(internal(other)),
        }
    }
}

pub(crate) fn internal(err: StoreError) -> AuthError {
    AuthError::internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use gatehouse_core::{Email, MemberId, SequentialIdGenerator};
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    use crate::store::InMemoryStore;

    fn identity(email: &str, name: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            email: Email::parse(email).unwrap(),
            name: Some(name.to_string()),
            given_name: name.split(' ').next().map(str::to_string),
            picture: None,
            audience: None,
            expires_at: None,
        }
    }

    fn resolver(store: Arc<dyn MemberStore>) -> IdentityResolver {
        IdentityResolver::new(store, Arc::new(SequentialIdGenerator::new()))
    }

    #[tokio::test]
    async fn first_sight_creates_active_member() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let member = resolver(store.clone())
            .find_or_create_team_member(&identity("New.User@Acme.io", "New User"), now)
            .await
            .unwrap();

        assert_eq!(member.email.as_str(), "new.user@acme.io");
        assert_eq!(member.id, MemberId::from_uuid(Uuid::from_u128(1)));
        assert!(member.active);
        assert!(!member.is_admin_role());
        assert_eq!(member.created_at, now);
        assert_eq!(member.updated_at, now);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn unchanged_member_is_not_written() {
        let store = Arc::new(InMemoryStore::new());
        let r = resolver(store.clone());
        let first = r
            .find_or_create_team_member(&identity("a@acme.io", "Ann"), Utc::now())
            .await
            .unwrap();
        let second = r
            .find_or_create_team_member(&identity("A@ACME.io", "Ann"), Utc::now())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn renamed_member_gets_exactly_one_update() {
        let store = Arc::new(InMemoryStore::new());
        let r = resolver(store.clone());
        let t0 = Utc::now();
        let created = r
            .find_or_create_team_member(&identity("a@acme.io", "Ann"), t0)
            .await
            .unwrap();

        let t1 = t0 + Duration::minutes(5);
        let renamed = r
            .find_or_create_team_member(&identity("a@acme.io", "Ann Smith"), t1)
            .await
            .unwrap();

        assert_eq!(renamed.id, created.id);
        assert_eq!(renamed.name, "Ann Smith");
        assert_eq!(renamed.first_name.as_deref(), Some("Ann"));
        assert_eq!(renamed.created_at, t0);
        assert_eq!(renamed.updated_at, t1);
        assert_eq!(store.writes(), 2);

        let stored = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored, renamed);
    }

    #[tokio::test]
    async fn nameless_token_keeps_the_stored_name() {
        let store = Arc::new(InMemoryStore::new());
        let r = resolver(store.clone());
        r.find_or_create_team_member(&identity("ann@gmail.com", "Ann Smith"), Utc::now())
            .await
            .unwrap();

        let nameless = VerifiedIdentity {
            name: None,
            given_name: None,
            ..identity("ann@gmail.com", "Ann Smith")
        };
        let member = r
            .find_or_create_team_member(&nameless, Utc::now())
            .await
            .unwrap();

        assert_eq!(member.name, "Ann Smith");
        assert_eq!(member.first_name.as_deref(), Some("Ann"));
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn nameless_first_sight_uses_the_email_as_name() {
        let store = Arc::new(InMemoryStore::new());
        let nameless = VerifiedIdentity {
            name: None,
            given_name: None,
            ..identity("bo@gmail.com", "unused")
        };
        let member = resolver(store)
            .find_or_create_team_member(&nameless, Utc::now())
            .await
            .unwrap();
        assert_eq!(member.name, "bo@gmail.com");
        assert_eq!(member.first_name, None);
    }

    /// Simulates losing the insert race: the first lookup misses, the insert
    /// collides with a row another request just wrote.
    struct LosesInsertRace {
        inner: InMemoryStore,
        winner: TeamMember,
        raced: AtomicBool,
    }

    #[async_trait]
    impl MemberStore for LosesInsertRace {
        async fn find_by_email(&self, email: &Email) -> Result<Option<TeamMember>, StoreError> {
            if !self.raced.load(Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_email(email).await
        }

        async fn find_by_id(&self, id: MemberId) -> Result<Option<TeamMember>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn insert(&self, member: &TeamMember) -> Result<(), StoreError> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                self.inner.insert(&self.winner).await?;
            }
            self.inner.insert(member).await
        }

        async fn update_profile(
            &self,
            id: MemberId,
            name: &str,
            first_name: Option<&str>,
            updated_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.inner.update_profile(id, name, first_name, updated_at).await
        }

        async fn set_active(
            &self,
            email: &Email,
            active: bool,
            updated_at: DateTime<Utc>,
        ) -> Result<Option<TeamMember>, StoreError> {
            self.inner.set_active(email, active, updated_at).await
        }
    }

    #[tokio::test]
    async fn insert_conflict_returns_the_stored_row() {
        let winner = TeamMember::first_seen(
            MemberId::from_uuid(Uuid::from_u128(99)),
            Email::parse("a@acme.io").unwrap(),
            "Ann",
            None,
            Utc::now(),
        );
        let store = Arc::new(LosesInsertRace {
            inner: InMemoryStore::new(),
            winner: winner.clone(),
            raced: AtomicBool::new(false),
        });

        let member = resolver(store)
            .find_or_create_team_member(&identity("a@acme.io", "Ann"), Utc::now())
            .await
            .unwrap();
        assert_eq!(member, winner);
    }

    #[tokio::test]
    async fn concurrent_first_logins_converge() {
        let store = Arc::new(InMemoryStore::new());
        let r = Arc::new(resolver(store.clone()));
        let now = Utc::now();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let r = r.clone();
                tokio::spawn(async move {
                    r.find_or_create_team_member(&identity("a@acme.io", "Ann"), now)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for t in tasks {
            ids.push(t.await.unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.writes(), 1);
    }
}
