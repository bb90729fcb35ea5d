//! Service wiring: stores, identity provider client and the authenticator.

use std::sync::Arc;

use thiserror::Error;

use gatehouse_auth::AuthPolicy;
use gatehouse_core::{IdGenerator, UuidV7Generator};
use gatehouse_infra::{
    Authenticator, GoogleTokenVerifier, InMemoryStore, MemberStore, PgStore, ProviderError,
    StoreError, TokenVerifier, WorkspaceStore,
};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("identity provider client: {0}")]
    Provider(#[from] ProviderError),

    #[error("data store: {0}")]
    Store(#[from] StoreError),
}

/// Shared collaborators for request handlers.
#[derive(Clone)]
pub struct AppServices {
    pub authenticator: Authenticator,
    pub members: Arc<dyn MemberStore>,
    pub workspaces: Arc<dyn WorkspaceStore>,
}

impl AppServices {
    /// Wire services around one store that backs both members and workspaces.
    pub fn new<S>(
        store: Arc<S>,
        verifier: Arc<dyn TokenVerifier>,
        ids: Arc<dyn IdGenerator>,
        policy: AuthPolicy,
    ) -> Self
    where
        S: MemberStore + WorkspaceStore + 'static,
    {
        let members: Arc<dyn MemberStore> = store.clone();
        let workspaces: Arc<dyn WorkspaceStore> = store;
        Self {
            authenticator: Authenticator::new(
                verifier,
                members.clone(),
                workspaces.clone(),
                ids,
                policy,
            ),
            members,
            workspaces,
        }
    }

    /// In-memory services (tests/dev).
    pub fn in_memory(verifier: Arc<dyn TokenVerifier>, policy: AuthPolicy) -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            verifier,
            Arc::new(UuidV7Generator),
            policy,
        )
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// the in-memory store otherwise.
pub async fn build_services(config: &Config) -> Result<AppServices, ServiceError> {
    let google = GoogleTokenVerifier::new(
        config.identity_provider_url.clone(),
        config.identity_provider_timeout,
    )?;
    tracing::info!(
        endpoint = google.endpoint(),
        timeout_ms = config.identity_provider_timeout.as_millis() as u64,
        "identity provider configured"
    );
    let verifier: Arc<dyn TokenVerifier> = Arc::new(google);
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidV7Generator);
    let policy = config.auth_policy();

    let services = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            tracing::info!("using postgres store");
            AppServices::new(Arc::new(store), verifier, ids, policy)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            AppServices::new(Arc::new(InMemoryStore::new()), verifier, ids, policy)
        }
    };

    warn_on_policy(services.authenticator.policy());
    Ok(services)
}

/// Startup warnings for policy values that are legal but easy to set by mistake.
pub fn warn_on_policy(policy: &AuthPolicy) -> bool {
    let mut warned = false;
    if policy.super_admins_disabled() {
        tracing::warn!("SUPER_ADMIN_EMAILS is set but empty; no one has super admin access");
        warned = true;
    }
    warned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_super_admin_list_is_flagged() {
        let blank = AuthPolicy::from_raw(None, Some("root@x.com"), Some(""), None);
        assert!(warn_on_policy(&blank));

        let unset = AuthPolicy::from_raw(None, Some("root@x.com"), None, None);
        assert!(!warn_on_policy(&unset));
    }

    #[tokio::test]
    async fn in_memory_services_expose_the_configured_policy() {
        let config = Config::for_tests();
        let services = build_services(&config).await.unwrap();
        assert_eq!(services.authenticator.policy(), &config.auth_policy());
    }
}
