use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use gatehouse_auth::AuthPolicy;
use gatehouse_infra::provider::google::{DEFAULT_TIMEOUT, GOOGLE_TOKENINFO_URL};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Centralized environment configuration.
/// All env vars and defaults are defined here; nothing reads the environment
/// after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `GOOGLE_CLIENT_ID`: expected token audience. Unset disables the check.
    pub google_client_id: Option<String>,

    /// `ADMIN_EMAILS`: comma-separated legacy admin list.
    pub admin_emails: Option<String>,

    /// `SUPER_ADMIN_EMAILS`: comma-separated super-admin list.
    /// Unset falls back to `ADMIN_EMAILS`; set-but-empty means no super admins.
    pub super_admin_emails: Option<String>,

    /// `ALLOWED_DOMAINS`: self-service provisioning allow-list.
    /// Default: gmail.com,googlemail.com
    pub allowed_domains: Option<String>,

    /// `IDENTITY_PROVIDER_URL`: token verification endpoint.
    /// Default: Google tokeninfo
    pub identity_provider_url: String,

    /// `IDENTITY_PROVIDER_TIMEOUT_MS`: provider request timeout.
    /// Default: 5000
    pub identity_provider_timeout: Duration,

    /// `DATABASE_URL`: Postgres URL. Unset selects the in-memory store.
    pub database_url: Option<String>,

    /// `BIND_ADDR`: listen address.
    /// Default: 0.0.0.0:8080
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let identity_provider_timeout = match lookup("IDENTITY_PROVIDER_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::Invalid {
                    var: "IDENTITY_PROVIDER_TIMEOUT_MS",
                    expected: "a positive number of milliseconds",
                    value: raw,
                })?,
            None => DEFAULT_TIMEOUT,
        };

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: "BIND_ADDR",
            expected: "a socket address",
            value: bind_raw.clone(),
        })?;

        Ok(Self {
            google_client_id: lookup("GOOGLE_CLIENT_ID"),
            admin_emails: lookup("ADMIN_EMAILS"),
            super_admin_emails: lookup("SUPER_ADMIN_EMAILS"),
            allowed_domains: lookup("ALLOWED_DOMAINS"),
            identity_provider_url: lookup("IDENTITY_PROVIDER_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| GOOGLE_TOKENINFO_URL.to_string()),
            identity_provider_timeout,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            bind_addr,
        })
    }

    /// The immutable policy threaded into the authenticator.
    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy::from_raw(
            self.google_client_id.as_deref(),
            self.admin_emails.as_deref(),
            self.super_admin_emails.as_deref(),
            self.allowed_domains.as_deref(),
        )
    }

    /// Config for tests. In-memory store, ephemeral port, no audience check.
    pub fn for_tests() -> Self {
        Self {
            google_client_id: None,
            admin_emails: None,
            super_admin_emails: None,
            allowed_domains: None,
            identity_provider_url: GOOGLE_TOKENINFO_URL.to_string(),
            identity_provider_timeout: Duration::from_millis(500),
            database_url: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.identity_provider_url, GOOGLE_TOKENINFO_URL);
        assert_eq!(c.identity_provider_timeout, Duration::from_millis(5000));
        assert_eq!(c.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(c.database_url.is_none());

        let policy = c.auth_policy();
        assert!(policy.expected_audience.is_none());
        assert!(policy.allowed_domains.allows("gmail.com"));
        assert!(policy.allowed_domains.allows("googlemail.com"));
    }

    #[test]
    fn policy_reflects_env_lists() {
        let c = config(&[
            ("GOOGLE_CLIENT_ID", "client-1"),
            ("ADMIN_EMAILS", " Alice@X.com , bob@x.com"),
            ("ALLOWED_DOMAINS", "acme.io"),
        ])
        .unwrap();
        let policy = c.auth_policy();

        assert_eq!(policy.expected_audience.as_deref(), Some("client-1"));
        assert!(policy.is_admin_email("alice@x.com"));
        assert!(policy.is_admin_email("BOB@X.COM"));
        // SUPER_ADMIN_EMAILS unset: falls back to ADMIN_EMAILS.
        assert!(policy.is_super_admin_email("bob@x.com"));
        assert!(!policy.allowed_domains.allows("gmail.com"));
    }

    #[test]
    fn empty_super_admin_list_disables_fallback() {
        let c = config(&[("ADMIN_EMAILS", "bob@x.com"), ("SUPER_ADMIN_EMAILS", "")]).unwrap();
        assert!(!c.auth_policy().is_super_admin_email("bob@x.com"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = config(&[("IDENTITY_PROVIDER_TIMEOUT_MS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "IDENTITY_PROVIDER_TIMEOUT_MS",
                ..
            }
        ));

        let err = config(&[("BIND_ADDR", "nowhere")]).unwrap_err();
        assert!(err.to_string().starts_with("BIND_ADDR must be a socket address"));
    }
}
