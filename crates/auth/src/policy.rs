//! Configuration-driven authorization policy.
//!
//! Admin lists and the provisioning domain allow-list arrive as raw
//! comma-separated configuration strings. They are parsed once at startup
//! into immutable values and threaded into the resolver; nothing here reads
//! the process environment.

use serde::Serialize;

/// Domains eligible for self-service workspace creation when none are configured.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];

/// Case-insensitive list of email addresses (e.g. `ADMIN_EMAILS`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmailList(Vec<String>);

impl EmailList {
    /// Parse a comma-separated list; entries are trimmed and lower-cased, blanks dropped.
    pub fn parse(raw: &str) -> Self {
        Self(split_list(raw))
    }

    pub fn contains(&self, email: &str) -> bool {
        let needle = email.trim().to_lowercase();
        !needle.is_empty() && self.0.iter().any(|e| *e == needle)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Email domains eligible for automatic workspace creation (`ALLOWED_DOMAINS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DomainAllowList(Vec<String>);

impl DomainAllowList {
    /// Parse a comma-separated list of domains (a leading `@` is tolerated).
    pub fn parse(raw: &str) -> Self {
        Self(
            split_list(raw)
                .into_iter()
                .map(|d| d.trim_start_matches('@').to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        )
    }

    /// Parse `raw` when configured, otherwise fall back to [`DEFAULT_ALLOWED_DOMAINS`].
    pub fn from_config(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => Self::parse(raw),
            None => Self::default(),
        }
    }

    pub fn allows(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        self.0.iter().any(|d| *d == domain)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for DomainAllowList {
    fn default() -> Self {
        Self(DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect())
    }
}

/// Immutable authorization policy for one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthPolicy {
    /// Expected token audience (`GOOGLE_CLIENT_ID`); `None` disables the check.
    pub expected_audience: Option<String>,
    /// Legacy single-tenant admin list (`ADMIN_EMAILS`).
    pub admin_emails: EmailList,
    /// Preferred super-admin list (`SUPER_ADMIN_EMAILS`); `None` when unset.
    pub super_admin_emails: Option<EmailList>,
    pub allowed_domains: DomainAllowList,
}

impl AuthPolicy {
    /// Build a policy from raw configuration values as they appear in the environment.
    pub fn from_raw(
        expected_audience: Option<&str>,
        admin_emails: Option<&str>,
        super_admin_emails: Option<&str>,
        allowed_domains: Option<&str>,
    ) -> Self {
        Self {
            expected_audience: expected_audience
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            admin_emails: admin_emails.map(EmailList::parse).unwrap_or_default(),
            super_admin_emails: super_admin_emails.map(EmailList::parse),
            allowed_domains: DomainAllowList::from_config(allowed_domains),
        }
    }

    /// `ADMIN_EMAILS` membership.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.contains(email)
    }

    /// List consulted for super-admin status: `SUPER_ADMIN_EMAILS`, else `ADMIN_EMAILS`.
    pub fn super_admin_list(&self) -> &EmailList {
        self.super_admin_emails.as_ref().unwrap_or(&self.admin_emails)
    }

    pub fn is_super_admin_email(&self, email: &str) -> bool {
        self.super_admin_list().contains(email)
    }

    /// `SUPER_ADMIN_EMAILS` is set but lists nobody, so no one is a super admin.
    pub fn super_admins_disabled(&self) -> bool {
        self.super_admin_emails
            .as_ref()
            .is_some_and(EmailList::is_empty)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}
