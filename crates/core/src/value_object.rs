//! Value objects: equality by value, not identity.
//!
//! The one value object that matters for identity resolution is [`Email`]: the
//! canonical, lower-cased email is the identity key for team members and the
//! ownership key for workspaces. Every lookup and write goes through it, so
//! case drift from the identity provider can never split one person into two
//! records.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Canonical email address (trimmed, lower-cased).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Canonicalize and validate an email address.
    ///
    /// Requires exactly one `@` with a non-empty local part and domain.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let canonical = raw.trim().to_lowercase();

        let mut parts = canonical.split('@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() || parts.next().is_some() {
            return Err(DomainError::validation(format!(
                "invalid email address '{}'",
                raw.trim()
            )));
        }

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Domain part (after the `@`), already lower-cased.
    pub fn domain(&self) -> &str {
        self.0
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }

    /// Case-insensitive comparison against an arbitrary (non-canonical) string.
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other.trim().to_lowercase()
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
