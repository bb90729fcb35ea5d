//! Identity provider boundary.
//!
//! A [`TokenVerifier`] turns a raw bearer token into a [`VerifiedIdentity`].
//! Implementations only own the transport; the payload checks themselves are
//! the pure `gatehouse_auth::validate_payload`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use gatehouse_auth::{validate_payload, AuthError, TokenPayload, UnauthorizedKind, VerifiedIdentity};

pub mod google;

pub use google::GoogleTokenVerifier;

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` with the provider and validate the returned payload.
    ///
    /// One round trip, no retries. Every failure is already classified.
    async fn verify(
        &self,
        token: &str,
        expected_audience: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<VerifiedIdentity, AuthError>;
}

/// Transport-level provider failure, logged before it is folded into an [`AuthError`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider rejected token with status {0}")]
    Rejected(u16),

    #[error("provider response could not be decoded: {0}")]
    Decode(String),

    #[error("provider client misconfigured: {0}")]
    Config(String),
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            // Provider outages are indistinguishable from bad tokens to the caller.
            ProviderError::Transport(_) | ProviderError::Rejected(_) => {
                UnauthorizedKind::InvalidToken.into()
            }
            ProviderError::Decode(_) => UnauthorizedKind::TokenVerificationFailed.into(),
            ProviderError::Config(msg) => AuthError::internal(msg),
        }
    }
}

/// Verifier backed by a fixed token → payload table, for tests/dev.
///
/// Unknown tokens are rejected as `INVALID_TOKEN`, like a provider would.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, TokenPayload>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, payload: TokenPayload) -> Self {
        self.tokens.insert(token.into(), payload);
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(
        &self,
        token: &str,
        expected_audience: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<VerifiedIdentity, AuthError> {
        let payload = self
            .tokens
            .get(token)
            .ok_or(AuthError::Unauthorized(UnauthorizedKind::InvalidToken))?;
        validate_payload(payload, expected_audience, now)
    }
}
