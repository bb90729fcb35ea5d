use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use gatehouse_auth::{validate_payload, AuthError, TokenPayload, VerifiedIdentity};

use super::{ProviderError, TokenVerifier};

pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Verifies ID tokens against Google's `tokeninfo` endpoint.
///
/// The endpoint checks the signature; this type checks the payload it returns.
#[derive(Debug, Clone)]
pub struct GoogleTokenVerifier {
    client: Client,
    endpoint: String,
}

impl GoogleTokenVerifier {
    /// Build a verifier with its own client bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_payload(&self, token: &str) -> Result<TokenPayload, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected(status.as_u16()));
        }

        response
            .json::<TokenPayload>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(
        &self,
        token: &str,
        expected_audience: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<VerifiedIdentity, AuthError> {
        let payload = self.fetch_payload(token).await.map_err(|err| {
            match &err {
                ProviderError::Rejected(status) if *status >= 500 => {
                    warn!(status, "identity provider unavailable")
                }
                ProviderError::Rejected(status) => {
                    debug!(status, "identity provider rejected token")
                }
                other => warn!(error = %other, "identity provider call failed"),
            }
            AuthError::from(err)
        })?;

        validate_payload(&payload, expected_audience, now)
    }
}
