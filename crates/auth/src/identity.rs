use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use gatehouse_core::Email;

use crate::{AuthError, UnauthorizedKind};

/// Identity provider verification response (transport-agnostic).
///
/// This is the subset of the provider's signed-identity payload the pipeline
/// consumes. Decoding is lenient about the provider's habit of sending
/// booleans and timestamps as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenPayload {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub email_verified: bool,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub picture: Option<String>,

    /// Audience the token was issued for (the OAuth client id).
    #[serde(default)]
    pub aud: Option<String>,

    /// Expiry as unix seconds.
    #[serde(default, deserialize_with = "lenient_unix_seconds")]
    pub exp: Option<i64>,
}

/// Identity that passed every payload check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedIdentity {
    pub email: Email,
    /// Display name as the provider sent it. `None` when the token carries none.
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub picture: Option<String>,
    pub audience: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl VerifiedIdentity {
    /// Name to show for this identity: provider name, else given name, else email.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.given_name.clone())
            .unwrap_or_else(|| self.email.to_string())
    }
}

/// Deterministically validate a provider payload.
///
/// Checks run in a fixed order: audience, email presence, email verification,
/// expiry. The first failing check decides the error kind. Signature
/// verification is the provider's job and happens before this.
pub fn validate_payload(
    payload: &TokenPayload,
    expected_audience: Option<&str>,
    now: DateTime<Utc>,
) -> Result<VerifiedIdentity, AuthError> {
    if let Some(expected) = expected_audience {
        if payload.aud.as_deref() != Some(expected) {
            return Err(UnauthorizedKind::InvalidAudience.into());
        }
    }

    let raw_email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(UnauthorizedKind::MissingEmail)?;

    if !payload.email_verified {
        return Err(UnauthorizedKind::EmailNotVerified.into());
    }

    let expires_at = match payload.exp {
        Some(exp) => {
            let at = DateTime::<Utc>::from_timestamp(exp, 0)
                .ok_or(UnauthorizedKind::TokenVerificationFailed)?;
            if at < now {
                return Err(UnauthorizedKind::TokenExpired.into());
            }
            Some(at)
        }
        None => None,
    };

    let email =
        Email::parse(raw_email).map_err(|_| UnauthorizedKind::TokenVerificationFailed)?;

    Ok(VerifiedIdentity {
        email,
        name: non_blank(payload.name.as_deref()),
        given_name: non_blank(payload.given_name.as_deref()),
        picture: non_blank(payload.picture.as_deref()),
        audience: payload.aud.clone(),
        expires_at,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flexible<T> {
    Native(T),
    Text(String),
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Flexible<bool>>::deserialize(deserializer)? {
        Some(Flexible::Native(b)) => b,
        Some(Flexible::Text(s)) => s.trim().eq_ignore_ascii_case("true"),
        None => false,
    })
}

fn lenient_unix_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Flexible<i64>>::deserialize(deserializer)? {
        Some(Flexible::Native(n)) => Ok(Some(n)),
        Some(Flexible::Text(s)) => s.trim().parse::<i64>().map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payload() -> TokenPayload {
        TokenPayload {
            email: Some("New.User@AllowedDomain.com".to_string()),
            email_verified: true,
            name: Some("New User".to_string()),
            given_name: Some("New".to_string()),
            picture: None,
            aud: Some("client-123".to_string()),
            exp: None,
        }
    }

    fn unauthorized(kind: UnauthorizedKind) -> AuthError {
        AuthError::Unauthorized(kind)
    }

    #[test]
    fn valid_payload_yields_canonical_identity() {
        let id = validate_payload(&payload(), Some("client-123"), Utc::now()).unwrap();
        assert_eq!(id.email.as_str(), "new.user@alloweddomain.com");
        assert_eq!(id.name.as_deref(), Some("New User"));
        assert_eq!(id.given_name.as_deref(), Some("New"));
    }

    #[test]
    fn audience_mismatch_is_rejected() {
        let err = validate_payload(&payload(), Some("other-client"), Utc::now()).unwrap_err();
        assert_eq!(err, unauthorized(UnauthorizedKind::InvalidAudience));
    }

    #[test]
    fn audience_is_ignored_when_not_configured() {
        let mut p = payload();
        p.aud = None;
        assert!(validate_payload(&p, None, Utc::now()).is_ok());
    }

    #[test]
    fn missing_email_is_rejected() {
        let mut p = payload();
        p.email = Some("  ".to_string());
        let err = validate_payload(&p, None, Utc::now()).unwrap_err();
        assert_eq!(err, unauthorized(UnauthorizedKind::MissingEmail));
    }

    #[test]
    fn unverified_email_is_rejected() {
        let mut p = payload();
        p.email_verified = false;
        let err = validate_payload(&p, None, Utc::now()).unwrap_err();
        assert_eq!(err, unauthorized(UnauthorizedKind::EmailNotVerified));
    }

    #[test]
    fn expired_by_one_second_is_rejected() {
        let now = Utc::now();
        let mut p = payload();
        p.exp = Some((now - Duration::seconds(1)).timestamp());
        let err = validate_payload(&p, None, now).unwrap_err();
        assert_eq!(err, unauthorized(UnauthorizedKind::TokenExpired));
    }

    #[test]
    fn audience_check_precedes_email_checks() {
        let p = TokenPayload {
            aud: Some("wrong".to_string()),
            ..TokenPayload::default()
        };
        let err = validate_payload(&p, Some("client-123"), Utc::now()).unwrap_err();
        assert_eq!(err, unauthorized(UnauthorizedKind::InvalidAudience));
    }

    #[test]
    fn malformed_email_is_a_verification_failure() {
        let mut p = payload();
        p.email = Some("not-an-email".to_string());
        let err = validate_payload(&p, None, Utc::now()).unwrap_err();
        assert_eq!(err, unauthorized(UnauthorizedKind::TokenVerificationFailed));
    }

    #[test]
    fn display_name_falls_back_to_given_name_then_email() {
        let mut p = payload();
        p.name = Some("   ".to_string());
        let id = validate_payload(&p, None, Utc::now()).unwrap();
        assert_eq!(id.name, None);
        assert_eq!(id.display_name(), "New");

        p.given_name = None;
        let id = validate_payload(&p, None, Utc::now()).unwrap();
        assert_eq!(id.display_name(), "new.user@alloweddomain.com");
    }

    #[test]
    fn decodes_string_typed_provider_fields() {
        let json = serde_json::json!({
            "email": "a@b.com",
            "email_verified": "true",
            "name": "A",
            "aud": "client-123",
            "exp": "1700000000"
        });
        let p: TokenPayload = serde_json::from_value(json).unwrap();
        assert!(p.email_verified);
        assert_eq!(p.exp, Some(1_700_000_000));
    }

    #[test]
    fn decodes_native_provider_fields_and_absent_optionals() {
        let json = serde_json::json!({
            "email": "a@b.com",
            "email_verified": false,
            "exp": 1700000000
        });
        let p: TokenPayload = serde_json::from_value(json).unwrap();
        assert!(!p.email_verified);
        assert_eq!(p.exp, Some(1_700_000_000));
        assert_eq!(p.picture, None);
    }
}
