use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use gatehouse_auth::{gate, AuthError, AuthorizationContext, UnauthorizedKind};
use gatehouse_infra::Authenticator;

use crate::app::errors::ApiError;
use crate::context::BearerToken;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Authenticator,
}

/// Require a well-formed bearer token and stash it for handlers that run the
/// multi-tenant pipeline themselves (they need the path's workspace id).
pub async fn bearer_middleware(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?.to_string();
    req.extensions_mut().insert(BearerToken::new(token));
    Ok(next.run(req).await)
}

/// Run the single-tenant pipeline and insert the resulting [`AuthorizationContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?.to_owned();
    let ctx = state.authenticator.authenticate(&token, Utc::now()).await?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Layered after [`auth_middleware`]: reject non-admins.
pub async fn admin_middleware(req: Request, next: Next) -> Result<Response, ApiError> {
    let ctx = req
        .extensions()
        .get::<AuthorizationContext>()
        .ok_or_else(|| AuthError::internal("admin guard ran before authentication"))?;
    gate::require_admin(ctx)?;
    Ok(next.run(req).await)
}

/// Structured access log line per request.
pub async fn request_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Parse `Authorization: Bearer <token>`. No network calls happen before this passes.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(UnauthorizedKind::MissingAuthHeader)?;

    let header = header
        .to_str()
        .map_err(|_| UnauthorizedKind::InvalidAuthFormat)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(UnauthorizedKind::InvalidAuthFormat)?
        .trim();

    if token.is_empty() {
        return Err(UnauthorizedKind::MissingToken.into());
    }

    Ok(token)
}
