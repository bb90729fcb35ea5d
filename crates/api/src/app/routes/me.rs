use axum::{extract::Extension, Json};

use gatehouse_auth::AuthorizationContext;

/// The caller's resolved single-tenant context.
pub async fn me(Extension(ctx): Extension<AuthorizationContext>) -> Json<AuthorizationContext> {
    Json(ctx)
}
