// rest/auth.rs — Bearer-token authentication and role gating.
//
// Every authenticated route resolves `Authorization: Bearer <token>` to a
// user row. Admin-only routes additionally gate on the user's role.

use axum::{
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::{registry::UserRow, AppContext};

pub type AuthError = (StatusCode, Json<Value>);

pub fn unauthorized(reason: &str) -> AuthError {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": reason })),
    )
}

pub fn forbidden(reason: &str) -> AuthError {
    (StatusCode::FORBIDDEN, Json(json!({ "error": reason })))
}

pub fn not_found(reason: &str) -> AuthError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": reason })))
}

pub fn internal(error: anyhow::Error) -> AuthError {
    warn!(%error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": error.to_string() })),
    )
}

/// Resolve the request's bearer token to a registered user.
pub async fn authenticate(ctx: &AppContext, headers: &HeaderMap) -> Result<UserRow, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return Err(unauthorized("missing bearer token"));
    };

    match ctx.registry.user_by_token(token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(unauthorized("unknown token")),
        Err(e) => Err(internal(e)),
    }
}

/// Admin-only gate.
pub fn require_admin(user: &UserRow) -> Result<(), AuthError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(forbidden("admin role required"))
    }
}
