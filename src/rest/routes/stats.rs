// rest/routes/stats.rs — Tax-compliance dashboard numbers.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    rest::auth::{authenticate, internal, AuthError},
    AppContext,
};

/// Compliance stats scoped to the caller: owners see their own shops,
/// admins see the whole registry.
pub async fn get_stats(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AuthError> {
    let user = authenticate(&ctx, &headers).await?;
    let scope = if user.is_admin() {
        None
    } else {
        Some(user.id.as_str())
    };
    let stats = ctx
        .registry
        .compliance_stats(scope)
        .await
        .map_err(internal)?;
    Ok(Json(json!(stats)))
}
