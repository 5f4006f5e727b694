// rest/routes/health.rs — Liveness endpoint (no auth).

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{observability::HealthStatus, AppContext};

pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let db_ok = ctx.registry.ping().await;
    let status = HealthStatus::ok(ctx.started_at.elapsed().as_secs(), db_ok);
    Json(json!(status))
}
