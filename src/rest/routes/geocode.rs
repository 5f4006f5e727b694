// rest/routes/geocode.rs — Search proxy for the external geocoding endpoint.
//
// Mirrors the autocomplete component's behavior: queries below the minimum
// length never reach the upstream service, and upstream failures collapse to
// an empty candidate list rather than an error response.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::{observability::LatencyTracker, AppContext};

#[derive(Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

pub async fn search(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<GeocodeQuery>,
) -> Json<Value> {
    if params.q.trim().chars().count() < ctx.config.geocoder.min_query_len {
        // Length gate: no upstream access on this path.
        return Json(json!({ "candidates": [] }));
    }

    let limit = match &ctx.hot {
        Some(hot) => hot.read().await.geocoder_result_limit,
        None => ctx.config.geocoder.result_limit,
    };

    let tracker = LatencyTracker::start("geocode.search");
    let candidates = match ctx.geocoder.search_with_limit(&params.q, limit).await {
        Ok(candidates) => candidates,
        Err(error) => {
            warn!(%error, query = %params.q, "geocode search failed");
            Vec::new()
        }
    };
    tracker.finish();

    Json(json!({ "candidates": candidates }))
}
