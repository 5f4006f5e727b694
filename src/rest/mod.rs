// rest/mod.rs — Public REST API server.
//
// Axum HTTP server bridging the shop registry and the geocode search proxy.
//
// Endpoints:
//   GET    /api/v1/health
//   GET    /api/v1/geocode?q=
//   GET    /api/v1/shops
//   POST   /api/v1/shops
//   GET    /api/v1/shops/{id}
//   PATCH  /api/v1/shops/{id}/tax
//   DELETE /api/v1/shops/{id}
//   GET    /api/v1/stats

pub mod auth;
pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, patch},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(routes::health::health))
        // Geocode search proxy
        .route("/api/v1/geocode", get(routes::geocode::search))
        // Shops
        .route(
            "/api/v1/shops",
            get(routes::shops::list_shops).post(routes::shops::create_shop),
        )
        .route(
            "/api/v1/shops/{id}",
            get(routes::shops::get_shop).delete(routes::shops::delete_shop),
        )
        .route("/api/v1/shops/{id}/tax", patch(routes::shops::set_tax_status))
        // Compliance stats
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
