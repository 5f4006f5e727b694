//! One-shot CLI commands (`search`, `users add`, `shops list`).
//!
//! These operate directly on the local registry and the geocoding client —
//! no running server required.

pub mod picker;

use anyhow::{Context as _, Result};

use crate::config::AppConfig;
use crate::geocode::GeocodeClient;
use crate::registry::Registry;

/// `shopregd search <query>` — one-shot geocode, printed as JSON.
pub async fn run_search(config: &AppConfig, query: &str, limit: Option<u32>) -> Result<()> {
    let client = GeocodeClient::new(&config.geocoder).context("failed to build geocode client")?;
    let limit = limit.unwrap_or(config.geocoder.result_limit);
    let candidates = client
        .search_with_limit(query, limit)
        .await
        .context("geocode search failed")?;
    println!("{}", serde_json::to_string_pretty(&candidates)?);
    Ok(())
}

/// `shopregd users add <email>` — mint a user and print their API token.
pub async fn run_users_add(config: &AppConfig, email: &str, admin: bool) -> Result<()> {
    let registry = Registry::new(&config.data_dir).await?;
    let role = if admin { "admin" } else { "owner" };
    let user = registry.create_user(email, role).await?;
    println!("created {} user {}", user.role, user.email);
    println!("api token: {}", user.api_token);
    Ok(())
}

/// `shopregd shops list` — operator view of the registry.
pub async fn run_shops_list(config: &AppConfig) -> Result<()> {
    let registry = Registry::new(&config.data_dir).await?;
    let shops = registry.list_shops().await?;
    if shops.is_empty() {
        println!("no shops registered");
        return Ok(());
    }
    for shop in &shops {
        println!(
            "{}  {:30}  {:8}  {:.4},{:.4}  {}",
            shop.id, shop.shop_name, shop.tax_status, shop.latitude, shop.longitude, shop.address
        );
    }
    let stats = registry.compliance_stats(None).await?;
    println!(
        "{} shops — {} paid, {} unpaid ({}% compliant)",
        stats.total, stats.paid, stats.unpaid, stats.compliance_rate
    );
    Ok(())
}
