//! Shop and user registry, backed by SQLite.

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the server indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
/// Returns an error if the operation takes longer than `QUERY_TIMEOUT`.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// Tax-compliance status of a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxStatus {
    Paid,
    Unpaid,
}

impl TaxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaxStatus::Paid => "paid",
            TaxStatus::Unpaid => "unpaid",
        }
    }
}

impl FromStr for TaxStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "paid" => Ok(TaxStatus::Paid),
            "unpaid" => Ok(TaxStatus::Unpaid),
            other => Err(anyhow::anyhow!("unknown tax status: {other}")),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct ShopRow {
    pub id: String,
    pub user_id: String,
    pub shop_name: String,
    pub owner_name: String,
    pub contact_number: String,
    /// Normalized display address committed from the address autocomplete.
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: Option<String>,
    /// 'paid' | 'unpaid'
    pub tax_status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    /// 'owner' | 'admin'
    pub role: String,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub created_at: String,
}

impl UserRow {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Fields supplied when registering a shop. The location is the committed
/// output of the address autocomplete, never re-geocoded here.
#[derive(Debug, Clone, Deserialize)]
pub struct NewShop {
    pub shop_name: String,
    pub owner_name: String,
    pub contact_number: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Tax-compliance numbers shown on the dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceStats {
    pub total: i64,
    pub paid: i64,
    pub unpaid: i64,
    /// Percentage of paid shops, rounded to the nearest integer. Zero when
    /// there are no shops.
    pub compliance_rate: i64,
}

// ─── Registry ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Registry {
    pool: SqlitePool,
}

impl Registry {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Open the registry with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("shopregd.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/registry/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Cheap liveness probe for the health endpoint.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    pub async fn create_user(&self, email: &str, role: &str) -> Result<UserRow> {
        let id = Uuid::new_v4().to_string();
        let api_token = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, email, role, api_token, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(role)
        .bind(&api_token)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_user(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user not found after insert"))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Resolve a bearer token to a user. `None` means the token is unknown.
    pub async fn user_by_token(&self, api_token: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE api_token = ?")
            .bind(api_token)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        with_timeout(async {
            Ok(sqlx::query_as("SELECT * FROM users ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?)
        })
        .await
    }

    // ─── Shops ──────────────────────────────────────────────────────────────

    pub async fn create_shop(&self, user_id: &str, shop: &NewShop) -> Result<ShopRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO shops (id, user_id, shop_name, owner_name, contact_number, address,
                                latitude, longitude, image_url, tax_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'unpaid', ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&shop.shop_name)
        .bind(&shop.owner_name)
        .bind(&shop.contact_number)
        .bind(&shop.address)
        .bind(shop.latitude)
        .bind(shop.longitude)
        .bind(&shop.image_url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_shop(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("shop not found after insert"))
    }

    pub async fn get_shop(&self, id: &str) -> Result<Option<ShopRow>> {
        Ok(sqlx::query_as("SELECT * FROM shops WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Shops registered by one owner (the owner dashboard view).
    pub async fn list_shops_for(&self, user_id: &str) -> Result<Vec<ShopRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM shops WHERE user_id = ? ORDER BY created_at DESC")
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    /// Every shop in the registry (the admin review view).
    pub async fn list_shops(&self) -> Result<Vec<ShopRow>> {
        with_timeout(async {
            Ok(sqlx::query_as("SELECT * FROM shops ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?)
        })
        .await
    }

    /// Set a shop's tax status. Returns `false` if the shop does not exist.
    pub async fn set_tax_status(&self, id: &str, status: TaxStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE shops SET tax_status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a shop. Returns `false` if the shop does not exist.
    pub async fn delete_shop(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shops WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compliance numbers, scoped to one owner or to the whole registry.
    pub async fn compliance_stats(&self, user_id: Option<&str>) -> Result<ComplianceStats> {
        let (total, paid): (i64, i64) = match user_id {
            Some(uid) => {
                sqlx::query_as(
                    "SELECT COUNT(*), COALESCE(SUM(tax_status = 'paid'), 0)
                     FROM shops WHERE user_id = ?",
                )
                .bind(uid)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT COUNT(*), COALESCE(SUM(tax_status = 'paid'), 0) FROM shops",
                )
                .fetch_one(&self.pool)
                .await?
            }
        };
        let unpaid = total - paid;
        let compliance_rate = if total > 0 {
            ((paid as f64 / total as f64) * 100.0).round() as i64
        } else {
            0
        };
        Ok(ComplianceStats {
            total,
            paid,
            unpaid,
            compliance_rate,
        })
    }
}
