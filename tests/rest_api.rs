//! REST API tests.
//!
//! Spins up the axum router on a random local port with a temporary database
//! and drives it with a real HTTP client. The geocoder points at an
//! unroutable local address, so every upstream search fails — which is
//! exactly what the failure-collapse tests need.

use std::sync::Arc;

use serde_json::{json, Value};
use shopregd::{
    config::AppConfig, geocode::GeocodeClient, registry::Registry, rest, AppContext,
};
use tempfile::TempDir;

struct TestServer {
    base: String,
    registry: Arc<Registry>,
    http: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::new(
            None,
            Some(dir.path().to_path_buf()),
            Some("error".to_string()),
            None,
        );
        // Unroutable upstream: every geocode search fails fast.
        config.geocoder.base_url = "http://127.0.0.1:1".to_string();
        config.geocoder.timeout_secs = 1;

        let registry = Arc::new(Registry::new(dir.path()).await.unwrap());
        let geocoder = Arc::new(GeocodeClient::new(&config.geocoder).unwrap());
        let ctx = Arc::new(AppContext {
            config: Arc::new(config),
            registry: Arc::clone(&registry),
            geocoder,
            started_at: std::time::Instant::now(),
            hot: None,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let router = rest::build_router(ctx);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base: format!("http://127.0.0.1:{port}/api/v1"),
            registry,
            http: reqwest::Client::new(),
            _dir: dir,
        }
    }

    async fn owner(&self, email: &str) -> String {
        self.registry
            .create_user(email, "owner")
            .await
            .unwrap()
            .api_token
    }

    async fn admin(&self) -> String {
        self.registry
            .create_user("admin@example.com", "admin")
            .await
            .unwrap()
            .api_token
    }
}

fn shop_body(name: &str) -> Value {
    json!({
        "shop_name": name,
        "owner_name": "Ayesha Khan",
        "contact_number": "0300-1234567",
        "address": "Tariq Road, Karachi, Pakistan",
        "latitude": 24.8607,
        "longitude": 67.0011
    })
}

#[tokio::test]
async fn health_requires_no_auth() {
    let server = TestServer::start().await;
    let resp = server
        .http
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db_ok"], true);
}

#[tokio::test]
async fn shops_require_a_known_bearer_token() {
    let server = TestServer::start().await;

    let resp = server
        .http
        .get(format!("{}/shops", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server
        .http
        .get(format!("{}/shops", server.base))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn owners_see_their_own_shops_admins_see_all() {
    let server = TestServer::start().await;
    let token_a = server.owner("a@example.com").await;
    let token_b = server.owner("b@example.com").await;
    let token_admin = server.admin().await;

    for (token, name) in [(&token_a, "A One"), (&token_a, "A Two"), (&token_b, "B One")] {
        let resp = server
            .http
            .post(format!("{}/shops", server.base))
            .bearer_auth(token)
            .json(&shop_body(name))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let list = |token: String| {
        let server = &server;
        async move {
            let body: Value = server
                .http
                .get(format!("{}/shops", server.base))
                .bearer_auth(token)
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            body["shops"].as_array().unwrap().len()
        }
    };

    assert_eq!(list(token_a.clone()).await, 2);
    assert_eq!(list(token_b.clone()).await, 1);
    assert_eq!(list(token_admin.clone()).await, 3);
}

#[tokio::test]
async fn only_admins_change_tax_status_or_delete() {
    let server = TestServer::start().await;
    let token_owner = server.owner("owner@example.com").await;
    let token_admin = server.admin().await;

    let created: Value = server
        .http
        .post(format!("{}/shops", server.base))
        .bearer_auth(&token_owner)
        .json(&shop_body("Khan Electronics"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let shop_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["tax_status"], "unpaid");

    // Owner may not flip tax status.
    let resp = server
        .http
        .patch(format!("{}/shops/{shop_id}/tax", server.base))
        .bearer_auth(&token_owner)
        .json(&json!({ "status": "paid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Admin may.
    let updated: Value = server
        .http
        .patch(format!("{}/shops/{shop_id}/tax", server.base))
        .bearer_auth(&token_admin)
        .json(&json!({ "status": "paid" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["tax_status"], "paid");

    // Unknown shop is a 404 even for admins.
    let resp = server
        .http
        .patch(format!("{}/shops/missing/tax", server.base))
        .bearer_auth(&token_admin)
        .json(&json!({ "status": "paid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Owner may not delete; admin may.
    let resp = server
        .http
        .delete(format!("{}/shops/{shop_id}", server.base))
        .bearer_auth(&token_owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = server
        .http
        .delete(format!("{}/shops/{shop_id}", server.base))
        .bearer_auth(&token_admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn shop_detail_is_gated_to_its_owner_or_an_admin() {
    let server = TestServer::start().await;
    let token_a = server.owner("a@example.com").await;
    let token_b = server.owner("b@example.com").await;
    let token_admin = server.admin().await;

    let created: Value = server
        .http
        .post(format!("{}/shops", server.base))
        .bearer_auth(&token_a)
        .json(&shop_body("A One"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let shop_id = created["id"].as_str().unwrap();

    for (token, expected) in [(&token_a, 200), (&token_b, 403), (&token_admin, 200)] {
        let resp = server
            .http
            .get(format!("{}/shops/{shop_id}", server.base))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }
}

#[tokio::test]
async fn registering_a_shop_requires_name_and_address() {
    let server = TestServer::start().await;
    let token = server.owner("owner@example.com").await;

    let mut body = shop_body("");
    body["address"] = json!("Tariq Road, Karachi, Pakistan");
    let resp = server
        .http
        .post(format!("{}/shops", server.base))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
async fn stats_are_scoped_by_role() {
    let server = TestServer::start().await;
    let token_a = server.owner("a@example.com").await;
    let token_b = server.owner("b@example.com").await;
    let token_admin = server.admin().await;

    for token in [&token_a, &token_a, &token_b] {
        server
            .http
            .post(format!("{}/shops", server.base))
            .bearer_auth(token)
            .json(&shop_body("Shop"))
            .send()
            .await
            .unwrap();
    }

    let stats = |token: String| {
        let server = &server;
        async move {
            server
                .http
                .get(format!("{}/stats", server.base))
                .bearer_auth(token)
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };

    let owner_stats = stats(token_a.clone()).await;
    assert_eq!(owner_stats["total"], 2);
    assert_eq!(owner_stats["unpaid"], 2);
    assert_eq!(owner_stats["compliance_rate"], 0);

    let admin_stats = stats(token_admin.clone()).await;
    assert_eq!(admin_stats["total"], 3);
}

#[tokio::test]
async fn short_geocode_queries_skip_the_upstream_entirely() {
    let server = TestServer::start().await;
    // The upstream is unroutable, so a non-empty answer here would mean the
    // length gate leaked a request (and errored). Short queries answer
    // instantly with an empty list.
    let body: Value = server
        .http
        .get(format!("{}/geocode", server.base))
        .query(&[("q", "ab")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["candidates"], json!([]));
}

#[tokio::test]
async fn geocode_upstream_failure_collapses_to_empty_candidates() {
    let server = TestServer::start().await;
    let resp = server
        .http
        .get(format!("{}/geocode", server.base))
        .query(&[("q", "Tariq Road Karachi")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["candidates"], json!([]));
}
