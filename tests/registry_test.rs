//! Registry round-trip tests against a temporary SQLite database.

use shopregd::registry::{NewShop, Registry, TaxStatus};
use tempfile::TempDir;

fn sample_shop(name: &str) -> NewShop {
    NewShop {
        shop_name: name.to_string(),
        owner_name: "Ayesha Khan".to_string(),
        contact_number: "0300-1234567".to_string(),
        address: "Tariq Road, Karachi, Pakistan".to_string(),
        latitude: 24.8607,
        longitude: 67.0011,
        image_url: None,
    }
}

async fn registry(dir: &TempDir) -> Registry {
    Registry::new(dir.path()).await.unwrap()
}

#[tokio::test]
async fn create_and_fetch_shop() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir).await;
    let owner = reg.create_user("owner@example.com", "owner").await.unwrap();

    let shop = reg
        .create_shop(&owner.id, &sample_shop("Khan Electronics"))
        .await
        .unwrap();
    assert_eq!(shop.shop_name, "Khan Electronics");
    assert_eq!(shop.tax_status, "unpaid");
    assert_eq!(shop.latitude, 24.8607);

    let fetched = reg.get_shop(&shop.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, shop.id);
    assert_eq!(fetched.address, "Tariq Road, Karachi, Pakistan");

    assert!(reg.get_shop("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn shop_lists_are_scoped_per_owner() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir).await;
    let a = reg.create_user("a@example.com", "owner").await.unwrap();
    let b = reg.create_user("b@example.com", "owner").await.unwrap();

    reg.create_shop(&a.id, &sample_shop("A One")).await.unwrap();
    reg.create_shop(&a.id, &sample_shop("A Two")).await.unwrap();
    reg.create_shop(&b.id, &sample_shop("B One")).await.unwrap();

    assert_eq!(reg.list_shops_for(&a.id).await.unwrap().len(), 2);
    assert_eq!(reg.list_shops_for(&b.id).await.unwrap().len(), 1);
    assert_eq!(reg.list_shops().await.unwrap().len(), 3);
}

#[tokio::test]
async fn tax_status_updates_drive_compliance_stats() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir).await;
    let owner = reg.create_user("owner@example.com", "owner").await.unwrap();

    let s1 = reg.create_shop(&owner.id, &sample_shop("One")).await.unwrap();
    let s2 = reg.create_shop(&owner.id, &sample_shop("Two")).await.unwrap();
    reg.create_shop(&owner.id, &sample_shop("Three")).await.unwrap();

    assert!(reg.set_tax_status(&s1.id, TaxStatus::Paid).await.unwrap());
    assert!(reg.set_tax_status(&s2.id, TaxStatus::Paid).await.unwrap());
    assert!(!reg.set_tax_status("missing", TaxStatus::Paid).await.unwrap());

    let stats = reg.compliance_stats(Some(&owner.id)).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.paid, 2);
    assert_eq!(stats.unpaid, 1);
    assert_eq!(stats.compliance_rate, 67);

    // Back to unpaid.
    assert!(reg.set_tax_status(&s1.id, TaxStatus::Unpaid).await.unwrap());
    let stats = reg.compliance_stats(Some(&owner.id)).await.unwrap();
    assert_eq!(stats.paid, 1);
}

#[tokio::test]
async fn empty_registry_has_zero_compliance_rate() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir).await;
    let stats = reg.compliance_stats(None).await.unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.compliance_rate, 0);
}

#[tokio::test]
async fn delete_shop_round_trip() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir).await;
    let owner = reg.create_user("owner@example.com", "owner").await.unwrap();
    let shop = reg.create_shop(&owner.id, &sample_shop("Gone")).await.unwrap();

    assert!(reg.delete_shop(&shop.id).await.unwrap());
    assert!(reg.get_shop(&shop.id).await.unwrap().is_none());
    assert!(!reg.delete_shop(&shop.id).await.unwrap());
}

#[tokio::test]
async fn slow_query_logging_open_path_works() {
    let dir = TempDir::new().unwrap();
    let reg = Registry::new_with_slow_query(dir.path(), 100).await.unwrap();
    assert!(reg.ping().await);

    let owner = reg.create_user("owner@example.com", "owner").await.unwrap();
    let shop = reg.create_shop(&owner.id, &sample_shop("Logged")).await.unwrap();
    assert_eq!(shop.shop_name, "Logged");
}

#[tokio::test]
async fn api_tokens_resolve_to_users() {
    let dir = TempDir::new().unwrap();
    let reg = registry(&dir).await;
    let admin = reg.create_user("admin@example.com", "admin").await.unwrap();

    let resolved = reg.user_by_token(&admin.api_token).await.unwrap().unwrap();
    assert_eq!(resolved.id, admin.id);
    assert!(resolved.is_admin());

    assert!(reg.user_by_token("bogus").await.unwrap().is_none());
    assert_eq!(reg.list_users().await.unwrap().len(), 1);
}
