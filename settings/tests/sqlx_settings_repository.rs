use std::sync::Arc;

use serde_json::json;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Row};
use tokio::task::JoinSet;
use uuid::Uuid;

use settings::db::schema;
use settings::repository::SettingsRepository;
use settings::repository_sqlx::SqlxSettingsRepository;
use settings::{Configuration, ConfigurationPatch, SettingsStore};

/// Isolated in-memory DB per test.
/// Unique name prevents test interference during parallel execution;
/// `cache=shared` lets every connection in the pool see the same DB.
async fn setup_db() -> Arc<AnyPool> {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn)
        .await
        .expect("connect sqlite memory db");

    schema::migrate(&pool).await.expect("migrate");

    Arc::new(pool)
}

#[tokio::test]
async fn load_missing_account_returns_none() {
    let pool = setup_db().await;
    let repo = SqlxSettingsRepository::new(pool);

    assert!(repo.load("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn persist_then_load_round_trip() {
    let pool = setup_db().await;
    let repo = SqlxSettingsRepository::new(pool.clone());

    repo.persist("acct", 1, r#"{"autoRebuyFuel":true}"#)
        .await
        .unwrap();

    let doc = repo.load("acct").await.unwrap().unwrap();
    assert_eq!(doc, r#"{"autoRebuyFuel":true}"#);

    let row = sqlx::query("SELECT version, updated_ms FROM settings WHERE account_id = ?")
        .bind("acct")
        .fetch_one(pool.as_ref())
        .await
        .unwrap();

    assert_eq!(row.get::<i64, _>("version"), 1);
    assert!(row.get::<i64, _>("updated_ms") > 0);
}

#[tokio::test]
async fn persist_overwrites_existing_row() {
    let pool = setup_db().await;
    let repo = SqlxSettingsRepository::new(pool.clone());

    repo.persist("acct", 1, "{}").await.unwrap();
    repo.persist("acct", 2, r#"{"co2Threshold":5}"#)
        .await
        .unwrap();

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM settings")
        .fetch_one(pool.as_ref())
        .await
        .unwrap()
        .get("n");
    assert_eq!(count, 1);

    let doc = repo.load("acct").await.unwrap().unwrap();
    assert_eq!(doc, r#"{"co2Threshold":5}"#);
}

#[tokio::test]
async fn accounts_are_isolated() {
    let pool = setup_db().await;
    let repo = SqlxSettingsRepository::new(pool);

    repo.persist("a", 1, r#"{"autoDepartAll":true}"#)
        .await
        .unwrap();
    repo.persist("b", 1, r#"{"autoDepartAll":false}"#)
        .await
        .unwrap();

    assert_eq!(
        repo.load("a").await.unwrap().unwrap(),
        r#"{"autoDepartAll":true}"#
    );
    assert_eq!(
        repo.load("b").await.unwrap().unwrap(),
        r#"{"autoDepartAll":false}"#
    );
}

#[tokio::test]
async fn store_survives_restart() {
    let pool = setup_db().await;

    {
        let repo = Arc::new(SqlxSettingsRepository::new(pool.clone()));
        let store = SettingsStore::load("acct", repo).await.unwrap();
        store
            .set(serde_json::from_value::<ConfigurationPatch>(json!({
                "autoCampaignRenewal": true,
                "maintenanceThreshold": 25
            }))
            .unwrap())
            .await
            .unwrap();
    }

    // Fresh store over the same database, as after a process restart.
    let repo = Arc::new(SqlxSettingsRepository::new(pool));
    let store = SettingsStore::load("acct", repo).await.unwrap();
    let cfg = store.get();

    assert_eq!(cfg.version, 1);
    assert!(cfg.auto_campaign_renewal);
    assert_eq!(cfg.maintenance_threshold, 25.0);
}

#[tokio::test]
async fn corrupted_row_is_recovered_per_field() {
    let pool = setup_db().await;

    sqlx::query("INSERT INTO settings VALUES ('acct', 4, ?, 0)")
        .bind(r#"{"version": 4, "autoDepartAll": true, "fuelThreshold": {"oops": 1}}"#)
        .execute(pool.as_ref())
        .await
        .unwrap();

    let store = SettingsStore::load("acct", Arc::new(SqlxSettingsRepository::new(pool)))
        .await
        .unwrap();
    let cfg = store.get();

    assert_eq!(cfg.version, 4);
    assert!(cfg.auto_depart_all);
    assert_eq!(cfg.fuel_threshold, Configuration::default().fuel_threshold);
}

#[tokio::test]
async fn concurrent_persists_keep_a_single_row() {
    let pool = setup_db().await;
    let repo = Arc::new(SqlxSettingsRepository::new(pool.clone()));

    let mut set = JoinSet::new();
    for v in 1..=10u64 {
        let r = Arc::clone(&repo);
        set.spawn(async move { r.persist("acct", v, "{}").await });
    }

    while let Some(res) = set.join_next().await {
        res.expect("task panicked").expect("persist failed");
    }

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM settings")
        .fetch_one(pool.as_ref())
        .await
        .unwrap()
        .get("n");
    assert_eq!(count, 1);
}
