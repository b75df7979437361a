use std::sync::Arc;

use anyhow::Context;
use autopilot::{AppConfig, Autopilot, LogNotifier, poller::spawn_bunker_poller};
use common::logger::init_logger;
use game::GameClient;
use settings::db::Db;
use settings::repository_sqlx::SqlxSettingsRepository;
use settings::{SettingsBroadcaster, SettingsStore, ViewerId};
use tokio::task::JoinHandle;

/// Connects the database, runs migrations and loads the account's settings.
async fn init_settings(cfg: &AppConfig) -> anyhow::Result<Arc<SettingsStore>> {
    let db = Db::connect(&cfg.database_url)
        .await
        .context("connect settings database")?;
    db.migrate().await.context("migrate settings schema")?;

    let repo = Arc::new(SqlxSettingsRepository::new(db.pool.clone()));
    let store = SettingsStore::load(&cfg.account_id, repo).await?;

    Ok(Arc::new(store))
}

/// Follows the settings stream like any other viewer and logs each document.
fn spawn_settings_log(hub: &SettingsBroadcaster) -> JoinHandle<()> {
    let mut conn = hub.connect(ViewerId("log".into()));

    tokio::spawn(async move {
        while let Some(change) = conn.next().await {
            tracing::info!(
                origin = ?change.origin,
                version = change.config.version,
                "settings document"
            );
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    init_logger("autopilot", cfg.is_production);

    tracing::info!(account_id = %cfg.account_id, "Starting autopilot...");

    let store = init_settings(&cfg).await?;
    let hub = SettingsBroadcaster::new(Arc::clone(&store), cfg.viewer_channel_capacity);
    let settings_log = spawn_settings_log(&hub);

    let api = Arc::new(
        GameClient::new(&cfg.game_base_url, &cfg.game_session_cookie, cfg.http_timeout)
            .context("build game client")?,
    );

    let autopilot = Arc::new(Autopilot::new(
        Arc::clone(&store),
        api,
        Arc::new(LogNotifier),
        cfg.timing,
    ));

    autopilot.start();

    let poller = spawn_bunker_poller(
        Arc::clone(&autopilot),
        cfg.timing.price_poll,
        autopilot.stop_signal(),
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    autopilot.shutdown();
    autopilot.join().await;
    if let Err(e) = poller.await {
        tracing::error!(error = %e, "poller task ended abnormally");
    }

    drop(hub);
    if let Err(e) = settings_log.await {
        tracing::error!(error = %e, "settings log task ended abnormally");
    }

    Ok(())
}
