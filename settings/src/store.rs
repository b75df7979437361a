use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use common::logger::warn_if_slow;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::SettingsError;
use crate::model::Configuration;
use crate::patch::ConfigurationPatch;
use crate::repository::SettingsRepository;

pub type SubscriptionId = u64;

type Callback = Arc<dyn Fn(&SettingsChange) + Send + Sync>;

/// Who caused a settings change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// The process itself (startup, CLI, scheduler).
    Local,
    /// A connected viewer, by id.
    Viewer(String),
    /// Not a new write: a lagging viewer re-read the current document.
    Resync,
}

/// Full resulting document after a write; never a diff.
#[derive(Clone, Debug)]
pub struct SettingsChange {
    pub origin: ChangeOrigin,
    pub config: Arc<Configuration>,
}

/// Single-writer, many-reader settings document for one account.
///
/// Guarantees:
/// - writes are serialized; each bumps `version` by one
/// - the document is persisted before anyone is notified
/// - subscribers receive the whole document, in write order
/// - a failed persist leaves the in-memory document untouched
pub struct SettingsStore {
    account_id: String,
    repo: Arc<dyn SettingsRepository>,
    current: RwLock<Arc<Configuration>>,
    writer: tokio::sync::Mutex<()>,
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
    next_subscription: AtomicU64,
}

impl SettingsStore {
    /// Loads the account's document, creating it with defaults on first access.
    ///
    /// Malformed stored documents are recovered field by field rather than
    /// failing startup; only a repository error is fatal.
    #[instrument(skip(repo), target = "settings")]
    pub async fn load(
        account_id: &str,
        repo: Arc<dyn SettingsRepository>,
    ) -> Result<Self, SettingsError> {
        let stored = repo
            .load(account_id)
            .await
            .map_err(|e| SettingsError::Load {
                account_id: account_id.to_string(),
                reason: format!("{e:#}"),
            })?;

        let store = |config: Configuration| Self {
            account_id: account_id.to_string(),
            repo: Arc::clone(&repo),
            current: RwLock::new(Arc::new(config)),
            writer: tokio::sync::Mutex::new(()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        };

        match stored {
            Some(raw) => {
                let config = match serde_json::from_str::<Value>(&raw) {
                    Ok(doc) => Configuration::from_document(&doc),
                    Err(e) => {
                        warn!(error = %e, "stored settings are not valid JSON; using defaults");
                        Configuration::default()
                    }
                };

                info!(version = config.version, "settings loaded");
                Ok(store(config))
            }
            None => {
                let s = store(Configuration::default());
                s.persist(&Configuration::default()).await?;

                info!("no stored settings; created defaults");
                Ok(s)
            }
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Immutable snapshot of the current document.
    pub fn get(&self) -> Arc<Configuration> {
        Arc::clone(&self.current.read())
    }

    pub async fn set(
        &self,
        patch: ConfigurationPatch,
    ) -> Result<Arc<Configuration>, SettingsError> {
        self.set_from(ChangeOrigin::Local, patch).await
    }

    /// Applies `patch`, persists, swaps the in-memory document and notifies
    /// every subscriber synchronously with the full result.
    #[instrument(skip(self, patch), target = "settings", fields(account_id = %self.account_id))]
    pub async fn set_from(
        &self,
        origin: ChangeOrigin,
        patch: ConfigurationPatch,
    ) -> Result<Arc<Configuration>, SettingsError> {
        let _write = self.writer.lock().await;

        let base = self.get();
        let (mut next, coerced) = patch.apply(&base);
        next.version = base.version + 1;

        if !coerced.is_empty() {
            debug!(?coerced, "settings fields coerced to defaults");
        }

        self.persist(&next).await?;

        let next = Arc::new(next);
        *self.current.write() = Arc::clone(&next);

        info!(version = next.version, ?origin, "settings updated");

        self.notify(&SettingsChange {
            origin,
            config: Arc::clone(&next),
        });

        Ok(next)
    }

    /// Registers `callback` for every future successful write.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SettingsChange) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, Arc::new(callback)));
        debug!(subscription = id, "settings subscriber added");
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.lock();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        before != subs.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    async fn persist(&self, config: &Configuration) -> Result<(), SettingsError> {
        let document = serde_json::to_string(config)?;

        warn_if_slow("settings_persist", Duration::from_millis(100), async {
            self.repo
                .persist(&self.account_id, config.version, &document)
                .await
        })
        .await
        .map_err(|e| SettingsError::Persist {
            account_id: self.account_id.clone(),
            reason: format!("{e:#}"),
        })
    }

    fn notify(&self, change: &SettingsChange) {
        // Callbacks run outside the lock so they may (un)subscribe.
        let callbacks: Vec<Callback> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for cb in callbacks {
            cb(change);
        }
    }
}
