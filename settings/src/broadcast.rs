use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::error::SettingsError;
use crate::model::Configuration;
use crate::patch::ConfigurationPatch;
use crate::store::{ChangeOrigin, SettingsChange, SettingsStore, SubscriptionId};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewerId(pub String);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fans settings changes out to every connected viewer.
///
/// The broadcaster is itself a store subscriber, so anything written through
/// the store (by a viewer or locally) reaches all viewers, including the one
/// that made the change.
pub struct SettingsBroadcaster {
    store: Arc<SettingsStore>,
    tx: broadcast::Sender<SettingsChange>,
    subscription: SubscriptionId,
}

impl SettingsBroadcaster {
    pub fn new(store: Arc<SettingsStore>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));

        let fanout = tx.clone();
        let subscription = store.subscribe(move |change| {
            // No connected viewer is not an error.
            if let Ok(n) = fanout.send(change.clone()) {
                debug!(receivers = n, version = change.config.version, "settings broadcast");
            }
        });

        Self {
            store,
            tx,
            subscription,
        }
    }

    /// Attaches a viewer. The returned connection starts from the current document.
    pub fn connect(&self, viewer: ViewerId) -> ViewerConnection {
        // Subscribe before reading so no write can fall between the two.
        let rx = self.tx.subscribe();
        let initial = self.store.get();

        info!(%viewer, version = initial.version, "viewer connected");

        ViewerConnection {
            viewer,
            store: Arc::clone(&self.store),
            rx,
            delivered: initial.version,
            initial,
        }
    }

    /// Writes a viewer's edit through the store; the result is broadcast to everyone.
    pub async fn update_from(
        &self,
        viewer: &ViewerId,
        patch: ConfigurationPatch,
    ) -> Result<Arc<Configuration>, SettingsError> {
        self.store
            .set_from(ChangeOrigin::Viewer(viewer.0.clone()), patch)
            .await
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Drop for SettingsBroadcaster {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

/// One viewer's view of the settings stream.
pub struct ViewerConnection {
    viewer: ViewerId,
    store: Arc<SettingsStore>,
    rx: broadcast::Receiver<SettingsChange>,
    initial: Arc<Configuration>,
    /// Highest version handed out so far; older buffered changes are dropped.
    delivered: u64,
}

impl ViewerConnection {
    pub fn viewer(&self) -> &ViewerId {
        &self.viewer
    }

    /// Document at connect time.
    pub fn initial(&self) -> &Arc<Configuration> {
        &self.initial
    }

    /// Next change, or `None` once the broadcaster is gone.
    ///
    /// A viewer that fell behind skips straight to the current document,
    /// which is enough because every change carries the whole document.
    /// Versions handed out never go backwards.
    pub async fn next(&mut self) -> Option<SettingsChange> {
        loop {
            let change = match self.rx.recv().await {
                Ok(change) => change,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(viewer = %self.viewer, skipped, "viewer lagged; resyncing settings");
                    SettingsChange {
                        origin: ChangeOrigin::Resync,
                        config: self.store.get(),
                    }
                }
                Err(RecvError::Closed) => return None,
            };

            if change.config.version <= self.delivered {
                debug!(
                    viewer = %self.viewer,
                    version = change.config.version,
                    delivered = self.delivered,
                    "stale settings change dropped"
                );
                continue;
            }

            self.delivered = change.config.version;
            return Some(change);
        }
    }
}
