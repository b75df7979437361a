use std::sync::Arc;

use parking_lot::RwLock;
use settings::{Configuration, SettingsStore, SubscriptionId};
use tracing::debug;

/// The automation's own copy of the settings document.
///
/// Replaced wholesale on every store notification, never merged. Readers take
/// an `Arc` snapshot at the start of a decision and keep it for its duration.
#[derive(Clone, Debug)]
pub struct LiveConfig {
    current: Arc<RwLock<Arc<Configuration>>>,
}

impl LiveConfig {
    pub fn new(initial: Arc<Configuration>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    /// Seeds from the store and follows every later write.
    pub fn attach(store: &SettingsStore) -> (Self, SubscriptionId) {
        let live = Self::new(store.get());

        let sink = live.clone();
        let id = store.subscribe(move |change| {
            debug!(version = change.config.version, "autopilot config replaced");
            sink.replace(Arc::clone(&change.config));
        });

        (live, id)
    }

    pub fn get(&self) -> Arc<Configuration> {
        Arc::clone(&self.current.read())
    }

    pub fn replace(&self, next: Arc<Configuration>) {
        *self.current.write() = next;
    }
}
