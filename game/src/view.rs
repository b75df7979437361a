use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::types::BunkerSnapshot;

/// Latest known bunker snapshot for the account.
///
/// Written by whoever fetched fresh state (poller, periodic checks); read by
/// anything that can make do with the last value, such as the depart check.
/// Last write wins. Age is measured on the monotonic clock, not on the
/// snapshot's wall-clock `ts_ms`.
#[derive(Clone, Default)]
pub struct BunkerView {
    inner: Arc<RwLock<Option<Cached>>>,
}

struct Cached {
    snapshot: BunkerSnapshot,
    stored_at: Instant,
}

impl BunkerView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, snapshot: BunkerSnapshot) {
        *self.inner.write().await = Some(Cached {
            snapshot,
            stored_at: Instant::now(),
        });
    }

    pub async fn get(&self) -> Option<BunkerSnapshot> {
        self.inner.read().await.as_ref().map(|c| c.snapshot.clone())
    }

    /// Cached snapshot, only if it was stored at most `max_age` ago.
    pub async fn get_fresh(&self, max_age: Duration) -> Option<BunkerSnapshot> {
        self.inner
            .read()
            .await
            .as_ref()
            .filter(|c| c.stored_at.elapsed() <= max_age)
            .map(|c| c.snapshot.clone())
    }
}
