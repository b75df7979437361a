use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, annotate_account, root_span, warn_if_slow};
use game::{BunkerSnapshot, BunkerView, Commodity, GameApi, GameError, Notifier, PurchaseReceipt};
use settings::{Configuration, SettingsStore, SubscriptionId};
use tokio::sync::watch;
use tracing::{Instrument, info};

use crate::checks::PeriodicChecks;
use crate::config::Timing;
use crate::error::CheckError;
use crate::feedback::Feedback;
use crate::guard::ActionLock;
use crate::live_config::LiveConfig;
use crate::metrics::counters::Counters;
use crate::rebuy::{RebuyController, RebuyReport};
use crate::scheduler::{Scheduler, SchedulerState};

/// All automation state for one account.
///
/// Owns the action lock, the live configuration copy, the rebuy controller and
/// the scheduler. Nothing here is global, so several accounts can run side by
/// side in one process.
pub struct Autopilot {
    account_id: String,
    api: Arc<dyn GameApi>,
    view: BunkerView,
    store: Arc<SettingsStore>,
    subscription: SubscriptionId,
    config: LiveConfig,
    lock: ActionLock,
    rebuy: RebuyController,
    scheduler: Arc<Scheduler>,
    counters: Counters,
    timing: Timing,
}

impl Autopilot {
    pub fn new(
        store: Arc<SettingsStore>,
        api: Arc<dyn GameApi>,
        notifier: Arc<dyn Notifier>,
        timing: Timing,
    ) -> Self {
        let account_id = store.account_id().to_string();
        let (config, subscription) = LiveConfig::attach(&store);

        let view = BunkerView::new();
        let lock = ActionLock::new();
        let feedback = Feedback::new(notifier);
        let counters = Counters::default();

        let rebuy = RebuyController::new(
            Arc::clone(&api),
            lock.clone(),
            feedback.clone(),
            counters.clone(),
        );

        let checks = Arc::new(PeriodicChecks::new(
            Arc::clone(&api),
            view.clone(),
            lock.clone(),
            feedback,
            counters.clone(),
            timing.checks,
        ));

        let scheduler = Arc::new(Scheduler::new(
            account_id.clone(),
            checks,
            config.clone(),
            timing,
            counters.clone(),
        ));

        Self {
            account_id,
            api,
            view,
            store,
            subscription,
            config,
            lock,
            rebuy,
            scheduler,
            counters,
            timing,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Event-driven entry point; call whenever fresh prices are known.
    pub async fn on_price_update(&self, snapshot: BunkerSnapshot) -> RebuyReport {
        let trace_id = TraceId::default();
        let span = root_span("price_update", &trace_id);

        async {
            annotate_account(&self.account_id);
            self.view.set(snapshot.clone()).await;

            let cfg = self.config.get();
            self.rebuy.on_price_update(&cfg, &snapshot).await
        }
        .instrument(span)
        .await
    }

    /// Fetches the bunker state and feeds it through [`Self::on_price_update`].
    pub async fn refresh_prices(&self) -> Result<RebuyReport, GameError> {
        let snapshot = warn_if_slow("fetch_bunker_snapshot", Duration::from_secs(2), async {
            self.api.fetch_bunker_snapshot().await
        })
        .await?;

        Ok(self.on_price_update(snapshot).await)
    }

    /// Purchase requested by the user. Fails fast with [`CheckError::LockHeld`]
    /// when an automated action is in flight.
    pub async fn manual_purchase(
        &self,
        kind: Commodity,
        amount: u64,
    ) -> Result<PurchaseReceipt, CheckError> {
        let cfg = self.config.get();
        self.rebuy.purchase(&cfg, kind, amount).await
    }

    /// Starts the scheduler loop. Idempotent: later calls return `false`.
    pub fn start(&self) -> bool {
        self.scheduler.start()
    }

    /// Stops the scheduler and any loop following [`Self::stop_signal`].
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    pub async fn join(&self) {
        self.scheduler.join().await;
    }

    pub fn stop_signal(&self) -> watch::Receiver<bool> {
        self.scheduler.stop_signal()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn config(&self) -> Arc<Configuration> {
        self.config.get()
    }

    pub fn view(&self) -> &BunkerView {
        &self.view
    }

    pub fn lock(&self) -> &ActionLock {
        &self.lock
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }
}

impl Drop for Autopilot {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        self.store.unsubscribe(self.subscription);
        info!(account_id = %self.account_id, "autopilot dropped");
    }
}
