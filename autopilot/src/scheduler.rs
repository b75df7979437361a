//! Scheduler loop for the periodic checks.
//!
//! Lifecycle: `Idle` until [`Scheduler::start`], then `Running` as a single
//! supervised tokio task that waits the warm-up delay, runs one tick, sleeps a
//! freshly drawn jittered delay and repeats. [`Scheduler::shutdown`] stops the
//! loop before its next tick; a tick already in progress always completes.

use std::sync::Arc;

use common::logger::{TraceId, annotate_account, root_span};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, info};

use crate::checks::PeriodicChecks;
use crate::config::Timing;
use crate::jitter::entropy_rng;
use crate::live_config::LiveConfig;
use crate::metrics::counters::Counters;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

pub struct Scheduler {
    account_id: String,
    checks: Arc<PeriodicChecks>,
    config: LiveConfig,
    timing: Timing,
    counters: Counters,

    state: Mutex<SchedulerState>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
    rng: Mutex<StdRng>,

    /// Monotonic origin for the check throttles.
    origin: Instant,
}

impl Scheduler {
    pub fn new(
        account_id: impl Into<String>,
        checks: Arc<PeriodicChecks>,
        config: LiveConfig,
        timing: Timing,
        counters: Counters,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);

        Self {
            account_id: account_id.into(),
            checks,
            config,
            timing,
            counters,
            state: Mutex::new(SchedulerState::Idle),
            stop_tx,
            task: Mutex::new(None),
            rng: Mutex::new(entropy_rng()),
            origin: Instant::now(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Moves `Idle -> Running` and spawns the loop. Returns `false` if the
    /// scheduler was already started or has been shut down.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock();
        if *state != SchedulerState::Idle {
            debug!(state = ?*state, "scheduler start ignored");
            return false;
        }
        *state = SchedulerState::Running;

        let stop_rx = self.stop_tx.subscribe();
        let handle = tokio::spawn(Arc::clone(self).run(stop_rx));
        *self.task.lock() = Some(handle);

        info!(
            account_id = %self.account_id,
            warm_up_ms = self.timing.warm_up.as_millis() as u64,
            "scheduler started"
        );
        true
    }

    /// Prevents any further tick. Does not interrupt one already running.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if *state == SchedulerState::Stopped {
            return;
        }
        *state = SchedulerState::Stopped;
        self.stop_tx.send_replace(true);
        info!(account_id = %self.account_id, "scheduler shutdown requested");
    }

    /// Receiver flipped to `true` on shutdown; lets sibling loops stop with us.
    pub fn stop_signal(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Waits for the loop task to finish, if it was ever started.
    pub async fn join(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "scheduler task ended abnormally");
            }
        }
    }

    /// One pass over the periodic checks with the current configuration.
    pub async fn tick(&self) {
        let trace_id = TraceId::default();
        let span = root_span("scheduler_tick", &trace_id);

        async {
            annotate_account(&self.account_id);
            Counters::bump(&self.counters.scheduler_ticks);

            // Copy-on-read: a settings write during this tick does not affect it.
            let cfg = self.config.get();
            let now_ms = self.origin.elapsed().as_millis() as u64;

            self.checks.run_all(&cfg, now_ms).await;
        }
        .instrument(span)
        .await
    }

    async fn run(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        let mut delay = self.timing.warm_up;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *stop_rx.borrow() {
                break;
            }

            self.tick().await;

            delay = self.timing.tick.sample(&mut *self.rng.lock());
            debug!(next_tick_ms = delay.as_millis() as u64, "scheduler sleeping");
        }

        info!(account_id = %self.account_id, "scheduler stopped");
    }
}
