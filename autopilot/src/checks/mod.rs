//! Time-throttled periodic checks: auto-depart, bulk repair, campaign renewal.
//!
//! The scheduler calls [`PeriodicChecks::run_all`] on every tick. Each check
//! type additionally gates itself on its own jittered window, so a fast
//! scheduler never makes a check run more often than its window allows.
//!
//! Failures are contained per check: an error in one is logged and counted,
//! the remaining checks still run and nothing reaches the scheduler loop.

mod campaign;
mod depart;
mod repair;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use common::logger::{child_span, warn_if_slow};
use game::{BunkerSnapshot, BunkerView, GameApi, GameError};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use settings::Configuration;
use tracing::{Instrument, debug, instrument, warn};

use crate::error::CheckError;
use crate::feedback::Feedback;
use crate::guard::ActionLock;
use crate::jitter::{JitterRange, entropy_rng};
use crate::metrics::counters::Counters;
use crate::throttle::CheckThrottle;

pub use campaign::plan_renewals;
pub use repair::needs_repair;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Depart,
    Repair,
    Campaign,
}

impl CheckKind {
    /// Execution order within one tick.
    pub const ALL: [CheckKind; 3] = [CheckKind::Depart, CheckKind::Repair, CheckKind::Campaign];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Depart => "depart",
            CheckKind::Repair => "repair",
            CheckKind::Campaign => "campaign",
        }
    }

    fn enabled(&self, cfg: &Configuration) -> bool {
        match self {
            CheckKind::Depart => cfg.auto_depart_all,
            CheckKind::Repair => cfg.auto_bulk_repair,
            CheckKind::Campaign => cfg.auto_campaign_renewal,
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckOutcome {
    Disabled,
    /// Ran too recently for this tick's drawn interval.
    Throttled,
    /// Cash-spending step found the action lock held.
    Locked,
    /// Ran, found nothing to do.
    Skipped(&'static str),
    Departed { departed: u32, eligible: usize },
    Repaired { vessels: u32, cost: u64 },
    Renewed { campaign_ids: Vec<u64> },
}

/// Minimum-interval windows per check type.
#[derive(Clone, Copy, Debug)]
pub struct CheckWindows {
    pub depart: JitterRange,
    pub repair: JitterRange,
    pub campaign: JitterRange,
}

impl Default for CheckWindows {
    fn default() -> Self {
        Self {
            depart: JitterRange::from_secs(60, 120),
            repair: JitterRange::from_secs(60, 120),
            campaign: JitterRange::from_secs(120, 180),
        }
    }
}

struct ThrottleState {
    depart: CheckThrottle,
    repair: CheckThrottle,
    campaign: CheckThrottle,
    rng: StdRng,
}

impl ThrottleState {
    fn due(&mut self, kind: CheckKind, now_ms: u64) -> bool {
        let throttle = match kind {
            CheckKind::Depart => &mut self.depart,
            CheckKind::Repair => &mut self.repair,
            CheckKind::Campaign => &mut self.campaign,
        };
        throttle.should_run(now_ms, &mut self.rng)
    }
}

/// How old a cached snapshot may be for checks that do not spend cash.
const SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(60);

pub struct PeriodicChecks {
    api: Arc<dyn GameApi>,
    view: BunkerView,
    lock: ActionLock,
    feedback: Feedback,
    counters: Counters,
    throttles: Mutex<ThrottleState>,
}

impl PeriodicChecks {
    pub fn new(
        api: Arc<dyn GameApi>,
        view: BunkerView,
        lock: ActionLock,
        feedback: Feedback,
        counters: Counters,
        windows: CheckWindows,
    ) -> Self {
        Self::with_rng(api, view, lock, feedback, counters, windows, entropy_rng())
    }

    pub fn with_rng(
        api: Arc<dyn GameApi>,
        view: BunkerView,
        lock: ActionLock,
        feedback: Feedback,
        counters: Counters,
        windows: CheckWindows,
        rng: StdRng,
    ) -> Self {
        Self {
            api,
            view,
            lock,
            feedback,
            counters,
            throttles: Mutex::new(ThrottleState {
                depart: CheckThrottle::new(windows.depart),
                repair: CheckThrottle::new(windows.repair),
                campaign: CheckThrottle::new(windows.campaign),
                rng,
            }),
        }
    }

    /// Runs every check type once, in [`CheckKind::ALL`] order.
    #[instrument(skip_all, target = "checks", fields(version = cfg.version))]
    pub async fn run_all(
        &self,
        cfg: &Configuration,
        now_ms: u64,
    ) -> Vec<(CheckKind, Result<CheckOutcome, CheckError>)> {
        let mut results = Vec::with_capacity(CheckKind::ALL.len());

        for kind in CheckKind::ALL {
            let result = self.run(kind, cfg, now_ms).await;

            match &result {
                Ok(outcome) => debug!(check = %kind, ?outcome, "check finished"),
                Err(e) => {
                    Counters::bump(&self.counters.check_failures);
                    warn!(check = %kind, error = %e, "check failed; will retry next window");
                }
            }

            results.push((kind, result));
        }

        results
    }

    /// Toggle, then throttle, then the check body.
    pub async fn run(
        &self,
        kind: CheckKind,
        cfg: &Configuration,
        now_ms: u64,
    ) -> Result<CheckOutcome, CheckError> {
        if !kind.enabled(cfg) {
            return Ok(CheckOutcome::Disabled);
        }

        if !self.throttles.lock().due(kind, now_ms) {
            Counters::bump(&self.counters.checks_throttled);
            return Ok(CheckOutcome::Throttled);
        }

        Counters::bump(&self.counters.checks_run);

        let body = async {
            match kind {
                CheckKind::Depart => self.depart(cfg).await,
                CheckKind::Repair => self.repair(cfg).await,
                CheckKind::Campaign => self.renew_campaigns(cfg).await,
            }
        };
        body.instrument(child_span(kind.as_str())).await
    }

    /// Current bunker state straight from the game; also refreshes the shared view.
    async fn fresh_snapshot(&self) -> Result<BunkerSnapshot, GameError> {
        let snapshot = warn_if_slow("fetch_bunker_snapshot", Duration::from_secs(2), async {
            self.api.fetch_bunker_snapshot().await
        })
        .await?;

        self.view.set(snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Shared view if it is recent enough, otherwise a fresh fetch.
    async fn recent_snapshot(&self) -> Result<BunkerSnapshot, GameError> {
        match self.view.get_fresh(SNAPSHOT_MAX_AGE).await {
            Some(snapshot) => Ok(snapshot),
            None => self.fresh_snapshot().await,
        }
    }
}
