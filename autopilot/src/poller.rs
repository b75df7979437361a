//! Bunker price poller.
//!
//! Refreshes the bunker snapshot on a jittered 30-35 s cadence and hands every
//! fresh snapshot to the rebuy controller. A failed refresh is logged and the
//! loop carries on; the next cycle simply tries again.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::jitter::{JitterRange, entropy_rng};
use crate::rebuy::RebuyOutcome;
use crate::service::Autopilot;

/// Spawns the poller; it ends once `stop` flips to `true`.
pub fn spawn_bunker_poller(
    autopilot: Arc<Autopilot>,
    every: JitterRange,
    stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run_bunker_poller(autopilot, every, stop, entropy_rng()))
}

pub async fn run_bunker_poller(
    autopilot: Arc<Autopilot>,
    every: JitterRange,
    mut stop: watch::Receiver<bool>,
    mut rng: impl Rng + Send,
) {
    info!(
        account_id = %autopilot.account_id(),
        min_ms = every.min().as_millis() as u64,
        max_ms = every.max().as_millis() as u64,
        "bunker poller started"
    );

    loop {
        if *stop.borrow() {
            break;
        }

        match autopilot.refresh_prices().await {
            Ok(report) => {
                let bought = [&report.fuel, &report.co2]
                    .into_iter()
                    .filter(|o| matches!(o, RebuyOutcome::Purchased(_)))
                    .count();
                debug!(bought, "bunker refreshed");
            }
            Err(e) => warn!(error = %e, "bunker refresh failed; retrying next cycle"),
        }

        let delay = every.sample(&mut rng);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(account_id = %autopilot.account_id(), "bunker poller stopped");
}
