use settings::{Configuration, RepairPolicy};
use tracing::{debug, info};

use super::{CheckOutcome, PeriodicChecks};
use crate::error::CheckError;
use crate::metrics::counters::Counters;

/// Whether a vessel with `wear` percent qualifies under `policy`.
pub fn needs_repair(policy: RepairPolicy, maintenance_threshold: f64, wear: f64) -> bool {
    if wear <= 0.0 {
        return false;
    }
    match policy {
        RepairPolicy::AnyWear => true,
        RepairPolicy::AtThreshold => wear >= maintenance_threshold,
    }
}

impl PeriodicChecks {
    /// Bulk-repairs qualifying vessels when the whole bill fits in the cash balance.
    pub(super) async fn repair(&self, cfg: &Configuration) -> Result<CheckOutcome, CheckError> {
        let vessels = self.api.fetch_vessels().await?;
        let ids: Vec<u64> = vessels
            .iter()
            .filter(|v| needs_repair(cfg.repair_policy, cfg.maintenance_threshold, v.wear))
            .map(|v| v.id)
            .collect();

        if ids.is_empty() {
            return Ok(CheckOutcome::Skipped("no vessel needs repair"));
        }

        let Some(guard) = self.lock.try_acquire() else {
            return Ok(CheckOutcome::Locked);
        };

        let quotes = self.api.fetch_maintenance_cost(&ids).await?;
        if quotes.is_empty() {
            return Ok(CheckOutcome::Skipped("nothing to repair"));
        }

        // A zero bill still goes through.
        let total = quotes
            .iter()
            .fold(0u64, |acc, q| acc.saturating_add(q.wear_cost));

        let snapshot = self.fresh_snapshot().await?;
        if i128::from(total) > i128::from(snapshot.cash) {
            debug!(total, cash = snapshot.cash, vessels = ids.len(), "repair bill exceeds cash");
            return Ok(CheckOutcome::Skipped("insufficient funds"));
        }

        let receipt = self.api.perform_bulk_repair(&ids).await?;
        drop(guard);

        Counters::bump(&self.counters.repairs);
        info!(
            vessels = receipt.repaired_count,
            cost = receipt.total_cost,
            policy = cfg.repair_policy.as_str(),
            "bulk repair completed"
        );

        self.feedback
            .emit(
                cfg,
                "Bulk repair",
                &format!(
                    "{} vessels repaired for ${}",
                    receipt.repaired_count, receipt.total_cost
                ),
            )
            .await;

        Ok(CheckOutcome::Repaired {
            vessels: receipt.repaired_count,
            cost: receipt.total_cost,
        })
    }
}
