use settings::Configuration;
use tracing::{debug, info};

use super::{CheckOutcome, PeriodicChecks};
use crate::error::CheckError;
use crate::metrics::counters::Counters;

impl PeriodicChecks {
    /// Sends every ready vessel out, provided there is fuel to sail on.
    ///
    /// Depart does not spend cash, so it neither takes the action lock nor
    /// needs a fresher fuel level than the shared view holds.
    pub(super) async fn depart(&self, cfg: &Configuration) -> Result<CheckOutcome, CheckError> {
        let vessels = self.api.fetch_vessels().await?;
        let eligible = vessels.iter().filter(|v| v.can_depart()).count();

        if eligible == 0 {
            return Ok(CheckOutcome::Skipped("no vessel ready to depart"));
        }

        let snapshot = self.recent_snapshot().await?;
        if snapshot.fuel == 0 {
            debug!(eligible, "vessels ready but bunker is empty");
            return Ok(CheckOutcome::Skipped("no fuel"));
        }

        let summary = self.api.depart_all().await?;
        let departed = summary.departed_count;

        if departed == 0 {
            info!(eligible, "depart-all sent no vessel out");
            return Ok(CheckOutcome::Departed { departed, eligible });
        }

        Counters::bump(&self.counters.departures);
        info!(
            departed,
            eligible,
            fuel_used = summary.fuel_used,
            co2_emitted = summary.co2_emitted,
            income = summary.income,
            harbor_fee = summary.harbor_fee,
            "auto depart completed"
        );

        if (departed as usize) < eligible {
            // The game ran out of fuel part-way through the batch.
            self.feedback
                .emit(
                    cfg,
                    "Partial departure",
                    &format!("{departed} of {eligible} vessels departed; the rest lacked fuel"),
                )
                .await;
        } else {
            self.feedback
                .emit(
                    cfg,
                    "Vessels departed",
                    &format!(
                        "{departed} vessels departed. Fuel {:.0}t, CO2 {:.0}t, \
                         income ${}, harbor fees ${}",
                        summary.fuel_used, summary.co2_emitted, summary.income, summary.harbor_fee
                    ),
                )
                .await;
        }

        Ok(CheckOutcome::Departed { departed, eligible })
    }
}
