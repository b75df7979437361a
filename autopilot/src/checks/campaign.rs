use game::{Campaign, Campaigns};
use settings::Configuration;
use tracing::{info, warn};

use super::{CheckOutcome, PeriodicChecks};
use crate::error::CheckError;
use crate::metrics::counters::Counters;

/// Picks at most one campaign per inactive type.
///
/// For each type, the most expensive campaign still within the remaining
/// budget wins; its price is deducted before the next type is considered, so
/// the picks together never exceed `cash`.
pub fn plan_renewals(campaigns: &Campaigns, cash: i64) -> Vec<Campaign> {
    let mut budget = u64::try_from(cash).unwrap_or(0);
    let mut picks = Vec::new();

    for kind in campaigns.inactive_kinds() {
        let best = campaigns
            .all
            .iter()
            .filter(|c| c.kind == kind && c.price <= budget)
            .max_by_key(|c| c.price);

        if let Some(c) = best {
            budget -= c.price;
            picks.push(c.clone());
        }
    }

    picks
}

impl PeriodicChecks {
    pub(super) async fn renew_campaigns(
        &self,
        cfg: &Configuration,
    ) -> Result<CheckOutcome, CheckError> {
        let campaigns = self.api.fetch_campaigns().await?;

        if campaigns.inactive_kinds().is_empty() {
            return Ok(CheckOutcome::Skipped("all campaign types active"));
        }

        let Some(guard) = self.lock.try_acquire() else {
            return Ok(CheckOutcome::Locked);
        };

        let snapshot = self.fresh_snapshot().await?;
        let picks = plan_renewals(&campaigns, snapshot.cash);

        if picks.is_empty() {
            return Ok(CheckOutcome::Skipped("no affordable campaign"));
        }

        let mut activated = Vec::with_capacity(picks.len());
        let mut first_error = None;

        // Types are independent: one failed activation does not stop the others.
        for c in &picks {
            match self.api.activate_campaign(c.id).await {
                Ok(()) => {
                    Counters::bump(&self.counters.campaigns_activated);
                    info!(
                        campaign_id = c.id,
                        kind = %c.kind,
                        price = c.price,
                        "campaign activated"
                    );
                    activated.push(c);
                }
                Err(e) => {
                    warn!(
                        campaign_id = c.id,
                        kind = %c.kind,
                        error = %e,
                        "campaign activation failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        drop(guard);

        if activated.is_empty() {
            if let Some(e) = first_error {
                return Err(e.into());
            }
        }

        let summary = activated
            .iter()
            .map(|c| format!("{} (${})", c.kind, c.price))
            .collect::<Vec<_>>()
            .join(", ");
        self.feedback.emit(cfg, "Campaigns renewed", &summary).await;

        Ok(CheckOutcome::Renewed {
            campaign_ids: activated.iter().map(|c| c.id).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game::CampaignKind;
    use proptest::prelude::*;

    fn campaign(id: u64, kind: CampaignKind, price: u64) -> Campaign {
        Campaign {
            id,
            kind,
            price,
            active_until: None,
        }
    }

    #[test]
    fn most_expensive_affordable_wins() {
        let c = Campaigns {
            all: vec![
                campaign(1, CampaignKind::Awareness, 500),
                campaign(2, CampaignKind::Awareness, 1_500),
                campaign(3, CampaignKind::Reputation, 200),
                campaign(4, CampaignKind::Green, 300),
            ],
            active: vec![
                campaign(3, CampaignKind::Reputation, 200),
                campaign(4, CampaignKind::Green, 300),
            ],
        };

        let picks = plan_renewals(&c, 1_000);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].id, 1);
    }

    #[test]
    fn earlier_types_consume_the_budget() {
        let c = Campaigns {
            all: vec![
                campaign(1, CampaignKind::Reputation, 700),
                campaign(2, CampaignKind::Awareness, 400),
                campaign(3, CampaignKind::Awareness, 250),
                campaign(4, CampaignKind::Green, 100),
            ],
            active: vec![],
        };

        // 1000 -> reputation 700 -> awareness 250 (400 no longer fits) -> green skipped
        let picks: Vec<u64> = plan_renewals(&c, 1_000).iter().map(|c| c.id).collect();
        assert_eq!(picks, vec![1, 3]);
    }

    #[test]
    fn negative_cash_buys_nothing() {
        let c = Campaigns {
            all: vec![campaign(1, CampaignKind::Green, 0), campaign(2, CampaignKind::Green, 10)],
            active: vec![],
        };

        let picks = plan_renewals(&c, -50);
        assert_eq!(picks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
    }

    fn any_kind() -> impl Strategy<Value = CampaignKind> {
        prop_oneof![
            Just(CampaignKind::Reputation),
            Just(CampaignKind::Awareness),
            Just(CampaignKind::Green),
        ]
    }

    proptest! {
        #[test]
        fn picks_never_overspend(
            catalogue in prop::collection::vec((any_kind(), 0u64..5_000), 0..20),
            active in prop::collection::vec(any_kind(), 0..3),
            cash in -1_000i64..10_000,
        ) {
            let all: Vec<Campaign> = catalogue
                .iter()
                .enumerate()
                .map(|(i, (k, p))| campaign(i as u64, *k, *p))
                .collect();
            let active: Vec<Campaign> = active
                .into_iter()
                .enumerate()
                .map(|(i, k)| campaign(1_000 + i as u64, k, 0))
                .collect();
            let c = Campaigns { all, active };

            let picks = plan_renewals(&c, cash);
            let spent: u64 = picks.iter().map(|p| p.price).sum();

            prop_assert!(spent <= u64::try_from(cash).unwrap_or(0));
            // one per inactive type at most, never an active one
            let inactive = c.inactive_kinds();
            for p in &picks {
                prop_assert!(inactive.contains(&p.kind));
                prop_assert_eq!(picks.iter().filter(|q| q.kind == p.kind).count(), 1);
            }
        }
    }
}
