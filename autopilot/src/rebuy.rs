//! Price-driven commodity rebuy.
//!
//! Runs on every bunker refresh rather than on a timer so a price drop is
//! acted on immediately. Fuel and CO2 are evaluated concurrently but share the
//! account's single [`ActionLock`]: while one purchase is in flight the other
//! commodity is skipped until the next price update.

use std::sync::Arc;
use std::time::Duration;

use common::logger::warn_if_slow;
use game::{BunkerSnapshot, Commodity, GameApi, PurchaseReceipt};
use settings::{Configuration, RebuyRule};
use tracing::{debug, info, instrument, warn};

use crate::error::CheckError;
use crate::feedback::Feedback;
use crate::guard::ActionLock;
use crate::metrics::counters::Counters;

/// What the threshold policy says about one commodity, before any locking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RebuyDecision {
    Disabled,
    /// Zero, negative or non-finite price in the snapshot.
    InvalidPrice,
    AboveThreshold { price: f64, threshold: f64 },
    TankFull,
    InsufficientFunds,
    Buy { amount: u64, price: f64 },
}

/// Greedy threshold rule.
///
/// Buys when `price <= threshold`, as much as fits in the tank and as much as
/// the cash covers, whichever is smaller.
pub fn plan_purchase(
    rule: &RebuyRule,
    snapshot: &BunkerSnapshot,
    kind: Commodity,
) -> RebuyDecision {
    if !rule.enabled {
        return RebuyDecision::Disabled;
    }

    let price = snapshot.price(kind);
    if !price.is_finite() || price <= 0.0 {
        return RebuyDecision::InvalidPrice;
    }

    if price > rule.threshold {
        return RebuyDecision::AboveThreshold {
            price,
            threshold: rule.threshold,
        };
    }

    let space = snapshot.available_space(kind);
    if space == 0 {
        return RebuyDecision::TankFull;
    }

    let affordable = if snapshot.cash > 0 {
        (snapshot.cash as f64 / price).floor() as u64
    } else {
        0
    };

    match space.min(affordable) {
        0 => RebuyDecision::InsufficientFunds,
        amount => RebuyDecision::Buy { amount, price },
    }
}

#[derive(Debug)]
pub enum RebuyOutcome {
    Skipped(RebuyDecision),
    /// Another action held the lock; nothing was attempted.
    Locked,
    Purchased(PurchaseReceipt),
    Failed(CheckError),
}

impl RebuyOutcome {
    pub fn purchased_amount(&self) -> Option<u64> {
        match self {
            RebuyOutcome::Purchased(r) => Some(r.amount),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct RebuyReport {
    pub fuel: RebuyOutcome,
    pub co2: RebuyOutcome,
}

impl RebuyReport {
    pub fn outcome(&self, kind: Commodity) -> &RebuyOutcome {
        match kind {
            Commodity::Fuel => &self.fuel,
            Commodity::Co2 => &self.co2,
        }
    }
}

#[derive(Clone)]
pub struct RebuyController {
    api: Arc<dyn GameApi>,
    lock: ActionLock,
    feedback: Feedback,
    counters: Counters,
}

impl RebuyController {
    pub fn new(
        api: Arc<dyn GameApi>,
        lock: ActionLock,
        feedback: Feedback,
        counters: Counters,
    ) -> Self {
        Self {
            api,
            lock,
            feedback,
            counters,
        }
    }

    /// Evaluates both commodities against `snapshot`.
    ///
    /// Never fails: every problem ends up in the returned report and the log.
    #[instrument(
        skip_all,
        target = "rebuy",
        fields(
            fuel_price = snapshot.fuel_price,
            co2_price = snapshot.co2_price,
            cash = snapshot.cash
        )
    )]
    pub async fn on_price_update(
        &self,
        cfg: &Configuration,
        snapshot: &BunkerSnapshot,
    ) -> RebuyReport {
        Counters::bump(&self.counters.price_updates);

        let (fuel, co2) = futures::join!(
            self.evaluate(cfg, snapshot, Commodity::Fuel),
            self.evaluate(cfg, snapshot, Commodity::Co2),
        );

        RebuyReport { fuel, co2 }
    }

    async fn evaluate(
        &self,
        cfg: &Configuration,
        snapshot: &BunkerSnapshot,
        kind: Commodity,
    ) -> RebuyOutcome {
        let rule = cfg.rebuy_rule(kind);

        if !rule.enabled {
            Counters::bump(&self.counters.rebuy_skip_disabled);
            return RebuyOutcome::Skipped(RebuyDecision::Disabled);
        }

        if self.lock.is_held() {
            Counters::bump(&self.counters.rebuy_skip_locked);
            debug!(%kind, "purchase in flight; skipping");
            return RebuyOutcome::Locked;
        }

        let (amount, price) = match plan_purchase(&rule, snapshot, kind) {
            RebuyDecision::Buy { amount, price } => (amount, price),
            other => {
                self.count_skip(&other);
                debug!(%kind, decision = ?other, "no rebuy");
                return RebuyOutcome::Skipped(other);
            }
        };

        // Another trigger may have won the race since the check above.
        let Some(guard) = self.lock.try_acquire() else {
            Counters::bump(&self.counters.rebuy_skip_locked);
            return RebuyOutcome::Locked;
        };

        let result = warn_if_slow("purchase_commodity", Duration::from_secs(2), async {
            self.api.purchase_commodity(kind, amount).await
        })
        .await;

        drop(guard);

        match result {
            Ok(receipt) => {
                Counters::bump(&self.counters.purchases);
                info!(%kind, amount, price, threshold = rule.threshold, "auto rebuy completed");

                self.feedback
                    .emit(
                        cfg,
                        &format!("{} purchased", kind.label()),
                        &format!("Bought {amount}t at ${price:.2}/t"),
                    )
                    .await;

                RebuyOutcome::Purchased(receipt)
            }
            Err(e) => {
                Counters::bump(&self.counters.purchase_failures);
                warn!(%kind, amount, error = %e, "auto rebuy failed");
                RebuyOutcome::Failed(e.into())
            }
        }
    }

    /// User-initiated purchase. Contends for the same lock as the automation
    /// and reports contention instead of waiting.
    #[instrument(skip(self, cfg), target = "rebuy")]
    pub async fn purchase(
        &self,
        cfg: &Configuration,
        kind: Commodity,
        amount: u64,
    ) -> Result<PurchaseReceipt, CheckError> {
        if amount == 0 {
            return Err(CheckError::EmptyPurchase);
        }

        let guard = self.lock.try_acquire().ok_or(CheckError::LockHeld)?;

        let receipt = warn_if_slow("purchase_commodity", Duration::from_secs(2), async {
            self.api.purchase_commodity(kind, amount).await
        })
        .await
        .inspect_err(|_| Counters::bump(&self.counters.purchase_failures))?;

        drop(guard);

        Counters::bump(&self.counters.purchases);
        info!(%kind, amount, "manual purchase completed");

        self.feedback
            .emit(
                cfg,
                &format!("{} purchased", kind.label()),
                &format!("Bought {amount}t"),
            )
            .await;

        Ok(receipt)
    }

    fn count_skip(&self, decision: &RebuyDecision) {
        let counter = match decision {
            RebuyDecision::Disabled => &self.counters.rebuy_skip_disabled,
            RebuyDecision::InvalidPrice => &self.counters.rebuy_skip_invalid,
            RebuyDecision::AboveThreshold { .. } => &self.counters.rebuy_skip_price,
            RebuyDecision::TankFull => &self.counters.rebuy_skip_full,
            RebuyDecision::InsufficientFunds => &self.counters.rebuy_skip_funds,
            RebuyDecision::Buy { .. } => return,
        };
        Counters::bump(counter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(fuel_price: f64, co2_price: f64) -> BunkerSnapshot {
        BunkerSnapshot {
            fuel: 3_000,
            fuel_capacity: 5_000,
            co2: 100,
            co2_capacity: 1_000,
            cash: 1_050_000,
            fuel_price,
            co2_price,
            ts_ms: 1,
        }
    }

    fn rule(threshold: f64) -> RebuyRule {
        RebuyRule {
            enabled: true,
            threshold,
            uses_alert: true,
        }
    }

    #[test]
    fn cheap_fuel_fills_the_tank() {
        // 2000t free, cash covers 3000t at 350
        let d = plan_purchase(&rule(400.0), &snapshot(350.0, 10.0), Commodity::Fuel);
        assert_eq!(
            d,
            RebuyDecision::Buy {
                amount: 2_000,
                price: 350.0
            }
        );
    }

    #[test]
    fn price_above_threshold_is_left_alone() {
        let d = plan_purchase(&rule(7.0), &snapshot(500.0, 8.0), Commodity::Co2);
        assert_eq!(
            d,
            RebuyDecision::AboveThreshold {
                price: 8.0,
                threshold: 7.0
            }
        );
    }

    #[test]
    fn price_equal_to_threshold_buys() {
        let d = plan_purchase(&rule(7.0), &snapshot(500.0, 7.0), Commodity::Co2);
        assert!(matches!(d, RebuyDecision::Buy { amount: 900, .. }));
    }

    #[test]
    fn cash_limits_the_amount() {
        let mut s = snapshot(400.0, 10.0);
        s.cash = 40_399;
        let d = plan_purchase(&rule(400.0), &s, Commodity::Fuel);
        assert_eq!(
            d,
            RebuyDecision::Buy {
                amount: 100,
                price: 400.0
            }
        );
    }

    #[test]
    fn full_tank_and_empty_wallet_are_no_ops() {
        let mut s = snapshot(300.0, 10.0);
        s.fuel = s.fuel_capacity;
        assert_eq!(plan_purchase(&rule(400.0), &s, Commodity::Fuel), RebuyDecision::TankFull);

        let mut s = snapshot(300.0, 10.0);
        s.cash = 299;
        assert_eq!(
            plan_purchase(&rule(400.0), &s, Commodity::Fuel),
            RebuyDecision::InsufficientFunds
        );

        s.cash = -5_000;
        assert_eq!(
            plan_purchase(&rule(400.0), &s, Commodity::Fuel),
            RebuyDecision::InsufficientFunds
        );
    }

    #[test]
    fn broken_prices_are_rejected() {
        for p in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                plan_purchase(&rule(400.0), &snapshot(p, 10.0), Commodity::Fuel),
                RebuyDecision::InvalidPrice
            );
        }
    }

    #[test]
    fn disabled_rule_wins_over_everything() {
        let r = RebuyRule {
            enabled: false,
            ..rule(1_000.0)
        };
        assert_eq!(
            plan_purchase(&r, &snapshot(1.0, 1.0), Commodity::Fuel),
            RebuyDecision::Disabled
        );
    }

    proptest! {
        #[test]
        fn buys_iff_price_at_or_below_threshold(
            price in 1.0f64..1_000.0,
            threshold in 1.0f64..1_000.0,
        ) {
            let d = plan_purchase(&rule(threshold), &snapshot(price, 10.0), Commodity::Fuel);
            if price <= threshold {
                let is_buy = matches!(d, RebuyDecision::Buy { .. });
                prop_assert!(is_buy);
            } else {
                let is_above = matches!(d, RebuyDecision::AboveThreshold { .. });
                prop_assert!(is_above);
            }
        }

        #[test]
        fn amount_is_min_of_space_and_affordable(
            level in 0u64..10_000,
            capacity in 0u64..10_000,
            cash in -1_000i64..5_000_000,
            price in 0.5f64..900.0,
        ) {
            let s = BunkerSnapshot {
                fuel: level,
                fuel_capacity: capacity,
                co2: 0,
                co2_capacity: 0,
                cash,
                fuel_price: price,
                co2_price: 1.0,
                ts_ms: 0,
            };

            let space = capacity.saturating_sub(level);
            let affordable = if cash > 0 { (cash as f64 / price).floor() as u64 } else { 0 };

            match plan_purchase(&rule(1_000.0), &s, Commodity::Fuel) {
                RebuyDecision::Buy { amount, .. } => {
                    prop_assert!(amount <= space);
                    prop_assert!(amount <= affordable);
                    prop_assert_eq!(amount, space.min(affordable));
                }
                RebuyDecision::TankFull => prop_assert_eq!(space, 0),
                RebuyDecision::InsufficientFunds => prop_assert_eq!(affordable, 0),
                other => prop_assert!(false, "unexpected decision {:?}", other),
            }
        }
    }
}
