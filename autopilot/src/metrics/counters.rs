use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    pub price_updates: Arc<AtomicU64>,
    pub purchases: Arc<AtomicU64>,
    pub purchase_failures: Arc<AtomicU64>,

    // rebuy skip reasons
    pub rebuy_skip_disabled: Arc<AtomicU64>,
    pub rebuy_skip_price: Arc<AtomicU64>,
    pub rebuy_skip_locked: Arc<AtomicU64>,
    pub rebuy_skip_full: Arc<AtomicU64>,
    pub rebuy_skip_funds: Arc<AtomicU64>,
    pub rebuy_skip_invalid: Arc<AtomicU64>,

    pub scheduler_ticks: Arc<AtomicU64>,
    pub checks_run: Arc<AtomicU64>,
    pub checks_throttled: Arc<AtomicU64>,
    pub check_failures: Arc<AtomicU64>,

    pub departures: Arc<AtomicU64>,
    pub repairs: Arc<AtomicU64>,
    pub campaigns_activated: Arc<AtomicU64>,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
