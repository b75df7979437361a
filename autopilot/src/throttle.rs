use rand::Rng;

use crate::jitter::JitterRange;

/// Per-check-type run gate.
///
/// Each call draws a fresh interval from `range`; the check runs only when at
/// least that long has passed since its previous run. The first call always
/// runs.
#[derive(Clone, Debug)]
pub struct CheckThrottle {
    range: JitterRange,
    last_run_ms: Option<u64>,
}

impl CheckThrottle {
    pub fn new(range: JitterRange) -> Self {
        Self {
            range,
            last_run_ms: None,
        }
    }

    pub fn last_run_ms(&self) -> Option<u64> {
        self.last_run_ms
    }

    /// Returns `true` and records `now_ms` as the last run when the check is due.
    pub fn should_run(&mut self, now_ms: u64, rng: &mut impl Rng) -> bool {
        let interval = self.range.sample(rng).as_millis() as u64;

        if let Some(last) = self.last_run_ms {
            if now_ms.saturating_sub(last) < interval {
                return false;
            }
        }

        self.last_run_ms = Some(now_ms);
        true
    }
}
