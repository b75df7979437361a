use std::str::FromStr;
use std::time::Duration;

use crate::checks::CheckWindows;
use crate::jitter::JitterRange;

/// Cadences of everything that runs on a timer.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    /// Delay between `start()` and the first scheduler tick.
    pub warm_up: Duration,

    /// Sleep between two scheduler ticks, drawn fresh every cycle.
    pub tick: JitterRange,

    /// Per-check minimum intervals. Independent of `tick`: a fast scheduler
    /// still never runs a check more often than its window.
    pub checks: CheckWindows,

    /// Delay between two bunker refreshes in the price poller.
    pub price_poll: JitterRange,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            warm_up: Duration::from_secs(10),
            tick: JitterRange::from_secs(60, 180),
            checks: CheckWindows::default(),
            price_poll: JitterRange::from_secs(30, 35),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string for the settings document.
    pub database_url: String,

    /// Account the automation acts for. One process drives one account.
    pub account_id: String,

    // =========================
    // Game connection
    // =========================
    /// Base URL of the game API, without trailing slash.
    pub game_base_url: String,

    /// Value of the game's session cookie.
    ///
    /// Obtaining it (login, browser session extraction) happens outside this
    /// process.
    pub game_session_cookie: String,

    /// Client-side timeout for every game request.
    ///
    /// The scheduler never cancels an in-flight action itself; a hung request
    /// holds the action lock until this expires.
    pub http_timeout: Duration,

    // =========================
    // Automation
    // =========================
    pub timing: Timing,

    /// Buffered settings events per viewer before it has to resync.
    pub viewer_channel_capacity: usize,

    /// JSON logs instead of the human-readable format.
    pub is_production: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Timing::default();

        Self {
            database_url: env_or("DATABASE_URL", "sqlite://autopilot_dev.db?mode=rwc".to_string()),
            account_id: env_or("ACCOUNT_ID", "default".to_string()),

            game_base_url: env_or("GAME_BASE_URL", "https://shippingmanager.cc".to_string()),
            game_session_cookie: env_or("GAME_SESSION_COOKIE", String::new()),
            http_timeout: Duration::from_millis(env_or("HTTP_TIMEOUT_MS", 15_000)),

            timing: Timing {
                warm_up: Duration::from_millis(env_or(
                    "AUTOPILOT_WARM_UP_MS",
                    defaults.warm_up.as_millis() as u64,
                )),
                ..defaults
            },

            viewer_channel_capacity: env_or("VIEWER_CHANNEL_CAPACITY", 64),
            is_production: std::env::var("APP_ENV").unwrap_or_default() == "production",
        }
    }
}

/// Reads `key`, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_matches_documented_cadences() {
        let t = Timing::default();

        assert_eq!(t.tick.min(), Duration::from_secs(60));
        assert_eq!(t.tick.max(), Duration::from_secs(180));
        assert_eq!(t.checks.depart.max(), Duration::from_secs(120));
        assert_eq!(t.checks.campaign.min(), Duration::from_secs(120));
        assert_eq!(t.price_poll.max(), Duration::from_secs(35));
    }

    #[test]
    fn unparsable_values_fall_back() {
        assert_eq!(env_or::<u64>("AUTOPILOT_TEST_SURELY_UNSET_KEY", 7), 7);
    }
}
