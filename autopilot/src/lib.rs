//! Autonomous action scheduler for one game account.
//!
//! Two entry points drive everything:
//! - [`Autopilot::on_price_update`], called by the poller on every fresh
//!   bunker snapshot (event driven rebuy),
//! - [`Autopilot::start`], which launches the jittered scheduler loop running
//!   the periodic depart / repair / campaign checks.
//!
//! Every cash-spending action goes through one shared [`ActionLock`].

pub mod checks;
pub mod config;
pub mod error;
pub mod feedback;
pub mod guard;
pub mod jitter;
pub mod live_config;
pub mod metrics;
pub mod poller;
pub mod rebuy;
pub mod scheduler;
pub mod service;
pub mod throttle;

pub use checks::{CheckKind, CheckOutcome, PeriodicChecks};
pub use config::{AppConfig, Timing};
pub use error::CheckError;
pub use feedback::{Feedback, LogNotifier};
pub use guard::{ActionGuard, ActionLock};
pub use jitter::JitterRange;
pub use live_config::LiveConfig;
pub use metrics::counters::Counters;
pub use rebuy::{RebuyController, RebuyDecision, RebuyOutcome, RebuyReport};
pub use scheduler::{Scheduler, SchedulerState};
pub use service::Autopilot;
