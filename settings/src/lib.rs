//! Durable per-account automation settings.
//!
//! One writer ([`SettingsStore::set`]) persists the document and then pushes
//! the whole resulting document to every subscriber. The
//! [`SettingsBroadcaster`] turns those pushes into a channel connected viewers
//! can follow.

pub mod broadcast;
pub mod db;
pub mod error;
pub mod memory;
pub mod model;
pub mod patch;
pub mod repository;
pub mod repository_sqlx;
pub mod store;

pub use broadcast::{SettingsBroadcaster, ViewerConnection, ViewerId};
pub use error::SettingsError;
pub use model::{Configuration, RebuyRule, RepairPolicy};
pub use patch::ConfigurationPatch;
pub use store::{ChangeOrigin, SettingsChange, SettingsStore, SubscriptionId};
