//! Remote game surface consumed by the automation core.
//!
//! The scheduler only ever talks to the game through [`GameApi`]; the
//! [`GameClient`] is the HTTP implementation used by the binary.

pub mod api;
pub mod client;
pub mod errors;
pub mod types;
pub mod view;
mod wire;

pub use api::{GameApi, Notifier};
pub use client::GameClient;
pub use errors::GameError;
pub use types::*;
pub use view::BunkerView;
