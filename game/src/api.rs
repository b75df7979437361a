use async_trait::async_trait;

use crate::errors::GameError;
use crate::types::{
    BunkerSnapshot, Campaigns, Commodity, DepartSummary, PurchaseReceipt, RepairQuote,
    RepairReceipt, Vessel,
};

/// Everything the automation core asks of the remote game.
///
/// Implementations own transport concerns (session cookie, timeouts, retries
/// at the socket level). A non-success response must surface as an `Err`.
#[async_trait]
pub trait GameApi: Send + Sync + 'static {
    async fn fetch_bunker_snapshot(&self) -> Result<BunkerSnapshot, GameError>;

    async fn purchase_commodity(
        &self,
        kind: Commodity,
        amount: u64,
    ) -> Result<PurchaseReceipt, GameError>;

    async fn fetch_vessels(&self) -> Result<Vec<Vessel>, GameError>;

    async fn depart_all(&self) -> Result<DepartSummary, GameError>;

    async fn fetch_maintenance_cost(
        &self,
        vessel_ids: &[u64],
    ) -> Result<Vec<RepairQuote>, GameError>;

    async fn perform_bulk_repair(&self, vessel_ids: &[u64]) -> Result<RepairReceipt, GameError>;

    async fn fetch_campaigns(&self) -> Result<Campaigns, GameError>;

    async fn activate_campaign(&self, campaign_id: u64) -> Result<(), GameError>;
}

/// Best-effort user notification sink.
///
/// Delivery may silently no-op (e.g. the viewer never granted permission);
/// callers log failures and move on.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify_user(&self, title: &str, body: &str) -> anyhow::Result<()>;
}
