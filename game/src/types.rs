use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Depletable bunker resource that can be rebought.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commodity {
    Fuel,
    Co2,
}

impl Commodity {
    pub const ALL: [Commodity; 2] = [Commodity::Fuel, Commodity::Co2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Commodity::Fuel => "fuel",
            Commodity::Co2 => "co2",
        }
    }

    /// Human label used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Commodity::Fuel => "Fuel",
            Commodity::Co2 => "CO2",
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time bunker state. Levels and capacities are in tonnes,
/// prices are per tonne.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BunkerSnapshot {
    pub fuel: u64,
    pub fuel_capacity: u64,
    pub co2: u64,
    pub co2_capacity: u64,
    pub cash: i64,
    pub fuel_price: f64,
    pub co2_price: f64,
    /// When the snapshot was taken (ms since epoch).
    pub ts_ms: u64,
}

impl BunkerSnapshot {
    pub fn level(&self, kind: Commodity) -> u64 {
        match kind {
            Commodity::Fuel => self.fuel,
            Commodity::Co2 => self.co2,
        }
    }

    pub fn capacity(&self, kind: Commodity) -> u64 {
        match kind {
            Commodity::Fuel => self.fuel_capacity,
            Commodity::Co2 => self.co2_capacity,
        }
    }

    pub fn price(&self, kind: Commodity) -> f64 {
        match kind {
            Commodity::Fuel => self.fuel_price,
            Commodity::Co2 => self.co2_price,
        }
    }

    /// Free tank space; never negative even if the game reports overfill.
    pub fn available_space(&self, kind: Commodity) -> u64 {
        self.capacity(kind).saturating_sub(self.level(kind))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselStatus {
    InPort,
    Enroute,
    Pending,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: u64,
    pub name: String,
    /// Wear percentage in `[0, 100]`.
    pub wear: f64,
    pub status: VesselStatus,
    pub is_parked: bool,
}

impl Vessel {
    /// In port and not parked by the player.
    pub fn can_depart(&self) -> bool {
        self.status == VesselStatus::InPort && !self.is_parked
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    Reputation,
    Awareness,
    Green,
}

impl CampaignKind {
    /// Renewal order within one pass.
    pub const ALL: [CampaignKind; 3] = [
        CampaignKind::Reputation,
        CampaignKind::Awareness,
        CampaignKind::Green,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignKind::Reputation => "reputation",
            CampaignKind::Awareness => "awareness",
            CampaignKind::Green => "green",
        }
    }
}

impl fmt::Display for CampaignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: u64,
    pub kind: CampaignKind,
    pub price: u64,
    pub active_until: Option<DateTime<Utc>>,
}

/// Campaign catalogue plus the ones currently running.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Campaigns {
    pub all: Vec<Campaign>,
    pub active: Vec<Campaign>,
}

impl Campaigns {
    /// Kinds with no running campaign, in [`CampaignKind::ALL`] order.
    pub fn inactive_kinds(&self) -> Vec<CampaignKind> {
        CampaignKind::ALL
            .into_iter()
            .filter(|k| !self.active.iter().any(|c| c.kind == *k))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub kind: Commodity,
    pub amount: u64,
    /// Cash after the purchase, when the game reports it.
    pub cash_after: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartSummary {
    pub departed_count: u32,
    pub fuel_used: f64,
    pub co2_emitted: f64,
    pub income: i64,
    pub harbor_fee: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepairQuote {
    pub vessel_id: u64,
    pub wear_cost: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairReceipt {
    pub repaired_count: u32,
    pub total_cost: u64,
}
