//! JSON shapes exchanged with the game's HTTP API.
//!
//! Only the fields the scheduler reads are modelled; everything else in the
//! game's responses is ignored by serde.

use chrono::DateTime;
use serde::Deserialize;

use crate::types::{
    BunkerSnapshot, Campaign, CampaignKind, Campaigns, DepartSummary, RepairQuote, RepairReceipt,
    Vessel, VesselStatus,
};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BunkerWire {
    pub fuel: f64,
    pub max_fuel: f64,
    pub co2: f64,
    pub max_co2: f64,
    pub cash: i64,
    pub fuel_price: f64,
    pub co2_price: f64,
}

impl BunkerWire {
    pub fn into_snapshot(self, ts_ms: u64) -> BunkerSnapshot {
        // The game reports fractional tonnes; only whole tonnes can be bought.
        BunkerSnapshot {
            fuel: self.fuel.max(0.0).floor() as u64,
            fuel_capacity: self.max_fuel.max(0.0).floor() as u64,
            co2: self.co2.max(0.0).floor() as u64,
            co2_capacity: self.max_co2.max(0.0).floor() as u64,
            cash: self.cash,
            fuel_price: self.fuel_price,
            co2_price: self.co2_price,
            ts_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurchaseWire {
    pub cash: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VesselsWire {
    pub vessels: Vec<VesselWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VesselWire {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub wear: f64,
    pub status: String,
    #[serde(default)]
    pub is_parked: bool,
}

impl From<VesselWire> for Vessel {
    fn from(w: VesselWire) -> Self {
        let status = match w.status.as_str() {
            "port" => VesselStatus::InPort,
            "enroute" => VesselStatus::Enroute,
            _ => VesselStatus::Pending,
        };

        Vessel {
            id: w.id,
            name: w.name,
            wear: w.wear.clamp(0.0, 100.0),
            status,
            is_parked: w.is_parked,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartWire {
    pub vessel_count: u32,
    #[serde(default)]
    pub fuel_usage: f64,
    #[serde(default)]
    pub co2_emission: f64,
    #[serde(default)]
    pub depart_income: i64,
    #[serde(default)]
    pub harbor_fee: i64,
}

impl From<DepartWire> for DepartSummary {
    fn from(w: DepartWire) -> Self {
        DepartSummary {
            departed_count: w.vessel_count,
            fuel_used: w.fuel_usage,
            co2_emitted: w.co2_emission,
            income: w.depart_income,
            harbor_fee: w.harbor_fee,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaintenanceWire {
    pub vessels: Vec<MaintenanceCostWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaintenanceCostWire {
    pub vessel_id: u64,
    pub cost: u64,
}

impl From<MaintenanceCostWire> for RepairQuote {
    fn from(w: MaintenanceCostWire) -> Self {
        RepairQuote {
            vessel_id: w.vessel_id,
            wear_cost: w.cost,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkRepairWire {
    pub count: u32,
    pub total_cost: u64,
}

impl From<BulkRepairWire> for RepairReceipt {
    fn from(w: BulkRepairWire) -> Self {
        RepairReceipt {
            repaired_count: w.count,
            total_cost: w.total_cost,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CampaignsWire {
    pub marketing_campaigns: Vec<CampaignWire>,
    #[serde(default)]
    pub active_campaigns: Vec<CampaignWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CampaignWire {
    pub id: u64,
    pub option_name: String,
    pub price: u64,
    /// Unix seconds.
    pub end_time: Option<i64>,
}

impl CampaignWire {
    fn into_campaign(self) -> Option<Campaign> {
        let kind = match self.option_name.as_str() {
            "reputation" => CampaignKind::Reputation,
            "awareness" => CampaignKind::Awareness,
            "green" => CampaignKind::Green,
            other => {
                tracing::debug!(option_name = other, "ignoring unknown campaign type");
                return None;
            }
        };

        Some(Campaign {
            id: self.id,
            kind,
            price: self.price,
            active_until: self.end_time.and_then(|s| DateTime::from_timestamp(s, 0)),
        })
    }
}

impl From<CampaignsWire> for Campaigns {
    fn from(w: CampaignsWire) -> Self {
        Campaigns {
            all: w
                .marketing_campaigns
                .into_iter()
                .filter_map(CampaignWire::into_campaign)
                .collect(),
            active: w
                .active_campaigns
                .into_iter()
                .filter_map(CampaignWire::into_campaign)
                .collect(),
        }
    }
}
