use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::api::GameApi;
use crate::errors::GameError;
use crate::types::{
    BunkerSnapshot, Campaigns, Commodity, DepartSummary, PurchaseReceipt, RepairQuote,
    RepairReceipt, Vessel,
};
use crate::wire::{
    BulkRepairWire, BunkerWire, CampaignsWire, DepartWire, Envelope, MaintenanceWire,
    PurchaseWire, VesselsWire,
};

const GET_BUNKER: &str = "/api/bunker/get-prices";
const PURCHASE_FUEL: &str = "/api/bunker/purchase-fuel";
const PURCHASE_CO2: &str = "/api/bunker/purchase-co2";
const GET_VESSELS: &str = "/api/vessel/get-all-user-vessels";
const DEPART_ALL: &str = "/api/route/depart-all";
const MAINTENANCE_COST: &str = "/api/maintenance/get-maintenance-cost";
const BULK_REPAIR: &str = "/api/maintenance/do-wear-maintenance-bulk";
const GET_CAMPAIGNS: &str = "/api/marketing-campaign/get-marketing";
const ACTIVATE_CAMPAIGN: &str = "/api/marketing-campaign/activate-marketing";

/// HTTP implementation of [`GameApi`] authenticated by a session cookie.
#[derive(Clone)]
pub struct GameClient {
    http: Client,
    base_url: String,
}

impl GameClient {
    pub fn new(
        base_url: impl Into<String>,
        session_cookie: &str,
        timeout: Duration,
    ) -> Result<Self, GameError> {
        let mut headers = HeaderMap::new();
        let cookie = HeaderValue::from_str(&format!("shipping_manager_session={session_cookie}"))
            .map_err(|e| GameError::InvalidResponse(format!("invalid session cookie: {e}")))?;
        headers.insert(COOKIE, cookie);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: Value,
    ) -> Result<T, GameError> {
        self.send(endpoint, body)
            .await?
            .ok_or_else(|| GameError::InvalidResponse(format!("{endpoint}: missing data")))
    }

    /// Sends one command and unwraps the envelope; `data` may legitimately be absent.
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: Value,
    ) -> Result<Option<T>, GameError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let envelope: Envelope<T> = resp.json().await?;

        if let Some(message) = envelope.error {
            return Err(GameError::Api { endpoint, message });
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl GameApi for GameClient {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_bunker_snapshot(&self) -> Result<BunkerSnapshot, GameError> {
        let wire: BunkerWire = self.post(GET_BUNKER, json!({})).await?;
        let ts_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let snapshot = wire.into_snapshot(ts_ms);

        debug!(
            fuel_price = snapshot.fuel_price,
            co2_price = snapshot.co2_price,
            cash = snapshot.cash,
            "bunker snapshot fetched"
        );

        Ok(snapshot)
    }

    #[instrument(skip(self), level = "debug")]
    async fn purchase_commodity(
        &self,
        kind: Commodity,
        amount: u64,
    ) -> Result<PurchaseReceipt, GameError> {
        let endpoint = match kind {
            Commodity::Fuel => PURCHASE_FUEL,
            Commodity::Co2 => PURCHASE_CO2,
        };

        let wire: Option<PurchaseWire> = self.send(endpoint, json!({ "amount": amount })).await?;

        Ok(PurchaseReceipt {
            kind,
            amount,
            cash_after: wire.and_then(|w| w.cash),
        })
    }

    async fn fetch_vessels(&self) -> Result<Vec<Vessel>, GameError> {
        let wire: VesselsWire = self.post(GET_VESSELS, json!({})).await?;
        Ok(wire.vessels.into_iter().map(Vessel::from).collect())
    }

    async fn depart_all(&self) -> Result<DepartSummary, GameError> {
        let wire: DepartWire = self.post(DEPART_ALL, json!({})).await?;
        Ok(wire.into())
    }

    async fn fetch_maintenance_cost(
        &self,
        vessel_ids: &[u64],
    ) -> Result<Vec<RepairQuote>, GameError> {
        let wire: MaintenanceWire = self
            .post(MAINTENANCE_COST, json!({ "vessel_ids": vessel_ids }))
            .await?;
        Ok(wire.vessels.into_iter().map(RepairQuote::from).collect())
    }

    async fn perform_bulk_repair(&self, vessel_ids: &[u64]) -> Result<RepairReceipt, GameError> {
        let wire: BulkRepairWire = self
            .post(BULK_REPAIR, json!({ "vessel_ids": vessel_ids }))
            .await?;
        Ok(wire.into())
    }

    async fn fetch_campaigns(&self) -> Result<Campaigns, GameError> {
        let wire: CampaignsWire = self.post(GET_CAMPAIGNS, json!({})).await?;
        Ok(wire.into())
    }

    async fn activate_campaign(&self, campaign_id: u64) -> Result<(), GameError> {
        let _: Option<Value> = self
            .send(ACTIVATE_CAMPAIGN, json!({ "campaign_id": campaign_id }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = GameClient::new("https://game.example/", "abc", Duration::from_secs(5)).unwrap();
        assert_eq!(c.base_url, "https://game.example");
    }

    #[test]
    fn control_characters_in_cookie_are_rejected() {
        let err = GameClient::new("https://game.example", "bad\nvalue", Duration::from_secs(5))
            .err()
            .expect("cookie with newline must be rejected");
        assert!(matches!(err, GameError::InvalidResponse(_)));
    }
}
