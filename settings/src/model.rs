use game::Commodity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::ConfigurationPatch;

/// Which vessels qualify for an automatic bulk repair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepairPolicy {
    /// Any vessel with wear above zero.
    AnyWear,
    /// Vessels whose wear reached `maintenanceThreshold`.
    AtThreshold,
}

impl RepairPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairPolicy::AnyWear => "anyWear",
            RepairPolicy::AtThreshold => "atThreshold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "anyWear" => Some(RepairPolicy::AnyWear),
            "atThreshold" => Some(RepairPolicy::AtThreshold),
            _ => None,
        }
    }
}

/// The per-account automation document.
///
/// Readers always hold an `Arc<Configuration>` snapshot; the store replaces
/// the whole value on every write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Bumped by the store on every successful write.
    pub version: u64,

    /// Alert price thresholds (per tonne).
    pub fuel_threshold: f64,
    pub co2_threshold: f64,
    /// Wear percentage at which a vessel counts as due for maintenance.
    pub maintenance_threshold: f64,

    pub auto_rebuy_fuel: bool,
    pub auto_rebuy_fuel_use_alert: bool,
    pub auto_rebuy_fuel_threshold: f64,

    pub auto_rebuy_co2: bool,
    pub auto_rebuy_co2_use_alert: bool,
    pub auto_rebuy_co2_threshold: f64,

    pub auto_depart_all: bool,
    pub auto_bulk_repair: bool,
    pub auto_campaign_renewal: bool,
    pub enable_notifications: bool,

    pub repair_policy: RepairPolicy,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version: 0,
            fuel_threshold: 400.0,
            co2_threshold: 7.0,
            maintenance_threshold: 10.0,
            auto_rebuy_fuel: false,
            auto_rebuy_fuel_use_alert: true,
            auto_rebuy_fuel_threshold: 400.0,
            auto_rebuy_co2: false,
            auto_rebuy_co2_use_alert: true,
            auto_rebuy_co2_threshold: 7.0,
            auto_depart_all: false,
            auto_bulk_repair: false,
            auto_campaign_renewal: false,
            enable_notifications: true,
            repair_policy: RepairPolicy::AtThreshold,
        }
    }
}

/// Effective rebuy settings for one commodity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RebuyRule {
    pub enabled: bool,
    pub threshold: f64,
    pub uses_alert: bool,
}

impl Configuration {
    /// When `useAlert` is on the alert threshold wins and the custom value is inert.
    pub fn rebuy_rule(&self, kind: Commodity) -> RebuyRule {
        let (enabled, uses_alert, alert, custom) = match kind {
            Commodity::Fuel => (
                self.auto_rebuy_fuel,
                self.auto_rebuy_fuel_use_alert,
                self.fuel_threshold,
                self.auto_rebuy_fuel_threshold,
            ),
            Commodity::Co2 => (
                self.auto_rebuy_co2,
                self.auto_rebuy_co2_use_alert,
                self.co2_threshold,
                self.auto_rebuy_co2_threshold,
            ),
        };

        RebuyRule {
            enabled,
            threshold: if uses_alert { alert } else { custom },
            uses_alert,
        }
    }

    /// Rebuilds a document from whatever was stored.
    ///
    /// Each field is coerced on its own, so one corrupted value does not
    /// discard the rest; anything that is not a JSON object yields defaults.
    pub fn from_document(doc: &Value) -> Self {
        let Value::Object(map) = doc else {
            tracing::warn!("stored settings document is not an object; using defaults");
            return Self::default();
        };

        let (mut cfg, _) = ConfigurationPatch::from(map.clone()).apply(&Self::default());
        cfg.version = map.get("version").and_then(Value::as_u64).unwrap_or(0);
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn use_alert_makes_custom_threshold_inert() {
        let cfg = Configuration {
            fuel_threshold: 400.0,
            auto_rebuy_fuel: true,
            auto_rebuy_fuel_use_alert: true,
            auto_rebuy_fuel_threshold: 250.0,
            ..Default::default()
        };

        let rule = cfg.rebuy_rule(Commodity::Fuel);
        assert!(rule.enabled);
        assert!(rule.uses_alert);
        assert_eq!(rule.threshold, 400.0);
    }

    #[test]
    fn custom_threshold_applies_without_alert() {
        let cfg = Configuration {
            co2_threshold: 7.0,
            auto_rebuy_co2: true,
            auto_rebuy_co2_use_alert: false,
            auto_rebuy_co2_threshold: 5.5,
            ..Default::default()
        };

        let rule = cfg.rebuy_rule(Commodity::Co2);
        assert!(!rule.uses_alert);
        assert_eq!(rule.threshold, 5.5);
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let v = serde_json::to_value(Configuration::default()).unwrap();
        let obj = v.as_object().unwrap();

        assert!(obj.contains_key("autoRebuyCo2UseAlert"));
        assert!(obj.contains_key("maintenanceThreshold"));
        assert_eq!(obj["repairPolicy"], json!("atThreshold"));
    }

    #[test]
    fn document_round_trips_with_version() {
        let cfg = Configuration {
            version: 12,
            auto_depart_all: true,
            fuel_threshold: 512.5,
            ..Default::default()
        };

        let doc = serde_json::to_value(&cfg).unwrap();
        assert_eq!(Configuration::from_document(&doc), cfg);
    }

    #[test]
    fn non_object_document_yields_defaults() {
        assert_eq!(
            Configuration::from_document(&json!([1, 2, 3])),
            Configuration::default()
        );
        assert_eq!(
            Configuration::from_document(&Value::Null),
            Configuration::default()
        );
    }

    #[test]
    fn one_corrupt_field_keeps_the_others() {
        let doc = json!({
            "version": 3,
            "fuelThreshold": "not-a-number",
            "autoDepartAll": true,
            "co2Threshold": 9.0
        });

        let cfg = Configuration::from_document(&doc);
        assert_eq!(cfg.version, 3);
        assert_eq!(cfg.fuel_threshold, 400.0);
        assert!(cfg.auto_depart_all);
        assert_eq!(cfg.co2_threshold, 9.0);
    }
}
