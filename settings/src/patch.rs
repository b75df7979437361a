//! Partial settings writes.
//!
//! A patch is whatever JSON object a viewer sent. Fields are coerced one by
//! one: a malformed value falls back to that field's default, unknown keys are
//! ignored, and the write as a whole is never rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::{Configuration, RepairPolicy};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationPatch(Map<String, Value>);

impl From<Map<String, Value>> for ConfigurationPatch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl ConfigurationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper, mostly for callers that construct patches in code.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies the patch on top of `base`, returning the new document and the
    /// keys that had to be replaced by defaults. `version` is never patchable.
    pub fn apply(&self, base: &Configuration) -> (Configuration, Vec<&'static str>) {
        let defaults = Configuration::default();
        let mut next = base.clone();
        let mut coerced = Vec::new();

        for (key, value) in &self.0 {
            let Some(field) = Field::from_key(key) else {
                if key != "version" {
                    debug!(field = %key, "ignoring unknown settings field");
                }
                continue;
            };

            if !field.assign(&mut next, value, &defaults) {
                warn!(
                    field = field.key(),
                    value = %value,
                    "malformed settings value; falling back to default"
                );
                coerced.push(field.key());
            }
        }

        (next, coerced)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    FuelThreshold,
    Co2Threshold,
    MaintenanceThreshold,
    AutoRebuyFuel,
    AutoRebuyFuelUseAlert,
    AutoRebuyFuelThreshold,
    AutoRebuyCo2,
    AutoRebuyCo2UseAlert,
    AutoRebuyCo2Threshold,
    AutoDepartAll,
    AutoBulkRepair,
    AutoCampaignRenewal,
    EnableNotifications,
    RepairPolicy,
}

impl Field {
    const ALL: [Field; 14] = [
        Field::FuelThreshold,
        Field::Co2Threshold,
        Field::MaintenanceThreshold,
        Field::AutoRebuyFuel,
        Field::AutoRebuyFuelUseAlert,
        Field::AutoRebuyFuelThreshold,
        Field::AutoRebuyCo2,
        Field::AutoRebuyCo2UseAlert,
        Field::AutoRebuyCo2Threshold,
        Field::AutoDepartAll,
        Field::AutoBulkRepair,
        Field::AutoCampaignRenewal,
        Field::EnableNotifications,
        Field::RepairPolicy,
    ];

    fn key(self) -> &'static str {
        match self {
            Field::FuelThreshold => "fuelThreshold",
            Field::Co2Threshold => "co2Threshold",
            Field::MaintenanceThreshold => "maintenanceThreshold",
            Field::AutoRebuyFuel => "autoRebuyFuel",
            Field::AutoRebuyFuelUseAlert => "autoRebuyFuelUseAlert",
            Field::AutoRebuyFuelThreshold => "autoRebuyFuelThreshold",
            Field::AutoRebuyCo2 => "autoRebuyCo2",
            Field::AutoRebuyCo2UseAlert => "autoRebuyCo2UseAlert",
            Field::AutoRebuyCo2Threshold => "autoRebuyCo2Threshold",
            Field::AutoDepartAll => "autoDepartAll",
            Field::AutoBulkRepair => "autoBulkRepair",
            Field::AutoCampaignRenewal => "autoCampaignRenewal",
            Field::EnableNotifications => "enableNotifications",
            Field::RepairPolicy => "repairPolicy",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Returns `false` when the value was malformed and the default was used.
    fn assign(self, cfg: &mut Configuration, value: &Value, d: &Configuration) -> bool {
        match self {
            Field::FuelThreshold => set(&mut cfg.fuel_threshold, price(value), d.fuel_threshold),
            Field::Co2Threshold => set(&mut cfg.co2_threshold, price(value), d.co2_threshold),
            Field::MaintenanceThreshold => set(
                &mut cfg.maintenance_threshold,
                percentage(value),
                d.maintenance_threshold,
            ),
            Field::AutoRebuyFuel => set(&mut cfg.auto_rebuy_fuel, flag(value), d.auto_rebuy_fuel),
            Field::AutoRebuyFuelUseAlert => set(
                &mut cfg.auto_rebuy_fuel_use_alert,
                flag(value),
                d.auto_rebuy_fuel_use_alert,
            ),
            Field::AutoRebuyFuelThreshold => set(
                &mut cfg.auto_rebuy_fuel_threshold,
                price(value),
                d.auto_rebuy_fuel_threshold,
            ),
            Field::AutoRebuyCo2 => set(&mut cfg.auto_rebuy_co2, flag(value), d.auto_rebuy_co2),
            Field::AutoRebuyCo2UseAlert => set(
                &mut cfg.auto_rebuy_co2_use_alert,
                flag(value),
                d.auto_rebuy_co2_use_alert,
            ),
            Field::AutoRebuyCo2Threshold => set(
                &mut cfg.auto_rebuy_co2_threshold,
                price(value),
                d.auto_rebuy_co2_threshold,
            ),
            Field::AutoDepartAll => set(&mut cfg.auto_depart_all, flag(value), d.auto_depart_all),
            Field::AutoBulkRepair => {
                set(&mut cfg.auto_bulk_repair, flag(value), d.auto_bulk_repair)
            }
            Field::AutoCampaignRenewal => set(
                &mut cfg.auto_campaign_renewal,
                flag(value),
                d.auto_campaign_renewal,
            ),
            Field::EnableNotifications => set(
                &mut cfg.enable_notifications,
                flag(value),
                d.enable_notifications,
            ),
            Field::RepairPolicy => set(
                &mut cfg.repair_policy,
                value.as_str().and_then(RepairPolicy::parse),
                d.repair_policy,
            ),
        }
    }
}

fn set<T>(slot: &mut T, parsed: Option<T>, default: T) -> bool {
    match parsed {
        Some(v) => {
            *slot = v;
            true
        }
        None => {
            *slot = default;
            false
        }
    }
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn price(value: &Value) -> Option<f64> {
    number(value).filter(|n| *n >= 0.0)
}

fn percentage(value: &Value) -> Option<f64> {
    number(value).filter(|n| (0.0..=100.0).contains(n))
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(v: Value) -> ConfigurationPatch {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn field_keys_match_serialized_document() {
        let doc = serde_json::to_value(Configuration::default()).unwrap();
        let obj = doc.as_object().unwrap();

        for f in Field::ALL {
            assert!(obj.contains_key(f.key()), "missing key {}", f.key());
        }
        // every serialized key except version is patchable
        assert_eq!(obj.len(), Field::ALL.len() + 1);
    }

    #[test]
    fn absent_fields_keep_current_values() {
        let base = Configuration {
            fuel_threshold: 333.0,
            auto_depart_all: true,
            ..Default::default()
        };

        let (next, coerced) = patch(json!({ "autoRebuyFuel": true })).apply(&base);

        assert!(coerced.is_empty());
        assert!(next.auto_rebuy_fuel);
        assert_eq!(next.fuel_threshold, 333.0);
        assert!(next.auto_depart_all);
    }

    #[test]
    fn malformed_field_falls_back_to_default_without_rejecting_others() {
        let base = Configuration {
            co2_threshold: 3.0,
            ..Default::default()
        };

        let (next, coerced) = patch(json!({
            "co2Threshold": -5,
            "fuelThreshold": "375.5",
            "autoBulkRepair": "yes please",
            "autoDepartAll": 1
        }))
        .apply(&base);

        assert_eq!(next.co2_threshold, 7.0);
        assert_eq!(next.fuel_threshold, 375.5);
        assert!(!next.auto_bulk_repair);
        assert!(next.auto_depart_all);

        let mut coerced = coerced;
        coerced.sort();
        assert_eq!(coerced, vec!["autoBulkRepair", "co2Threshold"]);
    }

    #[test]
    fn maintenance_threshold_must_be_a_percentage() {
        let (next, coerced) =
            patch(json!({ "maintenanceThreshold": 150 })).apply(&Configuration::default());
        assert_eq!(next.maintenance_threshold, 10.0);
        assert_eq!(coerced, vec!["maintenanceThreshold"]);

        let (next, _) = patch(json!({ "maintenanceThreshold": 55 })).apply(&next);
        assert_eq!(next.maintenance_threshold, 55.0);
    }

    #[test]
    fn unknown_keys_and_version_are_ignored() {
        let base = Configuration {
            version: 9,
            ..Default::default()
        };

        let (next, coerced) = patch(json!({ "version": 100, "theme": "dark" })).apply(&base);

        assert!(coerced.is_empty());
        assert_eq!(next, base);
    }

    #[test]
    fn repair_policy_parses_known_names_only() {
        let (next, _) =
            patch(json!({ "repairPolicy": "anyWear" })).apply(&Configuration::default());
        assert_eq!(next.repair_policy, RepairPolicy::AnyWear);

        let (next, coerced) = patch(json!({ "repairPolicy": "whenever" })).apply(&next);
        assert_eq!(next.repair_policy, RepairPolicy::AtThreshold);
        assert_eq!(coerced, vec!["repairPolicy"]);
    }

    #[test]
    fn builder_produces_equivalent_patch() {
        let built = ConfigurationPatch::new()
            .with("autoRebuyCo2", true)
            .with("autoRebuyCo2Threshold", 6.5);

        assert_eq!(
            built,
            patch(json!({ "autoRebuyCo2": true, "autoRebuyCo2Threshold": 6.5 }))
        );
        assert!(!built.is_empty());
    }
}
