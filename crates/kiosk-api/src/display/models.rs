// Wire types for the display endpoint.
//
// The backend mixes casing conventions: the envelope is camelCase, hourly
// items are PascalCase, entry rows are camelCase again. Module bodies are
// kept as raw JSON here and decoded per-tag by the core conversion layer,
// so an unknown or malformed module never fails the whole response.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Module tag for hourly maximums/units.
pub const MODULE_HOURLY: &str = "BASE_PRICING:HOURLY";
/// Module tag for flat entry rows.
pub const MODULE_ENTRY: &str = "BASE_PRICING:ENTRY";
/// Module tag for bilingual package text.
pub const MODULE_PACKAGE_INFO: &str = "PACKAGE_INFORMATION";

/// Body of `GET .../display`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayResponse {
    /// Declarative layout document. Either a single display config or a
    /// sequence of them; opaque to this workspace.
    #[serde(default)]
    pub config: Option<serde_json::Value>,

    /// Pricing packages in rendering order.
    #[serde(default)]
    pub price_packages: Vec<PricePackage>,

    /// Current occupancy percentage of the parking.
    #[serde(default)]
    pub occupancy: Option<f64>,
}

/// One pricing package. The interesting part sits under `data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricePackage {
    #[serde(default)]
    pub data: PackageData,

    /// Fields the kiosk does not use (names, ids, audit columns).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageData {
    #[serde(default)]
    pub modules: Vec<RawModule>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A tagged module with an undecoded body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawModule {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub data: serde_json::Value,
}

// ── Module bodies ────────────────────────────────────────────────────

/// Body of a `BASE_PRICING:HOURLY` module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyData {
    #[serde(rename = "Maximums", default)]
    pub maximums: Vec<HourlyItem>,

    #[serde(rename = "Units", default)]
    pub units: Vec<HourlyItem>,
}

/// A maximum or a unit inside an hourly module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyItem {
    /// Number or string depending on the backend version.
    #[serde(rename = "Id")]
    pub id: serde_json::Value,

    #[serde(rename = "Minutes", default)]
    pub minutes: Option<f64>,

    #[serde(rename = "PricingType", default)]
    pub pricing_type: String,

    /// A number for `STATIC`, a tier list for `DYNAMIC`.
    #[serde(rename = "Pricing", default)]
    pub pricing: serde_json::Value,
}

/// One row of a `BASE_PRICING:ENTRY` module (the module body is an array of these).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRow {
    pub id: serde_json::Value,

    #[serde(default)]
    pub pricing_type: String,

    #[serde(default)]
    pub pricing: serde_json::Value,
}

/// Body of a `PACKAGE_INFORMATION` module. Translations may be `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageInfoData {
    #[serde(default)]
    pub title: HashMap<String, Option<String>>,

    #[serde(default)]
    pub line1: HashMap<String, Option<String>>,

    #[serde(default)]
    pub line2: HashMap<String, Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_display_response() {
        let json = serde_json::json!({
            "config": { "width": 1920, "elements": [] },
            "occupancy": 42.5,
            "pricePackages": [{
                "id": "pkg-a",
                "data": {
                    "name": "Daily",
                    "modules": [
                        { "type": MODULE_HOURLY, "data": { "Maximums": [], "Units": [] } },
                        { "type": "SOMETHING_NEW", "data": null }
                    ]
                }
            }]
        });

        let resp: DisplayResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.occupancy, Some(42.5));
        assert_eq!(resp.price_packages.len(), 1);

        let pkg = &resp.price_packages[0];
        assert_eq!(pkg.extra["id"], "pkg-a");
        assert_eq!(pkg.data.extra["name"], "Daily");
        assert_eq!(pkg.data.modules[0].kind, MODULE_HOURLY);
        assert_eq!(pkg.data.modules[1].kind, "SOMETHING_NEW");
    }

    #[test]
    fn missing_fields_default() {
        let resp: DisplayResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.config.is_none());
        assert!(resp.price_packages.is_empty());
        assert!(resp.occupancy.is_none());
    }

    #[test]
    fn hourly_item_pascal_case() {
        let item: HourlyItem = serde_json::from_value(serde_json::json!({
            "Id": 3,
            "Minutes": 120,
            "PricingType": "DYNAMIC",
            "Pricing": [{ "percent": 80, "pricing": 10 }]
        }))
        .unwrap();

        assert_eq!(item.id, 3);
        assert_eq!(item.minutes, Some(120.0));
        assert_eq!(item.pricing_type, "DYNAMIC");

        assert_eq!(item.pricing[0]["percent"], 80);
        assert_eq!(item.pricing[0]["pricing"], 10);
    }

    #[test]
    fn package_info_accepts_null_translations() {
        let info: PackageInfoData = serde_json::from_value(serde_json::json!({
            "title": { "fr": null, "en": "Day" }
        }))
        .unwrap();

        assert_eq!(info.title.get("en"), Some(&Some("Day".to_owned())));
        assert_eq!(info.title.get("fr"), Some(&None));
    }
}
