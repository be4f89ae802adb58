// ── Wire-to-domain conversion ──
//
// Bridges `kiosk_api::display::models` into `crate::model`. Module bodies
// are decoded per tag here; anything unknown or malformed is skipped with
// a debug log so one bad module never blanks the whole screen.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use kiosk_api::display::models::{
    DisplayResponse, EntryRow, HourlyData, HourlyItem, MODULE_ENTRY, MODULE_HOURLY,
    MODULE_PACKAGE_INFO, PackageInfoData, PricePackage, RawModule,
};

use crate::model::{
    DisplaySnapshot, EntryPrice, EntryPricing, HourlyPricing, Module, PackageInfo, PriceTier,
    Pricing, PricingPackage, TimedPrice,
};

const PRICING_DYNAMIC: &str = "DYNAMIC";

// ── Helpers ────────────────────────────────────────────────────────

/// Item ids arrive as numbers or strings; normalize to text.
fn id_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn as_amount(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode a pricing value according to its declared type.
///
/// `DYNAMIC` keeps whatever tiers parse (a non-list becomes an empty
/// ladder, which evaluates to 0). Every other type is treated as a fixed
/// amount and yields `None` when that amount is not numeric.
fn convert_pricing(pricing_type: &str, raw: &Value) -> Option<Pricing> {
    if pricing_type == PRICING_DYNAMIC {
        let tiers = match raw {
            Value::Array(items) => items.iter().filter_map(convert_tier).collect(),
            _ => Vec::new(),
        };
        return Some(Pricing::Dynamic(tiers));
    }
    as_amount(raw).map(Pricing::Static)
}

fn convert_tier(raw: &Value) -> Option<PriceTier> {
    let percent = raw.get("percent").and_then(as_amount)?;
    let pricing = raw.get("pricing").and_then(as_amount)?;
    Some(PriceTier { percent, pricing })
}

// ── Items ──────────────────────────────────────────────────────────

fn convert_timed(item: &HourlyItem) -> Option<TimedPrice> {
    let Some(pricing) = convert_pricing(&item.pricing_type, &item.pricing) else {
        debug!(id = %item.id, pricing_type = %item.pricing_type, "dropping hourly item without numeric price");
        return None;
    };
    Some(TimedPrice {
        id: id_text(&item.id),
        minutes: item.minutes.unwrap_or(f64::NAN),
        pricing,
    })
}

fn convert_entry(row: &EntryRow) -> Option<EntryPrice> {
    let Some(pricing) = convert_pricing(&row.pricing_type, &row.pricing) else {
        debug!(id = %row.id, pricing_type = %row.pricing_type, "dropping entry row without numeric price");
        return None;
    };
    Some(EntryPrice {
        id: id_text(&row.id),
        pricing,
    })
}

// ── Modules ────────────────────────────────────────────────────────

impl From<&HourlyData> for HourlyPricing {
    fn from(data: &HourlyData) -> Self {
        Self {
            maximums: data.maximums.iter().filter_map(convert_timed).collect(),
            units: data.units.iter().filter_map(convert_timed).collect(),
        }
    }
}

impl From<PackageInfoData> for PackageInfo {
    fn from(data: PackageInfoData) -> Self {
        Self {
            title: present(data.title),
            line1: present(data.line1),
            line2: present(data.line2),
        }
    }
}

/// Drop `null` translations; they read as missing.
fn present(lines: HashMap<String, Option<String>>) -> HashMap<String, String> {
    lines
        .into_iter()
        .filter_map(|(lang, text)| text.map(|t| (lang, t)))
        .collect()
}

/// Decode one tagged module. `None` for unknown tags or bodies that do
/// not match their tag.
pub fn convert_module(raw: &RawModule) -> Option<Module> {
    let decoded = match raw.kind.as_str() {
        MODULE_HOURLY => serde_json::from_value::<HourlyData>(raw.data.clone())
            .map(|data| Module::HourlyPricing(HourlyPricing::from(&data))),
        MODULE_ENTRY => serde_json::from_value::<Vec<EntryRow>>(raw.data.clone()).map(|rows| {
            Module::EntryPricing(EntryPricing {
                rows: rows.iter().filter_map(convert_entry).collect(),
            })
        }),
        MODULE_PACKAGE_INFO => serde_json::from_value::<PackageInfoData>(raw.data.clone())
            .map(|data| Module::PackageInfo(data.into())),
        other => {
            debug!(kind = other, "skipping unknown module type");
            return None;
        }
    };

    match decoded {
        Ok(module) => Some(module),
        Err(e) => {
            debug!(kind = %raw.kind, error = %e, "skipping malformed module");
            None
        }
    }
}

impl From<&PricePackage> for PricingPackage {
    fn from(pkg: &PricePackage) -> Self {
        Self::new(pkg.data.modules.iter().filter_map(convert_module).collect())
    }
}

/// Build a snapshot from a display response. The version is left at 0
/// for the store to assign.
pub fn snapshot_from_response(resp: DisplayResponse, fetched_at: DateTime<Utc>) -> DisplaySnapshot {
    DisplaySnapshot {
        packages: resp.price_packages.iter().map(PricingPackage::from).collect(),
        occupancy: resp.occupancy.unwrap_or(0.0),
        config: resp.config,
        fetched_at,
        version: 0,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn raw(kind: &str, data: Value) -> RawModule {
        RawModule {
            kind: kind.into(),
            data,
        }
    }

    #[test]
    fn hourly_module_with_mixed_ids_and_types() {
        let module = convert_module(&raw(
            MODULE_HOURLY,
            json!({
                "Maximums": [
                    { "Id": 1, "Minutes": 30, "PricingType": "STATIC", "Pricing": 12.5 },
                    { "Id": "day", "Minutes": 1440, "PricingType": "DYNAMIC",
                      "Pricing": [{ "percent": 80, "pricing": 30 }, { "percent": 0, "pricing": 20 }] }
                ],
                "Units": [{ "Id": 2, "PricingType": "STATIC", "Pricing": "3.25" }]
            }),
        ))
        .unwrap();

        let Module::HourlyPricing(hourly) = module else {
            panic!("expected hourly module");
        };
        assert_eq!(hourly.maximums.len(), 2);
        assert_eq!(hourly.maximums[0].id, "1");
        assert_eq!(hourly.maximums[0].pricing, Pricing::Static(12.5));
        assert_eq!(hourly.maximums[1].id, "day");
        assert_eq!(
            hourly.maximums[1].pricing,
            Pricing::Dynamic(vec![
                PriceTier { percent: 80.0, pricing: 30.0 },
                PriceTier { percent: 0.0, pricing: 20.0 },
            ])
        );
        assert!(hourly.units[0].minutes.is_nan());
        assert_eq!(hourly.units[0].pricing, Pricing::Static(3.25));
    }

    #[test]
    fn static_item_without_number_is_dropped() {
        let module = convert_module(&raw(
            MODULE_ENTRY,
            json!([
                { "id": 1, "pricingType": "STATIC", "pricing": null },
                { "id": 2, "pricingType": "STATIC", "pricing": 8 }
            ]),
        ))
        .unwrap();

        let Module::EntryPricing(entry) = module else {
            panic!("expected entry module");
        };
        assert_eq!(entry.rows.len(), 1);
        assert_eq!(entry.rows[0].id, "2");
    }

    #[test]
    fn dynamic_with_non_list_becomes_empty_ladder() {
        assert_eq!(convert_pricing("DYNAMIC", &json!(5)), Some(Pricing::Dynamic(vec![])));
    }

    #[test]
    fn null_translation_keeps_the_rest_of_the_info_module() {
        let module = convert_module(&raw(
            MODULE_PACKAGE_INFO,
            json!({ "title": { "fr": null, "en": "Day" }, "line1": { "fr": "Ligne" } }),
        ));

        let Some(Module::PackageInfo(info)) = module else {
            panic!("expected a package info module");
        };
        assert_eq!(info.title(crate::model::Language::En), Some("Day"));
        assert_eq!(info.title(crate::model::Language::Fr), None);
        assert_eq!(info.line1.get("fr").map(String::as_str), Some("Ligne"));
    }

    #[test]
    fn unknown_and_malformed_modules_are_skipped() {
        assert!(convert_module(&raw("SOMETHING_NEW", json!({}))).is_none());
        assert!(convert_module(&raw(MODULE_ENTRY, json!({ "not": "a list" }))).is_none());
    }

    #[test]
    fn snapshot_defaults_missing_occupancy() {
        let resp: DisplayResponse = serde_json::from_value(json!({
            "pricePackages": [{ "data": { "modules": [
                { "type": MODULE_PACKAGE_INFO, "data": { "title": { "fr": "Jour", "en": "Day" } } }
            ] } }]
        }))
        .unwrap();

        let snapshot = snapshot_from_response(resp, Utc::now());
        assert_eq!(snapshot.occupancy, 0.0);
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.packages.len(), 1);
        assert_eq!(
            snapshot.packages[0].info().and_then(|i| i.title(crate::model::Language::En)),
            Some("Day")
        );
    }
}
