// ── Pricing domain types ──
//
// A package is an ordered list of modules. Its position in the snapshot
// (1-based) is the id templates address it by, not anything embedded here.

use std::collections::HashMap;

use serde::Serialize;

use super::Language;

/// One `{percent, pricing}` rule of a dynamic price ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceTier {
    /// Occupancy threshold (inclusive) at which this tier applies.
    pub percent: f64,
    pub pricing: f64,
}

/// How an amount is determined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pricing {
    /// A fixed amount.
    Static(f64),
    /// Occupancy-driven ladder, evaluated first-match in list order.
    Dynamic(Vec<PriceTier>),
}

/// A maximum or a unit of an hourly module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedPrice {
    /// Item id in textual form (`1`, `"max-2"`).
    pub id: String,
    /// Duration covered. `NaN` when the backend omitted it.
    pub minutes: f64,
    pub pricing: Pricing,
}

/// A flat-rate row of an entry module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPrice {
    pub id: String,
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlyPricing {
    pub maximums: Vec<TimedPrice>,
    pub units: Vec<TimedPrice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryPricing {
    pub rows: Vec<EntryPrice>,
}

/// Bilingual package text, keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub title: HashMap<String, String>,
    pub line1: HashMap<String, String>,
    pub line2: HashMap<String, String>,
}

impl PackageInfo {
    pub fn title(&self, lang: Language) -> Option<&str> {
        self.title.get(lang.code()).map(String::as_str)
    }

    pub fn line1(&self, lang: Language) -> Option<&str> {
        self.line1.get(lang.code()).map(String::as_str)
    }

    pub fn line2(&self, lang: Language) -> Option<&str> {
        self.line2.get(lang.code()).map(String::as_str)
    }
}

/// A package module. Closed set; anything else is dropped at conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Module {
    HourlyPricing(HourlyPricing),
    EntryPricing(EntryPricing),
    PackageInfo(PackageInfo),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingPackage {
    pub modules: Vec<Module>,
}

impl PricingPackage {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    /// First package-information module, if any.
    pub fn info(&self) -> Option<&PackageInfo> {
        self.modules.iter().find_map(|m| match m {
            Module::PackageInfo(info) => Some(info),
            _ => None,
        })
    }
}
