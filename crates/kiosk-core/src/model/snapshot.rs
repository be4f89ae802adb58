use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PricingPackage;

/// Everything a render pass needs, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    /// Layout document, passed through to the renderer untouched.
    pub config: Option<serde_json::Value>,
    pub packages: Vec<PricingPackage>,
    /// Occupancy percentage reported with the display. 0 when absent.
    pub occupancy: f64,
    pub fetched_at: DateTime<Utc>,
    /// Assigned by the store on publish; 0 until then.
    pub version: u64,
}

impl DisplaySnapshot {
    pub fn has_pricing(&self) -> bool {
        !self.packages.is_empty()
    }
}
