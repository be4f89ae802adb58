// Display REST surface
//
// One endpoint: the current display (layout + pricing + occupancy) of a
// kiosk. The routing triple is shared with the notification topic.

pub mod client;
pub mod models;

pub use client::DisplayClient;

use serde::{Deserialize, Serialize};

/// Routing identifiers of a kiosk. Opaque strings; only presence is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KioskRoute {
    pub org_id: String,
    pub parking_id: String,
    /// Absent for parking-wide displays.
    #[serde(default)]
    pub kiosk_id: Option<String>,
}

impl KioskRoute {
    pub fn new(org_id: impl Into<String>, parking_id: impl Into<String>, kiosk_id: Option<String>) -> Self {
        Self {
            org_id: org_id.into(),
            parking_id: parking_id.into(),
            kiosk_id: kiosk_id.filter(|k| !k.is_empty()),
        }
    }
}
