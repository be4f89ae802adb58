// ── Domain model ──
//
// Canonical pricing and snapshot types, decoupled from the wire shapes in
// `kiosk_api::display::models`. Conversion lives in `crate::convert`.

pub mod language;
pub mod pricing;
pub mod snapshot;

pub use language::Language;
pub use pricing::{
    EntryPrice, EntryPricing, HourlyPricing, Module, PackageInfo, PriceTier, Pricing,
    PricingPackage, TimedPrice,
};
pub use snapshot::DisplaySnapshot;
