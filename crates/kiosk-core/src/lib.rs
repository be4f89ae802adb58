// kiosk-core: pricing model, token resolver and display sync for kiosk screens.

pub mod calculator;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod kiosk;
pub mod model;
pub mod resolver;
pub mod source;
pub mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use calculator::resolve_amount;
pub use config::{BrokerCredentials, KioskConfig, OccupancyMode};
pub use error::CoreError;
pub use format::{format_cad, format_cad_short, format_duration};
pub use kiosk::Kiosk;
pub use model::{
    DisplaySnapshot, EntryPrice, EntryPricing, HourlyPricing, Language, Module, PackageInfo,
    PriceTier, Pricing, PricingPackage, TimedPrice,
};
pub use resolver::{SENTINEL, resolve};
pub use source::DisplaySource;
pub use store::SnapshotStore;
pub use sync::{ConnectionState, ReconnectPolicy, SyncClient, SyncStatus, Topic};

// Wire-layer types that appear in `KioskConfig` and saved display bodies.
pub use kiosk_api::display::models::DisplayResponse;
pub use kiosk_api::stomp::HeartBeat;
pub use kiosk_api::transport::TlsMode;
pub use kiosk_api::KioskRoute;
