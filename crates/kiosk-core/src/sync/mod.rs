// ── Display sync client ──
//
// Keeps a subscription to the kiosk's notification topic and turns every
// message into a re-fetch trigger. `machine` holds the pure state machine,
// `client` drives it on a tokio task.

pub mod client;
pub mod machine;
pub mod policy;
pub mod topic;

pub use client::{RefetchTrigger, SyncClient};
pub use machine::{ConnectionState, SyncAction, SyncMachine, SyncStatus};
pub use policy::ReconnectPolicy;
pub use topic::{DEFAULT_TOPIC_PREFIX, Topic};
