// ── Snapshot store ──
//
// Holds the current `DisplaySnapshot` behind an `ArcSwapOption`: readers
// never block and a publish is a single pointer swap, so overlapping
// fetches resolve as "last write wins". Every publish bumps a version on
// a `watch` channel that renderers use as their change signal. Once
// closed, the store stays empty.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use tokio::sync::watch;

use crate::config::OccupancyMode;
use crate::model::DisplaySnapshot;
use crate::resolver::resolve;

pub struct SnapshotStore {
    current: ArcSwapOption<DisplaySnapshot>,
    next_version: AtomicU64,
    closed: AtomicBool,
    version: watch::Sender<u64>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            current: ArcSwapOption::empty(),
            next_version: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            version,
        }
    }

    /// The snapshot current right now, if any fetch has landed.
    pub fn snapshot(&self) -> Option<Arc<DisplaySnapshot>> {
        self.current.load_full()
    }

    /// Publish a snapshot wholesale. Returns the version assigned to it,
    /// or `None` if the store has been closed.
    pub fn replace(&self, mut snapshot: DisplaySnapshot) -> Option<u64> {
        if self.is_closed() {
            return None;
        }
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        snapshot.version = version;
        self.current.store(Some(Arc::new(snapshot)));

        // A close that landed while we were swapping still wins.
        if self.is_closed() {
            self.current.store(None);
            return None;
        }
        self.version.send_replace(version);
        Some(version)
    }

    /// Drop the current snapshot and refuse every later publish (teardown).
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if self.current.swap(None).is_some() {
            self.version.send_modify(|_| {});
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Version of the last publish; changes on every `replace` and `close`.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// A text transform bound to the snapshot current at call time.
    ///
    /// With no snapshot it behaves as if no pricing were loaded: plain text
    /// passes through and anything with price tokens becomes the sentinel.
    pub fn formatter(&self, mode: OccupancyMode) -> impl Fn(&str) -> String + Send + Sync + 'static {
        let snapshot = self.snapshot();
        let occupancy = mode.occupancy(snapshot.as_deref());
        move |text: &str| match snapshot.as_deref() {
            Some(s) => resolve(text, &s.packages, occupancy),
            None => resolve(text, &[], occupancy),
        }
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{HourlyPricing, Module, Pricing, PricingPackage, TimedPrice};
    use crate::resolver::SENTINEL;

    fn snapshot(amount: f64, occupancy: f64) -> DisplaySnapshot {
        DisplaySnapshot {
            config: None,
            packages: vec![PricingPackage::new(vec![Module::HourlyPricing(HourlyPricing {
                maximums: vec![TimedPrice {
                    id: "1".into(),
                    minutes: 30.0,
                    pricing: Pricing::Static(amount),
                }],
                units: Vec::new(),
            })])],
            occupancy,
            fetched_at: Utc::now(),
            version: 0,
        }
    }

    #[test]
    fn replace_assigns_increasing_versions() {
        let store = SnapshotStore::new();
        let rx = store.subscribe();
        assert!(store.snapshot().is_none());

        assert_eq!(store.replace(snapshot(1.0, 0.0)), Some(1));
        assert_eq!(store.replace(snapshot(2.0, 0.0)), Some(2));
        assert_eq!(*rx.borrow(), 2);
        assert_eq!(store.snapshot().map(|s| s.version), Some(2));
    }

    #[test]
    fn formatter_is_bound_at_call_time() {
        let store = SnapshotStore::new();
        store.replace(snapshot(12.5, 0.0));
        let old = store.formatter(OccupancyMode::Live);

        store.replace(snapshot(20.0, 0.0));
        let new = store.formatter(OccupancyMode::Live);

        let token = "{package[1].maximums[1].pricing.en}";
        assert_eq!(old(token), "$12.50");
        assert_eq!(new(token), "$20.00");
    }

    #[test]
    fn formatter_without_snapshot() {
        let store = SnapshotStore::new();
        let f = store.formatter(OccupancyMode::Fixed(0.0));
        assert_eq!(f("Bienvenue"), "Bienvenue");
        assert_eq!(f("{package[1].info.title.fr}"), SENTINEL);
    }

    #[test]
    fn close_drops_snapshot_and_notifies() {
        let store = SnapshotStore::new();
        store.replace(snapshot(1.0, 0.0));
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.close();
        assert!(store.snapshot().is_none());
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn publish_after_close_is_dropped() {
        let store = SnapshotStore::new();
        store.close();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        assert_eq!(store.replace(snapshot(5.0, 0.0)), None);
        assert!(store.snapshot().is_none());
        assert!(!rx.has_changed().unwrap());
    }
}
