// ── Kiosk session ──
//
// Ties the pieces together for one screen: the display source writes the
// snapshot store, the sync client only fires re-fetches, and renderers
// read through `text_formatter()`. Cheaply cloneable via `Arc<KioskInner>`.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use kiosk_api::KioskRoute;
use kiosk_api::notify::NotificationTransport;

use crate::config::KioskConfig;
use crate::convert::snapshot_from_response;
use crate::error::CoreError;
use crate::model::DisplaySnapshot;
use crate::source::DisplaySource;
use crate::store::SnapshotStore;
use crate::sync::{ConnectionState, SyncClient, SyncStatus};

/// The main entry point for a kiosk screen.
///
/// Does nothing until [`start()`](Self::start); [`refresh()`](Self::refresh)
/// can be used on its own for one-shot fetches.
#[derive(Clone)]
pub struct Kiosk {
    inner: Arc<KioskInner>,
}

struct KioskInner {
    config: KioskConfig,
    refresher: Refresher,
    cancel: CancellationToken,
    status_rx: watch::Receiver<SyncStatus>,
    /// Taken by `start()`; `None` once the sync client owns it.
    status_tx: Mutex<Option<watch::Sender<SyncStatus>>>,
    sync: tokio::sync::Mutex<Option<SyncClient>>,
}

/// Everything a re-fetch needs. Held by the sync trigger instead of the
/// `Kiosk` so the spawned task does not keep the session alive.
#[derive(Clone)]
struct Refresher {
    source: Arc<dyn DisplaySource>,
    store: Arc<SnapshotStore>,
    route: KioskRoute,
    cancel: CancellationToken,
}

impl Refresher {
    async fn refresh(&self) -> Result<Option<u64>, CoreError> {
        let response = self.source.fetch_display(&self.route).await?;

        if self.cancel.is_cancelled() {
            debug!("dropping display response that landed after shutdown");
            return Ok(None);
        }

        let snapshot = snapshot_from_response(response, Utc::now());
        let packages = snapshot.packages.len();
        let occupancy = snapshot.occupancy;
        let Some(version) = self.store.replace(snapshot) else {
            debug!("dropping display response that landed during shutdown");
            return Ok(None);
        };
        info!(version, packages, occupancy, "display snapshot updated");
        Ok(Some(version))
    }

    fn spawn_refresh(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.refresh().await {
                warn!(error = %e, "display refresh failed; keeping previous snapshot");
            }
        });
    }
}

impl Kiosk {
    /// Create a session. Does NOT fetch or connect.
    pub fn new(config: KioskConfig, source: impl DisplaySource) -> Self {
        let cancel = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(SyncStatus::default());
        let refresher = Refresher {
            source: Arc::new(source),
            store: Arc::new(SnapshotStore::new()),
            route: config.route.clone(),
            cancel: cancel.clone(),
        };

        Self {
            inner: Arc::new(KioskInner {
                config,
                refresher,
                cancel,
                status_rx,
                status_tx: Mutex::new(Some(status_tx)),
                sync: tokio::sync::Mutex::new(None),
            }),
        }
    }

    /// Session backed by the HTTP display client built from `config`.
    pub fn from_config(config: KioskConfig) -> Result<Self, CoreError> {
        let client = config.display_client()?;
        Ok(Self::new(config, client))
    }

    pub fn config(&self) -> &KioskConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.inner.refresher.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Initial fetch, then keep in sync through `transport`.
    ///
    /// A failed initial fetch is logged, not returned: the sync client
    /// still starts and the next notification retries it.
    pub async fn start<T: NotificationTransport>(&self, transport: T) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Disconnected);
        }
        let status_tx = self
            .inner
            .status_tx
            .lock()
            .map_err(|_| CoreError::Internal("kiosk state lock poisoned".into()))?
            .take()
            .ok_or_else(|| CoreError::Internal("kiosk already started".into()))?;

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial display fetch failed");
        }

        let refresher = self.inner.refresher.clone();
        let client = SyncClient::spawn(
            transport,
            self.inner.config.topic(),
            self.inner.config.reconnect,
            status_tx,
            Arc::new(move || refresher.spawn_refresh()),
            self.inner.cancel.child_token(),
        );
        *self.inner.sync.lock().await = Some(client);
        Ok(())
    }

    /// Fetch the display once and publish it. `Ok(None)` when the
    /// response arrived after shutdown and was dropped.
    pub async fn refresh(&self) -> Result<Option<u64>, CoreError> {
        self.inner.refresher.refresh().await
    }

    /// Fire-and-forget refresh; failures are logged.
    pub fn request_refresh(&self) {
        self.inner.refresher.spawn_refresh();
    }

    /// Ask the sync client to connect now (after exhaustion, or to skip a
    /// pending backoff wait).
    pub async fn reconnect_now(&self) {
        if let Some(sync) = self.inner.sync.lock().await.as_ref() {
            sync.reconnect_now();
        }
    }

    /// Stop syncing and drop the snapshot. Idempotent.
    pub async fn shutdown(&self) {
        let first = !self.inner.cancel.is_cancelled();
        self.inner.cancel.cancel();

        let sync = self.inner.sync.lock().await.take();
        if let Some(sync) = sync {
            sync.shutdown().await;
        }
        self.inner.refresher.store.close();

        if first {
            info!("kiosk session shut down");
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.status_rx.borrow().state
    }

    pub fn sync_status(&self) -> SyncStatus {
        *self.inner.status_rx.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_rx.clone()
    }

    pub fn snapshot(&self) -> Option<Arc<DisplaySnapshot>> {
        self.inner.refresher.store.snapshot()
    }

    /// Snapshot version channel: changes on every publish.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.refresher.store.subscribe()
    }

    /// The renderer's text transform, bound to the current snapshot.
    pub fn text_formatter(&self) -> impl Fn(&str) -> String + Send + Sync + 'static {
        self.inner.refresher.store.formatter(self.inner.config.occupancy)
    }
}
