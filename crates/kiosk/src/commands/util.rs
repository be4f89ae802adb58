//! Shared helpers for command handlers.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use kiosk_core::convert::snapshot_from_response;
use kiosk_core::{DisplayResponse, DisplaySnapshot, Kiosk, KioskConfig, OccupancyMode};

use crate::cli::{GlobalOpts, SourceArgs};
use crate::config;
use crate::error::CliError;

/// A snapshot plus the occupancy prices should be resolved with.
pub struct Loaded {
    pub snapshot: Arc<DisplaySnapshot>,
    pub mode: OccupancyMode,
}

impl Loaded {
    pub fn occupancy(&self) -> f64 {
        self.mode.occupancy(Some(&self.snapshot))
    }
}

/// `--occupancy` if given, else `fallback`.
pub fn occupancy_mode(flag: Option<f64>, fallback: OccupancyMode) -> OccupancyMode {
    flag.map_or(fallback, OccupancyMode::Fixed)
}

/// Load display data from `--file` (offline) or the live API.
pub async fn load(source: &SourceArgs, global: &GlobalOpts) -> Result<Loaded, CliError> {
    if let Some(ref path) = source.file {
        return Ok(Loaded {
            snapshot: Arc::new(read_display_file(path)?),
            mode: occupancy_mode(source.occupancy, OccupancyMode::Live),
        });
    }

    let cfg = config::resolve_kiosk_config(global)?;
    let mode = occupancy_mode(source.occupancy, cfg.occupancy);
    let snapshot = fetch_once(cfg).await?;
    Ok(Loaded { snapshot, mode })
}

/// Parse a saved `GET .../display` body.
pub fn read_display_file(path: &Path) -> Result<DisplaySnapshot, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let response: DisplayResponse = serde_json::from_str(&contents)?;
    Ok(snapshot_from_response(response, Utc::now()))
}

/// One fetch through a throwaway session, bounded by the HTTP timeout.
pub async fn fetch_once(cfg: KioskConfig) -> Result<Arc<DisplaySnapshot>, CliError> {
    let timeout = cfg.timeout;
    let kiosk = Kiosk::from_config(cfg)?;

    tokio::time::timeout(timeout, kiosk.refresh())
        .await
        .map_err(|_| CliError::Timeout {
            seconds: timeout.as_secs(),
        })??;

    kiosk.snapshot().ok_or_else(|| CliError::ApiError {
        status: "internal".into(),
        message: "display fetched but no snapshot was published".into(),
    })
}
