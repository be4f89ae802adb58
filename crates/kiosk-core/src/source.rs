// Re-fetch collaborator seam.

use async_trait::async_trait;

use kiosk_api::KioskRoute;
use kiosk_api::display::models::DisplayResponse;

use crate::error::CoreError;

/// Where display state comes from.
///
/// [`DisplayClient`](kiosk_api::DisplayClient) is the production source;
/// tests use canned responses.
#[async_trait]
pub trait DisplaySource: Send + Sync + 'static {
    async fn fetch_display(&self, route: &KioskRoute) -> Result<DisplayResponse, CoreError>;
}

#[async_trait]
impl DisplaySource for kiosk_api::DisplayClient {
    async fn fetch_display(&self, route: &KioskRoute) -> Result<DisplayResponse, CoreError> {
        Ok(kiosk_api::DisplayClient::fetch_display(self, route).await?)
    }
}
