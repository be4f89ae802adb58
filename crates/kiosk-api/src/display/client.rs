// Display REST client
//
// Wraps `reqwest::Client` with the display endpoint's URL scheme and
// response classification. The API key rides along as a default header
// so every request carries it without call sites touching secrets.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::display::KioskRoute;
use crate::display::models::DisplayResponse;
use crate::error::Error;
use crate::transport::TransportConfig;

const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the kiosk display endpoint.
///
/// `GET {base}/api/v1/organization/{org}/parkings/{parking}/kiosks/{kiosk}/display`
#[derive(Debug, Clone)]
pub struct DisplayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DisplayClient {
    /// Create a client that authenticates with `api_key` on every request.
    pub fn new(base_url: Url, api_key: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| Error::Authentication {
            message: "API key contains characters not allowed in an HTTP header".into(),
        })?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Headers (including the API key) are whatever that client was built with.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The display API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the display URL for a kiosk.
    ///
    /// Routing ids are pushed as path segments, so they are percent-encoded
    /// rather than spliced in raw.
    pub fn display_url(&self, route: &KioskRoute) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .extend(["api", "v1", "organization", route.org_id.as_str()])
                .extend(["parkings", route.parking_id.as_str()]);
            if let Some(kiosk_id) = route.kiosk_id.as_deref() {
                segments.extend(["kiosks", kiosk_id]);
            }
            segments.push("display");
        }
        Ok(url)
    }

    /// Fetch the current display state for a kiosk.
    pub async fn fetch_display(&self, route: &KioskRoute) -> Result<DisplayResponse, Error> {
        let url = self.display_url(route)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("display API rejected the API key (HTTP {})", status.as_u16()),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_owned()
                } else {
                    body
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
