// ── Runtime kiosk configuration ──
//
// Describes *what* kiosk to drive and *how* to reach its backend. Carries
// the API key and tuning knobs but never touches disk; `kiosk-config`
// builds one of these from profiles and environment.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

use kiosk_api::stomp::HeartBeat;
use kiosk_api::transport::{TlsMode, TransportConfig};
use kiosk_api::websocket::{StompConfig, StompTransport};
use kiosk_api::{DisplayClient, KioskRoute};

use crate::error::CoreError;
use crate::model::DisplaySnapshot;
use crate::sync::{DEFAULT_TOPIC_PREFIX, ReconnectPolicy, Topic};

/// Which occupancy figure drives dynamic prices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyMode {
    /// The occupancy reported with the current snapshot.
    #[default]
    Live,
    /// A fixed percentage regardless of what the backend reports.
    Fixed(f64),
}

impl OccupancyMode {
    /// Occupancy to resolve prices with. `Live` without a snapshot is 0.
    pub fn occupancy(self, snapshot: Option<&DisplaySnapshot>) -> f64 {
        match self {
            Self::Live => snapshot.map_or(0.0, |s| s.occupancy),
            Self::Fixed(value) => value,
        }
    }
}

/// Login headers for brokers that want them on `CONNECT`.
#[derive(Debug, Clone)]
pub struct BrokerCredentials {
    pub login: String,
    pub passcode: SecretString,
}

/// Configuration for one kiosk session.
///
/// Built by the CLI, passed to [`Kiosk`](crate::Kiosk).
#[derive(Debug, Clone)]
pub struct KioskConfig {
    /// Display API base URL.
    pub api_url: Url,
    /// Sent as `x-api-key`.
    pub api_key: SecretString,
    /// STOMP-over-WebSocket endpoint.
    pub broker_url: Url,
    /// Virtual host for `CONNECT` (defaults to the broker URL host).
    pub broker_host: Option<String>,
    pub broker_credentials: Option<BrokerCredentials>,
    pub route: KioskRoute,
    /// Prefix in front of `displays/...` in the STOMP destination.
    pub topic_prefix: String,
    pub occupancy: OccupancyMode,
    pub reconnect: ReconnectPolicy,
    pub heart_beat: HeartBeat,
    pub handshake_timeout: Duration,
    pub tls: TlsMode,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl KioskConfig {
    /// Config with default tuning for the given endpoints and kiosk.
    pub fn new(api_url: Url, api_key: SecretString, broker_url: Url, route: KioskRoute) -> Self {
        Self {
            api_url,
            api_key,
            broker_url,
            broker_host: None,
            broker_credentials: None,
            route,
            topic_prefix: DEFAULT_TOPIC_PREFIX.into(),
            occupancy: OccupancyMode::default(),
            reconnect: ReconnectPolicy::default(),
            heart_beat: HeartBeat::from_millis(4000, 4000),
            handshake_timeout: Duration::from_secs(10),
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn topic(&self) -> Topic {
        Topic::new(&self.route, &self.topic_prefix)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }

    /// HTTP client for the display endpoint.
    pub fn display_client(&self) -> Result<DisplayClient, CoreError> {
        Ok(DisplayClient::new(
            self.api_url.clone(),
            &self.api_key,
            &self.transport_config(),
        )?)
    }

    /// STOMP transport for the notification broker.
    pub fn stomp_transport(&self) -> StompTransport {
        let mut stomp = StompConfig::new(self.broker_url.clone());
        stomp.host.clone_from(&self.broker_host);
        stomp.heart_beat = self.heart_beat;
        stomp.handshake_timeout = self.handshake_timeout;
        if let Some(creds) = &self.broker_credentials {
            stomp.connect_headers.push(("login".into(), creds.login.clone()));
            stomp
                .connect_headers
                .push(("passcode".into(), creds.passcode.expose_secret().to_owned()));
        }
        StompTransport::new(stomp)
    }
}
