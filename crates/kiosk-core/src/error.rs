// ── Core error types ──
//
// Errors surfaced by kiosk-core. The renderer never sees these: the
// resolver degrades to the sentinel and the sync client only logs. They
// reach operators through the CLI and through `Kiosk::refresh`.
// The `From<kiosk_api::Error>` impl sorts wire failures into connection,
// protocol and fetch buckets.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach {target}: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Notification broker disconnected")]
    Disconnected,

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Fetch errors ─────────────────────────────────────────────────
    #[error("Display fetch failed: {message}")]
    Fetch {
        message: String,
        /// HTTP status code (if the backend answered).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<kiosk_api::Error> for CoreError {
    fn from(err: kiosk_api::Error) -> Self {
        match err {
            kiosk_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            kiosk_api::Error::Transport(ref e) => CoreError::ConnectionFailed {
                target: e
                    .url()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "<unknown>".into()),
                reason: e.to_string(),
            },
            kiosk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            kiosk_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("URL cannot be used as an API base: {url}"),
            },
            kiosk_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                target: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            kiosk_api::Error::Api { status, message } => CoreError::Fetch {
                message,
                status: Some(status),
            },
            kiosk_api::Error::Deserialization { message, body: _ } => CoreError::Fetch {
                message: format!("unreadable display payload: {message}"),
                status: None,
            },
            kiosk_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                target: "notification broker".into(),
                reason,
            },
            kiosk_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                target: "notification broker".into(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            kiosk_api::Error::HandshakeTimeout { timeout_ms } => CoreError::ConnectionFailed {
                target: "notification broker".into(),
                reason: format!("handshake timed out after {timeout_ms}ms"),
            },
            kiosk_api::Error::HeartbeatTimeout { window_ms } => CoreError::ConnectionFailed {
                target: "notification broker".into(),
                reason: format!("no heart-beat within {window_ms}ms"),
            },
            kiosk_api::Error::Stomp { message, details } => CoreError::Protocol {
                message: if details.trim().is_empty() {
                    message
                } else {
                    format!("{message}: {}", details.trim())
                },
            },
            kiosk_api::Error::Frame(message) => CoreError::Protocol { message },
        }
    }
}
