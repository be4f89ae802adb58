use thiserror::Error;

/// Top-level error type for the `kiosk-api` crate.
///
/// Covers every failure mode of the two wire surfaces: the display REST
/// endpoint and the STOMP notification channel. `kiosk-core` maps these
/// into its own taxonomy (transport, protocol, fetch).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The display API rejected the API key.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured base URL cannot carry path segments (`data:` URLs and friends).
    #[error("URL cannot be used as a base: {0}")]
    InvalidBaseUrl(String),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Display API ─────────────────────────────────────────────────
    /// Non-success response from the display endpoint.
    #[error("Display API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or the socket errored mid-stream.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed by the peer.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── STOMP ───────────────────────────────────────────────────────
    /// The CONNECT/CONNECTED exchange did not finish in time.
    #[error("STOMP handshake timed out after {timeout_ms}ms")]
    HandshakeTimeout { timeout_ms: u64 },

    /// Nothing was received within the negotiated heart-beat window.
    #[error("No heart-beat from broker within {window_ms}ms")]
    HeartbeatTimeout { window_ms: u64 },

    /// The broker sent an ERROR frame.
    #[error("STOMP error: {message}")]
    Stomp { message: String, details: String },

    /// A frame could not be parsed.
    #[error("Malformed STOMP frame: {0}")]
    Frame(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            Self::WebSocketConnect(_)
            | Self::WebSocketClosed { .. }
            | Self::HandshakeTimeout { .. }
            | Self::HeartbeatTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the broker rejected us at the STOMP layer rather
    /// than the socket failing underneath.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Stomp { .. } | Self::Frame(_))
    }
}
