//! STOMP-over-WebSocket notification transport.
//!
//! Opens a WebSocket to the broker, performs the STOMP `CONNECT` /
//! `CONNECTED` handshake, subscribes to one destination and then yields
//! [`SessionEvent`]s. Heart-beats are negotiated per STOMP 1.2 and kept up
//! inside [`StompSession::next_event`]. Reconnection is *not* handled here;
//! that policy belongs to the sync client in `kiosk-core`.
//!
//! # Example
//!
//! ```rust,ignore
//! use kiosk_api::notify::{NotificationSession, NotificationTransport, SessionEvent};
//! use kiosk_api::websocket::{StompConfig, StompTransport};
//!
//! let transport = StompTransport::new(StompConfig::new("wss://broker.example/ws".parse()?));
//! let mut session = transport.open("/topic/displays/org/parking/7").await?;
//!
//! while let SessionEvent::Message(note) = session.next_event().await {
//!     println!("display changed: {}", note.body);
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::notify::{Notification, NotificationSession, NotificationTransport, SessionEvent};
use crate::stomp::{Command, Frame, HeartBeat, decode_message};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The only subscription a kiosk ever holds.
const SUBSCRIPTION_ID: &str = "sub-0";

/// Silence tolerated before declaring the broker dead, as a multiple of
/// the negotiated incoming heart-beat.
const HEARTBEAT_GRACE_FACTOR: u32 = 2;

// ── StompConfig ──────────────────────────────────────────────────────

/// Connection settings for the STOMP broker.
#[derive(Debug, Clone)]
pub struct StompConfig {
    /// WebSocket endpoint, e.g. `wss://api.example.com/ws`.
    pub url: Url,

    /// Virtual host sent in the `host` header. Defaults to the URL host.
    pub host: Option<String>,

    /// Heart-beat intervals we offer. Default: 4s both ways.
    pub heart_beat: HeartBeat,

    /// Budget for WebSocket upgrade + `CONNECTED`. Default: 10s.
    pub handshake_timeout: Duration,

    /// Extra `CONNECT` headers (`login`, `passcode`, broker-specific keys).
    pub connect_headers: Vec<(String, String)>,
}

impl StompConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            host: None,
            heart_beat: HeartBeat::from_millis(4000, 4000),
            handshake_timeout: Duration::from_secs(10),
            connect_headers: Vec::new(),
        }
    }

    fn virtual_host(&self) -> String {
        self.host
            .clone()
            .or_else(|| self.url.host_str().map(str::to_owned))
            .unwrap_or_else(|| "/".into())
    }
}

// ── StompTransport ───────────────────────────────────────────────────

/// Production [`NotificationTransport`] speaking STOMP 1.2 over WebSocket.
#[derive(Debug, Clone)]
pub struct StompTransport {
    config: StompConfig,
}

impl StompTransport {
    pub fn new(config: StompConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StompConfig {
        &self.config
    }

    async fn handshake(&self, destination: &str) -> Result<StompSession, Error> {
        info!(url = %self.config.url, "Connecting to STOMP broker");

        let uri: tungstenite::http::Uri = self
            .config
            .url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

        let (ws_stream, _response) = tokio_tungstenite::connect_async(ClientRequestBuilder::new(uri))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        let mut connect = Frame::new(Command::Connect)
            .header("accept-version", "1.2")
            .header("host", self.config.virtual_host())
            .header("heart-beat", self.config.heart_beat.header_value());
        for (name, value) in &self.config.connect_headers {
            connect = connect.header(name.clone(), value.clone());
        }
        send_frame(&mut write, &connect).await?;

        let server_heart_beat = 'handshake: loop {
            let msg = match read.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                None => {
                    return Err(Error::WebSocketClosed {
                        code: 1006,
                        reason: "stream ended during STOMP handshake".into(),
                    });
                }
            };

            let Some(payload) = message_payload(msg)? else {
                continue;
            };

            for frame in decode_message(&payload)? {
                match frame.command {
                    Command::Connected => {
                        debug!(
                            version = frame.get("version").unwrap_or("1.0"),
                            server = frame.get("server").unwrap_or("unknown"),
                            "STOMP CONNECTED"
                        );
                        let offered = frame
                            .get("heart-beat")
                            .map(HeartBeat::parse)
                            .transpose()?
                            .unwrap_or(HeartBeat::DISABLED);
                        break 'handshake offered;
                    }
                    Command::Error => return Err(stomp_error(&frame)),
                    other => debug!(command = %other, "Ignoring frame before CONNECTED"),
                }
            }
        };

        let heart_beat = HeartBeat::negotiate(self.config.heart_beat, server_heart_beat);
        debug!(
            outgoing_ms = millis(heart_beat.outgoing),
            incoming_ms = millis(heart_beat.incoming),
            "Negotiated heart-beats"
        );

        let subscribe = Frame::new(Command::Subscribe)
            .header("id", SUBSCRIPTION_ID)
            .header("destination", destination)
            .header("ack", "auto");
        send_frame(&mut write, &subscribe).await?;

        info!(destination, "STOMP subscribed");

        let now = Instant::now();
        Ok(StompSession {
            write,
            read,
            heart_beat,
            last_received: now,
            last_sent: now,
            pending: VecDeque::new(),
            closed: false,
        })
    }
}

#[async_trait]
impl NotificationTransport for StompTransport {
    type Session = StompSession;

    async fn open(&self, destination: &str) -> Result<StompSession, Error> {
        let budget = self.config.handshake_timeout;
        match tokio::time::timeout(budget, self.handshake(destination)).await {
            Ok(result) => result,
            Err(_) => Err(Error::HandshakeTimeout {
                timeout_ms: millis(budget),
            }),
        }
    }
}

// ── StompSession ─────────────────────────────────────────────────────

/// A connected, subscribed STOMP session.
pub struct StompSession {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    heart_beat: HeartBeat,
    last_received: Instant,
    last_sent: Instant,
    /// Messages decoded from a WebSocket payload that carried several frames.
    pending: VecDeque<Notification>,
    closed: bool,
}

impl StompSession {
    /// Heart-beat intervals agreed with the broker.
    pub fn heart_beat(&self) -> HeartBeat {
        self.heart_beat
    }

    /// Decode one WebSocket message. Returns an event only when the
    /// session must end; notifications are queued in `pending`.
    fn ingest(&mut self, msg: Message) -> Option<SessionEvent> {
        let payload = match message_payload(msg) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(Error::WebSocketClosed { code, reason }) => {
                info!(code, reason = %reason, "WebSocket close frame received");
                return Some(SessionEvent::Closed);
            }
            Err(e) => return Some(SessionEvent::Failed(e)),
        };

        let frames = match decode_message(&payload) {
            Ok(frames) => frames,
            Err(e) => return Some(SessionEvent::Failed(e)),
        };

        if frames.is_empty() {
            trace!("STOMP heart-beat");
        }

        for frame in frames {
            match frame.command {
                Command::Message => self.pending.push_back(Notification {
                    destination: frame.get("destination").map(str::to_owned),
                    body: frame.body,
                }),
                Command::Error => return Some(SessionEvent::Failed(stomp_error(&frame))),
                Command::Receipt => debug!(receipt = frame.get("receipt-id"), "STOMP receipt"),
                other => debug!(command = %other, "Ignoring unexpected frame"),
            }
        }

        None
    }

    async fn send_heartbeat(&mut self) -> Result<(), Error> {
        trace!("Sending STOMP heart-beat");
        self.write
            .send(Message::text("\n".to_owned()))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
        self.last_sent = Instant::now();
        Ok(())
    }
}

#[async_trait]
impl NotificationSession for StompSession {
    async fn next_event(&mut self) -> SessionEvent {
        loop {
            if let Some(note) = self.pending.pop_front() {
                return SessionEvent::Message(note);
            }
            if self.closed {
                return SessionEvent::Closed;
            }

            let send_at = (!self.heart_beat.outgoing.is_zero())
                .then(|| self.last_sent + self.heart_beat.outgoing);
            let window = self.heart_beat.incoming * HEARTBEAT_GRACE_FACTOR;
            let dead_at = (!window.is_zero()).then(|| self.last_received + window);

            tokio::select! {
                biased;
                frame = self.read.next() => {
                    match frame {
                        Some(Ok(msg)) => {
                            self.last_received = Instant::now();
                            if let Some(event) = self.ingest(msg) {
                                return event;
                            }
                        }
                        Some(Err(e)) => return SessionEvent::Failed(Error::WebSocketConnect(e.to_string())),
                        None => {
                            info!("WebSocket stream ended");
                            return SessionEvent::Closed;
                        }
                    }
                }
                () = sleep_until_opt(dead_at) => {
                    warn!(window_ms = millis(window), "Broker went silent");
                    return SessionEvent::Failed(Error::HeartbeatTimeout {
                        window_ms: millis(window),
                    });
                }
                () = sleep_until_opt(send_at) => {
                    if let Err(e) = self.send_heartbeat().await {
                        return SessionEvent::Failed(e);
                    }
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = send_frame(&mut self.write, &Frame::new(Command::Disconnect)).await {
            debug!(error = %e, "DISCONNECT not delivered");
        }
        if let Err(e) = self.write.close().await {
            debug!(error = %e, "WebSocket close failed");
        }
        debug!("STOMP session closed");
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

async fn send_frame(write: &mut SplitSink<WsStream, Message>, frame: &Frame) -> Result<(), Error> {
    trace!(command = %frame.command, "Sending STOMP frame");
    write
        .send(Message::text(frame.encode()))
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))
}

/// Extract the text of a WebSocket message. Control frames yield `None`;
/// a close frame becomes [`Error::WebSocketClosed`].
fn message_payload(msg: Message) -> Result<Option<String>, Error> {
    match msg {
        Message::Text(text) => Ok(Some(text.as_str().to_owned())),
        // Some brokers send STOMP frames as binary messages.
        Message::Binary(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Message::Close(frame) => Err(match frame {
            Some(cf) => Error::WebSocketClosed {
                code: u16::from(cf.code),
                reason: cf.reason.as_str().to_owned(),
            },
            None => Error::WebSocketClosed {
                code: 1005,
                reason: String::new(),
            },
        }),
        // tungstenite answers pings itself
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}

fn stomp_error(frame: &Frame) -> Error {
    let message = frame.get("message").unwrap_or("broker error").to_owned();
    warn!(message = %message, details = %frame.body, "STOMP ERROR frame");
    Error::Stomp {
        message,
        details: frame.body.clone(),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
