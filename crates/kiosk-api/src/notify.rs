//! Notification transport seam.
//!
//! The sync client in `kiosk-core` only needs three things from a pub/sub
//! transport: open a subscribed session, pull the next event, close it.
//! Production uses [`StompTransport`](crate::websocket::StompTransport);
//! tests plug in scripted in-memory sessions.

use async_trait::async_trait;

use crate::error::Error;

/// A message delivered on the subscribed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub destination: Option<String>,
    pub body: String,
}

/// Discrete events from an open session. Failures are values, never panics.
#[derive(Debug)]
pub enum SessionEvent {
    /// A message arrived on the subscription.
    Message(Notification),
    /// The peer closed the connection cleanly.
    Closed,
    /// The socket or the protocol failed.
    Failed(Error),
}

/// Opens subscribed sessions.
#[async_trait]
pub trait NotificationTransport: Send + Sync + 'static {
    type Session: NotificationSession;

    /// Connect, complete the protocol handshake and subscribe to `destination`.
    ///
    /// Returns only once the broker has acknowledged the connection.
    async fn open(&self, destination: &str) -> Result<Self::Session, Error>;
}

/// An established, subscribed session.
#[async_trait]
pub trait NotificationSession: Send + 'static {
    /// Wait for the next event. Must be cancel-safe: the sync loop races it
    /// against shutdown.
    async fn next_event(&mut self) -> SessionEvent;

    /// Close gracefully. Errors are swallowed; the session is gone either way.
    async fn close(&mut self);
}
