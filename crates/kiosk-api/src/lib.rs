// kiosk-api: Async wire layer for kiosk displays (display REST + STOMP notifications)

pub mod display;
pub mod error;
pub mod notify;
pub mod stomp;
pub mod transport;
pub mod websocket;

pub use display::{DisplayClient, KioskRoute};
pub use error::Error;
pub use notify::{Notification, NotificationSession, NotificationTransport, SessionEvent};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{StompConfig, StompSession, StompTransport};
