// Minimal STOMP 1.2 client framing: just what a subscriber needs.

pub mod frame;
pub mod heartbeat;

pub use frame::{Command, Frame, decode_message};
pub use heartbeat::HeartBeat;
