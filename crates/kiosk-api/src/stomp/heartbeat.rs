use std::time::Duration;

use crate::error::Error;

/// A `heart-beat` header: how often one side can send, and how often it
/// wants to receive. Zero disables that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartBeat {
    pub outgoing: Duration,
    pub incoming: Duration,
}

impl HeartBeat {
    pub const DISABLED: Self = Self {
        outgoing: Duration::ZERO,
        incoming: Duration::ZERO,
    };

    pub fn from_millis(outgoing: u64, incoming: u64) -> Self {
        Self {
            outgoing: Duration::from_millis(outgoing),
            incoming: Duration::from_millis(incoming),
        }
    }

    /// Render as `"<outgoing>,<incoming>"` in milliseconds.
    pub fn header_value(&self) -> String {
        format!("{},{}", duration_ms(self.outgoing), duration_ms(self.incoming))
    }

    /// Parse a `heart-beat` header value.
    pub fn parse(value: &str) -> Result<Self, Error> {
        let (out, inc) = value
            .split_once(',')
            .ok_or_else(|| Error::Frame(format!("invalid heart-beat header {value:?}")))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<u64>()
                .map_err(|_| Error::Frame(format!("invalid heart-beat header {value:?}")))
        };
        Ok(Self::from_millis(parse(out)?, parse(inc)?))
    }

    /// Intervals the client should actually use, given what both sides offered.
    ///
    /// Outgoing is `max(client.outgoing, server.incoming)` and incoming is
    /// `max(client.incoming, server.outgoing)`; a zero on either side of a
    /// direction disables it.
    pub fn negotiate(client: Self, server: Self) -> Self {
        let pick = |ours: Duration, theirs: Duration| {
            if ours.is_zero() || theirs.is_zero() {
                Duration::ZERO
            } else {
                ours.max(theirs)
            }
        };
        Self {
            outgoing: pick(client.outgoing, server.incoming),
            incoming: pick(client.incoming, server.outgoing),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
