//! Connection state machine for the display sync client.
//!
//! Pure logic: methods take an event, update state and return the
//! [`SyncAction`]s the driver must carry out. No I/O and no clock, so the
//! whole reconnect policy is testable without a runtime.
//!
//! ```text
//!                 connect()            handshake ack
//! Disconnected ────────────> Connecting ─────────────> Connected ──┐ message
//!      ^                       │   ^                     │   ^     │ (Refetch)
//!      │ attempts exhausted    │   │ timer               │   └─────┘
//!      │                       v   │                     │
//!      └──────────────── ReconnectPending <──────────────┘
//!                              transport / protocol failure
//! ```
//!
//! `attempt_count` is incremented each time a reconnect is scheduled and
//! reset on every successful handshake. Teardown from any state lands in
//! `Disconnected`.

use std::time::Duration;

use serde::Serialize;
use strum::Display;

use super::policy::ReconnectPolicy;

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    ReconnectPending,
}

/// State plus retry bookkeeping, published on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncStatus {
    pub state: ConnectionState,
    pub attempt_count: u32,
    /// Reconnects ran out; nothing further happens without operator action.
    pub exhausted: bool,
}

/// Side effects requested by the machine, executed in order by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Open a transport and subscribe.
    OpenTransport,
    /// Close the current transport, if any.
    CloseTransport,
    /// Drop the pending reconnect timer, if any.
    CancelTimer,
    /// Arm the (single) reconnect timer.
    ScheduleReconnect { delay: Duration, attempt: u32 },
    /// A topic message arrived: re-fetch the display.
    Refetch,
    /// Reconnects exhausted.
    GiveUp { attempts: u32 },
}

/// The sync client's connection state machine.
#[derive(Debug, Clone)]
pub struct SyncMachine {
    state: ConnectionState,
    attempt_count: u32,
    exhausted: bool,
    policy: ReconnectPolicy,
}

impl SyncMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempt_count: 0,
            exhausted: false,
            policy,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            state: self.state,
            attempt_count: self.attempt_count,
            exhausted: self.exhausted,
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Start connecting.
    ///
    /// From `Disconnected` this is a fresh start (retry budget restored).
    /// From `ReconnectPending` it skips the remaining wait. Otherwise a no-op.
    pub fn connect(&mut self) -> Vec<SyncAction> {
        match self.state {
            ConnectionState::Disconnected => {
                self.attempt_count = 0;
                self.exhausted = false;
            }
            ConnectionState::ReconnectPending => {}
            ConnectionState::Connecting | ConnectionState::Connected => return Vec::new(),
        }
        self.state = ConnectionState::Connecting;
        vec![SyncAction::CancelTimer, SyncAction::OpenTransport]
    }

    /// Transport open and handshake acknowledged.
    pub fn on_connected(&mut self) -> Vec<SyncAction> {
        if self.state != ConnectionState::Connecting {
            return Vec::new();
        }
        self.state = ConnectionState::Connected;
        self.attempt_count = 0;
        Vec::new()
    }

    /// A message arrived on the subscribed topic.
    pub fn on_message(&mut self) -> Vec<SyncAction> {
        if self.state == ConnectionState::Connected {
            vec![SyncAction::Refetch]
        } else {
            Vec::new()
        }
    }

    /// Handshake, transport or protocol failure, or a peer close.
    pub fn on_failure(&mut self) -> Vec<SyncAction> {
        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            return Vec::new();
        }

        if self.attempt_count >= self.policy.max_attempts {
            self.state = ConnectionState::Disconnected;
            self.exhausted = true;
            return vec![
                SyncAction::CloseTransport,
                SyncAction::GiveUp {
                    attempts: self.attempt_count,
                },
            ];
        }

        self.attempt_count += 1;
        self.state = ConnectionState::ReconnectPending;
        vec![
            SyncAction::CloseTransport,
            SyncAction::CancelTimer,
            SyncAction::ScheduleReconnect {
                delay: self.policy.delay_for(self.attempt_count),
                attempt: self.attempt_count,
            },
        ]
    }

    /// The reconnect timer fired.
    pub fn on_timer(&mut self) -> Vec<SyncAction> {
        if self.state != ConnectionState::ReconnectPending {
            return Vec::new();
        }
        self.state = ConnectionState::Connecting;
        vec![SyncAction::OpenTransport]
    }

    /// External teardown. Idempotent.
    pub fn teardown(&mut self) -> Vec<SyncAction> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }
        self.state = ConnectionState::Disconnected;
        vec![SyncAction::CancelTimer, SyncAction::CloseTransport]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn machine() -> SyncMachine {
        SyncMachine::new(ReconnectPolicy::default())
    }

    #[test]
    fn connect_opens_transport() {
        let mut m = machine();
        assert_eq!(m.connect(), vec![SyncAction::CancelTimer, SyncAction::OpenTransport]);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert!(m.connect().is_empty());
    }

    #[test]
    fn messages_refetch_only_when_connected() {
        let mut m = machine();
        m.connect();
        assert!(m.on_message().is_empty());

        m.on_connected();
        assert_eq!(m.on_message(), vec![SyncAction::Refetch]);
        assert_eq!(m.on_message(), vec![SyncAction::Refetch]);
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn failure_schedules_backoff() {
        let mut m = machine();
        m.connect();

        let actions = m.on_failure();
        assert_eq!(
            actions,
            vec![
                SyncAction::CloseTransport,
                SyncAction::CancelTimer,
                SyncAction::ScheduleReconnect {
                    delay: Duration::from_millis(5000),
                    attempt: 1,
                },
            ]
        );
        assert_eq!(m.state(), ConnectionState::ReconnectPending);

        assert_eq!(m.on_timer(), vec![SyncAction::OpenTransport]);
        let actions = m.on_failure();
        assert!(actions.contains(&SyncAction::ScheduleReconnect {
            delay: Duration::from_millis(7500),
            attempt: 2,
        }));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut m = machine();
        m.connect();

        for attempt in 1..=10 {
            let actions = m.on_failure();
            assert!(matches!(
                actions.last(),
                Some(SyncAction::ScheduleReconnect { attempt: a, .. }) if *a == attempt
            ));
            m.on_timer();
        }

        let actions = m.on_failure();
        assert_eq!(actions, vec![SyncAction::CloseTransport, SyncAction::GiveUp { attempts: 10 }]);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert!(m.status().exhausted);

        // Terminal: nothing re-arms by itself.
        assert!(m.on_timer().is_empty());
        assert!(m.on_failure().is_empty());
    }

    #[test]
    fn success_resets_attempt_count() {
        let mut m = machine();
        m.connect();
        for _ in 0..4 {
            m.on_failure();
            m.on_timer();
        }
        assert_eq!(m.attempt_count(), 4);

        m.on_connected();
        assert_eq!(m.attempt_count(), 0);

        let actions = m.on_failure();
        assert!(actions.contains(&SyncAction::ScheduleReconnect {
            delay: Duration::from_millis(5000),
            attempt: 1,
        }));
    }

    #[test]
    fn explicit_connect_after_exhaustion_restores_budget() {
        let mut m = SyncMachine::new(ReconnectPolicy {
            max_attempts: 1,
            ..ReconnectPolicy::default()
        });
        m.connect();
        m.on_failure();
        m.on_timer();
        m.on_failure();
        assert!(m.status().exhausted);

        assert_eq!(m.connect(), vec![SyncAction::CancelTimer, SyncAction::OpenTransport]);
        assert_eq!(m.attempt_count(), 0);
        assert!(!m.status().exhausted);
    }

    #[test]
    fn connect_while_pending_skips_wait() {
        let mut m = machine();
        m.connect();
        m.on_failure();
        assert_eq!(m.connect(), vec![SyncAction::CancelTimer, SyncAction::OpenTransport]);
        assert_eq!(m.attempt_count(), 1);
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut m = machine();
        m.connect();
        m.on_connected();

        assert_eq!(m.teardown(), vec![SyncAction::CancelTimer, SyncAction::CloseTransport]);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert!(m.teardown().is_empty());
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut m = machine();
        assert!(m.on_connected().is_empty());
        assert!(m.on_failure().is_empty());
        assert!(m.on_timer().is_empty());
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }
}
