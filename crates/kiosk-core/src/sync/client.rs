// ── Sync client driver ──
//
// Runs a `SyncMachine` on one tokio task: opens sessions through a
// `NotificationTransport`, feeds their events to the machine and executes
// the returned actions. Owns the single reconnect timer (a deadline slot
// raced in the same select as everything else) and the live session.

use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use kiosk_api::notify::{NotificationSession, NotificationTransport, SessionEvent};

use super::machine::{ConnectionState, SyncAction, SyncMachine, SyncStatus};
use super::policy::ReconnectPolicy;
use super::topic::Topic;

/// Callback fired once per topic message.
pub type RefetchTrigger = Arc<dyn Fn() + Send + Sync>;

/// Handle to a running sync task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown()`](Self::shutdown) or cancel the token passed to
/// [`spawn()`](Self::spawn).
pub struct SyncClient {
    status: watch::Receiver<SyncStatus>,
    reconnect: Arc<Notify>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClient {
    /// Spawn the sync task and start connecting immediately.
    ///
    /// `status` receives every state change. `on_message` runs on the
    /// sync task and must not block; spawn the actual fetch.
    pub fn spawn<T: NotificationTransport>(
        transport: T,
        topic: Topic,
        policy: ReconnectPolicy,
        status: watch::Sender<SyncStatus>,
        on_message: RefetchTrigger,
        cancel: CancellationToken,
    ) -> Self {
        let status_rx = status.subscribe();
        let reconnect = Arc::new(Notify::new());

        let driver = Driver {
            transport,
            topic,
            machine: SyncMachine::new(policy),
            session: None,
            timer: None,
            open_requested: false,
            status,
            on_message,
        };
        let handle = tokio::spawn(driver.run(cancel.clone(), Arc::clone(&reconnect)));

        Self {
            status: status_rx,
            reconnect,
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Current status snapshot.
    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Operator-initiated connect: restarts an exhausted client, or cuts
    /// a pending reconnect wait short. No effect while connecting/connected.
    pub fn reconnect_now(&self) {
        // Only wakes a driver parked in Disconnected/ReconnectPending; no
        // permit is left behind for a later backoff wait.
        self.reconnect.notify_waiters();
    }

    /// Stop the task: cancels the reconnect timer, closes the session and
    /// waits for the task to finish. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "sync task ended abnormally");
            }
        }
    }
}

// ── Driver ───────────────────────────────────────────────────────────

enum Event {
    Connected,
    Message,
    Closed,
    Failed(kiosk_api::Error),
    TimerFired,
    ReconnectRequested,
}

struct Driver<T: NotificationTransport> {
    transport: T,
    topic: Topic,
    machine: SyncMachine,
    session: Option<T::Session>,
    /// The one reconnect deadline. Re-arming replaces it.
    timer: Option<Instant>,
    open_requested: bool,
    status: watch::Sender<SyncStatus>,
    on_message: RefetchTrigger,
}

impl<T: NotificationTransport> Driver<T> {
    async fn run(mut self, cancel: CancellationToken, reconnect: Arc<Notify>) {
        info!(topic = %self.topic, "sync client starting");
        let actions = self.machine.connect();
        self.execute(actions).await;

        loop {
            // Registered before the state is published so a request made
            // right after observing it is not lost.
            let requested = reconnect.notified();
            tokio::pin!(requested);
            requested.as_mut().enable();

            self.publish();

            let event = if self.open_requested {
                self.open_requested = false;
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = self.transport.open(self.topic.destination()) => match result {
                        Ok(session) => {
                            self.session = Some(session);
                            Event::Connected
                        }
                        Err(e) => Event::Failed(e),
                    },
                }
            } else if let Some(session) = self.session.as_mut() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    event = session.next_event() => match event {
                        SessionEvent::Message(note) => {
                            debug!(destination = ?note.destination, "topic message");
                            Event::Message
                        }
                        SessionEvent::Closed => Event::Closed,
                        SessionEvent::Failed(e) => Event::Failed(e),
                    },
                }
            } else {
                let deadline = self.timer;
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = requested.as_mut() => Event::ReconnectRequested,
                    () = sleep_until_opt(deadline) => {
                        self.timer = None;
                        Event::TimerFired
                    }
                }
            };

            let actions = match event {
                Event::Connected => {
                    info!(topic = %self.topic, "subscribed to display notifications");
                    self.machine.on_connected()
                }
                Event::Message => self.machine.on_message(),
                Event::Closed => {
                    warn!("notification transport closed by peer");
                    self.machine.on_failure()
                }
                Event::Failed(e) => {
                    warn!(
                        error = %e,
                        kind = failure_kind(&e),
                        state = %self.machine.state(),
                        "notification transport failed"
                    );
                    self.machine.on_failure()
                }
                Event::TimerFired => self.machine.on_timer(),
                Event::ReconnectRequested => {
                    info!("reconnect requested");
                    self.machine.connect()
                }
            };
            self.execute(actions).await;
        }

        let actions = self.machine.teardown();
        self.execute(actions).await;
        self.publish();
        info!("sync client stopped");
    }

    async fn execute(&mut self, actions: Vec<SyncAction>) {
        for action in actions {
            match action {
                SyncAction::OpenTransport => {
                    debug!(destination = self.topic.destination(), "opening notification transport");
                    self.open_requested = true;
                }
                SyncAction::CloseTransport => {
                    self.open_requested = false;
                    if let Some(mut session) = self.session.take() {
                        session.close().await;
                    }
                }
                SyncAction::CancelTimer => self.timer = None,
                SyncAction::ScheduleReconnect { delay, attempt } => {
                    info!(
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        attempt,
                        "scheduling reconnect"
                    );
                    self.timer = Some(Instant::now() + delay);
                }
                SyncAction::Refetch => (self.on_message)(),
                SyncAction::GiveUp { attempts } => {
                    error!(
                        attempts,
                        topic = %self.topic,
                        "max reconnection attempts reached; display updates stopped"
                    );
                }
            }
        }
    }

    fn publish(&self) {
        let next = self.machine.status();
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Transport and protocol failures both reconnect; the kind is for logs.
fn failure_kind(err: &kiosk_api::Error) -> &'static str {
    if err.is_protocol() {
        "protocol"
    } else if err.is_transient() {
        "transport"
    } else {
        "unexpected"
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
