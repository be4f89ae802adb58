// Shared fakes for kiosk-core integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use kiosk_api::Error;
use kiosk_api::notify::{Notification, NotificationSession, NotificationTransport, SessionEvent};

/// What one `open()` call does.
pub enum Plan {
    Refuse,
    Session(Vec<Step>),
}

/// Scripted session events; once exhausted the session idles.
#[derive(Clone, Copy)]
pub enum Step {
    Message,
    Close,
    Fail,
}

#[derive(Default)]
struct ScriptState {
    plans: VecDeque<Plan>,
    opens: Vec<Instant>,
    closes: usize,
}

/// In-memory transport. Opens follow the queued plans; with no plan
/// left every open is refused.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let transport = Self::default();
        for plan in plans {
            transport.push(plan);
        }
        transport
    }

    pub fn push(&self, plan: Plan) {
        self.state.lock().unwrap().plans.push_back(plan);
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().opens.clone()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens.len()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

#[async_trait]
impl NotificationTransport for ScriptedTransport {
    type Session = ScriptedSession;

    async fn open(&self, _destination: &str) -> Result<ScriptedSession, Error> {
        let plan = {
            let mut state = self.state.lock().unwrap();
            state.opens.push(Instant::now());
            state.plans.pop_front()
        };
        match plan {
            Some(Plan::Session(steps)) => Ok(ScriptedSession {
                steps: steps.into(),
                state: Arc::clone(&self.state),
            }),
            Some(Plan::Refuse) | None => Err(Error::WebSocketConnect("connection refused".into())),
        }
    }
}

pub struct ScriptedSession {
    steps: VecDeque<Step>,
    state: Arc<Mutex<ScriptState>>,
}

#[async_trait]
impl NotificationSession for ScriptedSession {
    async fn next_event(&mut self) -> SessionEvent {
        match self.steps.pop_front() {
            Some(Step::Message) => SessionEvent::Message(Notification {
                destination: Some("/topic/displays/o/p/7".into()),
                body: "{}".into(),
            }),
            Some(Step::Close) => SessionEvent::Closed,
            Some(Step::Fail) => SessionEvent::Failed(Error::HeartbeatTimeout { window_ms: 8000 }),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }
}
