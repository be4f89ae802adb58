// Sync client driver against a scripted transport, on a paused clock.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use kiosk_core::sync::{RefetchTrigger, SyncClient};
use kiosk_core::{ConnectionState, KioskRoute, ReconnectPolicy, SyncStatus, Topic};

use common::{Plan, ScriptedTransport, Step};

// ── Helpers ─────────────────────────────────────────────────────────

fn topic() -> Topic {
    Topic::new(&KioskRoute::new("o", "p", Some("7".into())), "/topic/")
}

fn spawn(transport: &ScriptedTransport, policy: ReconnectPolicy, trigger: RefetchTrigger) -> SyncClient {
    let (tx, _rx) = watch::channel(SyncStatus::default());
    SyncClient::spawn(
        transport.clone(),
        topic(),
        policy,
        tx,
        trigger,
        CancellationToken::new(),
    )
}

fn counting_trigger() -> (RefetchTrigger, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    (Arc::new(move || {
        c.fetch_add(1, Ordering::SeqCst);
    }), count)
}

async fn wait_for_opens(transport: &ScriptedTransport, n: usize) {
    while transport.opens() < n {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn assert_gap(gap: Duration, expected: Duration) {
    // The timer wheel rounds deadlines up to the next millisecond.
    assert!(
        gap >= expected && gap <= expected + Duration::from_millis(1),
        "gap {gap:?}, expected {expected:?}"
    );
}

// ── Backoff ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_max_attempts() {
    let transport = ScriptedTransport::default();
    let policy = ReconnectPolicy::default();
    let client = spawn(&transport, policy, Arc::new(|| {}));

    let mut status = client.subscribe();
    let last = *status.wait_for(|s| s.exhausted).await.unwrap();

    assert_eq!(last.state, ConnectionState::Disconnected);
    assert_eq!(last.attempt_count, 10);

    // One initial attempt plus ten scheduled reconnects.
    let opens = transport.open_times();
    assert_eq!(opens.len(), 11);
    for attempt in 1..=10u32 {
        let idx = usize::try_from(attempt).unwrap();
        assert_gap(opens[idx] - opens[idx - 1], policy.delay_for(attempt));
    }

    // Terminal: nothing else is scheduled.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(transport.opens(), 11);
    assert_eq!(client.state(), ConnectionState::Disconnected);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_successful_connect_resets_backoff() {
    let transport = ScriptedTransport::with_plans([
        Plan::Refuse,
        Plan::Refuse,
        Plan::Session(vec![Step::Message, Step::Close]),
    ]);
    let (trigger, refetches) = counting_trigger();
    let client = spawn(&transport, ReconnectPolicy::default(), trigger);

    wait_for_opens(&transport, 4).await;
    let opens = transport.open_times();

    assert_gap(opens[1] - opens[0], Duration::from_millis(5000));
    assert_gap(opens[2] - opens[1], Duration::from_millis(7500));
    // After the session, the count starts over at attempt 1.
    assert_gap(opens[3] - opens[2], Duration::from_millis(5000));

    assert_eq!(refetches.load(Ordering::SeqCst), 1);
    assert_eq!(transport.closes(), 1);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_session_failure_reconnects() {
    let transport = ScriptedTransport::with_plans([
        Plan::Session(vec![Step::Fail]),
        Plan::Session(vec![]),
    ]);
    let client = spawn(&transport, ReconnectPolicy::default(), Arc::new(|| {}));

    wait_for_opens(&transport, 2).await;
    let mut status = client.subscribe();
    status
        .wait_for(|s| s.state == ConnectionState::Connected)
        .await
        .unwrap();

    assert_eq!(client.status().attempt_count, 0);
    client.shutdown().await;
}

// ── Messages ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_refetch_once_per_message() {
    let transport = ScriptedTransport::with_plans([Plan::Session(vec![
        Step::Message,
        Step::Message,
        Step::Message,
    ])]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = spawn(
        &transport,
        ReconnectPolicy::default(),
        Arc::new(move || {
            let _ = tx.send(());
        }),
    );

    for _ in 0..3 {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("refetch trigger")
            .unwrap();
    }
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(client.state(), ConnectionState::Connected);

    client.shutdown().await;
    assert_eq!(transport.closes(), 1);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

// ── Teardown ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_reconnect() {
    let transport = ScriptedTransport::default();
    let client = spawn(&transport, ReconnectPolicy::default(), Arc::new(|| {}));

    let mut status = client.subscribe();
    status
        .wait_for(|s| s.state == ConnectionState::ReconnectPending)
        .await
        .unwrap();

    client.shutdown().await;
    client.shutdown().await;

    assert_eq!(client.state(), ConnectionState::Disconnected);
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(transport.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_now_while_connecting_keeps_backoff() {
    let transport = ScriptedTransport::with_plans([Plan::Session(vec![Step::Close])]);
    let client = spawn(&transport, ReconnectPolicy::default(), Arc::new(|| {}));

    // Issued before the first open has even started.
    client.reconnect_now();

    wait_for_opens(&transport, 2).await;
    let opens = transport.open_times();
    assert_gap(opens[1] - opens[0], Duration::from_millis(5000));

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_now_cuts_pending_wait_short() {
    let transport = ScriptedTransport::default();
    let client = spawn(&transport, ReconnectPolicy::default(), Arc::new(|| {}));

    let mut status = client.subscribe();
    status
        .wait_for(|s| s.state == ConnectionState::ReconnectPending)
        .await
        .unwrap();
    client.reconnect_now();

    wait_for_opens(&transport, 2).await;
    let opens = transport.open_times();
    assert!(opens[1] - opens[0] < Duration::from_millis(5000));

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_now_restarts_after_exhaustion() {
    let transport = ScriptedTransport::default();
    let policy = ReconnectPolicy {
        max_attempts: 1,
        ..ReconnectPolicy::default()
    };
    let client = spawn(&transport, policy, Arc::new(|| {}));

    let mut status = client.subscribe();
    status.wait_for(|s| s.exhausted).await.unwrap();
    assert_eq!(transport.opens(), 2);

    transport.push(Plan::Session(vec![]));
    client.reconnect_now();

    let now = *status
        .wait_for(|s| s.state == ConnectionState::Connected)
        .await
        .unwrap();
    assert_eq!(now.attempt_count, 0);
    assert!(!now.exhausted);
    assert_eq!(transport.opens(), 3);

    client.shutdown().await;
}
