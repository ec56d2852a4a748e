/// Host-side session lifecycle: publishing the reference anchor under the
/// retry policy, advertising, stopping at capacity, and the full reset that
/// follows an unrecoverable failure.
use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::time::Instant;

use colocate_server::{SessionConfig, SessionCoordinator, SessionError};
use colocate_shared::{
    async_trait, AnchorError, CancellationToken, DiscoveryRace, FullReset, PeerId, ResetManager, RetryError,
    RetryPolicy,
};
use colocate_test::{AnchorOp, MockAnchorRepository, ScriptedChannel};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct CountingReset {
    shutdowns: AtomicU32,
    restarts: AtomicU32,
}

#[async_trait]
impl FullReset for CountingReset {
    async fn shutdown_transport(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }

    async fn restart(&self) {
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }
}

struct Host {
    coordinator: SessionCoordinator,
    anchors: Arc<MockAnchorRepository>,
    hooks: Arc<CountingReset>,
    reset: Arc<ResetManager>,
    proximity: Arc<ScriptedChannel>,
    lan: Arc<ScriptedChannel>,
}

fn host(capacity: usize) -> Host {
    let anchors = Arc::new(MockAnchorRepository::new());
    let hooks = Arc::new(CountingReset::default());
    let reset = Arc::new(ResetManager::new(hooks.clone(), Duration::from_millis(500)));
    let proximity = Arc::new(ScriptedChannel::silent("proximity"));
    let lan = Arc::new(ScriptedChannel::silent("lan"));
    let discovery = DiscoveryRace::new(
        proximity.clone(),
        lan.clone(),
        Duration::from_secs(10),
        reset.session_token(),
    );
    let config = SessionConfig {
        capacity,
        host_address: "10.0.0.2:7000".to_string(),
        anchor_retry: RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        },
    };
    let coordinator = SessionCoordinator::new(config, anchors.clone(), discovery, reset.clone());
    Host {
        coordinator,
        anchors,
        hooks,
        reset,
        proximity,
        lan,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn session_start_shares_anchor_and_advertises() {
    init_logger();
    let mut host = host(2);

    let descriptor = host
        .coordinator
        .start_session()
        .await
        .expect("session starts");
    settle().await;

    assert_eq!(descriptor.host_address, "10.0.0.2:7000");
    let created = host.anchors.created();
    assert_eq!(created.len(), 1);
    assert!(host.anchors.is_saved(&created[0]));
    let shared = host.anchors.shared_with(&descriptor.group_id);
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].id, created[0].id);
    assert_eq!(host.coordinator.anchor(), Some(&created[0]));

    assert!(host.coordinator.is_advertising());
    assert_eq!(host.proximity.stats().advertised, vec![descriptor.clone()]);
    assert_eq!(host.lan.stats().advertised, vec![descriptor.clone()]);

    assert_eq!(
        host.coordinator.start_session().await,
        Err(SessionError::AlreadyStarted {
            group: descriptor.group_id
        })
    );
}

#[tokio::test(start_paused = true)]
async fn transient_share_failures_are_retried() {
    init_logger();
    let mut host = host(2);
    host.anchors.fail(AnchorOp::Share, 2);
    let started = Instant::now();

    assert!(host.coordinator.start_session().await.is_ok());
    assert_eq!(host.anchors.calls(AnchorOp::Share), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(host.hooks.restarts.load(Ordering::SeqCst), 0);

    // every attempt starts over from a fresh anchor
    let created = host.anchors.created();
    assert_eq!(created.len(), 3);
    assert_eq!(host.coordinator.anchor(), created.last());
}

#[tokio::test(start_paused = true)]
async fn failures_across_steps_share_one_budget() {
    init_logger();
    let mut host = host(2);
    host.anchors.fail(AnchorOp::Create, 1);
    host.anchors.fail(AnchorOp::Save, 1);
    host.anchors.fail(AnchorOp::Share, 1);
    let started = Instant::now();

    let result = host.coordinator.start_session().await;
    let Err(SessionError::AnchorPublish(RetryError::Exhausted {
        operation,
        attempts,
        last,
    })) = result
    else {
        panic!("expected exhausted publish, got {:?}", result);
    };
    assert_eq!(operation, "publish anchor");
    assert_eq!(attempts, 3);
    assert!(matches!(last, AnchorError::Share { .. }));
    assert_eq!(host.anchors.calls(AnchorOp::Create), 3);
    assert_eq!(host.anchors.calls(AnchorOp::Save), 2);
    assert_eq!(host.anchors.calls(AnchorOp::Share), 1);
    assert_eq!(started.elapsed(), Duration::from_secs(2) + Duration::from_millis(500));
    assert_eq!(host.hooks.restarts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_anchor_publish_triggers_full_reset() {
    init_logger();
    let mut host = host(2);
    host.anchors.fail(AnchorOp::Save, 10);
    let session = host.reset.session_token();
    let mut resets = host.reset.subscribe();

    let result = host.coordinator.start_session().await;
    let Err(SessionError::AnchorPublish(RetryError::Exhausted {
        operation,
        attempts,
        ..
    })) = result
    else {
        panic!("expected exhausted publish, got {:?}", result);
    };
    assert_eq!(operation, "publish anchor");
    assert_eq!(attempts, 3);
    assert_eq!(host.anchors.calls(AnchorOp::Create), 3);
    assert_eq!(host.anchors.calls(AnchorOp::Save), 3);
    assert_eq!(host.anchors.calls(AnchorOp::Share), 0);

    assert!(session.is_cancelled());
    assert!(!host.reset.session_token().is_cancelled());
    assert_eq!(host.hooks.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(host.hooks.restarts.load(Ordering::SeqCst), 1);
    assert_eq!(*resets.borrow_and_update(), 1);

    assert!(!host.coordinator.is_advertising());
    assert!(host.coordinator.descriptor().is_none());
}

#[tokio::test(start_paused = true)]
async fn reset_during_start_cancels_without_second_reset() {
    init_logger();
    let mut host = host(2);
    host.anchors.fail(AnchorOp::Create, 10);
    let session: CancellationToken = host.reset.session_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        session.cancel();
    });

    assert_eq!(
        host.coordinator.start_session().await,
        Err(SessionError::Cancelled)
    );
    assert_eq!(host.anchors.calls(AnchorOp::Create), 2);
    assert_eq!(host.hooks.restarts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn advertising_stops_at_capacity_and_does_not_resume() {
    init_logger();
    let mut host = host(2);
    host.coordinator.start_session().await.expect("session starts");
    settle().await;

    assert!(host.coordinator.admit_peer(PeerId::new(1)));
    assert!(host.coordinator.is_advertising());
    assert!(!host.coordinator.admit_peer(PeerId::new(1)));

    assert!(host.coordinator.admit_peer(PeerId::new(2)));
    settle().await;
    assert!(!host.coordinator.is_advertising());
    assert_eq!(host.proximity.stats().advertise_stopped, 1);
    assert_eq!(host.lan.stats().advertise_stopped, 1);

    assert!(host.coordinator.peer_left(&PeerId::new(2)));
    assert_eq!(host.coordinator.peer_count(), 1);
    assert!(!host.coordinator.is_advertising());
}
