/// Peer-side join: discover the session, load the group's anchors, localize
/// one and align to it, then connect and see shared objects in place.
use std::{f32::consts::FRAC_PI_2, sync::Arc, time::Duration};

use colocate_client::{FrameAligner, JoinError, SessionJoiner};
use colocate_shared::{
    discovery::DiscoveryError, CancellationToken, DiscoveryRace, GroupId, LocalizedPose, Pose,
    Quat, RetryError, RetryPolicy, SessionDescriptor, Vec3,
};
use colocate_test::{AnchorOp, LocalNetwork, MockAnchorRepository, ScriptedChannel};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn anchor_on_device() -> Pose {
    Pose::new(Vec3::new(3.0, 0.0, 2.0), Quat::from_rotation_y(FRAC_PI_2))
}

struct Joining {
    joiner: SessionJoiner,
    anchors: Arc<MockAnchorRepository>,
    session: SessionDescriptor,
    cancel: CancellationToken,
}

fn joining() -> Joining {
    let session = SessionDescriptor::new(GroupId::generate(), "10.0.0.2:7000");
    let anchors = Arc::new(MockAnchorRepository::new());
    let device_pose = anchor_on_device();
    anchors.set_localized_pose(
        LocalizedPose::try_new(device_pose.position, device_pose.rotation).expect("valid pose"),
    );

    let cancel = CancellationToken::new();
    let discovery = DiscoveryRace::new(
        Arc::new(ScriptedChannel::resolving(
            "proximity",
            Duration::from_millis(300),
            session.clone(),
        )),
        Arc::new(ScriptedChannel::silent("lan")),
        Duration::from_secs(10),
        cancel.clone(),
    );
    let retry = RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(500),
    };
    let joiner = SessionJoiner::new(discovery, anchors.clone(), retry, cancel.clone());
    Joining {
        joiner,
        anchors,
        session,
        cancel,
    }
}

#[tokio::test(start_paused = true)]
async fn join_aligns_to_the_shared_anchor() {
    init_logger();
    let joining = joining();
    let anchor = joining.anchors.next_anchor();
    joining.anchors.publish(joining.session.group_id, anchor);

    let mut aligner = FrameAligner::new();
    let joined = joining.joiner.join(&mut aligner).await;
    assert_eq!(joined, Ok(joining.session.clone()));

    // the anchor becomes the shared origin
    let origin = aligner.to_shared(&anchor_on_device());
    assert!(origin.position.length() < 1e-4);
    assert!(origin.rotation.angle_between(Quat::IDENTITY) < 1e-3);
}

#[tokio::test(start_paused = true)]
async fn unlocalizable_anchor_is_skipped() {
    init_logger();
    let joining = joining();
    let lost = joining.anchors.next_anchor();
    let found = joining.anchors.next_anchor();
    joining.anchors.publish(joining.session.group_id, lost);
    joining.anchors.publish(joining.session.group_id, found);
    joining.anchors.set_unlocalizable(lost);

    let mut aligner = FrameAligner::new();
    assert!(joining.joiner.join(&mut aligner).await.is_ok());
    assert_eq!(joining.anchors.calls(AnchorOp::Localize), 2);
    assert_ne!(aligner.root(), Pose::IDENTITY);
}

#[tokio::test(start_paused = true)]
async fn no_localizable_anchor_fails_the_join() {
    init_logger();
    let joining = joining();
    for _ in 0..2 {
        let anchor = joining.anchors.next_anchor();
        joining.anchors.publish(joining.session.group_id, anchor);
        joining.anchors.set_unlocalizable(anchor);
    }

    let mut aligner = FrameAligner::new();
    assert_eq!(
        joining.joiner.join(&mut aligner).await,
        Err(JoinError::NotLocalized {
            group: joining.session.group_id,
            attempted: 2,
        })
    );
    assert_eq!(aligner.root(), Pose::IDENTITY);
}

#[tokio::test(start_paused = true)]
async fn group_without_anchors_fails_the_join() {
    init_logger();
    let joining = joining();
    let mut aligner = FrameAligner::new();
    assert_eq!(
        joining.joiner.join(&mut aligner).await,
        Err(JoinError::NoAnchors {
            group: joining.session.group_id
        })
    );
}

#[tokio::test(start_paused = true)]
async fn anchor_loading_is_retried() {
    init_logger();
    let joining = joining();
    let anchor = joining.anchors.next_anchor();
    joining.anchors.publish(joining.session.group_id, anchor);
    joining.anchors.fail(AnchorOp::Load, 2);

    let mut aligner = FrameAligner::new();
    assert!(joining.joiner.join(&mut aligner).await.is_ok());
    assert_eq!(joining.anchors.calls(AnchorOp::Load), 3);

    let failing = self::joining();
    failing.anchors.fail(AnchorOp::Load, 10);
    let result = failing.joiner.join(&mut FrameAligner::new()).await;
    assert!(matches!(
        result,
        Err(JoinError::LoadAnchors {
            source: RetryError::Exhausted { attempts: 3, .. },
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn nothing_found_is_a_discovery_error() {
    init_logger();
    let cancel = CancellationToken::new();
    let failed = || DiscoveryError::DiscoveryFailed {
        channel: "scripted",
        reason: "nobody around".to_string(),
    };
    let discovery = DiscoveryRace::new(
        Arc::new(ScriptedChannel::failing("proximity", Duration::from_millis(10), failed())),
        Arc::new(ScriptedChannel::failing("lan", Duration::from_millis(10), failed())),
        Duration::from_secs(10),
        cancel.clone(),
    );
    let joiner = SessionJoiner::new(
        discovery,
        Arc::new(MockAnchorRepository::new()),
        RetryPolicy::default(),
        cancel,
    );

    assert_eq!(
        joiner.join(&mut FrameAligner::new()).await,
        Err(JoinError::Discovery(DiscoveryError::Exhausted))
    );
}

#[tokio::test(start_paused = true)]
async fn cancelling_abandons_the_join() {
    init_logger();
    let joining = joining();
    joining.anchors.fail(AnchorOp::Load, 10);
    let cancel = joining.cancel.clone();
    tokio::spawn(async move {
        // discovery resolves at 300 ms, loading then retries every 500 ms
        tokio::time::sleep(Duration::from_millis(600)).await;
        cancel.cancel();
    });

    assert_eq!(
        joining.joiner.join(&mut FrameAligner::new()).await,
        Err(JoinError::Cancelled)
    );
    assert_eq!(joining.anchors.calls(AnchorOp::Load), 1);
}

#[tokio::test(start_paused = true)]
async fn joined_peer_sees_shared_objects_in_its_tracking_space() {
    init_logger();
    let joining = joining();
    let anchor = joining.anchors.next_anchor();
    joining.anchors.publish(joining.session.group_id, anchor);

    let mut aligner = FrameAligner::new();
    joining
        .joiner
        .join(&mut aligner)
        .await
        .expect("join succeeds");

    let mut net = LocalNetwork::default();
    let offset = Pose::from_position(Vec3::new(0.0, 1.0, 1.0));
    let cube = net.server.spawn("cube", offset).expect("cube prefab");
    let peer = net.add_client();
    *net.client_mut(peer).aligner_mut() = aligner;

    let seen = net
        .client(peer)
        .observe_tracking(&cube)
        .expect("cube in snapshot");
    let expected = anchor_on_device() * offset;
    assert!((seen.position - expected.position).length() < 1e-4);
}
