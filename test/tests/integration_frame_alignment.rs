/// Alignment of independent tracking spaces onto one shared space, first
/// through a localized anchor, then through marker placement.
use std::f32::consts::FRAC_PI_2;

use colocate_client::{ClientError, ErrorEvent, FrameAligner, ReRootEvent};
use colocate_server::PlacementEvent;
use colocate_shared::{yaw_of, LocalizedPose, Pose, PoseSample, Quat, ServerMessage, Vec3};
use colocate_test::LocalNetwork;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        (actual - expected).length() < 1e-4,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[test]
fn two_devices_agree_on_a_point_after_localizing_the_same_anchor() {
    init_logger();
    // the same physical anchor, seen from two tracking spaces
    let anchor_on_a = Pose::new(Vec3::new(3.0, 0.0, 2.0), Quat::from_rotation_y(FRAC_PI_2));
    let anchor_on_b = Pose::new(Vec3::new(-1.0, 0.5, 0.0), Quat::from_rotation_y(-0.3));

    let mut a = FrameAligner::new();
    let mut b = FrameAligner::new();
    a.align_to(&LocalizedPose::try_from(anchor_on_a).expect("valid anchor"));
    b.align_to(&LocalizedPose::try_from(anchor_on_b).expect("valid anchor"));

    // a cup one meter in front of and half a meter above the anchor
    let offset = Pose::from_position(Vec3::new(0.0, 0.5, 1.0));
    let cup_on_a = anchor_on_a * offset;
    let cup_on_b = anchor_on_b * offset;

    let shared_a = a.to_shared(&cup_on_a);
    let shared_b = b.to_shared(&cup_on_b);
    assert_close(shared_a.position, offset.position);
    assert_close(shared_b.position, shared_a.position);

    // and each maps the shared pose back to its own tracking space
    assert_close(a.to_tracking(&shared_a).position, cup_on_a.position);
    assert_close(b.to_tracking(&shared_b).position, cup_on_b.position);
}

#[test]
fn placing_a_marker_reroots_every_peer() {
    init_logger();
    let mut net = LocalNetwork::default();
    let marker = net
        .server
        .spawn("marker", Pose::from_position(Vec3::new(2.0, 1.5, 3.0)))
        .expect("marker prefab");
    let a = net.add_client();
    let b = net.add_client();

    net.client_mut(a).request_hold(&marker);
    net.exchange();
    assert!(net.client(a).holds(&marker));

    let dropped = Pose::new(Vec3::new(2.0, 0.4, 3.0), Quat::from_rotation_y(FRAC_PI_2));
    let sample = PoseSample::from_pose(dropped, net.client(a).clock());
    net.client_mut(a).publish(&marker, sample, None);
    net.client_mut(a).set_placeable(&marker, true);
    assert!(net.client_mut(a).release(&marker));
    net.exchange();

    let placer = net.peer(a);
    let mut events = net.server.take_events();
    let placements: Vec<_> = events.read::<PlacementEvent>().collect();
    assert_eq!(placements.len(), 1);
    let (peer, placed_marker, placed) = placements[0];
    assert_eq!((peer, placed_marker), (placer, marker));
    assert_close(placed.position, Vec3::new(2.0, 0.0, 3.0));

    // the marker now sits at the shared origin, free for anyone
    assert_eq!(net.server.pose_of(&marker), Some(Pose::IDENTITY));
    assert_eq!(net.server.holder(&marker), None);

    for index in [a, b] {
        assert!(net.client_mut(index).take_events().has::<ReRootEvent>());
        let aligner = net.client(index).aligner();
        let origin = aligner.to_shared(&placed);
        assert_close(origin.position, Vec3::ZERO);
        assert!(yaw_of(origin.rotation).abs() < 1e-4);
    }
}

#[test]
fn releasing_an_unplaced_marker_does_not_reroot() {
    init_logger();
    let mut net = LocalNetwork::default();
    let marker = net
        .server
        .spawn("marker", Pose::from_position(Vec3::new(2.0, 1.5, 3.0)))
        .expect("marker prefab");
    let a = net.add_client();

    net.client_mut(a).request_hold(&marker);
    net.exchange();
    net.client_mut(a).release(&marker);
    net.exchange();

    assert!(!net.server.take_events().has::<PlacementEvent>());
    assert_eq!(net.client(a).aligner().root(), Pose::IDENTITY);
}

#[test]
fn invalid_reroot_is_reported_and_ignored() {
    init_logger();
    let mut net = LocalNetwork::default();
    let a = net.add_client();
    net.client_mut(a).take_events();

    net.client_mut(a).handle(ServerMessage::ReRoot {
        marker: Pose::from_position(Vec3::new(f32::NAN, 0.0, 0.0)),
    });

    assert_eq!(net.client(a).aligner().root(), Pose::IDENTITY);
    let mut events = net.client_mut(a).take_events();
    assert!(!events.has::<ReRootEvent>());
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(errors.as_slice(), [ClientError::ReRoot(_)]));
}

#[test]
fn reroot_with_non_finite_rotation_is_reported_and_ignored() {
    init_logger();
    let mut net = LocalNetwork::default();
    let a = net.add_client();
    net.client_mut(a).take_events();

    net.client_mut(a).handle(ServerMessage::ReRoot {
        marker: Pose::new(Vec3::new(2.0, 0.0, 1.0), Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0)),
    });

    assert_eq!(net.client(a).aligner().root(), Pose::IDENTITY);
    let mut events = net.client_mut(a).take_events();
    assert!(!events.has::<ReRootEvent>());
    let errors: Vec<_> = events.read::<ErrorEvent>().collect();
    assert!(matches!(errors.as_slice(), [ClientError::ReRoot(_)]));
}
