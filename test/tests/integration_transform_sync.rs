/// Transform sync between participants: rate-limited publishing by the
/// holder, interpolation on every other peer, and host-driven moves.
use std::time::Duration;

use colocate_shared::{DriveInputs, ObjectId, Pose, PoseSample, Vec3};
use colocate_test::LocalNetwork;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const INTERVAL: Duration = Duration::from_millis(100);

fn observed_x(net: &LocalNetwork, index: usize, object: &ObjectId) -> f32 {
    net.client(index)
        .observe(object)
        .expect("object is known")
        .position
        .x
}

#[test]
fn remote_peer_interpolates_over_one_interval() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();
    net.client_mut(a).request_hold(&cube);
    net.exchange();

    let sample = PoseSample::from_pose(Pose::from_position(Vec3::X), net.client(a).clock());
    net.client_mut(a).publish(&cube, sample, None);

    // sent once the interval has elapsed, received at the end of that step
    net.tick(INTERVAL);
    assert_eq!(observed_x(&net, b, &cube), 0.0);

    net.tick(Duration::from_millis(50));
    assert!((observed_x(&net, b, &cube) - 0.5).abs() < 1e-4);

    net.tick(Duration::from_millis(50));
    assert_eq!(observed_x(&net, b, &cube), 1.0);

    net.tick(Duration::from_millis(250));
    assert_eq!(observed_x(&net, b, &cube), 1.0);

    // the holder sees its own pose, not an interpolation
    assert_eq!(observed_x(&net, a, &cube), 1.0);
}

#[test]
fn publishes_within_an_interval_coalesce() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();
    net.client_mut(a).request_hold(&cube);
    net.exchange();

    for (x, step) in [(1.0, 30), (2.0, 30), (3.0, 40)] {
        let clock = net.client(a).clock();
        let sample = PoseSample::from_pose(Pose::from_position(Vec3::new(x, 0.0, 0.0)), clock);
        net.client_mut(a).publish(&cube, sample, None);
        net.tick(Duration::from_millis(step));
    }
    // only the last pose left, and it only just arrived
    assert_eq!(observed_x(&net, b, &cube), 0.0);
    assert_eq!(net.server.pose_of(&cube).map(|pose| pose.position.x), Some(3.0));

    net.tick(INTERVAL);
    assert_eq!(observed_x(&net, b, &cube), 3.0);

    // nothing queued, nothing sent
    net.tick_for(Duration::from_millis(500), Duration::from_millis(20));
    assert_eq!(observed_x(&net, b, &cube), 3.0);
}

#[test]
fn vehicle_inputs_travel_with_the_pose() {
    init_logger();
    let mut net = LocalNetwork::default();
    let a = net.add_client();
    let b = net.add_client();
    net.client_mut(a).spawn("car", Pose::IDENTITY, true);
    net.exchange();
    let driver = net.peer(a);
    let car = net.server.objects().vehicle_of(&driver).expect("car spawned");
    assert!(net.client(a).holds(&car));

    let inputs = DriveInputs {
        steering: 0.5,
        throttle: 1.0,
        brake: 0.0,
    };
    let sample = PoseSample::from_pose(
        Pose::from_position(Vec3::new(0.0, 0.0, 2.0)),
        net.client(a).clock(),
    );
    net.client_mut(a).publish(&car, sample, Some(inputs));
    net.tick(INTERVAL);
    net.tick(INTERVAL);

    assert_eq!(net.client(b).observe_inputs(&car), Some(inputs));
    let observed = net.client(b).observe(&car).expect("car is known");
    assert_eq!(observed.position, Vec3::new(0.0, 0.0, 2.0));
}

#[test]
fn host_moves_free_objects_only() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();

    assert!(net.server.move_object(&cube, Pose::from_position(Vec3::X)));
    net.tick(INTERVAL);
    net.tick(INTERVAL);
    assert_eq!(observed_x(&net, a, &cube), 1.0);
    assert_eq!(observed_x(&net, b, &cube), 1.0);

    net.client_mut(a).request_hold(&cube);
    net.exchange();
    assert!(!net.server.move_object(&cube, Pose::from_position(Vec3::new(4.0, 0.0, 0.0))));
}

#[test]
fn teleport_snaps_without_blending() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();

    let target = Pose::from_position(Vec3::new(0.0, 1.0, -2.0));
    assert!(net.server.teleport(&cube, target));
    net.exchange();

    let observed = net.client(a).observe(&cube).expect("cube is known");
    assert_eq!(observed.position, target.position);
}
