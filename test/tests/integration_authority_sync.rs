/// Authority over shared objects, exercised through real encoded messages
/// between a coordinator and several participants.
use colocate_client::{AuthGrantEvent, AuthLossEvent, RejectEvent};
use colocate_server::{DespawnEvent, DisconnectEvent, RefuseEvent, ServerConfig};
use colocate_shared::{ClientMessage, ObjectKind, Pose, PoseSample, ServerMessage, Vec3};
use colocate_test::LocalNetwork;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn request_hold_is_announced_to_everyone() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();

    assert!(net.client_mut(a).request_hold(&cube));
    net.exchange();

    let holder = net.peer(a);
    assert_eq!(net.server.holder(&cube), Some(holder));
    assert!(net.client(a).holds(&cube));
    assert!(!net.client(b).holds(&cube));
    assert_eq!(net.client(b).holder(&cube), Some(holder));
    assert!(net.client_mut(a).take_events().has::<AuthGrantEvent>());
}

#[test]
fn contested_request_transfers_to_the_latest_requester() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();

    net.client_mut(a).request_hold(&cube);
    net.exchange();
    net.client_mut(b).request_hold(&cube);
    net.exchange();

    assert_eq!(net.server.holder(&cube), Some(net.peer(b)));
    assert!(net.client(b).holds(&cube));
    assert!(!net.client(a).holds(&cube));

    let mut events = net.client_mut(a).take_events();
    assert_eq!(events.read::<AuthGrantEvent>().collect::<Vec<_>>(), vec![cube]);
    assert_eq!(events.read::<AuthLossEvent>().collect::<Vec<_>>(), vec![cube]);

    // a lost authority, so its publishes go nowhere
    let sample = PoseSample::from_pose(Pose::from_position(Vec3::X), net.client(a).clock());
    assert!(!net.client_mut(a).publish(&cube, sample, None));
}

#[test]
fn stale_update_from_previous_holder_is_dropped() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();
    let c = net.add_client();

    net.client_mut(a).request_hold(&cube);
    net.exchange();
    net.client_mut(b).request_hold(&cube);
    net.exchange();
    net.server.take_outgoing_messages();

    // a's update was authored under generation 1, b now holds under 2
    let stale = PoseSample::from_pose(
        Pose::from_position(Vec3::new(5.0, 0.0, 0.0)),
        net.server.clock(),
    );
    let previous_holder = net.peer(a);
    net.server.handle(
        &previous_holder,
        ClientMessage::PoseUpdate {
            object: cube,
            generation: 1,
            sample: stale,
            inputs: None,
        },
    );
    assert!(net.server.take_outgoing_messages().is_empty());
    assert_eq!(net.server.pose_of(&cube), Some(Pose::IDENTITY));

    // a replica that already saw generation 2 ignores generation 1 as well
    net.client_mut(c).handle(ServerMessage::PoseUpdate {
        object: cube,
        generation: 1,
        sample: stale,
        inputs: None,
    });
    let observed = net.client(c).observe(&cube).expect("cube is known");
    assert_eq!(observed.position, Vec3::ZERO);
}

#[test]
fn only_the_holder_can_release() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();

    net.client_mut(a).request_hold(&cube);
    net.exchange();

    assert!(!net.client_mut(b).release(&cube));
    let bystander = net.peer(b);
    net.server.handle(&bystander, ClientMessage::Release { object: cube });
    net.exchange();
    assert_eq!(net.server.holder(&cube), Some(net.peer(a)));

    assert!(net.client_mut(a).release(&cube));
    net.exchange();
    assert_eq!(net.server.holder(&cube), None);
    assert_eq!(net.client(b).holder(&cube), None);
    assert_eq!(
        net.server.authority().record(&cube).map(|record| record.generation),
        Some(2)
    );
}

#[test]
fn disconnect_frees_held_objects_and_removes_vehicle() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let b = net.add_client();

    net.client_mut(a).request_hold(&cube);
    net.client_mut(a).spawn("car", Pose::from_position(Vec3::new(0.0, 0.0, 2.0)), true);
    net.exchange();

    let driver = net.peer(a);
    let car = net
        .server
        .objects()
        .vehicle_of(&driver)
        .expect("car spawned for a");
    assert!(net.client(a).holds(&car));
    assert_eq!(net.client(b).kind_of(&car), Some(ObjectKind::Vehicle));
    net.server.take_events();

    net.disconnect(a);

    assert_eq!(net.server.holder(&cube), None);
    assert_eq!(net.client(b).holder(&cube), None);
    assert!(net.client(b).object(&car).is_none());
    assert!(!net.server.objects().contains(&car));

    let mut events = net.server.take_events();
    assert_eq!(
        events.read::<DisconnectEvent>().collect::<Vec<_>>(),
        vec![net.peer(a)]
    );
    assert_eq!(events.read::<DespawnEvent>().collect::<Vec<_>>(), vec![car]);

    // b can pick the cube up right away
    net.client_mut(b).request_hold(&cube);
    net.exchange();
    assert!(net.client(b).holds(&cube));
}

#[test]
fn despawned_vehicle_gets_no_authority_message() {
    init_logger();
    let mut net = LocalNetwork::default();
    let a = net.add_client();
    let b = net.add_client();

    net.client_mut(a).spawn("car", Pose::IDENTITY, true);
    net.exchange();
    let driver = net.peer(a);
    let watcher = net.peer(b);
    let car = net
        .server
        .objects()
        .vehicle_of(&driver)
        .expect("car spawned for a");
    assert!(net.client(a).holds(&car));

    net.server.disconnect(&driver);

    let to_watcher: Vec<_> = net
        .server
        .take_outgoing_messages()
        .into_iter()
        .filter(|(to, _)| *to == watcher)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(to_watcher, vec![ServerMessage::Despawned { object: car }]);
}

#[test]
fn authority_for_a_despawned_object_is_ignored() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();
    let other = net.add_client();
    let holder = net.peer(other);

    net.server.despawn(&cube);
    net.exchange();
    assert!(net.client(a).object(&cube).is_none());

    net.client_mut(a).handle(ServerMessage::AuthorityChanged {
        object: cube,
        holder: Some(holder),
        generation: 2,
        kinematic: true,
    });
    net.client_mut(a).handle(ServerMessage::PoseUpdate {
        object: cube,
        generation: 2,
        sample: PoseSample::from_pose(Pose::from_position(Vec3::X), Default::default()),
        inputs: None,
    });

    assert_eq!(net.client(a).holder(&cube), None);
    assert!(net.client(a).observe(&cube).is_none());
}

#[test]
fn late_joiner_receives_current_state() {
    init_logger();
    let mut net = LocalNetwork::default();
    let cube = net.server.spawn("cube", Pose::IDENTITY).expect("cube prefab");
    let a = net.add_client();

    net.client_mut(a).request_hold(&cube);
    net.exchange();
    let moved = Pose::from_position(Vec3::new(1.0, 2.0, 3.0));
    let sample = PoseSample::from_pose(moved, net.client(a).clock());
    net.client_mut(a).publish(&cube, sample, None);
    net.tick(std::time::Duration::from_millis(100));
    assert_eq!(net.server.pose_of(&cube), Some(moved));

    let late = net.add_client();
    let client = net.client(late);
    assert_eq!(client.holder(&cube), Some(net.peer(a)));
    assert_eq!(client.kind_of(&cube), Some(ObjectKind::Grabbable));
    let observed = client.observe(&cube).expect("cube in snapshot");
    assert_eq!(observed.position, moved.position);
}

#[test]
fn session_full_refuses_extra_peers() {
    init_logger();
    let mut net = LocalNetwork::new(ServerConfig {
        max_peers: 2,
        ..Default::default()
    });
    let a = net.add_client();
    let b = net.add_client();
    let c = net.add_client();

    assert!(net.client(a).is_connected());
    assert!(net.client(b).is_connected());
    assert!(!net.client(c).is_connected());
    assert!(net.client(c).is_rejected());
    assert!(net.client_mut(c).take_events().has::<RejectEvent>());

    assert_eq!(net.server.peer_count(), 2);
    let mut events = net.server.take_events();
    assert_eq!(
        events.read::<RefuseEvent>().collect::<Vec<_>>(),
        vec![net.peer(c)]
    );
}
