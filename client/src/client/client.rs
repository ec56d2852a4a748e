use std::{
    collections::{HashMap, HashSet},
    mem,
    time::Duration,
};

use log::{debug, info, warn};

use colocate_shared::{
    AuthorityReplica, ClientMessage, DriveInputs, Generation, Interpolator, ObjectId,
    ObjectKind, PeerId, Pose, PoseSample, ServerMessage, SyncPublisher, Vec3,
};

use crate::{error::ClientError, events::Events, ClientConfig, FrameAligner};

type Outbound = (PoseSample, Option<DriveInputs>);

/// A shared object as this peer knows it
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteObject {
    pub kind: ObjectKind,
    pub prefab: String,
    /// Last pose this peer published or was told to snap to
    pub pose: Pose,
}

/// A participant's view of the session. Mirrors the coordinator's authority
/// table, interpolates objects held by others and rate-limits the poses of
/// objects held here. It performs no IO: the application feeds payloads in
/// and drains `take_outgoing` into its transport.
pub struct Client {
    config: ClientConfig,
    peer: Option<PeerId>,
    rejected: bool,
    clock: Duration,
    replica: AuthorityReplica,
    objects: HashMap<ObjectId, RemoteObject>,
    poses: HashMap<ObjectId, Interpolator<PoseSample>>,
    inputs: HashMap<ObjectId, Interpolator<DriveInputs>>,
    publishers: HashMap<ObjectId, SyncPublisher<Outbound>>,
    placeable: HashSet<ObjectId>,
    aligner: FrameAligner,
    outgoing: Vec<ClientMessage>,
    events: Events,
}

impl Client {
    /// Create a new Client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            peer: None,
            rejected: false,
            clock: Duration::ZERO,
            replica: AuthorityReplica::new(),
            objects: HashMap::new(),
            poses: HashMap::new(),
            inputs: HashMap::new(),
            publishers: HashMap::new(),
            placeable: HashSet::new(),
            aligner: FrameAligner::new(),
            outgoing: Vec::new(),
            events: Events::new(),
        }
    }

    /// Our id, once the coordinator welcomed us
    pub fn peer_id(&self) -> Option<PeerId> {
        self.peer
    }

    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    /// Whether the coordinator turned us away because the session was full
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    // Incoming

    /// Decode and apply one payload from the coordinator. Undecodable
    /// payloads are dropped and reported as an `ErrorEvent`.
    pub fn receive(&mut self, payload: &[u8]) {
        match ServerMessage::from_bytes(payload) {
            Ok(message) => self.handle(message),
            Err(error) => {
                warn!("Client Error: cannot read malformed message: {}", error);
                self.events.push_error(ClientError::Decode(error));
            }
        }
    }

    pub fn handle(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Welcome { peer } => {
                info!("Connected as {}", peer);
                self.peer = Some(peer);
                self.events.push_connection(&peer);
            }
            ServerMessage::SessionFull => {
                warn!("Session is full");
                self.rejected = true;
                self.events.push_rejection();
            }
            ServerMessage::AuthorityChanged {
                object,
                holder,
                generation,
                kinematic,
            } => self.authority_changed(object, holder, generation, kinematic),
            ServerMessage::PoseUpdate {
                object,
                generation,
                sample,
                inputs,
            } => {
                let Some(current) = self.replica.generation(&object) else {
                    debug!("Dropping pose of unknown {}", object);
                    return;
                };
                if generation < current {
                    debug!(
                        "Dropping stale pose of {} (generation {} < {})",
                        object, generation, current
                    );
                    return;
                }
                if self.holds(&object) {
                    return;
                }
                self.receive_pose(object, sample, inputs);
            }
            ServerMessage::SpawnAssigned { object } => {
                self.events.push_spawn_assignment(&object);
            }
            ServerMessage::Spawned {
                object,
                kind,
                prefab,
                pose,
            } => {
                debug!("{} spawned from '{}'", object, prefab);
                self.replica.apply(object, None, 0, false);
                self.objects.insert(object, RemoteObject { kind, prefab, pose });
                self.snap(object, pose);
                self.events.push_spawn(&object, kind);
            }
            ServerMessage::Despawned { object } => {
                self.forget(&object);
                self.events.push_despawn(&object);
            }
            ServerMessage::Teleport { object, pose } => {
                if let Some(remote) = self.objects.get_mut(&object) {
                    remote.pose = pose;
                }
                if let Some(publisher) = self.publishers.get_mut(&object) {
                    publisher.clear();
                }
                self.snap(object, pose);
                self.events.push_teleport(&object, pose);
            }
            ServerMessage::ReRoot { marker } => match self.aligner.reroot_on_marker(&marker) {
                Ok(()) => self.events.push_reroot(marker),
                Err(error) => {
                    warn!("Ignoring re-root: {}", error);
                    self.events.push_error(ClientError::ReRoot(error));
                }
            },
        }
    }

    fn authority_changed(
        &mut self,
        object: ObjectId,
        holder: Option<PeerId>,
        generation: Generation,
        kinematic: bool,
    ) {
        if !self.objects.contains_key(&object) {
            debug!("Ignoring authority change for unknown {}", object);
            return;
        }
        let was_ours = self.holds(&object);
        if !self.replica.apply(object, holder, generation, kinematic) {
            debug!("No authority change for {}", object);
            return;
        }
        let is_ours = self.holds(&object);

        if is_ours && !was_ours {
            info!("Now holding {}", object);
            let interval = self.config.sync.sync_interval;
            self.publishers
                .insert(object, SyncPublisher::new(interval));
            self.events.push_auth_grant(&object);
        } else if was_ours && !is_ours {
            info!("No longer holding {}", object);
            self.publishers.remove(&object);
            // other peers keep blending from the last pose we published
            if let Some(remote) = self.objects.get(&object) {
                let pose = remote.pose;
                self.snap(object, pose);
            }
            self.events.push_auth_loss(&object);
        }
        self.events.push_authority(&object, holder, kinematic);
    }

    fn receive_pose(&mut self, object: ObjectId, sample: PoseSample, inputs: Option<DriveInputs>) {
        let interval = self.config.sync.sync_interval;
        self.poses
            .entry(object)
            .or_insert_with(|| Interpolator::new(interval))
            .receive(sample);
        if let Some(inputs) = inputs {
            self.inputs
                .entry(object)
                .or_insert_with(|| Interpolator::new(interval))
                .receive(inputs);
        }
    }

    /// Replace any blend in progress with `pose`
    fn snap(&mut self, object: ObjectId, pose: Pose) {
        let mut interpolator = Interpolator::new(self.config.sync.sync_interval);
        interpolator.receive(PoseSample::from_pose(pose, self.clock));
        self.poses.insert(object, interpolator);
    }

    fn forget(&mut self, object: &ObjectId) {
        self.replica.remove(object);
        self.objects.remove(object);
        self.poses.remove(object);
        self.inputs.remove(object);
        self.publishers.remove(object);
        self.placeable.remove(object);
    }

    // Authority

    pub fn holds(&self, object: &ObjectId) -> bool {
        self.peer
            .is_some_and(|peer| self.replica.is_held_by(object, &peer))
    }

    pub fn holder(&self, object: &ObjectId) -> Option<PeerId> {
        self.replica.holder(object)
    }

    /// Ask the coordinator for authority over `object`. The answer arrives
    /// as an authority announcement.
    pub fn request_hold(&mut self, object: &ObjectId) -> bool {
        if !self.objects.contains_key(object) {
            warn!("Cannot request unknown {}", object);
            return false;
        }
        self.outgoing
            .push(ClientMessage::RequestHold { object: *object });
        true
    }

    /// Give up authority over `object`. A pending pose is flushed first so
    /// that the final position reaches everyone. A placeable marker is
    /// committed to the floor before it is let go.
    pub fn release(&mut self, object: &ObjectId) -> bool {
        if !self.holds(object) {
            debug!("Not releasing {}: not the holder", object);
            return false;
        }

        if let Some((sample, inputs)) = self
            .publishers
            .get_mut(object)
            .and_then(SyncPublisher::flush)
        {
            self.send_pose(*object, sample, inputs);
        }

        if self.placeable.contains(object) && self.kind_of(object) == Some(ObjectKind::Marker) {
            if let Some(remote) = self.objects.get(object) {
                let pose = Pose::new(
                    Vec3::new(remote.pose.position.x, 0.0, remote.pose.position.z),
                    remote.pose.rotation,
                );
                info!("Committing placement of {}", object);
                self.outgoing.push(ClientMessage::CommitPlacement {
                    marker: *object,
                    pose,
                });
            }
        }

        self.outgoing.push(ClientMessage::Release { object: *object });
        true
    }

    // Transforms

    /// Queue the latest pose of a held object. Calls faster than the sync
    /// interval coalesce. Does nothing if this peer is not the holder.
    pub fn publish(
        &mut self,
        object: &ObjectId,
        sample: PoseSample,
        inputs: Option<DriveInputs>,
    ) -> bool {
        if !self.holds(object) {
            debug!("Not publishing {}: not the holder", object);
            return false;
        }
        if let Some(remote) = self.objects.get_mut(object) {
            remote.pose = sample.pose();
        }
        let interval = self.config.sync.sync_interval;
        self.publishers
            .entry(*object)
            .or_insert_with(|| SyncPublisher::new(interval))
            .publish((sample, inputs));
        true
    }

    /// Advance by one simulation step: send poses that are due and move
    /// every interpolation forward
    pub fn tick(&mut self, delta: Duration) {
        self.clock += delta;

        let mut due = Vec::new();
        for (object, publisher) in self.publishers.iter_mut() {
            if let Some((sample, inputs)) = publisher.tick(delta) {
                due.push((*object, sample, inputs));
            }
        }
        due.sort_by_key(|(object, _, _)| *object);
        for (object, sample, inputs) in due {
            self.send_pose(object, sample, inputs);
        }

        for interpolator in self.poses.values_mut() {
            interpolator.advance(delta);
        }
        for interpolator in self.inputs.values_mut() {
            interpolator.advance(delta);
        }
    }

    fn send_pose(&mut self, object: ObjectId, sample: PoseSample, inputs: Option<DriveInputs>) {
        let Some(generation) = self.replica.generation(&object) else {
            return;
        };
        self.outgoing.push(ClientMessage::PoseUpdate {
            object,
            generation,
            sample,
            inputs,
        });
    }

    /// Current pose of `object` in shared space. Held objects report what
    /// was last published; others report the interpolated pose.
    pub fn observe(&self, object: &ObjectId) -> Option<PoseSample> {
        if self.holds(object) {
            return self
                .objects
                .get(object)
                .map(|remote| PoseSample::from_pose(remote.pose, self.clock));
        }
        self.poses.get(object).and_then(Interpolator::current)
    }

    /// Same as `observe`, in this device's tracking space
    pub fn observe_tracking(&self, object: &ObjectId) -> Option<Pose> {
        self.observe(object)
            .map(|sample| self.aligner.to_tracking(&sample.pose()))
    }

    pub fn observe_inputs(&self, object: &ObjectId) -> Option<DriveInputs> {
        self.inputs.get(object).and_then(Interpolator::current)
    }

    // World

    /// Ask the coordinator to spawn `prefab`. With `grab` set the new object
    /// is assigned to us straight away.
    pub fn spawn(&mut self, prefab: &str, pose: Pose, grab: bool) {
        self.outgoing.push(ClientMessage::SpawnRequest {
            prefab: prefab.to_string(),
            pose,
            grab,
        });
    }

    /// Mark a marker as resting on a detected floor. Releasing it while
    /// placeable commits the placement.
    pub fn set_placeable(&mut self, marker: &ObjectId, placeable: bool) {
        if placeable {
            self.placeable.insert(*marker);
        } else {
            self.placeable.remove(marker);
        }
    }

    pub fn is_placeable(&self, marker: &ObjectId) -> bool {
        self.placeable.contains(marker)
    }

    pub fn kind_of(&self, object: &ObjectId) -> Option<ObjectKind> {
        self.objects.get(object).map(|remote| remote.kind)
    }

    pub fn object(&self, object: &ObjectId) -> Option<&RemoteObject> {
        self.objects.get(object)
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &RemoteObject)> {
        self.objects.iter()
    }

    pub fn aligner(&self) -> &FrameAligner {
        &self.aligner
    }

    pub fn aligner_mut(&mut self) -> &mut FrameAligner {
        &mut self.aligner
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    // Outgoing

    /// Drain queued messages, encoded for the wire
    pub fn take_outgoing(&mut self) -> Vec<Vec<u8>> {
        self.take_outgoing_messages()
            .iter()
            .map(ClientMessage::to_bytes)
            .collect()
    }

    pub fn take_outgoing_messages(&mut self) -> Vec<ClientMessage> {
        mem::take(&mut self.outgoing)
    }

    pub fn take_events(&mut self) -> Events {
        mem::replace(&mut self.events, Events::new())
    }

    /// Drop all session state, keeping the configuration
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
