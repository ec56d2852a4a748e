use std::{
    collections::{BTreeSet, HashMap},
    mem,
    time::Duration,
};

use log::{debug, info, warn};

use colocate_shared::{
    ClientMessage, DriveInputs, Generation, IdGenerator, ObjectId, ObjectKind, PeerId, Pose,
    PoseSample, ServerMessage, SyncPublisher, Vec3,
};

use crate::{
    authority_table::{AuthorityChange, AuthorityTable},
    error::{ConnectError, ServerError},
    events::Events,
    object_registry::ObjectRegistry,
    ServerConfig,
};

/// The session coordinator's message handler. It owns the authority table
/// and the object registry, decodes what peers send, and queues what they
/// must receive. It performs no IO: the embedding application reports
/// connections, feeds received payloads in and drains `take_outgoing` into
/// its transport between two simulation steps.
pub struct Server {
    config: ServerConfig,
    peer_ids: IdGenerator,
    peers: BTreeSet<PeerId>,
    authority: AuthorityTable,
    objects: ObjectRegistry,
    host_moves: HashMap<ObjectId, SyncPublisher<Pose>>,
    clock: Duration,
    outgoing: Vec<(PeerId, ServerMessage)>,
    events: Events,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            peer_ids: IdGenerator::new(),
            peers: BTreeSet::new(),
            authority: AuthorityTable::new(),
            objects: ObjectRegistry::new(),
            host_moves: HashMap::new(),
            clock: Duration::ZERO,
            outgoing: Vec::new(),
            events: Events::new(),
        }
    }

    // Connections

    /// Admit a new transport connection. Past `max_peers` the connection is
    /// still given an id so that it can be told `SessionFull`, then refused.
    pub fn connect(&mut self) -> Result<PeerId, ConnectError> {
        let peer = self.peer_ids.next_peer();

        if self.peers.len() >= self.config.max_peers {
            warn!(
                "Refusing {}: session is full ({} peers)",
                peer, self.config.max_peers
            );
            self.outgoing.push((peer, ServerMessage::SessionFull));
            self.events.push_refusal(&peer);
            return Err(ConnectError::SessionFull {
                peer,
                capacity: self.config.max_peers,
            });
        }

        info!("{} connected", peer);
        self.peers.insert(peer);
        self.authority.connect_peer(peer);
        self.outgoing.push((peer, ServerMessage::Welcome { peer }));
        self.send_snapshot(&peer);
        self.events.push_connection(&peer);
        Ok(peer)
    }

    /// The transport lost `peer`. Everything it held goes back to Free and
    /// its vehicle is despawned.
    pub fn disconnect(&mut self, peer: &PeerId) {
        if !self.peers.remove(peer) {
            warn!("Attempting to disconnect unknown {}", peer);
            return;
        }
        info!("deleting {}", peer);

        self.authority.disconnect_peer(peer);
        if let Some(vehicle) = self.objects.vehicle_of(peer) {
            self.despawn(&vehicle);
        }
        self.flush_announcements();
        self.events.push_disconnection(peer);
    }

    pub fn is_connected(&self, peer: &PeerId) -> bool {
        self.peers.contains(peer)
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.iter()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    // Incoming

    /// Decode and handle one payload from `peer`. Undecodable payloads are
    /// dropped and reported as an `ErrorEvent`.
    pub fn receive(&mut self, peer: &PeerId, payload: &[u8]) {
        if !self.peers.contains(peer) {
            warn!("Dropping message from unknown {}", peer);
            self.events
                .push_error(ServerError::UnknownPeer { peer: *peer });
            return;
        }
        match ClientMessage::from_bytes(payload) {
            Ok(message) => self.handle(peer, message),
            Err(source) => {
                warn!("Server Error: cannot read malformed message from {}", peer);
                self.events.push_error(ServerError::Decode {
                    peer: *peer,
                    source,
                });
            }
        }
    }

    pub fn handle(&mut self, peer: &PeerId, message: ClientMessage) {
        if !self.peers.contains(peer) {
            self.events
                .push_error(ServerError::UnknownPeer { peer: *peer });
            return;
        }

        match message {
            ClientMessage::RequestHold { object } => {
                if !self.authority.request_hold(&object, peer).is_accepted() {
                    debug!("{} was refused {}", peer, object);
                }
            }
            ClientMessage::Release { object } => {
                self.authority.release(&object, peer);
            }
            ClientMessage::PoseUpdate {
                object,
                generation,
                sample,
                inputs,
            } => self.relay_pose(peer, object, generation, sample, inputs),
            ClientMessage::SpawnRequest { prefab, pose, grab } => {
                self.spawn_requested(peer, prefab, pose, grab)
            }
            ClientMessage::CommitPlacement { marker, pose } => {
                self.commit_placement(peer, marker, pose)
            }
        }
        self.flush_announcements();
    }

    fn relay_pose(
        &mut self,
        peer: &PeerId,
        object: ObjectId,
        generation: Generation,
        sample: PoseSample,
        inputs: Option<DriveInputs>,
    ) {
        if !self.authority.accepts_update(&object, peer, generation) {
            debug!(
                "Dropping pose of {} from {} under generation {}",
                object, peer, generation
            );
            return;
        }

        self.objects.set_pose(&object, sample.pose());
        let message = ServerMessage::PoseUpdate {
            object,
            generation,
            sample,
            inputs,
        };
        for other in self.peers.iter().filter(|other| *other != peer) {
            self.outgoing.push((*other, message.clone()));
        }
    }

    fn spawn_requested(&mut self, peer: &PeerId, prefab: String, pose: Pose, grab: bool) {
        let Some(kind) = self.config.prefabs.kind_of(&prefab) else {
            warn!("{} requested unknown prefab '{}'", peer, prefab);
            self.events.push_error(ServerError::UnknownPrefab {
                peer: *peer,
                prefab,
            });
            return;
        };

        let object = self.spawn_object(kind, &prefab, pose, Some(*peer));
        self.outgoing
            .push((*peer, ServerMessage::SpawnAssigned { object }));
        if grab {
            self.authority.force_assign(&object, peer);
        }
    }

    fn commit_placement(&mut self, peer: &PeerId, marker: ObjectId, pose: Pose) {
        let is_marker = self
            .objects
            .get(&marker)
            .is_some_and(|record| record.kind == ObjectKind::Marker);
        if !is_marker || self.authority.holder(&marker) != Some(*peer) {
            debug!("Dropping placement of {} from {}", marker, peer);
            return;
        }

        let placed = Pose::new(
            Vec3::new(pose.position.x, 0.0, pose.position.z),
            pose.rotation,
        );
        info!("{} placed {} at {:?}", peer, marker, placed.position);

        self.broadcast(ServerMessage::ReRoot { marker: placed });
        self.teleport(&marker, Pose::IDENTITY);
        self.events.push_placement(peer, &marker, placed);
    }

    // Host-side world

    /// Spawn a prefab owned by the session itself. Returns `None` for an
    /// unknown prefab.
    pub fn spawn(&mut self, prefab: &str, pose: Pose) -> Option<ObjectId> {
        let Some(kind) = self.config.prefabs.kind_of(prefab) else {
            warn!("Cannot spawn unknown prefab '{}'", prefab);
            return None;
        };
        Some(self.spawn_object(kind, prefab, pose, None))
    }

    pub fn despawn(&mut self, object: &ObjectId) -> bool {
        if self.objects.despawn(object).is_none() {
            return false;
        }
        self.authority.remove(object);
        self.host_moves.remove(object);
        self.broadcast(ServerMessage::Despawned { object: *object });
        self.events.push_despawn(object);
        true
    }

    /// Snap `object` to `pose` on every peer
    pub fn teleport(&mut self, object: &ObjectId, pose: Pose) -> bool {
        if !self.objects.set_pose(object, pose) {
            return false;
        }
        self.broadcast(ServerMessage::Teleport {
            object: *object,
            pose,
        });
        true
    }

    /// Move a free object from the host. Sends are rate-limited to the sync
    /// interval like any holder's. Held objects belong to their holder and
    /// are left alone.
    pub fn move_object(&mut self, object: &ObjectId, pose: Pose) -> bool {
        let is_free = self
            .authority
            .record(object)
            .is_some_and(|record| record.is_free());
        if !is_free {
            debug!("Not moving {}: it is held or unknown", object);
            return false;
        }

        let interval = self.config.sync.sync_interval;
        self.host_moves
            .entry(*object)
            .or_insert_with(|| SyncPublisher::new(interval))
            .publish(pose);
        true
    }

    /// Advance the session clock and flush host moves that are due
    pub fn tick(&mut self, delta: Duration) {
        self.clock += delta;

        let mut due = Vec::new();
        for (object, publisher) in self.host_moves.iter_mut() {
            if let Some(pose) = publisher.tick(delta) {
                due.push((*object, pose));
            }
        }
        due.sort_by_key(|(object, _)| *object);

        for (object, pose) in due {
            let Some(record) = self.authority.record(&object) else {
                continue;
            };
            if !record.is_free() {
                continue;
            }
            let generation = record.generation;
            self.objects.set_pose(&object, pose);
            self.broadcast(ServerMessage::PoseUpdate {
                object,
                generation,
                sample: PoseSample::from_pose(pose, self.clock),
                inputs: None,
            });
        }
    }

    fn spawn_object(
        &mut self,
        kind: ObjectKind,
        prefab: &str,
        pose: Pose,
        spawned_by: Option<PeerId>,
    ) -> ObjectId {
        let (object, replaced) = self.objects.spawn(kind, prefab, pose, spawned_by);
        if let Some(previous) = replaced {
            self.authority.remove(&previous);
            self.host_moves.remove(&previous);
            self.broadcast(ServerMessage::Despawned { object: previous });
            self.events.push_despawn(&previous);
        }

        info!("Spawned {} from '{}'", object, prefab);
        self.authority.insert(object, kind);
        self.broadcast(ServerMessage::Spawned {
            object,
            kind,
            prefab: prefab.to_string(),
            pose,
        });
        self.events.push_spawn(spawned_by, &object, kind);
        object
    }

    // Queries

    pub fn holder(&self, object: &ObjectId) -> Option<PeerId> {
        self.authority.holder(object)
    }

    pub fn authority(&self) -> &AuthorityTable {
        &self.authority
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn pose_of(&self, object: &ObjectId) -> Option<Pose> {
        self.objects.get(object).map(|record| record.pose)
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    // Outgoing

    /// Drain queued messages, encoded for the wire
    pub fn take_outgoing(&mut self) -> Vec<(PeerId, Vec<u8>)> {
        self.take_outgoing_messages()
            .into_iter()
            .map(|(peer, message)| (peer, message.to_bytes()))
            .collect()
    }

    pub fn take_outgoing_messages(&mut self) -> Vec<(PeerId, ServerMessage)> {
        mem::take(&mut self.outgoing)
    }

    pub fn take_events(&mut self) -> Events {
        mem::replace(&mut self.events, Events::new())
    }

    // Private

    fn send_snapshot(&mut self, peer: &PeerId) {
        for (object, record) in self.objects.iter() {
            self.outgoing.push((
                *peer,
                ServerMessage::Spawned {
                    object: *object,
                    kind: record.kind,
                    prefab: record.prefab.clone(),
                    pose: record.pose,
                },
            ));
            if let Some(change) = self.authority.snapshot(object) {
                self.outgoing.push((*peer, authority_message(change)));
            }
        }
    }

    fn flush_announcements(&mut self) {
        for change in self.authority.take_announcements() {
            match change.holder {
                Some(holder) => {
                    self.events
                        .push_auth_grant(&holder, &change.object, change.generation);
                    // a new holder drives the object from now on
                    self.host_moves.remove(&change.object);
                }
                None => self
                    .events
                    .push_auth_reset(&change.object, change.generation),
            }
            self.broadcast(authority_message(change));
        }
    }

    fn broadcast(&mut self, message: ServerMessage) {
        for peer in self.peers.iter() {
            self.outgoing.push((*peer, message.clone()));
        }
    }
}

fn authority_message(change: AuthorityChange) -> ServerMessage {
    ServerMessage::AuthorityChanged {
        object: change.object,
        holder: change.holder,
        generation: change.generation,
        kinematic: change.kinematic,
    }
}
