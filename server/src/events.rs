use std::{mem, vec::IntoIter};

use colocate_shared::{Generation, ObjectId, ObjectKind, PeerId, Pose};

use crate::error::ServerError;

/// Everything that happened on the coordinator since the last
/// `Server::take_events`
pub struct Events {
    connections: Vec<PeerId>,
    disconnections: Vec<PeerId>,
    refusals: Vec<PeerId>,
    auth_grants: Vec<(PeerId, ObjectId, Generation)>,
    auth_resets: Vec<(ObjectId, Generation)>,
    spawns: Vec<(Option<PeerId>, ObjectId, ObjectKind)>,
    despawns: Vec<ObjectId>,
    placements: Vec<(PeerId, ObjectId, Pose)>,
    errors: Vec<ServerError>,

    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            refusals: Vec::new(),
            auth_grants: Vec::new(),
            auth_resets: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
            placements: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, peer: &PeerId) {
        self.connections.push(*peer);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, peer: &PeerId) {
        self.disconnections.push(*peer);
        self.empty = false;
    }

    pub(crate) fn push_refusal(&mut self, peer: &PeerId) {
        self.refusals.push(*peer);
        self.empty = false;
    }

    pub(crate) fn push_auth_grant(&mut self, peer: &PeerId, object: &ObjectId, generation: Generation) {
        self.auth_grants.push((*peer, *object, generation));
        self.empty = false;
    }

    pub(crate) fn push_auth_reset(&mut self, object: &ObjectId, generation: Generation) {
        self.auth_resets.push((*object, generation));
        self.empty = false;
    }

    pub(crate) fn push_spawn(&mut self, by: Option<PeerId>, object: &ObjectId, kind: ObjectKind) {
        self.spawns.push((by, *object, kind));
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, object: &ObjectId) {
        self.despawns.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_placement(&mut self, peer: &PeerId, marker: &ObjectId, pose: Pose) {
        self.placements.push((*peer, *marker, pose));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ServerError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// RefuseEvent, a connection turned away because the session is full
pub struct RefuseEvent;
impl Event for RefuseEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.refusals).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.refusals.is_empty()
    }
}

// AuthGrantEvent
pub struct AuthGrantEvent;
impl Event for AuthGrantEvent {
    type Iter = IntoIter<(PeerId, ObjectId, Generation)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.auth_grants).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.auth_grants.is_empty()
    }
}

// AuthResetEvent, an object went back to Free
pub struct AuthResetEvent;
impl Event for AuthResetEvent {
    type Iter = IntoIter<(ObjectId, Generation)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.auth_resets).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.auth_resets.is_empty()
    }
}

// SpawnEvent
pub struct SpawnEvent;
impl Event for SpawnEvent {
    type Iter = IntoIter<(Option<PeerId>, ObjectId, ObjectKind)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.spawns).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.spawns.is_empty()
    }
}

// DespawnEvent
pub struct DespawnEvent;
impl Event for DespawnEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.despawns).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.despawns.is_empty()
    }
}

// PlacementEvent
pub struct PlacementEvent;
impl Event for PlacementEvent {
    type Iter = IntoIter<(PeerId, ObjectId, Pose)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.placements).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.placements.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<ServerError>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
