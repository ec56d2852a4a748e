use std::{mem, vec::IntoIter};

use colocate_shared::{ObjectId, ObjectKind, PeerId, Pose};

use crate::error::ClientError;

/// Everything the coordinator told this peer since the last
/// `Client::take_events`
pub struct Events {
    connections: Vec<PeerId>,
    rejections: usize,
    authority: Vec<(ObjectId, Option<PeerId>, bool)>,
    auth_grants: Vec<ObjectId>,
    auth_losses: Vec<ObjectId>,
    spawns: Vec<(ObjectId, ObjectKind)>,
    spawn_assignments: Vec<ObjectId>,
    despawns: Vec<ObjectId>,
    teleports: Vec<(ObjectId, Pose)>,
    reroots: Vec<Pose>,
    errors: Vec<ClientError>,

    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            rejections: 0,
            authority: Vec::new(),
            auth_grants: Vec::new(),
            auth_losses: Vec::new(),
            spawns: Vec::new(),
            spawn_assignments: Vec::new(),
            despawns: Vec::new(),
            teleports: Vec::new(),
            reroots: Vec::new(),
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

    pub(crate) fn push_rejection(&mut self) {
        self.rejections += 1;
        self.empty = false;
    }

    pub(crate) fn push_authority(&mut self, object: &ObjectId, holder: Option<PeerId>, kinematic: bool) {
        self.authority.push((*object, holder, kinematic));
        self.empty = false;
    }

    pub(crate) fn push_auth_grant(&mut self, object: &ObjectId) {
        self.auth_grants.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_auth_loss(&mut self, object: &ObjectId) {
        self.auth_losses.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_spawn(&mut self, object: &ObjectId, kind: ObjectKind) {
        self.spawns.push((*object, kind));
        self.empty = false;
    }

    pub(crate) fn push_spawn_assignment(&mut self, object: &ObjectId) {
        self.spawn_assignments.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, object: &ObjectId) {
        self.despawns.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_teleport(&mut self, object: &ObjectId, pose: Pose) {
        self.teleports.push((*object, pose));
        self.empty = false;
    }

    pub(crate) fn push_reroot(&mut self, marker: Pose) {
        self.reroots.push(marker);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ClientError) {
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

// ConnectEvent, the coordinator welcomed us with our peer id
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

// RejectEvent, the session was full
pub struct RejectEvent;
impl Event for RejectEvent {
    type Iter = IntoIter<()>;

    fn iter(events: &mut Events) -> Self::Iter {
        let count = mem::take(&mut events.rejections);
        vec![(); count].into_iter()
    }

    fn has(events: &Events) -> bool {
        events.rejections > 0
    }
}

// AuthorityEvent, any accepted authority change. Carries the physics
// decision to apply locally.
pub struct AuthorityEvent;
impl Event for AuthorityEvent {
    type Iter = IntoIter<(ObjectId, Option<PeerId>, bool)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.authority).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.authority.is_empty()
    }
}

// AuthGrantEvent, this peer became the holder
pub struct AuthGrantEvent;
impl Event for AuthGrantEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.auth_grants).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.auth_grants.is_empty()
    }
}

// AuthLossEvent, this peer stopped being the holder
pub struct AuthLossEvent;
impl Event for AuthLossEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.auth_losses).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.auth_losses.is_empty()
    }
}

// SpawnEvent
pub struct SpawnEvent;
impl Event for SpawnEvent {
    type Iter = IntoIter<(ObjectId, ObjectKind)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.spawns).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.spawns.is_empty()
    }
}

// SpawnAssignedEvent, an object created by our own request
pub struct SpawnAssignedEvent;
impl Event for SpawnAssignedEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.spawn_assignments).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.spawn_assignments.is_empty()
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

// TeleportEvent
pub struct TeleportEvent;
impl Event for TeleportEvent {
    type Iter = IntoIter<(ObjectId, Pose)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.teleports).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.teleports.is_empty()
    }
}

// ReRootEvent
pub struct ReRootEvent;
impl Event for ReRootEvent {
    type Iter = IntoIter<Pose>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.reroots).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.reroots.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<ClientError>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
