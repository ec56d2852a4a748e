use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};

use colocate_shared::{
    AuthResult, AuthorityRecord, AuthorityState, Generation, ObjectId, ObjectKind, PeerId,
};

/// An authority transition that every peer must hear about
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorityChange {
    pub object: ObjectId,
    pub holder: Option<PeerId>,
    pub generation: Generation,
    /// Physics decision taken by the coordinator for this transition
    pub kinematic: bool,
}

struct TableEntry {
    kind: ObjectKind,
    record: AuthorityRecord,
}

impl TableEntry {
    fn kinematic(&self) -> bool {
        self.kind.toggles_kinematic() && !self.record.is_free()
    }

    fn change(&self, object: ObjectId) -> AuthorityChange {
        AuthorityChange {
            object,
            holder: self.record.holder(),
            generation: self.record.generation,
            kinematic: self.kinematic(),
        }
    }
}

/// Ground truth of who may move which object. Only the coordinator owns one;
/// peers keep an `AuthorityReplica` fed by the announcements queued here.
pub struct AuthorityTable {
    entries: BTreeMap<ObjectId, TableEntry>,
    connected: HashSet<PeerId>,
    announcements: Vec<AuthorityChange>,
}

impl AuthorityTable {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            connected: HashSet::new(),
            announcements: Vec::new(),
        }
    }

    // Peers

    pub fn connect_peer(&mut self, peer: PeerId) {
        self.connected.insert(peer);
    }

    /// Force-release everything `peer` held. Returns the released objects.
    pub fn disconnect_peer(&mut self, peer: &PeerId) -> Vec<ObjectId> {
        self.connected.remove(peer);

        let mut released = Vec::new();
        for (object, entry) in self.entries.iter_mut() {
            if !entry.record.is_held_by(peer) {
                continue;
            }
            entry.record.state = AuthorityState::Free;
            entry.record.generation += 1;
            self.announcements.push(entry.change(*object));
            released.push(*object);
        }
        if !released.is_empty() {
            info!(
                "{} disconnected, released {} held object(s)",
                peer,
                released.len()
            );
        }
        released
    }

    pub fn is_connected(&self, peer: &PeerId) -> bool {
        self.connected.contains(peer)
    }

    // Objects

    pub fn insert(&mut self, object: ObjectId, kind: ObjectKind) {
        self.entries.insert(
            object,
            TableEntry {
                kind,
                record: AuthorityRecord::new(),
            },
        );
    }

    /// Stop tracking `object`. Announcements still queued for it are dropped.
    pub fn remove(&mut self, object: &ObjectId) -> Option<AuthorityRecord> {
        self.announcements.retain(|change| change.object != *object);
        self.entries.remove(object).map(|entry| entry.record)
    }

    pub fn record(&self, object: &ObjectId) -> Option<&AuthorityRecord> {
        self.entries.get(object).map(|entry| &entry.record)
    }

    pub fn holder(&self, object: &ObjectId) -> Option<PeerId> {
        self.record(object).and_then(AuthorityRecord::holder)
    }

    /// Current state of `object` as an announcement, for late joiners
    pub fn snapshot(&self, object: &ObjectId) -> Option<AuthorityChange> {
        self.entries.get(object).map(|entry| entry.change(*object))
    }

    // Transitions

    /// Free objects are granted. A repeat request from the holder is
    /// re-announced without a generation bump. A request for an object held
    /// by someone else transfers it: the last writer wins.
    pub fn request_hold(&mut self, object: &ObjectId, peer: &PeerId) -> AuthResult {
        if !self.connected.contains(peer) {
            debug!("Rejecting hold of {} from disconnected {}", object, peer);
            return AuthResult::Rejected;
        }
        let Some(entry) = self.entries.get_mut(object) else {
            debug!("Rejecting hold of unknown {} from {}", object, peer);
            return AuthResult::Rejected;
        };

        match entry.record.state {
            AuthorityState::Held(holder) if holder == *peer => {
                debug!("{} already holds {}", peer, object);
            }
            AuthorityState::Held(holder) => {
                warn!(
                    "Contested transfer of {} from {} to {}",
                    object, holder, peer
                );
                entry.record.state = AuthorityState::Held(*peer);
                entry.record.generation += 1;
            }
            AuthorityState::Free => {
                info!("Granting {} to {}", object, peer);
                entry.record.state = AuthorityState::Held(*peer);
                entry.record.generation += 1;
            }
        }

        self.announcements.push(entry.change(*object));
        AuthResult::Accepted
    }

    /// Only the current holder may release
    pub fn release(&mut self, object: &ObjectId, peer: &PeerId) -> AuthResult {
        let Some(entry) = self.entries.get_mut(object) else {
            debug!("Rejecting release of unknown {} from {}", object, peer);
            return AuthResult::Rejected;
        };
        if !entry.record.is_held_by(peer) {
            debug!("Rejecting release of {} from non-holder {}", object, peer);
            return AuthResult::Rejected;
        }

        info!("{} released {}", peer, object);
        entry.record.state = AuthorityState::Free;
        entry.record.generation += 1;
        self.announcements.push(entry.change(*object));
        AuthResult::Accepted
    }

    /// Privileged assignment by the coordinator, regardless of the current
    /// holder. Still refuses disconnected peers and unknown objects.
    pub fn force_assign(&mut self, object: &ObjectId, peer: &PeerId) -> AuthResult {
        if !self.connected.contains(peer) {
            warn!("Cannot assign {} to disconnected {}", object, peer);
            return AuthResult::Rejected;
        }
        let Some(entry) = self.entries.get_mut(object) else {
            warn!("Cannot assign unknown {} to {}", object, peer);
            return AuthResult::Rejected;
        };

        if !entry.record.is_held_by(peer) {
            info!("Assigning {} to {}", object, peer);
            entry.record.state = AuthorityState::Held(*peer);
            entry.record.generation += 1;
        }
        self.announcements.push(entry.change(*object));
        AuthResult::Accepted
    }

    /// Whether a pose authored by `peer` under `generation` may be applied
    pub fn accepts_update(&self, object: &ObjectId, peer: &PeerId, generation: Generation) -> bool {
        self.record(object)
            .is_some_and(|record| record.is_held_by(peer) && record.generation == generation)
    }

    pub fn take_announcements(&mut self) -> Vec<AuthorityChange> {
        std::mem::take(&mut self.announcements)
    }
}

impl Default for AuthorityTable {
    fn default() -> Self {
        Self::new()
    }
}
