use std::collections::HashMap;

use crate::types::{Generation, ObjectId, PeerId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthorityState {
    Free,
    Held(PeerId),
}

/// Ownership of one object. `generation` increments on every state change
/// and is echoed by pose updates so stale claims can be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorityRecord {
    pub state: AuthorityState,
    pub generation: Generation,
}

impl AuthorityRecord {
    pub fn new() -> Self {
        Self {
            state: AuthorityState::Free,
            generation: 0,
        }
    }

    pub fn holder(&self) -> Option<PeerId> {
        match self.state {
            AuthorityState::Free => None,
            AuthorityState::Held(peer) => Some(peer),
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == AuthorityState::Free
    }

    pub fn is_held_by(&self, peer: &PeerId) -> bool {
        self.state == AuthorityState::Held(*peer)
    }
}

impl Default for AuthorityRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of an ownership request. Refusals are ordinary protocol flow,
/// not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthResult {
    Accepted,
    Rejected,
}

impl AuthResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthResult::Accepted)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplicaEntry {
    pub holder: Option<PeerId>,
    pub generation: Generation,
    pub kinematic: bool,
}

/// Read-only mirror of the coordinator's authority table, kept by each peer
pub struct AuthorityReplica {
    entries: HashMap<ObjectId, ReplicaEntry>,
}

impl AuthorityReplica {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Apply an announcement. Announcements older than what is already known
    /// are ignored; returns whether the entry changed.
    pub fn apply(
        &mut self,
        object: ObjectId,
        holder: Option<PeerId>,
        generation: Generation,
        kinematic: bool,
    ) -> bool {
        let entry = ReplicaEntry {
            holder,
            generation,
            kinematic,
        };
        match self.entries.get_mut(&object) {
            Some(existing) if existing.generation > generation => false,
            Some(existing) => {
                let changed = *existing != entry;
                *existing = entry;
                changed
            }
            None => {
                self.entries.insert(object, entry);
                true
            }
        }
    }

    pub fn get(&self, object: &ObjectId) -> Option<&ReplicaEntry> {
        self.entries.get(object)
    }

    pub fn holder(&self, object: &ObjectId) -> Option<PeerId> {
        self.entries.get(object).and_then(|entry| entry.holder)
    }

    pub fn generation(&self, object: &ObjectId) -> Option<Generation> {
        self.entries.get(object).map(|entry| entry.generation)
    }

    pub fn is_held_by(&self, object: &ObjectId, peer: &PeerId) -> bool {
        self.holder(object) == Some(*peer)
    }

    pub fn remove(&mut self, object: &ObjectId) {
        self.entries.remove(object);
    }

    pub fn objects_held_by(&self, peer: &PeerId) -> Vec<ObjectId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.holder == Some(*peer))
            .map(|(object, _)| *object)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for AuthorityReplica {
    fn default() -> Self {
        Self::new()
    }
}
