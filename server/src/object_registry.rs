use std::collections::{BTreeMap, HashMap};

use log::info;

use colocate_shared::{IdGenerator, ObjectId, ObjectKind, PeerId, Pose};

/// A live object as the coordinator knows it
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    pub kind: ObjectKind,
    pub prefab: String,
    /// Last accepted pose
    pub pose: Pose,
    /// Peer whose request spawned the object, `None` for host spawns
    pub spawned_by: Option<PeerId>,
}

/// Every live object of the session, ordered by id
pub struct ObjectRegistry {
    ids: IdGenerator,
    objects: BTreeMap<ObjectId, ObjectRecord>,
    vehicles: HashMap<PeerId, ObjectId>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::new(),
            objects: BTreeMap::new(),
            vehicles: HashMap::new(),
        }
    }

    /// Spawns a new object. A peer owns at most one vehicle: spawning another
    /// one despawns the previous vehicle, whose id is returned alongside.
    pub fn spawn(
        &mut self,
        kind: ObjectKind,
        prefab: &str,
        pose: Pose,
        spawned_by: Option<PeerId>,
    ) -> (ObjectId, Option<ObjectId>) {
        let object = self.ids.next_object();

        let mut replaced = None;
        if let (ObjectKind::Vehicle, Some(peer)) = (kind, spawned_by) {
            if let Some(previous) = self.vehicles.insert(peer, object) {
                info!("{} replaces its vehicle {} with {}", peer, previous, object);
                self.objects.remove(&previous);
                replaced = Some(previous);
            }
        }

        self.objects.insert(
            object,
            ObjectRecord {
                kind,
                prefab: prefab.to_string(),
                pose,
                spawned_by,
            },
        );
        (object, replaced)
    }

    pub fn despawn(&mut self, object: &ObjectId) -> Option<ObjectRecord> {
        let record = self.objects.remove(object)?;
        if let (ObjectKind::Vehicle, Some(peer)) = (record.kind, record.spawned_by) {
            if self.vehicles.get(&peer) == Some(object) {
                self.vehicles.remove(&peer);
            }
        }
        Some(record)
    }

    pub fn set_pose(&mut self, object: &ObjectId, pose: Pose) -> bool {
        match self.objects.get_mut(object) {
            Some(record) => {
                record.pose = pose;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, object: &ObjectId) -> Option<&ObjectRecord> {
        self.objects.get(object)
    }

    pub fn contains(&self, object: &ObjectId) -> bool {
        self.objects.contains_key(object)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ObjectRecord)> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn vehicle_of(&self, peer: &PeerId) -> Option<ObjectId> {
        self.vehicles.get(peer).copied()
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}
