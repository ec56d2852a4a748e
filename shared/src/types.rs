use std::fmt;

/// Monotonic generation counter of an authority record
pub type Generation = u64;

/// Stable id of a synchronizable object. Never reused while the session lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn to_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Stable id of a connected participant. Invalidated on disconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(u32);

impl PeerId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn to_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// What an object is, decided by its prefab at spawn time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Grabbable,
    Vehicle,
    Marker,
}

impl ObjectKind {
    /// Whether the coordinator toggles physics when authority changes hands.
    /// Vehicles keep simulating regardless of who drives them.
    pub fn toggles_kinematic(&self) -> bool {
        !matches!(self, ObjectKind::Vehicle)
    }
}

/// Hands out ids in increasing order. Ids are never recycled.
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_object(&mut self) -> ObjectId {
        ObjectId(self.bump())
    }

    pub fn next_peer(&mut self) -> PeerId {
        PeerId(self.bump())
    }

    fn bump(&mut self) -> u32 {
        let value = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        value
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
