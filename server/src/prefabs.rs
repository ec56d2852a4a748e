use std::collections::HashMap;

use colocate_shared::ObjectKind;

pub const CUBE_PREFAB: &str = "cube";
pub const CAR_PREFAB: &str = "car";
pub const MARKER_PREFAB: &str = "marker";

/// Maps the prefab tags peers may ask for onto object kinds
#[derive(Clone, Debug)]
pub struct PrefabRegistry {
    kinds: HashMap<String, ObjectKind>,
}

impl PrefabRegistry {
    /// A registry that knows no prefab
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Registers `tag`, replacing any previous kind. Returns the replaced kind.
    pub fn register(&mut self, tag: impl Into<String>, kind: ObjectKind) -> Option<ObjectKind> {
        self.kinds.insert(tag.into(), kind)
    }

    pub fn kind_of(&self, tag: &str) -> Option<ObjectKind> {
        self.kinds.get(tag).copied()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }
}

impl Default for PrefabRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(CUBE_PREFAB, ObjectKind::Grabbable);
        registry.register(CAR_PREFAB, ObjectKind::Vehicle);
        registry.register(MARKER_PREFAB, ObjectKind::Marker);
        registry
    }
}
